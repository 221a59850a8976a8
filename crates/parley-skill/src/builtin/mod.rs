// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools. All of them are pure or read only the system clock.

pub mod calculator;
pub mod datetime;
pub mod text;
pub mod units;

pub use calculator::{CalculatorTool, evaluate_expression, format_number};
pub use datetime::{CurrentTimeTool, format_time_in};
pub use text::{
    ExtractKeyPointsTool, RewriteTextTool, SummarizeTextTool, Tone, extract_key_points,
    rewrite_text, summarize_text,
};
pub use units::{ConvertUnitsTool, UnitKind, convert_unit};

use std::sync::Arc;

use parley_config::model::ToolsConfig;

use crate::ToolRegistry;

/// Registers all built-in tools into the given registry.
pub fn register_builtins(registry: &mut ToolRegistry, config: &ToolsConfig) {
    registry.register(Arc::new(CalculatorTool::new(config.calculator_max_len)));
    registry.register(Arc::new(ConvertUnitsTool));
    registry.register(Arc::new(CurrentTimeTool));
    registry.register(Arc::new(SummarizeTextTool));
    registry.register(Arc::new(RewriteTextTool));
    registry.register(Arc::new(ExtractKeyPointsTool));
}
