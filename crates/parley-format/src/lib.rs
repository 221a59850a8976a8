// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output shaping applied to model replies before delivery.
//!
//! Shaping never fails. Text that reduces to nothing becomes
//! [`EMPTY_REPLY_PLACEHOLDER`].

pub mod ascii;
pub mod chunk;
pub mod code;
pub mod plain;

pub use chunk::chunk_text;
pub use code::preserve_code;
pub use plain::format_plain;

use parley_config::model::{OutputConfig, OutputStyle};
use tracing::debug;

/// Stand-in for replies with no usable content.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "No response content.";

/// Format `text` in the configured style and split it into deliverable chunks.
pub fn shape_reply(text: &str, config: &OutputConfig) -> Vec<String> {
    let formatted = match config.style {
        OutputStyle::Plain => format_plain(text),
        OutputStyle::Preserve => preserve_code(text),
    };
    if formatted.trim().is_empty() {
        return vec![EMPTY_REPLY_PLACEHOLDER.to_string()];
    }
    let chunks = chunk_text(&formatted, config.max_message_chars);
    debug!(
        style = ?config.style,
        chars = formatted.chars().count(),
        chunks = chunks.len(),
        "reply shaped"
    );
    chunks
}
