// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool subsystem for the Parley turn pipeline.
//!
//! Provides the [`Tool`] trait, the name-indexed [`ToolRegistry`] that turns
//! every invocation into an [`ExecutedTool`](parley_core::ExecutedTool), and a
//! set of deterministic built-in tools: arithmetic, unit conversion, clock
//! lookup and plain text transforms.

pub mod builtin;
pub mod gating;
pub mod tool;

pub use gating::should_enable_tools;
pub use tool::{Tool, ToolOutput, ToolRegistry, parse_arguments};
