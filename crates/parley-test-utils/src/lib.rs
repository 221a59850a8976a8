// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides a mock completion provider and a harness that assembles the
//! whole turn pipeline on a temp database, for fast, deterministic tests
//! without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Completion provider replaying scripted results
//! - [`TestHarness`] - Turn runner wired to the mock and a temp SQLite store

pub mod harness;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_provider::{DEFAULT_MOCK_TEXT, MockProvider, text_reply, tool_reply};
