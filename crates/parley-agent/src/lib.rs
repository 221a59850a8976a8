// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn orchestration for the Parley pipeline.
//!
//! The [`TurnRunner`] is the central coordinator that:
//! - Serializes turns per chat with the conversation mutex
//! - Charges the rate limiter
//! - Routes the message to a model
//! - Streams the completion, running requested tools between rounds
//! - Shapes the final reply for delivery

pub mod shutdown;
pub mod turn;

pub use shutdown::install_signal_handler;
pub use turn::{TurnOutcome, TurnRequest, TurnRunner};
