// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission control for chat turns.
//!
//! A turn first takes the [`ConversationMutex`] for its chat, so two turns of
//! the same conversation never interleave, then spends one unit from the
//! [`RateLimiter`] bucket of its caller. Both are backed by shared storage
//! and hold across processes.

pub mod limiter;
pub mod lock;

pub use limiter::RateLimiter;
pub use lock::{ConversationMutex, LockLease, LockSettings};
