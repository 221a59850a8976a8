// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the pipeline and its backends.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod provider;
pub mod storage;

pub use provider::{CompletionProvider, DeltaSink};
pub use storage::{LockStore, RateLimitStore, WindowAdmission};
