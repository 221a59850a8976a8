// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley turn pipeline.
//!
//! This crate provides the error taxonomy, the domain types that flow
//! between pipeline stages, and the traits that separate the pipeline from
//! its storage and completion backends.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AbortReason, ParleyError};
pub use types::{
    ChatMessage, CompletionRequest, CompletionResult, ConversationLock, ExecutedTool, Intent,
    RateLimitDecision, Role, RoutedModel, TokenUsage, ToolCall, ToolSchema,
};

pub use traits::{CompletionProvider, DeltaSink, LockStore, RateLimitStore, WindowAdmission};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_traits_are_exported() {
        fn _assert_provider<T: CompletionProvider>() {}
        fn _assert_lock_store<T: LockStore>() {}
        fn _assert_rate_limit_store<T: RateLimitStore>() {}
    }

    #[test]
    fn delta_sink_accepts_borrowing_closures() {
        let mut seen = String::new();
        {
            let sink: &mut DeltaSink<'_> = &mut |delta: &str| {
                seen.push_str(delta);
                Ok(())
            };
            sink("hel").unwrap();
            sink("lo").unwrap();
        }
        assert_eq!(seen, "hello");
    }
}
