// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion provider trait for LLM backends.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ParleyError;
use crate::types::{CompletionRequest, CompletionResult};

/// Callback receiving each streamed text fragment as soon as it is decoded.
///
/// Errors returned by the sink are logged and otherwise ignored; they never
/// abort the stream.
pub type DeltaSink<'a> = dyn FnMut(&str) -> Result<(), ParleyError> + Send + 'a;

/// Adapter for chat-completion backends.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends a request and waits for the complete response body.
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError>;

    /// Sends a streaming request, forwarding text deltas to `on_delta` while
    /// accumulating the final result.
    async fn stream(
        &self,
        request: CompletionRequest,
        on_delta: Option<&mut DeltaSink<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError>;
}
