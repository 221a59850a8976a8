// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `CompletionProvider` with scripted results,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parley_core::{
    AbortReason, CompletionProvider, CompletionRequest, CompletionResult, DeltaSink, ParleyError,
    TokenUsage, ToolCall,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Text returned when the script is exhausted.
pub const DEFAULT_MOCK_TEXT: &str = "mock response";

/// A completion result carrying only `text`.
pub fn text_reply(text: &str) -> CompletionResult {
    CompletionResult {
        id: "mock-gen".to_string(),
        model: "mock-model".to_string(),
        text: text.to_string(),
        finish_reason: Some("stop".to_string()),
        tool_calls: Vec::new(),
        usage: Some(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        }),
    }
}

/// A completion result requesting the given `(id, name, arguments_json)` calls.
pub fn tool_reply(calls: &[(&str, &str, &str)]) -> CompletionResult {
    CompletionResult {
        finish_reason: Some("tool_calls".to_string()),
        tool_calls: calls
            .iter()
            .map(|(id, name, args)| ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments_json: args.to_string(),
            })
            .collect(),
        ..text_reply("")
    }
}

/// A mock provider that replays scripted results.
///
/// Results are popped from a FIFO queue. When the queue is empty,
/// [`DEFAULT_MOCK_TEXT`] is returned. Every request is recorded.
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Result<CompletionResult, ParleyError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider pre-loaded with the given results.
    pub fn with_responses(responses: Vec<CompletionResult>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Hold every call for `delay` before answering. Cancellation cuts the
    /// wait short.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn add_response(&self, result: CompletionResult) {
        self.script.lock().await.push_back(Ok(result));
    }

    pub async fn add_text(&self, text: &str) {
        self.add_response(text_reply(text)).await;
    }

    /// Queue an error for the next call.
    pub async fn add_error(&self, error: ParleyError) {
        self.script.lock().await.push_back(Err(error));
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Highest number of calls that were in flight at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn next_result(
        &self,
        request: CompletionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let model = request.model.clone();
        self.requests.lock().await.push(request);
        let waited = self.wait(cancel).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        waited?;

        let next = self.script.lock().await.pop_front();
        debug!(model = %model, scripted = next.is_some(), "mock provider call");
        let mut result = next.unwrap_or_else(|| Ok(text_reply(DEFAULT_MOCK_TEXT)))?;
        if result.model.is_empty() || result.model == "mock-model" {
            result.model = model;
        }
        Ok(result)
    }

    async fn wait(&self, cancel: Option<&CancellationToken>) -> Result<(), ParleyError> {
        let Some(delay) = self.delay else {
            return match cancel {
                Some(token) if token.is_cancelled() => {
                    Err(ParleyError::Aborted(AbortReason::Cancelled))
                }
                _ => Ok(()),
            };
        };
        match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(ParleyError::Aborted(AbortReason::Cancelled)),
                _ = tokio::time::sleep(delay) => Ok(()),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError> {
        self.next_result(request, cancel).await
    }

    /// Emits the scripted text word by word before returning it.
    async fn stream(
        &self,
        request: CompletionRequest,
        on_delta: Option<&mut DeltaSink<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError> {
        let result = self.next_result(request, cancel).await?;
        if let Some(sink) = on_delta {
            for piece in result.text.split_inclusive(' ') {
                // Callback failures never affect the stream.
                let _ = sink(piece);
            }
        }
        Ok(result)
    }
}
