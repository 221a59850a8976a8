// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat completion provider for the Parley turn pipeline.
//!
//! Implements [`CompletionProvider`] for OpenRouter and other
//! OpenAI-compatible endpoints, with streaming SSE, bounded retry and
//! caller-driven cancellation.

pub mod accumulator;
pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use parley_config::model::CompletionConfig;
use parley_core::{CompletionProvider, CompletionRequest, CompletionResult, DeltaSink, ParleyError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use accumulator::StreamAccumulator;
pub use client::{BackoffPolicy, CompletionClient, DEFAULT_ENDPOINT, normalize_endpoint};

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Completion provider backed by [`CompletionClient`].
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    client: CompletionClient,
}

impl OpenRouterProvider {
    /// Creates a provider from configuration.
    ///
    /// Fails with [`ParleyError::Config`] when no API key is configured and
    /// `OPENROUTER_API_KEY` is unset.
    pub fn new(config: &CompletionConfig) -> Result<Self, ParleyError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = CompletionClient::new(config, &api_key)?;
        info!(endpoint = client.endpoint(), "completion provider initialized");
        Ok(Self { client })
    }

    /// Wraps an already-built client.
    pub fn with_client(client: CompletionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError> {
        debug!(model = %request.model, tools = request.tools.len(), "sending completion request");
        self.client.complete(&request, cancel).await
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        on_delta: Option<&mut DeltaSink<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError> {
        debug!(model = %request.model, tools = request.tools.len(), "sending streaming request");
        self.client.stream(&request, on_delta, cancel).await
    }
}

/// Resolves the API key: a non-empty configured key wins, then
/// `OPENROUTER_API_KEY`.
pub fn resolve_api_key(config_key: Option<&str>) -> Result<String, ParleyError> {
    resolve_api_key_with(config_key, |name| std::env::var(name).ok())
}

fn resolve_api_key_with(
    config_key: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String, ParleyError> {
    if let Some(key) = config_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    env(API_KEY_ENV)
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ParleyError::Config(format!(
                "completion API key not found. Set completion.api_key in config, \
                 PARLEY_COMPLETION_API_KEY, or {API_KEY_ENV}."
            ))
        })
}
