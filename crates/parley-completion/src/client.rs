// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completion endpoints.
//!
//! Provides [`CompletionClient`] which handles request construction,
//! authentication, streaming SSE responses, and transient error retry with
//! exponential backoff. Every attempt races a per-attempt timer and an
//! optional caller [`CancellationToken`]; losing the race drops the request
//! future, which aborts the underlying connection.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use parley_config::model::CompletionConfig;
use parley_core::{AbortReason, CompletionRequest, CompletionResult, DeltaSink, ParleyError};
use rand::Rng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::accumulator::StreamAccumulator;
use crate::sse;
use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Endpoint used when the configured base URL is unusable.
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

const COMPLETIONS_PATH: &str = "/chat/completions";

/// Longest slice of a non-JSON error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 300;

/// Exponential backoff with additive jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub jitter: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &CompletionConfig) -> Self {
        Self {
            base: Duration::from_millis(config.backoff_base_ms),
            cap: Duration::from_millis(config.backoff_cap_ms),
            jitter: Duration::from_millis(config.backoff_jitter_ms),
        }
    }

    /// Delay before the retry that follows `failed` failed attempts,
    /// without jitter: `min(cap, base * 2^failed)`.
    pub fn base_delay(&self, failed: u32) -> Duration {
        let factor = 2u32.checked_pow(failed).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// [`base_delay`](Self::base_delay) plus uniform jitter in `[0, jitter)`.
    pub fn delay(&self, failed: u32) -> Duration {
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.base_delay(failed) + Duration::from_millis(extra)
    }
}

/// HTTP client for chat completion requests.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    timeout: Duration,
    backoff: BackoffPolicy,
}

impl CompletionClient {
    /// Creates a client from configuration and an already-resolved API key.
    pub fn new(config: &CompletionConfig, api_key: &str) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {api_key}"), "API key")?,
        );
        headers.insert("http-referer", header_value(&config.app_url, "app_url")?);
        headers.insert("x-title", header_value(&config.app_title, "app_title")?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ParleyError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            endpoint: normalize_endpoint(&config.base_url),
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
            backoff: BackoffPolicy::from_config(config),
        })
    }

    /// Overrides the endpoint. The value is normalized like `base_url`.
    pub fn with_endpoint(mut self, base_url: &str) -> Self {
        self.endpoint = normalize_endpoint(base_url);
        self
    }

    /// Overrides the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a non-streaming request and returns the first choice.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError> {
        let body = ChatCompletionRequest::from_domain(request, false);

        let mut attempt = 0;
        loop {
            ensure_not_cancelled(cancel)?;
            match guarded(self.timeout, cancel, self.complete_once(&body)).await {
                Ok(result) => {
                    debug!(model = %body.model, attempt, "completion received");
                    return Ok(result);
                }
                Err(e) => self.retry_or_fail(e, attempt, cancel).await?,
            }
            attempt += 1;
        }
    }

    /// Sends a streaming request, forwarding each text fragment to `on_delta`.
    ///
    /// A failed attempt that already delivered fragments is retried from the
    /// start, so a caller may see the beginning of the reply twice.
    pub async fn stream(
        &self,
        request: &CompletionRequest,
        mut on_delta: Option<&mut DeltaSink<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<CompletionResult, ParleyError> {
        let body = ChatCompletionRequest::from_domain(request, true);

        let mut attempt = 0;
        loop {
            ensure_not_cancelled(cancel)?;
            let once = self.stream_once(&body, on_delta.as_deref_mut());
            match guarded(self.timeout, cancel, once).await {
                Ok(result) => {
                    debug!(
                        model = %body.model,
                        attempt,
                        chars = result.text.chars().count(),
                        tool_calls = result.tool_calls.len(),
                        "stream completed"
                    );
                    return Ok(result);
                }
                Err(e) => self.retry_or_fail(e, attempt, cancel).await?,
            }
            attempt += 1;
        }
    }

    async fn complete_once(
        &self,
        body: &ChatCompletionRequest,
    ) -> Result<CompletionResult, ParleyError> {
        let response = self.send(body).await?;
        let text = response.text().await.map_err(|e| ParleyError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| ParleyError::Provider {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.into_result())
    }

    async fn stream_once(
        &self,
        body: &ChatCompletionRequest,
        mut on_delta: Option<&mut DeltaSink<'_>>,
    ) -> Result<CompletionResult, ParleyError> {
        let response = self.send(body).await?;
        let mut chunks = sse::parse_sse_stream(response);
        let mut acc = StreamAccumulator::new();

        while let Some(chunk) = chunks.next().await {
            let Some(delta) = acc.apply(chunk?) else {
                continue;
            };
            if let Some(sink) = on_delta.as_deref_mut() {
                if let Err(e) = sink(&delta) {
                    debug!(error = %e, "delta callback failed, continuing stream");
                }
            }
        }

        if acc.chunks() == 0 {
            return Err(ParleyError::provider(
                "stream ended without delivering any payload",
            ));
        }
        Ok(acc.finish())
    }

    async fn send(&self, body: &ChatCompletionRequest) -> Result<reqwest::Response, ParleyError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| ParleyError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(status = %response.status(), stream = body.stream, "response received");
        ensure_success(response).await
    }

    /// Sleeps before the next attempt when `error` is retryable and attempts
    /// remain; otherwise hands the error back.
    async fn retry_or_fail(
        &self,
        error: ParleyError,
        attempt: u32,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), ParleyError> {
        if !error.is_retryable() || attempt >= self.max_retries {
            return Err(error);
        }
        let delay = self.backoff.delay(attempt);
        warn!(
            attempt,
            status = error.status(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %error,
            "transient completion error, will retry"
        );
        sleep_or_cancel(delay, cancel).await
    }
}

/// Normalizes a configured base URL to an absolute chat completions endpoint.
pub fn normalize_endpoint(base_url: &str) -> String {
    let parsed = reqwest::Url::parse(base_url.trim());
    match parsed {
        Ok(mut url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            let path = url.path().trim_end_matches('/').to_string();
            if !path.ends_with(COMPLETIONS_PATH) {
                url.set_path(&format!("{path}{COMPLETIONS_PATH}"));
            }
            url.to_string()
        }
        _ => {
            warn!(base_url, "completion base URL is not an absolute http(s) URL, using default");
            DEFAULT_ENDPOINT.to_string()
        }
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, ParleyError> {
    HeaderValue::from_str(value)
        .map_err(|e| ParleyError::Config(format!("invalid {what} header value: {e}")))
}

fn ensure_not_cancelled(cancel: Option<&CancellationToken>) -> Result<(), ParleyError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(ParleyError::Aborted(AbortReason::Cancelled)),
        _ => Ok(()),
    }
}

/// Runs one attempt against the timer and the caller's token.
async fn guarded<T>(
    timeout: Duration,
    cancel: Option<&CancellationToken>,
    attempt: impl Future<Output = Result<T, ParleyError>>,
) -> Result<T, ParleyError> {
    let timed = async {
        match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(ParleyError::Aborted(AbortReason::TimedOut(timeout))),
        }
    };
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(ParleyError::Aborted(AbortReason::Cancelled)),
            result = timed => result,
        },
        None => timed.await,
    }
}

async fn sleep_or_cancel(
    delay: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<(), ParleyError> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(ParleyError::Aborted(AbortReason::Cancelled)),
            _ = tokio::time::sleep(delay) => Ok(()),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

/// Maps a non-2xx response to [`ParleyError::UpstreamHttp`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ParleyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(api_err) => api_err.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        Err(_) => body.chars().take(ERROR_BODY_LIMIT).collect(),
    };
    Err(ParleyError::UpstreamHttp {
        status: status.as_u16(),
        message,
    })
}
