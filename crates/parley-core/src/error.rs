// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley turn pipeline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// HTTP statuses the completion client treats as transient.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Why an in-flight request was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The caller's cancellation token fired.
    Cancelled,
    /// The per-attempt timer elapsed.
    TimedOut(Duration),
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Cancelled => write!(f, "cancelled by caller"),
            AbortReason::TimedOut(after) => write!(f, "timed out after {after:?}"),
        }
    }
}

/// The primary error type used across all Parley crates.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The conversation mutex could not be acquired within the maximum wait.
    #[error("could not acquire conversation lock for chat {chat_id} after {waited:?}")]
    LockAcquisitionTimeout { chat_id: i64, waited: Duration },

    /// The rate-limit bucket is full for the current window.
    #[error("rate limit exceeded for {bucket_key}, resets at {reset_at}")]
    RateLimitExceeded {
        bucket_key: String,
        reset_at: DateTime<Utc>,
    },

    /// The completion API answered with a non-success status.
    #[error("upstream returned HTTP {status}: {message}")]
    UpstreamHttp { status: u16, message: String },

    /// A completion request was abandoned before it finished.
    #[error("request aborted: {0}")]
    Aborted(AbortReason),

    /// Transport, decoding, or protocol failures talking to the completion API.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tool rejected its input or failed to produce a result.
    #[error("tool error: {message}")]
    Skill {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for a tool failure without an underlying cause.
    pub fn skill(message: impl Into<String>) -> Self {
        ParleyError::Skill {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a provider failure without an underlying cause.
    pub fn provider(message: impl Into<String>) -> Self {
        ParleyError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ParleyError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the completion client may retry after this error.
    ///
    /// Only upstream HTTP failures with a transient status qualify. Aborts,
    /// transport errors and everything else propagate immediately.
    pub fn is_retryable(&self) -> bool {
        self.status()
            .is_some_and(|status| RETRYABLE_STATUSES.contains(&status))
    }

    /// Whether this error came from the caller's cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ParleyError::Aborted(AbortReason::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses_are_retryable() {
        for status in RETRYABLE_STATUSES {
            let err = ParleyError::UpstreamHttp {
                status,
                message: "busy".into(),
            };
            assert!(err.is_retryable(), "{status} should be retryable");
        }
    }

    #[test]
    fn client_errors_are_not_retryable() {
        for status in [400, 401, 403, 404, 422] {
            let err = ParleyError::UpstreamHttp {
                status,
                message: "nope".into(),
            };
            assert!(!err.is_retryable(), "{status} should not be retryable");
        }
    }

    #[test]
    fn aborts_are_never_retryable() {
        let cancelled = ParleyError::Aborted(AbortReason::Cancelled);
        let timed_out = ParleyError::Aborted(AbortReason::TimedOut(Duration::from_secs(5)));
        assert!(!cancelled.is_retryable());
        assert!(!timed_out.is_retryable());
        assert!(cancelled.is_cancelled());
        assert!(!timed_out.is_cancelled());
    }

    #[test]
    fn provider_errors_are_not_retryable() {
        assert!(!ParleyError::provider("connection reset").is_retryable());
    }

    #[test]
    fn display_includes_context() {
        let err = ParleyError::LockAcquisitionTimeout {
            chat_id: 42,
            waited: Duration::from_secs(150),
        };
        assert!(err.to_string().contains("chat 42"));

        let err = ParleyError::UpstreamHttp {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "upstream returned HTTP 503: overloaded");
    }
}
