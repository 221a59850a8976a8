// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as timing relationships between lock settings and non-empty model ids.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// One year.
const MAX_RATE_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;
const MAX_GC_MULTIPLIER: u32 = 1_000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let base_url = config.completion.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        fail(format!(
            "completion.base_url `{base_url}` must be an absolute http(s) URL"
        ));
    }

    if config.completion.timeout_secs == 0 {
        fail("completion.timeout_secs must be at least 1".to_string());
    }

    if config.completion.backoff_cap_ms < config.completion.backoff_base_ms {
        fail(format!(
            "completion.backoff_cap_ms ({}) must not be below completion.backoff_base_ms ({})",
            config.completion.backoff_cap_ms, config.completion.backoff_base_ms
        ));
    }

    // An abandoned lock has to expire before a waiter gives up on it.
    let lock = &config.lock;
    if lock.ttl_secs == 0 {
        fail("lock.ttl_secs must be at least 1".to_string());
    }
    if lock.retry_delay_ms == 0 {
        fail("lock.retry_delay_ms must be at least 1".to_string());
    }
    if lock.max_wait_secs.saturating_mul(1000)
        <= lock.ttl_secs.saturating_mul(1000) + lock.retry_delay_ms
    {
        fail(format!(
            "lock.max_wait_secs ({}) must exceed lock.ttl_secs ({}) plus lock.retry_delay_ms ({})",
            lock.max_wait_secs, lock.ttl_secs, lock.retry_delay_ms
        ));
    }

    if config.rate_limit.window_secs == 0 {
        fail("rate_limit.window_secs must be at least 1".to_string());
    }
    if config.rate_limit.max_requests == 0 {
        fail("rate_limit.max_requests must be at least 1".to_string());
    }
    if config.rate_limit.window_secs > MAX_RATE_WINDOW_SECS {
        fail(format!(
            "rate_limit.window_secs must be at most {MAX_RATE_WINDOW_SECS}, got {}",
            config.rate_limit.window_secs
        ));
    }
    if !(1..=MAX_GC_MULTIPLIER).contains(&config.rate_limit.gc_multiplier) {
        fail(format!(
            "rate_limit.gc_multiplier must be between 1 and {MAX_GC_MULTIPLIER}, got {}",
            config.rate_limit.gc_multiplier
        ));
    }

    if config.routing.fallback_model.trim().is_empty() {
        fail("routing.fallback_model must not be empty".to_string());
    }
    for (key, preset) in &config.routing.models {
        if key.eq_ignore_ascii_case("auto") || key == "custom" {
            fail(format!("routing.models.{key} uses a reserved key"));
        }
        if preset.model.trim().is_empty() {
            fail(format!("routing.models.{key}.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&preset.temperature) {
            fail(format!(
                "routing.models.{key}.temperature must be between 0 and 2, got {}",
                preset.temperature
            ));
        }
        if preset.max_tokens == 0 {
            fail(format!("routing.models.{key}.max_tokens must be at least 1"));
        }
    }

    if config.output.max_message_chars < 16 {
        fail(format!(
            "output.max_message_chars must be at least 16, got {}",
            config.output.max_message_chars
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
