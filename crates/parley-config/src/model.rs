// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley turn pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Completion API endpoint, credentials and retry policy.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Conversation mutex timing.
    #[serde(default)]
    pub lock: LockConfig,

    /// Sliding-window rate limiter.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Model presets and intent routing.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Tool calling.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Output shaping before delivery.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// System prompt prepended to every turn.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
        }
    }
}

fn default_agent_name() -> String {
    "parley".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Completion API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// Chat completions endpoint or API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. `None` requires the `OPENROUTER_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sent as `HTTP-Referer` for provider attribution.
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Sent as `X-Title` for provider attribution.
    #[serde(default = "default_app_title")]
    pub app_title: String,

    /// Per-attempt timeout, covering the request and the full body read.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient upstream statuses.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential backoff.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound of the exponential part of the backoff.
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Exclusive upper bound of the uniform jitter added to every backoff.
    #[serde(default = "default_backoff_jitter_ms")]
    pub backoff_jitter_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            app_url: default_app_url(),
            app_title: default_app_title(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            backoff_jitter_ms: default_backoff_jitter_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_app_url() -> String {
    "https://github.com/parley/parley".to_string()
}

fn default_app_title() -> String {
    "Parley".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    8_000
}

fn default_backoff_jitter_ms() -> u64 {
    250
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for concurrent reads.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long SQLite waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("parley").join("parley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parley.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Conversation mutex configuration.
///
/// `ttl_secs` must exceed the slowest expected turn, and `max_wait_secs`
/// must exceed the TTL plus one retry delay so an abandoned lock always
/// expires before a waiter gives up.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    #[serde(default = "default_lock_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_lock_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_lock_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_lock_ttl_secs(),
            retry_delay_ms: default_lock_retry_delay_ms(),
            max_wait_secs: default_lock_max_wait_secs(),
        }
    }
}

fn default_lock_ttl_secs() -> u64 {
    120
}

fn default_lock_retry_delay_ms() -> u64 {
    250
}

fn default_lock_max_wait_secs() -> u64 {
    150
}

/// Sliding-window rate limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Length of the trailing window.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Maximum admitted events per bucket inside one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Events older than `window_secs * gc_multiplier` are purged.
    #[serde(default = "default_gc_multiplier")]
    pub gc_multiplier: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            gc_multiplier: default_gc_multiplier(),
        }
    }
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_requests() -> u32 {
    20
}

fn default_gc_multiplier() -> u32 {
    10
}

/// One selectable model and its sampling parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPreset {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelPreset {
    fn new(model: &str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }
}

/// Model routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Presets by key. The router looks up `fast`, `code` and `math`.
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, ModelPreset>,

    /// Model id used when an intent's preset key is not configured.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Temperature for explicitly requested models that match no preset.
    #[serde(default = "default_custom_temperature")]
    pub custom_temperature: f32,

    /// Token limit for explicitly requested models that match no preset.
    #[serde(default = "default_custom_max_tokens")]
    pub custom_max_tokens: u32,

    /// Temperature override for current-events questions.
    #[serde(default = "default_current_events_temperature")]
    pub current_events_temperature: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            fallback_model: default_fallback_model(),
            custom_temperature: default_custom_temperature(),
            custom_max_tokens: default_custom_max_tokens(),
            current_events_temperature: default_current_events_temperature(),
        }
    }
}

fn default_models() -> BTreeMap<String, ModelPreset> {
    BTreeMap::from([
        (
            "fast".to_string(),
            ModelPreset::new("openai/gpt-4o-mini", 0.7, 1200),
        ),
        (
            "code".to_string(),
            ModelPreset::new("anthropic/claude-3.5-sonnet", 0.2, 2000),
        ),
        (
            "math".to_string(),
            ModelPreset::new("openai/o3-mini", 0.1, 1500),
        ),
        (
            "smart".to_string(),
            ModelPreset::new("openai/gpt-4o", 0.6, 2000),
        ),
    ])
}

fn default_fallback_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_custom_temperature() -> f32 {
    0.4
}

fn default_custom_max_tokens() -> u32 {
    1200
}

fn default_current_events_temperature() -> f32 {
    0.2
}

/// Tool calling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Offer tool schemas to the model when the message looks like it needs them.
    #[serde(default = "default_tools_enabled")]
    pub enabled: bool,

    /// Maximum model/tool round trips per turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Longest expression the calculator accepts.
    #[serde(default = "default_calculator_max_len")]
    pub calculator_max_len: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_tools_enabled(),
            max_tool_rounds: default_max_tool_rounds(),
            calculator_max_len: default_calculator_max_len(),
        }
    }
}

fn default_tools_enabled() -> bool {
    true
}

fn default_max_tool_rounds() -> u32 {
    3
}

fn default_calculator_max_len() -> usize {
    200
}

/// How replies are rewritten before delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStyle {
    /// Markdown stripped to plain professional text.
    #[default]
    Plain,
    /// Whitespace kept intact, only non-ASCII noise removed.
    Preserve,
}

/// Output shaping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Largest chunk, in characters, handed to the delivery channel.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    #[serde(default)]
    pub style: OutputStyle,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            style: OutputStyle::default(),
        }
    }
}

fn default_max_message_chars() -> usize {
    3500
}
