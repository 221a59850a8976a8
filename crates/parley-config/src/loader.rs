// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./parley.toml` > `~/.config/parley/parley.toml` > `/etc/parley/parley.toml`
//! with environment variable overrides via `PARLEY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ParleyConfig;

/// Config sections addressable from the environment, longest first so that
/// `rate_limit_` wins over any shorter prefix.
const ENV_SECTIONS: &[&str] = &[
    "rate_limit",
    "completion",
    "storage",
    "routing",
    "output",
    "agent",
    "tools",
    "lock",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parley/parley.toml` (system-wide)
/// 3. `~/.config/parley/parley.toml` (user XDG config)
/// 4. `./parley.toml` (local directory)
/// 5. `PARLEY_*` environment variables
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file("/etc/parley/parley.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("parley/parley.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("parley.toml"))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
///
/// Only the section prefix becomes a dot: `rate_limit_window_secs` maps to
/// `rate_limit.window_secs`, never `rate.limit.window.secs`. Names outside
/// a known section yield `None` and are ignored.
pub fn env_key_to_path(key: &str) -> Option<String> {
    ENV_SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|field| !field.is_empty())
            .map(|field| format!("{section}.{field}"))
    })
}

fn env_provider() -> Env {
    Env::prefixed("PARLEY_")
        .filter(|key| env_key_to_path(&key.as_str().to_ascii_lowercase()).is_some())
        .map(|key| {
            let lowered = key.as_str().to_ascii_lowercase();
            env_key_to_path(&lowered).unwrap_or(lowered).into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_section_prefix_only() {
        assert_eq!(
            env_key_to_path("completion_api_key").as_deref(),
            Some("completion.api_key")
        );
        assert_eq!(
            env_key_to_path("rate_limit_max_requests").as_deref(),
            Some("rate_limit.max_requests")
        );
        assert_eq!(
            env_key_to_path("lock_ttl_secs").as_deref(),
            Some("lock.ttl_secs")
        );
    }

    #[test]
    fn unknown_env_keys_are_ignored() {
        assert_eq!(env_key_to_path("log"), None);
        assert_eq!(env_key_to_path("storage"), None);
        assert_eq!(env_key_to_path("locksmith_name"), None);
    }
}
