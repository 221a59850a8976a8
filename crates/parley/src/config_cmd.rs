// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley config show`.

use parley_config::ParleyConfig;

const REDACTED: &str = "********";

/// Effective configuration as TOML, with the API key masked.
pub fn render_redacted(config: &ParleyConfig) -> Result<String, toml::ser::Error> {
    let mut config = config.clone();
    if config.completion.api_key.is_some() {
        config.completion.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_masked() {
        let mut config = ParleyConfig::default();
        config.completion.api_key = Some("sk-or-secret".into());

        let rendered = render_redacted(&config).unwrap();
        assert!(!rendered.contains("sk-or-secret"));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn rendered_config_loads_back() {
        let rendered = render_redacted(&ParleyConfig::default()).unwrap();
        let reloaded = parley_config::load_and_validate_str(&rendered).unwrap();
        assert_eq!(reloaded.lock.ttl_secs, 120);
        assert_eq!(reloaded.routing.models.len(), ParleyConfig::default().routing.models.len());
    }
}
