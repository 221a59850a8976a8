// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model routing with explicit selections, per-message overrides and intent presets.
//!
//! Precedence: explicit known model > explicit raw model id > intent preset.

use parley_config::model::{ModelPreset, RoutingConfig};
use parley_core::{Intent, RoutedModel};
use tracing::debug;

use crate::classifier::{Classification, IntentClassifier};

/// Sentinel selection meaning "let the router decide".
pub const AUTO_MODEL_KEY: &str = "auto";

/// `model_key` reported for explicit model ids that match no preset.
pub const CUSTOM_MODEL_KEY: &str = "custom";

/// Routing outcome for one message, including how it was classified.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    pub intent: Intent,
    /// Classification rule that fired, if any.
    pub rule: Option<&'static str>,
    pub model: RoutedModel,
}

/// Resolves explicit selections and intents into concrete model settings.
pub struct ModelRouter {
    classifier: IntentClassifier,
    config: RoutingConfig,
}

impl ModelRouter {
    pub fn new(config: RoutingConfig) -> Self {
        Self::with_classifier(config, IntentClassifier::new())
    }

    pub fn with_classifier(config: RoutingConfig, classifier: IntentClassifier) -> Self {
        Self { classifier, config }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Classify `text` and route it, honoring `explicit_key` when present.
    pub fn route(&self, text: &str, explicit_key: Option<&str>) -> RoutingDecision {
        let Classification { intent, rule } = self.classifier.classify(text);
        let model = self.route_model(explicit_key, intent);
        debug!(
            %intent,
            rule = rule.unwrap_or("default"),
            model = %model.model_id,
            key = %model.model_key,
            auto = model.auto_routed,
            "routed message"
        );
        RoutingDecision {
            intent,
            rule,
            model,
        }
    }

    /// Resolve an explicit selection or an intent into model settings.
    ///
    /// An explicit key that names a preset (by key or by model id) is used
    /// as-is. Any other non-`auto` key is sent upstream as a raw model id
    /// with conservative sampling. Otherwise the intent picks a preset.
    pub fn route_model(&self, explicit_key: Option<&str>, intent: Intent) -> RoutedModel {
        let explicit = explicit_key
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.eq_ignore_ascii_case(AUTO_MODEL_KEY));

        if let Some(key) = explicit {
            return match self.resolve_preset(key) {
                Some((preset_key, preset)) => RoutedModel {
                    model_id: preset.model.clone(),
                    model_key: preset_key.to_string(),
                    temperature: preset.temperature,
                    max_tokens: preset.max_tokens,
                    auto_routed: false,
                },
                None => RoutedModel {
                    model_id: key.to_string(),
                    model_key: CUSTOM_MODEL_KEY.to_string(),
                    temperature: self.config.custom_temperature,
                    max_tokens: self.config.custom_max_tokens,
                    auto_routed: false,
                },
            };
        }

        let preset_key = preset_key_for(intent);
        let mut routed = match self.config.models.get(preset_key) {
            Some(preset) => RoutedModel {
                model_id: preset.model.clone(),
                model_key: preset_key.to_string(),
                temperature: preset.temperature,
                max_tokens: preset.max_tokens,
                auto_routed: true,
            },
            None => RoutedModel {
                model_id: self.config.fallback_model.clone(),
                model_key: preset_key.to_string(),
                temperature: self.config.custom_temperature,
                max_tokens: self.config.custom_max_tokens,
                auto_routed: true,
            },
        };
        if intent == Intent::CurrentEvents {
            routed.temperature = self.config.current_events_temperature;
        }
        routed
    }

    /// Find a preset by key, or by the model id it points at.
    pub fn resolve_preset(&self, key: &str) -> Option<(&str, &ModelPreset)> {
        self.config
            .models
            .get_key_value(key)
            .or_else(|| self.config.models.iter().find(|(_, p)| p.model == key))
            .map(|(k, p)| (k.as_str(), p))
    }

    /// Strip a `/<key> ` prefix naming a configured preset (or `/auto `).
    ///
    /// Unrecognized slash words are left in the text untouched.
    pub fn split_override<'a>(&self, text: &'a str) -> (Option<String>, &'a str) {
        match parse_model_override(text) {
            (Some(key), rest)
                if key.eq_ignore_ascii_case(AUTO_MODEL_KEY)
                    || self.config.models.contains_key(key) =>
            {
                (Some(key.to_string()), rest)
            }
            _ => (None, text),
        }
    }
}

/// Preset consulted for each intent.
fn preset_key_for(intent: Intent) -> &'static str {
    match intent {
        Intent::Coding => "code",
        Intent::Math => "math",
        Intent::CurrentEvents | Intent::General | Intent::AmbiguousPython => "fast",
    }
}

/// Split a leading `/word ` off `text`.
///
/// Returns `(Some(word), rest)` when the message starts with a slash word
/// followed by whitespace, or `(None, text)` otherwise.
pub fn parse_model_override(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start();
    let Some(command) = trimmed.strip_prefix('/') else {
        return (None, text);
    };
    match command.split_once(char::is_whitespace) {
        Some((word, rest)) if !word.is_empty() => (Some(word), rest.trim_start()),
        _ => (None, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn router() -> ModelRouter {
        ModelRouter::new(RoutingConfig::default())
    }

    #[test]
    fn known_key_is_used_verbatim() {
        let routed = router().route_model(Some("smart"), Intent::Coding);
        assert_eq!(routed.model_key, "smart");
        assert_eq!(routed.model_id, "openai/gpt-4o");
        assert!(!routed.auto_routed);
    }

    #[test]
    fn known_model_id_resolves_to_its_preset() {
        let routed = router().route_model(Some("anthropic/claude-3.5-sonnet"), Intent::General);
        assert_eq!(routed.model_key, "code");
        assert!(!routed.auto_routed);
    }

    #[test]
    fn unknown_key_becomes_custom_model() {
        let routed = router().route_model(Some("mistralai/mixtral-8x7b"), Intent::Math);
        assert_eq!(routed.model_id, "mistralai/mixtral-8x7b");
        assert_eq!(routed.model_key, CUSTOM_MODEL_KEY);
        assert_eq!(routed.temperature, 0.4);
        assert_eq!(routed.max_tokens, 1200);
        assert!(!routed.auto_routed);
    }

    #[test]
    fn auto_and_blank_keys_route_by_intent() {
        let r = router();
        for key in [None, Some("auto"), Some("AUTO"), Some("  ")] {
            let routed = r.route_model(key, Intent::Coding);
            assert_eq!(routed.model_key, "code");
            assert!(routed.auto_routed);
        }
    }

    #[test]
    fn intents_map_to_presets() {
        let r = router();
        assert_eq!(r.route_model(None, Intent::Math).model_key, "math");
        assert_eq!(r.route_model(None, Intent::General).model_key, "fast");
        assert_eq!(r.route_model(None, Intent::AmbiguousPython).model_key, "fast");
    }

    #[test]
    fn current_events_lowers_temperature() {
        let routed = router().route_model(None, Intent::CurrentEvents);
        assert_eq!(routed.model_key, "fast");
        assert_eq!(routed.temperature, 0.2);
        assert!(routed.auto_routed);
    }

    #[test]
    fn missing_preset_uses_fallback_model() {
        let mut config = RoutingConfig::default();
        config.models.remove("math");
        config.fallback_model = "vendor/fallback".to_string();

        let routed = ModelRouter::new(config).route_model(None, Intent::Math);
        assert_eq!(routed.model_id, "vendor/fallback");
        assert!(routed.auto_routed);
    }

    #[test]
    fn route_combines_classification_and_selection() {
        let decision = router().route("fix this python script error", None);
        assert_eq!(decision.intent, Intent::Coding);
        assert_eq!(decision.rule, Some("python_disambiguation"));
        assert_eq!(decision.model.model_key, "code");
    }

    #[test]
    fn parse_override_prefix() {
        assert_eq!(
            parse_model_override("/smart compare these"),
            (Some("smart"), "compare these")
        );
        assert_eq!(parse_model_override("plain text"), (None, "plain text"));
        assert_eq!(parse_model_override("/smart"), (None, "/smart"));
        assert_eq!(parse_model_override("/ spaced"), (None, "/ spaced"));
    }

    #[test]
    fn split_override_accepts_only_known_keys() {
        let r = router();
        assert_eq!(
            r.split_override("/code write a parser"),
            (Some("code".to_string()), "write a parser")
        );
        assert_eq!(
            r.split_override("/auto hello"),
            (Some("auto".to_string()), "hello")
        );
        assert_eq!(r.split_override("/etc/hosts is a file"), (None, "/etc/hosts is a file"));
    }

    proptest! {
        #[test]
        fn routing_always_yields_a_model(text in ".{0,200}") {
            let decision = router().route(&text, None);
            prop_assert!(!decision.model.model_id.is_empty());
            prop_assert!(decision.model.auto_routed);
        }
    }
}
