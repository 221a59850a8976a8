// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline inspection commands: `parley classify` and `parley tools`.

use std::fmt::Write;

use parley_config::ParleyConfig;
use parley_router::ModelRouter;
use parley_skill::{ToolRegistry, should_enable_tools};

/// Describe how `text` would be routed without calling the API.
pub fn classify_report(config: &ParleyConfig, text: &str) -> String {
    let router = ModelRouter::new(config.routing.clone());
    let (override_key, body) = router.split_override(text);
    let decision = router.route(body, override_key.as_deref());
    let tools = config.tools.enabled && should_enable_tools(body);

    let mut out = String::new();
    let _ = writeln!(out, "intent:      {}", decision.intent);
    let _ = writeln!(out, "rule:        {}", decision.rule.unwrap_or("default"));
    if let Some(key) = &override_key {
        let _ = writeln!(out, "override:    {key}");
    }
    let _ = writeln!(out, "model key:   {}", decision.model.model_key);
    let _ = writeln!(out, "model:       {}", decision.model.model_id);
    let _ = writeln!(out, "temperature: {}", decision.model.temperature);
    let _ = writeln!(out, "max tokens:  {}", decision.model.max_tokens);
    let _ = writeln!(out, "tools:       {}", if tools { "offered" } else { "off" });
    out
}

/// List the built-in tools with their JSON parameter schemas.
pub fn tools_report(config: &ParleyConfig) -> String {
    let registry = ToolRegistry::with_builtins(&config.tools);
    let mut out = String::new();
    if !config.tools.enabled {
        out.push_str("(tool calling is disabled in configuration)\n");
    }
    for schema in registry.schemas() {
        let params = serde_json::to_string_pretty(&schema.parameters)
            .unwrap_or_else(|_| schema.parameters.to_string());
        let _ = writeln!(out, "{}: {}", schema.name, schema.description);
        for line in params.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_reports_code_routing() {
        let report = classify_report(&ParleyConfig::default(), "fix this bug in my rust code");
        assert!(report.contains("intent:      coding"), "{report}");
        assert!(report.contains("rule:        coding"), "{report}");
        assert!(report.contains("model key:   code"), "{report}");
        assert!(report.contains("anthropic/claude-3.5-sonnet"), "{report}");
    }

    #[test]
    fn classify_shows_override_and_tools() {
        let report = classify_report(&ParleyConfig::default(), "/math what's 12*7");
        assert!(report.contains("override:    math"), "{report}");
        assert!(report.contains("model key:   math"), "{report}");
        assert!(report.contains("tools:       offered"), "{report}");
    }

    #[test]
    fn tools_report_lists_calculator() {
        let report = tools_report(&ParleyConfig::default());
        assert!(report.contains("calculator:"), "{report}");
        assert!(report.contains("\"expression\""), "{report}");
    }
}
