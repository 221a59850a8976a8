// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parley configuration system.

use parley_config::diagnostic::ConfigError;
use parley_config::model::{OutputStyle, ParleyConfig};
use parley_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML covering every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_parley_config() {
    let toml = r#"
[agent]
name = "test-agent"
log_level = "debug"
system_prompt = "Be brief."

[completion]
base_url = "https://llm.example.com/v1"
api_key = "sk-test"
timeout_secs = 30
max_retries = 2

[storage]
database_path = "/tmp/parley-test.db"
wal_mode = false

[lock]
ttl_secs = 60
retry_delay_ms = 100
max_wait_secs = 90

[rate_limit]
window_secs = 30
max_requests = 5

[routing.models.fast]
model = "vendor/small"
temperature = 0.5
max_tokens = 800

[tools]
enabled = false
max_tool_rounds = 1

[output]
max_message_chars = 2000
style = "preserve"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "test-agent");
    assert_eq!(config.agent.system_prompt.as_deref(), Some("Be brief."));
    assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.completion.timeout_secs, 30);
    assert_eq!(config.completion.max_retries, 2);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.lock.ttl_secs, 60);
    assert_eq!(config.rate_limit.max_requests, 5);
    assert_eq!(config.routing.models["fast"].model, "vendor/small");
    assert!(!config.tools.enabled);
    assert_eq!(config.output.style, OutputStyle::Preserve);
}

/// Overriding one preset keeps the compiled-in ones.
#[test]
fn partial_routing_override_merges_with_defaults() {
    let toml = r#"
[routing.models.code]
model = "vendor/coder"
temperature = 0.1
max_tokens = 4000
"#;

    let config = load_config_from_str(toml).expect("should deserialize");
    assert_eq!(config.routing.models["code"].model, "vendor/coder");
    assert!(config.routing.models.contains_key("fast"));
    assert!(config.routing.models.contains_key("math"));
}

#[test]
fn unknown_field_in_lock_produces_error() {
    let toml = r#"
[lock]
ttl = 5
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("ttl"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telegram]
bot_token = "abc"
"#;

    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn serialized_defaults_are_sensible() {
    let config = ParleyConfig::default();

    assert_eq!(config.agent.name, "parley");
    assert_eq!(config.agent.log_level, "info");
    assert_eq!(
        config.completion.base_url,
        "https://openrouter.ai/api/v1/chat/completions"
    );
    assert!(config.completion.api_key.is_none());
    assert_eq!(config.lock.ttl_secs, 120);
    assert!(config.lock.max_wait_secs > config.lock.ttl_secs);
    assert_eq!(config.rate_limit.window_secs, 60);
    assert_eq!(config.routing.custom_temperature, 0.4);
    assert_eq!(config.routing.custom_max_tokens, 1200);
    assert_eq!(config.routing.current_events_temperature, 0.2);
    assert_eq!(config.output.max_message_chars, 3500);
    assert_eq!(config.output.style, OutputStyle::Plain);
}

/// Env overrides arrive as dotted keys; simulate them with a tuple provider.
#[test]
fn dotted_override_reaches_nested_field() {
    use figment::{Figment, providers::Serialized};

    let config: ParleyConfig = Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(("rate_limit.max_requests", 7))
        .extract()
        .expect("should merge override");

    assert_eq!(config.rate_limit.max_requests, 7);
}

#[serial_test::serial]
#[test]
fn env_var_overrides_file_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("parley.toml");
    std::fs::write(&path, "[rate_limit]\nmax_requests = 3\n").expect("write config");

    // SAFETY: serialized with the other env-mutating tests in this file.
    unsafe { std::env::set_var("PARLEY_RATE_LIMIT_MAX_REQUESTS", "9") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("PARLEY_RATE_LIMIT_MAX_REQUESTS") };

    let config = result.expect("should load");
    assert_eq!(config.rate_limit.max_requests, 9);
}

#[serial_test::serial]
#[test]
fn unrelated_parley_env_vars_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("parley.toml");
    std::fs::write(&path, "").expect("write config");

    // SAFETY: serialized with the other env-mutating tests in this file.
    unsafe { std::env::set_var("PARLEY_SOMETHING_ELSE", "1") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("PARLEY_SOMETHING_ELSE") };

    assert!(result.is_ok(), "unrelated env var should not break loading");
}

#[test]
fn diagnostic_unknown_key_suggests_correction() {
    let toml = r#"
[rate_limit]
max_request = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => Some((key.clone(), suggestion.clone())),
        _ => None,
    });
    let (key, suggestion) = suggestion.expect("should produce UnknownKey");
    assert!(key.ends_with("max_request"), "got key {key}");
    assert_eq!(suggestion.as_deref(), Some("max_requests"));
}

#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[lock]
ttl_secs = "long"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "expected an InvalidType diagnostic, got {errors:?}"
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "lock.ttl".to_string(),
        suggestion: Some("ttl_secs".to_string()),
        valid_keys: "ttl_secs, retry_delay_ms, max_wait_secs".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("should have help").to_string();
    assert!(help.contains("did you mean `ttl_secs`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("lock.ttl"));
}

#[test]
fn validation_rejects_short_lock_wait() {
    let toml = r#"
[lock]
ttl_secs = 60
max_wait_secs = 30
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("max_wait_secs"))
    }));
}

#[test]
fn load_and_validate_valid_toml() {
    let config = load_and_validate_str("[agent]\nname = \"ok\"\n").expect("should validate");
    assert_eq!(config.agent.name, "ok");
}
