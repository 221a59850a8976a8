// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turn pipeline tests against the mock provider and a temp SQLite store.

use std::sync::Arc;
use std::time::Duration;

use parley_agent::TurnRequest;
use parley_core::{ChatMessage, Intent, ParleyError, Role};
use parley_test_utils::{TestHarness, text_reply, tool_reply};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn plain_turn_routes_and_shapes() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![text_reply("## Greeting\n\nHello **there**!")])
        .build()
        .await
        .unwrap();

    let outcome = harness.send_message(1, "write me a haiku about autumn").await.unwrap();

    assert_eq!(outcome.intent, Intent::General);
    assert_eq!(outcome.routed.model_key, "fast");
    assert_eq!(outcome.routed.model_id, "openai/gpt-4o-mini");
    assert!(outcome.routed.auto_routed);
    assert_eq!(outcome.text, "## Greeting\n\nHello **there**!");
    let joined = outcome.chunks.join("\n");
    assert!(joined.contains("Greeting"));
    assert!(joined.contains("Hello there!"));
    assert!(!joined.contains("**"));
    assert_eq!(outcome.usage.unwrap().total_tokens, 30);
    assert_eq!(outcome.finish_reason.as_deref(), Some("stop"));
    assert!(outcome.executed_tools.is_empty());

    let requests = harness.mock_provider.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "openai/gpt-4o-mini");
    assert!(requests[0].tools.is_empty(), "plain chat should not offer tools");
}

#[tokio::test]
async fn system_prompt_and_history_precede_user_message() {
    let harness = TestHarness::builder()
        .with_system_prompt("You are terse.")
        .build()
        .await
        .unwrap();

    let request = TurnRequest::new(7, "and then?").with_history(vec![
        ChatMessage::user("tell me a story"),
        ChatMessage::assistant("Once upon a time."),
    ]);
    harness.runner.run(request, None, None).await.unwrap();

    let sent = &harness.mock_provider.requests().await[0].messages;
    let roles: Vec<Role> = sent.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
    assert_eq!(sent[0].content.as_deref(), Some("You are terse."));
    assert_eq!(sent[3].content.as_deref(), Some("and then?"));
}

#[tokio::test]
async fn message_override_selects_preset_and_is_stripped() {
    let harness = TestHarness::builder().build().await.unwrap();

    let outcome = harness.send_message(3, "/code hello world").await.unwrap();
    assert_eq!(outcome.routed.model_key, "code");
    assert_eq!(outcome.routed.model_id, "anthropic/claude-3.5-sonnet");
    assert!(!outcome.routed.auto_routed);

    let requests = harness.mock_provider.requests().await;
    let last = requests[0].messages.last().unwrap();
    assert_eq!(last.content.as_deref(), Some("hello world"));
}

#[tokio::test]
async fn explicit_model_applies_without_prefix() {
    let harness = TestHarness::builder().build().await.unwrap();

    let request = TurnRequest::new(4, "hello").with_model("meta/llama-3-70b");
    let outcome = harness.runner.run(request, None, None).await.unwrap();
    assert_eq!(outcome.routed.model_id, "meta/llama-3-70b");
    assert_eq!(outcome.routed.temperature, harness.config.routing.custom_temperature);
}

#[tokio::test]
async fn tool_round_feeds_results_back() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            tool_reply(&[("call_1", "calculator", r#"{"expression":"12*7"}"#)]),
            text_reply("The answer is 84."),
        ])
        .build()
        .await
        .unwrap();

    let outcome = harness.send_message(5, "what's 12*7").await.unwrap();

    assert_eq!(outcome.intent, Intent::Math);
    assert_eq!(outcome.text, "The answer is 84.");
    assert_eq!(outcome.executed_tools.len(), 1);
    assert_eq!(outcome.executed_tools[0].name, "calculator");
    assert_eq!(outcome.executed_tools[0].output, "84");
    assert!(!outcome.executed_tools[0].is_error);
    assert_eq!(outcome.usage.unwrap().total_tokens, 60);

    let requests = harness.mock_provider.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].tools.is_empty());

    let followup = &requests[1].messages;
    let assistant = &followup[followup.len() - 2];
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.tool_calls[0].id, "call_1");
    let tool = followup.last().unwrap();
    assert_eq!(tool.role, Role::Tool);
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool.content.as_deref(), Some("84"));
}

#[tokio::test]
async fn tool_failures_are_contained() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            tool_reply(&[
                ("call_a", "no_such_tool", "{}"),
                ("call_b", "calculator", r#"{"expression":"2+2; drop"}"#),
            ]),
            text_reply("Sorry, I could not compute that."),
        ])
        .build()
        .await
        .unwrap();

    let outcome = harness.send_message(6, "calculate 2+2; drop").await.unwrap();
    assert_eq!(outcome.executed_tools.len(), 2);
    assert!(outcome.executed_tools.iter().all(|t| t.is_error));
    assert_eq!(outcome.executed_tools[0].output, "unknown tool: no_such_tool");
    assert_eq!(outcome.text, "Sorry, I could not compute that.");
}

#[tokio::test]
async fn tools_disabled_are_never_offered_or_run() {
    let harness = TestHarness::builder()
        .with_tools_enabled(false)
        .with_mock_responses(vec![tool_reply(&[("call_1", "calculator", "{}")])])
        .build()
        .await
        .unwrap();

    let outcome = harness.send_message(8, "what's 12*7").await.unwrap();
    assert!(outcome.executed_tools.is_empty());
    assert_eq!(harness.mock_provider.call_count().await, 1);
    assert!(harness.mock_provider.requests().await[0].tools.is_empty());
}

#[tokio::test]
async fn tool_rounds_are_bounded() {
    let harness = TestHarness::builder()
        .with_max_tool_rounds(1)
        .with_mock_responses(vec![
            tool_reply(&[("call_1", "calculator", r#"{"expression":"1+1"}"#)]),
            text_reply("2"),
        ])
        .build()
        .await
        .unwrap();

    let outcome = harness.send_message(9, "compute 1+1").await.unwrap();
    assert_eq!(outcome.executed_tools.len(), 1);

    let requests = harness.mock_provider.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].tools.is_empty());
    assert!(requests[1].tools.is_empty(), "last round must not offer tools");
}

#[tokio::test]
async fn empty_reply_becomes_placeholder() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![text_reply("   ")])
        .build()
        .await
        .unwrap();

    let outcome = harness.send_message(10, "hello").await.unwrap();
    assert_eq!(outcome.chunks, vec![parley_format::EMPTY_REPLY_PLACEHOLDER.to_string()]);
}

#[tokio::test]
async fn rate_limit_rejects_excess_turns() {
    let harness = TestHarness::builder()
        .with_rate_limit(2, 60)
        .build()
        .await
        .unwrap();

    harness.send_message(11, "one").await.unwrap();
    harness.send_message(11, "two").await.unwrap();
    let err = harness.send_message(11, "three").await.unwrap_err();

    match err {
        ParleyError::RateLimitExceeded { bucket_key, .. } => assert_eq!(bucket_key, "chat:11"),
        other => panic!("expected RateLimitExceeded, got {other:?}"),
    }
    assert_eq!(harness.mock_provider.call_count().await, 2);

    // Other buckets are unaffected.
    harness.send_message(12, "one").await.unwrap();
}

#[tokio::test]
async fn same_chat_turns_never_overlap() {
    let harness = Arc::new(
        TestHarness::builder()
            .with_provider_delay(Duration::from_millis(50))
            .build()
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..3 {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move {
            harness.send_message(20, &format!("message {i}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(harness.mock_provider.call_count().await, 3);
    assert_eq!(harness.mock_provider.max_concurrent_calls(), 1);
}

#[tokio::test]
async fn different_chats_run_concurrently() {
    let harness = Arc::new(
        TestHarness::builder()
            .with_provider_delay(Duration::from_millis(300))
            .build()
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for chat_id in 30..33 {
        let harness = harness.clone();
        handles.push(tokio::spawn(async move {
            harness.send_message(chat_id, "hello").await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(harness.mock_provider.max_concurrent_calls() > 1);
}

#[tokio::test]
async fn streamed_deltas_match_final_text() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![text_reply("Streaming works one word at a time.")])
        .build()
        .await
        .unwrap();

    let (outcome, deltas) = harness
        .send_streaming(TurnRequest::new(40, "hello"), None)
        .await
        .unwrap();
    assert!(deltas.len() > 1);
    assert_eq!(deltas.concat(), outcome.text);
}

#[tokio::test]
async fn cancelled_turn_releases_the_lock() {
    let harness = TestHarness::builder()
        .with_provider_delay(Duration::from_millis(400))
        .build()
        .await
        .unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = harness
        .runner
        .run(TurnRequest::new(50, "hello"), None, Some(&token))
        .await
        .unwrap_err();
    assert!(err.is_cancelled(), "got: {err:?}");

    // The next turn on the same chat acquires the lock right away.
    let started = std::time::Instant::now();
    harness.send_message(50, "again").await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn provider_errors_propagate_unchanged() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .mock_provider
        .add_error(ParleyError::UpstreamHttp {
            status: 503,
            message: "overloaded".into(),
        })
        .await;

    let err = harness.send_message(60, "hello").await.unwrap_err();
    assert_eq!(err.status(), Some(503));

    // The lock was released despite the failure.
    harness.send_message(60, "hello again").await.unwrap();
}
