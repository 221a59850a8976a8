// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Parley workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse purpose of a user message, used to pick a model preset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Coding,
    Math,
    General,
    CurrentEvents,
    /// "python" was mentioned without enough context to tell code from snakes.
    AmbiguousPython,
}

/// Model selection and sampling parameters for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedModel {
    pub model_id: String,
    /// Preset key the model came from, or `"custom"` for a raw model id.
    pub model_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub auto_routed: bool,
}

/// Role of a chat message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message in the conversation sent to the completion API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Links a tool message to the call it answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant message carrying the tool calls the model asked for.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Tool result message answering the call with `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Tool description offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments object.
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON text of the arguments, as streamed by the model.
    pub arguments_json: String,
}

/// Result of running a tool. Failures are carried in `is_error`, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedTool {
    pub name: String,
    pub input: serde_json::Value,
    pub output: String,
    pub is_error: bool,
}

/// Token accounting reported by the completion API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A request to the completion API.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Tools offered to the model. Empty means tool calling is disabled.
    pub tools: Vec<ToolSchema>,
}

/// A finished completion, whether it arrived in one body or as a stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResult {
    pub id: String,
    pub model: String,
    pub text: String,
    pub finish_reason: Option<String>,
    /// Requested tool calls in ascending stream index order.
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
}

impl CompletionResult {
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Row in the conversation lock table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationLock {
    pub chat_id: i64,
    pub owner: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of consuming one unit from a rate-limit bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn intent_display_round_trips() {
        for intent in Intent::iter() {
            let parsed = Intent::from_str(&intent.to_string()).expect("should parse back");
            assert_eq!(intent, parsed);
        }
        assert_eq!(Intent::CurrentEvents.to_string(), "current_events");
        assert_eq!(Intent::AmbiguousPython.to_string(), "ambiguous_python");
    }

    #[test]
    fn tool_message_links_call_id() {
        let msg = ChatMessage::tool("call_1", "4");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.content.as_deref(), Some("4"));
    }

    #[test]
    fn chat_message_serializes_without_empty_tool_fields() {
        let json = serde_json::to_value(ChatMessage::user("hi")).expect("serialize");
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn wants_tools_tracks_tool_calls() {
        let mut result = CompletionResult::default();
        assert!(!result.wants_tools());
        result.tool_calls.push(ToolCall::default());
        assert!(result.wants_tools());
    }
}
