// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folding streamed chunks into a finished [`CompletionResult`].
//!
//! Providers stream text either as incremental deltas or as cumulative
//! message snapshots. The accumulator accepts both and reports only the new
//! text of each chunk, so the concatenation of reported deltas always equals
//! the final text.

use std::collections::BTreeMap;

use parley_core::{CompletionResult, TokenUsage, ToolCall};

use crate::types::{StreamChunk, ToolCallDelta};

/// Partially received tool call.
#[derive(Debug, Default)]
struct ToolCallBuilder {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Accumulates streamed chunks for one completion attempt.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    id: String,
    model: String,
    text: String,
    seen_chars: usize,
    finish_reason: Option<String>,
    usage: Option<TokenUsage>,
    tool_calls: BTreeMap<usize, ToolCallBuilder>,
    chunks: usize,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads applied so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Applies one payload and returns the text it added, if any.
    pub fn apply(&mut self, chunk: StreamChunk) -> Option<String> {
        self.chunks += 1;

        if let Some(id) = chunk.id.filter(|id| !id.is_empty()) {
            self.id = id;
        }
        if let Some(model) = chunk.model.filter(|m| !m.is_empty()) {
            self.model = model;
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage.into());
        }

        let choice = chunk.choices.into_iter().next()?;
        if let Some(reason) = choice.finish_reason {
            self.finish_reason = Some(reason);
        }

        let mut delta_text = String::new();
        if let Some(delta) = choice.delta {
            if let Some(content) = delta.content {
                delta_text = content.text();
            }
            for call in delta.tool_calls.unwrap_or_default() {
                self.apply_tool_delta(call);
            }
        }

        if delta_text.is_empty() {
            let snapshot = choice
                .message
                .and_then(|m| m.content)
                .map(|c| c.text())
                .unwrap_or_default();
            if snapshot.chars().count() > self.seen_chars {
                delta_text = snapshot.chars().skip(self.seen_chars).collect();
            }
        }

        if delta_text.is_empty() {
            return None;
        }
        self.seen_chars += delta_text.chars().count();
        self.text.push_str(&delta_text);
        Some(delta_text)
    }

    fn apply_tool_delta(&mut self, delta: ToolCallDelta) {
        let builder = self.tool_calls.entry(delta.index).or_default();
        if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
            builder.id = Some(id);
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                builder.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                builder.arguments.push_str(&arguments);
            }
        }
    }

    /// Finalizes the result. Tool calls are ordered by stream index.
    pub fn finish(self) -> CompletionResult {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .map(|(index, builder)| ToolCall {
                id: builder.id.unwrap_or_else(|| format!("call_{index}")),
                name: builder.name,
                arguments_json: builder.arguments,
            })
            .collect();

        CompletionResult {
            id: self.id,
            model: self.model,
            text: self.text,
            finish_reason: self.finish_reason,
            tool_calls,
            usage: self.usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(json: &str) -> StreamChunk {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn delta_provider_text_concatenates() {
        let mut acc = StreamAccumulator::new();
        let mut deltas = Vec::new();
        for json in [
            r#"{"id":"gen-1","model":"m","choices":[{"delta":{"role":"assistant","content":""}}]}"#,
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
            r#"{"choices":[{"delta":{},"finish_reason":"stop"}],"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#,
        ] {
            deltas.extend(acc.apply(chunk(json)));
        }
        let result = acc.finish();
        assert_eq!(deltas, vec!["Hel", "lo"]);
        assert_eq!(deltas.concat(), result.text);
        assert_eq!(result.id, "gen-1");
        assert_eq!(result.finish_reason.as_deref(), Some("stop"));
        assert_eq!(result.usage.unwrap().total_tokens, 7);
    }

    #[test]
    fn snapshot_provider_emits_only_new_suffix() {
        let mut acc = StreamAccumulator::new();
        let mut deltas = Vec::new();
        for snapshot in ["Hel", "Hello", "Hello wor", "Hello world", "Hello world"] {
            let json = serde_json::json!({"choices": [{"message": {"content": snapshot}}]});
            deltas.extend(acc.apply(serde_json::from_value(json).unwrap()));
        }
        assert_eq!(deltas, vec!["Hel", "lo", " wor", "ld"]);
        assert_eq!(acc.finish().text, "Hello world");
    }

    #[test]
    fn snapshot_suffix_counts_characters() {
        let mut acc = StreamAccumulator::new();
        acc.apply(chunk(r#"{"choices":[{"message":{"content":"héllo"}}]}"#));
        let delta = acc.apply(chunk(r#"{"choices":[{"message":{"content":"héllo wörld"}}]}"#));
        assert_eq!(delta.as_deref(), Some(" wörld"));
    }

    #[test]
    fn delta_text_wins_over_snapshot() {
        let mut acc = StreamAccumulator::new();
        let delta = acc.apply(chunk(
            r#"{"choices":[{"delta":{"content":"Hi"},"message":{"content":"Something else"}}]}"#,
        ));
        assert_eq!(delta.as_deref(), Some("Hi"));
        assert_eq!(acc.text(), "Hi");
    }

    #[test]
    fn array_content_parts_are_joined() {
        let mut acc = StreamAccumulator::new();
        let delta = acc.apply(chunk(
            r#"{"choices":[{"delta":{"content":[{"type":"text","text":"a"},{"type":"text","text":"b"}]}}]}"#,
        ));
        assert_eq!(delta.as_deref(), Some("ab"));
    }

    #[test]
    fn tool_calls_finalize_in_index_order() {
        let mut acc = StreamAccumulator::new();
        for json in [
            r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"id":"call_b","function":{"name":"current_","arguments":""}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_a","function":{"name":"calculator","arguments":"{\"expr"}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":1,"function":{"name":"time","arguments":"{}"}}]}}]}"#,
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"ession\":\"2+2\"}"}}]}}]}"#,
            r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#,
        ] {
            assert!(acc.apply(chunk(json)).is_none());
        }

        let result = acc.finish();
        assert!(result.wants_tools());
        assert_eq!(result.tool_calls.len(), 2);
        assert_eq!(result.tool_calls[0].id, "call_a");
        assert_eq!(result.tool_calls[0].name, "calculator");
        assert_eq!(result.tool_calls[0].arguments_json, r#"{"expression":"2+2"}"#);
        assert_eq!(result.tool_calls[1].id, "call_b");
        assert_eq!(result.tool_calls[1].name, "current_time");
        assert_eq!(result.tool_calls[1].arguments_json, "{}");
        assert_eq!(result.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn missing_tool_call_id_is_synthesized() {
        let mut acc = StreamAccumulator::new();
        acc.apply(chunk(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":2,"function":{"name":"calculator","arguments":"{}"}}]}}]}"#,
        ));
        assert_eq!(acc.finish().tool_calls[0].id, "call_2");
    }

    #[test]
    fn empty_choices_only_update_metadata() {
        let mut acc = StreamAccumulator::new();
        assert!(acc.apply(chunk(r#"{"id":"gen-9","choices":[]}"#)).is_none());
        assert_eq!(acc.chunks(), 1);
        assert_eq!(acc.finish().id, "gen-9");
    }
}
