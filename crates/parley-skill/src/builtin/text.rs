// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain string transforms: summarize, rewrite by tone, extract key points.

use std::sync::LazyLock;

use async_trait::async_trait;
use parley_core::ParleyError;
use regex::Regex;
use serde_json::{Value, json};

use crate::tool::{Tool, ToolOutput, required_str};

const SUMMARY_SENTENCES: usize = 3;
const MAX_KEY_POINTS: usize = 8;

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").unwrap());

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+•]|\d+[.)])\s+").unwrap());

fn sentences(text: &str) -> Vec<String> {
    let flat = WHITESPACE.replace_all(text.trim(), " ");
    SENTENCE
        .find_iter(&flat)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// First three sentences of `text`, whitespace normalized.
pub fn summarize_text(text: &str) -> Result<String, ParleyError> {
    let all = sentences(text);
    if all.is_empty() {
        return Err(ParleyError::skill("nothing to summarize"));
    }
    Ok(all
        .into_iter()
        .take(SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(" "))
}

/// Target register for [`rewrite_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Formal,
    Casual,
    Concise,
}

impl Tone {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "formal" | "professional" => Some(Tone::Formal),
            "casual" | "friendly" | "informal" => Some(Tone::Casual),
            "concise" | "short" | "brief" => Some(Tone::Concise),
            _ => None,
        }
    }

    fn rules(self) -> &'static [(Regex, &'static str)] {
        match self {
            Tone::Formal => FORMAL.as_slice(),
            Tone::Casual => CASUAL.as_slice(),
            Tone::Concise => CONCISE.as_slice(),
        }
    }
}

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), *replacement))
        .collect()
}

static FORMAL: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bcan't\b", "cannot"),
        (r"(?i)\bwon't\b", "will not"),
        (r"(?i)\b(\w+)n't\b", "$1 not"),
        (r"(?i)\bi'm\b", "I am"),
        (r"(?i)\b(\w+)'re\b", "$1 are"),
        (r"(?i)\b(\w+)'ll\b", "$1 will"),
        (r"(?i)\b(\w+)'ve\b", "$1 have"),
        (r"(?i)\bgonna\b", "going to"),
        (r"(?i)\bwanna\b", "want to"),
        (r"(?i)\bkinda\b", "somewhat"),
        (r"(?i)\b(?:yeah|yep)\b", "yes"),
        (r"(?i)\bnope\b", "no"),
        (r"(?i)\b(?:hey|hi)\b", "hello"),
        (r"(?i)\bthanks\b", "thank you"),
        (r"(?i)\blots of\b", "many"),
    ])
});

static CASUAL: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bdo not\b", "don't"),
        (r"(?i)\bdoes not\b", "doesn't"),
        (r"(?i)\bcannot\b", "can't"),
        (r"(?i)\bwill not\b", "won't"),
        (r"(?i)\bis not\b", "isn't"),
        (r"(?i)\bare not\b", "aren't"),
        (r"(?i)\bI am\b", "I'm"),
        (r"(?i)\bit is\b", "it's"),
        (r"(?i)\bhello\b", "hey"),
        (r"(?i)\bthank you\b", "thanks"),
        (r"(?i)\btherefore\b", "so"),
        (r"(?i)\bhowever\b", "but"),
        (r"(?i)\bregarding\b", "about"),
    ])
});

static CONCISE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bin order to\b", "to"),
        (r"(?i)\bdue to the fact that\b", "because"),
        (r"(?i)\bat this point in time\b", "now"),
        (r"(?i)\bin the event that\b", "if"),
        (r"(?i)\bfor the purpose of\b", "for"),
        (r"(?i)\b(?:it is important to note that|please note that)\s*", ""),
        (r"(?i)\b(?:very|really|basically|actually|just|quite|simply)\s+", ""),
    ])
});

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Rewrite `text` in the given tone using word-level substitutions.
pub fn rewrite_text(text: &str, tone: Tone) -> Result<String, ParleyError> {
    if text.trim().is_empty() {
        return Err(ParleyError::skill("nothing to rewrite"));
    }
    let mut out = text.trim().to_string();
    for (pattern, replacement) in tone.rules() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    let out = WHITESPACE.replace_all(&out, " ");
    let out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1");
    Ok(capitalize_first(out.trim()))
}

/// Numbered list of up to eight key points.
///
/// Multi-line input is taken line by line (existing list markers removed);
/// a single block of prose is split into sentences instead.
pub fn extract_key_points(text: &str) -> Result<String, ParleyError> {
    let lines: Vec<String> = text
        .lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    let points = if lines.len() >= 2 {
        lines
    } else {
        sentences(text)
    };
    if points.is_empty() {
        return Err(ParleyError::skill("no key points found"));
    }
    Ok(points
        .iter()
        .take(MAX_KEY_POINTS)
        .enumerate()
        .map(|(i, point)| format!("{}. {point}", i + 1))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn text_schema(extra: Option<(&str, Value)>) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "text".to_string(),
        json!({ "type": "string", "description": "Text to transform" }),
    );
    let mut required = vec![json!("text")];
    if let Some((name, schema)) = extra {
        properties.insert(name.to_string(), schema);
        required.push(json!(name));
    }
    json!({ "type": "object", "properties": properties, "required": required })
}

/// Summarizes text to its opening sentences.
pub struct SummarizeTextTool;

#[async_trait]
impl Tool for SummarizeTextTool {
    fn name(&self) -> &str {
        "summarize_text"
    }

    fn description(&self) -> &str {
        "Summarize text to its first three sentences"
    }

    fn parameters_schema(&self) -> Value {
        text_schema(None)
    }

    async fn invoke(&self, input: Value) -> Result<ToolOutput, ParleyError> {
        let text = required_str(&input, "text")?;
        Ok(ToolOutput::ok(summarize_text(text)?))
    }
}

/// Rewrites text in a formal, casual or concise tone.
pub struct RewriteTextTool;

#[async_trait]
impl Tool for RewriteTextTool {
    fn name(&self) -> &str {
        "rewrite_text"
    }

    fn description(&self) -> &str {
        "Rewrite text in a formal, casual or concise tone"
    }

    fn parameters_schema(&self) -> Value {
        text_schema(Some((
            "tone",
            json!({ "type": "string", "enum": ["formal", "casual", "concise"] }),
        )))
    }

    async fn invoke(&self, input: Value) -> Result<ToolOutput, ParleyError> {
        let text = required_str(&input, "text")?;
        let tone_name = required_str(&input, "tone")?;
        let tone = Tone::parse(tone_name)
            .ok_or_else(|| ParleyError::skill(format!("unsupported tone '{tone_name}'")))?;
        Ok(ToolOutput::ok(rewrite_text(text, tone)?))
    }
}

/// Lists the key points of a text.
pub struct ExtractKeyPointsTool;

#[async_trait]
impl Tool for ExtractKeyPointsTool {
    fn name(&self) -> &str {
        "extract_key_points"
    }

    fn description(&self) -> &str {
        "Extract up to eight key points from text as a numbered list"
    }

    fn parameters_schema(&self) -> Value {
        text_schema(None)
    }

    async fn invoke(&self, input: Value) -> Result<ToolOutput, ParleyError> {
        let text = required_str(&input, "text")?;
        Ok(ToolOutput::ok(extract_key_points(text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_keeps_three_sentences() {
        let text = "One. Two!  Three?\nFour. Five.";
        assert_eq!(summarize_text(text).unwrap(), "One. Two! Three?");
        assert_eq!(summarize_text("no terminator").unwrap(), "no terminator");
        assert!(summarize_text("   ").is_err());
    }

    #[test]
    fn formal_expands_contractions() {
        let out = rewrite_text("hey, I can't come and we're gonna be late", Tone::Formal).unwrap();
        assert_eq!(out, "Hello, I cannot come and we are going to be late");
    }

    #[test]
    fn casual_contracts() {
        let out = rewrite_text("Hello. I am sure it is fine, however I do not know.", Tone::Casual)
            .unwrap();
        assert_eq!(out, "Hey. I'm sure it's fine, but I don't know.");
    }

    #[test]
    fn concise_drops_filler() {
        let out = rewrite_text(
            "Please note that we really need this in order to ship , basically.",
            Tone::Concise,
        )
        .unwrap();
        assert_eq!(out, "We need this to ship, basically.");
    }

    #[test]
    fn tone_parse_accepts_synonyms() {
        assert_eq!(Tone::parse(" Professional "), Some(Tone::Formal));
        assert_eq!(Tone::parse("brief"), Some(Tone::Concise));
        assert_eq!(Tone::parse("pirate"), None);
    }

    #[test]
    fn key_points_from_lines_strip_markers() {
        let out = extract_key_points("- alpha\n* beta\n\n3. gamma").unwrap();
        assert_eq!(out, "1. alpha\n2. beta\n3. gamma");
    }

    #[test]
    fn key_points_fall_back_to_sentences_and_cap_at_eight() {
        let text = (1..=10).map(|i| format!("Point {i}.")).collect::<Vec<_>>().join(" ");
        let out = extract_key_points(&text).unwrap();
        assert_eq!(out.lines().count(), 8);
        assert!(out.starts_with("1. Point 1."));
        assert!(out.ends_with("8. Point 8."));
    }

    #[tokio::test]
    async fn rewrite_tool_rejects_unknown_tone() {
        let err = RewriteTextTool
            .invoke(json!({"text": "hi", "tone": "pirate"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("pirate"));
    }
}
