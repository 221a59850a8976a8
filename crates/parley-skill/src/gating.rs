// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic deciding whether tool schemas are worth sending with a request.
//!
//! Leaving tools out keeps prompts small for plain chat. A false negative
//! only means the model answers without tools.

use std::sync::LazyLock;

use regex::Regex;

static ARITHMETIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\s*[-+*/^%×÷]\s*\(?\s*\d").unwrap());

static TOOL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(calculate|calculator|compute|evaluate|how much is|what is \d|convert|conversion|in (?:celsius|fahrenheit|kelvin|km|miles|meters|feet|inches|kg|pounds|lbs|grams|ounces|liters|gallons)|celsius|fahrenheit|what time|current time|time in|time zone|timezone|date today|today's date|summari[sz]e|summary|tl;?dr|rewrite|rephrase|more formal|more casual|make (?:it|this) (?:shorter|concise)|key points|main points|bullet points|takeaways)\b",
    )
    .unwrap()
});

/// Whether `text` looks like it could use a tool.
pub fn should_enable_tools(text: &str) -> bool {
    ARITHMETIC.is_match(text) || TOOL_KEYWORDS.is_match(text)
}
