// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-based intent classification.
//!
//! Text is matched against an ordered list of rules in a single pass. The
//! first rule that returns an intent wins; if none does the intent is
//! [`Intent::General`]. No network, no model call.

use std::sync::LazyLock;

use parley_core::Intent;
use regex::Regex;

/// A named classification rule. Returning `None` passes the text on to the
/// next rule in the list.
#[derive(Clone, Copy)]
pub struct IntentRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<Intent>,
}

impl std::fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRule").field("name", &self.name).finish()
    }
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// Rule that decided, or `None` when the default applied.
    pub rule: Option<&'static str>,
}

static PYTHON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bpython\b").unwrap());

static PYTHON_PROGRAMMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(code|coding|script|scripts|function|functions|def|import|pip|install|library|libraries|package|packages|module|modules|django|flask|fastapi|pandas|numpy|syntax|error|errors|exception|traceback|debug|debugging|program|programming|loop|loops|variable|variables|interpreter|venv|virtualenv|lambda|decorator|dict|dictionary|tuple|list comprehension|class|classes|compile|runtime|api|json|regex|file|files)\b|\bpython ?[23](\.\d+)?\b|\.py\b",
    )
    .unwrap()
});

static PYTHON_ENTERTAINMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(monty|movie|movies|film|films|sketch|sketches|comedy|comedian|holy grail|flying circus|life of brian|cleese|silly walks?|show|episode|episodes|tv|netflix|actor|actors|cast)\b",
    )
    .unwrap()
});

static CODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(code|coding|program|programming|programmer|function|method|bug|bugs|debug|debugging|compile|compiler|compiling|syntax|stack ?trace|exception|segfault|null pointer|javascript|typescript|node\.?js|java|kotlin|swift|rust|golang|ruby|php|sql|html|css|regex|api|json|yaml|git|github|docker|kubernetes|algorithm|refactor|unit tests?|variable|script|repository|repo|npm|cargo|backend|frontend|database schema)\b|c\+\+|c#",
    )
    .unwrap()
});

static MATH_VOCABULARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(calculate|calculation|compute|solve|equation|equations|integral|derivative|algebra|geometry|calculus|trigonometry|percent|percentage|square root|sqrt|factorial|probability|logarithm|matrix|matrices|arithmetic|multiply|divide|divided by|plus|minus|average of|sum of)\b",
    )
    .unwrap()
});

/// Generic "digit operator digit", e.g. `12*4`, `3 + 5`, `2^10`.
static MATH_EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\s*[-+*/^%x×÷]\s*\d").unwrap());

static CURRENT_EVENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(news|latest|today|tonight|yesterday|this week|this morning|currently|right now|recent|recently|breaking|headlines?|election|elections|stock price|stock market|weather|forecast|score|scores|trending|happening|update on|who won)\b",
    )
    .unwrap()
});

/// Named carve-out for "python": code talk is coding, Monty Python talk is
/// left to the remaining rules, and anything else is ambiguous.
fn python_disambiguation(text: &str) -> Option<Intent> {
    if !PYTHON_WORD.is_match(text) {
        return None;
    }
    if PYTHON_PROGRAMMING.is_match(text) {
        return Some(Intent::Coding);
    }
    if PYTHON_ENTERTAINMENT.is_match(text) {
        return None;
    }
    Some(Intent::AmbiguousPython)
}

fn coding(text: &str) -> Option<Intent> {
    CODING.is_match(text).then_some(Intent::Coding)
}

fn math(text: &str) -> Option<Intent> {
    (MATH_EXPRESSION.is_match(text) || MATH_VOCABULARY.is_match(text)).then_some(Intent::Math)
}

fn current_events(text: &str) -> Option<Intent> {
    CURRENT_EVENTS.is_match(text).then_some(Intent::CurrentEvents)
}

/// Rules in evaluation order.
pub const DEFAULT_RULES: &[IntentRule] = &[
    IntentRule {
        name: "python_disambiguation",
        apply: python_disambiguation,
    },
    IntentRule {
        name: "coding",
        apply: coding,
    },
    IntentRule {
        name: "math",
        apply: math,
    },
    IntentRule {
        name: "current_events",
        apply: current_events,
    },
];

/// Ordered-rule intent classifier.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    /// Classifier with the built-in rule order.
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }

    /// Classifier with a custom rule order.
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, text: &str) -> Classification {
        let normalized = text.trim().to_lowercase();
        for rule in &self.rules {
            if let Some(intent) = (rule.apply)(&normalized) {
                return Classification {
                    intent,
                    rule: Some(rule.name),
                };
            }
        }
        Classification {
            intent: Intent::General,
            rule: None,
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify `text` with the built-in rules.
pub fn detect_intent(text: &str) -> Intent {
    static CLASSIFIER: LazyLock<IntentClassifier> = LazyLock::new(IntentClassifier::new);
    CLASSIFIER.classify(text).intent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_with_code_context_is_coding() {
        assert_eq!(detect_intent("fix this python script error"), Intent::Coding);
        assert_eq!(detect_intent("How do I install numpy for Python 3.12?"), Intent::Coding);
    }

    #[test]
    fn python_in_entertainment_context_is_not_ambiguous() {
        let intent = detect_intent("is python a good movie");
        assert_ne!(intent, Intent::AmbiguousPython);
        assert_eq!(intent, Intent::General);
    }

    #[test]
    fn bare_python_is_ambiguous() {
        assert_eq!(detect_intent("how long can a python grow?"), Intent::AmbiguousPython);
        assert_eq!(detect_intent("  PYTHON  "), Intent::AmbiguousPython);
    }

    #[test]
    fn entertainment_python_falls_through_to_later_rules() {
        assert_eq!(
            detect_intent("latest news about the monty python reunion show"),
            Intent::CurrentEvents
        );
    }

    #[test]
    fn arithmetic_is_math() {
        assert_eq!(detect_intent("what's 12*4+3"), Intent::Math);
        assert_eq!(detect_intent("solve the equation for x"), Intent::Math);
    }

    #[test]
    fn coding_vocabulary_is_coding() {
        assert_eq!(detect_intent("why does my rust code not compile"), Intent::Coding);
        assert_eq!(detect_intent("explain this C++ template"), Intent::Coding);
    }

    #[test]
    fn coding_outranks_math() {
        assert_eq!(detect_intent("write a function that returns 2+2"), Intent::Coding);
    }

    #[test]
    fn current_events_detected() {
        assert_eq!(detect_intent("what's the weather like today?"), Intent::CurrentEvents);
    }

    #[test]
    fn everything_else_is_general() {
        assert_eq!(detect_intent("write me a haiku about autumn"), Intent::General);
        assert_eq!(detect_intent(""), Intent::General);
    }

    #[test]
    fn classification_reports_deciding_rule() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("python traceback").rule, Some("python_disambiguation"));
        assert_eq!(c.classify("2 + 2").rule, Some("math"));
        assert_eq!(c.classify("hello").rule, None);
    }

    #[test]
    fn rules_can_be_reordered() {
        let mut rules = DEFAULT_RULES.to_vec();
        rules.swap(1, 2);
        let c = IntentClassifier::with_rules(rules);
        assert_eq!(c.classify("write a function that returns 2+2").intent, Intent::Math);
    }

    #[test]
    fn default_rule_order_is_stable() {
        let names: Vec<_> = IntentClassifier::new().rules().iter().map(|r| r.name).collect();
        assert_eq!(names, ["python_disambiguation", "coding", "math", "current_events"]);
    }
}
