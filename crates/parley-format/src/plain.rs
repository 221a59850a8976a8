// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Markdown-to-plain-text conversion for channels that render raw text.
//!
//! The reply is read line by line into blocks (headings, list items, prose,
//! fenced code), inline markup is removed from each, and the blocks are laid
//! out again with blank lines between unlike neighbours. Bullets, ordered
//! items and table rows all become one `1.`-style numbered list that restarts
//! after any non-list block.

use std::sync::LazyLock;

use regex::Regex;

use crate::EMPTY_REPLY_PLACEHOLDER;
use crate::ascii::to_ascii;
use crate::code::preserve_code;

/// Prose lines longer than this get a blank line on either side.
const LONG_PARAGRAPH_CHARS: usize = 280;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(```|~~~)\s*([\w+#.-]*)").unwrap());

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#{1,6}\s+(.*?)(?:\s+#+)?\s*$").unwrap());

static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-*_])(?:\s*[-*_]){2,}\s*$").unwrap());

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.+)$").unwrap());

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.+)$").unwrap());

static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*>\s?").unwrap());

static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?(?:\s*:?-+:?\s*\|)+\s*(?::?-+:?\s*)?$").unwrap());

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)[^)]*\)").unwrap());

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)[^)]*\)").unwrap());

static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());

static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__([^_]+)__").unwrap());

static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").unwrap());

static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w])_([^_\s](?:[^_]*[^_\s])?)_([^\w]|$)").unwrap()
});

static STRIKETHROUGH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~([^~]+)~~").unwrap());

static SPACED_OPERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)[ \t]*([+*=^])[ \t]*(\d)").unwrap());

/// `-` and `/` are only normalized when already spaced on one side, so
/// dates, ranges and fractions are left alone.
static LOOSE_MINUS_OR_SLASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d)(?:[ \t]+([-/])[ \t]*|[ \t]*([-/])[ \t]+)(\d)").unwrap()
});

static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading(String),
    Item(String),
    Text(String),
    Blank,
    Code { lang: Option<String>, body: String },
}

/// Convert Markdown-flavoured model output into plain professional text.
pub fn format_plain(text: &str) -> String {
    let rendered = render(&parse(text));
    if rendered.is_empty() {
        EMPTY_REPLY_PLACEHOLDER.to_string()
    } else {
        rendered
    }
}

fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lines = text.lines();

    while let Some(raw) = lines.next() {
        if let Some(caps) = FENCE.captures(raw) {
            let marker = caps[1].to_string();
            let lang = Some(caps[2].to_string()).filter(|l| !l.is_empty());
            let mut body = Vec::new();
            for inner in lines.by_ref() {
                if inner.trim_start().starts_with(&marker) {
                    break;
                }
                body.push(inner);
            }
            blocks.push(Block::Code {
                lang,
                body: preserve_code(&body.join("\n")),
            });
            continue;
        }
        blocks.push(classify(&to_ascii(raw)));
    }

    blocks
}

fn classify(line: &str) -> Block {
    let line = BLOCKQUOTE.replace(line, "");
    let trimmed = line.trim();

    if trimmed.is_empty() || RULE.is_match(trimmed) {
        return Block::Blank;
    }
    if trimmed.starts_with('|') {
        if TABLE_SEPARATOR.is_match(trimmed) {
            return Block::Blank;
        }
        let cells: Vec<String> = trimmed
            .split('|')
            .map(|cell| inline(cell.trim()))
            .filter(|cell| !cell.is_empty())
            .collect();
        return non_empty(cells.join(" - "), Block::Item);
    }
    if let Some(caps) = HEADING.captures(trimmed) {
        return non_empty(inline(&caps[1]), Block::Heading);
    }
    if let Some(caps) = BULLET.captures(trimmed).or_else(|| NUMBERED.captures(trimmed)) {
        return non_empty(inline(&caps[1]), Block::Item);
    }
    non_empty(inline(trimmed), Block::Text)
}

fn non_empty(text: String, wrap: fn(String) -> Block) -> Block {
    if text.is_empty() {
        Block::Blank
    } else {
        wrap(text)
    }
}

/// Remove inline markup and normalize spacing within one line.
fn inline(text: &str) -> String {
    let text = IMAGE.replace_all(text, "$1 ($2)");
    let text = LINK.replace_all(&text, "$1 ($2)");
    let text = INLINE_CODE.replace_all(&text, "$1");
    // Operators are spaced before emphasis is stripped so `2*3*4` never
    // reads as italics.
    let text = space_operators(&text);
    let text = BOLD_STARS.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1$2$3");
    let text = STRIKETHROUGH.replace_all(&text, "$1");
    MULTI_SPACE.replace_all(&text, " ").trim().to_string()
}

/// Put single spaces around arithmetic operators between numbers.
///
/// Regex matches can't overlap, so `1+2+3` needs more than one pass.
fn space_operators(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let spaced = SPACED_OPERATOR.replace_all(&current, "$1 $2 $3").into_owned();
        let next = LOOSE_MINUS_OR_SLASH
            .replace_all(&spaced, "$1 $2$3 $4")
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn push_blank(out: &mut Vec<String>) {
    if out.last().is_some_and(|line| !line.is_empty()) {
        out.push(String::new());
    }
}

fn render(blocks: &[Block]) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut item_number = 0usize;
    let mut in_list = false;
    let mut pending_blank = false;

    for block in blocks {
        match block {
            Block::Blank => pending_blank = true,
            Block::Item(text) => {
                // Blank lines between items of one list are dropped.
                if !in_list {
                    push_blank(&mut out);
                    item_number = 0;
                }
                in_list = true;
                pending_blank = false;
                item_number += 1;
                out.push(format!("{item_number}. {text}"));
            }
            Block::Heading(text) => {
                push_blank(&mut out);
                out.push(text.clone());
                push_blank(&mut out);
                in_list = false;
                pending_blank = false;
            }
            Block::Text(text) => {
                let long = text.chars().count() > LONG_PARAGRAPH_CHARS;
                if in_list || pending_blank || long {
                    push_blank(&mut out);
                }
                out.push(text.clone());
                if long {
                    push_blank(&mut out);
                }
                in_list = false;
                pending_blank = false;
            }
            Block::Code { lang, body } => {
                push_blank(&mut out);
                out.push(match lang {
                    Some(lang) => format!("Code ({lang}):"),
                    None => "Code:".to_string(),
                });
                if !body.is_empty() {
                    out.push(body.clone());
                }
                push_blank(&mut out);
                in_list = false;
                pending_blank = false;
            }
        }
    }

    out.join("\n").trim().to_string()
}
