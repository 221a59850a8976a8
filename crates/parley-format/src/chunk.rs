// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splitting long replies into size-bounded chunks.
//!
//! Limits are in characters, not bytes. Each cut prefers the last paragraph
//! break in the window, then the last line break, then the last space. A
//! break is only taken when it lies past half the window, so chunks never
//! shrink to a sliver; otherwise the text is hard-cut at the limit.

/// Break candidates, best first, with whether the text after the break
/// should lose its leading newlines.
const BREAKS: [(&str, bool); 3] = [("\n\n", true), ("\n", true), (" ", false)];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Text that already fits is returned as a single chunk. Whitespace at a
/// cut point is dropped; no other characters are.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let (head, tail) = split_window(rest, max_chars);
        if !head.trim().is_empty() {
            chunks.push(head.to_string());
        }
        rest = tail;
    }

    if !rest.trim().is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

/// Cut one chunk off the front of `text`, which is longer than `max_chars`.
fn split_window(text: &str, max_chars: usize) -> (&str, &str) {
    let limit = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| i);
    let window = &text[..limit];
    let half = max_chars / 2;

    for (sep, trim_newlines) in BREAKS {
        if let Some(pos) = window.rfind(sep) {
            if window[..pos].chars().count() > half {
                let tail = &text[pos + sep.len()..];
                let tail = if trim_newlines {
                    tail.trim_start_matches('\n')
                } else {
                    tail
                };
                return (window[..pos].trim_end(), tail);
            }
        }
    }

    (window, &text[limit..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("Short text", 100), vec!["Short text"]);
        assert_eq!(chunk_text("", 100), vec![""]);
    }

    #[test]
    fn splits_at_paragraph_break_near_middle() {
        let first = "a".repeat(1990);
        let second = "b".repeat(2008);
        let text = format!("{first}\n\n{second}");
        assert_eq!(text.chars().count(), 4000);

        let chunks = chunk_text(&text, 3500);
        assert_eq!(chunks, vec![first, second]);
    }

    #[test]
    fn prefers_paragraph_over_line_break() {
        let text = "Para one is here.\nline two\n\nPara two\nmore words here";
        let chunks = chunk_text(text, 30);
        assert_eq!(chunks[0], "Para one is here.\nline two");
    }

    #[test]
    fn early_paragraph_break_falls_back_to_space() {
        // The only paragraph break sits before half the window.
        let text = "Hi.\n\nThis sentence keeps going well past the limit";
        let chunks = chunk_text(text, 30);
        assert_eq!(chunks[0], "Hi.\n\nThis sentence keeps");
        assert_eq!(chunks[1], "going well past the limit");
        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
    }

    #[test]
    fn hard_cut_without_break() {
        let chunks = chunk_text("abcdefghijklmnopqrstuvwxyz", 10);
        assert_eq!(chunks, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "é".repeat(12);
        let chunks = chunk_text(&text, 5);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 5);
    }

    proptest! {
        #[test]
        fn chunks_respect_limit_and_keep_content(
            text in "[a-z .\n]{0,400}",
            max in 1usize..80,
        ) {
            let chunks = chunk_text(&text, max);
            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(chunk.chars().count() <= max);
            }
            let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
            prop_assert_eq!(strip(&chunks.concat()), strip(&text));
        }
    }
}
