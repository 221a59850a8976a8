// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whitespace-preserving cleanup for code sections.

use crate::ascii::to_ascii;

/// Strip non-ASCII noise from `text` while keeping indentation and interior
/// blank lines. Trailing whitespace on each line and blank lines at either
/// end are removed.
pub fn preserve_code(text: &str) -> String {
    let ascii = to_ascii(text);
    let lines: Vec<&str> = ascii.lines().map(str::trim_end).collect();

    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}
