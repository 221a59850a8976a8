// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reduction of model output to plain ASCII.

/// ASCII replacement for common typographic characters, or `None` when the
/// character has no sensible ASCII form and should be dropped.
fn replacement(c: char) -> Option<&'static str> {
    let s = match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' | '\u{00AB}' | '\u{00BB}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => {
            "-"
        }
        '\u{2026}' => "...",
        '\u{2022}' | '\u{25CF}' | '\u{25E6}' | '\u{2023}' | '\u{2043}' => "-",
        '\u{00D7}' => "*",
        '\u{00F7}' => "/",
        '\u{2264}' => "<=",
        '\u{2265}' => ">=",
        '\u{2260}' => "!=",
        '\u{2192}' | '\u{27F6}' => "->",
        '\u{2190}' => "<-",
        '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' | '\u{202F}' => " ",
        '\u{00B0}' => " deg",
        '\u{00A9}' => "(c)",
        '\u{00AE}' => "(R)",
        '\u{2122}' => "(TM)",
        _ => return None,
    };
    Some(s)
}

/// Map typographic characters to ASCII and drop everything else non-ASCII.
///
/// Control characters other than newline and tab are dropped as well.
pub fn to_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            if !c.is_ascii_control() || c == '\n' || c == '\t' {
                out.push(c);
            }
        } else if let Some(s) = replacement(c) {
            out.push_str(s);
        }
    }
    out
}
