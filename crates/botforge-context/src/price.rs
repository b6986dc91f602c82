// SPDX-FileCopyrightText: 2026 Botforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price-fact pinning for knowledge snapshots.
//!
//! Knowledge bases routinely exceed the prompt budget, and the lines users
//! actually ask about are prices. When a snapshot must be truncated, lines
//! carrying a currency amount are kept ahead of everything else so a
//! "narxi qancha?" question still sees the price list.

use std::sync::LazyLock;

use regex::Regex;

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\d[\d\s.,']*\s*(?:so'm|som|sum|сум|usd)(?:[^\p{L}']|$))|(?:\$\s?\d)|(?:\d\s?\$)",
    )
    .expect("valid price pattern")
});

/// Returns true when the line carries a currency amount.
pub fn is_price_line(line: &str) -> bool {
    PRICE_RE.is_match(line)
}

/// Fit a knowledge snapshot into `max_chars`, price lines first.
///
/// When the snapshot already fits it is returned untouched, preserving the
/// original line order. Otherwise price lines are kept in order of
/// appearance, then remaining lines fill whatever budget is left. A price
/// line longer than the whole budget is hard-cut rather than dropped.
pub fn squeeze(snapshot: &str, max_chars: usize) -> String {
    if snapshot.chars().count() <= max_chars {
        return snapshot.to_string();
    }

    let (price_lines, other_lines): (Vec<&str>, Vec<&str>) = snapshot
        .lines()
        .filter(|l| !l.trim().is_empty())
        .partition(|l| is_price_line(l));

    let mut out = String::new();
    let mut used = 0usize;

    for line in price_lines.iter().chain(other_lines.iter()) {
        let line_chars = line.chars().count();
        let sep = usize::from(!out.is_empty());
        if used + sep + line_chars <= max_chars {
            if sep == 1 {
                out.push('\n');
            }
            out.push_str(line);
            used += sep + line_chars;
        } else if out.is_empty() {
            // Nothing kept yet and the first price line alone overflows.
            out = line.chars().take(max_chars).collect();
            used = max_chars;
        }
    }

    out
}
