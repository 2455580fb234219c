//! Parsing of generator responses.
//!
//! The structured JSON-array contract is primary; the numbered-list parser
//! is a legacy fallback for generators that ignore the output format.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::RawGeneratedItem;

static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+").unwrap());

/// Extract and parse the JSON array from a structured response.
///
/// Models routinely wrap JSON in markdown fences or prose; everything
/// outside the first `[` and last `]` is ignored. Returns `None` when no
/// parseable array is present or it contains no usable items.
pub fn parse_structured(text: &str) -> Option<Vec<RawGeneratedItem>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }

    let items: Vec<RawGeneratedItem> = serde_json::from_str(&text[start..=end]).ok()?;
    let items: Vec<RawGeneratedItem> = items
        .into_iter()
        .filter(|item| !item.content.trim().is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Legacy parser: split a numbered list into items.
///
/// Accepts `1. text` / `2) text` lines, strips the numbering and light
/// markdown emphasis, and drops everything else.
pub fn parse_numbered_list(text: &str) -> Vec<RawGeneratedItem> {
    text.lines()
        .filter(|line| NUMBERED_LINE.is_match(line))
        .map(|line| NUMBERED_LINE.replace(line, "").to_string())
        .map(|line| strip_emphasis(line.trim()))
        .filter(|line| !line.is_empty())
        .map(RawGeneratedItem::text)
        .collect()
}

/// Remove bold/italic/inline-code markers while leaving the text intact.
fn strip_emphasis(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' | '`' => {}
            '_' => {
                // Keep underscores inside words (snake_case identifiers)
                let prev_alnum = out.chars().last().is_some_and(|p| p.is_alphanumeric());
                let next_alnum = chars.peek().is_some_and(|n| n.is_alphanumeric());
                if prev_alnum && next_alnum {
                    out.push('_');
                }
            }
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}
