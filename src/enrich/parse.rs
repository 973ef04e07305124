//! Turning raw model output into suggestion and tip lists

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_SUGGESTIONS: usize = 5;
pub const MAX_TIPS: usize = 7;

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<think>.*?(</think>|$)").unwrap());
static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}[.)]\s*(.*)$").unwrap());
static LEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*•]+|\d{1,2}[.)])\s*").unwrap());

/// Reasoning models prefix answers with <think> blocks; an unterminated one swallows the rest
pub fn strip_reasoning(raw: &str) -> String {
    THINK_BLOCK.replace_all(raw, "").trim().to_string()
}

fn clean_phrase(item: &str) -> String {
    let item = LEADING_MARKER.replace(item.trim(), "");
    item.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim()
        .to_string()
}

pub fn parse_suggestions(raw: &str) -> Vec<String> {
    strip_reasoning(raw)
        .split([',', '\n'])
        .map(clean_phrase)
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Keep numbered lines only, minus their "N." or "N)" prefix
pub fn parse_tips(raw: &str) -> Vec<String> {
    strip_reasoning(raw)
        .lines()
        .filter_map(|line| {
            NUMBERED_LINE
                .captures(line.trim())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .filter(|tip| !tip.is_empty())
        .take(MAX_TIPS)
        .collect()
}
