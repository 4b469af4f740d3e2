//! Rule-based project summary, no model involved.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scoring::{BUDGET_RE, REQUIREMENT_KEYWORDS};

pub const SUMMARY_MAX_CHARS: usize = 400;

const INTENT_VERBS: [&str; 6] = ["need", "looking", "hire", "build", "want", "seeking"];

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").expect("split regex"));
static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

fn sentence_weight(sentence: &str) -> u32 {
    let low = sentence.to_lowercase();
    let mut w = 0;
    w += 2 * REQUIREMENT_KEYWORDS
        .iter()
        .filter(|kw| low.contains(*kw))
        .count() as u32;
    if BUDGET_RE.is_match(sentence) {
        w += 3;
    }
    if INTENT_VERBS.iter().any(|v| low.contains(v)) {
        w += 1;
    }
    w
}

/// Short texts pass through (whitespace collapsed). Longer ones keep the highest-weight
/// sentences that fit in `max_chars`, joined with `". "`.
pub fn summarize_project(text: &str, max_chars: usize) -> String {
    let text = WS.replace_all(text.trim(), " ").to_string();
    if text.is_empty() {
        return String::new();
    }
    if text.chars().count() <= max_chars {
        return text;
    }

    let mut scored: Vec<(u32, &str)> = SENTENCE_SPLIT
        .split(&text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| (sentence_weight(s), s))
        .collect();
    // stable: equal weights keep document order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let mut picked: Vec<&str> = Vec::new();
    let mut total = 0usize;
    for (_, s) in scored {
        let len = s.chars().count() + 2;
        if total + len > max_chars {
            break;
        }
        picked.push(s);
        total += len;
    }

    let result = picked.join(". ");
    if result.is_empty() {
        return text.chars().take(max_chars).collect();
    }
    if result.chars().count() > max_chars {
        let mut cut: String = result.chars().take(max_chars.saturating_sub(3)).collect();
        cut.push_str("...");
        return cut;
    }
    result
}
