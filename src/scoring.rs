//! Requirement scoring: is this text someone asking to hire a developer/agency?
//!
//! Confidence is additive and capped at 100:
//! - contact evidence (`@`, "email", " contact ", `mailto:`): +40 once
//! - each distinct requirement keyword: +10, keywords capped at +40 total
//! - budget / money amount: +10 once
//! - first urgency term: +5 once
//! - recency marker ("202…" or a month abbreviation): +5 once
//!
//! A candidate is saved when any one of five paths in [`should_save_lead`] holds.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const REQUIREMENT_KEYWORDS: [&str; 25] = [
    "looking for developer",
    "need an agency",
    "seeking freelancer",
    "build mvp",
    "hire ai engineer",
    "need app built",
    "automation help",
    "looking for agency",
    "need developer",
    "hire developer",
    "freelance",
    "outsource",
    "need a dev",
    "looking for dev",
    "hire programmer",
    "need website",
    "build app",
    "need help with",
    "hiring",
    "contract",
    "agency",
    "freelancer",
    "mvp",
    "looking for",
    "need help",
];

pub const URGENCY: [&str; 6] = ["asap", "urgent", "immediately", "as soon as", "quick", "fast"];

/// Terms that, next to a budget, make a candidate worth keeping on their own.
const STRONG_INTENT: [&str; 5] = [
    "contact",
    "looking for developer",
    "hire",
    "need developer",
    "freelance",
];

const RECENCY_MARKERS: [&str; 13] = [
    "202", "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const CONTACT_POINTS: u32 = 40;
const KEYWORD_POINTS: u32 = 10;
const KEYWORD_CAP: u32 = 40;
const BUDGET_POINTS: u32 = 10;
const URGENCY_POINTS: u32 = 5;
const RECENCY_POINTS: u32 = 5;

pub(crate) static BUDGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\$₹€]\s*\d+|budget\s*:?\s*\d+|\d+\s*\$|\d+\s*usd").expect("budget regex")
});

static DEFAULT_SCORER: Lazy<Scorer> = Lazy::new(Scorer::default);

/// Keyword-driven requirement classifier. Stateless once built.
#[derive(Debug, Clone)]
pub struct Scorer {
    keywords: Vec<String>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::with_keywords(&[])
    }
}

impl Scorer {
    /// Configured keywords first, then the built-ins; lowercased, first occurrence wins.
    pub fn with_keywords(extra: &[String]) -> Self {
        let mut keywords: Vec<String> = Vec::with_capacity(extra.len() + REQUIREMENT_KEYWORDS.len());
        let all = extra
            .iter()
            .map(|s| s.as_str())
            .chain(REQUIREMENT_KEYWORDS.iter().copied());
        for kw in all {
            let kw = kw.trim().to_lowercase();
            if !kw.is_empty() && !keywords.contains(&kw) {
                keywords.push(kw);
            }
        }
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns `(confidence 0..=100, matched terms in order of first match)`.
    pub fn score(&self, text: &str) -> (u8, Vec<String>) {
        let t = text.trim().to_lowercase();
        if t.is_empty() {
            return (0, Vec::new());
        }
        let mut score = 0u32;
        let mut matched: Vec<String> = Vec::new();

        if has_contact_evidence(&t) {
            score += CONTACT_POINTS;
            push_unique(&mut matched, "contact");
        }

        let mut kw_score = 0u32;
        for kw in &self.keywords {
            if kw_score >= KEYWORD_CAP {
                break;
            }
            if t.contains(kw.as_str()) {
                kw_score += KEYWORD_POINTS;
                push_unique(&mut matched, kw);
            }
        }
        score += kw_score.min(KEYWORD_CAP);

        if BUDGET_RE.is_match(&t) {
            score += BUDGET_POINTS;
            push_unique(&mut matched, "budget");
        }

        if let Some(w) = URGENCY.iter().find(|w| t.contains(*w)) {
            score += URGENCY_POINTS;
            push_unique(&mut matched, w);
        }

        if RECENCY_MARKERS.iter().any(|m| t.contains(m)) {
            score += RECENCY_POINTS;
            push_unique(&mut matched, "recent");
        }

        let score = score.min(100) as u8;
        debug!(
            target: "scoring",
            id = %anon_hash(&t),
            score,
            matched = ?matched,
            "scored candidate"
        );
        (score, matched)
    }

    /// Score, then apply the save decision with `@` as the email signal.
    pub fn is_likely_requirement(&self, text: &str, min_score: u8) -> bool {
        let (score, matched) = self.score(text);
        if score < min_score {
            return false;
        }
        should_save_lead(text, text.contains('@'), score, &matched)
    }
}

fn has_contact_evidence(lower: &str) -> bool {
    lower.contains('@')
        || lower.contains("email")
        || lower.contains(" contact ")
        || lower.contains("mailto:")
}

fn push_unique(v: &mut Vec<String>, s: &str) {
    if !v.iter().any(|x| x == s) {
        v.push(s.to_string());
    }
}

/// Score with the built-in keyword list only.
pub fn score_requirement(text: &str) -> (u8, Vec<String>) {
    DEFAULT_SCORER.score(text)
}

pub fn is_likely_requirement(text: &str, min_score: u8) -> bool {
    DEFAULT_SCORER.is_likely_requirement(text, min_score)
}

/// Keep a candidate if ANY of:
/// (a) score >= 25 with an `@` in the text
/// (b) at least two matched terms and score >= 20
/// (c) a budget next to a strong-intent term
/// (d) score >= 60
/// (e) score >= 35
pub fn should_save_lead(text: &str, has_email: bool, score: u8, matched: &[String]) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if score >= 25 && has_email {
        return true;
    }
    if matched.len() >= 2 && score >= 20 {
        return true;
    }
    let has = |term: &str| matched.iter().any(|m| m == term);
    if has("budget") && STRONG_INTENT.iter().any(|k| has(k)) {
        return true;
    }
    if score >= 60 {
        return true;
    }
    score >= 35
}

/// Short stable id for candidate text; raw text never goes to logs.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
