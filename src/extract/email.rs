//! Email extraction, normalization, validation.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w])([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})(?:[^\w]|$)")
        .expect("email regex")
});

static MAILTO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)mailto:([^"'?\s>]+)"#).expect("mailto regex")
});

const PLACEHOLDER_MARKERS: [&str; 5] = ["example", "test@", "your@", "noreply", "no-reply"];
const IMAGE_SUFFIXES: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

/// Lowercase + trim; returns `""` for placeholders, asset filenames and non-addresses.
pub fn normalize_email(email: &str) -> String {
    let e = email.trim().to_lowercase();
    if e.is_empty() || !e.contains('@') {
        return String::new();
    }
    if PLACEHOLDER_MARKERS.iter().any(|m| e.contains(m)) {
        return String::new();
    }
    if IMAGE_SUFFIXES.iter().any(|s| e.ends_with(s)) {
        return String::new();
    }
    e
}

/// Normalizes to non-empty and has a dotted domain part.
pub fn validate_email(email: &str) -> bool {
    let e = normalize_email(email);
    match e.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Raw address matches in order of appearance, duplicates removed.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in EMAIL_RE.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            let s = m.as_str().to_string();
            if !out.contains(&s) {
                out.push(s);
            }
        }
    }
    out
}

/// Extracted, normalized and validated; first-seen order.
pub fn extract_and_normalize(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in extract_emails(text) {
        let n = normalize_email(&raw);
        if !n.is_empty() && validate_email(&n) && !out.contains(&n) {
            out.push(n);
        }
    }
    out
}

/// Addresses from `mailto:` links in raw HTML.
pub fn extract_mailto(html: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in MAILTO_RE.captures_iter(html) {
        let Some(m) = cap.get(1) else { continue };
        let n = normalize_email(m.as_str());
        if validate_email(&n) && !out.contains(&n) {
            out.push(n);
        }
    }
    out
}
