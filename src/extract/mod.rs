//! Text helpers shared by every connector: normalization, emails, summaries, dates,
//! and the optional website contact crawl.

pub mod contact;
pub mod dates;
pub mod email;
pub mod summary;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Length cap applied by [`normalize_text`].
pub const MAX_NORMALIZED_CHARS: usize = 5000;

/// HTML-aware cleanup for scraped text: decode entities, strip tags, ASCII quotes,
/// collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Typographic quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_NORMALIZED_CHARS {
        out = out.chars().take(MAX_NORMALIZED_CHARS).collect();
    }
    out
}

/// Title and body joined the way every connector scores them.
pub fn join_title_body(title: &str, body: &str) -> String {
    match (title.trim().is_empty(), body.trim().is_empty()) {
        (true, _) => body.trim().to_string(),
        (_, true) => title.trim().to_string(),
        _ => format!("{} {}", title.trim(), body.trim()),
    }
}
