//! Lookback cutoff and the date formats sources actually emit.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/// A lookback month is counted as 31 days.
pub fn cutoff_from(now: DateTime<Utc>, months_lookback: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(months_lookback) * 31)
}

pub fn cutoff_date(months_lookback: u32) -> DateTime<Utc> {
    cutoff_from(Utc::now(), months_lookback)
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %b %Y",
];

/// ISO-8601 (with or without offset) and a handful of human formats; naive values are UTC.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
        }
    }
    None
}

static REL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(hour|day|week|month)").expect("relative date regex"));

/// "3 days ago", "1 week ago", "2 months ago", "5 hours ago", "today", "just now".
pub fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let t = text.trim().to_lowercase();
    if t.is_empty() {
        return None;
    }
    // days beat weeks beat months beat hours when several appear
    for unit in ["day", "week", "month", "hour"] {
        let hit = REL_RE
            .captures_iter(&t)
            .find(|c| c.get(2).map(|m| m.as_str()) == Some(unit));
        if let Some(c) = hit {
            let n: i64 = c.get(1)?.as_str().parse().ok()?;
            // counts beyond the representable range are not dates
            let delta = match unit {
                "day" => Duration::try_days(n),
                "week" => Duration::try_weeks(n),
                "month" => n.checked_mul(30).and_then(Duration::try_days),
                _ => Duration::try_hours(n),
            }?;
            return now.checked_sub_signed(delta);
        }
    }
    if t.contains("today") || t.contains("just now") {
        return Some(now);
    }
    None
}

pub fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// RSS `pubDate` values.
pub fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .and_then(|dt| from_unix(dt.unix_timestamp()))
}

pub fn to_iso(d: DateTime<Utc>) -> String {
    d.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
