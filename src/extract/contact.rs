//! Website contact crawl: homepage, /contact, /about and friends, bounded per site.

use tracing::debug;
use url::Url;

use super::email::{extract_and_normalize, extract_mailto};
use super::normalize_text;
use crate::fetch::PageFetcher;

/// Domains used in templates and docs, never a real contact.
const FAKE_DOMAINS: [&str; 5] = [
    "example.com",
    "email.com",
    "test.com",
    "domain.com",
    "yoursite.com",
];

const CONTACT_PATHS: [&str; 8] = [
    "/",
    "/contact",
    "/contact/",
    "/about",
    "/about/",
    "/about-us",
    "/company",
    "/team",
];

/// Candidate contact URLs on the same origin as `base_url`, most likely first.
pub fn contact_paths(base_url: &str) -> Vec<String> {
    let Ok(u) = Url::parse(base_url) else {
        return Vec::new();
    };
    let Some(host) = u.host_str() else {
        return Vec::new();
    };
    let origin = match u.port() {
        Some(p) => format!("{}://{}:{}", u.scheme(), host, p),
        None => format!("{}://{}", u.scheme(), host),
    };
    CONTACT_PATHS
        .iter()
        .map(|p| format!("{origin}{p}"))
        .collect()
}

fn is_fake(email: &str) -> bool {
    FAKE_DOMAINS.iter().any(|d| email.ends_with(&format!("@{d}")))
}

/// Emails on a single page body, mailto links first.
pub fn emails_on_page(body: &str) -> Vec<String> {
    let mut out = extract_mailto(body);
    for e in extract_and_normalize(&normalize_text(body)) {
        if !out.contains(&e) {
            out.push(e);
        }
    }
    out.retain(|e| !is_fake(e));
    out
}

/// Visit up to `max_pages` contact paths of `base_url`; collected emails in first-seen order.
pub async fn crawl_for_emails(
    fetcher: &dyn PageFetcher,
    base_url: &str,
    max_pages: usize,
) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for url in contact_paths(base_url).into_iter().take(max_pages) {
        let Some(page) = fetcher.visit_page(&url).await else {
            continue;
        };
        for e in emails_on_page(&page.body) {
            if !found.contains(&e) {
                found.push(e);
            }
        }
    }
    debug!(base_url, emails = found.len(), "contact crawl done");
    found
}
