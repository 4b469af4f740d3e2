//! Cross-source deduplication.
//!
//! One left-to-right pass; the first occurrence of a lead wins. A lead is a duplicate when an
//! already accepted lead shares its normalized email, its `(platform, url)` pair, or its
//! client name together with its url. Composite keys need every part non-empty. Keys are
//! recorded only for accepted leads.

use std::collections::HashSet;

use tracing::debug;

use crate::extract::email::normalize_email;
use crate::models::Lead;

/// Lowercase, trim, and drop a single trailing slash.
pub fn normalize_url(url: &str) -> String {
    let u = url.trim().to_lowercase();
    match u.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => u,
    }
}

#[derive(Default)]
struct SeenKeys {
    emails: HashSet<String>,
    platform_urls: HashSet<(String, String)>,
    name_urls: HashSet<(String, String)>,
}

pub fn dedupe_leads(leads: &[Lead]) -> Vec<Lead> {
    let mut seen = SeenKeys::default();
    let mut out: Vec<Lead> = Vec::with_capacity(leads.len());

    for lead in leads {
        let email = normalize_email(&lead.email);
        let url = normalize_url(&lead.post_url);
        let platform = lead.platform.trim().to_lowercase();
        let name = lead.client_name.trim().to_lowercase();

        if !email.is_empty() && seen.emails.contains(&email) {
            continue;
        }
        let pu = (platform, url);
        let has_pu = !pu.0.is_empty() && !pu.1.is_empty();
        if has_pu && seen.platform_urls.contains(&pu) {
            continue;
        }
        let nu = (name, pu.1.clone());
        let has_nu = !nu.0.is_empty() && !nu.1.is_empty();
        if has_nu && seen.name_urls.contains(&nu) {
            continue;
        }

        if !email.is_empty() {
            seen.emails.insert(email);
        }
        if has_pu {
            seen.platform_urls.insert(pu);
        }
        if has_nu {
            seen.name_urls.insert(nu);
        }
        out.push(lead.clone());
    }

    debug!(input = leads.len(), unique = out.len(), "dedupe done");
    out
}
