//! Search-engine discovery: DuckDuckGo HTML results, then each result page.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::crawl::{crawl_listings, ListingSource};
use super::{Candidate, Connector, FetchContext};
use crate::config::ScraperConfig;
use crate::extract::email::extract_mailto;
use crate::extract::{dates, normalize_text};
use crate::fetch::Page;
use crate::models::SourceType;

const QUERIES: [&str; 8] = [
    r#"site:reddit.com "looking for developer" email"#,
    r#"site:reddit.com/r/forhire "need" "@""#,
    r#"site:linkedin.com "looking for agency" "contact""#,
    r#"site:medium.com "looking for developer" "email""#,
    r#"site:github.com issues "need developer" "@""#,
    r#""looking for developer" "hire" email"#,
    r#""need an agency" contact"#,
    r#""seeking freelancer" email"#,
];

/// Result hosts that are never leads.
const SKIP_HOSTS: [&str; 3] = ["duckduckgo.com", "google.", "youtube.com"];

const RESULTS_PER_QUERY: usize = 8;

const MAIN_SELECTORS: [&str; 6] = [
    "main",
    "article",
    "[role='main']",
    "#content",
    ".post-content",
    "body",
];

fn sel(s: &str) -> anyhow::Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow::anyhow!("bad selector {s}: {e}"))
}

pub(crate) fn search_url(query: &str) -> String {
    let q: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://html.duckduckgo.com/html/?q={q}")
}

/// DuckDuckGo wraps results as `//duckduckgo.com/l/?uddg=<target>`.
fn unwrap_result_href(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let u = Url::parse(&absolute).ok()?;
    if u.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) && u.path().starts_with("/l/") {
        let target = u.query_pairs().find(|(k, _)| k == "uddg")?.1.into_owned();
        return Url::parse(&target).ok().map(|t| t.to_string());
    }
    matches!(u.scheme(), "http" | "https").then(|| u.to_string())
}

fn is_skipped(url: &str) -> bool {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();
    SKIP_HOSTS.iter().any(|s| host.contains(s))
}

pub(crate) fn parse_results(html: &str) -> anyhow::Result<Vec<Candidate>> {
    let doc = Html::parse_document(html);
    let anchors = sel("a.result__a")?;
    let mut out: Vec<Candidate> = Vec::new();
    for a in doc.select(&anchors) {
        let Some(target) = a.value().attr("href").and_then(unwrap_result_href) else {
            continue;
        };
        if is_skipped(&target) || out.iter().any(|c| c.url == target) {
            continue;
        }
        let title = a.text().collect::<String>().trim().to_string();
        out.push(Candidate {
            title,
            ..Candidate::new(target)
        });
        if out.len() >= RESULTS_PER_QUERY {
            break;
        }
    }
    Ok(out)
}

fn text_of(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let s = sel(selector).ok()?;
    doc.select(&s)
        .next()
        .and_then(|m| m.value().attr("content").map(|c| c.trim().to_string()))
        .filter(|c| !c.is_empty())
}

fn published_at(doc: &Html) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Some(d) = meta_content(doc, "meta[property='article:published_time']")
        .as_deref()
        .and_then(dates::parse_date)
    {
        return Some(d);
    }
    let s = sel("time").ok()?;
    let times: Vec<ElementRef<'_>> = doc.select(&s).collect();
    if let Some(d) = times
        .iter()
        .filter_map(|t| t.value().attr("datetime"))
        .find_map(dates::parse_date)
    {
        return Some(d);
    }
    // "3 days ago" style labels without a machine-readable attribute
    let now = chrono::Utc::now();
    times
        .iter()
        .find_map(|t| dates::parse_relative(&text_of(*t), now))
}

/// Fill a result stub from the page it points to.
pub(crate) fn parse_result_page(page: &Page, mut stub: Candidate) -> Option<Candidate> {
    let doc = Html::parse_document(&page.body);

    let heading = ["h1", "title"]
        .iter()
        .filter_map(|s| sel(s).ok())
        .find_map(|s| doc.select(&s).map(text_of).find(|t| !t.is_empty()));
    if let Some(t) = heading {
        stub.title = t;
    }
    stub.body = MAIN_SELECTORS
        .iter()
        .filter_map(|s| sel(s).ok())
        .find_map(|s| doc.select(&s).next().map(text_of))
        .unwrap_or_default();
    stub.author = meta_content(&doc, "meta[name='author']");
    stub.posted_at = published_at(&doc);
    stub.email_hint = extract_mailto(&page.body).into_iter().next();
    stub.website = Some(page.url.clone());
    Some(stub)
}

#[derive(Debug, Default)]
pub struct SearchDiscoveryConnector;

impl ListingSource for SearchDiscoveryConnector {
    fn listing_urls(&self, cfg: &ScraperConfig) -> Vec<String> {
        cfg.search_keywords
            .iter()
            .map(|kw| format!("\"{kw}\" email"))
            .chain(QUERIES.iter().map(|q| q.to_string()))
            .map(|q| search_url(&q))
            .collect()
    }

    fn parse_listing(&self, page: &Page) -> anyhow::Result<Vec<Candidate>> {
        parse_results(&page.body)
    }

    fn max_per_listing(&self) -> usize {
        RESULTS_PER_QUERY
    }

    fn needs_detail(&self) -> bool {
        true
    }

    fn parse_detail(&self, page: &Page, stub: Candidate) -> Option<Candidate> {
        parse_result_page(page, stub)
    }
}

#[async_trait]
impl Connector for SearchDiscoveryConnector {
    fn name(&self) -> &str {
        "search_discovery"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Search
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        crawl_listings(self, ctx).await
    }
}
