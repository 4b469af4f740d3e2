//! GitHub issues via the public search API.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::crawl::{crawl_listings, ListingSource};
use super::{Candidate, Connector, FetchContext};
use crate::config::ScraperConfig;
use crate::extract::dates;
use crate::fetch::Page;
use crate::models::SourceType;

const QUERIES: [&str; 9] = [
    "looking for developer",
    "hiring developer",
    "need help building",
    "contract developer",
    "agency freelance",
    "freelancer hire",
    "build MVP",
    "need developer",
    "hire freelancer",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    html_url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

pub(crate) fn search_url(query: &str) -> String {
    let q: String =
        url::form_urlencoded::byte_serialize(format!("\"{query}\" is:issue").as_bytes()).collect();
    format!("https://api.github.com/search/issues?q={q}&sort=updated&order=desc&per_page=50")
}

pub(crate) fn parse_search_json(body: &str) -> anyhow::Result<Vec<Candidate>> {
    let rsp: SearchResponse = serde_json::from_str(body).context("parsing github search json")?;
    Ok(rsp
        .items
        .into_iter()
        .map(|i| Candidate {
            title: i.title,
            body: i.body.unwrap_or_default(),
            author: i.user.map(|u| u.login),
            posted_at: i.created_at.as_deref().and_then(dates::parse_date),
            ..Candidate::new(i.html_url)
        })
        .collect())
}

#[derive(Debug, Default)]
pub struct GithubConnector;

impl ListingSource for GithubConnector {
    /// Configured keywords first, then the built-in queries.
    fn listing_urls(&self, cfg: &ScraperConfig) -> Vec<String> {
        cfg.search_keywords
            .iter()
            .map(String::as_str)
            .chain(QUERIES)
            .map(search_url)
            .collect()
    }

    fn parse_listing(&self, page: &Page) -> anyhow::Result<Vec<Candidate>> {
        parse_search_json(&page.body)
    }
}

#[async_trait]
impl Connector for GithubConnector {
    fn name(&self) -> &str {
        "github"
    }

    fn source_type(&self) -> SourceType {
        SourceType::JobBoard
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        crawl_listings(self, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_issue_search_items() {
        let body = r#"{"total_count":2,"items":[
            {"html_url":"https://github.com/o/r/issues/1","title":"Looking for developer",
             "body":"Contract role, budget $2k","user":{"login":"octo"},
             "created_at":"2025-02-03T04:05:06Z"},
            {"html_url":"https://github.com/o/r/issues/2","title":"Bug","body":null}
        ]}"#;
        let c = parse_search_json(body).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].author.as_deref(), Some("octo"));
        assert_eq!(
            c[0].posted_at.map(dates::to_iso).as_deref(),
            Some("2025-02-03T04:05:06Z")
        );
        assert_eq!(c[1].body, "");
        assert_eq!(c[1].posted_at, None);
    }

    #[test]
    fn search_url_is_encoded() {
        assert_eq!(
            search_url("need developer"),
            "https://api.github.com/search/issues?q=%22need+developer%22+is%3Aissue&sort=updated&order=desc&per_page=50"
        );
    }

    #[test]
    fn configured_keywords_lead_the_queries() {
        let cfg = ScraperConfig {
            search_keywords: vec!["rust contractor".into()],
            ..ScraperConfig::default()
        };
        let urls = GithubConnector.listing_urls(&cfg);
        assert_eq!(urls.len(), QUERIES.len() + 1);
        assert!(urls[0].contains("rust+contractor"));
    }
}
