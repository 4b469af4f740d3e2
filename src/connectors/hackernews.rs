//! Hacker News through the Algolia search API (stories and comments, newest first).

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::crawl::{crawl_listings, ListingSource};
use super::{Candidate, Connector, FetchContext};
use crate::config::ScraperConfig;
use crate::extract::dates;
use crate::fetch::Page;
use crate::models::SourceType;

const QUERIES: [&str; 5] = [
    "who is hiring",
    "hiring developer",
    "looking for developer",
    "hire freelancer",
    "contract developer",
];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    story_title: Option<String>,
    story_text: Option<String>,
    comment_text: Option<String>,
    author: Option<String>,
    created_at_i: Option<i64>,
}

pub(crate) fn search_url(query: &str) -> String {
    let q: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://hn.algolia.com/api/v1/search_by_date?query={q}&tags=(story,comment)&hitsPerPage=50")
}

pub(crate) fn parse_search_json(body: &str) -> anyhow::Result<Vec<Candidate>> {
    let rsp: SearchResponse = serde_json::from_str(body).context("parsing hn algolia json")?;
    Ok(rsp
        .hits
        .into_iter()
        .filter(|h| !h.object_id.is_empty())
        .map(|h| {
            let title = h.title.or(h.story_title).unwrap_or_default();
            let body = h.comment_text.or(h.story_text).unwrap_or_default();
            Candidate {
                title,
                // comment/story text arrives as HTML
                body: crate::extract::normalize_text(&body),
                author: h.author,
                posted_at: h.created_at_i.and_then(dates::from_unix),
                ..Candidate::new(format!(
                    "https://news.ycombinator.com/item?id={}",
                    h.object_id
                ))
            }
        })
        .collect())
}

#[derive(Debug, Default)]
pub struct HackerNewsConnector;

impl ListingSource for HackerNewsConnector {
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

    fn max_per_listing(&self) -> usize {
        50
    }
}

#[async_trait]
impl Connector for HackerNewsConnector {
    fn name(&self) -> &str {
        "hackernews"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Forum
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        crawl_listings(self, ctx).await
    }
}
