//! Reddit: public subreddit JSON listings, no login.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::crawl::{crawl_listings, ListingSource};
use super::{Candidate, Connector, FetchContext};
use crate::config::ScraperConfig;
use crate::extract::dates;
use crate::fetch::Page;
use crate::models::SourceType;

pub const SUBREDDITS: [&str; 12] = [
    "forhire",
    "jobbit",
    "freelance",
    "startups",
    "entrepreneur",
    "smallbusiness",
    "webdev",
    "SaaS",
    "SideProject",
    "remotework",
    "hiring",
    "slavelabour",
];

const LISTING_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    created_utc: Option<f64>,
}

impl Post {
    fn into_candidate(self) -> Option<Candidate> {
        let url = if self.permalink.starts_with('/') {
            format!("https://www.reddit.com{}", self.permalink)
        } else if self.permalink.starts_with("http") {
            self.permalink
        } else {
            return None;
        };
        Some(Candidate {
            title: self.title,
            body: self.selftext,
            author: self.author.filter(|a| a != "[deleted]"),
            posted_at: self.created_utc.and_then(|t| dates::from_unix(t as i64)),
            ..Candidate::new(url)
        })
    }
}

pub(crate) fn parse_listing_json(body: &str) -> anyhow::Result<Vec<Candidate>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit listing json")?;
    Ok(listing
        .data
        .children
        .into_iter()
        .filter_map(|c| c.data.into_candidate())
        .collect())
}

#[derive(Debug, Default)]
pub struct RedditConnector;

impl ListingSource for RedditConnector {
    fn listing_urls(&self, _cfg: &ScraperConfig) -> Vec<String> {
        let mut urls = Vec::with_capacity(SUBREDDITS.len() * 2);
        for sub in SUBREDDITS {
            urls.push(format!(
                "https://www.reddit.com/r/{sub}/new.json?limit={LISTING_LIMIT}"
            ));
            urls.push(format!(
                "https://www.reddit.com/r/{sub}/search.json?q=hire+OR+developer+OR+freelance&restrict_sr=1&sort=new&t=year&limit={LISTING_LIMIT}"
            ));
        }
        urls
    }

    fn parse_listing(&self, page: &Page) -> anyhow::Result<Vec<Candidate>> {
        parse_listing_json(&page.body)
    }
}

#[async_trait]
impl Connector for RedditConnector {
    fn name(&self) -> &str {
        "reddit"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Forum
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        crawl_listings(self, ctx).await
    }
}
