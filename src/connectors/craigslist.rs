//! Craigslist gigs and jobs via per-city RSS search feeds.

use anyhow::Context;
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use super::crawl::{crawl_listings, ListingSource};
use super::{Candidate, Connector, FetchContext};
use crate::config::ScraperConfig;
use crate::extract::dates;
use crate::fetch::Page;
use crate::models::SourceType;

pub const CITIES: [&str; 23] = [
    "sfbay", "losangeles", "newyork", "seattle", "austin", "denver", "chicago", "boston", "dc",
    "miami", "atlanta", "dallas", "houston", "phoenix", "portland", "sandiego", "sacramento",
    "minneapolis", "philadelphia", "london", "bangalore", "mumbai", "delhi",
];

const SEARCH_TERMS: [&str; 6] = ["web", "app", "software", "python", "react", "AI"];

/// cpg = computer gigs, jjj = all jobs.
const SECTIONS: [&str; 2] = ["cpg", "jjj"];

// RSS 2.0 nests items in <channel>; the RDF flavour Craigslist serves puts them at the root.
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date", alias = "date")]
    dc_date: Option<String>,
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

fn city_of(url: &str) -> Option<String> {
    let host = url::Url::parse(url).ok()?.host_str()?.to_string();
    host.strip_suffix(".craigslist.org").map(str::to_string)
}

pub(crate) fn parse_feed(body: &str) -> anyhow::Result<Vec<Candidate>> {
    let feed: Feed = from_str(&scrub_html_entities_for_xml(body)).context("parsing craigslist rss")?;
    let items = feed
        .item
        .into_iter()
        .chain(feed.channel.into_iter().flat_map(|c| c.item));

    let mut out = Vec::new();
    for it in items {
        let Some(link) = it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) else {
            continue;
        };
        let posted_at = it
            .pub_date
            .as_deref()
            .and_then(dates::parse_rfc2822)
            .or_else(|| it.dc_date.as_deref().and_then(dates::parse_date));
        out.push(Candidate {
            title: it.title.unwrap_or_default(),
            body: crate::extract::normalize_text(&it.description.unwrap_or_default()),
            posted_at,
            location: city_of(&link),
            ..Candidate::new(link)
        });
    }
    Ok(out)
}

#[derive(Debug, Default)]
pub struct CraigslistConnector;

impl ListingSource for CraigslistConnector {
    fn listing_urls(&self, _cfg: &ScraperConfig) -> Vec<String> {
        let mut urls = Vec::new();
        for city in CITIES {
            for term in SEARCH_TERMS {
                for section in SECTIONS {
                    urls.push(format!(
                        "https://{city}.craigslist.org/search/{section}?query={term}&format=rss"
                    ));
                }
            }
        }
        urls
    }

    fn parse_listing(&self, page: &Page) -> anyhow::Result<Vec<Candidate>> {
        parse_feed(&page.body)
    }
}

#[async_trait]
impl Connector for CraigslistConnector {
    fn name(&self) -> &str {
        "craigslist"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Marketplace
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        crawl_listings(self, ctx).await
    }
}
