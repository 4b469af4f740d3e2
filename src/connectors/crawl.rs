//! Shared "visit, check stop, record progress" loop for listing-style sources.
//!
//! A source supplies listing URLs and a listing parser; when its listings only link to
//! posts, it also supplies a detail parser and every candidate costs one extra page.
//! Every listing URL costs one page whether or not it could be fetched.

use tracing::{debug, warn};

use super::{Candidate, FetchContext};
use crate::config::ScraperConfig;
use crate::fetch::Page;

pub trait ListingSource: Send + Sync {
    fn listing_urls(&self, cfg: &ScraperConfig) -> Vec<String>;

    fn parse_listing(&self, page: &Page) -> anyhow::Result<Vec<Candidate>>;

    /// Candidates taken from one listing page.
    fn max_per_listing(&self) -> usize {
        25
    }

    fn needs_detail(&self) -> bool {
        false
    }

    /// Fill a listing stub from its detail page. `None` drops the candidate.
    fn parse_detail(&self, _page: &Page, stub: Candidate) -> Option<Candidate> {
        Some(stub)
    }
}

pub async fn crawl_listings<S>(src: &S, ctx: &mut FetchContext<'_>) -> anyhow::Result<()>
where
    S: ListingSource + ?Sized,
{
    let listings = src.listing_urls(ctx.config());
    debug!(platform = %ctx.platform(), listings = listings.len(), "crawl start");

    for listing_url in listings {
        if ctx.should_stop() {
            break;
        }
        let Some(page) = ctx.visit(&listing_url).await else {
            ctx.record_page(0);
            continue;
        };
        // in detail mode leads are credited to the post pages, so the listing adds none
        if src.needs_detail() {
            ctx.record_page(0);
        }
        let candidates = match src.parse_listing(&page) {
            Ok(c) => c,
            Err(e) => {
                warn!(platform = %ctx.platform(), url = %listing_url, error = %e, "listing parse failed");
                if !src.needs_detail() {
                    ctx.record_page(0);
                }
                continue;
            }
        };

        let mut new_on_listing = 0u32;
        for stub in candidates.into_iter().take(src.max_per_listing()) {
            if ctx.should_stop() {
                break;
            }
            ctx.record_items(1);

            if !src.needs_detail() {
                if ctx.accept_candidate(stub).await {
                    new_on_listing += 1;
                }
                continue;
            }

            let Some(detail) = ctx.visit(&stub.url).await else {
                ctx.record_page(0);
                continue;
            };
            let accepted = match src.parse_detail(&detail, stub) {
                Some(c) => ctx.accept_candidate(c).await,
                None => false,
            };
            ctx.record_page(u32::from(accepted));
        }

        if !src.needs_detail() {
            ctx.record_page(new_on_listing);
        }
    }
    Ok(())
}
