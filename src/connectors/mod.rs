//! Source connectors.
//!
//! A [`Connector`] pushes leads into a [`FetchContext`] and consults it after every unit of
//! work. [`run_connector`] is the only way a connector is invoked: it owns the fresh
//! [`StopState`], times the run and turns errors or panics into a failed [`PlatformResult`]
//! without losing the leads already collected.

pub mod craigslist;
pub mod crawl;
pub mod github;
pub mod hackernews;
pub mod reddit;
pub mod registry;
pub mod search_discovery;
pub mod stub;

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::debug_candidates::{RejectReason, RejectedCandidates};
use crate::dedupe::normalize_url;
use crate::extract::contact::crawl_for_emails;
use crate::extract::email::extract_and_normalize;
use crate::extract::summary::{summarize_project, SUMMARY_MAX_CHARS};
use crate::extract::{dates, join_title_body, normalize_text};
use crate::fetch::{Page, PageFetcher};
use crate::models::{EmailSource, Lead, PlatformResult, SourceType, StopReason};
use crate::scoring::{anon_hash, should_save_lead, Scorer};
use crate::stop::{StopLimits, StopState};

pub use registry::Registry;

#[async_trait]
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    fn source_type(&self) -> SourceType {
        SourceType::Other
    }

    /// Crawl the source, pushing leads through `ctx`. Returning early is always allowed;
    /// leads accepted before an `Err` are kept.
    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()>;
}

/// A post/issue/listing as parsed from a source, before classification.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    /// Address found on the page outside the text (e.g. a `mailto:` link).
    pub email_hint: Option<String>,
    /// External site to crawl for a contact address when the post has none.
    pub website: Option<String>,
}

impl Candidate {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Everything a connector needs for one run, borrowed from the orchestrator.
pub struct SourceEnv<'a> {
    pub config: &'a ScraperConfig,
    pub limits: StopLimits,
    pub fetcher: &'a dyn PageFetcher,
    pub scorer: &'a Scorer,
    pub rejected: &'a mut RejectedCandidates,
    pub cutoff: DateTime<Utc>,
}

pub struct FetchContext<'a> {
    platform: String,
    source_type: SourceType,
    config: &'a ScraperConfig,
    cutoff: DateTime<Utc>,
    limits: StopLimits,
    state: StopState,
    fetcher: &'a dyn PageFetcher,
    scorer: &'a Scorer,
    rejected: &'a mut RejectedCandidates,
    leads: Vec<Lead>,
    seen_urls: HashSet<String>,
}

impl<'a> FetchContext<'a> {
    pub fn new(
        platform: &str,
        source_type: SourceType,
        env: SourceEnv<'a>,
        global_start: Instant,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            source_type,
            config: env.config,
            cutoff: env.cutoff,
            limits: env.limits,
            state: StopState::new(global_start, Instant::now()),
            fetcher: env.fetcher,
            scorer: env.scorer,
            rejected: env.rejected,
            leads: Vec::new(),
            seen_urls: HashSet::new(),
        }
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn config(&self) -> &ScraperConfig {
        self.config
    }

    pub fn state(&self) -> &StopState {
        &self.state
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    /// True once any stop condition fired. Logged the first time only.
    pub fn should_stop(&mut self) -> bool {
        let already = self.state.stopped_by.is_some();
        match self.state.check(&self.limits, Instant::now()) {
            Some(reason) => {
                if !already {
                    info!(
                        platform = %self.platform,
                        reason = %reason,
                        pages = self.state.pages_visited,
                        items = self.state.items_scanned,
                        "stop condition fired"
                    );
                }
                true
            }
            None => false,
        }
    }

    pub fn record_page(&mut self, new_leads: u32) {
        self.state.record_page_done(new_leads, Instant::now());
    }

    pub fn record_items(&mut self, n: u32) {
        self.state.record_items_scanned(n, Instant::now());
    }

    pub async fn visit(&self, url: &str) -> Option<Page> {
        self.fetcher.visit_page(url).await
    }

    /// Classify a candidate and keep it as a lead when it qualifies.
    pub async fn accept_candidate(&mut self, c: Candidate) -> bool {
        let text = normalize_text(&join_title_body(&c.title, &c.body));
        if text.is_empty() {
            self.reject(&c.url, &c.title, RejectReason::MissingText);
            return false;
        }
        let key = normalize_url(&c.url);
        if key.is_empty() || self.seen_urls.contains(&key) {
            self.reject(&c.url, &text, RejectReason::DuplicateUrl);
            return false;
        }
        if let Some(d) = c.posted_at {
            if d < self.cutoff {
                self.reject(&c.url, &text, RejectReason::OutsideLookback);
                return false;
            }
        }

        let (score, matched) = self.scorer.score(&text);
        let hinted = c.email_hint.as_deref().map(crate::extract::email::normalize_email);
        let has_email = text.contains('@') || hinted.as_deref().is_some_and(|e| !e.is_empty());
        if !should_save_lead(&text, has_email, score, &matched) {
            debug!(platform = %self.platform, id = %anon_hash(&text), score, "candidate rejected");
            self.reject(&c.url, &text, RejectReason::NoRequirementKeywords);
            return false;
        }

        let mut email = extract_and_normalize(&text)
            .into_iter()
            .next()
            .or(hinted.filter(|e| !e.is_empty()));
        let mut email_source = EmailSource::InPost;
        if email.is_none() && self.config.contact_pages_per_site > 0 {
            if let Some(site) = c.website.as_deref() {
                let found = crawl_for_emails(self.fetcher, site, self.config.contact_pages_per_site)
                    .await
                    .into_iter()
                    .next();
                if found.is_some() {
                    email = found;
                    email_source = EmailSource::ContactPage;
                }
            }
        }

        let mut lead = Lead::new(self.platform.clone(), c.url.trim())
            .with_client_name(c.author.as_deref().unwrap_or(""))
            .with_description(&summarize_project(&text, SUMMARY_MAX_CHARS))
            .with_snippet(&text)
            .with_score(score, matched)
            .with_source_type(self.source_type)
            .with_post_date(c.posted_at.map(dates::to_iso))
            .with_location(c.location.as_deref().unwrap_or(""));
        if let Some(e) = email {
            lead = lead.with_email(e, email_source);
        }

        self.seen_urls.insert(key);
        self.leads.push(lead);
        counter!("leads_found_total", "platform" => self.platform.clone()).increment(1);
        true
    }

    fn reject(&mut self, url: &str, snippet: &str, reason: RejectReason) {
        self.rejected.record(url, snippet, reason);
    }

    pub fn into_leads(self) -> Vec<Lead> {
        self.leads
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "connector panicked".to_string()
    }
}

/// Run one connector with a fresh stop state and failure isolation.
pub async fn run_connector(
    connector: &dyn Connector,
    env: SourceEnv<'_>,
    global_start: Instant,
) -> PlatformResult {
    let name = connector.name().to_string();
    info!(platform = %name, "platform_start");
    let t0 = Instant::now();

    let mut ctx = FetchContext::new(&name, connector.source_type(), env, global_start);
    let outcome = AssertUnwindSafe(connector.fetch(&mut ctx)).catch_unwind().await;
    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("{e:#}")),
        Err(panic) => Some(panic_message(panic.as_ref())),
    };

    let elapsed = t0.elapsed().as_secs_f64();
    let stopped_reason = match (&error, ctx.state.stopped_by) {
        (Some(_), _) => StopReason::Exception,
        (None, Some(r)) => r,
        (None, None) => StopReason::Ok,
    };
    let pages_visited = ctx.state.pages_visited;
    let items_scanned = ctx.state.items_scanned;
    let leads = ctx.into_leads();

    let outcome_label = if error.is_none() { "ok" } else { "failed" };
    counter!("leads_platform_runs_total", "platform" => name.clone(), "outcome" => outcome_label)
        .increment(1);
    counter!("leads_pages_visited_total").increment(u64::from(pages_visited));
    counter!("leads_items_scanned_total").increment(u64::from(items_scanned));
    counter!("leads_stop_reason_total", "reason" => stopped_reason.as_str()).increment(1);
    histogram!("leads_platform_seconds").record(elapsed);

    if let Some(e) = &error {
        warn!(platform = %name, error = %e, leads = leads.len(), "platform failed");
    }
    info!(
        platform = %name,
        pages_visited,
        items_scanned,
        leads_found = leads.len(),
        time_seconds = elapsed,
        error = ?error,
        stopped_reason = %stopped_reason,
        "platform_end"
    );

    PlatformResult {
        platform: name,
        success: error.is_none(),
        leads_found: leads.len(),
        leads,
        pages_visited,
        items_scanned,
        time_taken_seconds: elapsed,
        error,
        stopped_reason,
    }
}
