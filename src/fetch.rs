//! Page fetch boundary.
//!
//! Every network read goes through [`PageFetcher::visit_page`], which absorbs failures:
//! `None` means "this page produced nothing", never "abort the source".

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::FetchError;

/// A fetched document.
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn visit_page(&self, url: &str) -> Option<Page>;
}

/// reqwest-backed fetcher with a per-request timeout and exponential backoff.
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: u32,
    backoff_unit: Duration,
}

impl HttpFetcher {
    pub fn new(cfg: &ScraperConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.page_timeout_ms))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            retries: cfg.fetch_retries,
            backoff_unit: Duration::from_secs(1),
        })
    }

    /// Base of the `unit * 2^attempt` sleep between attempts.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    async fn get_once(&self, url: &str) -> Result<Page, FetchError> {
        let rsp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = rsp.status();
        let final_url = rsp.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = rsp.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(Page {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Client errors other than 408/429 will not change on retry.
fn is_retryable(err: &FetchError) -> bool {
    match err {
        FetchError::Status { status, .. } => {
            *status >= 500 || *status == 429 || *status == 408
        }
        FetchError::Request { .. } => true,
        FetchError::InvalidUrl(_) => false,
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn visit_page(&self, url: &str) -> Option<Page> {
        if url::Url::parse(url).is_err() {
            let err = FetchError::InvalidUrl(url.to_string());
            warn!(error = %err, "skipping page");
            counter!("leads_fetch_failures_total").increment(1);
            return None;
        }

        let mut attempt: u32 = 0;
        loop {
            match self.get_once(url).await {
                Ok(page) => {
                    debug!(url, status = page.status, bytes = page.body.len(), "page fetched");
                    return Some(page);
                }
                Err(e) => {
                    if attempt < self.retries && is_retryable(&e) {
                        let wait = self.backoff_unit * 2u32.saturating_pow(attempt);
                        debug!(url, attempt, wait_ms = wait.as_millis() as u64, error = %e, "retrying page");
                        tokio::time::sleep(wait).await;
                        attempt += 1;
                        continue;
                    }
                    warn!(url, attempts = attempt + 1, error = %e, "page fetch failed");
                    counter!("leads_fetch_failures_total").increment(1);
                    return None;
                }
            }
        }
    }
}

/// Serves canned bodies by exact URL. Offline runs and fixture-driven tests.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn visit_page(&self, url: &str) -> Option<Page> {
        self.pages.get(url).map(|body| Page {
            url: url.to_string(),
            status: 200,
            body: body.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn retry_policy() {
        let st = |status| FetchError::Status {
            url: "u".into(),
            status,
        };
        assert!(is_retryable(&st(503)));
        assert!(is_retryable(&st(429)));
        assert!(!is_retryable(&st(404)));
        assert!(!is_retryable(&FetchError::InvalidUrl("x".into())));
    }

    #[tokio::test]
    async fn invalid_url_is_none_without_network() {
        let f = HttpFetcher::new(&ScraperConfig::default()).unwrap();
        assert!(f.visit_page("not a url").await.is_none());
    }

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    /// Answers 503 for the first `failures` hits, then 200.
    fn flaky_app(failures: u32, hits: Arc<AtomicU32>) -> axum::Router {
        axum::Router::new()
            .route(
                "/flaky",
                axum::routing::get(move || {
                    let hits = hits.clone();
                    async move {
                        if hits.fetch_add(1, Ordering::SeqCst) < failures {
                            (StatusCode::SERVICE_UNAVAILABLE, "busy")
                        } else {
                            (StatusCode::OK, "ready")
                        }
                    }
                }),
            )
            .route("/gone", axum::routing::get(|| async { StatusCode::NOT_FOUND }))
    }

    fn fast_fetcher() -> HttpFetcher {
        HttpFetcher::new(&ScraperConfig::default())
            .unwrap()
            .with_backoff_unit(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = serve(flaky_app(2, hits.clone())).await;

        let page = fast_fetcher().visit_page(&format!("{base}/flaky")).await;

        assert_eq!(page.map(|p| p.body).as_deref(), Some("ready"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = serve(flaky_app(10, hits.clone())).await;

        assert!(fast_fetcher().visit_page(&format!("{base}/flaky")).await.is_none());
        // first attempt plus two retries
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let base = serve(flaky_app(0, hits)).await;

        assert!(fast_fetcher().visit_page(&format!("{base}/gone")).await.is_none());
    }

    #[tokio::test]
    async fn static_fetcher_serves_known_urls_only() {
        let f = StaticFetcher::new().with_page("https://a.test/x", "hello");
        let p = f.visit_page("https://a.test/x").await.unwrap();
        assert_eq!((p.status, p.body.as_str()), (200, "hello"));
        assert!(f.visit_page("https://a.test/y").await.is_none());
    }
}
