// tests/metrics.rs
#![cfg(feature = "strict-metrics")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use leads_agent::api::{self, AppState};
use leads_agent::config::Config;
use leads_agent::connectors::{Candidate, Connector, FetchContext, Registry};
use leads_agent::export::FileExporter;
use leads_agent::fetch::StaticFetcher;
use leads_agent::metrics::Metrics;
use leads_agent::Orchestrator;

struct OneLead;

#[async_trait]
impl Connector for OneLead {
    fn name(&self) -> &str {
        "one_lead"
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        let mut c = Candidate::new("https://one.test/1");
        c.title = "Looking for developer to build mvp, budget $2000".into();
        ctx.record_items(1);
        let ok = ctx.accept_candidate(c).await;
        ctx.record_page(u32::from(ok));
        Ok(())
    }
}

// Full in-process app with /metrics merged, as the service binary builds it.
fn build_app(dir: &std::path::Path) -> Router {
    let mut cfg = Config::default();
    cfg.output.dir = dir.to_path_buf();
    cfg.scraper.platforms = vec!["one_lead".into()];
    let metrics = Metrics::init(cfg.scraper.global_max_runtime).expect("metrics recorder");

    let mut registry = Registry::empty();
    registry.register("one_lead", || Arc::new(OneLead) as Arc<dyn Connector>);
    let orchestrator = Orchestrator::new(
        cfg.clone(),
        registry,
        Arc::new(StaticFetcher::new()),
        Arc::new(FileExporter::new(cfg.output)),
    );
    api::router_with_metrics(AppState::new(orchestrator), &metrics)
}

async fn scrape(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn run_populates_prometheus_series() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(dir.path());

    let run = app
        .clone()
        .oneshot(Request::post("/run").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(run.status(), StatusCode::OK);

    let text = scrape(&app).await;
    for needle in [
        "leads_platform_runs_total",
        "leads_found_total",
        "leads_stop_reason_total",
        "leads_platform_seconds",
        "leads_run_duration_seconds",
        "leads_unique_total",
        "leads_global_budget_seconds 900",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
    assert!(text.contains(r#"platform="one_lead""#), "{text}");
}

#[tokio::test]
async fn init_is_idempotent() {
    let a = Metrics::init(900).expect("first init");
    let b = Metrics::init(900).expect("second init");
    assert_eq!(a.handle.render().is_empty(), b.handle.render().is_empty());
}
