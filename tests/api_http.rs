// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /runs/latest (404 before any run, summary after)
// - POST /run with a platform filter
// - POST /run/{platform}
// - GET /outputs

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    Router,
};
use http::{Request, StatusCode};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use leads_agent::api::{self, AppState};
use leads_agent::config::Config;
use leads_agent::connectors::{Candidate, Connector, FetchContext, Registry};
use leads_agent::export::FileExporter;
use leads_agent::fetch::StaticFetcher;
use leads_agent::Orchestrator;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// One qualifying post with an email, one weak post.
struct Board;

#[async_trait]
impl Connector for Board {
    fn name(&self) -> &str {
        "board"
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        let mut hit = Candidate::new("https://board.test/jobs/1");
        hit.title = "Need developer for a Shopify store, budget $800".into();
        hit.body = "Reach me at founder@acme.dev".into();
        hit.author = Some("acme".into());
        let mut miss = Candidate::new("https://board.test/jobs/2");
        miss.title = "Show off your desk setup".into();

        ctx.record_items(2);
        let mut new = 0;
        for c in [hit, miss] {
            if ctx.accept_candidate(c).await {
                new += 1;
            }
        }
        ctx.record_page(new);
        Ok(())
    }
}

fn test_router(dir: &Path) -> Router {
    let mut cfg = Config::default();
    cfg.output.dir = dir.to_path_buf();
    cfg.scraper.platforms = vec!["board".into()];

    let mut registry = Registry::empty();
    registry.register("board", || Arc::new(Board) as Arc<dyn Connector>);

    let orchestrator = Orchestrator::new(
        cfg.clone(),
        registry,
        Arc::new(StaticFetcher::new()),
        Arc::new(FileExporter::new(cfg.output)),
    );
    api::router(AppState::new(orchestrator))
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, bytes.to_vec())
}

fn json(bytes: &[u8]) -> Json {
    serde_json::from_slice(bytes).expect("valid JSON body")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, body) = send(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn latest_run_is_404_before_any_run() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, _) = send(&app, "GET", "/runs/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/runs/latest/leads").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_run_returns_summary_and_caches_it() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, body) = send(&app, "POST", "/run?platforms=board,Unknown-Site").await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["platforms_run"], 2);
    assert_eq!(v["platforms_ok"], 2);
    assert_eq!(v["total_leads"], 1);
    assert_eq!(v["unique_leads_after_dedupe"], 1);
    assert_eq!(v["platform_results"][1]["platform"], "unknown_site");
    assert!(v["output_table"].as_str().unwrap().ends_with(".csv"));

    let (status, body) = send(&app, "GET", "/runs/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["run_id"], v["run_id"]);

    let (status, body) = send(&app, "GET", "/runs/latest/leads").await;
    assert_eq!(status, StatusCode::OK);
    let leads = json(&body);
    assert_eq!(leads.as_array().map(Vec::len), Some(1));
    assert_eq!(leads[0]["email"], "founder@acme.dev");
    assert_eq!(leads[0]["client_name"], "acme");
}

#[tokio::test]
async fn post_run_without_filter_uses_configured_platforms() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, body) = send(&app, "POST", "/run").await;

    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["platforms_run"], 1);
    assert_eq!(v["platform_results"][0]["platform"], "board");
}

#[tokio::test]
async fn post_run_platform_returns_single_result() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (status, body) = send(&app, "POST", "/run/board").await;

    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["platform"], "board");
    assert_eq!(v["success"], true);
    assert_eq!(v["leads_found"], 1);
    assert_eq!(v["items_scanned"], 2);
    assert_eq!(v["stopped_reason"], "ok");

    // a single-source run is not a full run
    let (status, _) = send(&app, "GET", "/runs/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn outputs_lists_files_written_by_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_router(dir.path());

    let (_, body) = send(&app, "GET", "/outputs").await;
    assert_eq!(json(&body), serde_json::json!([]));

    send(&app, "POST", "/run?debug=true").await;

    let (status, body) = send(&app, "GET", "/outputs").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = json(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.iter().any(|n| n.ends_with(".csv")), "{names:?}");
    assert!(names.iter().any(|n| n.ends_with(".jsonl") && n.starts_with("leads_")));
    assert!(names.iter().any(|n| n.starts_with("rejected_")), "{names:?}");
}
