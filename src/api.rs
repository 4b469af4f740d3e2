use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::connectors::registry::normalize_name;
use crate::export::{list_outputs, OutputFile};
use crate::metrics::Metrics;
use crate::models::{Lead, PlatformResult, RunSummary};
use crate::orchestrator::{Orchestrator, RunContext, RunOutcome};

type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    /// Result of the most recent full run, served by `/runs/latest*`.
    last_run: Arc<RwLock<Option<RunOutcome>>>,
    /// One crawl at a time; a second request gets 409.
    running: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            last_run: Arc::new(RwLock::new(None)),
            running: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/run", post(run_all))
        .route("/run/{platform}", post(run_platform))
        .route("/runs/latest", get(latest_summary))
        .route("/runs/latest/leads", get(latest_leads))
        .route("/outputs", get(outputs))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Same as [`router`] plus `GET /metrics`.
pub fn router_with_metrics(state: AppState, metrics: &Metrics) -> Router {
    router(state).merge(metrics.router())
}

#[derive(Debug, Default, Deserialize)]
struct RunParams {
    /// Comma-separated source names; empty runs the configured set.
    #[serde(default)]
    platforms: Option<String>,
    #[serde(default)]
    debug: bool,
}

async fn run_all(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Result<Json<RunSummary>, ApiError> {
    let Ok(_guard) = state.running.try_lock() else {
        return Err((StatusCode::CONFLICT, "a run is already in progress".into()));
    };
    let mut ctx = RunContext::new(params.debug);
    let names: Vec<String> = params
        .platforms
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(normalize_name)
        .filter(|s| !s.is_empty())
        .collect();

    info!(platforms = ?names, debug = params.debug, "run requested over http");
    let outcome = if names.is_empty() {
        state.orchestrator.run_all(&mut ctx).await
    } else {
        state.orchestrator.run(&names, &mut ctx).await
    };

    let summary = outcome.summary.clone();
    *state.last_run.write().await = Some(outcome);
    Ok(Json(summary))
}

async fn run_platform(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<Json<PlatformResult>, ApiError> {
    let Ok(_guard) = state.running.try_lock() else {
        return Err((StatusCode::CONFLICT, "a run is already in progress".into()));
    };
    let mut ctx = RunContext::new(false);
    let result = state.orchestrator.run_one(&platform, &mut ctx).await;
    Ok(Json(result))
}

async fn latest_summary(State(state): State<AppState>) -> Result<Json<RunSummary>, ApiError> {
    match state.last_run.read().await.as_ref() {
        Some(o) => Ok(Json(o.summary.clone())),
        None => Err((StatusCode::NOT_FOUND, "no run yet".into())),
    }
}

async fn latest_leads(State(state): State<AppState>) -> Result<Json<Vec<Lead>>, ApiError> {
    match state.last_run.read().await.as_ref() {
        Some(o) => Ok(Json(o.leads.clone())),
        None => Err((StatusCode::NOT_FOUND, "no run yet".into())),
    }
}

async fn outputs(State(state): State<AppState>) -> Result<Json<Vec<OutputFile>>, ApiError> {
    let dir = state.orchestrator.config().output.dir.clone();
    list_outputs(&dir).map(Json).map_err(|e| {
        warn!(dir = %dir.display(), error = %e, "listing outputs failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}
