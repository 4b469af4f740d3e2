//! Leads agent HTTP service entrypoint.
//! Boots the Axum server: config, orchestrator, Prometheus metrics, routes.

use leads_agent::api::{self, AppState};
use leads_agent::config::load_config_default;
use leads_agent::metrics::Metrics;
use leads_agent::Orchestrator;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    leads_agent::init_tracing();

    // Bad config is fatal at startup only.
    let config = load_config_default().map_err(anyhow::Error::from)?;
    let metrics = Metrics::init(config.scraper.global_max_runtime)?;

    let orchestrator = Orchestrator::from_config(config)?;
    let state = AppState::new(orchestrator);
    let router = api::router_with_metrics(state, &metrics);

    Ok(router.into())
}
