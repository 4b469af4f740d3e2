use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder (first call only) and publish the
    /// configured global budget as a static gauge.
    pub fn init(global_budget_secs: u64) -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe();
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();

        gauge!("leads_global_budget_seconds").set(global_budget_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(
        "leads_platform_runs_total",
        "Connector runs by platform and outcome (ok|failed)."
    );
    describe_counter!("leads_pages_visited_total", "Pages recorded by all connectors.");
    describe_counter!("leads_items_scanned_total", "Candidates scanned by all connectors.");
    describe_counter!("leads_found_total", "Candidates accepted as leads, by platform.");
    describe_counter!("leads_stop_reason_total", "Connector runs by stop reason.");
    describe_counter!("leads_fetch_failures_total", "Page fetches that gave up.");
    describe_histogram!("leads_platform_seconds", "Wall time of one connector run.");
    describe_histogram!("leads_run_duration_seconds", "Wall time of a full run.");
    describe_gauge!("leads_unique_total", "Unique leads after dedupe in the last run.");
    describe_gauge!("leads_global_budget_seconds", "Configured global run budget.");
}
