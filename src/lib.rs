// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod connectors;
pub mod debug_candidates;
pub mod dedupe;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod scoring;
pub mod stop;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::models::{Lead, PlatformResult, RunSummary, StopReason};
pub use crate::orchestrator::{Orchestrator, RunContext, RunOutcome};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG` (default `leads_agent=info,warn`). `LEADS_LOG_JSON=1`
/// switches to one JSON object per line. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leads_agent=info,warn"));

    let json = std::env::var("LEADS_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}
