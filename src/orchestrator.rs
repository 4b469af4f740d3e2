//! Sequential multi-source run under one global budget.
//!
//! Sources run one after another; the global budget is checked before each source starts and
//! again inside every source through its stop state. Leads are merged in source order,
//! deduplicated once and exported. A run always yields a [`RunSummary`].

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{gauge, histogram};
use tracing::{info, warn};

use crate::config::Config;
use crate::connectors::{run_connector, Registry, SourceEnv};
use crate::debug_candidates::RejectedCandidates;
use crate::dedupe::dedupe_leads;
use crate::export::{file_stamp, FileExporter, LeadExporter};
use crate::extract::dates;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{Lead, PlatformResult, RunSummary};
use crate::scoring::Scorer;
use crate::stop::StopLimits;

/// Per-run mutable state handed down to connectors.
#[derive(Debug, Default)]
pub struct RunContext {
    pub rejected: RejectedCandidates,
}

impl RunContext {
    pub fn new(save_rejected: bool) -> Self {
        Self {
            rejected: RejectedCandidates::new(save_rejected),
        }
    }
}

/// Summary plus the deduplicated leads it describes.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub leads: Vec<Lead>,
}

pub struct Orchestrator {
    config: Config,
    registry: Registry,
    fetcher: Arc<dyn PageFetcher>,
    exporter: Arc<dyn LeadExporter>,
    limits: StopLimits,
    scorer: Scorer,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        registry: Registry,
        fetcher: Arc<dyn PageFetcher>,
        exporter: Arc<dyn LeadExporter>,
    ) -> Self {
        let limits = config.stop_limits();
        let scorer = Scorer::with_keywords(&config.scraper.search_keywords);
        Self {
            config,
            registry,
            fetcher,
            exporter,
            limits,
            scorer,
        }
    }

    /// Live HTTP fetcher, file exporter, default registry.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);
        let exporter = Arc::new(FileExporter::new(config.output.clone()));
        Ok(Self::new(config, Registry::default(), fetcher, exporter))
    }

    /// Replace the thresholds derived from config.
    pub fn with_limits(mut self, limits: StopLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Every enabled source (or the defaults).
    pub async fn run_all(&self, ctx: &mut RunContext) -> RunOutcome {
        let names = self.config.platforms_to_run();
        self.run(&names, ctx).await
    }

    /// One source, no dedupe, no export.
    pub async fn run_one(&self, name: &str, ctx: &mut RunContext) -> PlatformResult {
        self.run_source(name, ctx, Instant::now()).await
    }

    async fn run_source(
        &self,
        name: &str,
        ctx: &mut RunContext,
        global_start: Instant,
    ) -> PlatformResult {
        let connector = self.registry.resolve(name);
        let env = SourceEnv {
            config: &self.config.scraper,
            limits: self.limits,
            fetcher: self.fetcher.as_ref(),
            scorer: &self.scorer,
            rejected: &mut ctx.rejected,
            cutoff: dates::cutoff_date(self.config.scraper.months_lookback),
        };
        run_connector(connector.as_ref(), env, global_start).await
    }

    pub async fn run(&self, names: &[String], ctx: &mut RunContext) -> RunOutcome {
        let started_at = Utc::now();
        let global_start = Instant::now();
        let run_id = file_stamp(started_at);
        info!(run_id = %run_id, platforms = ?names, "run start");

        let mut results: Vec<PlatformResult> = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if global_start.elapsed() >= self.limits.global_max_runtime {
                info!(
                    run_id = %run_id,
                    skipped = ?&names[i..],
                    "global budget exhausted; skipping remaining platforms"
                );
                break;
            }
            results.push(self.run_source(name, ctx, global_start).await);
        }

        let all: Vec<Lead> = results.iter().flat_map(|r| r.leads.iter().cloned()).collect();
        let unique = dedupe_leads(&all);

        let output_table = match self.exporter.export_table(&unique) {
            Ok(p) => p.display().to_string(),
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "table export failed");
                String::new()
            }
        };
        let output_jsonl = match self.exporter.export_lines(&unique) {
            Ok(p) => p.display().to_string(),
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "jsonl export failed");
                String::new()
            }
        };
        let output_rejected = if ctx.rejected.is_enabled() {
            match ctx.rejected.save(&self.config.output.dir, &run_id) {
                Ok(p) => p.map(|p| p.display().to_string()),
                Err(e) => {
                    warn!(run_id = %run_id, error = %e, "rejected candidates export failed");
                    None
                }
            }
        } else {
            None
        };

        let finished_at = Utc::now();
        let total_runtime_seconds = global_start.elapsed().as_secs_f64();
        let platforms_ok = results.iter().filter(|r| r.success).count();
        let summary = RunSummary {
            run_id,
            started_at: dates::to_iso(started_at),
            finished_at: dates::to_iso(finished_at),
            total_leads: all.len(),
            unique_leads_after_dedupe: unique.len(),
            platforms_run: results.len(),
            platforms_ok,
            platforms_failed: results.len() - platforms_ok,
            total_runtime_seconds,
            output_table,
            output_jsonl,
            output_rejected,
            platform_results: results,
        };

        histogram!("leads_run_duration_seconds").record(total_runtime_seconds);
        gauge!("leads_unique_total").set(unique.len() as f64);
        info!(
            run_id = %summary.run_id,
            platforms_run = summary.platforms_run,
            platforms_ok = summary.platforms_ok,
            total_leads = summary.total_leads,
            unique = summary.unique_leads_after_dedupe,
            seconds = total_runtime_seconds,
            "run finished"
        );

        RunOutcome {
            summary,
            leads: unique,
        }
    }
}
