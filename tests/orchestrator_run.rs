// tests/orchestrator_run.rs
//
// End-to-end orchestrator scenarios with scripted connectors (no network):
// - a failing source keeps the leads it found before failing
// - the global budget skips remaining sources without recording failures
// - unknown names run as stubs
// - an all-failed run and a failed export still produce a summary
// - leads are deduplicated across sources

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use leads_agent::config::Config;
use leads_agent::connectors::{Candidate, Connector, FetchContext, Registry};
use leads_agent::error::ExportError;
use leads_agent::export::{FileExporter, LeadExporter};
use leads_agent::fetch::StaticFetcher;
use leads_agent::models::{Lead, StopReason};
use leads_agent::stop::StopLimits;
use leads_agent::{Orchestrator, RunContext};
use parking_lot::Mutex;

const HIT: &str = "Need developer, budget $500, contact me";

/// Emits `leads` qualifying candidates, optionally sleeping first, then fails if asked.
#[derive(Clone)]
struct Scripted {
    name: &'static str,
    leads: usize,
    email: Option<&'static str>,
    sleep: Duration,
    fail: bool,
}

impl Scripted {
    fn ok(name: &'static str, leads: usize) -> Self {
        Self {
            name,
            leads,
            email: None,
            sleep: Duration::ZERO,
            fail: false,
        }
    }
}

#[async_trait]
impl Connector for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        if !self.sleep.is_zero() {
            tokio::time::sleep(self.sleep).await;
        }
        for i in 0..self.leads {
            if ctx.should_stop() {
                break;
            }
            let mut c = Candidate::new(format!("https://{}.test/post/{i}", self.name));
            c.title = HIT.to_string();
            if let Some(e) = self.email {
                c.body = format!("write to {e}");
            }
            ctx.record_items(1);
            let ok = ctx.accept_candidate(c).await;
            ctx.record_page(u32::from(ok));
        }
        if self.fail {
            anyhow::bail!("{} went away", self.name);
        }
        Ok(())
    }
}

fn registry(connectors: Vec<Scripted>) -> Registry {
    let mut r = Registry::empty();
    for c in connectors {
        let name = c.name;
        r.register(name, move || Arc::new(c.clone()) as Arc<dyn Connector>);
    }
    r
}

fn config(dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.output.dir = dir.to_path_buf();
    cfg
}

fn orchestrator(dir: &Path, connectors: Vec<Scripted>) -> Orchestrator {
    let cfg = config(dir);
    Orchestrator::new(
        cfg.clone(),
        registry(connectors),
        Arc::new(StaticFetcher::new()),
        Arc::new(FileExporter::new(cfg.output)),
    )
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn failing_source_keeps_partial_leads() {
    let dir = tempfile::tempdir().unwrap();
    let flaky = Scripted {
        fail: true,
        ..Scripted::ok("flaky", 3)
    };
    let orch = orchestrator(dir.path(), vec![flaky, Scripted::ok("steady", 2)]);

    let out = orch
        .run(&names(&["flaky", "steady"]), &mut RunContext::default())
        .await;
    let s = &out.summary;

    assert_eq!(s.platforms_run, 2);
    assert_eq!(s.platforms_ok, 1);
    assert_eq!(s.platforms_failed, 1);

    let flaky = &s.platform_results[0];
    assert!(!flaky.success);
    assert_eq!(flaky.error.as_deref(), Some("flaky went away"));
    assert_eq!(flaky.leads_found, 3);
    assert_eq!(flaky.stopped_reason, StopReason::Exception);

    // partial leads still flow into the merged set
    assert_eq!(s.total_leads, 5);
    assert_eq!(s.unique_leads_after_dedupe, 5);
    assert_eq!(out.leads.len(), 5);
}

#[tokio::test]
async fn global_budget_skips_remaining_sources() {
    let dir = tempfile::tempdir().unwrap();
    let slow = |name| Scripted {
        sleep: Duration::from_millis(40),
        ..Scripted::ok(name, 1)
    };
    let orch = orchestrator(
        dir.path(),
        vec![slow("s1"), slow("s2"), slow("s3"), slow("s4"), slow("s5")],
    )
    .with_limits(StopLimits {
        global_max_runtime: Duration::from_millis(60),
        ..StopLimits::default()
    });

    let out = orch
        .run(&names(&["s1", "s2", "s3", "s4", "s5"]), &mut RunContext::default())
        .await;
    let s = &out.summary;

    assert!(s.platforms_run < 5, "ran {} sources", s.platforms_run);
    assert!(s.platforms_run >= 1);
    assert_eq!(s.platforms_failed, 0);
    assert!(s.platform_results.iter().all(|r| r.error.is_none()));
}

#[tokio::test]
async fn unknown_source_runs_as_stub() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec![]);

    let out = orch.run(&names(&["Up-Work"]), &mut RunContext::default()).await;
    let r = &out.summary.platform_results[0];

    assert_eq!(r.platform, "up_work");
    assert!(r.success);
    assert_eq!(r.leads_found, 0);
    assert_eq!(r.stopped_reason, StopReason::Ok);
}

#[tokio::test]
async fn all_failed_run_still_summarizes_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let bad = |name| Scripted {
        fail: true,
        ..Scripted::ok(name, 0)
    };
    let orch = orchestrator(dir.path(), vec![bad("a"), bad("b")]);

    let out = orch.run(&names(&["a", "b"]), &mut RunContext::default()).await;
    let s = &out.summary;

    assert_eq!(s.platforms_run, 2);
    assert_eq!(s.platforms_ok, 0);
    assert_eq!(s.platforms_failed, 2);
    assert_eq!(s.unique_leads_after_dedupe, 0);
    assert!(PathBuf::from(&s.output_table).exists());
    assert!(PathBuf::from(&s.output_jsonl).exists());
}

struct BrokenExporter;

impl LeadExporter for BrokenExporter {
    fn export_table(&self, _leads: &[Lead]) -> Result<PathBuf, ExportError> {
        Err(ExportError::OutputDir {
            path: PathBuf::from("/nope"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
    fn export_lines(&self, leads: &[Lead]) -> Result<PathBuf, ExportError> {
        self.export_table(leads)
    }
}

#[tokio::test]
async fn export_failure_leaves_paths_empty() {
    let dir = tempfile::tempdir().unwrap();
    let orch = Orchestrator::new(
        config(dir.path()),
        registry(vec![Scripted::ok("one", 2)]),
        Arc::new(StaticFetcher::new()),
        Arc::new(BrokenExporter),
    );

    let out = orch.run(&names(&["one"]), &mut RunContext::default()).await;

    assert_eq!(out.summary.unique_leads_after_dedupe, 2);
    assert_eq!(out.summary.output_table, "");
    assert_eq!(out.summary.output_jsonl, "");
}

/// Keeps what it was asked to export.
#[derive(Default)]
struct RecordingExporter {
    tables: Mutex<Vec<Vec<Lead>>>,
}

impl LeadExporter for RecordingExporter {
    fn export_table(&self, leads: &[Lead]) -> Result<PathBuf, ExportError> {
        self.tables.lock().push(leads.to_vec());
        Ok(PathBuf::from("memory.csv"))
    }
    fn export_lines(&self, _leads: &[Lead]) -> Result<PathBuf, ExportError> {
        Ok(PathBuf::from("memory.jsonl"))
    }
}

#[tokio::test]
async fn same_email_across_sources_is_one_lead() {
    let dir = tempfile::tempdir().unwrap();
    let a = Scripted {
        email: Some("Owner@Shop.io"),
        ..Scripted::ok("alpha", 1)
    };
    let b = Scripted {
        email: Some("owner@shop.io "),
        ..Scripted::ok("beta", 1)
    };
    let exporter = Arc::new(RecordingExporter::default());
    let orch = Orchestrator::new(
        config(dir.path()),
        registry(vec![a, b]),
        Arc::new(StaticFetcher::new()),
        exporter.clone(),
    );

    let out = orch.run(&names(&["alpha", "beta"]), &mut RunContext::default()).await;

    assert_eq!(out.summary.total_leads, 2);
    assert_eq!(out.summary.unique_leads_after_dedupe, 1);
    assert_eq!(out.summary.output_table, "memory.csv");
    assert_eq!(out.leads[0].platform, "alpha");
    assert_eq!(out.leads[0].email, "owner@shop.io");

    let tables = exporter.tables.lock();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0], out.leads);
}

/// Emits one weak candidate that the classifier rejects.
struct Weak;

#[async_trait]
impl Connector for Weak {
    fn name(&self) -> &str {
        "weak"
    }
    async fn fetch(&self, ctx: &mut FetchContext<'_>) -> anyhow::Result<()> {
        let mut c = Candidate::new("https://weak.test/1");
        c.title = "lovely weather".into();
        ctx.record_items(1);
        let ok = ctx.accept_candidate(c).await;
        ctx.record_page(u32::from(ok));
        Ok(())
    }
}

#[tokio::test]
async fn debug_run_writes_rejected_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let mut reg = Registry::empty();
    reg.register("weak", || Arc::new(Weak) as Arc<dyn Connector>);
    let cfg = config(dir.path());
    let orch = Orchestrator::new(
        cfg.clone(),
        reg,
        Arc::new(StaticFetcher::new()),
        Arc::new(FileExporter::new(cfg.output)),
    );

    let out = orch.run(&names(&["weak"]), &mut RunContext::new(true)).await;

    let path = out.summary.output_rejected.expect("rejected file written");
    let body = std::fs::read_to_string(path).unwrap();
    assert!(body.contains("\"reason\":\"no_requirement_keywords\""));
    assert!(body.contains("https://weak.test/1"));
}

#[tokio::test]
async fn run_one_returns_platform_result() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec![Scripted::ok("solo", 4)]);

    let r = orch.run_one("SOLO", &mut RunContext::default()).await;

    assert!(r.success);
    assert_eq!(r.platform, "solo");
    assert_eq!(r.leads_found, 4);
    assert_eq!(r.pages_visited, 4);
    assert_eq!(r.items_scanned, 4);
}
