//! Run a single source. Prints its `PlatformResult`; `--export` also dedupes and writes files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use leads_agent::config::{load_config_default, load_config_from};
use leads_agent::dedupe::dedupe_leads;
use leads_agent::export::{FileExporter, LeadExporter};
use leads_agent::{Orchestrator, RunContext};
use serde_json::json;

#[derive(Parser)]
#[command(name = "run_platform", about = "Crawl one lead source")]
struct Cli {
    /// Source name, e.g. reddit, github, hackernews
    #[arg(long)]
    platform: String,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Dedupe the leads and write the table + JSONL exports
    #[arg(long)]
    export: bool,

    #[arg(long)]
    debug_save_candidates: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    leads_agent::init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(p) => load_config_from(p),
        None => load_config_default(),
    }
    .context("loading scraper config")?;
    let output = config.output.clone();

    let orchestrator = Orchestrator::from_config(config)?;
    let mut ctx = RunContext::new(cli.debug_save_candidates);
    let result = orchestrator.run_one(&cli.platform, &mut ctx).await;

    let mut report = json!({ "result": &result });
    if cli.export {
        let unique = dedupe_leads(&result.leads);
        let exporter = FileExporter::new(output.clone());
        let table = exporter.export_table(&unique)?;
        let lines = exporter.export_lines(&unique)?;
        report["unique_leads"] = json!(unique.len());
        report["output_table"] = json!(table.display().to_string());
        report["output_jsonl"] = json!(lines.display().to_string());
    }
    if ctx.rejected.is_enabled() {
        let stamp = leads_agent::export::file_stamp(chrono::Utc::now());
        if let Some(p) = ctx.rejected.save(&output.dir, &stamp)? {
            report["output_rejected"] = json!(p.display().to_string());
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
