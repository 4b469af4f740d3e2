//! Run every enabled source once, dedupe, export, print the summary as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use leads_agent::config::{load_config_default, load_config_from};
use leads_agent::{Orchestrator, RunContext};

#[derive(Parser)]
#[command(name = "run_all", about = "Crawl all enabled lead sources once")]
struct Cli {
    /// Config file (TOML or JSON); default lookup when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated sources overriding the configured list
    #[arg(long, value_delimiter = ',')]
    platforms: Vec<String>,

    /// Keep the first rejected candidates and write rejected_<ts>.jsonl
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

    let orchestrator = Orchestrator::from_config(config)?;
    let mut ctx = RunContext::new(cli.debug_save_candidates);
    let outcome = if cli.platforms.is_empty() {
        orchestrator.run_all(&mut ctx).await
    } else {
        orchestrator.run(&cli.platforms, &mut ctx).await
    };

    println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    Ok(())
}
