// src/config/scraper.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::stop::StopLimits;

pub const ENV_CONFIG_PATH: &str = "SCRAPER_CONFIG_PATH";
const ENV_PREFIX: &str = "SCRAPER_";

/// Connectors used when the config enables none.
pub const DEFAULT_PLATFORMS: [&str; 5] = [
    "reddit",
    "github",
    "hackernews",
    "search_discovery",
    "craigslist",
];

/// Crawl thresholds, keyword list and enabled sources (`[scraper]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Seconds.
    pub max_runtime_per_platform: u64,
    pub max_pages_per_platform: u32,
    pub max_items_per_platform: u32,
    pub no_new_leads_limit: u32,
    /// The no-new-leads rule only fires after this many items were scanned.
    pub min_items_before_no_new: u32,
    /// Seconds without recorded progress before the watchdog fires.
    pub watchdog_timeout: u64,
    /// Seconds, shared by all sources of one run.
    pub global_max_runtime: u64,
    pub months_lookback: u32,
    pub page_timeout_ms: u64,
    /// Extra attempts after the first failed fetch.
    pub fetch_retries: u32,
    /// Pages per external site visited to find a contact email (0 disables).
    pub contact_pages_per_site: usize,
    pub user_agent: String,
    pub search_keywords: Vec<String>,
    /// Enabled sources in run order.
    pub platforms: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_runtime_per_platform: 120,
            max_pages_per_platform: 10,
            max_items_per_platform: 200,
            no_new_leads_limit: 3,
            min_items_before_no_new: 20,
            watchdog_timeout: 60,
            global_max_runtime: 900,
            months_lookback: 6,
            page_timeout_ms: 30_000,
            fetch_retries: 2,
            contact_pages_per_site: 0,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            search_keywords: Vec::new(),
            platforms: Vec::new(),
        }
    }
}

/// Artifact location and file name prefixes (`[output]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub table_prefix: String,
    pub jsonl_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
            table_prefix: "leads_".to_string(),
            jsonl_prefix: "leads_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn stop_limits(&self) -> StopLimits {
        let s = &self.scraper;
        StopLimits {
            global_max_runtime: Duration::from_secs(s.global_max_runtime),
            max_runtime: Duration::from_secs(s.max_runtime_per_platform),
            max_pages: s.max_pages_per_platform,
            max_items: s.max_items_per_platform,
            no_new_leads_limit: s.no_new_leads_limit,
            min_items_before_no_new: s.min_items_before_no_new,
            watchdog_timeout: Duration::from_secs(s.watchdog_timeout),
        }
    }

    /// Enabled sources, or the built-in five when none are configured.
    pub fn platforms_to_run(&self) -> Vec<String> {
        let enabled: Vec<String> = self
            .scraper
            .platforms
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if enabled.is_empty() {
            tracing::info!(
                platforms = ?DEFAULT_PLATFORMS,
                "no platforms enabled in config; using defaults"
            );
            return DEFAULT_PLATFORMS.iter().map(|s| s.to_string()).collect();
        }
        enabled
    }

    /// Apply `SCRAPER_<FIELD>` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| lookup(&format!("{ENV_PREFIX}{}", field.to_ascii_uppercase()));
        let s = &mut self.scraper;

        override_num(&get, "max_runtime_per_platform", &mut s.max_runtime_per_platform)?;
        override_num(&get, "max_pages_per_platform", &mut s.max_pages_per_platform)?;
        override_num(&get, "max_items_per_platform", &mut s.max_items_per_platform)?;
        override_num(&get, "no_new_leads_limit", &mut s.no_new_leads_limit)?;
        override_num(&get, "min_items_before_no_new", &mut s.min_items_before_no_new)?;
        override_num(&get, "watchdog_timeout", &mut s.watchdog_timeout)?;
        override_num(&get, "global_max_runtime", &mut s.global_max_runtime)?;
        override_num(&get, "months_lookback", &mut s.months_lookback)?;
        override_num(&get, "page_timeout_ms", &mut s.page_timeout_ms)?;
        override_num(&get, "fetch_retries", &mut s.fetch_retries)?;
        override_num(&get, "contact_pages_per_site", &mut s.contact_pages_per_site)?;

        if let Some(list) = get("platforms") {
            s.platforms = split_list(&list);
        }
        if let Some(list) = get("search_keywords") {
            s.search_keywords = split_list(&list);
        }
        if let Some(dir) = get("output_dir") {
            self.output.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Reject thresholds that would stop every source immediately or never.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.scraper;
        let positive: [(&'static str, u64); 7] = [
            ("max_runtime_per_platform", s.max_runtime_per_platform),
            ("max_pages_per_platform", s.max_pages_per_platform as u64),
            ("max_items_per_platform", s.max_items_per_platform as u64),
            ("no_new_leads_limit", s.no_new_leads_limit as u64),
            ("watchdog_timeout", s.watchdog_timeout),
            ("global_max_runtime", s.global_max_runtime),
            ("page_timeout_ms", s.page_timeout_ms),
        ];
        for (field, v) in positive {
            if v == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if s.min_items_before_no_new > s.max_items_per_platform {
            return Err(ConfigError::Invalid {
                field: "min_items_before_no_new",
                reason: format!(
                    "{} exceeds max_items_per_platform {}",
                    s.min_items_before_no_new, s.max_items_per_platform
                ),
            });
        }
        Ok(())
    }
}

fn override_num<T, G>(get: &G, field: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(field) {
        *slot = raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            field,
            reason: format!("cannot parse `{raw}` from environment"),
        })?;
    }
    Ok(())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mut cfg = parse_config(&content, ext.as_str())
        .ok_or_else(|| ConfigError::Format(path.to_path_buf()))?;
    cfg.scraper.search_keywords = clean_list(std::mem::take(&mut cfg.scraper.search_keywords));
    Ok(cfg)
}

/// Load config using env var + fallbacks, then apply `SCRAPER_*` overrides and validate:
/// 1) $SCRAPER_CONFIG_PATH
/// 2) config/scraper.toml
/// 3) config/scraper.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<Config, ConfigError> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(ConfigError::MissingPath {
                env: ENV_CONFIG_PATH,
                path: pb,
            });
        }
        load_config_from(&pb)?
    } else {
        let toml_p = PathBuf::from("config/scraper.toml");
        let json_p = PathBuf::from("config/scraper.json");
        if toml_p.exists() {
            load_config_from(&toml_p)?
        } else if json_p.exists() {
            load_config_from(&json_p)?
        } else {
            Config::default()
        }
    };
    cfg.apply_env_overrides(|k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse_config(s: &str, hint_ext: &str) -> Option<Config> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[scraper]");
    if try_toml {
        if let Ok(v) = toml::from_str::<Config>(s) {
            return Some(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<Config>(s) {
        return Some(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str::<Config>(s) {
            return Some(v);
        }
    }
    None
}

/// Trim, drop empties and case-insensitive duplicates, keep first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_ascii_lowercase()) {
            out.push(t.to_string());
        }
    }
    out
}
