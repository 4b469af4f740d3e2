//! Lead, per-source result and run summary types.
//!
//! Everything here is plain data: `Serialize`/`Deserialize` so the HTTP layer can return it
//! verbatim and the JSONL exporter can write it line by line.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Max chars kept in `Lead::project_description`.
pub const DESCRIPTION_MAX_CHARS: usize = 400;
/// Max chars kept in `Lead::post_text_snippet`.
pub const SNIPPET_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    JobBoard,
    Social,
    Forum,
    Directory,
    Search,
    Marketplace,
    #[default]
    Other,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::JobBoard => "job_board",
            SourceType::Social => "social",
            SourceType::Forum => "forum",
            SourceType::Directory => "directory",
            SourceType::Search => "search",
            SourceType::Marketplace => "marketplace",
            SourceType::Other => "other",
        }
    }
}

/// Where a lead's email address was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    InPost,
    ProfileBio,
    LinkedWebsite,
    ContactPage,
    #[default]
    None,
}

impl EmailSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailSource::InPost => "in_post",
            EmailSource::ProfileBio => "profile_bio",
            EmailSource::LinkedWebsite => "linked_website",
            EmailSource::ContactPage => "contact_page",
            EmailSource::None => "none",
        }
    }
}

/// A classified candidate client requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub client_name: String,
    pub post_url: String,
    /// Normalized address, empty when none was found.
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub project_description: String,
    pub platform: String,
    /// ISO-8601 UTC (`%Y-%m-%dT%H:%M:%SZ`).
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub post_text_snippet: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub confidence_score: u8,
    #[serde(default)]
    pub email_source: EmailSource,
    #[serde(default)]
    pub keywords_matched: Vec<String>,
    #[serde(default)]
    pub location: String,
}

impl Lead {
    pub fn new(platform: impl Into<String>, post_url: impl Into<String>) -> Self {
        Self {
            client_name: "Unknown".to_string(),
            post_url: post_url.into(),
            email: String::new(),
            project_description: String::new(),
            platform: platform.into(),
            post_date: None,
            post_text_snippet: String::new(),
            company: String::new(),
            source_type: SourceType::Other,
            confidence_score: 0,
            email_source: EmailSource::None,
            keywords_matched: Vec::new(),
            location: String::new(),
        }
    }

    /// Blank names fall back to "Unknown".
    pub fn with_client_name(mut self, name: &str) -> Self {
        let name = name.trim();
        if !name.is_empty() {
            self.client_name = name.to_string();
        }
        self
    }

    pub fn with_email(mut self, email: impl Into<String>, source: EmailSource) -> Self {
        self.email = email.into();
        self.email_source = if self.email.is_empty() {
            EmailSource::None
        } else {
            source
        };
        self
    }

    pub fn with_description(mut self, text: &str) -> Self {
        self.project_description = truncate_chars(text, DESCRIPTION_MAX_CHARS);
        self
    }

    pub fn with_snippet(mut self, text: &str) -> Self {
        self.post_text_snippet = truncate_chars(text, SNIPPET_MAX_CHARS);
        self
    }

    pub fn with_score(mut self, score: u8, matched: Vec<String>) -> Self {
        self.confidence_score = score.min(100);
        self.keywords_matched = matched;
        self
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_post_date(mut self, iso: Option<String>) -> Self {
        self.post_date = iso;
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.trim().to_string();
        self
    }

    /// Only leads with a post URL may be exported.
    pub fn is_exportable(&self) -> bool {
        !self.post_url.trim().is_empty()
    }

    /// Flat string columns in export order (see `TABLE_HEADERS`).
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.client_name.clone(),
            self.post_url.clone(),
            self.email.clone(),
            self.project_description.clone(),
            self.platform.clone(),
            self.post_date.clone().unwrap_or_default(),
            self.post_text_snippet.clone(),
            self.company.clone(),
            self.source_type.as_str().to_string(),
            self.confidence_score.to_string(),
            self.email_source.as_str().to_string(),
            self.keywords_matched.join(","),
            self.location.clone(),
        ]
    }
}

pub const TABLE_HEADERS: [&str; 13] = [
    "client_name",
    "post_url",
    "email",
    "project_description",
    "platform",
    "post_date",
    "post_text_snippet",
    "company",
    "source_type",
    "confidence_score",
    "email_source",
    "keywords_matched",
    "location",
];

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Why a connector run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    GlobalMaxRuntime,
    MaxRuntime,
    MaxPages,
    MaxItems,
    NoNewLeads,
    WatchdogTimeout,
    /// Connector finished its own work before any limit fired.
    Ok,
    /// Connector returned an error or panicked.
    Exception,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::GlobalMaxRuntime => "global_max_runtime",
            StopReason::MaxRuntime => "max_runtime",
            StopReason::MaxPages => "max_pages",
            StopReason::MaxItems => "max_items",
            StopReason::NoNewLeads => "no_new_leads",
            StopReason::WatchdogTimeout => "watchdog_timeout",
            StopReason::Ok => "ok",
            StopReason::Exception => "exception",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one connector invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: String,
    pub success: bool,
    pub leads: Vec<Lead>,
    pub pages_visited: u32,
    pub items_scanned: u32,
    pub leads_found: usize,
    pub time_taken_seconds: f64,
    pub error: Option<String>,
    pub stopped_reason: StopReason,
}

/// Aggregate of one orchestrator run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub total_leads: usize,
    pub unique_leads_after_dedupe: usize,
    pub platforms_run: usize,
    pub platforms_ok: usize,
    pub platforms_failed: usize,
    pub total_runtime_seconds: f64,
    /// Empty when the export failed.
    pub output_table: String,
    pub output_jsonl: String,
    #[serde(default)]
    pub output_rejected: Option<String>,
    pub platform_results: Vec<PlatformResult>,
}
