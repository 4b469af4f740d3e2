//! Rejected-candidate buffer for tuning the classifier.
//!
//! When enabled, the first [`MAX_REJECTED`] rejections of a run are kept with their reason and
//! written next to the lead exports as `rejected_<ts>.jsonl`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::ExportError;
use crate::models::truncate_chars;

pub const MAX_REJECTED: usize = 50;

/// Why a candidate did not become a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingText,
    OutsideLookback,
    NoRequirementKeywords,
    DuplicateUrl,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedCandidate {
    pub url: String,
    pub snippet: String,
    pub reason: RejectReason,
}

#[derive(Debug, Default)]
pub struct RejectedCandidates {
    enabled: bool,
    items: Vec<RejectedCandidate>,
}

impl RejectedCandidates {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            items: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, url: &str, snippet: &str, reason: RejectReason) {
        if !self.enabled || self.items.len() >= MAX_REJECTED {
            return;
        }
        self.items.push(RejectedCandidate {
            url: truncate_chars(url, 500),
            snippet: truncate_chars(snippet, 500),
            reason,
        });
    }

    pub fn items(&self) -> &[RejectedCandidate] {
        &self.items
    }

    /// Writes and drains the buffer. `Ok(None)` when there is nothing to write.
    pub fn save(&mut self, dir: &Path, stamp: &str) -> Result<Option<PathBuf>, ExportError> {
        if self.items.is_empty() {
            return Ok(None);
        }
        fs::create_dir_all(dir).map_err(|source| ExportError::OutputDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("rejected_{stamp}.jsonl"));
        let mut buf = Vec::new();
        for r in &self.items {
            serde_json::to_writer(&mut buf, r)?;
            buf.push(b'\n');
        }
        fs::File::create(&path)
            .and_then(|mut f| f.write_all(&buf))
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), count = self.items.len(), "rejected candidates saved");
        self.items.clear();
        Ok(Some(path))
    }
}
