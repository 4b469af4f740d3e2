//! Typed error taxonomy.
//!
//! Connector logic itself uses `anyhow`; these enums name the failures that cross a layer
//! boundary and need to be told apart by the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid or unreadable configuration. Fatal only at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{env} points to non-existent path {path}")]
    MissingPath { env: &'static str, path: PathBuf },
    #[error("unsupported config format in {0}")]
    Format(PathBuf),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A single page fetch that failed. Absorbed by the fetcher, never escapes it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("invalid url {0}")]
    InvalidUrl(String),
}

/// Writing a final artifact failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("creating output dir {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serializing lead: {0}")]
    Serialize(#[from] serde_json::Error),
}
