//! Final artifacts: a CSV table and a JSONL stream per run, plus the outputs listing.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::OutputConfig;
use crate::error::ExportError;
use crate::models::{Lead, TABLE_HEADERS};

pub const MAX_LISTED_OUTPUTS: usize = 50;

/// Writes exportable leads to a new timestamped file and returns its path.
pub trait LeadExporter: Send + Sync {
    fn export_table(&self, leads: &[Lead]) -> Result<PathBuf, ExportError>;
    fn export_lines(&self, leads: &[Lead]) -> Result<PathBuf, ExportError>;
}

/// Files under `OutputConfig::dir`.
#[derive(Debug, Clone)]
pub struct FileExporter {
    cfg: OutputConfig,
}

impl FileExporter {
    pub fn new(cfg: OutputConfig) -> Self {
        Self { cfg }
    }

    pub fn dir(&self) -> &Path {
        &self.cfg.dir
    }

    fn ensure_dir(&self) -> Result<(), ExportError> {
        fs::create_dir_all(&self.cfg.dir).map_err(|source| ExportError::OutputDir {
            path: self.cfg.dir.clone(),
            source,
        })
    }

    /// `{prefix}{stamp}.{ext}`; a numeric suffix keeps same-second runs apart.
    fn fresh_path(&self, prefix: &str, ext: &str) -> PathBuf {
        let stamp = file_stamp(Utc::now());
        let mut path = self.cfg.dir.join(format!("{prefix}{stamp}.{ext}"));
        let mut n = 1;
        while path.exists() {
            path = self.cfg.dir.join(format!("{prefix}{stamp}_{n}.{ext}"));
            n += 1;
        }
        path
    }

    fn write(&self, path: PathBuf, bytes: &[u8], rows: usize) -> Result<PathBuf, ExportError> {
        fs::File::create(&path)
            .and_then(|mut f| f.write_all(bytes))
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), rows, "export written");
        Ok(path)
    }
}

impl LeadExporter for FileExporter {
    fn export_table(&self, leads: &[Lead]) -> Result<PathBuf, ExportError> {
        self.ensure_dir()?;
        let mut out = String::new();
        push_csv_row(&mut out, TABLE_HEADERS.iter().copied());
        let mut rows = 0;
        for lead in leads.iter().filter(|l| l.is_exportable()) {
            let row = lead.to_row();
            push_csv_row(&mut out, row.iter().map(String::as_str));
            rows += 1;
        }
        let path = self.fresh_path(&self.cfg.table_prefix, "csv");
        self.write(path, out.as_bytes(), rows)
    }

    fn export_lines(&self, leads: &[Lead]) -> Result<PathBuf, ExportError> {
        self.ensure_dir()?;
        let mut buf = Vec::new();
        let mut rows = 0;
        for lead in leads.iter().filter(|l| l.is_exportable()) {
            serde_json::to_writer(&mut buf, lead)?;
            buf.push(b'\n');
            rows += 1;
        }
        let path = self.fresh_path(&self.cfg.jsonl_prefix, "jsonl");
        self.write(path, &buf, rows)
    }
}

pub fn file_stamp(t: DateTime<Utc>) -> String {
    t.format("%Y%m%d_%H%M%S").to_string()
}

fn push_csv_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for c in cells {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&csv_cell(c));
    }
    out.push_str("\r\n");
}

/// RFC 4180 quoting.
fn csv_cell(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// One artifact in the output directory.
#[derive(Debug, Clone, Serialize)]
pub struct OutputFile {
    pub name: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// `leads_*` and `rejected_*` files, newest first, at most [`MAX_LISTED_OUTPUTS`].
/// A missing directory lists as empty.
pub fn list_outputs(dir: &Path) -> std::io::Result<Vec<OutputFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut files: Vec<(SystemTime, OutputFile)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !(name.starts_with("leads_") || name.starts_with("rejected_")) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((
            mtime,
            OutputFile {
                name,
                size_bytes: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            },
        ));
    }
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.name.cmp(&a.1.name)));
    Ok(files
        .into_iter()
        .take(MAX_LISTED_OUTPUTS)
        .map(|(_, f)| f)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailSource;

    fn exporter(dir: &Path) -> FileExporter {
        FileExporter::new(OutputConfig {
            dir: dir.to_path_buf(),
            ..OutputConfig::default()
        })
    }

    #[test]
    fn csv_quotes_when_needed() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a,b"), "\"a,b\"");
        assert_eq!(csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn table_skips_leads_without_url() {
        let dir = tempfile::tempdir().unwrap();
        let leads = vec![
            Lead::new("reddit", "https://r.io/1")
                .with_client_name("ann")
                .with_email("a@b.io", EmailSource::InPost)
                .with_description("Need app, budget: 5k"),
            Lead::new("reddit", "  "),
        ];
        let path = exporter(dir.path()).export_table(&leads).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("leads_"));
        let body = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("client_name,post_url,email"));
        assert!(lines[1].contains("\"Need app, budget: 5k\""));
    }

    #[test]
    fn each_call_writes_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let ex = exporter(dir.path());
        let leads = vec![Lead::new("github", "https://g.io/1")];
        let a = ex.export_lines(&leads).unwrap();
        let b = ex.export_lines(&leads).unwrap();
        assert_ne!(a, b);
        let v: serde_json::Value =
            serde_json::from_str(fs::read_to_string(&a).unwrap().trim()).unwrap();
        assert_eq!(v["platform"], "github");
    }

    #[test]
    fn export_into_a_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let err = exporter(&blocker).export_lines(&[]).unwrap_err();
        assert!(matches!(err, ExportError::OutputDir { .. }));
    }

    #[test]
    fn listing_filters_and_tolerates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("leads_1.csv"), "a").unwrap();
        fs::write(dir.path().join("rejected_1.jsonl"), "b").unwrap();
        fs::write(dir.path().join("notes.txt"), "c").unwrap();
        let mut names: Vec<String> = list_outputs(dir.path())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["leads_1.csv", "rejected_1.jsonl"]);
        assert!(list_outputs(&dir.path().join("nope")).unwrap().is_empty());
    }
}
