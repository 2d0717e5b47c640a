use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, schema::LoggingConfig};
use crate::dashboard::RefreshReport;

// ---------------------------------------------------------------------------
// Refresh log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the refresh log (`~/.churnboard/refresh-log.jsonl`).
///
/// One line per [`Dashboard::refresh`](crate::dashboard::Dashboard::refresh)
/// call. Used by the reporter for `churnboard history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshLogEntry {
    pub timestamp: String,
    pub segment: String,
    pub service: String,
    pub contract: String,
    /// Backend requests issued.
    pub fetches: usize,
    /// Targets that did not receive fresh data, as `"name: reason"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
    pub duration_ms: u64,
    #[serde(default = "default_true")]
    pub success: bool,
}

fn default_true() -> bool {
    true
}

impl RefreshLogEntry {
    /// Build an entry stamped with the current time.
    pub fn from_report(report: &RefreshReport) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            segment: report.snapshot.segment.clone(),
            service: report.snapshot.service.clone(),
            contract: report.snapshot.contract.clone(),
            fetches: report.fetches,
            failures: report.failures.iter().map(|f| f.to_string()).collect(),
            duration_ms: u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            success: report.is_complete(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Append a refresh outcome to the configured log.
///
/// Best-effort: a disabled log, missing home directory or I/O failure is
/// silently ignored so logging never fails a refresh.
pub fn log_refresh(config: &LoggingConfig, report: &RefreshReport) {
    if !config.enabled {
        return;
    }
    let Some(path) = refresh_log_path(config) else {
        return;
    };
    let _ = append_entry(&path, &RefreshLogEntry::from_report(report));
}

/// Append one entry as a JSON line, creating parent directories as needed.
pub fn append_entry(path: &Path, entry: &RefreshLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read every entry from `path`.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_entries(path: &Path) -> Vec<RefreshLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<RefreshLogEntry>(&line).ok())
        .collect()
}

/// Read entries from the configured log.
pub fn read_configured_entries(config: &LoggingConfig) -> Vec<RefreshLogEntry> {
    refresh_log_path(config)
        .map(|path| read_entries(&path))
        .unwrap_or_default()
}

/// Resolved location of the refresh log.
pub fn refresh_log_path(config: &LoggingConfig) -> Option<PathBuf> {
    config::expand_home(&config.path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
