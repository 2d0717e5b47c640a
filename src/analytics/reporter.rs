//! Refresh history: aggregation over the JSONL refresh log.
//!
//! Feeds `churnboard history`: how many refreshes ran, how many left widgets
//! stale, how long they took, which filter combinations are used most, and
//! which datasets fail most often.

use std::collections::HashMap;

use crate::analytics::logger::RefreshLogEntry;

// ---------------------------------------------------------------------------
// Aggregated history
// ---------------------------------------------------------------------------

/// Summary of the refresh log.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub total_refreshes: usize,
    pub failed_refreshes: usize,
    pub avg_duration_ms: f64,
    pub max_duration_ms: u64,
    /// Most recent timestamp, if any.
    pub last_refresh: Option<String>,
    /// Filter combinations by use count, most used first.
    pub top_filters: Vec<FilterUsage>,
    /// Datasets by failure count, most failing first.
    pub failing_datasets: Vec<DatasetFailures>,
}

/// How often one filter combination was refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterUsage {
    pub segment: String,
    pub service: String,
    pub contract: String,
    pub count: usize,
}

/// How often one dataset failed to refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFailures {
    pub dataset: String,
    pub count: usize,
}

impl History {
    /// Percentage of refreshes that completed without failures.
    pub fn success_pct(&self) -> f64 {
        if self.total_refreshes == 0 {
            0.0
        } else {
            let ok = self.total_refreshes - self.failed_refreshes;
            (ok as f64 / self.total_refreshes as f64) * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Aggregate the last `limit` entries (all entries when `None`).
pub fn build_history(entries: &[RefreshLogEntry], limit: Option<usize>) -> History {
    let start = limit.map_or(0, |n| entries.len().saturating_sub(n));
    let window = &entries[start..];

    let total_refreshes = window.len();
    let failed_refreshes = window.iter().filter(|e| !e.success).count();
    let total_ms: u64 = window.iter().map(|e| e.duration_ms).sum();
    let avg_duration_ms = if total_refreshes == 0 {
        0.0
    } else {
        total_ms as f64 / total_refreshes as f64
    };

    History {
        total_refreshes,
        failed_refreshes,
        avg_duration_ms,
        max_duration_ms: window.iter().map(|e| e.duration_ms).max().unwrap_or(0),
        last_refresh: window.iter().map(|e| e.timestamp.clone()).max(),
        top_filters: compute_filter_usage(window),
        failing_datasets: compute_dataset_failures(window),
    }
}

fn compute_filter_usage(entries: &[RefreshLogEntry]) -> Vec<FilterUsage> {
    let mut counts: HashMap<(&str, &str, &str), usize> = HashMap::new();
    for e in entries {
        *counts
            .entry((e.segment.as_str(), e.service.as_str(), e.contract.as_str()))
            .or_default() += 1;
    }

    let mut usage: Vec<FilterUsage> = counts
        .into_iter()
        .map(|((segment, service, contract), count)| FilterUsage {
            segment: segment.to_string(),
            service: service.to_string(),
            contract: contract.to_string(),
            count,
        })
        .collect();

    // Most used first; ties broken alphabetically for stable output
    usage.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.segment.cmp(&b.segment))
            .then_with(|| a.service.cmp(&b.service))
            .then_with(|| a.contract.cmp(&b.contract))
    });
    usage
}

/// Failures are logged as `"name: reason"`; group by the name part.
fn compute_dataset_failures(entries: &[RefreshLogEntry]) -> Vec<DatasetFailures> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for failure in entries.iter().flat_map(|e| &e.failures) {
        let name = failure.split_once(':').map_or(failure.as_str(), |(n, _)| n);
        *counts.entry(name.trim()).or_default() += 1;
    }

    let mut failures: Vec<DatasetFailures> = counts
        .into_iter()
        .map(|(dataset, count)| DatasetFailures {
            dataset: dataset.to_string(),
            count,
        })
        .collect();
    failures.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.dataset.cmp(&b.dataset)));
    failures
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
