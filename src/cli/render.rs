//! Text and JSON rendering of dashboard state for the CLI.
//!
//! Everything here returns strings or JSON values; the command handlers
//! decide where they are written.

use colored::Colorize;
use serde_json::{Value, json};

use crate::analytics::reporter::History;
use crate::dashboard::{Dashboard, RefreshReport, SummaryPanel};
use crate::filters::{Dimension, FilterOptions, FilterSnapshot};
use crate::widgets::{TextCanvas, WidgetStatus};

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Full dashboard as terminal text: header, summary tiles, every chart and a
/// refresh footer.
pub fn dashboard_text<S>(dashboard: &Dashboard<S, TextCanvas>, report: &RefreshReport) -> String
where
    S: crate::api::MetricSource,
{
    let mut out = Vec::new();

    out.push(format!("{}", "Customer Churn Dashboard".bold().cyan()));
    out.push("=".repeat(60));
    out.push(format!(
        "  {} {}",
        "Filters:".bold(),
        snapshot_line(&report.snapshot)
    ));
    out.push(String::new());

    out.extend(summary_lines(dashboard.summary()));
    out.push(String::new());

    for (_, widget) in dashboard.widgets().iter() {
        let text = widget.canvas().text();
        if text.is_empty() {
            out.push(format!("{}", widget.spec().title.bold().cyan()));
            out.push(format!("  {}", "(not loaded)".dimmed()));
        } else {
            out.push(text.to_string());
        }
        out.push(String::new());
    }

    out.push(footer(report));
    for failure in &report.failures {
        out.push(format!("  {} {}", "✗".red().bold(), failure));
    }

    out.join("\n")
}

fn snapshot_line(snapshot: &FilterSnapshot) -> String {
    Dimension::ALL
        .iter()
        .map(|d| format!("{}={}", d, snapshot.get(*d)))
        .collect::<Vec<_>>()
        .join("  ")
}

fn summary_lines(panel: &SummaryPanel) -> Vec<String> {
    let mut lines = Vec::new();
    let mut header = format!("{}", "Summary".bold().cyan());
    if let WidgetStatus::Unavailable { reason } = &panel.status {
        header.push_str(&format!(
            "  {}",
            format!("[data unavailable: {reason}]").red().bold()
        ));
    }
    lines.push(header);
    for (caption, value) in panel.tiles() {
        lines.push(format!("  {:<20} {}", format!("{caption}:").bold(), value));
    }
    lines
}

fn footer(report: &RefreshReport) -> String {
    let line = format!(
        "{} datasets requested in {} ms, {} failed at {}",
        report.fetches,
        report.elapsed.as_millis(),
        report.failures.len(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    if report.is_complete() {
        format!("{}", line.dimmed())
    } else {
        format!("{}", line.yellow())
    }
}

/// Dashboard state as a JSON document.
pub fn dashboard_json<S, C>(dashboard: &Dashboard<S, C>, report: &RefreshReport) -> Value
where
    S: crate::api::MetricSource,
    C: crate::widgets::Canvas,
{
    let widgets: Vec<Value> = dashboard
        .widgets()
        .iter()
        .map(|(id, widget)| {
            let spec = widget.spec();
            let datasets: Vec<Value> = spec
                .datasets
                .iter()
                .zip(&widget.data().datasets)
                .map(|(style, data)| json!({ "label": style.label, "data": data }))
                .collect();
            json!({
                "series": id.as_str(),
                "title": spec.title,
                "kind": spec.kind,
                "labels": widget.data().labels,
                "datasets": datasets,
                "status": widget.status(),
            })
        })
        .collect();

    json!({
        "filters": report.snapshot,
        "summary": dashboard.summary(),
        "widgets": widgets,
        "fetches": report.fetches,
        "duration_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        "failures": report.failures.iter().map(|f| json!({
            "target": f.target.to_string(),
            "error": f.reason.to_string(),
        })).collect::<Vec<_>>(),
    })
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Legal filter values, with the current selection marked.
pub fn filters_text(options: &FilterOptions, current: &FilterSnapshot) -> String {
    let mut out = vec![format!("{}", "Filter Options".bold().cyan())];
    out.push("=".repeat(40));

    for dimension in Dimension::ALL {
        out.push(format!("{}", dimension.as_str().bold()));
        let values = options.values(dimension);
        if values.is_empty() {
            out.push(format!("  {}", "(none)".dimmed()));
        }
        for value in values {
            if value == current.get(dimension) {
                out.push(format!("  {} {}", "●".green(), value));
            } else {
                out.push(format!("  {} {}", "·".dimmed(), value));
            }
        }
    }

    if !options.time_periods.is_empty() {
        out.push(format!(
            "{} {}",
            "time periods".bold(),
            "(not applied to queries)".dimmed()
        ));
        for period in &options.time_periods {
            out.push(format!("  {} {}", "·".dimmed(), period));
        }
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

pub fn history_text(history: &History) -> String {
    let mut out = vec![format!("{}", "Refresh History".bold().cyan())];
    out.push("=".repeat(60));
    out.push(format!("  {} {}", "Refreshes:    ".bold(), history.total_refreshes));
    out.push(format!(
        "  {} {} ({:.1}% complete)",
        "With failures:".bold(),
        history.failed_refreshes,
        history.success_pct()
    ));
    out.push(format!(
        "  {} {:.0} ms avg, {} ms max",
        "Duration:     ".bold(),
        history.avg_duration_ms,
        history.max_duration_ms
    ));
    if let Some(last) = &history.last_refresh {
        out.push(format!("  {} {}", "Last refresh: ".bold(), last));
    }

    if !history.top_filters.is_empty() {
        out.push(String::new());
        out.push(format!("{}", "Most Used Filters".bold().cyan()));
        out.push(format!(
            "  {:<24} {:<20} {:<20} {:>6}",
            "Segment", "Service", "Contract", "Count"
        ));
        out.push(format!("  {}", "-".repeat(73)));
        for (i, usage) in history.top_filters.iter().take(10).enumerate() {
            let line = format!(
                "  {:<24} {:<20} {:<20} {:>6}",
                usage.segment, usage.service, usage.contract, usage.count
            );
            if i % 2 == 0 {
                out.push(line);
            } else {
                out.push(format!("{}", line.dimmed()));
            }
        }
    }

    if !history.failing_datasets.is_empty() {
        out.push(String::new());
        out.push(format!("{}", "Failing Datasets".bold().cyan()));
        for failure in &history.failing_datasets {
            out.push(format!(
                "  {:<24} {:>6}",
                failure.dataset.yellow(),
                failure.count
            ));
        }
    }

    out.join("\n")
}

pub fn history_json(history: &History) -> Value {
    json!({
        "total_refreshes": history.total_refreshes,
        "failed_refreshes": history.failed_refreshes,
        "success_pct": history.success_pct(),
        "avg_duration_ms": history.avg_duration_ms,
        "max_duration_ms": history.max_duration_ms,
        "last_refresh": history.last_refresh,
        "top_filters": history.top_filters.iter().map(|u| json!({
            "segment": u.segment,
            "service": u.service,
            "contract": u.contract,
            "count": u.count,
        })).collect::<Vec<_>>(),
        "failing_datasets": history.failing_datasets.iter().map(|f| json!({
            "dataset": f.dataset,
            "count": f.count,
        })).collect::<Vec<_>>(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
