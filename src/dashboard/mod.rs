//! Refresh pipeline: fetch every dataset for a filter snapshot and apply
//! each result to its target.
//!
//! A refresh is one summary fetch followed by one series fetch per
//! registered widget, issued in registry order. Each widget is updated only
//! after its own fetch resolved.
//!
//! # Partial failure
//!
//! Refreshes are best-effort. A failed fetch, or a series whose shape does
//! not fit its widget, marks only that target as unavailable (the previous
//! data stays on screen with an indicator) and is recorded in the
//! [`RefreshReport`]. The remaining targets are still refreshed. Callers that
//! want all-or-nothing semantics use [`RefreshReport::into_result`].
//!
//! # Sequencing
//!
//! [`Dashboard::refresh`] borrows the dashboard mutably, so two refreshes can
//! never interleave their writes; a new user action is handled after the
//! running refresh returns.

pub mod summary;

use std::fmt;
use std::time::{Duration, Instant};

use crate::api::{FetchError, MetricSource, SeriesId, ShapeError};
use crate::filters::FilterSnapshot;
use crate::widgets::{Canvas, WidgetRegistry};

pub use summary::SummaryPanel;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// What a refresh step was updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTarget {
    Summary,
    Series(SeriesId),
}

impl fmt::Display for RefreshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => f.write_str("stats"),
            Self::Series(id) => write!(f, "{id}"),
        }
    }
}

/// Why a target could not be updated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("malformed series: {0}")]
    Shape(#[from] ShapeError),
}

impl FailureReason {
    /// Short text for the on-screen "data unavailable" indicator.
    pub fn indicator(&self) -> String {
        match self {
            Self::Fetch(FetchError::Transport { .. }) => "backend unreachable".to_string(),
            Self::Fetch(FetchError::Status { status, .. }) => format!("HTTP {status}"),
            Self::Fetch(FetchError::Decode { .. }) => "unexpected response".to_string(),
            Self::Shape(_) => "malformed series".to_string(),
        }
    }
}

/// One target that did not receive fresh data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub target: RefreshTarget,
    pub reason: FailureReason,
}

impl fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.reason)
    }
}

/// Outcome of a single [`Dashboard::refresh`] call.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub snapshot: FilterSnapshot,
    /// Backend requests issued.
    pub fetches: usize,
    pub failures: Vec<RefreshFailure>,
    pub elapsed: Duration,
}

impl RefreshReport {
    /// `true` when every target was updated.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn a report with failures into an error.
    pub fn into_result(self) -> Result<RefreshReport, RefreshError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(RefreshError {
                failed: self.failures.len(),
                attempted: self.fetches,
                failures: self.failures,
            })
        }
    }
}

/// A refresh that left at least one target stale.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{failed} of {attempted} dashboard datasets failed to refresh")]
pub struct RefreshError {
    pub failed: usize,
    pub attempted: usize,
    pub failures: Vec<RefreshFailure>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Owns the metric source, the summary tiles and the widget registry.
#[derive(Debug)]
pub struct Dashboard<S, C> {
    source: S,
    summary: SummaryPanel,
    widgets: WidgetRegistry<C>,
    refreshes: u64,
    last_snapshot: Option<FilterSnapshot>,
}

impl<S: MetricSource, C: Canvas> Dashboard<S, C> {
    pub fn new(source: S, widgets: WidgetRegistry<C>) -> Self {
        Self {
            source,
            summary: SummaryPanel::default(),
            widgets,
            refreshes: 0,
            last_snapshot: None,
        }
    }

    pub fn summary(&self) -> &SummaryPanel {
        &self.summary
    }

    pub fn widgets(&self) -> &WidgetRegistry<C> {
        &self.widgets
    }

    /// Number of completed refresh calls.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    /// Snapshot used by the most recent refresh.
    pub fn last_snapshot(&self) -> Option<&FilterSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Re-fetch every dataset for `snapshot` and apply the results.
    pub fn refresh(&mut self, snapshot: &FilterSnapshot) -> RefreshReport {
        let started = Instant::now();
        let mut fetches = 0;
        let mut failures = Vec::new();

        fetches += 1;
        match self.source.fetch_summary(snapshot) {
            Ok(stats) => self.summary.show(&stats),
            Err(e) => {
                let reason = FailureReason::from(e);
                self.summary.mark_unavailable(reason.indicator());
                failures.push(RefreshFailure {
                    target: RefreshTarget::Summary,
                    reason,
                });
            }
        }

        for (id, widget) in self.widgets.iter_mut() {
            fetches += 1;
            let outcome = self
                .source
                .fetch_series(id, snapshot)
                .map_err(FailureReason::from)
                .and_then(|series| {
                    series.validate(widget.spec().arity())?;
                    Ok(series)
                });

            match outcome {
                Ok(series) => widget.apply(&series),
                Err(reason) => {
                    widget.mark_unavailable(reason.indicator());
                    failures.push(RefreshFailure {
                        target: RefreshTarget::Series(id),
                        reason,
                    });
                }
            }
        }

        self.refreshes += 1;
        self.last_snapshot = Some(snapshot.clone());

        RefreshReport {
            snapshot: snapshot.clone(),
            fetches,
            failures,
            elapsed: started.elapsed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
