//! Metric fetching: the request/response seam between the dashboard and the
//! analytics backend.
//!
//! [`MetricSource`] is what the refresh pipeline depends on. The HTTP
//! implementation is [`client::BackendClient`]; tests substitute in-memory
//! sources.

pub mod client;
pub mod types;

pub use client::BackendClient;
pub use types::{Arity, ChartSeries, SeriesId, ShapeError, SummaryStats};

use crate::filters::{FilterOptions, FilterSnapshot};

/// Failure to obtain a dataset from the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The backend could not be reached (DNS, connection refused, reset, timeout).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The backend answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body was not the JSON shape expected for this endpoint.
    #[error("unexpected response body from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } | Self::Decode { url, .. } => {
                url
            }
        }
    }
}

/// Source of dashboard datasets.
///
/// Each call is at most one backend request: no retry, no caching.
pub trait MetricSource {
    /// Legal filter values, loaded once at startup.
    fn fetch_filters(&self) -> Result<FilterOptions, FetchError>;

    /// Summary statistics for a snapshot.
    fn fetch_summary(&self, snapshot: &FilterSnapshot) -> Result<SummaryStats, FetchError>;

    /// One chart's series for a snapshot.
    fn fetch_series(
        &self,
        id: SeriesId,
        snapshot: &FilterSnapshot,
    ) -> Result<ChartSeries, FetchError>;
}

impl<S: MetricSource + ?Sized> MetricSource for &S {
    fn fetch_filters(&self) -> Result<FilterOptions, FetchError> {
        (**self).fetch_filters()
    }

    fn fetch_summary(&self, snapshot: &FilterSnapshot) -> Result<SummaryStats, FetchError> {
        (**self).fetch_summary(snapshot)
    }

    fn fetch_series(
        &self,
        id: SeriesId,
        snapshot: &FilterSnapshot,
    ) -> Result<ChartSeries, FetchError> {
        (**self).fetch_series(id, snapshot)
    }
}
