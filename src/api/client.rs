//! Blocking HTTP client for the churn analytics backend.
//!
//! Talks to the backend with a shared `ureq` agent. Every method issues at
//! most one request; failures are mapped into [`FetchError`] and returned to
//! the caller untouched, with no retry.
//!
//! The agent keeps no idle connections, so ureq never replays a GET on a
//! stale pooled socket. Connecting is bounded by [`CONNECT_TIMEOUT`]; the
//! request as a whole is unbounded unless `[backend] timeout_ms` is set.
//!
//! Endpoints:
//!
//! - `GET /filters`: legal filter values
//! - `GET /stats?segment=&service=&contract=`: summary statistics
//! - `GET /chart/{name}?segment=&service=&contract=`: one chart's series
//! - `GET /test`: liveness probe
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::types::{ChartSeries, PingResponse, SeriesId, SummaryStats};
use super::{FetchError, MetricSource};
use crate::config::schema::BackendConfig;
use crate::filters::{FilterOptions, FilterSnapshot};

/// Upper bound on establishing a TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of [`MetricSource`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    timeout: Option<Duration>,
    agent: ureq::Agent,
}

impl BackendClient {
    /// Build a client for `base_url` with no request timeout.
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, None)
    }

    /// Build a client from the resolved `[backend]` config section.
    ///
    /// A `timeout_ms` of zero means no timeout.
    pub fn from_config(config: &BackendConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::with_timeout(&config.url, timeout)
    }

    fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .max_idle_connections(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            agent: builder.build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Overall per-request timeout, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        CONNECT_TIMEOUT
    }

    /// Call `GET /test` and return the backend's greeting.
    pub fn ping(&self) -> Result<String, FetchError> {
        let resp: PingResponse = self.get_json("/test", None)?;
        Ok(resp.message)
    }

    /// Issue one GET and decode the JSON body.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        snapshot: Option<&FilterSnapshot>,
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.agent.get(&url);
        if let Some(snapshot) = snapshot {
            for (key, value) in snapshot.query_pairs() {
                request = request.query(key, value);
            }
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, _) => FetchError::Status {
                url: url.clone(),
                status,
            },
            ureq::Error::Transport(transport) => FetchError::Transport {
                url: url.clone(),
                message: transport.to_string(),
            },
        })?;

        response
            .into_json::<T>()
            .map_err(|e| FetchError::Decode {
                url,
                message: e.to_string(),
            })
    }
}

impl MetricSource for BackendClient {
    fn fetch_filters(&self) -> Result<FilterOptions, FetchError> {
        self.get_json("/filters", None)
    }

    fn fetch_summary(&self, snapshot: &FilterSnapshot) -> Result<SummaryStats, FetchError> {
        self.get_json("/stats", Some(snapshot))
    }

    fn fetch_series(
        &self,
        id: SeriesId,
        snapshot: &FilterSnapshot,
    ) -> Result<ChartSeries, FetchError> {
        self.get_json(&format!("/chart/{}", id.as_str()), Some(snapshot))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn zero_timeout_means_none() {
        let config = BackendConfig {
            url: "http://localhost:8000".to_string(),
            timeout_ms: 0,
        };
        let client = BackendClient::from_config(&config);
        assert_eq!(client.timeout(), None);
        assert_eq!(client.connect_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn explicit_timeout_is_kept() {
        let config = BackendConfig {
            url: "http://localhost:8000".to_string(),
            timeout_ms: 2500,
        };
        assert_eq!(
            BackendClient::from_config(&config).timeout(),
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is not expected to accept HTTP connections locally.
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client.fetch_filters().unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
        assert_eq!(err.url(), "http://127.0.0.1:9/filters");
    }
}
