/// HTTP tests against an in-process fake analytics backend.
///
/// Each test starts a `tiny_http` server on an ephemeral port, points a
/// `BackendClient` at it and inspects both the decoded results and the raw
/// request URLs the server received.
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use churnboard::api::{Arity, BackendClient, ChartSeries, FetchError, MetricSource, SeriesId};
use churnboard::cli;
use churnboard::config::schema::LoggingConfig;
use churnboard::controls::FilterControls;
use churnboard::dashboard::{Dashboard, RefreshTarget};
use churnboard::filters::FilterSnapshot;
use churnboard::widgets::{RecordingCanvas, TextCanvas, WidgetRegistry, WidgetStatus};
use tiny_http::{Response, Server};

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

type Route = dyn Fn(&str) -> (u16, String) + Send + Sync;

struct FakeBackend {
    server: Arc<Server>,
    worker: Option<JoinHandle<()>>,
    requests: Arc<Mutex<Vec<String>>>,
    peers: Arc<Mutex<Vec<Option<SocketAddr>>>>,
    url: String,
}

impl FakeBackend {
    fn start(route: impl Fn(&str) -> (u16, String) + Send + Sync + 'static) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let peers = Arc::new(Mutex::new(Vec::new()));
        let route: Box<Route> = Box::new(route);

        let worker = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            let peers = Arc::clone(&peers);
            std::thread::spawn(move || {
                for request in server.incoming_requests() {
                    peers.lock().unwrap().push(request.remote_addr().copied());
                    let url = request.url().to_string();
                    let path = url.split('?').next().unwrap_or_default().to_string();
                    requests.lock().unwrap().push(url);
                    let (status, body) = route(&path);
                    let _ = request.respond(Response::from_string(body).with_status_code(status));
                }
            })
        };

        Self {
            server,
            worker: Some(worker),
            requests,
            peers,
            url: format!("http://{addr}"),
        }
    }

    fn client(&self) -> BackendClient {
        BackendClient::new(&self.url)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn peers(&self) -> Vec<Option<SocketAddr>> {
        self.peers.lock().unwrap().clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// A healthy backend serving the standard churn dataset.
fn churn_backend(path: &str) -> (u16, String) {
    match path {
        "/test" => (200, r#"{"message": "API is running"}"#.to_string()),
        "/filters" => (
            200,
            r#"{
                "time_periods": ["Last 30 days", "Last year"],
                "segments": ["All Segments", "New Customers", "Long-term Customers"],
                "services": ["All Services", "DSL", "Fiber optic"],
                "contracts": ["All Contracts", "Month-to-month", "Two year"]
            }"#
            .to_string(),
        ),
        "/stats" => (
            200,
            r#"{"total_customers": 1000, "churn_rate": 26.5, "avg_monthly": 64.2, "avg_tenure": 32.4}"#
                .to_string(),
        ),
        "/chart/genderChurn" => (
            200,
            r#"{"labels": ["Female", "Male"], "churned": [939, 930], "not_churned": [2549, 2625]}"#
                .to_string(),
        ),
        "/chart/tenureChurn" => (
            200,
            r#"{"labels": [1, 2, 3], "values": [61.99, 51.68, 47.0]}"#.to_string(),
        ),
        other => match other.strip_prefix("/chart/").map(str::parse::<SeriesId>) {
            Some(Ok(id)) => (200, generic_series(id.arity())),
            _ => (404, r#"{"detail": "Not Found"}"#.to_string()),
        },
    }
}

fn generic_series(arity: Arity) -> String {
    match arity {
        Arity::Single => r#"{"labels": ["a", "b"], "values": [10.5, 20.25]}"#.to_string(),
        Arity::Split => {
            r#"{"labels": ["Yes", "No"], "churned": [100, 200], "not_churned": [300, 400]}"#
                .to_string()
        }
    }
}

/// Decode `key=value` pairs from a request URL's query string.
fn query_pairs(url: &str) -> Vec<(String, String)> {
    let Some((_, query)) = url.split_once('?') else {
        return Vec::new();
    };
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (percent_decode(k), percent_decode(v)))
        .collect()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).unwrap()
}

fn quiet_logging() -> LoggingConfig {
    LoggingConfig {
        enabled: false,
        path: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[test]
fn ping_returns_backend_message() {
    let backend = FakeBackend::start(churn_backend);
    assert_eq!(backend.client().ping().unwrap(), "API is running");
}

#[test]
fn filters_are_fetched_without_query() {
    let backend = FakeBackend::start(churn_backend);
    let options = backend.client().fetch_filters().unwrap();

    assert_eq!(options.segments.len(), 3);
    assert_eq!(
        options.default_snapshot(),
        FilterSnapshot::new("All Segments", "All Services", "All Contracts")
    );
    assert_eq!(backend.requests(), vec!["/filters".to_string()]);
}

#[test]
fn snapshot_is_sent_as_query_parameters() {
    let backend = FakeBackend::start(churn_backend);
    let snapshot = FilterSnapshot::new("New Customers", "Fiber optic", "Month-to-month");
    backend.client().fetch_summary(&snapshot).unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("/stats?"));
    assert_eq!(
        query_pairs(&requests[0]),
        vec![
            ("segment".to_string(), "New Customers".to_string()),
            ("service".to_string(), "Fiber optic".to_string()),
            ("contract".to_string(), "Month-to-month".to_string()),
        ]
    );
}

#[test]
fn series_endpoint_uses_identifier_in_path() {
    let backend = FakeBackend::start(churn_backend);
    let snapshot = FilterSnapshot::new("All Segments", "All Services", "All Contracts");
    let series = backend
        .client()
        .fetch_series(SeriesId::GenderChurn, &snapshot)
        .unwrap();

    assert_eq!(
        series,
        ChartSeries::split(&["Female", "Male"], &[939.0, 930.0], &[2549.0, 2625.0])
    );
    assert!(backend.requests()[0].starts_with("/chart/genderChurn?"));
}

#[test]
fn integer_labels_become_strings() {
    let backend = FakeBackend::start(churn_backend);
    let snapshot = FilterSnapshot::new("a", "b", "c");
    let series = backend
        .client()
        .fetch_series(SeriesId::TenureChurn, &snapshot)
        .unwrap();

    assert_eq!(series.labels(), ["1", "2", "3"]);
    assert_eq!(series.arity(), Arity::Single);
}

#[test]
fn server_error_is_reported_with_status_and_url() {
    let backend = FakeBackend::start(|path| match path {
        "/chart/phoneChurn" => (500, "boom".to_string()),
        other => churn_backend(other),
    });
    let err = backend
        .client()
        .fetch_series(SeriesId::PhoneChurn, &FilterSnapshot::new("a", "b", "c"))
        .unwrap_err();

    match &err {
        FetchError::Status { status, .. } => assert_eq!(*status, 500),
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(err.url().ends_with("/chart/phoneChurn"));
}

#[test]
fn every_request_opens_its_own_connection() {
    let backend = FakeBackend::start(churn_backend);
    let client = backend.client();
    let snapshot = FilterSnapshot::new("a", "b", "c");
    for id in [SeriesId::ChurnRate, SeriesId::GenderChurn, SeriesId::PhoneChurn] {
        client.fetch_series(id, &snapshot).unwrap();
    }

    let peers = backend.peers();
    assert_eq!(peers.len(), 3);
    assert!(peers.iter().all(Option::is_some));
    // No pooled socket is reused, so each request arrives from a new port
    let distinct: HashSet<_> = peers.iter().flatten().collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn wrong_body_shape_is_a_decode_error() {
    let backend = FakeBackend::start(|path| match path {
        "/stats" => (200, r#"{"total_customers": "many"}"#.to_string()),
        other => churn_backend(other),
    });
    let err = backend
        .client()
        .fetch_summary(&FilterSnapshot::new("a", "b", "c"))
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }), "{err:?}");
}

// ---------------------------------------------------------------------------
// Dashboard over HTTP
// ---------------------------------------------------------------------------

#[test]
fn full_refresh_populates_summary_and_charts() {
    let backend = FakeBackend::start(churn_backend);
    let client = backend.client();
    let snapshot = client.fetch_filters().unwrap().default_snapshot();
    let mut dashboard = Dashboard::new(client, WidgetRegistry::<RecordingCanvas>::standard());

    let report = dashboard.refresh(&snapshot);

    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(report.fetches, 14);
    // One /filters request plus the refresh
    assert_eq!(backend.requests().len(), 15);

    let summary = dashboard.summary();
    assert_eq!(summary.total_customers, "1000");
    assert_eq!(summary.churn_rate, "26.5%");
    assert_eq!(summary.avg_monthly, "$64.2");
    assert_eq!(summary.avg_tenure, "32.4 mos");

    let gender = dashboard.widgets().get(SeriesId::GenderChurn).unwrap();
    assert_eq!(gender.data().labels, vec!["Female", "Male"]);
    assert_eq!(
        gender.data().datasets,
        vec![vec![939.0, 930.0], vec![2549.0, 2625.0]]
    );
    assert_eq!(gender.status(), &WidgetStatus::Fresh);
    assert_eq!(gender.canvas().draw_count(), 1);
}

#[test]
fn failing_endpoint_marks_only_its_widget() {
    let backend = FakeBackend::start(|path| match path {
        "/chart/phoneChurn" => (500, String::new()),
        other => churn_backend(other),
    });
    let mut dashboard = Dashboard::new(
        backend.client(),
        WidgetRegistry::<RecordingCanvas>::standard(),
    );

    let report = dashboard.refresh(&FilterSnapshot::new("a", "b", "c"));

    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].target,
        RefreshTarget::Series(SeriesId::PhoneChurn)
    );
    for (id, widget) in dashboard.widgets().iter() {
        if id == SeriesId::PhoneChurn {
            assert_eq!(
                widget.status(),
                &WidgetStatus::Unavailable {
                    reason: "HTTP 500".to_string()
                }
            );
        } else {
            assert_eq!(widget.status(), &WidgetStatus::Fresh, "{id}");
        }
    }

    let err = report.into_result().unwrap_err();
    assert_eq!(err.failed, 1);
    assert_eq!(err.attempted, 14);
}

#[test]
fn unreachable_backend_fails_every_target() {
    let client = BackendClient::new("http://127.0.0.1:9");
    let mut dashboard = Dashboard::new(client, WidgetRegistry::<RecordingCanvas>::standard());
    let report = dashboard.refresh(&FilterSnapshot::new("a", "b", "c"));

    assert_eq!(report.failures.len(), 14);
    assert!(matches!(
        dashboard.summary().status,
        WidgetStatus::Unavailable { .. }
    ));
}

// ---------------------------------------------------------------------------
// Interactive session over HTTP
// ---------------------------------------------------------------------------

#[test]
fn session_refreshes_once_per_apply_or_reset() {
    colored::control::set_override(false);
    let backend = FakeBackend::start(churn_backend);
    let client = backend.client();
    let mut controls = FilterControls::new(client.fetch_filters().unwrap());
    let mut dashboard = Dashboard::new(
        client,
        WidgetRegistry::standard_with(|_| TextCanvas::with_bar_width(10)),
    );

    let input = "segment New Customers\n\
                 service Fiber optic\n\
                 apply\n\
                 frobnicate\n\
                 contract Lifetime\n\
                 show\n\
                 reset\n\
                 quit\n\
                 apply\n";
    let mut out = Vec::new();
    let refreshes = cli::interactive_session(
        &mut dashboard,
        &mut controls,
        &quiet_logging(),
        input.as_bytes(),
        &mut out,
    )
    .unwrap();

    // initial load, apply, reset; nothing after quit
    assert_eq!(refreshes, 3);
    let requests = backend.requests();
    assert_eq!(requests.len(), 1 + 3 * 14);

    let applied: Vec<_> = requests
        .iter()
        .filter(|url| url.starts_with("/stats"))
        .map(|url| query_pairs(url))
        .collect();
    assert_eq!(applied[0][0].1, "All Segments");
    assert_eq!(applied[1][0].1, "New Customers");
    assert_eq!(applied[1][1].1, "Fiber optic");
    assert_eq!(applied[2][0].1, "All Segments");
    assert_eq!(
        dashboard.last_snapshot(),
        Some(&FilterSnapshot::new(
            "All Segments",
            "All Services",
            "All Contracts"
        ))
    );

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Customer Churn Dashboard"));
    assert!(text.contains("frobnicate"));
    assert!(text.contains("Lifetime"));
    assert!(text.contains("26.5%"));
}

#[test]
fn session_ends_at_end_of_input() {
    colored::control::set_override(false);
    let backend = FakeBackend::start(churn_backend);
    let client = backend.client();
    let mut controls = FilterControls::new(client.fetch_filters().unwrap());
    let mut dashboard = Dashboard::new(client, WidgetRegistry::<TextCanvas>::standard());

    let mut out = Vec::new();
    let refreshes = cli::interactive_session(
        &mut dashboard,
        &mut controls,
        &quiet_logging(),
        "help\n\n".as_bytes(),
        &mut out,
    )
    .unwrap();

    assert_eq!(refreshes, 1);
    assert!(String::from_utf8(out).unwrap().contains("apply"));
}
