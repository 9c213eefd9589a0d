//! A mock HTTP server standing in for aggregator APIs and the quote proxy.
//!
//! The server replays a queue of expectations in order. Each incoming request
//! is checked against the next expectation; mismatches are answered with a
//! `500` and recorded, so that [`Server::assert_all_met`] can report them from
//! the test task instead of panicking inside the server.

use {
    axum::{
        extract::State,
        http::{HeaderMap, Method, StatusCode, Uri, header},
        response::{IntoResponse, Response},
    },
    std::{
        collections::VecDeque,
        net::SocketAddr,
        sync::{Arc, Mutex},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    /// Matches any path and query.
    Any,
    /// Matches the path (without leading `/`) and query exactly, for example
    /// `"swap/v5.2/1/quote?src=0x..&dst=0x.."`.
    Exact(String),
}

impl Path {
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    Json(serde_json::Value),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Expectation {
    path: Path,
    headers: Vec<(String, String)>,
    status: StatusCode,
    body: Body,
}

impl Expectation {
    /// Expects a `GET` request and replies with `200` and the JSON body.
    pub fn get(path: Path, res: serde_json::Value) -> Self {
        Self {
            path,
            headers: Vec::new(),
            status: StatusCode::OK,
            body: Body::Json(res),
        }
    }

    /// Expects a `GET` request and replies with a raw text body.
    pub fn get_text(path: Path, status: StatusCode, res: impl Into<String>) -> Self {
        Self {
            path,
            headers: Vec::new(),
            status,
            body: Body::Text(res.into()),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Additionally requires the request to carry the given header value.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.to_owned()));
        self
    }
}

#[derive(Debug, Default)]
struct Inner {
    expectations: VecDeque<Expectation>,
    failures: Vec<String>,
}

#[derive(Debug, Clone)]
struct Shared(Arc<Mutex<Inner>>);

/// Handle to a running mock server.
pub struct Server {
    pub address: SocketAddr,
    state: Shared,
}

impl Server {
    /// Base URL of the server, with a trailing slash so it can be joined.
    pub fn url(&self) -> reqwest::Url {
        format!("http://{}/", self.address).parse().unwrap()
    }

    /// Panics if a request did not match its expectation or if expectations
    /// are left over.
    pub fn assert_all_met(&self) {
        let inner = self.state.0.lock().unwrap();
        assert!(
            inner.failures.is_empty(),
            "mock server saw unexpected requests: {:#?}",
            inner.failures
        );
        assert!(
            inner.expectations.is_empty(),
            "mock server has unmet expectations: {:#?}",
            inner.expectations
        );
    }
}

/// Set up a mock external API serving the expectations in order.
pub async fn setup(expectations: Vec<Expectation>) -> Server {
    let state = Shared(Arc::new(Mutex::new(Inner {
        expectations: expectations.into(),
        failures: Vec::new(),
    })));
    let app = axum::Router::new()
        .fallback(handle)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    Server { address, state }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let full_path = uri
        .path_and_query()
        .map(|path| path.as_str().trim_start_matches('/').to_owned())
        .unwrap_or_default();

    let mut inner = state.0.lock().unwrap();
    let result = match inner.expectations.pop_front() {
        None => Err(format!("got {method} {full_path}, but didn't expect any more")),
        Some(expectation) => {
            check(&expectation, &method, &full_path, &headers).map(|()| expectation)
        }
    };

    match result {
        Ok(expectation) => match expectation.body {
            Body::Json(body) => (expectation.status, axum::Json(body)).into_response(),
            Body::Text(body) => (
                expectation.status,
                [(header::CONTENT_TYPE, "text/plain")],
                body,
            )
                .into_response(),
        },
        Err(failure) => {
            inner.failures.push(failure.clone());
            (StatusCode::INTERNAL_SERVER_ERROR, failure).into_response()
        }
    }
}

fn check(
    expectation: &Expectation,
    method: &Method,
    full_path: &str,
    headers: &HeaderMap,
) -> Result<(), String> {
    if method != Method::GET {
        return Err(format!("expected GET request but got {method} {full_path}"));
    }
    if let Path::Exact(expected) = &expectation.path {
        if expected != full_path {
            return Err(format!(
                "request has unexpected path: expected {expected:?}, got {full_path:?}"
            ));
        }
    }
    for (name, value) in &expectation.headers {
        let actual = headers.get(name).and_then(|actual| actual.to_str().ok());
        if actual != Some(value.as_str()) {
            return Err(format!(
                "request {full_path:?} has header {name}: {actual:?}, expected {value:?}"
            ));
        }
    }
    Ok(())
}
