//! In-process stand-in for the upstream War API, used by tests.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A canned answer for one endpoint.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub body: String,
    pub etag: Option<String>,
}

impl Canned {
    pub fn json(body: serde_json::Value, etag: Option<&str>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            etag: etag.map(str::to_string),
        }
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            etag: None,
        }
    }
}

/// A request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub if_none_match: Option<String>,
}

#[derive(Default)]
struct FakeState {
    routes: Mutex<HashMap<String, Canned>>,
    hits: Mutex<Vec<Hit>>,
    // Answer 304 regardless of validators, to provoke protocol violations.
    force_not_modified: Mutex<bool>,
}

/// Fake upstream bound to an ephemeral local port.
pub struct FakeApi {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let router = Router::new().fallback(respond).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Set the answer for `endpoint` (relative path, no leading slash).
    pub fn set(&self, endpoint: &str, canned: Canned) {
        self.state.routes.lock().unwrap().insert(endpoint.to_string(), canned);
    }

    pub fn force_not_modified(&self, on: bool) {
        *self.state.force_not_modified.lock().unwrap() = on;
    }

    pub fn hits(&self, endpoint: &str) -> Vec<Hit> {
        self.state
            .hits
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.path == endpoint)
            .cloned()
            .collect()
    }
}

async fn respond(State(state): State<Arc<FakeState>>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().trim_start_matches('/').to_string();
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    state.hits.lock().unwrap().push(Hit {
        path: path.clone(),
        if_none_match: if_none_match.clone(),
    });

    if *state.force_not_modified.lock().unwrap() {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    let canned = match state.routes.lock().unwrap().get(&path).cloned() {
        Some(c) => c,
        None => return StatusCode::NOT_FOUND.into_response(),
    };

    if canned.status == StatusCode::OK && canned.etag.is_some() && canned.etag == if_none_match {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    if let Some(etag) = &canned.etag {
        response_headers.insert(header::ETAG, etag.parse().unwrap());
    }

    (canned.status, response_headers, canned.body).into_response()
}
