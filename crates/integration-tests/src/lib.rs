//! End-to-end test support for the BarberTime client.
//!
//! [`StubBackend`] is a small `axum` server bound to an ephemeral local port
//! that answers with canned responses and records every request it sees, so
//! tests can drive a real [`Session`] over real HTTP and then inspect what
//! went over the wire.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = StubBackend::start().await?;
//! backend.respond(Method::POST, "/auth/login", 200, auth_body("tok", user_json("u-1", "a@b.com", "customer")));
//!
//! let (session, store) = backend.memory_session();
//! session.login(&email, &password).await?;
//! assert_eq!(backend.requests().len(), 1);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use barbertime_client::{ApiClient, ClientConfig, CredentialStore, MemoryStore, Session};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Path prefix the stub serves the API under.
pub const API_PREFIX: &str = "/api/v1";

/// A canned answer for one route.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: StatusCode,
    pub body: String,
    pub delay: Option<Duration>,
}

/// A request received by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path relative to [`API_PREFIX`].
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    /// Request body parsed as JSON; `Value::Null` if empty or not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct StubState {
    routes: Mutex<HashMap<(Method, String), StubResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stub BarberTime backend.
///
/// Unregistered routes answer `404` with an empty body. The server task is
/// aborted when the stub is dropped.
pub struct StubBackend {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl StubBackend {
    /// Start the stub on `127.0.0.1` with an OS-assigned port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(StubState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, task })
    }

    /// Base URL to configure the client with.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}{API_PREFIX}", self.addr)
    }

    /// Answer `method path` with `status` and a JSON body.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    /// Answer `method path` with `status` and a verbatim body.
    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.insert(method, path, status, body.to_owned(), None);
    }

    /// Like [`StubBackend::respond`], but hold the answer back for `delay`.
    pub fn respond_delayed(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
        delay: Duration,
    ) {
        self.insert(method, path, status, body.to_string(), Some(delay));
    }

    fn insert(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: String,
        delay: Option<Duration>,
    ) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        lock(&self.state.routes).insert(
            (method, path.to_owned()),
            StubResponse {
                status,
                body,
                delay,
            },
        );
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Requests received for one path.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Client configuration pointing at this stub.
    ///
    /// # Panics
    ///
    /// Panics if the stub URL is rejected by the config parser.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        match ClientConfig::new(&self.api_url()) {
            Ok(config) => config,
            Err(e) => panic!("stub URL rejected: {e}"),
        }
    }

    /// Gateway client over the given store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self, store: Arc<dyn CredentialStore>) -> ApiClient {
        match ApiClient::new(&self.config(), store) {
            Ok(client) => client,
            Err(e) => panic!("could not build client: {e}"),
        }
    }

    /// Session over the given store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn session(&self, store: Arc<dyn CredentialStore>) -> Session {
        Session::new(self.client(store))
    }

    /// Session over a fresh in-memory store, returned alongside it.
    #[must_use]
    pub fn memory_session(&self) -> (Session, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (self.session(store.clone()), store)
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(state): State<Arc<StubState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or_else(|| uri.path())
        .to_owned();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };

    lock(&state.requests).push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        authorization: header(AUTHORIZATION.as_str()),
        request_id: header(barbertime_client::api::REQUEST_ID_HEADER),
        content_type: header(CONTENT_TYPE.as_str()),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let canned = lock(&state.routes).get(&(method, path)).cloned();
    let Some(canned) = canned else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }

    (
        canned.status,
        [(CONTENT_TYPE, "application/json")],
        canned.body,
    )
        .into_response()
}

// =============================================================================
// Fixtures
// =============================================================================

/// Identity JSON as the backend serializes it.
#[must_use]
pub fn user_json(id: &str, email: &str, role: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "firstName": "Ana",
        "lastName": "Bell",
        "phone": "+15550100",
        "role": role,
        "createdAt": "2024-02-03T04:05:06Z",
    })
}

/// Body of a session-establishing response.
#[must_use]
pub fn auth_body(token: &str, user: Value) -> Value {
    json!({ "accessToken": token, "user": user })
}

/// Backend error body.
#[must_use]
pub fn error_body(message: &str) -> Value {
    json!({ "message": message })
}
