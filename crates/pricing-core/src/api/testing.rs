//! Scripted backend used by the unit tests of the gateway and the
//! resource clients.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::Notify;

use super::gateway::REFRESH_PATH;
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;

/// Access token the fake server rejects
pub const EXPIRED: &str = "expired";

/// Access token the fake server accepts, and the one a refresh mints
pub const FRESH: &str = "NEW";

const EMPTY_PAGE: &str =
    r#"{"success": true, "data": {"count": 0, "next": null, "previous": null, "results": []}}"#;

struct Route {
    method: Method,
    path: String,
    public: bool,
    status: StatusCode,
    body: String,
}

#[derive(Default)]
pub struct FakeBackend {
    log: Mutex<Vec<HttpRequest>>,
    routes: Mutex<Vec<Route>>,
    first_attempt_delays: Mutex<HashMap<String, Duration>>,
    refresh_calls: AtomicUsize,
    refresh_gate: Mutex<Option<Arc<Notify>>>,
    fail_refresh: AtomicBool,
    reject_all: AtomicBool,
    offline: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `method path` with a fixed response. Requires a valid token.
    pub fn route(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.add_route(method, path, false, status, body);
    }

    /// Like [`route`](Self::route) but no token is checked.
    pub fn route_public(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.add_route(method, path, true, status, body);
    }

    fn add_route(&self, method: Method, path: &str, public: bool, status: StatusCode, body: &str) {
        self.routes.lock().push(Route {
            method,
            path: path.to_string(),
            public,
            status,
            body: body.to_string(),
        });
    }

    /// Hold refresh responses until the returned handle is notified.
    pub fn gate_refresh(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.refresh_gate.lock() = Some(gate.clone());
        gate
    }

    /// Hold the answer to requests for `path` that carry the expired token.
    pub fn delay_first_attempt(&self, path: &str, delay: Duration) {
        self.first_attempt_delays
            .lock()
            .insert(path.to_string(), delay);
    }

    pub fn fail_refresh(&self) {
        self.fail_refresh.store(true, Ordering::SeqCst);
    }

    /// Every token is rejected, including freshly minted ones.
    pub fn reject_all_tokens(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_bodies(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(REFRESH_PATH))
            .filter_map(|r| r.body)
            .collect()
    }

    fn delay_for(&self, request: &HttpRequest) -> Option<Duration> {
        if request.bearer.as_deref() != Some(EXPIRED) {
            return None;
        }
        self.first_attempt_delays
            .lock()
            .iter()
            .find(|(path, _)| request.url.ends_with(path.as_str()))
            .map(|(_, d)| *d)
    }

    async fn refresh(&self) -> HttpResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.refresh_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_refresh.load(Ordering::SeqCst) {
            HttpResponse::new(
                StatusCode::UNAUTHORIZED,
                r#"{"detail": "Token is invalid or expired", "code": "token_not_valid"}"#,
            )
        } else {
            HttpResponse::new(StatusCode::OK, format!(r#"{{"access": "{}"}}"#, FRESH))
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        // Logged on arrival, so the log shows the order callers reached us
        self.log.lock().push(request.clone());
        let delay = self.delay_for(&request);
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError("connection refused".to_string()));
        }
        if request.url.ends_with(REFRESH_PATH) {
            return Ok(self.refresh().await);
        }

        let authorized = request.bearer.as_deref() == Some(FRESH)
            && !self.reject_all.load(Ordering::SeqCst);

        let routes = self.routes.lock();
        let route = routes
            .iter()
            .find(|r| r.method == request.method && request.url.ends_with(r.path.as_str()));

        match route {
            Some(r) if r.public || authorized => Ok(HttpResponse::new(r.status, r.body.clone())),
            _ if !authorized => Ok(HttpResponse::new(
                StatusCode::UNAUTHORIZED,
                r#"{"detail": "Given token not valid for any token type"}"#,
            )),
            _ => Ok(HttpResponse::new(StatusCode::OK, EMPTY_PAGE)),
        }
    }
}
