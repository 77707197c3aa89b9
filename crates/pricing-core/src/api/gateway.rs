//! Session-aware request gateway.
//!
//! Every API call goes through [`Gateway`]. It attaches the current access
//! token, and when the server answers 401 it refreshes the token once,
//! shared by all callers that hit the same expiry, then replays the call.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::refresh::{abandoned, RefreshCoordinator, RefreshTicket};
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;
use crate::auth::CredentialStore;

/// Path of the token refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/token/refresh/";

/// Capacity of the session event channel
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session-level signals for the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session is gone and stored credentials were cleared; the user
    /// has to log in again.
    LoginRequired { reason: String },
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// A request as a resource client describes it: method, path, query, body.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    recover_session: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            recover_session: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Credential-issuing calls (login, register): a 401 there means bad
    /// credentials, not an expired session, so it is never refreshed.
    pub fn without_session_recovery(mut self) -> Self {
        self.recover_session = false;
        self
    }
}

/// One logical call and its retry state. The retry flag travels with the
/// call so a replay that is rejected again is not refreshed a second time.
struct Attempt {
    request: ApiRequest,
    token: Option<String>,
    retried: bool,
}

impl Attempt {
    fn to_http(&self, base_url: &str) -> HttpRequest {
        HttpRequest {
            method: self.request.method.clone(),
            url: join_url(base_url, &self.request.path),
            query: self.request.query.clone(),
            bearer: self.token.clone(),
            body: self.request.body.clone(),
        }
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub struct Gateway {
    base_url: String,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialStore>,
    refresh: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl Gateway {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            base_url: base_url.into(),
            transport,
            credentials,
            refresh: RefreshCoordinator::new(),
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn refresh_state(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Subscribe to session events such as [`SessionEvent::LoginRequired`].
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Dispatch a request and decode the JSON body of a 2xx response.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response.json()
    }

    /// Dispatch a request whose response body is of no interest.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(request).await.map(|_| ())
    }

    /// Dispatch a request, recovering once from an expired access token.
    pub async fn execute(&self, request: ApiRequest) -> Result<HttpResponse, ApiError> {
        let mut attempt = Attempt {
            request,
            token: self.credentials.access_token(),
            retried: false,
        };

        loop {
            debug!(
                method = %attempt.request.method,
                path = %attempt.request.path,
                retried = attempt.retried,
                "Sending API request"
            );
            let response = self.transport.send(attempt.to_http(&self.base_url)).await?;

            if response.status != StatusCode::UNAUTHORIZED
                || attempt.retried
                || !attempt.request.recover_session
            {
                return Self::check_response(response);
            }

            attempt.retried = true;
            let token = self.refresh_access_token().await?;
            attempt.token = Some(token);
        }
    }

    fn check_response(response: HttpResponse) -> Result<HttpResponse, ApiError> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    /// Obtain a new access token, joining a refresh already in flight.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let guard = match self.refresh.join() {
            RefreshTicket::Waiter(rx) => {
                debug!("Waiting for in-flight token refresh");
                return rx.await.unwrap_or_else(|_| Err(abandoned()));
            }
            RefreshTicket::Leader(guard) => guard,
        };

        let outcome = match self.credentials.refresh_token() {
            Some(refresh_token) => {
                info!("Access token rejected, refreshing");
                self.request_new_access_token(&refresh_token).await
            }
            None => {
                warn!("Access token rejected and no refresh token stored");
                Err(ApiError::Unauthenticated(
                    "no refresh token available".to_string(),
                ))
            }
        };

        match outcome {
            Ok(token) => {
                if let Err(e) = self.credentials.set_access_token(&token) {
                    warn!(error = %e, "Failed to persist refreshed access token");
                }
                let released = guard.settle(&Ok(token.clone()));
                info!(released, "Access token refreshed");
                Ok(token)
            }
            Err(err) => {
                // The store must be empty before the flag drops, or a late
                // 401 would lead a second refresh with the dead token.
                let ended = self.clear_session();
                let released = guard.settle(&Err(err.clone()));
                warn!(error = %err, released, "Token refresh failed");
                if ended {
                    // No subscribers is fine
                    let _ = self.events.send(SessionEvent::LoginRequired {
                        reason: err.to_string(),
                    });
                }
                Err(err)
            }
        }
    }

    /// The single network call to the refresh endpoint.
    async fn request_new_access_token(&self, refresh_token: &str) -> Result<String, ApiError> {
        let body = serde_json::to_value(RefreshRequest {
            refresh: refresh_token,
        })
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let request =
            HttpRequest::new(Method::POST, join_url(&self.base_url, REFRESH_PATH)).json(body);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ApiError::Unauthenticated(format!("token refresh failed: {}", e)))?;

        if !response.is_success() {
            let reason = super::error::error_message_from_body(&response.body);
            return Err(ApiError::Unauthenticated(format!(
                "token refresh rejected: {}",
                reason
            )));
        }

        let parsed: RefreshResponse = response
            .json()
            .map_err(|e| ApiError::Unauthenticated(format!("token refresh failed: {}", e)))?;
        Ok(parsed.access)
    }

    /// Drop stored credentials. Returns false when there was no session
    /// left to end, so an already-ended session is not reported twice.
    fn clear_session(&self) -> bool {
        if self.credentials.access_token().is_none() && self.credentials.refresh_token().is_none()
        {
            return false;
        }
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "Failed to clear stored credentials");
        }
        true
    }
}
