//! HTTP transport abstraction.
//!
//! The gateway never talks to reqwest directly; it hands a fully built
//! [`HttpRequest`] to a [`Transport`]. Tests swap in a scripted transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::ApiError;

/// An outgoing request, fully resolved against the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the `Authorization` header this request carries, if any.
    pub fn authorization(&self) -> Option<String> {
        self.bearer.as_ref().map(|t| format!("Bearer {}", t))
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("{} (status {})", e, self.status)))
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Only transport-level failures are errors; any
    /// HTTP status comes back as a response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Transport backed by a pooled reqwest client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            url,
            query,
            bearer,
            body,
        } = request;

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%method, url = %url, status = status.as_u16(), "HTTP response");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::api::{ApiRequest, Gateway};
    use crate::auth::{Credential, CredentialStore, MemoryCredentialStore};

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_sends_bearer_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/products/")
            .match_header("authorization", "Bearer A1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "eco bottle".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let mut request = HttpRequest::new(Method::GET, format!("{}/api/products/", server.url()));
        request.query = vec![
            ("name".to_string(), "eco bottle".to_string()),
            ("page".to_string(), "2".to_string()),
        ];
        request.bearer = Some("A1".to_string());

        let response = transport().send(request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json::<Value>().unwrap(), json!({"success": true}));
    }

    #[tokio::test]
    async fn test_sends_json_body_without_auth() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/login/")
            .match_header("authorization", Matcher::Missing)
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"email": "ana@example.com", "password": "pw"})))
            .with_status(401)
            .with_body(r#"{"error": "Invalid credentials"}"#)
            .create_async()
            .await;

        let request = HttpRequest::new(Method::POST, format!("{}/api/login/", server.url()))
            .json(json!({"email": "ana@example.com", "password": "pw"}));

        let response = transport().send(request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        // Nothing listens on the discard port
        let request = HttpRequest::new(Method::GET, "http://127.0.0.1:9/api/products/");
        let err = transport().send(request).await.unwrap_err();
        assert!(matches!(err, ApiError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_gateway_refresh_round_trip_over_http() {
        let mut server = mockito::Server::new_async().await;
        let rejected = server
            .mock("GET", "/api/products/")
            .match_header("authorization", "Bearer expired")
            .with_status(401)
            .with_body(r#"{"detail": "Given token not valid for any token type"}"#)
            .expect(1)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/api/token/refresh/")
            .match_body(Matcher::Json(json!({"refresh": "R1"})))
            .with_status(200)
            .with_body(r#"{"access": "NEW"}"#)
            .expect(1)
            .create_async()
            .await;
        let replayed = server
            .mock("GET", "/api/products/")
            .match_header("authorization", "Bearer NEW")
            .with_status(200)
            .with_body(r#"{"success": true, "data": {"count": 0, "results": []}}"#)
            .expect(1)
            .create_async()
            .await;

        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "expired",
            Some("R1".to_string()),
        )));
        let gateway = Gateway::new(
            format!("{}/api", server.url()),
            Arc::new(transport()),
            store.clone(),
        );

        let body: Value = gateway.send(ApiRequest::get("/products/")).await.unwrap();

        assert_eq!(body["data"]["count"], 0);
        rejected.assert_async().await;
        refresh.assert_async().await;
        replayed.assert_async().await;
        assert_eq!(store.access_token().as_deref(), Some("NEW"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
    }
}
