use std::sync::Arc;

use tracing::info;

use super::{ApiError, ApiRequest, Gateway};
use crate::models::{Envelope, LoginRequest, LoginResponse, RegisterRequest};

const LOGIN_PATH: &str = "/login/";
const REGISTER_PATH: &str = "/register/";

/// Login and registration endpoints.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Arc<Gateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Exchange email and password for a token pair and the user's identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = ApiRequest::post(LOGIN_PATH)
            .json(&body)?
            .without_session_recovery();

        let envelope: Envelope<LoginResponse> = self.gateway.send(request).await?;
        let login = envelope
            .into_data()
            .ok_or_else(|| ApiError::InvalidResponse("login response has no data".to_string()))?;
        info!(username = %login.username, "Logged in");
        Ok(login)
    }

    /// Create an account. Returns the server's confirmation message.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<String, ApiError> {
        if registration.custom_role.as_deref() == Some("") {
            return Err(ApiError::InvalidRequest(
                "role: For custom roles, please provide a custom_role value".to_string(),
            ));
        }
        let request = ApiRequest::post(REGISTER_PATH)
            .json(registration)?
            .without_session_recovery();

        let envelope: Envelope<serde_json::Value> = self.gateway.send(request).await?;
        Ok(envelope
            .message
            .unwrap_or_else(|| "Registration successful. Please login.".to_string()))
    }
}
