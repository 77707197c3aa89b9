use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server rejected request ({status}): {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Fallback when the server gives no usable message
const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build an error from a non-2xx response. A 401 here means the
    /// gateway already gave up on recovering the session.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message_from_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthenticated(message),
            code => ApiError::UpstreamError {
                status: code,
                message,
            },
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthenticated(_))
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::UpstreamError { message, .. } | ApiError::Unauthenticated(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkError(err.to_string())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Field validation maps (`details` or `errors`) win, rendered one
/// `field: msg, msg` line per field. Then `message`, `error` and `detail`.
/// Bodies that are not JSON are returned truncated.
pub fn error_message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return GENERIC_ERROR_MESSAGE.to_string();
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return ApiError::truncate_body(trimmed),
    };

    for key in ["details", "errors"] {
        match value.get(key) {
            Some(Value::Object(fields)) => {
                let lines: Vec<String> = fields
                    .iter()
                    .map(|(field, messages)| format!("{}: {}", field, join_messages(messages)))
                    .collect();
                if !lines.is_empty() {
                    return lines.join("\n");
                }
            }
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            _ => {}
        }
    }

    for key in ["message", "error", "detail"] {
        if let Some(Value::String(s)) = value.get(key) {
            if !s.is_empty() {
                return s.clone();
            }
        }
    }

    GENERIC_ERROR_MESSAGE.to_string()
}

fn join_messages(messages: &Value) -> String {
    match messages {
        Value::Array(items) => items
            .iter()
            .map(|m| match m {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
