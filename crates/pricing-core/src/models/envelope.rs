use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard response wrapper used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_without_data() {
        let env: Envelope<Value> =
            serde_json::from_str(r#"{"success": true, "message": "Product 3 deleted successfully"}"#)
                .unwrap();
        assert!(env.success);
        assert!(env.data.is_none());
        assert_eq!(env.message.as_deref(), Some("Product 3 deleted successfully"));
    }

    /// Payload types need not implement `Default`.
    #[derive(Debug, Deserialize)]
    struct Token {
        access: String,
    }

    #[test]
    fn test_envelope_payload_without_default() {
        let env: Envelope<Token> =
            serde_json::from_str(r#"{"success": true, "data": {"access": "A1"}}"#).unwrap();
        assert_eq!(env.into_data().map(|t| t.access).as_deref(), Some("A1"));

        let env: Envelope<Token> = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(env.into_data().is_none());
    }
}
