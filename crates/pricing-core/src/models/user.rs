use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Built-in account roles. Anything else is a custom role and must be
/// accompanied by a `custom_role` value on registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Buyer,
    Supplier,
    Custom(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Buyer => "buyer",
            Role::Supplier => "supplier",
            Role::Custom(name) => name.as_str(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Role::Custom(_))
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "buyer" => Role::Buyer,
            "supplier" => Role::Supplier,
            _ => Role::Custom(s.trim().to_string()),
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of the logged-in user, persisted alongside the tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub custom_role: Option<String>,
}

impl UserIdentity {
    /// Role label for display: the custom role wins when present.
    pub fn role_label(&self) -> &str {
        self.custom_role
            .as_deref()
            .filter(|r| !r.is_empty())
            .or(self.role.as_deref())
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub custom_role: Option<String>,
    pub access: String,
    pub refresh: String,
}

impl LoginResponse {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            custom_role: self.custom_role.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_role: Option<String>,
}

impl RegisterRequest {
    pub fn new(username: &str, email: &str, password: &str, role: Role) -> Self {
        let custom_role = (!role.is_builtin()).then(|| role.as_str().to_string());
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.as_str().to_string(),
            custom_role,
        }
    }
}
