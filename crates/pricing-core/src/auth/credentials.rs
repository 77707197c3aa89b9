use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::models::UserIdentity;

/// Tokens plus the identity they were issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserIdentity>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            user: None,
        }
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }
}

/// Holder of the current session credentials.
///
/// Only login, token refresh and logout mutate it. Readers get owned
/// copies so no lock is held across an await.
pub trait CredentialStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn user(&self) -> Option<UserIdentity>;

    /// Replace the access token after a refresh. No-op when logged out.
    fn set_access_token(&self, token: &str) -> Result<()>;

    /// Install a full credential after login.
    fn set_credential(&self, credential: Credential) -> Result<()>;

    /// Logout: drop tokens and identity.
    fn clear(&self) -> Result<()>;
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            inner: RwLock::new(Some(credential)),
        }
    }

    pub fn snapshot(&self) -> Option<Credential> {
        self.inner.read().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|c| c.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.read().as_ref().and_then(|c| c.refresh_token.clone())
    }

    fn user(&self) -> Option<UserIdentity> {
        self.inner.read().as_ref().and_then(|c| c.user.clone())
    }

    fn set_access_token(&self, token: &str) -> Result<()> {
        if let Some(ref mut c) = *self.inner.write() {
            c.access_token = token.to_string();
        }
        Ok(())
    }

    fn set_credential(&self, credential: Credential) -> Result<()> {
        *self.inner.write() = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        assert!(store.access_token().is_none());

        // Refresh before login has nothing to update
        store.set_access_token("ignored").unwrap();
        assert!(store.access_token().is_none());

        store
            .set_credential(Credential::new("A1", Some("R1".to_string())))
            .unwrap();
        store.set_access_token("A2").unwrap();
        assert_eq!(store.access_token().as_deref(), Some("A2"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));

        store.clear().unwrap();
        assert!(store.snapshot().is_none());
    }
}
