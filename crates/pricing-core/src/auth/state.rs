use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::{Credential, CredentialStore};
use crate::api::{AuthApi, Gateway};
use crate::models::{RegisterRequest, Role, UserIdentity};

/// Login state on top of a credential store.
pub struct AuthState {
    api: AuthApi,
    store: Arc<dyn CredentialStore>,
}

impl AuthState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let store = gateway.credentials().clone();
        Self {
            api: AuthApi::new(gateway),
            store,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.access_token().is_some()
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.store.user()
    }

    /// Log in and persist the issued tokens with the user's identity.
    /// The API error, if any, is kept as the error source.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let login = self.api.login(email, password).await?;
        let user = login.identity();
        let credential = Credential::new(login.access, Some(login.refresh)).with_user(user.clone());
        self.store
            .set_credential(credential)
            .context("Failed to save session")?;
        Ok(user)
    }

    /// Register a new account. Does not log in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<String> {
        let request = RegisterRequest::new(username, email, password, role);
        let message = self.api.register(&request).await?;
        info!(username, "Registered account");
        Ok(message)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.clear().context("Failed to clear session")?;
        info!("Logged out");
        Ok(())
    }
}
