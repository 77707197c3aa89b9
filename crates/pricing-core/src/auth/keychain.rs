use std::path::Path;

use anyhow::{Context, Result};
use keyring::Entry;
use parking_lot::RwLock;
use tracing::warn;

use super::{Credential, CredentialStore, FileCredentialStore};
use crate::models::UserIdentity;

const SERVICE_NAME: &str = "pricing-admin";

/// Keychain account under which the refresh token is stored
const REFRESH_TOKEN_ACCOUNT: &str = "refresh-token";

/// Credential store that keeps the long-lived refresh token in the OS
/// keychain. The short-lived access token and the identity stay in the
/// session file.
pub struct KeyringCredentialStore {
    session: FileCredentialStore,
    entry: Entry,
    refresh_token: RwLock<Option<String>>,
}

impl KeyringCredentialStore {
    pub fn open(dir: &Path) -> Result<Self> {
        let session = FileCredentialStore::open(dir)?;
        let entry = Entry::new(SERVICE_NAME, REFRESH_TOKEN_ACCOUNT)
            .context("Failed to create keyring entry")?;

        let refresh_token = match entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read refresh token from keychain");
                None
            }
        };

        Ok(Self {
            session,
            entry,
            refresh_token: RwLock::new(refresh_token),
        })
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.session.access_token()
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh_token.read().clone()
    }

    fn user(&self) -> Option<UserIdentity> {
        self.session.user()
    }

    fn set_access_token(&self, token: &str) -> Result<()> {
        self.session.set_access_token(token)
    }

    fn set_credential(&self, mut credential: Credential) -> Result<()> {
        let refresh = credential.refresh_token.take();
        match refresh {
            Some(ref token) => self
                .entry
                .set_password(token)
                .context("Failed to store refresh token in keychain")?,
            None => self.delete_entry()?,
        }
        self.session.set_credential(credential)?;
        *self.refresh_token.write() = refresh;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.refresh_token.write() = None;
        self.session.clear()?;
        self.delete_entry()
    }
}

impl KeyringCredentialStore {
    fn delete_entry(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete refresh token from keychain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::SESSION_FILE;

    #[test]
    fn test_refresh_token_lives_in_keychain_only() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let dir = tempfile::tempdir().unwrap();
        let store = KeyringCredentialStore::open(dir.path()).unwrap();
        assert!(store.refresh_token().is_none());

        store
            .set_credential(Credential::new("A1", Some("R1".to_string())))
            .unwrap();
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
        assert_eq!(store.access_token().as_deref(), Some("A1"));
        assert_eq!(store.entry.get_password().unwrap(), "R1");

        let on_disk = std::fs::read_to_string(dir.path().join(SESSION_FILE)).unwrap();
        assert!(on_disk.contains("A1"));
        assert!(!on_disk.contains("R1"));

        store.clear().unwrap();
        assert!(store.refresh_token().is_none());
        assert!(store.access_token().is_none());
        assert!(matches!(
            store.entry.get_password(),
            Err(keyring::Error::NoEntry)
        ));
        // Clearing twice is harmless
        store.clear().unwrap();
    }
}
