use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Credential, CredentialStore};
use crate::models::UserIdentity;

/// Session file name in the data directory
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(flatten)]
    pub credential: Credential,
    pub stored_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            stored_at: Utc::now(),
        }
    }
}

/// Credential store persisted as JSON so a session survives restarts.
pub struct FileCredentialStore {
    path: PathBuf,
    data: RwLock<Option<SessionData>>,
}

impl FileCredentialStore {
    /// Open the store, loading an existing session file if there is one.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(SESSION_FILE);
        let data = Self::load(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn load(path: &Path) -> Result<Option<SessionData>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        debug!(path = %path.display(), "Loaded saved session");
        Ok(Some(data))
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the current session was last written.
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.data.read().as_ref().map(|d| d.stored_at)
    }
}

impl CredentialStore for FileCredentialStore {
    fn access_token(&self) -> Option<String> {
        self.data
            .read()
            .as_ref()
            .map(|d| d.credential.access_token.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.data
            .read()
            .as_ref()
            .and_then(|d| d.credential.refresh_token.clone())
    }

    fn user(&self) -> Option<UserIdentity> {
        self.data.read().as_ref().and_then(|d| d.credential.user.clone())
    }

    fn set_access_token(&self, token: &str) -> Result<()> {
        let mut guard = self.data.write();
        if let Some(ref mut data) = *guard {
            data.credential.access_token = token.to_string();
            data.stored_at = Utc::now();
            self.save(data)?;
        }
        Ok(())
    }

    fn set_credential(&self, credential: Credential) -> Result<()> {
        let data = SessionData::new(credential);
        self.save(&data)?;
        *self.data.write() = Some(data);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.data.write() = None;
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserIdentity {
        UserIdentity {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            role: Some("admin".to_string()),
            custom_role: None,
        }
    }

    #[test]
    fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileCredentialStore::open(dir.path()).unwrap();
        assert!(store.access_token().is_none());
        store
            .set_credential(Credential::new("A1", Some("R1".to_string())).with_user(user()))
            .unwrap();
        store.set_access_token("A2").unwrap();

        let reopened = FileCredentialStore::open(dir.path()).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("A2"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));
        assert_eq!(reopened.user(), Some(user()));
        assert!(reopened.stored_at().is_some());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::open(dir.path()).unwrap();
        store.set_credential(Credential::new("A1", None)).unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.access_token().is_none());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        assert!(FileCredentialStore::open(dir.path()).is_err());
    }
}
