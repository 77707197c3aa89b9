//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL, request timeout, last used email and where the
//! session credentials are kept.
//!
//! Configuration is stored at `~/.config/pricing-admin/config.json`.
//! `PRICING_API_URL` in the environment (or a `.env` file loaded by the
//! binary) overrides the saved base URL.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{Gateway, ReqwestTransport};
use crate::auth::{CredentialStore, FileCredentialStore, KeyringCredentialStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "pricing-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "PRICING_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// Everything in the session file
    #[default]
    File,
    /// Refresh token in the OS keychain
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
    pub credential_backend: CredentialBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_email: None,
            credential_backend: CredentialBackend::default(),
        }
    }
}

impl Config {
    /// Load the saved config and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    pub fn apply_overrides(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Open the configured credential store.
    pub fn open_credentials(&self) -> Result<Arc<dyn CredentialStore>> {
        let dir = self.data_dir()?;
        Ok(match self.credential_backend {
            CredentialBackend::File => Arc::new(FileCredentialStore::open(&dir)?),
            CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::open(&dir)?),
        })
    }

    /// Build a gateway talking to the configured API with the configured
    /// credential store.
    pub fn connect(&self) -> Result<Arc<Gateway>> {
        let transport = ReqwestTransport::new(self.request_timeout())
            .context("Failed to build HTTP client")?;
        let credentials = self.open_credentials()?;
        Ok(Arc::new(Gateway::new(
            self.api_base_url.clone(),
            Arc::new(transport),
            credentials,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"last_email": "ana@example.com", "credential_backend": "keyring"}"#)
                .unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
        assert_eq!(config.last_email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_env_override() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".to_string()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);

        config.apply_overrides(Some("https://pricing.example.com/api".to_string()));
        assert_eq!(config.api_base_url, "https://pricing.example.com/api");
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = Config {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
