//! # Configuration
//!
//! TOML configuration with environment overrides.
//!
//! ```toml
//! [store]
//! backend = "file"        # memory | file | http
//! path = "pactwatch-data"
//! url = "https://backend.example"
//! api_key = "..."
//!
//! [session]
//! user_id = "u-1"
//! email = "ada@example.com"
//! access_token = "..."
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! ```
//!
//! `store.api_key` identifies Pactwatch to a hosted backend;
//! `session.access_token` is the user's own credential and is what the
//! hosted backend authorises store calls with.
//!
//! Every section is optional. Environment variables win over the file:
//! `PACTWATCH_STORE_URL`, `PACTWATCH_STORE_API_KEY`, `PACTWATCH_USER_ID`,
//! `PACTWATCH_USER_EMAIL`, `PACTWATCH_ACCESS_TOKEN`.

use crate::error::AppError;
use crate::session::UserSession;
use pactwatch_core::UserId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which contract store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreKind,
    /// Root directory for the file backend.
    pub path: PathBuf,
    /// Base URL for the http backend.
    pub url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreKind::File,
            path: PathBuf::from("pactwatch-data"),
            url: None,
            api_key: None,
        }
    }
}

/// Credentials of a user authenticated out of band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub access_token: Option<String>,
}

impl SessionConfig {
    /// The configured user, if a user id is present.
    #[must_use]
    pub fn user_session(&self) -> Option<UserSession> {
        let user_id = self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
        Some(UserSession::new(
            UserId::new(user_id),
            self.email.clone().unwrap_or_default(),
            self.access_token.clone().unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Complete Pactwatch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PactwatchConfig {
    pub store: StoreConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
}

impl PactwatchConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load configuration from `path`, then apply environment overrides.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Cannot read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `PACTWATCH_*` overrides from a variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = lookup("PACTWATCH_STORE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = lookup("PACTWATCH_STORE_API_KEY") {
            self.store.api_key = Some(key);
        }
        if let Some(user_id) = lookup("PACTWATCH_USER_ID") {
            self.session.user_id = Some(user_id);
        }
        if let Some(email) = lookup("PACTWATCH_USER_EMAIL") {
            self.session.email = Some(email);
        }
        if let Some(token) = lookup("PACTWATCH_ACCESS_TOKEN") {
            self.session.access_token = Some(token);
        }
    }
}
