//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// The REST backend every request is sent to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the sign-in endpoint. Requests to it carry the client's
    /// Basic credential instead of the user's bearer token.
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_sign_in_path() -> String {
    "/oauth/token".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sign_in_path: default_sign_in_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// OAuth client registered with the backend
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub secret: String,
}

/// Where the session is persisted and where a forced logout sends the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,

    #[serde(default = "default_login_route")]
    pub login_route: String,
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".backoffice/session.json")
}

fn default_login_route() -> String {
    "/login".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
            login_route: default_login_route(),
        }
    }
}

impl Config {
    /// Check the values a client cannot work without
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;

        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(Error::Config(format!(
                "backend.base_url must start with http:// or https://, got '{}'",
                self.backend.base_url
            )));
        }
        if !self.backend.sign_in_path.starts_with('/') {
            return Err(Error::Config(
                "backend.sign_in_path must start with '/'".to_string(),
            ));
        }
        if self.client.id.is_empty() {
            return Err(Error::Config("client.id is not set".to_string()));
        }
        Ok(())
    }
}
