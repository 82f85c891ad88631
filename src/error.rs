//! Error types for Backoffice

use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'backoffice init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error("Not signed in. Run 'backoffice login' first.")]
    NotSignedIn,

    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[source] Arc<Error>),

    /// The session was renewed after this request failed. The request itself
    /// was not retried.
    #[error("Session renewed after failed request: {0}")]
    SessionRenewed(#[source] Box<Error>),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status of the failure, looking through recovery wrappers
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::RefreshFailed(inner) => inner.status(),
            Error::SessionRenewed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Human readable message carried by a backend error body.
    ///
    /// Backends answer validation failures with `{"message": ...}` or
    /// `{"error": ...}`; anything else falls back to the raw body.
    pub fn message(&self) -> Option<String> {
        match self {
            Error::Api { body, .. } => {
                let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
                let field = parsed.as_ref().and_then(|v| {
                    v.get("message")
                        .or_else(|| v.get("error"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                });
                match field {
                    Some(message) => Some(message),
                    None if body.is_empty() => None,
                    None => Some(body.clone()),
                }
            }
            Error::RefreshFailed(inner) => inner.message(),
            Error::SessionRenewed(inner) => inner.message(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
