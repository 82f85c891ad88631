//! Authentication models

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use std::fmt;

/// OAuth client identity used for the sign-in call's Basic credential
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// `Basic base64(client_id:client_secret)`
    pub fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Body of a sign-in call
#[derive(Clone, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum GrantRequest {
    /// Interactive sign-in
    Password { email: String, password: String },
    /// Silent re-authentication with a stored refresh token
    Refresh { refresh_token: String },
}

impl GrantRequest {
    pub fn password(email: impl Into<String>, password: impl Into<String>) -> Self {
        GrantRequest::Password {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn refresh(refresh_token: impl Into<String>) -> Self {
        GrantRequest::Refresh {
            refresh_token: refresh_token.into(),
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            GrantRequest::Password { .. } => "password",
            GrantRequest::Refresh { .. } => "refresh",
        }
    }
}

impl fmt::Debug for GrantRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantRequest::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .finish_non_exhaustive(),
            GrantRequest::Refresh { .. } => f.debug_struct("Refresh").finish_non_exhaustive(),
        }
    }
}
