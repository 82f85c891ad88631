//! Session states and the token pair issued by the sign-in endpoint

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens returned by a successful sign-in or refresh
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(alias = "refreshToken")]
    pub refresh_token: String,
    /// Role of the signed-in user, cached for the dashboard's menus
    #[serde(default, alias = "roleType", skip_serializing_if = "Option::is_none")]
    pub role_type: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            role_type: None,
        }
    }

    pub fn with_role(mut self, role_type: impl Into<String>) -> Self {
        self.role_type = Some(role_type.into());
        self
    }
}

// Tokens stay out of logs.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("role_type", &self.role_type)
            .finish()
    }
}

/// Which tokens the session currently holds
#[derive(Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No tokens. Initial state, and the state after a forced logout.
    Unauthenticated,
    /// Access token without a refresh token; cannot be renewed
    AccessOnly { access_token: String },
    /// Refresh token without an access token; renewable
    RefreshOnly { refresh_token: String },
    /// Both tokens present
    Authenticated {
        access_token: String,
        refresh_token: String,
    },
}

impl SessionState {
    /// Classify a pair of stored tokens. Empty strings count as absent.
    pub fn from_tokens(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        let access_token = access_token.filter(|t| !t.is_empty());
        let refresh_token = refresh_token.filter(|t| !t.is_empty());

        match (access_token, refresh_token) {
            (None, None) => SessionState::Unauthenticated,
            (Some(access_token), None) => SessionState::AccessOnly { access_token },
            (None, Some(refresh_token)) => SessionState::RefreshOnly { refresh_token },
            (Some(access_token), Some(refresh_token)) => SessionState::Authenticated {
                access_token,
                refresh_token,
            },
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        match self {
            SessionState::AccessOnly { access_token }
            | SessionState::Authenticated { access_token, .. } => Some(access_token),
            _ => None,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            SessionState::RefreshOnly { refresh_token }
            | SessionState::Authenticated { refresh_token, .. } => Some(refresh_token),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::AccessOnly { .. } => "access-only",
            SessionState::RefreshOnly { .. } => "refresh-only",
            SessionState::Authenticated { .. } => "authenticated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionState::{}", self.name())
    }
}
