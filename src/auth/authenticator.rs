//! Request authenticator: attaches the right credential to every outgoing request

use crate::auth::models::ClientCredentials;
use crate::client::request::{normalize_route, RequestDescriptor};
use crate::error::{Error, Result};
use crate::session::SessionManager;
use reqwest::header::{HeaderValue, AUTHORIZATION};

/// Decorates outgoing requests with an `Authorization` header.
///
/// Only reads the session; never writes it.
#[derive(Clone, Debug)]
pub struct RequestAuthenticator {
    sign_in_path: String,
    credentials: ClientCredentials,
    session: SessionManager,
}

impl RequestAuthenticator {
    pub fn new(
        sign_in_path: impl Into<String>,
        credentials: ClientCredentials,
        session: SessionManager,
    ) -> Self {
        let sign_in_path = sign_in_path.into();
        Self {
            sign_in_path: normalize_route(&sign_in_path).to_string(),
            credentials,
            session,
        }
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    pub fn is_sign_in(&self, path: &str) -> bool {
        normalize_route(path) == self.sign_in_path
    }

    /// Authorization value for a request to `path`.
    ///
    /// The sign-in endpoint always gets the client's Basic credential.
    /// Everything else gets the stored access token as a Bearer credential,
    /// or an empty value when there is none.
    pub fn authorization_for(&self, path: &str) -> String {
        if self.is_sign_in(path) {
            return self.credentials.basic_authorization();
        }

        match self.session.access_token() {
            Some(token) => format!("Bearer {}", token),
            None => String::new(),
        }
    }

    /// Set the `Authorization` header on `request`, replacing any existing one
    pub fn authorize(&self, mut request: RequestDescriptor) -> Result<RequestDescriptor> {
        let value = self.authorization_for(&request.path);
        let mut value = HeaderValue::from_str(&value)
            .map_err(|e| Error::Other(format!("Invalid authorization header: {}", e)))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(request)
    }
}
