//! Authenticated HTTP client for the backend origin

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use crate::auth::{
    AppShell, ClientCredentials, GrantRequest, RecoveryHandler, RequestAuthenticator, TokenIssuer,
};
use crate::client::request::RequestDescriptor;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{SessionManager, TokenPair};

/// Why a dispatch failed. Only `Response` runs session recovery.
enum Failure {
    /// The request could not be built
    Construct(Error),
    /// No response arrived (connection, timeout)
    Transport(Error),
    /// The backend answered with a non-2xx status
    Response(Error),
}

impl Failure {
    fn into_error(self) -> Error {
        match self {
            Failure::Construct(e) | Failure::Transport(e) | Failure::Response(e) => e,
        }
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    authenticator: RequestAuthenticator,
    recovery: RecoveryHandler,
    session: SessionManager,
}

/// HTTP client that authenticates every request and recovers the session
/// when one fails. Cloning is cheap; clones share the session and the
/// single-flight refresh guard.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<Inner>,
}

impl AuthenticatedClient {
    /// Create a client for the configured backend
    pub fn new(config: &Config, session: SessionManager, shell: Arc<dyn AppShell>) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if config.backend.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.backend.timeout_secs));
        }
        let http = builder.build()?;

        let credentials = ClientCredentials::new(&config.client.id, &config.client.secret);
        let authenticator = RequestAuthenticator::new(
            &config.backend.sign_in_path,
            credentials,
            session.clone(),
        );
        let recovery = RecoveryHandler::new(session.clone(), shell, &config.session.login_route);

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.backend.base_url.trim_end_matches('/').to_string(),
                authenticator,
                recovery,
                session,
            }),
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Send a request. Non-2xx responses run session recovery before the
    /// error is returned; the request itself is never retried. Transport
    /// errors are returned as they are.
    pub async fn send(&self, request: RequestDescriptor) -> Result<reqwest::Response> {
        let span = tracing::debug_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            path = %request.path,
        );

        async move {
            match self.dispatch(request).await {
                Ok(response) => Ok(response),
                Err(Failure::Construct(e)) | Err(Failure::Transport(e)) => Err(e),
                Err(Failure::Response(e)) => {
                    debug!(error = %e, "Request failed, running session recovery");
                    Err(self.inner.recovery.handle_failure(self.issuer(), e).await)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Send a request and decode its JSON body. An empty body decodes as `null`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Sign in with a password grant and store the issued tokens
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenPair> {
        let tokens = self
            .request_tokens(&GrantRequest::password(email, password))
            .await?;
        self.inner.session.store_tokens(&tokens)?;
        self.inner.recovery.invalidate();
        info!(email, "Signed in");
        Ok(tokens)
    }

    /// End the session
    pub fn sign_out(&self) -> Result<()> {
        self.inner.recovery.invalidate();
        self.inner.session.clear()
    }

    /// Renew the session with the stored refresh token
    pub async fn refresh(&self) -> Result<()> {
        self.inner.recovery.refresh_now(self.issuer()).await
    }

    fn issuer(&self) -> Arc<dyn TokenIssuer> {
        Arc::new(self.clone())
    }

    /// Sign-in calls bypass recovery, so a failed refresh surfaces directly.
    async fn request_tokens(&self, grant: &GrantRequest) -> Result<TokenPair> {
        debug!(grant_type = grant.grant_type(), "Requesting tokens");
        let request = RequestDescriptor::post(self.inner.authenticator.sign_in_path()).json(grant)?;
        let response = self.dispatch(request).await.map_err(Failure::into_error)?;
        Ok(response.json::<TokenPair>().await?)
    }

    async fn dispatch(
        &self,
        request: RequestDescriptor,
    ) -> std::result::Result<reqwest::Response, Failure> {
        let request = self.build(request).map_err(Failure::Construct)?;

        let response = self
            .inner
            .http
            .execute(request)
            .await
            .map_err(|e| Failure::Transport(e.into()))?;

        let status = response.status();
        debug!(%status, "Response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Failure::Response(Error::Api {
            status: status.as_u16(),
            body,
        }))
    }

    fn build(&self, request: RequestDescriptor) -> Result<reqwest::Request> {
        let request = self.inner.authenticator.authorize(request)?;

        let url = if request.path.starts_with('/') {
            format!("{}{}", self.inner.base_url, request.path)
        } else {
            format!("{}/{}", self.inner.base_url, request.path)
        };

        let mut builder = self
            .inner
            .http
            .request(request.method, url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl TokenIssuer for AuthenticatedClient {
    async fn issue(&self, grant: &GrantRequest) -> Result<TokenPair> {
        self.request_tokens(grant).await
    }
}
