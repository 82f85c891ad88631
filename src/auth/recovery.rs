//! Response recovery: what a failed request does to the session

use crate::auth::models::GrantRequest;
use crate::auth::shell::AppShell;
use crate::error::{Error, Result};
use crate::session::{SessionManager, SessionState, TokenPair};
use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Issues tokens from the sign-in endpoint
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, grant: &GrantRequest) -> Result<TokenPair>;
}

/// What recovery did about a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// A silent refresh stored new tokens and reloaded the shell
    Renewed,
    /// The session was unusable; it was cleared and the shell sent to login
    LoggedOut,
    /// Nothing to recover
    PassThrough,
}

type RefreshOutcome = std::result::Result<(), Arc<Error>>;
type SharedOutcome = Shared<BoxFuture<'static, RefreshOutcome>>;

/// A running refresh and the refresh token it was started with
struct InFlight {
    id: u64,
    refresh_token: String,
    outcome: SharedOutcome,
}

#[derive(Default)]
struct Slot {
    current: Option<InFlight>,
    next_id: u64,
}

/// Reacts to failed responses by renewing or terminating the session.
///
/// At most one silent refresh runs at a time. Failures observed while a
/// refresh is in flight wait for that refresh and share its outcome. The
/// refresh runs as its own task, so it completes and frees the slot even
/// when every caller waiting on it is dropped.
pub struct RecoveryHandler {
    session: SessionManager,
    shell: Arc<dyn AppShell>,
    login_route: String,
    slot: Arc<Mutex<Slot>>,
}

fn lock_slot(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

enum Step {
    Refresh(SharedOutcome),
    Logout,
    PassThrough,
}

impl RecoveryHandler {
    pub fn new(
        session: SessionManager,
        shell: Arc<dyn AppShell>,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            session,
            shell,
            login_route: login_route.into(),
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Whether a silent refresh is currently running
    pub fn refresh_in_flight(&self) -> bool {
        lock_slot(&self.slot).current.is_some()
    }

    /// Forget any refresh in flight. Its tokens are discarded when it lands.
    /// Called whenever the session is replaced or ended.
    pub fn invalidate(&self) {
        if lock_slot(&self.slot).current.take().is_some() {
            debug!("Discarding session refresh in flight");
        }
    }

    /// Apply the recovery policy for the current session state.
    ///
    /// Returns an error only when a silent refresh was attempted and failed.
    pub async fn recover(&self, issuer: Arc<dyn TokenIssuer>) -> Result<Recovery> {
        // The state is read under the slot lock so a failure can never miss a
        // refresh that is about to finish and start a second one.
        let step = {
            let mut slot = lock_slot(&self.slot);
            match self.session.state() {
                SessionState::RefreshOnly { refresh_token } => {
                    Step::Refresh(self.join_or_start(&mut slot, issuer, refresh_token))
                }
                SessionState::AccessOnly { .. } => Step::Logout,
                SessionState::Authenticated { .. } | SessionState::Unauthenticated => {
                    Step::PassThrough
                }
            }
        };

        match step {
            Step::Refresh(flight) => {
                flight.await.map_err(Error::RefreshFailed)?;
                Ok(Recovery::Renewed)
            }
            Step::Logout => {
                self.force_logout();
                Ok(Recovery::LoggedOut)
            }
            Step::PassThrough => {
                debug!("No session recovery for failed request");
                Ok(Recovery::PassThrough)
            }
        }
    }

    /// Run recovery for `error` and return the error the caller should see.
    ///
    /// Nothing is swallowed: the original error comes back unless a refresh
    /// renewed the session (wrapped in `SessionRenewed`) or the refresh call
    /// itself failed (`RefreshFailed`).
    pub async fn handle_failure(&self, issuer: Arc<dyn TokenIssuer>, error: Error) -> Error {
        match self.recover(issuer).await {
            Ok(Recovery::Renewed) => Error::SessionRenewed(Box::new(error)),
            Ok(Recovery::LoggedOut) | Ok(Recovery::PassThrough) => error,
            Err(refresh_error) => refresh_error,
        }
    }

    /// Refresh now, whatever the access token state, sharing any refresh
    /// already in flight.
    pub async fn refresh_now(&self, issuer: Arc<dyn TokenIssuer>) -> Result<()> {
        let flight = {
            let mut slot = lock_slot(&self.slot);
            match self.session.refresh_token() {
                Some(refresh_token) => self.join_or_start(&mut slot, issuer, refresh_token),
                None => return Err(Error::NotSignedIn),
            }
        };
        flight.await.map_err(Error::RefreshFailed)
    }

    fn join_or_start(
        &self,
        slot: &mut Slot,
        issuer: Arc<dyn TokenIssuer>,
        refresh_token: String,
    ) -> SharedOutcome {
        if let Some(existing) = &slot.current {
            if existing.refresh_token == refresh_token {
                debug!("Joining session refresh already in flight");
                return existing.outcome.clone();
            }
            debug!("Session changed since the refresh in flight started, starting another");
        }

        slot.next_id += 1;
        let id = slot.next_id;
        let session = self.session.clone();
        let shell = Arc::clone(&self.shell);
        let shared_slot = Arc::clone(&self.slot);
        let grant = GrantRequest::refresh(refresh_token.clone());
        let started_with = refresh_token.clone();

        let task = tokio::spawn(async move {
            info!("Refreshing session");
            let issued = issuer.issue(&grant).await;
            drop(issuer);

            let outcome = {
                let mut slot = lock_slot(&shared_slot);
                let ours = slot.current.as_ref().is_some_and(|f| f.id == id);
                if ours {
                    slot.current = None;
                }
                let current =
                    ours && session.refresh_token().as_deref() == Some(started_with.as_str());
                match issued {
                    // Tokens are written before the slot lock is released.
                    Ok(tokens) if current => session
                        .store_tokens(&tokens)
                        .map(|()| true)
                        .map_err(Arc::new),
                    Ok(_) => Ok(false),
                    Err(e) => Err(Arc::new(e)),
                }
            };

            match outcome {
                Ok(true) => {
                    shell.reload();
                    Ok(())
                }
                Ok(false) => {
                    debug!("Session replaced during refresh, discarding issued tokens");
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Session refresh failed");
                    Err(e)
                }
            }
        });

        let outcome = async move {
            task.await.unwrap_or_else(|e| {
                Err(Arc::new(Error::Other(format!("session refresh task failed: {e}"))))
            })
        }
        .boxed()
        .shared();

        slot.current = Some(InFlight {
            id,
            refresh_token,
            outcome: outcome.clone(),
        });
        outcome
    }

    fn force_logout(&self) {
        warn!("Access token without refresh token, forcing logout");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session during forced logout");
        }
        self.shell.redirect(&self.login_route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::shell::{RecordingShell, ShellEvent};
    use crate::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, ROLE_TYPE_KEY};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Issuer that answers after a short delay and counts its calls
    struct FakeIssuer {
        calls: AtomicUsize,
        grants: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeIssuer {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                grants: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl TokenIssuer for FakeIssuer {
        async fn issue(&self, grant: &GrantRequest) -> Result<TokenPair> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let used = match grant {
                GrantRequest::Refresh { refresh_token } => refresh_token.clone(),
                _ => "password".to_string(),
            };
            self.grants.lock().unwrap().push(used.clone());
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(Error::Api {
                    status: 400,
                    body: "invalid_grant".to_string(),
                });
            }
            Ok(TokenPair::new(
                format!("access-from-{used}"),
                format!("refresh-from-{used}"),
            ))
        }
    }

    fn handler(session: &SessionManager, shell: &Arc<RecordingShell>) -> RecoveryHandler {
        RecoveryHandler::new(session.clone(), shell.clone(), "/login")
    }

    fn original() -> Error {
        Error::Api {
            status: 401,
            body: "expired".to_string(),
        }
    }

    #[tokio::test]
    async fn test_refresh_only_renews_and_reloads() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);

        let outcome = handler(&session, &shell).recover(issuer.clone()).await.unwrap();

        assert_eq!(outcome, Recovery::Renewed);
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*issuer.grants.lock().unwrap(), vec!["old-refresh".to_string()]);
        assert_eq!(session.access_token().as_deref(), Some("access-from-old-refresh"));
        assert_eq!(session.refresh_token().as_deref(), Some("refresh-from-old-refresh"));
        assert_eq!(shell.events(), vec![ShellEvent::Reload]);
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_without_mutation() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(true);

        let err = handler(&session, &shell)
            .handle_failure(issuer.clone(), original())
            .await;

        assert!(matches!(err, Error::RefreshFailed(_)));
        assert_eq!(err.status(), Some(400));
        assert_eq!(session.state().name(), "refresh-only");
        assert!(shell.events().is_empty());
    }

    #[tokio::test]
    async fn test_access_only_forces_logout() {
        let session = SessionManager::in_memory();
        session.store().set(ACCESS_TOKEN_KEY, "a").unwrap();
        session.store().set(ROLE_TYPE_KEY, "ADMIN").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);

        let err = handler(&session, &shell)
            .handle_failure(issuer.clone(), original())
            .await;

        assert!(matches!(err, Error::Api { status: 401, .. }));
        assert_eq!(session.state(), SessionState::Unauthenticated);
        assert!(session.role_type().is_none());
        assert_eq!(shell.events(), vec![ShellEvent::Redirect("/login".to_string())]);
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authenticated_and_unauthenticated_pass_through() {
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);

        let empty = SessionManager::in_memory();
        let outcome = handler(&empty, &shell).recover(issuer.clone()).await.unwrap();
        assert_eq!(outcome, Recovery::PassThrough);

        let full = SessionManager::in_memory();
        full.store_tokens(&TokenPair::new("a", "r")).unwrap();
        let err = handler(&full, &shell)
            .handle_failure(issuer.clone(), original())
            .await;
        assert!(matches!(err, Error::Api { status: 401, .. }));
        assert_eq!(full.access_token().as_deref(), Some("a"));
        assert_eq!(full.refresh_token().as_deref(), Some("r"));

        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
        assert!(shell.events().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_failures_share_one_refresh() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);
        let handler = handler(&session, &shell);

        let (a, b, c) = tokio::join!(
            handler.handle_failure(issuer.clone(), original()),
            handler.handle_failure(issuer.clone(), original()),
            handler.handle_failure(issuer.clone(), original()),
        );

        for err in [a, b, c] {
            assert!(matches!(err, Error::SessionRenewed(_)));
        }
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(shell.reloads(), 1);
        assert!(!handler.refresh_in_flight());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_failure_is_shared() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(true);
        let handler = handler(&session, &shell);

        let (a, b) = tokio::join!(
            handler.recover(issuer.clone()),
            handler.recover(issuer.clone()),
        );

        assert!(matches!(a, Err(Error::RefreshFailed(_))));
        assert!(matches!(b, Err(Error::RefreshFailed(_))));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);

        // A later failure may try again.
        let _ = handler.recover(issuer.clone()).await;
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_now_requires_refresh_token() {
        let session = SessionManager::in_memory();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);

        let result = handler(&session, &shell).refresh_now(issuer.clone()).await;
        assert!(matches!(result, Err(Error::NotSignedIn)));

        session.store_tokens(&TokenPair::new("a", "r")).unwrap();
        handler(&session, &shell).refresh_now(issuer.clone()).await.unwrap();
        assert_eq!(session.access_token().as_deref(), Some("access-from-r"));
        assert_eq!(shell.reloads(), 1);
    }

    /// Start a refresh and give up on it before the issuer answers
    async fn abandon_refresh(handler: &RecoveryHandler, issuer: Arc<FakeIssuer>) {
        let attempt =
            tokio::time::timeout(Duration::from_millis(5), handler.recover(issuer)).await;
        assert!(attempt.is_err(), "refresh should still be running");
    }

    #[tokio::test]
    async fn test_abandoned_refresh_still_completes() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);
        let handler = handler(&session, &shell);

        abandon_refresh(&handler, issuer.clone()).await;
        assert!(handler.refresh_in_flight());

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handler.refresh_in_flight());
        assert_eq!(session.access_token().as_deref(), Some("access-from-old-refresh"));
        assert_eq!(shell.reloads(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_during_abandoned_refresh_is_kept() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);
        let handler = handler(&session, &shell);

        abandon_refresh(&handler, issuer.clone()).await;
        session
            .store_tokens(&TokenPair::new("a-login", "r-login"))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handler.refresh_in_flight());
        assert_eq!(*issuer.grants.lock().unwrap(), vec!["old-refresh".to_string()]);
        assert_eq!(session.access_token().as_deref(), Some("a-login"));
        assert_eq!(session.refresh_token().as_deref(), Some("r-login"));
        assert_eq!(shell.reloads(), 0);
    }

    #[tokio::test]
    async fn test_refresh_after_sign_in_does_not_join_stale_refresh() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);
        let handler = handler(&session, &shell);

        abandon_refresh(&handler, issuer.clone()).await;
        session
            .store_tokens(&TokenPair::new("a-login", "r-login"))
            .unwrap();

        handler.refresh_now(issuer.clone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            *issuer.grants.lock().unwrap(),
            vec!["old-refresh".to_string(), "r-login".to_string()]
        );
        assert_eq!(session.access_token().as_deref(), Some("access-from-r-login"));
        assert_eq!(shell.reloads(), 1);
        assert!(!handler.refresh_in_flight());
    }

    #[tokio::test]
    async fn test_invalidate_discards_refresh_in_flight() {
        let session = SessionManager::in_memory();
        session.store().set(REFRESH_TOKEN_KEY, "old-refresh").unwrap();
        let shell = Arc::new(RecordingShell::new());
        let issuer = FakeIssuer::new(false);
        let handler = handler(&session, &shell);

        abandon_refresh(&handler, issuer.clone()).await;
        handler.invalidate();
        assert!(!handler.refresh_in_flight());

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
        assert!(session.access_token().is_none());
        assert_eq!(session.refresh_token().as_deref(), Some("old-refresh"));
        assert!(shell.events().is_empty());
    }
}
