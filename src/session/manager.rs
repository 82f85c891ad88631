//! Session manager: the single owner of persisted session reads and writes

use crate::config::Config;
use crate::error::Result;
use crate::session::state::{SessionState, TokenPair};
use crate::session::store::{FileStore, MemoryStore, SessionStore};
use std::sync::Arc;
use tracing::{debug, info};

pub const ACCESS_TOKEN_KEY: &str = "access-token";
pub const REFRESH_TOKEN_KEY: &str = "refresh-token";
pub const ROLE_TYPE_KEY: &str = "roleType";

/// Session manager over a shared [`SessionStore`]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// Open the persisted session named by the configuration
    pub fn open(config: &Config) -> Result<Self> {
        let store = FileStore::open(&config.session.path)?;
        debug!(path = %config.session.path.display(), "Opened session store");
        Ok(Self::with_store(Arc::new(store)))
    }

    /// Session over an arbitrary store
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Session that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn role_type(&self) -> Option<String> {
        self.store.get(ROLE_TYPE_KEY).filter(|r| !r.is_empty())
    }

    /// Current state, read from the store
    pub fn state(&self) -> SessionState {
        SessionState::from_tokens(
            self.store.get(ACCESS_TOKEN_KEY),
            self.store.get(REFRESH_TOKEN_KEY),
        )
    }

    /// Overwrite both tokens, and the cached role when one was issued
    pub fn store_tokens(&self, tokens: &TokenPair) -> Result<()> {
        let mut values = vec![
            (ACCESS_TOKEN_KEY, tokens.access_token.as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
        ];
        if let Some(role) = &tokens.role_type {
            values.push((ROLE_TYPE_KEY, role.as_str()));
        }
        self.store.set_all(&values)?;
        debug!("Stored session tokens");
        Ok(())
    }

    /// Remove every session value. Used by logout and forced logout.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(ROLE_TYPE_KEY)?;
        info!("Session cleared");
        Ok(())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .finish()
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_tokens_and_state() {
        let session = SessionManager::in_memory();
        assert_eq!(session.state(), SessionState::Unauthenticated);

        session
            .store_tokens(&TokenPair::new("a1", "r1").with_role("ADMIN"))
            .unwrap();

        assert_eq!(session.access_token().as_deref(), Some("a1"));
        assert_eq!(session.refresh_token().as_deref(), Some("r1"));
        assert_eq!(session.role_type().as_deref(), Some("ADMIN"));
        assert_eq!(session.state().name(), "authenticated");
    }

    #[test]
    fn test_store_tokens_keeps_role_when_none_issued() {
        let session = SessionManager::in_memory();
        session
            .store_tokens(&TokenPair::new("a1", "r1").with_role("EDITOR"))
            .unwrap();
        session.store_tokens(&TokenPair::new("a2", "r2")).unwrap();

        assert_eq!(session.access_token().as_deref(), Some("a2"));
        assert_eq!(session.role_type().as_deref(), Some("EDITOR"));
    }

    #[test]
    fn test_clear_removes_every_key() {
        let session = SessionManager::in_memory();
        session
            .store_tokens(&TokenPair::new("a1", "r1").with_role("ADMIN"))
            .unwrap();

        session.clear().unwrap();

        assert!(session.store().get(ACCESS_TOKEN_KEY).is_none());
        assert!(session.store().get(REFRESH_TOKEN_KEY).is_none());
        assert!(session.store().get(ROLE_TYPE_KEY).is_none());
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_failed_store_keeps_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = SessionManager::with_store(Arc::new(FileStore::open(&path).unwrap()));
        session.store_tokens(&TokenPair::new("a1", "r1")).unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(session.store_tokens(&TokenPair::new("a2", "r2")).is_err());
        assert_eq!(session.access_token().as_deref(), Some("a1"));
        assert_eq!(session.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn test_clones_share_the_store() {
        let session = SessionManager::in_memory();
        let other = session.clone();
        session.store_tokens(&TokenPair::new("a", "r")).unwrap();
        assert_eq!(other.access_token().as_deref(), Some("a"));
    }
}
