//! Persisted session: the access and refresh tokens shared by every request

pub mod manager;
pub mod state;
pub mod store;

pub use manager::{SessionManager, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, ROLE_TYPE_KEY};
pub use state::{SessionState, TokenPair};
pub use store::{FileStore, MemoryStore, SessionStore};
