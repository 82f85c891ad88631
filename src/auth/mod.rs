//! Authentication: request credentials and session recovery

pub mod authenticator;
pub mod models;
pub mod recovery;
pub mod shell;

pub use authenticator::RequestAuthenticator;
pub use models::{ClientCredentials, GrantRequest};
pub use recovery::{Recovery, RecoveryHandler, TokenIssuer};
pub use shell::{AppShell, RecordingShell, ShellEvent};
