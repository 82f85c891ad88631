//! Application shell for the command line

use crate::auth::AppShell;
use crate::cli::output;

/// Each command is a fresh process, so a reload has nothing to discard; a
/// redirect tells the user to sign in again.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleShell;

impl AppShell for ConsoleShell {
    fn reload(&self) {
        tracing::info!("Session renewed");
    }

    fn redirect(&self, route: &str) {
        tracing::warn!(route, "Session is no longer valid, signed out");
        output::warn(LOGIN_HINT);
    }
}

const LOGIN_HINT: &str = "Session expired. Run 'backoffice login' to sign in again.";
