//! Application shell: the effects session recovery has on the surrounding app

use std::sync::Mutex;

/// Hooks for the application hosting the client.
///
/// After a silent refresh the shell is reloaded so that no stale request
/// state survives. After a forced logout it is sent to the login route.
pub trait AppShell: Send + Sync {
    /// Discard in-memory application state and start over
    fn reload(&self);

    /// Navigate to `route`
    fn redirect(&self, route: &str);
}

/// Something the shell was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Reload,
    Redirect(String),
}

/// Shell that records every effect in order
#[derive(Debug, Default)]
pub struct RecordingShell {
    events: Mutex<Vec<ShellEvent>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ShellEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn reloads(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ShellEvent::Reload))
            .count()
    }

    fn push(&self, event: ShellEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl AppShell for RecordingShell {
    fn reload(&self) {
        self.push(ShellEvent::Reload);
    }

    fn redirect(&self, route: &str) {
        self.push(ShellEvent::Redirect(route.to_string()));
    }
}
