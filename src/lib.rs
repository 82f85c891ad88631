//! Backoffice - authenticated client for the dashboard API
//!
//! This is the library interface for Backoffice: a session-aware HTTP
//! client that attaches credentials to every request and recovers the
//! session when a request fails, plus typed access to the dashboard's
//! resources.

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use client::{AuthenticatedClient, RequestDescriptor};
pub use config::Config;
pub use error::Error;
pub use session::{SessionManager, SessionState};
