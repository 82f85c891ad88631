//! CLI command implementations

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{Dashboard, ListParams, ResourceKind};
use crate::cli::{
    error, info, print_session, print_value, success, warn, ConsoleShell, OutputFormat,
};
use crate::client::AuthenticatedClient;
use crate::config::{self, Config};
use crate::error::Error;
use crate::session::{FileStore, SessionManager};

/// Initialize a new backoffice.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("backoffice.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created backoffice.toml");
    info("Set BACKOFFICE_CLIENT_ID and BACKOFFICE_CLIENT_SECRET, then run 'backoffice login --email <email>'");

    Ok(())
}

/// Sign in with email and password
pub async fn login(config_path: Option<&Path>, email: &str, password: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = build_client(&config)?;

    let password = match password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    let pb = spinner("Signing in...");
    match client.sign_in(email, &password).await {
        Ok(tokens) => {
            pb.finish_and_clear();
            match tokens.role_type {
                Some(role) => success(&format!("Signed in as {} ({})", email, role)),
                None => success(&format!("Signed in as {}", email)),
            }
            Ok(())
        }
        Err(e) => {
            pb.finish_and_clear();
            error(&format!("Sign in failed: {}", describe(&e)));
            Err(e.into())
        }
    }
}

/// Clear the stored session
pub async fn logout(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    build_client(&config)?.sign_out()?;
    success("Signed out");
    Ok(())
}

/// Show the stored session
pub async fn status(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = Arc::new(FileStore::open(&config.session.path)?);
    let updated = store
        .updated_at()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    let session = SessionManager::with_store(store);

    print_session(&session.state(), session.role_type().as_deref(), updated);
    Ok(())
}

/// Renew the session with the stored refresh token
pub async fn refresh(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = build_client(&config)?;

    let pb = spinner("Refreshing session...");
    let result = client.refresh().await;
    pb.finish_and_clear();

    match result {
        Ok(()) => {
            success("Session refreshed");
            Ok(())
        }
        Err(e) => {
            error(&format!("Refresh failed: {}", describe(&e)));
            Err(e.into())
        }
    }
}

/// List records of a resource
pub async fn list(
    config_path: Option<&Path>,
    kind: ResourceKind,
    params: ListParams,
    format: OutputFormat,
) -> Result<()> {
    let dashboard = dashboard(config_path)?;
    let value = report(dashboard.list(kind, &params).await)?;
    print_value(&value, format)
}

/// Show a single record
pub async fn get(
    config_path: Option<&Path>,
    kind: ResourceKind,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    let dashboard = dashboard(config_path)?;
    let value = report(dashboard.get(kind, id).await)?;
    print_value(&value, format)
}

/// Create a record
pub async fn create(config_path: Option<&Path>, kind: ResourceKind, data: &str) -> Result<()> {
    let body = read_body(data)?;
    let dashboard = dashboard(config_path)?;
    let value = report(dashboard.create(kind, &body).await)?;
    success(&format!("Created {} record", kind));
    print_value(&value, OutputFormat::Json)
}

/// Update a record
pub async fn update(
    config_path: Option<&Path>,
    kind: ResourceKind,
    id: &str,
    data: &str,
) -> Result<()> {
    let body = read_body(data)?;
    let dashboard = dashboard(config_path)?;
    let value = report(dashboard.update(kind, id, &body).await)?;
    success(&format!("Updated {} {}", kind, id));
    print_value(&value, OutputFormat::Json)
}

/// Parse a JSON body given inline or as `@path`
pub fn read_body(data: &str) -> Result<Value> {
    let raw = match data.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?,
        None => data.to_string(),
    };
    serde_json::from_str(&raw).context("Body is not valid JSON")
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    };
    config.map_err(|e| anyhow::anyhow!("{}", e))
}

fn build_client(config: &Config) -> Result<AuthenticatedClient> {
    let session = SessionManager::open(config)?;
    let client = AuthenticatedClient::new(config, session, Arc::new(ConsoleShell))?;
    Ok(client)
}

fn dashboard(config_path: Option<&Path>) -> Result<Dashboard> {
    let config = load_config(config_path)?;
    Ok(Dashboard::new(build_client(&config)?))
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    pb
}

/// Print a failed call the way the dashboard would show it, then pass it on
fn report<T>(result: crate::error::Result<T>) -> Result<T> {
    result.map_err(|e| {
        match &e {
            Error::SessionRenewed(_) => warn("Session renewed. Run the command again."),
            _ => error(&describe(&e)),
        }
        e.into()
    })
}

fn describe(e: &Error) -> String {
    match (e.status(), e.message()) {
        (Some(status), Some(message)) => format!("{} ({})", message, status),
        _ => e.to_string(),
    }
}
