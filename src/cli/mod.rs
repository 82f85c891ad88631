//! CLI interface for Backoffice

pub mod commands;
mod output;
mod shell;

pub use output::*;
pub use shell::ConsoleShell;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api::ResourceKind;

#[derive(Parser)]
#[command(name = "backoffice")]
#[command(author = "Krakaw")]
#[command(version = "2.0.0")]
#[command(about = "Manage companies, products, tools and resources from the command line", long_about = None)]
pub struct Cli {
    /// Path to backoffice.toml (defaults to searching upward from the current directory)
    #[arg(short, long, global = true, env = "BACKOFFICE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new backoffice.toml configuration file
    Init,

    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "BACKOFFICE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the state of the stored session
    Status,

    /// Renew the session with the stored refresh token
    Refresh,

    /// List records of a resource
    List {
        /// companies, products, tools or resources
        kind: ResourceKind,

        /// Page number
        #[arg(long)]
        page: Option<u32>,

        /// Page size
        #[arg(long)]
        size: Option<u32>,

        /// Free text search
        #[arg(short, long)]
        search: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show a single record
    Get {
        /// companies, products, tools or resources
        kind: ResourceKind,

        /// Record id
        id: String,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Create a record
    Create {
        /// companies, products, tools or resources
        kind: ResourceKind,

        /// JSON body, or @path to read it from a file
        #[arg(short, long)]
        data: String,
    },

    /// Update a record
    Update {
        /// companies, products, tools or resources
        kind: ResourceKind,

        /// Record id
        id: String,

        /// JSON body, or @path to read it from a file
        #[arg(short, long)]
        data: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
