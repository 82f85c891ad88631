//! CLI argument parsing tests
//!
//! Run with: cargo test --test cli_tests

use backoffice::api::ResourceKind;
use backoffice::cli::{Cli, Commands, OutputFormat};
use clap::Parser;

#[test]
fn test_cli_login_with_password() {
    let cli = Cli::try_parse_from([
        "backoffice",
        "login",
        "--email",
        "ann@example.com",
        "--password",
        "hunter2",
    ])
    .unwrap();

    match cli.command {
        Commands::Login { email, password } => {
            assert_eq!(email, "ann@example.com");
            assert_eq!(password.as_deref(), Some("hunter2"));
        }
        _ => panic!("expected login"),
    }
}

#[test]
fn test_cli_list_defaults_to_table() {
    let cli = Cli::try_parse_from(["backoffice", "list", "companies", "--page", "2"]).unwrap();

    match cli.command {
        Commands::List {
            kind,
            page,
            size,
            search,
            format,
        } => {
            assert_eq!(kind, ResourceKind::Companies);
            assert_eq!(page, Some(2));
            assert_eq!(size, None);
            assert_eq!(search, None);
            assert_eq!(format, OutputFormat::Table);
        }
        _ => panic!("expected list"),
    }
}

#[test]
fn test_cli_list_format_yaml() {
    let cli =
        Cli::try_parse_from(["backoffice", "list", "tools", "--format", "yaml"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::List {
            format: OutputFormat::Yaml,
            ..
        }
    ));
}

#[test]
fn test_cli_singular_resource_names() {
    let cli = Cli::try_parse_from(["backoffice", "get", "product", "12"]).unwrap();
    match cli.command {
        Commands::Get { kind, id, format } => {
            assert_eq!(kind, ResourceKind::Products);
            assert_eq!(id, "12");
            assert_eq!(format, OutputFormat::Json);
        }
        _ => panic!("expected get"),
    }
}

#[test]
fn test_cli_rejects_unknown_resource() {
    let result = Cli::try_parse_from(["backoffice", "list", "invoices"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_update_requires_data() {
    assert!(Cli::try_parse_from(["backoffice", "update", "companies", "1"]).is_err());

    let cli = Cli::try_parse_from([
        "backoffice",
        "update",
        "companies",
        "1",
        "--data",
        r#"{"name":"Acme"}"#,
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::Update { .. }));
}

#[test]
fn test_cli_global_config_flag() {
    let cli = Cli::try_parse_from(["backoffice", "status", "--config", "/etc/backoffice.toml"])
        .unwrap();
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/etc/backoffice.toml"))
    );
    assert!(matches!(cli.command, Commands::Status));
}
