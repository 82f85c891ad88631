use anyhow::Result;
use backoffice::api::ListParams;
use backoffice::cli::{self, Cli, Commands};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backoffice=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Login { email, password } => cli::commands::login(config, &email, password).await,
        Commands::Logout => cli::commands::logout(config).await,
        Commands::Status => cli::commands::status(config).await,
        Commands::Refresh => cli::commands::refresh(config).await,
        Commands::List {
            kind,
            page,
            size,
            search,
            format,
        } => {
            let params = ListParams { page, size, search };
            cli::commands::list(config, kind, params, format).await
        }
        Commands::Get { kind, id, format } => cli::commands::get(config, kind, &id, format).await,
        Commands::Create { kind, data } => cli::commands::create(config, kind, &data).await,
        Commands::Update { kind, id, data } => {
            cli::commands::update(config, kind, &id, &data).await
        }
    }
}
