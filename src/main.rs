use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rentgate::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Login { email, password } => cli::commands::login(&email, password).await,
        Commands::Register {
            email,
            first_name,
            last_name,
            user_type,
            referral_code,
        } => {
            cli::commands::register(&email, &first_name, &last_name, user_type, referral_code)
                .await
        }
        Commands::Logout => cli::commands::logout().await,
        Commands::Whoami { format } => cli::commands::whoami(format).await,
        Commands::Refresh => cli::commands::refresh().await,
        Commands::Route {
            path,
            token,
            user_type,
            preferred,
        } => cli::commands::route(&path, token, user_type, preferred).await,
        Commands::Routes => cli::commands::routes().await,
        Commands::Serve { host, port } => cli::commands::serve(host, port).await,
    }
}
