//! Tollgate - session-aware API client and same-origin relay
//!
//! Main entry point for the Tollgate CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{api, auth, config, password, relay};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Tollgate - session-aware API client and same-origin relay
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend API base URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Credential file (overrides config)
    #[arg(long, global = true)]
    pub session_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, register, refresh and sign out
    Auth(auth::AuthArgs),

    /// Password reset
    Password(password::PasswordArgs),

    /// Send an arbitrary request to the backend (API console)
    Api(api::ApiArgs),

    /// Run the same-origin relay server
    Relay(relay::RelayArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "tollgate=debug,tollgate_client=debug,tollgate_config=debug,tollgate_relay=debug,info"
    } else {
        "tollgate=info,tollgate_client=warn,tollgate_relay=info,warn"
    };

    let log_dir = tollgate_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "tollgate.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "tollgate=trace,tollgate_client=trace,tollgate_config=trace,tollgate_relay=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context::load(cli.api_url, cli.session_file, cli.json, cli.verbose)?;

    match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Password(args) => password::run(args, &ctx).await,
        Commands::Api(args) => api::run(args, &ctx).await,
        Commands::Relay(args) => relay::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
