//! Config command - configuration management.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::style;

use tollgate_config::{ApiConfig, RelayConfig, SessionConfig, TollgateConfig};

use super::Context;

/// Project-local config file name.
const PROJECT_CONFIG_FILE: &str = "tollgate.toml";

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Write a config file with every setting at its default
    Init {
        /// Create project-local config (./tollgate.toml) instead of user config
        #[arg(long)]
        local: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Init { local } => cmd_init(local),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let effective = TollgateConfig {
        api: Some(ctx.config.api()),
        session: Some(ctx.config.session()),
        relay: Some(ctx.config.relay()),
    };
    print!("{}", effective.to_toml()?);
    Ok(())
}

fn cmd_init(local: bool) -> Result<()> {
    let path = if local {
        std::path::PathBuf::from(PROJECT_CONFIG_FILE)
    } else {
        tollgate_config::xdg_config_path().context("Could not determine config directory")?
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    let defaults = TollgateConfig {
        api: Some(ApiConfig::default()),
        session: Some(SessionConfig::default()),
        relay: Some(RelayConfig::default()),
    };
    tollgate_config::save_config(&defaults, &path)?;

    println!("{} Created config file: {}", style("✓").green(), path.display());
    Ok(())
}
