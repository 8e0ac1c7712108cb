//! Relay command - run the same-origin relay server.

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};

use tollgate_relay::{RelayServer, RelayServerConfig};

use super::Context;

/// Arguments for the relay command.
#[derive(Args, Debug)]
pub struct RelayArgs {
    /// Address to listen on (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Backend URL to forward to (overrides config)
    #[arg(short, long)]
    pub upstream: Option<String>,

    /// Route prefix (overrides config)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Disable CORS headers
    #[arg(long)]
    pub no_cors: bool,
}

/// Run the relay command.
pub async fn run(args: RelayArgs, ctx: &Context) -> Result<()> {
    let mut relay = ctx.config.relay();
    if let Some(bind) = args.bind {
        relay.bind = bind;
    }
    if let Some(upstream) = args.upstream {
        relay.upstream = upstream;
    }
    if let Some(prefix) = args.prefix {
        relay.prefix = prefix;
    }
    if args.no_cors {
        relay.enable_cors = false;
    }

    let config = RelayServerConfig::from_config(&relay).context("Invalid relay configuration")?;

    if !ctx.json_output {
        let dim = Style::new().dim();
        println!();
        println!("{}", style("Tollgate Relay").bold());
        println!("{}", dim.apply_to("─".repeat(40)));
        println!("  {} http://{}", dim.apply_to("Listen:  "), config.bind_addr);
        println!(
            "  {} {}/{{path}}",
            dim.apply_to("Routes:  "),
            relay.prefix.trim_end_matches('/')
        );
        println!("  {} {}", dim.apply_to("Upstream:"), relay.upstream);
        println!();
    }

    RelayServer::new(config)
        .run()
        .await
        .context("Relay server failed")
}
