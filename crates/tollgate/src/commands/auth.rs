//! Auth command - sign-in and session management.

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use serde::Serialize;

use tollgate_client::AuthResponse;

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Create an account and sign in
    Register {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in with email and password
    Login {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in with an identity token from an OAuth provider
    Oauth {
        /// Provider name (e.g. google)
        provider: String,

        /// ID token issued by the provider
        id_token: String,
    },

    /// Exchange the stored refresh token for a new access token
    Refresh,

    /// Show the stored session
    Status,

    /// Forget the stored session
    Logout,
}

/// Session summary for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    authenticated: bool,
    user_id: Option<String>,
    device_id: Option<String>,
    access_token: Option<String>,
    has_refresh_token: bool,
    api_url: String,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Register { email, password } => {
            let password = read_password(password)?;
            let client = ctx.client()?;
            let auth = client
                .auth()
                .register(&email, &password)
                .await
                .context("Registration failed")?;
            print_signed_in(ctx, "Registered", &auth)
        }
        AuthCommand::Login { email, password } => {
            let password = read_password(password)?;
            let client = ctx.client()?;
            let auth = client
                .auth()
                .login(&email, &password)
                .await
                .context("Login failed")?;
            print_signed_in(ctx, "Signed in", &auth)
        }
        AuthCommand::Oauth { provider, id_token } => {
            let client = ctx.client()?;
            let auth = client
                .auth()
                .oauth(&provider, &id_token)
                .await
                .context("OAuth sign-in failed")?;
            print_signed_in(ctx, "Signed in", &auth)
        }
        AuthCommand::Refresh => cmd_refresh(ctx).await,
        AuthCommand::Status => cmd_status(ctx),
        AuthCommand::Logout => cmd_logout(ctx),
    }
}

async fn cmd_refresh(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let Some(refresh_token) = client.session().store().refresh_token() else {
        bail!("No refresh token stored. Run 'tollgate auth login' first.");
    };

    client
        .auth()
        .refresh(&refresh_token)
        .await
        .context("Token refresh failed")?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "refreshed": true }));
    } else {
        println!("{} Access token refreshed.", style("✓").green());
    }
    Ok(())
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let store = session.store();
    let output = StatusOutput {
        authenticated: session.is_authenticated(),
        user_id: store.user_id(),
        device_id: store.device_id(),
        access_token: store.access_token().map(|t| mask(&t)),
        has_refresh_token: store.refresh_token().is_some(),
        api_url: ctx.config.api().base_url,
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Session Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    if output.authenticated {
        println!(
            "  {} {}",
            dim.apply_to("Status:   "),
            style("● signed in").green()
        );
    } else {
        println!(
            "  {} {}",
            dim.apply_to("Status:   "),
            style("○ signed out").red()
        );
    }
    println!(
        "  {} {}",
        dim.apply_to("User:     "),
        output.user_id.as_deref().unwrap_or("-")
    );
    println!(
        "  {} {}",
        dim.apply_to("Device:   "),
        output.device_id.as_deref().unwrap_or("-")
    );
    println!(
        "  {} {}",
        dim.apply_to("Token:    "),
        output.access_token.as_deref().unwrap_or("-")
    );
    println!(
        "  {} {}",
        dim.apply_to("Refresh:  "),
        if output.has_refresh_token { "stored" } else { "-" }
    );
    println!("  {} {}", dim.apply_to("API:      "), output.api_url);
    println!();
    Ok(())
}

fn cmd_logout(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let was_signed_in = session.is_authenticated();
    session.logout().context("Failed to clear session")?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "logged_out": was_signed_in }));
    } else if was_signed_in {
        println!("Signed out.");
    } else {
        println!("No session stored.");
    }
    Ok(())
}

fn print_signed_in(ctx: &Context, verb: &str, auth: &AuthResponse) -> Result<()> {
    if ctx.json_output {
        println!(
            "{}",
            serde_json::json!({
                "user_id": auth.user_id,
                "device_id": auth.device_id,
            })
        );
    } else {
        println!(
            "{} {} as {}",
            style("✓").green(),
            verb,
            style(&auth.user_id).cyan()
        );
        if ctx.verbose {
            println!("  Device: {}", auth.device_id);
        }
    }
    Ok(())
}

fn read_password(given: Option<String>) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: ").context("Failed to read password"),
    }
}

/// Show only the ends of a token.
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}
