//! Password command - password reset flow.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::style;

use super::Context;

/// Arguments for the password command.
#[derive(Args, Debug)]
pub struct PasswordArgs {
    #[command(subcommand)]
    pub command: PasswordCommand,
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
    /// Ask for a reset email
    Request {
        /// Account email
        email: String,
    },

    /// Set a new password using the emailed reset token
    Confirm {
        /// Reset token from the email
        token: String,

        /// New password (prompted when omitted)
        #[arg(long)]
        new_password: Option<String>,
    },
}

/// Run the password command.
pub async fn run(args: PasswordArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    let response = match args.command {
        PasswordCommand::Request { email } => client
            .auth()
            .request_password_reset(&email)
            .await
            .context("Password reset request failed")?,
        PasswordCommand::Confirm {
            token,
            new_password,
        } => {
            let new_password = match new_password {
                Some(p) => p,
                None => rpassword::prompt_password("New password: ")
                    .context("Failed to read password")?,
            };
            client
                .auth()
                .confirm_password_reset(&token, &new_password)
                .await
                .context("Password reset failed")?
        }
    };

    if ctx.json_output {
        println!("{}", serde_json::json!({ "message": response.message }));
    } else {
        println!("{} {}", style("✓").green(), response.message);
    }
    Ok(())
}
