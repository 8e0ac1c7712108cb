//! CLI command handlers.

pub mod api;
pub mod auth;
pub mod config;
pub mod password;
pub mod relay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use console::style;
use tokio::sync::broadcast;

use tollgate_client::{FileCredentialStore, Session, SessionEvent, TollgateClient};
use tollgate_config::TollgateConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration with CLI overrides applied.
    pub config: TollgateConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Load layered config and apply the global CLI overrides.
    pub fn load(
        api_url: Option<String>,
        session_file: Option<PathBuf>,
        json_output: bool,
        verbose: bool,
    ) -> Result<Self> {
        let loaded = tollgate_config::load_config(None).context("Failed to load configuration")?;
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        tracing::debug!(sources = ?loaded.loaded_from(), "Configuration loaded");

        let mut config = loaded.config;
        if let Some(url) = api_url {
            let mut api = config.api();
            api.base_url = url;
            config.api = Some(api);
        }
        if let Some(path) = session_file {
            let mut session = config.session();
            session.store_path = Some(path);
            config.session = Some(session);
        }

        Ok(Self {
            config,
            json_output,
            verbose,
        })
    }

    /// Open the file-backed session.
    pub fn session(&self) -> Result<Session> {
        let session_config = self.config.session();
        let store = match &session_config.store_path {
            Some(path) => FileCredentialStore::open(path),
            None => {
                let dir = tollgate_config::xdg_config_dir()
                    .context("Could not determine config directory")?;
                FileCredentialStore::in_dir(&dir)
            }
        }
        .context("Failed to open credential store")?;

        Ok(Session::with_login_path(
            Arc::new(store),
            session_config.login_path,
        ))
    }

    /// Build an API client bound to the file-backed session.
    pub fn client(&self) -> Result<TollgateClient> {
        let api = self.config.api();
        TollgateClient::builder()
            .base_url(api.base_url.as_str())
            .timeout(api.timeout())
            .single_flight_refresh(api.single_flight_refresh)
            .session(self.session()?)
            .build()
            .context("Failed to build API client")
    }
}

/// Tell the user about session changes that happened during a command.
pub fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Invalidated { reason, login_path } = event {
            eprintln!(
                "{} {}",
                style("Session expired:").yellow().bold(),
                reason
            );
            eprintln!(
                "Sign in again ({}) with 'tollgate auth login'.",
                style(login_path).cyan()
            );
        }
    }
}
