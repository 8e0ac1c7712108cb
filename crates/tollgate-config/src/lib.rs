//! Configuration system for Tollgate.
//!
//! Provides TOML-based configuration with:
//! - `[api]`: backend base URL, timeout, refresh policy
//! - `[session]`: credential file location and login entry point
//! - `[relay]`: relay bind address, upstream and injected headers
//! - Config file layering (XDG user config + project-local overrides)
//! - Environment overrides for the backend URLs

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    API_BASE_URL_ENV, ConfigSource, LoadedConfig, RELAY_UPSTREAM_ENV, load_config,
    load_config_file, load_config_with_options, save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
