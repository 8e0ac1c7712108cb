//! Configuration types.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000/api/v1"
//! timeout_secs = 30
//! single_flight_refresh = false
//!
//! [session]
//! store_path = "/home/me/.config/tollgate/session.json"
//! login_path = "/login"
//!
//! [relay]
//! bind = "127.0.0.1:3000"
//! upstream = "http://localhost:8000/api/v1"
//! prefix = "/api/proxy"
//! bypass_header = "ngrok-skip-browser-warning"
//! bypass_value = "true"
//! enable_cors = true
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default backend API base URL (version prefix included).
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default relay bind address.
pub const DEFAULT_RELAY_BIND: &str = "127.0.0.1:3000";

/// Default relay route prefix.
pub const DEFAULT_RELAY_PREFIX: &str = "/api/proxy";

/// Header that tells tunneling providers to skip their browser interstitial.
pub const DEFAULT_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

// ─────────────────────────────────────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration.
///
/// Every section is optional in a file so that layers only override what
/// they mention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Backend API client settings.
    pub api: Option<ApiConfig>,
    /// Credential persistence settings.
    pub session: Option<SessionConfig>,
    /// Relay server settings.
    pub relay: Option<RelayConfig>,
}

impl TollgateConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: TollgateConfig) {
        if other.api.is_some() {
            self.api = other.api;
        }

        if other.session.is_some() {
            self.session = other.session;
        }

        if other.relay.is_some() {
            self.relay = other.relay;
        }
    }

    /// API settings, defaulted when absent.
    pub fn api(&self) -> ApiConfig {
        self.api.clone().unwrap_or_default()
    }

    /// Session settings, defaulted when absent.
    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Relay settings, defaulted when absent.
    pub fn relay(&self) -> RelayConfig {
        self.relay.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API
// ─────────────────────────────────────────────────────────────────────────────

/// Backend API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, including the version prefix.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Serialize concurrent token refreshes.
    pub single_flight_refresh: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            single_flight_refresh: false,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Credential persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file. Defaults to `session.json` in the config directory.
    pub store_path: Option<PathBuf>,
    /// Where the user is sent to sign in again after a session is invalidated.
    pub login_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            login_path: "/login".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relay
// ─────────────────────────────────────────────────────────────────────────────

/// Relay server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind to.
    pub bind: String,
    /// Backend base URL requests are forwarded to.
    pub upstream: String,
    /// Route prefix the relay answers under.
    pub prefix: String,
    /// Name of the header injected on every forwarded request.
    pub bypass_header: String,
    /// Value of the injected header.
    pub bypass_value: String,
    /// Add permissive CORS headers.
    pub enable_cors: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_RELAY_BIND.to_string(),
            upstream: DEFAULT_API_BASE_URL.to_string(),
            prefix: DEFAULT_RELAY_PREFIX.to_string(),
            bypass_header: DEFAULT_BYPASS_HEADER.to_string(),
            bypass_value: "true".to_string(),
            enable_cors: true,
        }
    }
}

impl RelayConfig {
    /// Parse the bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e| ConfigError::InvalidValue {
            field: "relay.bind".to_string(),
            reason: format!("{}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TollgateConfig::from_toml("").unwrap();
        assert!(config.api.is_none());
        assert_eq!(config.api().base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api().timeout(), Duration::from_secs(30));
        assert_eq!(config.session().login_path, "/login");
        assert_eq!(config.relay().prefix, "/api/proxy");
        assert_eq!(config.relay().bypass_header, "ngrok-skip-browser-warning");
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = TollgateConfig::from_toml(
            r#"
[api]
base_url = "https://backend.example/api/v1"

[relay]
bind = "0.0.0.0:8080"
"#,
        )
        .unwrap();

        let api = config.api();
        assert_eq!(api.base_url, "https://backend.example/api/v1");
        assert_eq!(api.timeout_secs, 30);
        assert!(!api.single_flight_refresh);

        let relay = config.relay();
        assert_eq!(relay.bind_addr().unwrap().port(), 8080);
        assert!(relay.enable_cors);
    }

    #[test]
    fn test_merge_overrides_whole_sections() {
        let mut base = TollgateConfig::from_toml(
            r#"
[api]
base_url = "http://a"
timeout_secs = 5

[session]
login_path = "/signin"
"#,
        )
        .unwrap();
        let overlay = TollgateConfig::from_toml(
            r#"
[api]
base_url = "http://b"
"#,
        )
        .unwrap();

        base.merge(overlay);
        assert_eq!(base.api().base_url, "http://b");
        assert_eq!(base.api().timeout_secs, 30);
        assert_eq!(base.session().login_path, "/signin");
    }

    #[test]
    fn test_bad_bind_addr() {
        let relay = RelayConfig {
            bind: "not-an-addr".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            relay.bind_addr(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_toml_roundtrip_keeps_sections() {
        let mut config = TollgateConfig::new();
        config.relay = Some(RelayConfig::default());
        let text = config.to_toml().unwrap();
        assert!(text.contains("[relay]"));
        let parsed = TollgateConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.relay().bind, DEFAULT_RELAY_BIND);
    }
}
