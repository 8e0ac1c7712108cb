//! Error types for the relay.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors that can occur while relaying.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The upstream request could not be completed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Binding or serving the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Upstream(e.to_string())
    }
}

impl From<tollgate_config::ConfigError> for RelayError {
    fn from(e: tollgate_config::ConfigError) -> Self {
        RelayError::Config(e.to_string())
    }
}
