//! Passthrough client for forwarding relay requests to the backend.
//!
//! Copies path, method, query, JSON body and the caller's `Authorization`
//! header; adds the tunnel bypass header.

use reqwest::{Client, Method, StatusCode, header};

use crate::error::Result;

/// Configuration for the passthrough client.
#[derive(Debug, Clone)]
pub struct PassthroughConfig {
    /// Backend base URL; request paths are appended to it.
    pub upstream: String,
    /// Extra header sent upstream on every request.
    pub bypass_header: Option<(String, String)>,
}

impl PassthroughConfig {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
            bypass_header: Some((
                tollgate_config::DEFAULT_BYPASS_HEADER.to_string(),
                "true".to_string(),
            )),
        }
    }
}

impl From<&tollgate_config::RelayConfig> for PassthroughConfig {
    fn from(config: &tollgate_config::RelayConfig) -> Self {
        let bypass_header = (!config.bypass_header.is_empty())
            .then(|| (config.bypass_header.clone(), config.bypass_value.clone()));
        Self {
            upstream: config.upstream.clone(),
            bypass_header,
        }
    }
}

/// What came back from upstream.
#[derive(Debug, Clone)]
pub struct Forwarded {
    pub status: StatusCode,
    /// Upstream body as JSON, or `{}` when it was not JSON.
    pub body: serde_json::Value,
}

/// Passthrough client for forwarding requests upstream.
#[derive(Debug, Clone)]
pub struct Passthrough {
    client: Client,
    config: PassthroughConfig,
}

impl Passthrough {
    pub fn new(config: PassthroughConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Get the config.
    pub fn config(&self) -> &PassthroughConfig {
        &self.config
    }

    /// Full upstream URL for a relayed path and raw query string.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let url = format!(
            "{}/{}",
            self.config.upstream.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}?{}", url, q),
            None => url,
        }
    }

    /// Forward one request and collect the upstream status and JSON body.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        authorization: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Result<Forwarded> {
        let url = self.target_url(path, query);

        let mut req = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some((name, value)) = &self.config.bypass_header {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = authorization {
            req = req.header(header::AUTHORIZATION, auth);
        }
        if let Some(body) = &body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({}));

        tracing::debug!(%method, %url, status = status.as_u16(), "relayed");
        Ok(Forwarded { status, body })
    }
}

/// Decode a relayed request body.
///
/// GET and DELETE never carry one; for other methods anything that is not a
/// JSON value (or is `null`) is dropped.
pub fn parse_body(method: &Method, bytes: &[u8]) -> Option<serde_json::Value> {
    if *method == Method::GET || *method == Method::DELETE {
        return None;
    }
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .filter(|value| !value.is_null())
}
