//! Free-form request console.
//!
//! Sends any method/path/body through the authenticated pipeline and returns
//! the response in full. Error statuses are results here, not failures.

use reqwest::Method;

use crate::client::TollgateClient;
use crate::error::{Error, Result};
use crate::request::{ApiResponse, PendingRequest};

/// A request typed in by hand.
#[derive(Debug, Clone)]
pub struct ConsoleRequest {
    pub method: Method,
    pub path: String,
    /// Raw JSON text for the body.
    pub body: Option<String>,
    pub query: Vec<(String, String)>,
    /// Bearer token used when no session token is stored.
    pub bearer: Option<String>,
}

impl ConsoleRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            bearer: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Path with a leading slash.
    pub fn endpoint(&self) -> String {
        let path = self.path.trim();
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        }
    }

    /// Only these methods carry a body.
    fn sends_body(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::PATCH)
    }

    /// Validate and convert into a pipeline request.
    pub fn into_pending(self) -> Result<PendingRequest> {
        if self.path.trim().is_empty() {
            return Err(Error::InvalidRequest("Endpoint is required".to_string()));
        }

        let body = match self.body.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(
                serde_json::from_str::<serde_json::Value>(text)
                    .map_err(|e| Error::InvalidRequest(format!("Invalid JSON format: {}", e)))?,
            ),
            _ => None,
        };

        let mut request = PendingRequest::new(self.method.clone(), self.endpoint());
        if self.sends_body() {
            request = request.with_body(body.unwrap_or_else(|| serde_json::json!({})));
        }
        for (key, value) in self.query {
            request = request.query(key, value);
        }
        if let Some(token) = self.bearer.filter(|t| !t.trim().is_empty()) {
            request = request.with_bearer(token);
        }
        Ok(request)
    }
}

/// Console API client.
pub struct ConsoleApi {
    client: TollgateClient,
}

impl ConsoleApi {
    pub(crate) fn new(client: TollgateClient) -> Self {
        Self { client }
    }

    /// Send the request and capture whatever comes back.
    pub async fn execute(&self, request: ConsoleRequest) -> Result<ApiResponse> {
        let pending = request.into_pending()?;
        self.client.fetch(pending).await
    }
}
