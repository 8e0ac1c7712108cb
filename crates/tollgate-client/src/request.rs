//! Request descriptors and raw responses.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::Serialize;

use crate::error::Result;

/// An outgoing API call, plus the one-shot refresh flag.
///
/// The flag lives here rather than on shared client state, so each caller's
/// request is refreshed at most once no matter how many are in flight.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    bearer_override: Option<String>,
    refresh_attempted: bool,
}

impl PendingRequest {
    /// Create a request for `path`, relative to the API base URL.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer_override: None,
            refresh_attempted: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach an already-built JSON value as the body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Bearer token to use when the store holds none.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_override = Some(token.into());
        self
    }

    /// Send without refresh-on-401 handling.
    pub(crate) fn without_refresh(mut self) -> Self {
        self.refresh_attempted = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn bearer_override(&self) -> Option<&str> {
        self.bearer_override.as_deref()
    }

    /// Whether a refresh has already been attempted for this request.
    pub fn refresh_attempted(&self) -> bool {
        self.refresh_attempted
    }

    /// Set the refresh flag, returning its previous value.
    pub(crate) fn mark_refresh_attempted(&mut self) -> bool {
        std::mem::replace(&mut self.refresh_attempted, true)
    }
}

/// A response captured in full, whatever its status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    pub(crate) async fn from_response(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Body as indented JSON, or verbatim when it is not JSON.
    pub fn pretty_body(&self) -> String {
        self.json()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| self.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mark_refresh_attempted_is_one_shot() {
        let mut request = PendingRequest::get("me");
        assert!(!request.refresh_attempted());
        assert!(!request.mark_refresh_attempted());
        assert!(request.mark_refresh_attempted());
        assert!(request.refresh_attempted());
    }

    #[test]
    fn test_builder_methods() {
        let request = PendingRequest::post("auth/login")
            .json(&json!({"email": "a@b.com"}))
            .unwrap()
            .query("verbose", "1")
            .with_bearer("t");

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.path(), "auth/login");
        assert_eq!(request.body().unwrap()["email"], "a@b.com");
        assert_eq!(request.query_pairs(), &[("verbose".to_string(), "1".to_string())]);
        assert_eq!(request.bearer_override(), Some("t"));
    }

    #[test]
    fn test_pretty_body_falls_back_to_raw() {
        let response = ApiResponse {
            status: 502,
            status_text: "Bad Gateway".to_string(),
            headers: BTreeMap::new(),
            body: "upstream down".to_string(),
        };
        assert_eq!(response.pretty_body(), "upstream down");
        assert!(!response.is_success());

        let response = ApiResponse {
            body: r#"{"a":1}"#.to_string(),
            status: 200,
            ..response
        };
        assert_eq!(response.pretty_body(), "{\n  \"a\": 1\n}");
    }
}
