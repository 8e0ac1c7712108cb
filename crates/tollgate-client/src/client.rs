//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use url::Url;

use crate::api::{AuthApi, ConsoleApi};
use crate::error::{Error, Result, message_from_body};
use crate::interceptor;
use crate::refresh::{Recovery, RefreshCoordinator};
use crate::request::{ApiResponse, PendingRequest};
use crate::session::Session;
use crate::store::SharedCredentialStore;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated API client.
///
/// Every request passes through the bearer interceptor and, on a 401, through
/// the refresh coordinator.
///
/// # Example
///
/// ```no_run
/// use tollgate_client::TollgateClient;
///
/// # async fn example() -> tollgate_client::Result<()> {
/// let client = TollgateClient::builder()
///     .base_url("http://localhost:8000/api/v1")
///     .build()?;
///
/// client.auth().login("a@b.com", "x").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TollgateClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests.
    pub(crate) base_url: Url,
    /// Request timeout.
    pub(crate) timeout: Duration,
    /// Credentials and lifecycle events.
    pub(crate) session: Session,
    /// Refresh-on-401 handling.
    pub(crate) refresh: RefreshCoordinator,
}

impl TollgateClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Session context shared by every clone of this client.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Whether concurrent refreshes are serialized.
    pub fn single_flight_refresh(&self) -> bool {
        self.inner.refresh.is_single_flight()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the auth API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the free-form request console.
    pub fn console(&self) -> ConsoleApi {
        ConsoleApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path.
    ///
    /// The path is always relative to the base path, even when its first
    /// segment contains a colon.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner
            .base_url
            .join(&format!("./{}", path))
            .map_err(Error::from)
    }

    /// Send a request through the pipeline and return the final response,
    /// whatever its status.
    ///
    /// A 401 triggers at most one refresh-and-retry. If the refresh itself
    /// fails the session is invalidated and the refresh error is returned.
    pub async fn send(&self, request: PendingRequest) -> Result<reqwest::Response> {
        let mut request = request;
        let sent_with = self.session().store().access_token();
        let response = self.dispatch(&request).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.refresh_attempted() {
            return Ok(response);
        }

        match self
            .inner
            .refresh
            .recover(self, &mut request, sent_with.as_deref())
            .await
        {
            Recovery::Propagate => Ok(response),
            Recovery::Retry => {
                let retried = self.dispatch(&request).await?;
                tracing::debug!(
                    path = %request.path(),
                    status = retried.status().as_u16(),
                    "retried request resolved"
                );
                Ok(retried)
            }
            Recovery::Failed(err) => Err(err),
        }
    }

    /// Send a request and deserialize a successful body.
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> Result<T> {
        let response = self.send(request).await?;
        self.handle_response(response).await
    }

    /// Send a request and capture the response in full, whatever its status.
    pub async fn fetch(&self, request: PendingRequest) -> Result<ApiResponse> {
        let response = self.send(request).await?;
        ApiResponse::from_response(response).await
    }

    /// Make a POST request.
    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.execute(PendingRequest::post(path).json(body)?).await
    }

    /// Make a POST request that bypasses refresh-on-401.
    ///
    /// Goes straight to the wire: the refresh call itself must never recurse
    /// into another refresh.
    pub(crate) async fn post_without_refresh<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let request = PendingRequest::post(path).json(body)?.without_refresh();
        let response = self.dispatch(&request).await?;
        self.handle_response(response).await
    }

    /// Put one request on the wire.
    async fn dispatch(&self, request: &PendingRequest) -> Result<reqwest::Response> {
        let url = self.url(request.path())?;
        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .timeout(self.inner.timeout);

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        builder = interceptor::authorize(builder, self.session().store(), request);

        tracing::trace!(method = %request.method(), path = %request.path(), "dispatching");
        Ok(builder.send().await?)
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response, keeping the body verbatim.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Error::Api {
            status,
            message: message_from_body(status, &body),
            body,
        }
    }
}

/// Builder for creating a TollgateClient.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    session: Option<Session>,
    timeout: Duration,
    user_agent: Option<String>,
    single_flight_refresh: bool,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            session: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            single_flight_refresh: false,
        }
    }

    /// Set the API base URL, including any version prefix.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use an existing session context.
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Use a fresh session over `store`.
    pub fn store(mut self, store: SharedCredentialStore) -> Self {
        self.session = Some(Session::new(store));
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Serialize concurrent refreshes so only one refresh call is in flight.
    pub fn single_flight_refresh(mut self, enabled: bool) -> Self {
        self.single_flight_refresh = enabled;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<TollgateClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("tollgate-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(TollgateClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
                session: self.session.unwrap_or_default(),
                refresh: RefreshCoordinator::new(self.single_flight_refresh),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_base_url() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:8000/api/v1")
            .build()
            .unwrap();

        assert_eq!(client.base_url().as_str(), "http://localhost:8000/api/v1/");
    }

    #[test]
    fn test_url_building() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:8000/api/v1/")
            .build()
            .unwrap();

        let url = client.url("auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/auth/login");

        let url = client.url("/auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/auth/login");
    }

    #[test]
    fn test_url_with_colon_in_first_segment() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:8000/api/v1")
            .build()
            .unwrap();

        let url = client.url("/documents:batchGet").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/documents:batchGet");

        let url = client.url("users/me:activate").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/users/me:activate");
    }

    #[test]
    fn test_clones_share_session() {
        let client = ClientBuilder::new()
            .base_url("http://localhost:8000")
            .build()
            .unwrap();
        let clone = client.clone();

        client.session().store().set_access_token("t").unwrap();
        assert!(clone.session().is_authenticated());
        assert!(!clone.single_flight_refresh());
    }
}
