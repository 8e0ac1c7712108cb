//! HTTP relay server.
//!
//! Accepts browser requests under a route prefix on the same origin as the
//! front-end and forwards them to the backend, mirroring status and JSON body.

use axum::{
    Json, Router as AxumRouter,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{RelayError, Result};
use crate::passthrough::{Passthrough, PassthroughConfig, parse_body};

const ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Configuration for the relay server.
#[derive(Debug, Clone)]
pub struct RelayServerConfig {
    pub bind_addr: SocketAddr,
    /// Route prefix, e.g. `/api/proxy`.
    pub prefix: String,
    pub enable_cors: bool,
    pub passthrough: PassthroughConfig,
}

impl RelayServerConfig {
    pub fn new(bind_addr: SocketAddr, upstream: impl Into<String>) -> Self {
        Self {
            bind_addr,
            prefix: tollgate_config::DEFAULT_RELAY_PREFIX.to_string(),
            enable_cors: true,
            passthrough: PassthroughConfig::new(upstream),
        }
    }

    /// Build from the `[relay]` config section.
    pub fn from_config(config: &tollgate_config::RelayConfig) -> Result<Self> {
        Ok(Self {
            bind_addr: config.bind_addr()?,
            prefix: config.prefix.clone(),
            enable_cors: config.enable_cors,
            passthrough: PassthroughConfig::from(config),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Route pattern matching everything below the prefix.
    fn route(&self) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            "/{*path}".to_string()
        } else {
            format!("/{}/{{*path}}", prefix)
        }
    }
}

/// Shared state for the relay server.
struct RelayState {
    passthrough: Passthrough,
    enable_cors: bool,
}

/// The relay server.
pub struct RelayServer {
    config: RelayServerConfig,
    state: Arc<RelayState>,
}

impl RelayServer {
    pub fn new(config: RelayServerConfig) -> Self {
        Self {
            state: Arc::new(RelayState {
                passthrough: Passthrough::new(config.passthrough.clone()),
                enable_cors: config.enable_cors,
            }),
            config,
        }
    }

    /// Build the axum router.
    pub fn router(&self) -> AxumRouter {
        let mut router = AxumRouter::new()
            .route(
                &self.config.route(),
                get(handle_relay)
                    .post(handle_relay)
                    .put(handle_relay)
                    .patch(handle_relay)
                    .delete(handle_relay)
                    .options(handle_preflight),
            )
            .route("/health", get(handle_health))
            .with_state(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::PATCH,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
            );
        }

        router
    }

    /// Run the relay server.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            upstream = %self.config.passthrough.upstream,
            "Starting relay server"
        );
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Run with graceful shutdown, returning the bound address.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<SocketAddr> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            upstream = %self.config.passthrough.upstream,
            "Starting relay server"
        );
        tokio::spawn(async move {
            axum::serve(listener, self.router())
                .with_graceful_shutdown(shutdown)
                .await
                .ok();
        });
        Ok(local_addr)
    }
}

/// Handle GET/POST/PUT/PATCH/DELETE {prefix}/{*path}
async fn handle_relay(
    State(state): State<Arc<RelayState>>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let payload = parse_body(&method, &body);

    let mut response = match state
        .passthrough
        .forward(method, &path, query.as_deref(), authorization, payload)
        .await
    {
        Ok(forwarded) => (forwarded.status, Json(forwarded.body)).into_response(),
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Relay request failed");
            e.into_response()
        }
    };

    if state.enable_cors {
        apply_cors_headers(response.headers_mut());
    }
    response
}

/// Handle OPTIONS {prefix}/{*path}
///
/// With CORS enabled the layer answers OPTIONS before this runs.
async fn handle_preflight(State(state): State<Arc<RelayState>>) -> Response {
    let mut response = StatusCode::OK.into_response();
    if state.enable_cors {
        apply_cors_headers(response.headers_mut());
    }
    response
}

/// Handle GET /health
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tollgate-relay"
    }))
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "Proxy request failed",
            "message": self.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
