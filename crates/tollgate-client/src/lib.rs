//! Authenticated HTTP client SDK for the Tollgate account backend.
//!
//! Every call goes through a two-stage pipeline:
//!
//! 1. the [`interceptor`] attaches `Authorization: Bearer <access_token>` when
//!    the session holds one;
//! 2. on a 401 the [`refresh`] coordinator exchanges the refresh token once,
//!    stores the new access token and reissues the request. If the refresh
//!    fails, credentials are purged and [`SessionEvent::Invalidated`] is
//!    broadcast.
//!
//! # Example
//!
//! ```no_run
//! use tollgate_client::{Session, SessionEvent, TollgateClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let session = Session::in_memory();
//! let mut events = session.subscribe();
//!
//! let client = TollgateClient::builder()
//!     .base_url("http://localhost:8000/api/v1")
//!     .session(session)
//!     .build()?;
//!
//! client.auth().login("a@b.com", "x").await?;
//!
//! let response = client.fetch(tollgate_client::PendingRequest::get("users/me")).await;
//! if let Ok(SessionEvent::Invalidated { login_path, .. }) = events.try_recv() {
//!     println!("session expired, sign in again at {}", login_path);
//! }
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod interceptor;
pub mod refresh;
pub mod request;
pub mod session;
pub mod store;
pub mod types;

pub use api::{AuthApi, ConsoleApi, ConsoleRequest};
pub use client::{ClientBuilder, TollgateClient};
pub use error::{Error, Result};
pub use refresh::RefreshState;
pub use request::{ApiResponse, PendingRequest};
pub use reqwest::Method;
pub use session::{DEFAULT_LOGIN_PATH, Session, SessionEvent};
pub use store::{
    CredentialField, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    SharedCredentialStore,
};
pub use types::*;
