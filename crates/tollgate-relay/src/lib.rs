//! Same-origin relay for browser front-ends.
//!
//! Forwards requests received under a route prefix to the Tollgate backend so
//! a browser never makes a cross-origin call.
//!
//! # Components
//!
//! - [`passthrough`]: upstream forwarding: URL building, body decoding, header injection
//! - [`proxy`]: Axum-based relay server with CORS and health endpoints

pub mod error;
pub mod passthrough;
pub mod proxy;

pub use error::{RelayError, Result};
pub use passthrough::{Forwarded, Passthrough, PassthroughConfig};
pub use proxy::{RelayServer, RelayServerConfig};
