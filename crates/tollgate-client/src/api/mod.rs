//! API endpoint implementations.

mod auth;
mod console;

pub use auth::AuthApi;
pub use console::{ConsoleApi, ConsoleRequest};
