//! Session context.
//!
//! [`Session`] owns the credential store and announces lifecycle changes to
//! whoever subscribes. Navigation on teardown is the host's decision; the
//! pipeline only emits [`SessionEvent::Invalidated`].

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::Result;
use crate::store::{CredentialStore, SharedCredentialStore, memory_store};
use crate::types::AuthResponse;

/// Default login entry point reported on invalidation.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were stored after register, login or OAuth.
    Established { user_id: String },
    /// The access token was replaced by a refresh.
    Refreshed,
    /// Credentials were purged because a refresh failed.
    Invalidated {
        reason: String,
        /// Where the host should send the user to sign in again.
        login_path: String,
    },
    /// Credentials were purged on request.
    LoggedOut,
}

/// Shared session context injected into the client.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    store: SharedCredentialStore,
    events: broadcast::Sender<SessionEvent>,
    login_path: String,
}

impl Session {
    /// Create a session over an existing store.
    pub fn new(store: SharedCredentialStore) -> Self {
        Self::with_login_path(store, DEFAULT_LOGIN_PATH)
    }

    /// Create a session with a custom login entry point.
    pub fn with_login_path(store: SharedCredentialStore, login_path: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                store,
                events,
                login_path: login_path.into(),
            }),
        }
    }

    /// Create a session backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(memory_store())
    }

    /// Credential store.
    pub fn store(&self) -> &dyn CredentialStore {
        self.inner.store.as_ref()
    }

    /// Login entry point reported on invalidation.
    pub fn login_path(&self) -> &str {
        &self.inner.login_path
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Whether an access token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.store().access_token().is_some()
    }

    /// Store the credentials from a sign-in response.
    pub fn establish(&self, auth: &AuthResponse) -> Result<()> {
        self.store().save_auth(auth)?;
        tracing::info!(user_id = %auth.user_id, "session established");
        self.emit(SessionEvent::Established {
            user_id: auth.user_id.clone(),
        });
        Ok(())
    }

    /// Replace the access token after a successful refresh.
    pub fn update_access_token(&self, token: &str) -> Result<()> {
        self.store().set_access_token(token)?;
        tracing::debug!("access token rotated");
        self.emit(SessionEvent::Refreshed);
        Ok(())
    }

    /// Purge all credentials after an unrecoverable refresh failure.
    pub fn invalidate(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if let Err(e) = self.store().clear() {
            tracing::error!(error = %e, "failed to clear credentials during teardown");
        }
        tracing::warn!(%reason, login_path = %self.inner.login_path, "session invalidated");
        self.emit(SessionEvent::Invalidated {
            reason,
            login_path: self.inner.login_path.clone(),
        });
    }

    /// Purge all credentials on user request.
    pub fn logout(&self) -> Result<()> {
        self.store().clear()?;
        tracing::info!("logged out");
        self.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}
