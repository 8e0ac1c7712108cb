//! Refresh coordinator.
//!
//! Recovers one failure class locally: a stale access token. Per request the
//! flow is
//!
//! ```text
//! Idle ──401, flag unset──► AwaitingRefresh ──refresh ok──► Retrying ──► done
//!                                 │
//!                                 └──refresh failed──► Failed (credentials purged)
//! ```
//!
//! Every other failure reaches the caller untouched.

use tokio::sync::Mutex;

use crate::client::TollgateClient;
use crate::error::Error;
use crate::request::PendingRequest;

/// Per-request refresh progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    AwaitingRefresh,
    Retrying,
    Failed,
}

/// What the pipeline should do with a 401.
#[derive(Debug)]
pub(crate) enum Recovery {
    /// Hand the original response back to the caller.
    Propagate,
    /// A fresh access token is stored; reissue the request once.
    Retry,
    /// The refresh failed and the session has been torn down.
    Failed(Error),
}

/// Exchanges refresh tokens on behalf of requests that hit a 401.
#[derive(Debug)]
pub(crate) struct RefreshCoordinator {
    /// Present when refreshes are serialized.
    gate: Option<Mutex<()>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(single_flight: bool) -> Self {
        Self {
            gate: single_flight.then(|| Mutex::new(())),
        }
    }

    pub(crate) fn is_single_flight(&self) -> bool {
        self.gate.is_some()
    }

    /// Handle a 401 for `request`, which was sent with `sent_with` as its
    /// stored access token.
    pub(crate) async fn recover(
        &self,
        client: &TollgateClient,
        request: &mut PendingRequest,
        sent_with: Option<&str>,
    ) -> Recovery {
        if request.mark_refresh_attempted() {
            return Recovery::Propagate;
        }

        let session = client.session();

        let guard = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };
        if guard.is_some()
            && let Some(current) = session.store().access_token()
            && Some(current.as_str()) != sent_with
        {
            tracing::debug!(
                path = %request.path(),
                "access token already rotated by a concurrent refresh"
            );
            return Recovery::Retry;
        }

        let Some(refresh_token) = session.store().refresh_token() else {
            tracing::debug!(
                path = %request.path(),
                "unauthorized with no refresh token; surfacing original response"
            );
            return Recovery::Propagate;
        };

        transition(request, RefreshState::Idle, RefreshState::AwaitingRefresh);

        match client.auth().refresh(&refresh_token).await {
            Ok(_) => {
                transition(request, RefreshState::AwaitingRefresh, RefreshState::Retrying);
                Recovery::Retry
            }
            Err(err) => {
                transition(request, RefreshState::AwaitingRefresh, RefreshState::Failed);
                session.invalidate(format!("token refresh failed: {}", err));
                Recovery::Failed(err)
            }
        }
    }
}

fn transition(request: &PendingRequest, from: RefreshState, to: RefreshState) {
    tracing::debug!(
        method = %request.method(),
        path = %request.path(),
        ?from,
        ?to,
        "refresh state"
    );
}
