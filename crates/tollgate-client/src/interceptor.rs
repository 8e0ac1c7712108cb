//! Request interceptor: bearer token injection.

use reqwest::RequestBuilder;

use crate::request::PendingRequest;
use crate::store::CredentialStore;

/// Pick the bearer token for an outgoing request.
///
/// A stored access token always wins; a per-request override is only used
/// when the store holds none.
pub fn bearer_token(store: &dyn CredentialStore, request: &PendingRequest) -> Option<String> {
    store
        .access_token()
        .or_else(|| request.bearer_override().map(str::to_owned))
}

/// Attach `Authorization: Bearer <token>` when a token is available.
pub fn authorize(
    builder: RequestBuilder,
    store: &dyn CredentialStore,
    request: &PendingRequest,
) -> RequestBuilder {
    match bearer_token(store, request) {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}
