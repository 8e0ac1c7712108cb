//! Auth API.

use crate::client::TollgateClient;
use crate::error::Result;
use crate::types::{
    AuthResponse, LoginRequest, MessageResponse, OAuthRequest, PasswordResetConfirm,
    PasswordResetRequest, RefreshRequest, RefreshResponse, RegisterRequest,
};

/// Auth API client.
///
/// Sign-in calls store the returned credentials in the client's session.
pub struct AuthApi {
    client: TollgateClient,
}

impl AuthApi {
    pub(crate) fn new(client: TollgateClient) -> Self {
        Self { client }
    }

    /// Register a new account.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self.client.post("auth/register", &request).await?;
        self.client.session().establish(&auth)?;
        Ok(auth)
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self.client.post("auth/login", &request).await?;
        self.client.session().establish(&auth)?;
        Ok(auth)
    }

    /// Sign in (or register) with a third-party identity token.
    pub async fn oauth(&self, provider: &str, id_token: &str) -> Result<AuthResponse> {
        let request = OAuthRequest {
            provider: provider.to_string(),
            id_token: id_token.to_string(),
        };
        let auth: AuthResponse = self.client.post("auth/oauth", &request).await?;
        self.client.session().establish(&auth)?;
        Ok(auth)
    }

    /// Exchange a refresh token for a new access token and store it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response: RefreshResponse = self
            .client
            .post_without_refresh("auth/refresh", &request)
            .await?;
        self.client
            .session()
            .update_access_token(&response.access_token)?;
        Ok(response)
    }

    /// Ask the server to email a password reset link.
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse> {
        let request = PasswordResetRequest {
            email: email.to_string(),
        };
        self.client
            .post("auth/password-reset/request", &request)
            .await
    }

    /// Set a new password using the emailed reset token.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        let request = PasswordResetConfirm {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.client
            .post("auth/password-reset/confirm", &request)
            .await
    }

    /// Clear local credentials. The server is not contacted.
    pub fn logout(&self) -> Result<()> {
        self.client.session().logout()
    }
}
