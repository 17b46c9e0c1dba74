//! Login against the backend.

use tracing::instrument;

use super::{ApiClient, ApiError, AuthResponse, LoginRequest};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    ///
    /// Bad credentials come back as `ApiError::Unauthorized`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post_json(&["auth", "login", "submit"], request).await
    }
}
