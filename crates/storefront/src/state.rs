//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;

use crate::backend::{ApiClient, ApiError};
use crate::config::StorefrontConfig;

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Backend(#[from] ApiError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the backend client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: ApiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let backend = ApiClient::new(&config.backend)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, backend }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Backend client using the storefront's own credentials.
    #[must_use]
    pub fn backend(&self) -> &ApiClient {
        &self.inner.backend
    }

    /// Backend client acting on behalf of a signed-in user.
    #[must_use]
    pub fn backend_for(&self, token: &SecretString) -> ApiClient {
        self.inner.backend.with_token(token)
    }
}
