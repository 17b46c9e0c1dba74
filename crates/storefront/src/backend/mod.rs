//! E-commerce REST backend client.
//!
//! # Architecture
//!
//! - One `reqwest` client shared by every request, with a per-request timeout
//! - The backend is source of truth - NO local persistence, direct API calls
//! - In-memory caching via `moka` for public catalog reads (configurable TTL)
//! - Bearer tokens are attached per call site via [`ApiClient::with_token`]
//!
//! Endpoints are grouped by resource, one `impl ApiClient` block per file:
//!
//! - [`catalog`] - categories and public product reads
//! - [`orders`] - buyer orders, shipping details, tracking, returns, refunds
//! - [`seller`] - seller products, inventory, orders, dashboard
//! - [`company`] - companies and company role management
//! - [`addresses`] - buyer address book
//! - [`cart`] - buyer cart and coupons
//! - [`auth`] - login
//!
//! # Example
//!
//! ```rust,ignore
//! use shopora_storefront::backend::ApiClient;
//!
//! let client = ApiClient::new(&config.backend)?;
//! let featured = client.featured_products(8).await?;
//!
//! let buyer = client.with_token(&user.token);
//! let orders = buyer.user_orders(user.id).await?;
//! ```

pub mod addresses;
pub mod auth;
mod cache;
pub mod cart;
pub mod catalog;
pub mod company;
pub mod orders;
pub mod seller;
pub mod types;

pub use company::{LogoUpload, MemberAction};
pub use types::*;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;
use cache::{CacheKey, CacheValue};

/// Longest backend body excerpt kept in logs and error messages.
const BODY_EXCERPT_LEN: usize = 500;

/// Empty query string.
pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, expired, or insufficient credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Backend rejected the input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// Message that is safe to show to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => "We couldn't find what you were looking for.".to_string(),
            Self::Unauthorized => "Please sign in again to continue.".to_string(),
            Self::Validation(message) => message.clone(),
            Self::RateLimited(_) => "Too many requests, please try again shortly.".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Url(_) | Self::Status { .. } => {
                "The service is temporarily unavailable.".to_string()
            }
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Explicit outcome of a fetch, so pages can tell "nothing there" from
/// "could not load".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Loaded(T),
    Empty,
    Failed(String),
}

impl<T> Fetched<T> {
    /// Classify a single-value fetch. `NotFound` counts as empty.
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(ApiError::NotFound(what)) => {
                tracing::debug!(%what, "backend resource not found");
                Self::Empty
            }
            Err(e) => {
                tracing::error!(error = %e, "backend fetch failed");
                Self::Failed(e.user_message())
            }
        }
    }

    /// Classify a fetch of an optional sub-resource.
    pub fn from_option(result: Result<Option<T>, ApiError>) -> Self {
        match result {
            Ok(Some(value)) => Self::Loaded(value),
            Ok(None) => Self::Empty,
            Err(e) => Self::from_result(Err(e)),
        }
    }

    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Loaded(value) => Fetched::Loaded(f(value)),
            Self::Empty => Fetched::Empty,
            Self::Failed(message) => Fetched::Failed(message),
        }
    }

    pub fn into_loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Fetched<Vec<T>> {
    /// Classify a list fetch. An empty list counts as empty.
    pub fn from_list(result: Result<Vec<T>, ApiError>) -> Self {
        match Self::from_result(result) {
            Self::Loaded(items) if items.is_empty() => Self::Empty,
            other => other,
        }
    }

    /// Items when loaded, otherwise an empty slice.
    #[must_use]
    pub fn items(&self) -> &[T] {
        self.loaded().map_or(&[], Vec::as_slice)
    }
}

/// Map a 404 into `Ok(None)` for sub-resources that may not exist yet.
pub(crate) fn optional<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the e-commerce REST backend.
///
/// Cheaply cloneable; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    token: Option<Arc<SecretString>>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shopora-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
            token: config
                .service_token
                .as_ref()
                .map(|t| Arc::new(t.clone())),
        })
    }

    /// A clone of this client that authenticates as the given bearer token.
    #[must_use]
    pub fn with_token(&self, token: &SecretString) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            token: Some(Arc::new(token.clone())),
        }
    }

    /// Whether requests carry a bearer token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Base URL of the backend.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments, each percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(format!("{} cannot be a base", self.inner.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and return the raw success body.
    async fn execute(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ApiError::Validation(message))
            }
            _ => {
                tracing::error!(
                    status = %status,
                    path = %path,
                    body = %excerpt(&body),
                    "backend returned non-success status"
                );
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Send a request and parse the JSON body.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Verb helpers
    // =========================================================================

    pub(crate) async fn get_json<T, Q>(&self, segments: &[&str], query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.send(self.request(Method::GET, url).query(query)).await
    }

    pub(crate) async fn post_json<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.send(self.request(Method::POST, url).json(body)).await
    }

    pub(crate) async fn put_json<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.send(self.request(Method::PUT, url).json(body)).await
    }

    pub(crate) async fn patch_json<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.send(self.request(Method::PATCH, url).json(body)).await
    }

    /// Send a bodiless request with a query string and parse the JSON reply.
    pub(crate) async fn query_json<T, Q>(
        &self,
        method: Method,
        segments: &[&str],
        query: &Q,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.send(self.request(method, url).query(query)).await
    }

    /// Send a request whose response body is ignored.
    pub(crate) async fn send_empty<Q>(
        &self,
        method: Method,
        segments: &[&str],
        query: &Q,
    ) -> Result<(), ApiError>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.execute(self.request(method, url).query(query))
            .await
            .map(|_| ())
    }

    /// Send a JSON body whose response body is ignored.
    pub(crate) async fn send_json_empty<B>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.execute(self.request(method, url).json(body))
            .await
            .map(|_| ())
    }

    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let url = self.url(segments)?;
        self.send(self.request(method, url).multipart(form)).await
    }

    // =========================================================================
    // Cache helpers
    // =========================================================================

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.get(key).await;
        if value.is_some() {
            tracing::debug!(?key, "cache hit");
        }
        value
    }

    async fn cache(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop every cached catalog entry.
    pub async fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Pull a human-readable message out of a backend error body.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| excerpt(body))
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&BackendConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let client = client("https://api.example.com/ecommerce/");
        let url = client.url(&["api", "v1", "products", "42"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/ecommerce/api/v1/products/42");
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = client("http://localhost:8080/");
        let url = client
            .url(&["seller", "user", "role", "company", "3", "add-seller", "a b@example.com"])
            .unwrap();
        assert!(url.as_str().ends_with("/add-seller/a%20b@example.com"));
    }

    #[test]
    fn test_with_token_marks_authenticated() {
        let client = client("http://localhost:8080/");
        assert!(!client.is_authenticated());
        let scoped = client.with_token(&SecretString::from("abc"));
        assert!(scoped.is_authenticated());
        assert!(!format!("{scoped:?}").contains("abc"));
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(error_message(r#"{"message": "Quantity must be positive"}"#), "Quantity must be positive");
        assert_eq!(error_message(r#"{"error": "Bad Request"}"#), "Bad Request");
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[test]
    fn test_fetched_classification() {
        let loaded: Fetched<Vec<i32>> = Fetched::from_list(Ok(vec![1]));
        assert_eq!(loaded.items(), &[1]);

        let empty: Fetched<Vec<i32>> = Fetched::from_list(Ok(vec![]));
        assert!(empty.is_empty());

        let missing: Fetched<i32> = Fetched::from_result(Err(ApiError::NotFound("/x".into())));
        assert!(missing.is_empty());

        let failed: Fetched<Vec<i32>> = Fetched::from_list(Err(ApiError::Status {
            status: 500,
            message: "boom".into(),
        }));
        assert!(failed.is_failed());
        assert!(failed.items().is_empty());
        assert_eq!(failed.failure(), Some("The service is temporarily unavailable."));
    }

    #[test]
    fn test_optional_maps_not_found() {
        assert_eq!(optional::<i32>(Err(ApiError::NotFound("/x".into()))).unwrap(), None);
        assert_eq!(optional(Ok(5)).unwrap(), Some(5));
        assert!(optional::<i32>(Err(ApiError::Unauthorized)).is_err());
    }
}
