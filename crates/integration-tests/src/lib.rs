//! Integration tests for the Shopora storefront.
//!
//! The storefront is exercised end to end against an `httpmock` server that
//! stands in for the e-commerce backend. Nothing here needs a running
//! backend or network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopora-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `backend_client` - status mapping, caching and optional resources
//! - `search` - unified search with independent result sets
//! - `storefront_routes` - full router requests via `tower::ServiceExt`

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use httpmock::MockServer;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use shopora_core::catalog::{Category, Product};
use shopora_storefront::backend::ApiClient;
use shopora_storefront::config::StorefrontConfig;
use shopora_storefront::routes;
use shopora_storefront::state::AppState;
use tower::ServiceExt;
use url::Url;

/// Storefront configuration pointed at a mock backend.
///
/// # Panics
///
/// Panics if the mock server URL is not a valid URL.
#[must_use]
pub fn config_for(server: &MockServer) -> StorefrontConfig {
    let url = Url::parse(&server.base_url()).expect("mock server URL");
    StorefrontConfig::for_backend(url)
}

/// Backend client talking to a mock backend.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&config_for(server).backend).expect("backend client")
}

/// Full storefront router talking to a mock backend.
///
/// # Panics
///
/// Panics if the application state cannot be built.
#[must_use]
pub fn app_for(server: &MockServer) -> Router {
    let state = AppState::new(config_for(server)).expect("app state");
    routes::app(state)
}

/// Send a GET request through the router.
///
/// # Panics
///
/// Panics if the request cannot be built or the router fails.
pub async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
    get_with_cookie(app, uri, None).await
}

/// Send a GET request carrying a session cookie.
///
/// # Panics
///
/// Panics if the request cannot be built or the router fails.
pub async fn get_with_cookie(
    app: Router,
    uri: &str,
    cookie: Option<&str>,
) -> (StatusCode, HeaderMap, String) {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    send(app, request.body(Body::empty()).expect("request")).await
}

/// Send a url-encoded form POST, optionally carrying a session cookie.
///
/// # Panics
///
/// Panics if the request cannot be built or the router fails.
pub async fn post_form(
    app: Router,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> (StatusCode, HeaderMap, String) {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    send(app, request.body(Body::from(body.to_string())).expect("request")).await
}

/// The `name=value` pair of the session cookie a response set.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.split(';').next().map(str::to_string))
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}

/// Backend JSON for a product.
///
/// # Panics
///
/// Panics if the product cannot be serialized.
#[must_use]
pub fn product_json(id: i64, name: &str, price: i64, quantity: i64) -> Value {
    let mut product = Product::new(id, name, Decimal::from(price));
    product.quantity = quantity;
    serde_json::to_value(product).expect("product JSON")
}

/// Backend JSON for a category.
///
/// # Panics
///
/// Panics if the category cannot be serialized.
#[must_use]
pub fn category_json(id: i64, name: &str) -> Value {
    serde_json::to_value(Category::new(id, name)).expect("category JSON")
}

/// Backend page envelope around `content`.
#[must_use]
pub fn page_json(content: Vec<Value>) -> Value {
    let total = content.len();
    json!({
        "content": content,
        "totalElements": total,
        "totalPages": 1,
        "size": 20,
        "number": 0,
        "first": true,
        "last": true,
    })
}
