//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Backend reachability check
//!
//! # Catalog
//! GET  /products                  - Product listing (filters, sort, pages)
//! GET  /products/{id}             - Product detail
//! GET  /categories                - Top-level categories
//! GET  /categories/{id}           - Category products
//! GET  /search                    - Unified search page
//! GET  /search/suggest            - Search suggestions (JSON)
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! POST /auth/logout               - Logout action
//!
//! # Account (requires auth)
//! GET  /account/orders                    - Order history
//! GET  /account/orders/{id}               - Order detail, delivery and returns
//! POST /account/orders/{id}/cancel        - Cancel an order
//! POST /account/orders/{id}/returns       - Request a return
//! GET  /account/addresses                 - Address book
//! POST /account/addresses                 - Create or update an address
//! POST /account/addresses/{id}/delete     - Delete an address
//!
//! # Cart (session cart when signed out, backend cart when signed in)
//! GET  /cart                              - Cart page
//! POST /cart/add                          - Add a product
//! POST /cart/items/{key}/update           - Change a line's quantity (0 removes)
//! POST /cart/items/{key}/remove           - Remove a line
//! POST /cart/clear                        - Empty the cart
//! POST /cart/coupon                       - Apply a coupon (requires auth)
//! POST /cart/coupon/remove                - Remove the coupon (requires auth)
//!
//! # Checkout (requires auth)
//! GET  /checkout                          - Cart summary and address choice
//! POST /checkout                          - Place the order
//! GET  /checkout/confirmation/{id}        - Order confirmation
//!
//! # Seller (requires seller role)
//! GET  /seller                            - Dashboard
//! GET  /seller/products                   - Product table
//! GET  /seller/products/new               - New product form
//! POST /seller/products/new               - Create product (multipart)
//! GET  /seller/products/{id}/edit         - Edit product form
//! POST /seller/products/{id}/edit         - Update product (multipart)
//! POST /seller/products/{id}/price        - Change base price
//! POST /seller/products/{id}/delete       - Delete product
//! GET  /seller/inventory                  - Stock levels
//! POST /seller/inventory/{id}/stock       - Set stock
//! POST /seller/inventory/{id}/alert       - Set low-stock threshold
//! GET  /seller/orders                     - Order table
//! GET  /seller/orders/{id}                - Order detail
//! POST /seller/orders/{id}/status         - Change order status
//! POST /seller/orders/{id}/fulfill        - Mark fulfilled
//! POST /seller/orders/{id}/returns/{return_id}/approve|reject|refund
//! GET  /seller/companies                  - Companies and admin requests
//! GET  /seller/companies/apply            - Company admin application
//! POST /seller/companies/apply            - Submit application (multipart)
//! POST /seller/companies/requests/{id}/approve|deny
//! GET  /seller/companies/{id}             - Company detail
//! POST /seller/companies/{id}/members|rights|delete|revoke
//!
//! # Admin (requires app admin role)
//! GET  /admin/categories                  - Category table and form
//! POST /admin/categories                  - Create or update a category
//! POST /admin/categories/{id}/delete      - Delete a category
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod companies;
pub mod home;
pub mod products;
pub mod search;
pub mod seller;
pub mod views;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::{get, post},
};
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{id}", get(categories::show))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/orders/{id}/cancel", post(account::cancel_order))
        .route("/orders/{id}/returns", post(account::request_return))
        .route(
            "/addresses",
            get(account::addresses).post(account::save_address),
        )
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/items/{key}/update", post(cart::update))
        .route("/items/{key}/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/coupon", post(cart::apply_coupon))
        .route("/coupon/remove", post(cart::remove_coupon))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::place_order))
        .route("/confirmation/{id}", get(checkout::confirmation))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/search", search::router())
        // Auth
        .nest("/auth", auth_routes())
        // Buyer account
        .nest("/account", account_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        // Seller dashboards
        .nest("/seller", seller::router())
        // Catalog administration
        .nest("/admin", admin::router())
}

/// The complete application: pages, health checks and the middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .fallback(not_found)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the backend answers the category list before returning OK.
/// Returns 503 Service Unavailable otherwise.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().categories().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "backend not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("page".to_string())
}
