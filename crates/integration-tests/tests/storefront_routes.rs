//! Integration tests for the storefront router.
//!
//! Requests go through the full middleware stack (sessions, request IDs,
//! tracing, Sentry) with the backend replaced by a mock server.

use axum::http::{StatusCode, header};
use httpmock::prelude::*;
use serde_json::{Value, json};
use shopora_integration_tests::{
    app_for, category_json, get, get_with_cookie, location, page_json, post_form, product_json,
    session_cookie,
};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_ok_without_backend() {
    let server = MockServer::start_async().await;
    let (status, headers, body) = get(app_for(&server), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_follows_backend() {
    let server = MockServer::start_async().await;
    let mut down = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(500);
        })
        .await;

    let (status, _, _) = get(app_for(&server), "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    down.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200).json_body(json!([category_json(1, "Lighting")]));
        })
        .await;

    let (status, _, _) = get(app_for(&server), "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Catalog pages
// ============================================================================

#[tokio::test]
async fn test_product_page_renders() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/7");
            then.status(200).json_body(product_json(7, "Desk lamp", 40, 3));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/7/related");
            then.status(200)
                .json_body(json!([product_json(8, "Lamp shade", 15, 9)]));
        })
        .await;

    let (status, _, body) = get(app_for(&server), "/products/7").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Desk lamp"));
    assert!(body.contains("3 in stock"));
    assert!(body.contains("Lamp shade"));
}

#[tokio::test]
async fn test_missing_product_is_404() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/99");
            then.status(404);
        })
        .await;

    let (status, _, body) = get(app_for(&server), "/products/99").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("product 99"));
}

#[tokio::test]
async fn test_home_sections_degrade_independently() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/featured");
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/new-arrivals");
            then.status(200)
                .json_body(json!([product_json(5, "Walnut desk", 300, 1)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/best-sellers");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/parents");
            then.status(200).json_body(json!([category_json(1, "Lighting")]));
        })
        .await;

    let (status, _, body) = get(app_for(&server), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("The service is temporarily unavailable."));
    assert!(body.contains("Walnut desk"));
    assert!(body.contains("Nothing to show here yet."));
    assert!(body.contains("Lighting"));
}

#[tokio::test]
async fn test_search_page_renders_hits() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/search");
            then.status(200)
                .json_body(page_json(vec![product_json(1, "Desk lamp", 40, 2)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/search");
            then.status(500);
        })
        .await;

    let (status, _, body) = get(app_for(&server), "/search?q=lamp").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Desk lamp"));
    assert!(body.contains("notice-error"));
}

#[tokio::test]
async fn test_suggest_returns_json() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/search");
            then.status(200)
                .json_body(page_json(vec![product_json(1, "Desk lamp", 40, 2)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/search");
            then.status(200).json_body(json!([]));
        })
        .await;

    let (status, _, body) = get(app_for(&server), "/search/suggest?q=lamp").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).expect("JSON body");
    assert_eq!(json["query"], "lamp");
    assert_eq!(json["suggestions"], json!(["Desk lamp"]));
}

/// Byte offset of a product card heading, for ordering assertions.
fn card_at(body: &str, name: &str) -> usize {
    body.find(&format!("<h3>{name}</h3>"))
        .unwrap_or_else(|| panic!("no card for {name}"))
}

#[tokio::test]
async fn test_products_page_sorts_and_filters() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products");
            then.status(200).json_body(page_json(vec![
                product_json(1, "Floor lamp", 90, 2),
                product_json(2, "Pencil cup", 10, 8),
                product_json(3, "Side chair", 50, 4),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200).json_body(json!([category_json(1, "Lighting")]));
        })
        .await;

    let (status, _, body) =
        get(app_for(&server), "/products?sort=priceAsc&min_price=20&max_price=100").await;

    assert_eq!(status, StatusCode::OK);
    assert!(card_at(&body, "Side chair") < card_at(&body, "Floor lamp"));
    assert!(!body.contains("Pencil cup"));

    let (_, _, body) = get(app_for(&server), "/products?sort=nameDesc").await;
    assert!(card_at(&body, "Side chair") < card_at(&body, "Pencil cup"));
    assert!(card_at(&body, "Pencil cup") < card_at(&body, "Floor lamp"));
}

/// Mocks category 5 holding `products`.
async fn mock_category(server: &MockServer, products: Vec<Value>) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/5");
            then.status(200).json_body(category_json(5, "Desks"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/5/subcategories");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/api/v1/products/category/5");
            then.status(200).json_body(page_json(products));
        })
        .await;
}

#[tokio::test]
async fn test_category_page_sorts_by_name() {
    let server = MockServer::start_async().await;
    mock_category(
        &server,
        vec![product_json(1, "Z", 15, 3), product_json(2, "A", 60, 3)],
    )
    .await;

    let (status, _, body) = get(
        app_for(&server),
        "/categories/5?min_price=0&max_price=1000&sort=nameAsc",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Desks"));
    assert!(card_at(&body, "A") < card_at(&body, "Z"));
    let first = body.find(r#"href="/products/2""#).expect("product 2");
    let second = body.find(r#"href="/products/1""#).expect("product 1");
    assert!(first < second);
}

#[tokio::test]
async fn test_category_page_defaults_to_newest() {
    let server = MockServer::start_async().await;
    mock_category(
        &server,
        vec![product_json(1, "Older desk", 15, 3), product_json(2, "Newer desk", 60, 3)],
    )
    .await;

    let (status, _, body) = get(app_for(&server), "/categories/5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(card_at(&body, "Newer desk") < card_at(&body, "Older desk"));

    let (_, _, body) = get(app_for(&server), "/categories/5?sort=").await;
    assert!(card_at(&body, "Newer desk") < card_at(&body, "Older desk"));
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let server = MockServer::start_async().await;
    let (status, _, _) = get(app_for(&server), "/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Auth guards
// ============================================================================

#[tokio::test]
async fn test_account_requires_login() {
    let server = MockServer::start_async().await;
    let (status, headers, _) = get(app_for(&server), "/account/orders").await;

    assert!(status.is_redirection());
    assert_eq!(
        headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/auth/login")
    );
}

#[tokio::test]
async fn test_seller_requires_login() {
    let server = MockServer::start_async().await;
    let (status, headers, _) = get(app_for(&server), "/seller/inventory").await;

    assert!(status.is_redirection());
    assert_eq!(
        headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/auth/login")
    );
}

#[tokio::test]
async fn test_login_page_renders() {
    let server = MockServer::start_async().await;
    let (status, _, body) = get(app_for(&server), "/auth/login?next=/account/orders").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"name="next" value="/account/orders""#));
}

// ============================================================================
// Signed-in sessions
// ============================================================================

/// Mocks a successful login for user 42 with `role`.
async fn mock_login(server: &MockServer, role: &str) {
    let role = role.to_string();
    server
        .mock_async(move |when, then| {
            when.method(POST).path("/auth/login/submit");
            then.status(200).json_body(json!({
                "token": "tok-42",
                "userId": 42,
                "email": "ada@example.com",
                "userRoles": [role],
            }));
        })
        .await;
}

/// Sign in through the login form and return the session cookie.
async fn sign_in(app: axum::Router, next: &str) -> String {
    let (status, headers, _) = post_form(
        app,
        "/auth/login",
        &format!("email=ada%40example.com&password=secret&next={next}"),
        None,
    )
    .await;

    assert!(status.is_redirection());
    assert_eq!(location(&headers), Some(next));
    session_cookie(&headers).expect("session cookie")
}

#[tokio::test]
async fn test_signed_in_buyer_sees_orders() {
    let server = MockServer::start_async().await;
    mock_login(&server, "ROLE_BUYER").await;
    let orders = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/buyer/orders/user/42")
                .header("authorization", "Bearer tok-42");
            then.status(200).json_body(json!([
                {"id": 10, "status": "SHIPPED",
                 "items": [{"productId": 1, "quantity": 2, "price": 5}]},
                {"id": 11, "status": "PENDING",
                 "items": [{"productId": 2, "quantity": 1, "price": 3}]}
            ]));
        })
        .await;

    let app = app_for(&server);
    let cookie = sign_in(app.clone(), "/account/orders").await;
    let (status, _, body) = get_with_cookie(app, "/account/orders", Some(&cookie)).await;

    assert_eq!(status, StatusCode::OK);
    orders.assert_async().await;
    assert!(body.contains("ada@example.com"));
    let newest = body.find(r#"href="/account/orders/11""#).expect("order 11");
    let oldest = body.find(r#"href="/account/orders/10""#).expect("order 10");
    assert!(newest < oldest);
}

#[tokio::test]
async fn test_seller_new_product_form() {
    let server = MockServer::start_async().await;
    mock_login(&server, "ROLE_SELLER").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200)
                .json_body(json!([category_json(1, "Lighting"), category_json(2, "Desks")]));
        })
        .await;

    let app = app_for(&server);
    let cookie = sign_in(app.clone(), "/seller/products/new").await;
    let (status, _, body) = get_with_cookie(app, "/seller/products/new", Some(&cookie)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("New product"));
    assert!(body.contains(r#"action="/seller/products/new""#));
    assert!(body.contains("Lighting"));
    assert!(body.contains("Desks"));
}

#[tokio::test]
async fn test_buyer_is_kept_out_of_seller_pages() {
    let server = MockServer::start_async().await;
    mock_login(&server, "ROLE_BUYER").await;

    let app = app_for(&server);
    let cookie = sign_in(app.clone(), "/").await;
    let (status, _, body) = get_with_cookie(app, "/seller/products/new", Some(&cookie)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "This area is reserved for sellers.");
}

#[tokio::test]
async fn test_anonymous_cart_lives_in_session() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/7");
            then.status(200).json_body(product_json(7, "Desk lamp", 40, 3));
        })
        .await;

    let app = app_for(&server);
    let (status, headers, _) =
        post_form(app.clone(), "/cart/add", "product_id=7&quantity=2", None).await;
    assert!(status.is_redirection());
    assert_eq!(location(&headers), Some("/cart"));
    let cookie = session_cookie(&headers).expect("session cookie");

    let (status, _, body) = get_with_cookie(app, "/cart", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Desk lamp"));
    assert!(body.contains(r#"value="2""#));
}
