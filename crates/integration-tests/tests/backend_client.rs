//! Integration tests for the backend REST client.
//!
//! Each test starts its own mock backend, so they run in parallel without
//! sharing state.

use httpmock::prelude::*;
use serde_json::json;
use secrecy::SecretString;
use shopora_core::{CartItemId, OrderId, ProductId, ReturnRequestId};
use shopora_integration_tests::{category_json, client_for, product_json};
use shopora_storefront::backend::{ApiError, Fetched};

// ============================================================================
// Status mapping
// ============================================================================

#[tokio::test]
async fn test_product_fetch_parses_backend_json() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/7");
            then.status(200).json_body(product_json(7, "Desk lamp", 40, 3));
        })
        .await;

    let product = client_for(&server)
        .product(ProductId::new(7))
        .await
        .expect("product");

    assert_eq!(product.name, "Desk lamp");
    assert_eq!(product.quantity, 3);
}

#[tokio::test]
async fn test_missing_product_maps_to_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/404");
            then.status(404).json_body(json!({ "message": "Product not found" }));
        })
        .await;

    let err = client_for(&server)
        .product(ProductId::new(404))
        .await
        .expect_err("missing product");

    assert!(err.is_not_found(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_forbidden_maps_to_unauthorized() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(403);
        })
        .await;

    let err = client_for(&server).categories().await.expect_err("forbidden");
    assert!(matches!(err, ApiError::Unauthorized), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_bad_request_carries_backend_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(400)
                .json_body(json!({ "message": "Category name is required" }));
        })
        .await;

    let err = client_for(&server).categories().await.expect_err("bad request");
    match err {
        ApiError::Validation(message) => assert_eq!(message, "Category name is required"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(429).header("Retry-After", "7");
        })
        .await;

    let err = client_for(&server).categories().await.expect_err("rate limited");
    assert!(matches!(err, ApiError::RateLimited(7)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(502).body("upstream down");
        })
        .await;

    let err = client_for(&server).categories().await.expect_err("server error");
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(
        ApiError::Status {
            status: 502,
            message: String::new()
        }
        .user_message(),
        "The service is temporarily unavailable."
    );
}

// ============================================================================
// Caching
// ============================================================================

#[tokio::test]
async fn test_categories_are_cached() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200)
                .json_body(json!([category_json(1, "Lighting"), category_json(2, "Desks")]));
        })
        .await;

    let client = client_for(&server);
    let first = client.categories().await.expect("first fetch");
    let second = client.categories().await.expect("second fetch");

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalidate_cache_refetches() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200).json_body(json!([category_json(1, "Lighting")]));
        })
        .await;

    let client = client_for(&server);
    client.categories().await.expect("first fetch");
    client.invalidate_cache().await;
    client.categories().await.expect("second fetch");

    mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let server = MockServer::start_async().await;
    let mut failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(500);
        })
        .await;

    let client = client_for(&server);
    assert!(client.categories().await.is_err());

    failing.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200).json_body(json!([category_json(3, "Chairs")]));
        })
        .await;

    let categories = client.categories().await.expect("recovered fetch");
    assert_eq!(categories[0].name, "Chairs");
}

// ============================================================================
// Optional sub-resources
// ============================================================================

#[tokio::test]
async fn test_missing_shipping_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/buyer/orders/12/details/shipping");
            then.status(404);
        })
        .await;

    let shipping = client_for(&server)
        .order_shipping(OrderId::new(12))
        .await
        .expect("404 is not an error here");

    assert!(shipping.is_none());
}

#[tokio::test]
async fn test_fetched_classifies_outcomes() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200).json_body(json!([]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/parents");
            then.status(503);
        })
        .await;

    let client = client_for(&server);
    let empty = Fetched::from_list(client.categories().await);
    let failed = Fetched::from_list(client.parent_categories().await);

    assert!(empty.is_empty());
    assert_eq!(
        failed.failure(),
        Some("The service is temporarily unavailable.")
    );
}

// ============================================================================
// Token scoping and mutations
// ============================================================================

#[tokio::test]
async fn test_scoped_client_sends_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/buyer/post-order/refund/5")
                .header("authorization", "Bearer buyer-token");
            then.status(200).json_body(json!({ "id": 9, "amount": 25, "returnRequestId": 5 }));
        })
        .await;

    let refund = client_for(&server)
        .with_token(&SecretString::from("buyer-token"))
        .process_refund(ReturnRequestId::new(5))
        .await
        .expect("refund");

    assert_eq!(refund.id, 9);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_highlight_limits_are_clamped() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/products/recommendations")
                .query_param("limit", "20");
            then.status(200).json_body(json!([]));
        })
        .await;

    let products = client_for(&server)
        .recommendations(500)
        .await
        .expect("recommendations");

    assert!(products.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_seller_mutation_invalidates_catalog_cache() {
    let server = MockServer::start_async().await;
    let categories = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category");
            then.status(200).json_body(json!([category_json(1, "Lighting")]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PATCH).path("/seller/v1/products/7/quantity");
            then.status(200).json_body(product_json(7, "Desk lamp", 40, 12));
        })
        .await;

    let client = client_for(&server).with_token(&SecretString::from("seller-token"));
    client.categories().await.expect("warm cache");
    let updated = client
        .update_product_quantity(ProductId::new(7), 12)
        .await
        .expect("quantity update");
    client.categories().await.expect("refetch");

    assert_eq!(updated.quantity, 12);
    categories.assert_calls_async(2).await;
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_missing_cart_reads_as_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/buyer/v1/cart");
            then.status(404);
        })
        .await;

    let cart = client_for(&server)
        .with_token(&SecretString::from("buyer-token"))
        .cart(shopora_storefront::backend::PageRequest::new(0, 50))
        .await
        .expect("404 is an empty cart");

    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn test_cart_mutations_hit_expected_endpoints() {
    let server = MockServer::start_async().await;
    let add = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/buyer/v1/cart/add")
                .json_body(json!({ "productId": 7, "quantity": 2 }));
            then.status(200).json_body(json!({
                "id": 1,
                "items": [{ "id": 70, "productId": 7, "price": 10, "quantity": 2 }]
            }));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/buyer/v1/cart/update/70")
                .query_param("quantity", "5");
            then.status(200).json_body(json!({
                "id": 1,
                "items": [{ "id": 70, "productId": 7, "price": 10, "quantity": 5 }]
            }));
        })
        .await;
    let coupon = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/buyer/v1/cart/apply-coupon")
                .query_param("couponIdentifier", "SPRING");
            then.status(200).json_body(json!({ "code": "SPRING", "discount": 5 }));
        })
        .await;

    let buyer = client_for(&server).with_token(&SecretString::from("buyer-token"));
    let added = buyer.add_to_cart(ProductId::new(7), 2).await.expect("add");
    let updated = buyer
        .update_cart_item(CartItemId::new(70), 5)
        .await
        .expect("update");
    let applied = buyer.apply_coupon("SPRING").await.expect("coupon");

    assert_eq!(added.item_count(), 2);
    assert_eq!(updated.item_count(), 5);
    assert_eq!(applied.code, "SPRING");
    add.assert_async().await;
    update.assert_async().await;
    coupon.assert_async().await;
}
