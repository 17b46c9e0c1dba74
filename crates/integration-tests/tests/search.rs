//! Integration tests for unified search.

use httpmock::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use shopora_core::catalog::{ListingFilter, SortKey};
use shopora_integration_tests::{category_json, client_for, page_json, product_json};
use shopora_storefront::search::{self, SearchRequest, SearchScope};

fn request(query: &str, scope: SearchScope) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        filter: ListingFilter::default(),
        sort: SortKey::default(),
        scope,
        page_size: 12,
    }
}

#[tokio::test]
async fn test_category_failure_keeps_product_hits() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/products/search")
                .query_param("name", "lamp");
            then.status(200).json_body(page_json(vec![
                product_json(1, "Desk lamp", 40, 2),
                product_json(2, "Floor lamp", 90, 0),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/search");
            then.status(500);
        })
        .await;

    let results = search::unified_search(&client_for(&server), &request("lamp", SearchScope::All)).await;

    assert_eq!(results.products.items().len(), 2);
    assert!(results.categories.is_failed());
    assert_eq!(results.total(), 2);
}

#[tokio::test]
async fn test_product_failure_keeps_category_hits() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/search");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/category/search")
                .query_param("name", "lamp");
            then.status(200).json_body(json!([category_json(4, "Lamps")]));
        })
        .await;

    let results = search::unified_search(&client_for(&server), &request("lamp", SearchScope::All)).await;

    assert!(results.products.is_failed());
    assert_eq!(results.categories.items()[0].name, "Lamps");
}

#[tokio::test]
async fn test_product_scope_skips_categories() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/search");
            then.status(200)
                .json_body(page_json(vec![product_json(1, "Desk lamp", 40, 2)]));
        })
        .await;
    let categories = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/search");
            then.status(200).json_body(json!([]));
        })
        .await;

    let results =
        search::unified_search(&client_for(&server), &request("lamp", SearchScope::Products)).await;

    assert_eq!(results.products.items().len(), 1);
    assert!(results.categories.is_empty());
    categories.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_search_applies_price_filter() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/search");
            then.status(200).json_body(page_json(vec![
                product_json(1, "Desk lamp", 40, 2),
                product_json(2, "Floor lamp", 90, 1),
            ]));
        })
        .await;

    let mut request = request("lamp", SearchScope::Products);
    request.filter.max_price = Some(Decimal::from(50));

    let results = search::unified_search(&client_for(&server), &request).await;

    let names: Vec<_> = results.products.items().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Desk lamp"]);
}

#[tokio::test]
async fn test_suggestions_merge_unique_names() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/products/search");
            then.status(200).json_body(page_json(vec![
                product_json(1, "Lamps", 40, 2),
                product_json(2, "Desk lamp", 90, 1),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/category/search");
            then.status(200).json_body(json!([category_json(4, "Lamps")]));
        })
        .await;

    let names = search::suggestions(&client_for(&server), "lam", 5).await;

    assert_eq!(names, vec!["Lamps".to_string(), "Desk lamp".to_string()]);
}

#[tokio::test]
async fn test_short_query_has_no_suggestions() {
    let server = MockServer::start_async().await;
    let names = search::suggestions(&client_for(&server), "l", 5).await;
    assert!(names.is_empty());
}
