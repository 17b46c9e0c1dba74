//! Unified product and category search.
//!
//! Products and categories are fetched concurrently and reported
//! independently: a failed category lookup never hides product hits, and
//! vice versa. Product hits go through the same filter/sort pipeline as every
//! other listing.

use std::collections::HashSet;

use shopora_core::catalog::{self, Category, ListingFilter, Product, SortKey};
use tracing::instrument;

use crate::backend::{ApiClient, Fetched, ProductSearchParams};

/// Minimum query length for suggestions.
pub const MIN_SUGGEST_LEN: usize = 2;

/// What a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    All,
    Products,
    Categories,
}

impl SearchScope {
    /// Parse a `scope` query value; unknown values search everything.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "products" | "product" => Self::Products,
            "categories" | "category" => Self::Categories,
            _ => Self::All,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Products => "products",
            Self::Categories => "categories",
        }
    }

    const fn includes_products(self) -> bool {
        matches!(self, Self::All | Self::Products)
    }

    const fn includes_categories(self) -> bool {
        matches!(self, Self::All | Self::Categories)
    }
}

/// A search as submitted from the search page.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub filter: ListingFilter,
    pub sort: SortKey,
    pub scope: SearchScope,
    /// Page size for the server-side search used when the query is empty.
    pub page_size: u32,
}

/// Independently classified product and category results.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub products: Fetched<Vec<Product>>,
    pub categories: Fetched<Vec<Category>>,
}

impl SearchResults {
    /// Total hits across both result sets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.products.items().len() + self.categories.items().len()
    }
}

/// Server-side parameters for an empty-query search.
fn server_params(request: &SearchRequest) -> ProductSearchParams {
    let category_id = if request.filter.category_ids.len() == 1 {
        request.filter.category_ids.iter().next().copied()
    } else {
        None
    };

    ProductSearchParams {
        name: None,
        category_id,
        min_price: request.filter.min_price,
        max_price: request.filter.max_price,
        page: Some(0),
        size: (request.page_size > 0).then_some(request.page_size),
        sort: None,
    }
}

/// Run product and category search concurrently.
///
/// Never fails: each result set carries its own outcome.
#[instrument(skip(client, request), fields(query = %request.query, scope = request.scope.as_str()))]
pub async fn unified_search(client: &ApiClient, request: &SearchRequest) -> SearchResults {
    let query = request.query.trim();

    let products = async {
        if !request.scope.includes_products() {
            return Fetched::Empty;
        }
        let result = if query.is_empty() {
            client.advanced_search(&server_params(request)).await
        } else {
            client.search_products(query).await
        };
        Fetched::from_list(result.map(|hits| catalog::apply(&hits, &request.filter, request.sort)))
    };

    let categories = async {
        if !request.scope.includes_categories() || query.is_empty() {
            return Fetched::Empty;
        }
        Fetched::from_list(client.search_categories(query).await)
    };

    let (products, categories) = tokio::join!(products, categories);

    tracing::debug!(
        products = products.items().len(),
        categories = categories.items().len(),
        products_failed = products.is_failed(),
        categories_failed = categories.is_failed(),
        "search completed"
    );

    SearchResults {
        products,
        categories,
    }
}

/// Up to `limit` unique product and category names matching `query`.
///
/// Queries shorter than two characters return nothing; failures are logged
/// and yield whatever the other lookup found.
#[instrument(skip(client))]
pub async fn suggestions(client: &ApiClient, query: &str, limit: usize) -> Vec<String> {
    let query = query.trim();
    if query.chars().count() < MIN_SUGGEST_LEN || limit == 0 {
        return Vec::new();
    }

    let (products, categories) = tokio::join!(
        client.search_products(query),
        client.search_categories(query)
    );

    let products = products.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "product suggestions failed");
        Vec::new()
    });
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "category suggestions failed");
        Vec::new()
    });

    unique_names(
        products
            .into_iter()
            .map(|p| p.name)
            .chain(categories.into_iter().map(|c| c.name)),
        limit,
    )
}

/// Keep the first occurrence of each name (case-insensitive), up to `limit`.
fn unique_names(names: impl Iterator<Item = String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
        .take(limit)
        .collect()
}
