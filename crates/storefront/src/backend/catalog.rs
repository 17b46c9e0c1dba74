//! Category and public product endpoints.
//!
//! Public reads are cached; admin category writes invalidate the cache.

use shopora_core::catalog::{Category, PageResponse, Product, ProductVariant};
use shopora_core::{CategoryId, ProductId};
use tracing::instrument;

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError, NO_QUERY, PageRequest, ProductSearchParams};

/// Upper bound for featured, new-arrival, and best-seller lists.
pub const MAX_HIGHLIGHT_LIMIT: u32 = 20;
/// Upper bound for related products.
pub const MAX_RELATED_LIMIT: u32 = 10;
/// Upper bound for recommendations.
pub const MAX_RECOMMENDATION_LIMIT: u32 = 20;
/// Page size used when listing a category's products.
pub const CATEGORY_PRODUCTS_PAGE_SIZE: u32 = 50;

#[derive(serde::Serialize)]
struct Limit {
    limit: u32,
}

#[derive(serde::Serialize)]
struct NameQuery<'a> {
    name: &'a str,
}

impl ApiClient {
    // =========================================================================
    // Categories
    // =========================================================================

    /// List every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cached(&CacheKey::Categories).await {
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get_json(&["api", "category"], NO_QUERY).await?;
        self.cache(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// List top-level categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn parent_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cached(&CacheKey::ParentCategories).await
        {
            return Ok(categories);
        }

        let categories: Vec<Category> = self.get_json(&["api", "category", "parents"], NO_QUERY).await?;
        self.cache(
            CacheKey::ParentCategories,
            CacheValue::Categories(categories.clone()),
        )
        .await;
        Ok(categories)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the category does not exist.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn category(&self, id: CategoryId) -> Result<Category, ApiError> {
        let key = CacheKey::Category(id);
        if let Some(CacheValue::Category(category)) = self.cached(&key).await {
            return Ok(*category);
        }

        let category: Category = self
            .get_json(&["api", "category", &id.to_string()], NO_QUERY)
            .await?;
        self.cache(key, CacheValue::Category(Box::new(category.clone())))
            .await;
        Ok(category)
    }

    /// List the direct children of a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn subcategories(&self, id: CategoryId) -> Result<Vec<Category>, ApiError> {
        let key = CacheKey::Subcategories(id);
        if let Some(CacheValue::Categories(categories)) = self.cached(&key).await {
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .get_json(&["api", "category", &id.to_string(), "subcategories"], NO_QUERY)
            .await?;
        self.cache(key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Search categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_categories(&self, name: &str) -> Result<Vec<Category>, ApiError> {
        self.get_json(&["api", "category", "search"], &NameQuery { name })
            .await
    }

    /// Create a category (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the caller is not an admin.
    #[instrument(skip(self, category))]
    pub async fn create_category(&self, category: &CategoryRequest) -> Result<Category, ApiError> {
        let created = self.post_json(&["admin", "category"], category).await?;
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Update a category (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the caller is not an admin.
    #[instrument(skip(self, category), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        category: &CategoryRequest,
    ) -> Result<Category, ApiError> {
        let updated = self
            .put_json(&["admin", "category", &id.to_string()], category)
            .await?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a category (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the caller is not an admin.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
        self.send_empty(
            reqwest::Method::DELETE,
            &["admin", "category", &id.to_string()],
            NO_QUERY,
        )
        .await?;
        self.invalidate_cache().await;
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// One page of all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, page: PageRequest) -> Result<PageResponse<Product>, ApiError> {
        self.get_json(&["api", "v1", "products"], &page).await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            return Ok(*product);
        }

        let product: Product = self
            .get_json(&["api", "v1", "products", &id.to_string()], NO_QUERY)
            .await?;
        self.cache(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Variants of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product_variants(&self, id: ProductId) -> Result<Vec<ProductVariant>, ApiError> {
        self.get_json(&["api", "v1", "products", &id.to_string(), "variants"], NO_QUERY)
            .await
    }

    /// Featured products (at most 20).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let limit = limit.clamp(1, MAX_HIGHLIGHT_LIMIT);
        self.cached_products(CacheKey::Featured(limit), "featured", limit)
            .await
    }

    /// Newest products (at most 20).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn new_arrivals(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let limit = limit.clamp(1, MAX_HIGHLIGHT_LIMIT);
        self.cached_products(CacheKey::NewArrivals(limit), "new-arrivals", limit)
            .await
    }

    /// Best-selling products (at most 20).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn best_sellers(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let limit = limit.clamp(1, MAX_HIGHLIGHT_LIMIT);
        self.cached_products(CacheKey::BestSellers(limit), "best-sellers", limit)
            .await
    }

    async fn cached_products(
        &self,
        key: CacheKey,
        endpoint: &str,
        limit: u32,
    ) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            return Ok(products);
        }

        let products: Vec<Product> = self
            .get_json(&["api", "v1", "products", endpoint], &Limit { limit })
            .await?;
        self.cache(key, CacheValue::Products(products.clone())).await;
        Ok(products)
    }

    /// Products currently on sale.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn on_sale_products(&self, page: PageRequest) -> Result<PageResponse<Product>, ApiError> {
        self.get_json(&["api", "v1", "products", "on-sale"], &page).await
    }

    /// Products related to the given one (at most 10).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn related_products(&self, id: ProductId, limit: u32) -> Result<Vec<Product>, ApiError> {
        let limit = limit.clamp(1, MAX_RELATED_LIMIT);
        self.get_json(
            &["api", "v1", "products", &id.to_string(), "related"],
            &Limit { limit },
        )
        .await
    }

    /// Personalized recommendations for the current token (at most 20).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn recommendations(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let limit = limit.clamp(1, MAX_RECOMMENDATION_LIMIT);
        self.get_json(&["api", "v1", "products", "recommendations"], &Limit { limit })
            .await
    }

    /// Products in a category (first page of 50).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn products_by_category(&self, id: CategoryId) -> Result<Vec<Product>, ApiError> {
        let page: PageResponse<Product> = self
            .get_json(
                &["api", "v1", "products", "category", &id.to_string()],
                &PageRequest::new(0, CATEGORY_PRODUCTS_PAGE_SIZE),
            )
            .await?;
        Ok(page.content)
    }

    /// Search products by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, name: &str) -> Result<Vec<Product>, ApiError> {
        let params = ProductSearchParams {
            name: Some(name.to_string()),
            ..ProductSearchParams::default()
        };
        self.advanced_search(&params).await
    }

    /// Search products with server-side filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn advanced_search(&self, params: &ProductSearchParams) -> Result<Vec<Product>, ApiError> {
        let page: PageResponse<Product> = self
            .get_json(&["api", "v1", "products", "search"], params)
            .await?;
        Ok(page.content)
    }
}

/// Create/update body for a category.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
