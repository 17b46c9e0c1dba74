//! Seller endpoints: product management, inventory, orders, dashboard.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use shopora_core::catalog::{PageResponse, Product};
use shopora_core::{OrderId, OrderStatus, ProductId};
use tracing::instrument;

use super::{
    ApiClient, ApiError, FulfillmentRequest, ImageUpload, InventoryItem, LowStockAlert, NO_QUERY,
    Order, OrderStatusUpdate, PageRequest, PriceUpdate, QuantityUpdate, SellerDashboardStats,
    SellerOrderFilters, SellerProductRequest, StockUpdate,
};

/// Page query with an optional free-text search.
#[derive(serde::Serialize)]
struct SearchPage<'a> {
    page: u32,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SellerOrderQuery<'a> {
    page: u32,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<ProductId>,
}

/// Build the multipart body for a product create/update: the product as a
/// JSON part named `product`, then one `images` part per upload.
fn product_form(product: &SellerProductRequest, images: &[ImageUpload]) -> Result<Form, ApiError> {
    let json = serde_json::to_string(product)?;
    let mut form = Form::new().part("product", Part::text(json).mime_str("application/json")?);

    for image in images {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        form = form.part("images", part);
    }

    Ok(form)
}

impl ApiClient {
    // =========================================================================
    // Products
    // =========================================================================

    /// The seller's own products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn seller_products(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<PageResponse<Product>, ApiError> {
        self.get_json(
            &["seller", "v1", "products", "all-seller-products"],
            &SearchPage {
                page: page.page,
                size: page.size,
                search,
            },
        )
        .await
    }

    /// Create a product with images.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the product.
    #[instrument(skip(self, product, images), fields(name = %product.name, images = images.len()))]
    pub async fn create_product(
        &self,
        product: &SellerProductRequest,
        images: &[ImageUpload],
    ) -> Result<Product, ApiError> {
        let form = product_form(product, images)?;
        let created = self
            .send_multipart(Method::POST, &["seller", "v1", "products"], form)
            .await?;
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Replace a product and upload additional images.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the product.
    #[instrument(skip(self, product, images), fields(product_id = %id, images = images.len()))]
    pub async fn update_product(
        &self,
        id: ProductId,
        product: &SellerProductRequest,
        images: &[ImageUpload],
    ) -> Result<Product, ApiError> {
        let form = product_form(product, images)?;
        let updated = self
            .send_multipart(Method::PUT, &["seller", "v1", "products", &id.to_string()], form)
            .await?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
        self.send_empty(
            Method::DELETE,
            &["seller", "v1", "products", &id.to_string()],
            NO_QUERY,
        )
        .await?;
        self.invalidate_cache().await;
        Ok(())
    }

    /// Set the stock quantity of a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the quantity is rejected.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_quantity(&self, id: ProductId, quantity: i64) -> Result<Product, ApiError> {
        let updated = self
            .patch_json(
                &["seller", "v1", "products", &id.to_string(), "quantity"],
                &QuantityUpdate { quantity },
            )
            .await?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Set the base price of a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the price is rejected.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn update_product_price(
        &self,
        id: ProductId,
        price: rust_decimal::Decimal,
    ) -> Result<Product, ApiError> {
        let updated = self
            .patch_json(
                &["seller", "v1", "products", &id.to_string(), "price"],
                &PriceUpdate { price },
            )
            .await?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Orders containing the seller's products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, filters))]
    pub async fn seller_orders(
        &self,
        page: PageRequest,
        filters: &SellerOrderFilters,
    ) -> Result<PageResponse<Order>, ApiError> {
        let query = SellerOrderQuery {
            page: page.page,
            size: page.size,
            status: filters.status,
            date_from: filters.date_from.as_deref(),
            date_to: filters.date_to.as_deref(),
            product_id: filters.product_id,
        };
        self.get_json(&["seller", "orders"], &query).await
    }

    /// One order, as seen by the seller.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn seller_order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.get_json(&["seller", "orders", &id.to_string()], NO_QUERY)
            .await
    }

    /// Advance an order's status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the transition is not allowed.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_seller_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.put_json(
            &["seller", "orders", &id.to_string(), "status"],
            &OrderStatusUpdate { status },
        )
        .await
    }

    /// Mark an order fulfilled with optional carrier details.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, fulfillment), fields(order_id = %id))]
    pub async fn fulfill_order(
        &self,
        id: OrderId,
        fulfillment: &FulfillmentRequest,
    ) -> Result<Order, ApiError> {
        self.post_json(&["seller", "orders", &id.to_string(), "fulfill"], fulfillment)
            .await
    }

    // =========================================================================
    // Dashboard & inventory
    // =========================================================================

    /// Headline numbers for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<SellerDashboardStats, ApiError> {
        self.get_json(&["seller", "dashboard", "stats"], NO_QUERY)
            .await
    }

    /// Stock levels for the seller's products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn inventory(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<PageResponse<InventoryItem>, ApiError> {
        self.get_json(
            &["seller", "inventory"],
            &SearchPage {
                page: page.page,
                size: page.size,
                search,
            },
        )
        .await
    }

    /// Set a product's stock level, recording why.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the quantity is rejected.
    #[instrument(skip(self, update), fields(product_id = %id, quantity = update.quantity))]
    pub async fn update_stock(&self, id: ProductId, update: &StockUpdate) -> Result<(), ApiError> {
        self.send_json_empty(
            Method::POST,
            &["seller", "inventory", &id.to_string(), "update-stock"],
            update,
        )
        .await?;
        self.invalidate_cache().await;
        Ok(())
    }

    /// Set the low-stock alert threshold for a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the threshold is rejected.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_low_stock_alert(&self, id: ProductId, threshold: i64) -> Result<(), ApiError> {
        self.send_json_empty(
            Method::POST,
            &["seller", "inventory", &id.to_string(), "low-stock-alert"],
            &LowStockAlert { threshold },
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shopora_core::CategoryId;

    fn product() -> SellerProductRequest {
        SellerProductRequest {
            name: "Lamp".to_string(),
            description: None,
            price: Decimal::from(20),
            offer_price: None,
            quantity: 3,
            category_id: CategoryId::new(1),
            brand: None,
            product_status: "ACTIVE".to_string(),
            product_sell_type: "DIRECT".to_string(),
            product_condition: "NEW".to_string(),
        }
    }

    #[test]
    fn test_product_form_accepts_images() {
        let images = vec![ImageUpload {
            file_name: "lamp.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        }];
        assert!(product_form(&product(), &images).is_ok());
    }

    #[test]
    fn test_product_form_rejects_bad_mime() {
        let images = vec![ImageUpload {
            file_name: "lamp.png".to_string(),
            content_type: "not a mime type".to_string(),
            bytes: vec![1],
        }];
        assert!(matches!(
            product_form(&product(), &images),
            Err(ApiError::Http(_))
        ));
    }
}
