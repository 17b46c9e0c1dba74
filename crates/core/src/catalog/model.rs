//! Catalog data transferred from the backend.
//!
//! The backend owns these entities; the storefront only reads them. Field
//! names follow the backend's camelCase JSON. Optional wire fields are
//! `Option` or defaulted so partial payloads still deserialize.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, CompanyId, ImageId, ProductId, UserId, VariantId};

/// A product as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub offer_price: Option<Decimal>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
    /// Discount percentage; older payloads call it `discountPercentage`.
    #[serde(default, alias = "discountPercentage")]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_attaches: Vec<ProductImageAttach>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub product_status: Option<String>,
    #[serde(default)]
    pub product_condition: Option<String>,
    #[serde(default)]
    pub warranty: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Product {
    /// Minimal product used by tests and fixtures.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            description: None,
            price,
            offer_price: None,
            quantity: 0,
            category_id: None,
            category_name: None,
            brand: None,
            company_id: None,
            seller_id: None,
            discount: None,
            image_url: None,
            image_attaches: Vec::new(),
            variants: Vec::new(),
            featured: false,
            trending: false,
            active: None,
            product_status: None,
            product_condition: None,
            warranty: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// An image stored inline on a product as base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageAttach {
    #[serde(default)]
    pub id: Option<ImageId>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_content: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub display_order: Option<i64>,
    #[serde(default)]
    pub primary: bool,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    #[serde(default)]
    pub variant_name: String,
    #[serde(default)]
    pub variant_value: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// A catalog category, possibly with nested subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub subcategories: Vec<Category>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_content: Option<String>,
    #[serde(default)]
    pub image_content_type: Option<String>,
    #[serde(default)]
    pub product_count: Option<i64>,
}

impl Category {
    /// Minimal category used by tests and fixtures.
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(id),
            name: name.into(),
            description: None,
            parent_id: None,
            subcategories: Vec::new(),
            image_url: None,
            image_content: None,
            image_content_type: None,
            product_count: None,
        }
    }

    /// Top-level categories have no parent.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Spring-style page envelope used by paginated endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: i64,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub size: i64,
    /// Zero-based page index.
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

impl<T> PageResponse<T> {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_accepts_discount_percentage_alias() {
        let json = r#"{"id": 1, "name": "Lamp", "price": 100, "discountPercentage": 20}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.discount, Some(Decimal::from(20)));
        assert!(product.image_attaches.is_empty());
        assert_eq!(product.category_id, None);
    }

    #[test]
    fn test_product_full_payload() {
        let json = r#"{
            "id": 7,
            "name": "Chair",
            "price": 49.9,
            "offerPrice": 39.9,
            "quantity": 3,
            "categoryId": 2,
            "imageAttaches": [
                {"fileContent": "aGVsbG8=", "contentType": "image/png", "primary": true, "displayOrder": 1}
            ],
            "createdAt": "2024-03-01T10:00:00"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.offer_price, Some(Decimal::new(399, 1)));
        assert_eq!(product.category_id, Some(CategoryId::new(2)));
        assert_eq!(product.image_attaches.len(), 1);
        assert!(product.in_stock());
    }

    #[test]
    fn test_category_tree_deserializes() {
        let json = r#"{"id": 1, "name": "Home", "subcategories": [{"id": 2, "name": "Kitchen", "parentId": 1}]}"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert!(category.is_root());
        assert_eq!(category.subcategories.first().unwrap().parent_id, Some(CategoryId::new(1)));
    }

    #[test]
    fn test_page_navigation() {
        let page: PageResponse<Product> =
            serde_json::from_str(r#"{"content": [], "totalPages": 3, "number": 1}"#).unwrap();
        assert!(page.has_next());
        assert!(page.has_previous());
    }
}
