//! Cache types for public catalog responses.

use shopora_core::catalog::{Category, Product};
use shopora_core::{CategoryId, ProductId};

/// Cache key for categories and products.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    ParentCategories,
    Category(CategoryId),
    Subcategories(CategoryId),
    Product(ProductId),
    Featured(u32),
    NewArrivals(u32),
    BestSellers(u32),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Category(Box<Category>),
    Categories(Vec<Category>),
    Product(Box<Product>),
    Products(Vec<Product>),
}
