//! Catalog types and the product display engine.
//!
//! Everything here is pure: given data already fetched from the backend it
//! decides which image to show, which price to show, and in which order
//! products appear.

pub mod image;
pub mod listing;
pub mod model;
pub mod pricing;

pub use image::{ImageOrigin, ImageSource, ResolvedImage, placeholder_image, resolve_image};
pub use listing::{ListingFilter, SortKey, apply};
pub use model::{Category, PageResponse, Product, ProductImageAttach, ProductVariant};
pub use pricing::{PriceDisplay, display_price};
