//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use shopora_core::catalog::{self, Product, ProductVariant, SortKey, image::is_valid_base64};
use shopora_core::{CurrencyCode, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::views::{CategoryCard, ListingQuery, PageContext, ProductCard, SortOption, sort_options};
use crate::backend::{Fetched, PageRequest};
use crate::error::{Result, not_found_as};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Related products shown under a product.
const RELATED_LIMIT: u32 = 4;

/// Pagination query parameters (1-based).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

impl PaginationQuery {
    #[must_use]
    pub fn current(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Full product display data for the detail page.
pub struct ProductDetail {
    pub card: ProductCard,
    pub description: Option<String>,
    pub gallery: Vec<String>,
    pub quantity: i64,
    pub condition: Option<String>,
    pub warranty: Option<String>,
    pub variants: Vec<VariantView>,
}

/// Variant display data for templates.
pub struct VariantView {
    pub name: String,
    pub value: String,
    pub price: Option<String>,
    pub in_stock: bool,
}

impl VariantView {
    fn new(variant: &ProductVariant, currency: CurrencyCode) -> Self {
        Self {
            name: variant.variant_name.clone(),
            value: variant.variant_value.clone(),
            price: variant.price.map(|p| currency.format(p)),
            in_stock: variant.quantity.is_none_or(|q| q > 0),
        }
    }
}

impl ProductDetail {
    fn new(product: &Product, variants: &[ProductVariant], currency: CurrencyCode) -> Self {
        Self {
            card: ProductCard::new(product, currency),
            description: product.description.clone(),
            gallery: gallery(product),
            quantity: product.quantity,
            condition: product.product_condition.clone(),
            warranty: product.warranty.clone(),
            variants: variants.iter().map(|v| VariantView::new(v, currency)).collect(),
        }
    }
}

/// Every valid inline image, in display order.
fn gallery(product: &Product) -> Vec<String> {
    let mut attaches: Vec<_> = product
        .image_attaches
        .iter()
        .filter(|a| is_valid_base64(&a.file_content))
        .collect();
    attaches.sort_by_key(|a| a.display_order.unwrap_or(i64::MAX));
    attaches
        .into_iter()
        .map(|a| format!("data:{};base64,{}", a.content_type, a.file_content))
        .collect()
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub products: Fetched<Vec<ProductCard>>,
    pub categories: Fetched<Vec<CategoryCard>>,
    pub sort_options: Vec<SortOption>,
    pub query: ListingQuery,
    pub current_page: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductDetail,
    pub related_products: Fetched<Vec<ProductCard>>,
}

/// Display product listing page.
#[instrument(skip(state, session, user, listing))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(pagination): Query<PaginationQuery>,
    Query(listing): Query<ListingQuery>,
) -> impl IntoResponse {
    let backend = state.backend();
    let config = state.config();
    let current_page = pagination.current();

    let (page, categories) = tokio::join!(
        backend.products(PageRequest::new(current_page - 1, config.page_size)),
        backend.categories(),
    );

    let (has_previous, has_next) = page
        .as_ref()
        .map_or((current_page > 1, false), |p| (p.has_previous(), p.has_next()));

    let filter = listing.filter();
    let sort = listing.sort_or(SortKey::Relevance);
    let products = Fetched::from_list(page.map(|p| catalog::apply(&p.content, &filter, sort)))
        .map(|p| ProductCard::list(&p, config.currency));

    ProductsIndexTemplate {
        ctx: PageContext::load(&session, user.as_ref()).await,
        products,
        categories: Fetched::from_list(categories).map(|c| CategoryCard::list(&c)),
        sort_options: sort_options(sort),
        query: listing,
        current_page,
        has_previous,
        has_next,
    }
}

/// Display product detail page.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, session, user), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let backend = state.backend();
    let currency = state.config().currency;

    let (product, variants, related) = tokio::join!(
        backend.product(id),
        backend.product_variants(id),
        backend.related_products(id, RELATED_LIMIT),
    );

    let product = product.map_err(not_found_as(format!("product {id}")))?;

    // The variants endpoint is optional; fall back to embedded variants
    let variants = variants.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "variants unavailable, using embedded list");
        product.variants.clone()
    });

    Ok(ProductShowTemplate {
        ctx: PageContext::load(&session, user.as_ref()).await,
        product: ProductDetail::new(&product, &variants, currency),
        related_products: ProductCard::fetched(related, currency),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shopora_core::catalog::ProductImageAttach;
    use shopora_core::ImageId;

    fn attach(id: i64, content: &str, order: Option<i64>) -> ProductImageAttach {
        ProductImageAttach {
            id: Some(ImageId::new(id)),
            file_name: Some(format!("{id}.png")),
            file_content: content.to_string(),
            content_type: "image/png".to_string(),
            display_order: order,
            primary: false,
        }
    }

    #[test]
    fn test_gallery_orders_and_skips_invalid() {
        let mut product = Product::new(1, "Lamp", Decimal::from(10));
        product.image_attaches = vec![
            attach(1, "QUJD", Some(2)),
            attach(2, "not base64!", Some(0)),
            attach(3, "REVG", Some(1)),
        ];
        assert_eq!(
            gallery(&product),
            vec![
                "data:image/png;base64,REVG".to_string(),
                "data:image/png;base64,QUJD".to_string(),
            ]
        );
    }

    #[test]
    fn test_pagination_is_one_based() {
        assert_eq!(PaginationQuery { page: None }.current(), 1);
        assert_eq!(PaginationQuery { page: Some(0) }.current(), 1);
        assert_eq!(PaginationQuery { page: Some(3) }.current(), 3);
    }
}
