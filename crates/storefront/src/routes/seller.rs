//! Seller dashboard route handlers.
//!
//! Every route here requires a seller role; backend calls carry the seller's
//! token.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shopora_core::catalog::Product;
use shopora_core::{CategoryId, CurrencyCode, OrderId, OrderStatus, ProductId, ReturnRequestId};
use tower_sessions::Session;
use tracing::instrument;
use validator::{Validate, ValidationError};

use super::account::ReturnView;
use super::companies;
use super::products::PaginationQuery;
use super::views::{CategoryCard, FieldErrors, OrderView, PageContext, ProductCard, blank_as_none};
use crate::backend::{
    Fetched, FulfillmentRequest, ImageUpload, InventoryItem, PageRequest, SellerDashboardStats,
    SellerOrderFilters, SellerProductRequest, StockUpdate,
};
use crate::error::{AppError, Result, add_breadcrumb, not_found_as};
use crate::filters;
use crate::middleware::{RequireSeller, set_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Images accepted per product.
const MAX_IMAGES: usize = 5;

/// Size limit per image.
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

// =============================================================================
// View models
// =============================================================================

/// Dashboard headline numbers, formatted.
pub struct DashboardView {
    pub total_products: i64,
    pub active_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_revenue: String,
    pub monthly_revenue: String,
    pub average_order_value: String,
    pub top_products: Vec<TopProductView>,
    pub recent_orders: Vec<OrderView>,
}

pub struct TopProductView {
    pub id: i64,
    pub name: String,
    pub sold: i64,
    pub revenue: String,
}

impl DashboardView {
    fn new(stats: &SellerDashboardStats, currency: CurrencyCode) -> Self {
        Self {
            total_products: stats.total_products,
            active_products: stats.active_products,
            total_orders: stats.total_orders,
            pending_orders: stats.pending_orders,
            total_revenue: currency.format(stats.total_revenue),
            monthly_revenue: currency.format(stats.monthly_revenue),
            average_order_value: currency.format(stats.average_order_value),
            top_products: stats
                .top_selling_products
                .iter()
                .map(|p| TopProductView {
                    id: p.id.as_i64(),
                    name: p.name.clone(),
                    sold: p.sold_quantity,
                    revenue: currency.format(p.revenue),
                })
                .collect(),
            recent_orders: OrderView::list(&stats.recent_orders, currency),
        }
    }
}

/// A row of the seller's product table.
pub struct SellerProductRow {
    pub card: ProductCard,
    pub quantity: i64,
    pub status: Option<String>,
}

/// A row of the inventory table.
pub struct InventoryRow {
    pub product_id: i64,
    pub name: String,
    pub current: i64,
    pub reserved: i64,
    pub available: i64,
    pub threshold: i64,
    pub low: bool,
    pub last_updated: Option<String>,
}

impl From<&InventoryItem> for InventoryRow {
    fn from(item: &InventoryItem) -> Self {
        Self {
            product_id: item.product_id.as_i64(),
            name: item.product_name.clone(),
            current: item.current_stock,
            reserved: item.reserved_stock,
            available: item.available_stock,
            threshold: item.low_stock_threshold,
            low: item.is_low_stock || item.available_stock <= item.low_stock_threshold,
            last_updated: item.last_updated.clone(),
        }
    }
}

/// An order status choice for `<select>` menus.
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn status_options(current: Option<OrderStatus>) -> Vec<StatusOption> {
    OrderStatus::SELLER_TRANSITIONS
        .iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: Some(*status) == current,
        })
        .collect()
}

/// Previous/next page links.
pub struct Pager {
    pub current: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pager {
    fn new<T>(current: u32, page: Option<&shopora_core::catalog::PageResponse<T>>) -> Self {
        let (has_previous, has_next) =
            page.map_or((current > 1, false), |p| (p.has_previous(), p.has_next()));
        Self {
            current,
            has_previous,
            has_next,
        }
    }
}

// =============================================================================
// Queries and forms
// =============================================================================

/// Paged table with free-text search.
#[derive(Debug, Default, Deserialize)]
pub struct SellerListQuery {
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
}

impl SellerListQuery {
    fn pagination(&self) -> PaginationQuery {
        PaginationQuery { page: self.page }
    }
}

/// Seller order table filters.
#[derive(Debug, Default, Deserialize)]
pub struct SellerOrdersQuery {
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date_from: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date_to: Option<String>,
}

impl SellerOrdersQuery {
    fn filters(&self) -> SellerOrderFilters {
        SellerOrderFilters {
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            product_id: None,
        }
    }
}

/// Stock adjustment form.
#[derive(Debug, Deserialize, Validate)]
pub struct StockForm {
    #[validate(range(min = 0, max = 1_000_000, message = "Stock must be between 0 and 1000000"))]
    pub quantity: i64,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 200, message = "Keep the reason under 200 characters"))]
    pub reason: Option<String>,
}

/// Low-stock alert form.
#[derive(Debug, Deserialize, Validate)]
pub struct AlertForm {
    #[validate(range(min = 0, max = 100_000, message = "Threshold must be between 0 and 100000"))]
    pub threshold: i64,
}

/// Base price form.
#[derive(Debug, Deserialize, Validate)]
pub struct PriceForm {
    #[validate(custom(function = "positive_amount", message = "Enter a price above zero"))]
    pub price: Decimal,
}

/// Order status form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Return rejection form.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectReturnForm {
    #[validate(length(min = 5, max = 500, message = "Give the buyer a reason of at least 5 characters"))]
    pub reason: String,
}

/// Fulfillment form; every field is optional.
#[derive(Debug, Deserialize)]
pub struct FulfillForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tracking_number: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub shipping_carrier: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub shipping_method: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub estimated_delivery: Option<String>,
}

fn positive_amount(amount: &Decimal) -> std::result::Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("positive_amount"))
    }
}

/// New product form, read from a multipart body.
///
/// Numeric fields stay `None` when missing or unparseable so the `required`
/// rules report them.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProductForm {
    #[validate(length(min = 2, max = 200, message = "Enter a product name"))]
    pub name: String,
    #[validate(length(max = 5000, message = "Keep the description under 5000 characters"))]
    pub description: String,
    #[validate(
        required(message = "Enter a price"),
        custom(function = "positive_amount", message = "Enter a price above zero")
    )]
    pub price: Option<Decimal>,
    #[validate(custom(function = "positive_amount", message = "Enter an offer price above zero"))]
    pub offer_price: Option<Decimal>,
    #[validate(
        required(message = "Enter a quantity"),
        range(min = 0, max = 1_000_000, message = "Quantity must be between 0 and 1000000")
    )]
    pub quantity: Option<i64>,
    #[validate(required(message = "Choose a category"))]
    pub category_id: Option<i64>,
    pub brand: String,
    pub condition: String,
}

impl ProductForm {
    /// Prefill the form for editing an existing product.
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: Some(product.price),
            offer_price: product.offer_price,
            quantity: Some(product.quantity),
            category_id: product.category_id.map(|c| c.as_i64()),
            brand: product.brand.clone().unwrap_or_default(),
            condition: product.product_condition.clone().unwrap_or_default(),
        }
    }

    /// Apply one text field of the multipart body.
    fn set(&mut self, name: &str, value: String) {
        let value = value.trim().to_string();
        match name {
            "name" => self.name = value,
            "description" => self.description = value,
            "price" => self.price = value.parse().ok(),
            "offer_price" => self.offer_price = value.parse().ok(),
            "quantity" => self.quantity = value.parse().ok(),
            "category_id" => self.category_id = value.parse().ok(),
            "brand" => self.brand = value,
            "condition" => self.condition = value,
            other => tracing::debug!(field = other, "ignoring product form field"),
        }
    }

    /// Errors the derive cannot express: an offer must undercut the price.
    fn check_offer(&self, errors: &mut FieldErrors) {
        match (self.price, self.offer_price) {
            (Some(price), Some(offer)) if offer >= price => {
                errors.insert("offer_price", "The offer price must be below the price");
            }
            _ => {}
        }
    }

    fn to_request(&self) -> Option<SellerProductRequest> {
        let quantity = self.quantity?;
        Some(SellerProductRequest {
            name: self.name.clone(),
            description: Some(self.description.clone()).filter(|d| !d.is_empty()),
            price: self.price?,
            offer_price: self.offer_price,
            quantity,
            category_id: CategoryId::new(self.category_id?),
            brand: Some(self.brand.clone()).filter(|b| !b.is_empty()),
            product_status: if quantity > 0 { "AVAILABLE" } else { "OUT_OF_STOCK" }.to_string(),
            product_sell_type: "DIRECT".to_string(),
            product_condition: if self.condition.is_empty() {
                "NEW".to_string()
            } else {
                self.condition.to_ascii_uppercase()
            },
        })
    }
}

/// Check an uploaded image, returning the message to show if it is refused.
fn check_image(image: &ImageUpload) -> std::result::Result<(), String> {
    if !image.content_type.starts_with("image/") {
        return Err(format!("{} is not an image", image.file_name));
    }
    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(format!("{} is larger than 5 MB", image.file_name));
    }
    Ok(())
}

/// A product form read from a multipart body, already checked.
struct SubmittedProduct {
    form: ProductForm,
    images: Vec<ImageUpload>,
    errors: FieldErrors,
}

impl SubmittedProduct {
    /// Read text fields and images, then run every form rule.
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = ProductForm::default();
        let mut images: Vec<ImageUpload> = Vec::new();
        let mut image_errors = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "images" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;

                // Browsers send an empty part when no file is chosen
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                let image = ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                };
                match check_image(&image) {
                    Ok(()) => images.push(image),
                    Err(message) => image_errors.push(message),
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;
                form.set(&name, value);
            }
        }

        let mut errors = form
            .validate()
            .err()
            .map(|e| FieldErrors::from_validation(&e))
            .unwrap_or_default();
        form.check_offer(&mut errors);
        if let Some(message) = image_errors.first() {
            errors.insert("images", message.clone());
        }
        if images.len() > MAX_IMAGES {
            errors.insert("images", format!("Upload at most {MAX_IMAGES} images"));
        }

        Ok(Self {
            form,
            images,
            errors,
        })
    }

    /// Backend request, when the form passed every rule.
    fn request(&self) -> Option<SellerProductRequest> {
        self.form.to_request().filter(|_| self.errors.is_empty())
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "seller/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: Fetched<DashboardView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/products.html")]
pub struct SellerProductsTemplate {
    pub ctx: PageContext,
    pub products: Fetched<Vec<SellerProductRow>>,
    pub search: String,
    pub pager: Pager,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/product_form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    /// Product being edited; `None` for a new product.
    pub editing: Option<i64>,
    pub form: ProductForm,
    pub categories: Fetched<Vec<CategoryCard>>,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/inventory.html")]
pub struct InventoryTemplate {
    pub ctx: PageContext,
    pub items: Fetched<Vec<InventoryRow>>,
    pub search: String,
    pub pager: Pager,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/orders.html")]
pub struct SellerOrdersTemplate {
    pub ctx: PageContext,
    pub orders: Fetched<Vec<OrderView>>,
    pub statuses: Vec<StatusOption>,
    pub date_from: String,
    pub date_to: String,
    pub pager: Pager,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/order.html")]
pub struct SellerOrderTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
    pub statuses: Vec<StatusOption>,
    pub returns: Fetched<Vec<ReturnView>>,
}

// =============================================================================
// Dashboard and products
// =============================================================================

/// Seller dashboard.
#[instrument(skip(state, session, user))]
pub async fn dashboard(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
) -> impl IntoResponse {
    let stats = state.backend_for(&user.token()).dashboard_stats().await;
    let currency = state.config().currency;

    DashboardTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        stats: Fetched::from_result(stats).map(|s| DashboardView::new(&s, currency)),
    }
}

/// The seller's products.
#[instrument(skip(state, session, user))]
pub async fn products(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Query(query): Query<SellerListQuery>,
) -> impl IntoResponse {
    let current = query.pagination().current();
    let currency = state.config().currency;

    let page = state
        .backend_for(&user.token())
        .seller_products(
            PageRequest::new(current - 1, state.config().page_size),
            query.search.as_deref(),
        )
        .await;

    let pager = Pager::new(current, page.as_ref().ok());
    let products = Fetched::from_list(page.map(|p| p.content)).map(|products| {
        products
            .iter()
            .map(|p| SellerProductRow {
                card: ProductCard::new(p, currency),
                quantity: p.quantity,
                status: p.product_status.clone(),
            })
            .collect::<Vec<_>>()
    });

    SellerProductsTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        products,
        search: query.search.unwrap_or_default(),
        pager,
    }
}

/// Empty new product form.
#[instrument(skip(state, session, user))]
pub async fn new_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
) -> impl IntoResponse {
    let categories = state.backend().categories().await;

    ProductFormTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        editing: None,
        form: ProductForm::default(),
        categories: Fetched::from_list(categories).map(|c| CategoryCard::list(&c)),
        errors: FieldErrors::default(),
        error: None,
    }
}

/// Create a product from the multipart form.
///
/// # Errors
///
/// Returns 400 if the multipart body cannot be read.
#[instrument(skip(state, session, user, multipart))]
pub async fn create_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    multipart: Multipart,
) -> Result<Response> {
    let submitted = SubmittedProduct::read(multipart).await?;

    let error = match submitted.request() {
        Some(request) => {
            match state
                .backend_for(&user.token())
                .create_product(&request, &submitted.images)
                .await
            {
                Ok(product) => {
                    tracing::info!(product_id = %product.id, images = submitted.images.len(), "product created");
                    set_flash(&session, Flash::success(format!("{} is now listed.", product.name))).await;
                    return Ok(Redirect::to("/seller/products").into_response());
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to create product");
                    Some(e.user_message())
                }
            }
        }
        None => None,
    };

    let categories = state.backend().categories().await;
    Ok(ProductFormTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        editing: None,
        form: submitted.form,
        categories: Fetched::from_list(categories).map(|c| CategoryCard::list(&c)),
        errors: submitted.errors,
        error,
    }
    .into_response())
}

/// Edit form for an existing product.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, session, user), fields(product_id = %id))]
pub async fn edit_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let (product, categories) = tokio::join!(state.backend().product(id), state.backend().categories());
    let product = product.map_err(not_found_as(format!("product {id}")))?;

    Ok(ProductFormTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        editing: Some(id.as_i64()),
        form: ProductForm::from_product(&product),
        categories: Fetched::from_list(categories).map(|c| CategoryCard::list(&c)),
        errors: FieldErrors::default(),
        error: None,
    })
}

/// Save an edited product; new images are added to the existing ones.
///
/// # Errors
///
/// Returns 400 if the multipart body cannot be read.
#[instrument(skip(state, session, user, multipart), fields(product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let submitted = SubmittedProduct::read(multipart).await?;

    let error = match submitted.request() {
        Some(request) => {
            match state
                .backend_for(&user.token())
                .update_product(id, &request, &submitted.images)
                .await
            {
                Ok(product) => {
                    tracing::info!(images = submitted.images.len(), "product updated");
                    set_flash(&session, Flash::success(format!("{} has been updated.", product.name))).await;
                    return Ok(Redirect::to("/seller/products").into_response());
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to update product");
                    Some(e.user_message())
                }
            }
        }
        None => None,
    };

    let categories = state.backend().categories().await;
    Ok(ProductFormTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        editing: Some(id.as_i64()),
        form: submitted.form,
        categories: Fetched::from_list(categories).map(|c| CategoryCard::list(&c)),
        errors: submitted.errors,
        error,
    }
    .into_response())
}

/// Change a product's base price.
#[instrument(skip(state, session, user, form), fields(product_id = %id))]
pub async fn update_price(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
    Form(form): Form<PriceForm>,
) -> Response {
    let flash = if let Err(errors) = form.validate() {
        let errors = FieldErrors::from_validation(&errors);
        Flash::error(errors.get("price").unwrap_or("Check the price."))
    } else {
        match state
            .backend_for(&user.token())
            .update_product_price(id, form.price)
            .await
        {
            Ok(_) => Flash::success(format!(
                "Price updated to {}.",
                state.config().currency.format(form.price)
            )),
            Err(e) => {
                tracing::error!(error = %e, "failed to update price");
                Flash::error(e.user_message())
            }
        }
    };

    set_flash(&session, flash).await;
    Redirect::to("/seller/products").into_response()
}

/// Delete a product.
#[instrument(skip(state, session, user), fields(product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
) -> Response {
    let flash = match state.backend_for(&user.token()).delete_product(id).await {
        Ok(()) => {
            let product_id = id.to_string();
            add_breadcrumb("seller", "Deleted product", Some(&[("product_id", product_id.as_str())]));
            Flash::success("Product deleted.")
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to delete product");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    Redirect::to("/seller/products").into_response()
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock levels.
#[instrument(skip(state, session, user))]
pub async fn inventory(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Query(query): Query<SellerListQuery>,
) -> impl IntoResponse {
    let current = query.pagination().current();

    let page = state
        .backend_for(&user.token())
        .inventory(
            PageRequest::new(current - 1, state.config().page_size),
            query.search.as_deref(),
        )
        .await;

    let pager = Pager::new(current, page.as_ref().ok());

    InventoryTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        items: Fetched::from_list(page.map(|p| p.content))
            .map(|items| items.iter().map(InventoryRow::from).collect::<Vec<_>>()),
        search: query.search.unwrap_or_default(),
        pager,
    }
}

/// Set a product's stock level.
#[instrument(skip(state, session, user, form), fields(product_id = %id))]
pub async fn update_stock(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
    Form(form): Form<StockForm>,
) -> Response {
    let flash = if let Err(errors) = form.validate() {
        let errors = FieldErrors::from_validation(&errors);
        Flash::error(
            errors
                .get("quantity")
                .or_else(|| errors.get("reason"))
                .unwrap_or("Check the stock form."),
        )
    } else {
        let update = StockUpdate {
            quantity: form.quantity,
            reason: form.reason,
        };
        match state.backend_for(&user.token()).update_stock(id, &update).await {
            Ok(()) => {
                tracing::info!(quantity = update.quantity, "stock updated");
                Flash::success(format!("Stock set to {}.", update.quantity))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to update stock");
                Flash::error(e.user_message())
            }
        }
    };

    set_flash(&session, flash).await;
    Redirect::to("/seller/inventory").into_response()
}

/// Set a product's low-stock alert threshold.
#[instrument(skip(state, session, user, form), fields(product_id = %id))]
pub async fn set_alert(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
    Form(form): Form<AlertForm>,
) -> Response {
    let flash = if let Err(errors) = form.validate() {
        let errors = FieldErrors::from_validation(&errors);
        Flash::error(errors.get("threshold").unwrap_or("Check the threshold."))
    } else {
        match state
            .backend_for(&user.token())
            .set_low_stock_alert(id, form.threshold)
            .await
        {
            Ok(()) => Flash::success(format!("You will be alerted below {} units.", form.threshold)),
            Err(e) => {
                tracing::error!(error = %e, "failed to set low-stock alert");
                Flash::error(e.user_message())
            }
        }
    };

    set_flash(&session, flash).await;
    Redirect::to("/seller/inventory").into_response()
}

// =============================================================================
// Orders
// =============================================================================

/// Orders containing the seller's products.
#[instrument(skip(state, session, user))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Query(query): Query<SellerOrdersQuery>,
) -> impl IntoResponse {
    let current = PaginationQuery { page: query.page }.current();
    let filters = query.filters();
    let currency = state.config().currency;

    let page = state
        .backend_for(&user.token())
        .seller_orders(PageRequest::new(current - 1, state.config().page_size), &filters)
        .await;

    let pager = Pager::new(current, page.as_ref().ok());

    SellerOrdersTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        orders: Fetched::from_list(page.map(|p| p.content)).map(|o| OrderView::list(&o, currency)),
        statuses: status_options(filters.status),
        date_from: query.date_from.unwrap_or_default(),
        date_to: query.date_to.unwrap_or_default(),
        pager,
    }
}

/// One order with status controls.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
#[instrument(skip(state, session, user), fields(order_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let backend = state.backend_for(&user.token());
    let currency = state.config().currency;

    let (order, returns) = tokio::join!(backend.seller_order(id), backend.return_requests(id));
    let order = order.map_err(not_found_as(format!("order {id}")))?;

    Ok(SellerOrderTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        statuses: status_options(Some(order.status)),
        order: OrderView::new(&order, currency),
        returns: Fetched::from_list(returns)
            .map(|r| r.iter().map(|r| ReturnView::new(r, currency)).collect::<Vec<_>>()),
    })
}

/// Move an order to a new status.
#[instrument(skip(state, session, user, form), fields(order_id = %id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Response {
    let status = form
        .status
        .parse::<OrderStatus>()
        .ok()
        .filter(|s| OrderStatus::SELLER_TRANSITIONS.contains(s));

    let flash = match status {
        None => Flash::error("Choose a valid status."),
        Some(status) => match state
            .backend_for(&user.token())
            .update_seller_order_status(id, status)
            .await
        {
            Ok(order) => Flash::success(format!("Order #{id} is now {}.", order.status.label())),
            Err(e) => {
                tracing::error!(error = %e, "failed to update order status");
                Flash::error(e.user_message())
            }
        },
    };

    set_flash(&session, flash).await;
    Redirect::to(&format!("/seller/orders/{id}")).into_response()
}

/// Mark an order fulfilled.
#[instrument(skip(state, session, user, form), fields(order_id = %id))]
pub async fn fulfill_order(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<OrderId>,
    Form(form): Form<FulfillForm>,
) -> Response {
    let request = FulfillmentRequest {
        tracking_number: form.tracking_number,
        shipping_carrier: form.shipping_carrier,
        shipping_method: form.shipping_method,
        estimated_delivery: form.estimated_delivery,
    };

    let flash = match state.backend_for(&user.token()).fulfill_order(id, &request).await {
        Ok(_) => Flash::success(format!("Order #{id} marked as fulfilled.")),
        Err(e) => {
            tracing::error!(error = %e, "failed to fulfill order");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    Redirect::to(&format!("/seller/orders/{id}")).into_response()
}

// =============================================================================
// Returns
// =============================================================================

/// Approve a buyer's return request.
#[instrument(skip(state, session, user), fields(order_id = %order_id, return_request_id = %id))]
pub async fn approve_return(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path((order_id, id)): Path<(OrderId, ReturnRequestId)>,
) -> Response {
    let flash = match state.backend_for(&user.token()).approve_return(id).await {
        Ok(_) => {
            tracing::info!("return approved");
            Flash::success(format!("Return #{id} approved."))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to approve return");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    Redirect::to(&format!("/seller/orders/{order_id}")).into_response()
}

/// Reject a buyer's return request with a reason.
#[instrument(skip(state, session, user, form), fields(order_id = %order_id, return_request_id = %id))]
pub async fn reject_return(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path((order_id, id)): Path<(OrderId, ReturnRequestId)>,
    Form(form): Form<RejectReturnForm>,
) -> Response {
    let flash = if let Err(errors) = form.validate() {
        let errors = FieldErrors::from_validation(&errors);
        Flash::error(errors.get("reason").unwrap_or("Give a reason for the rejection."))
    } else {
        match state
            .backend_for(&user.token())
            .reject_return(id, form.reason.trim())
            .await
        {
            Ok(_) => {
                tracing::info!("return rejected");
                Flash::success(format!("Return #{id} rejected."))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to reject return");
                Flash::error(e.user_message())
            }
        }
    };

    set_flash(&session, flash).await;
    Redirect::to(&format!("/seller/orders/{order_id}")).into_response()
}

/// Refund an approved return.
#[instrument(skip(state, session, user), fields(order_id = %order_id, return_request_id = %id))]
pub async fn refund_return(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path((order_id, id)): Path<(OrderId, ReturnRequestId)>,
) -> Response {
    let flash = match state.backend_for(&user.token()).process_refund(id).await {
        Ok(refund) => {
            let return_id = id.to_string();
            add_breadcrumb("seller", "Refunded return", Some(&[("return_request_id", return_id.as_str())]));
            tracing::info!(refund_id = refund.id, "refund issued");
            Flash::success(format!(
                "Refund of {} issued.",
                state.config().currency.format(refund.amount)
            ))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to issue refund");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    Redirect::to(&format!("/seller/orders/{order_id}")).into_response()
}

/// Create the seller routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/products", get(products))
        .route(
            "/products/new",
            get(new_product)
                .post(create_product)
                .layer(DefaultBodyLimit::max(MAX_IMAGES * MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route(
            "/products/{id}/edit",
            get(edit_product)
                .post(update_product)
                .layer(DefaultBodyLimit::max(MAX_IMAGES * MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/products/{id}/price", post(update_price))
        .route("/products/{id}/delete", post(delete_product))
        .route("/inventory", get(inventory))
        .route("/inventory/{id}/stock", post(update_stock))
        .route("/inventory/{id}/alert", post(set_alert))
        .route("/orders", get(orders))
        .route("/orders/{id}", get(order))
        .route("/orders/{id}/status", post(update_order_status))
        .route("/orders/{id}/fulfill", post(fulfill_order))
        .route("/orders/{id}/returns/{return_id}/approve", post(approve_return))
        .route("/orders/{id}/returns/{return_id}/reject", post(reject_return))
        .route("/orders/{id}/returns/{return_id}/refund", post(refund_return))
        .merge(companies::router())
}
