//! Cart route handlers.
//!
//! Signed-in shoppers use the backend cart. Visitors keep product ids and
//! quantities in the session, priced from the catalog on each render, and
//! those lines move to the backend cart when they sign in.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shopora_core::catalog::resolve_image;
use shopora_core::{CartItemId, CurrencyCode, ProductId};
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use super::views::{FieldErrors, PageContext};
use crate::backend::{ApiError, Cart, Fetched, PageRequest};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, load_cart, set_flash, store_cart};
use crate::models::{CurrentUser, Flash, SessionCart, cart::MAX_LINE_QUANTITY};
use crate::state::AppState;

/// Lines fetched from the backend cart in one page.
pub const CART_PAGE_SIZE: u32 = 100;

// =============================================================================
// View models
// =============================================================================

/// A cart line as rendered. `key` addresses the line in update and remove
/// forms: the backend cart item id when signed in, the product id otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub key: i64,
    pub product_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub price: String,
    pub quantity: i64,
    pub total: String,
}

/// Cart summary for the cart and checkout pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: i64,
    pub subtotal: String,
    pub shipping: Option<String>,
    pub discount: Option<String>,
    pub total: String,
    pub coupon: Option<String>,
}

impl CartView {
    /// Summary of a backend cart.
    #[must_use]
    pub fn from_backend(cart: &Cart, currency: CurrencyCode) -> Self {
        let lines = cart
            .items
            .iter()
            .map(|item| CartLineView {
                key: item.id.as_i64(),
                product_id: item.product_id.as_i64(),
                name: item
                    .product_name
                    .clone()
                    .unwrap_or_else(|| format!("Product #{}", item.product_id)),
                image_url: None,
                price: currency.format(item.price),
                quantity: item.quantity,
                total: currency.format(item.line_total()),
            })
            .collect();

        Self {
            lines,
            item_count: cart.item_count(),
            subtotal: currency.format(cart.subtotal()),
            shipping: (cart.shipping() > Decimal::ZERO).then(|| currency.format(cart.shipping())),
            discount: (cart.discount() > Decimal::ZERO).then(|| currency.format(cart.discount())),
            total: currency.format(cart.total()),
            coupon: cart.coupon_code().map(str::to_string),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Price a session cart from the catalog.
///
/// Products that no longer exist are left out; any other failure fails the
/// whole cart so a partial total is never shown.
async fn price_session_cart(
    state: &AppState,
    cart: &SessionCart,
) -> Result<CartView, ApiError> {
    let currency = state.config().currency;
    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut subtotal = Decimal::ZERO;
    let mut item_count = 0;

    for line in &cart.lines {
        let product = match state.backend().product(line.product_id).await {
            Ok(product) => product,
            Err(ApiError::NotFound(_)) => {
                tracing::debug!(product_id = %line.product_id, "session cart product is gone");
                continue;
            }
            Err(e) => return Err(e),
        };

        let price = product.price_display().price;
        let total = price * Decimal::from(line.quantity);
        subtotal += total;
        item_count += line.quantity;
        lines.push(CartLineView {
            key: line.product_id.as_i64(),
            product_id: line.product_id.as_i64(),
            name: product.name.clone(),
            image_url: Some(resolve_image(&product).url),
            price: currency.format(price),
            quantity: line.quantity,
            total: currency.format(total),
        });
    }

    Ok(CartView {
        lines,
        item_count,
        subtotal: currency.format(subtotal),
        shipping: None,
        discount: None,
        total: currency.format(subtotal),
        coupon: None,
    })
}

/// The current shopper's cart, from the backend or the session.
pub(crate) async fn load_cart_view(
    state: &AppState,
    session: &Session,
    user: Option<&CurrentUser>,
) -> Fetched<CartView> {
    let currency = state.config().currency;
    let result = match user {
        Some(user) => state
            .backend_for(&user.token())
            .cart(PageRequest::new(0, CART_PAGE_SIZE))
            .await
            .map(|cart| CartView::from_backend(&cart, currency)),
        None => price_session_cart(state, &load_cart(session).await).await,
    };

    match result {
        Ok(view) if view.is_empty() => Fetched::Empty,
        other => Fetched::from_result(other),
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add-to-cart form posted from product pages.
#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 99, message = "Choose between 1 and 99 items"))]
    pub quantity: i64,
}

const fn one() -> i64 {
    1
}

/// Quantity change for an existing line; zero removes it.
#[derive(Debug, Deserialize, Validate)]
pub struct QuantityForm {
    #[validate(range(min = 0, max = 99, message = "Choose between 0 and 99 items"))]
    pub quantity: i64,
}

/// Coupon form.
#[derive(Debug, Deserialize, Validate)]
pub struct CouponForm {
    #[validate(length(min = 1, max = 50, message = "Enter a coupon code"))]
    pub code: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub cart: Fetched<CartView>,
    pub max_quantity: i64,
}

// =============================================================================
// Handlers
// =============================================================================

fn back_to_cart() -> Response {
    Redirect::to("/cart").into_response()
}

fn first_error(errors: &validator::ValidationErrors, field: &str) -> String {
    FieldErrors::from_validation(errors)
        .get(field)
        .unwrap_or("Check the form and try again.")
        .to_string()
}

/// Display the cart.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let cart = load_cart_view(&state, &session, user.as_ref()).await;

    CartTemplate {
        ctx: PageContext::load(&session, user.as_ref()).await,
        cart,
        max_quantity: MAX_LINE_QUANTITY,
    }
}

/// Add a product to the cart.
#[instrument(skip(state, session, user, form), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_page = format!("/products/{}", form.product_id);
    if let Err(errors) = form.validate() {
        set_flash(&session, Flash::error(first_error(&errors, "quantity"))).await;
        return Redirect::to(&product_page).into_response();
    }

    let product = match state.backend().product(form.product_id).await {
        Ok(product) => product,
        Err(e) => {
            tracing::warn!(error = %e, "cannot add product to cart");
            set_flash(&session, Flash::error(e.user_message())).await;
            return Redirect::to(&product_page).into_response();
        }
    };
    if !product.in_stock() {
        set_flash(&session, Flash::error(format!("{} is out of stock.", product.name))).await;
        return Redirect::to(&product_page).into_response();
    }

    let flash = match &user {
        Some(user) => match state
            .backend_for(&user.token())
            .add_to_cart(form.product_id, form.quantity)
            .await
        {
            Ok(_) => Flash::success(format!("{} added to your cart.", product.name)),
            Err(e) => {
                tracing::error!(error = %e, "failed to add to cart");
                Flash::error(e.user_message())
            }
        },
        None => {
            let mut cart = load_cart(&session).await;
            cart.add(form.product_id, form.quantity);
            store_cart(&session, &cart).await;
            Flash::success(format!("{} added to your cart.", product.name))
        }
    };

    tracing::info!(quantity = form.quantity, "cart line added");
    set_flash(&session, flash).await;
    back_to_cart()
}

/// Change the quantity of a line.
#[instrument(skip(state, session, user, form), fields(line = key))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(key): Path<i64>,
    Form(form): Form<QuantityForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        set_flash(&session, Flash::error(first_error(&errors, "quantity"))).await;
        return back_to_cart();
    }

    match &user {
        Some(user) => {
            let backend = state.backend_for(&user.token());
            let item = CartItemId::new(key);
            let result = if form.quantity == 0 {
                backend.remove_cart_item(item).await
            } else {
                backend.update_cart_item(item, form.quantity).await.map(|_| ())
            };
            if let Err(e) = result {
                tracing::error!(error = %e, "failed to update cart line");
                set_flash(&session, Flash::error(e.user_message())).await;
            }
        }
        None => {
            let mut cart = load_cart(&session).await;
            cart.set_quantity(ProductId::new(key), form.quantity);
            store_cart(&session, &cart).await;
        }
    }

    back_to_cart()
}

/// Remove a line.
#[instrument(skip(state, session, user), fields(line = key))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(key): Path<i64>,
) -> Response {
    match &user {
        Some(user) => {
            if let Err(e) = state
                .backend_for(&user.token())
                .remove_cart_item(CartItemId::new(key))
                .await
            {
                tracing::error!(error = %e, "failed to remove cart line");
                set_flash(&session, Flash::error(e.user_message())).await;
                return back_to_cart();
            }
        }
        None => {
            let mut cart = load_cart(&session).await;
            cart.remove(ProductId::new(key));
            store_cart(&session, &cart).await;
        }
    }

    set_flash(&session, Flash::success("Item removed from your cart.")).await;
    back_to_cart()
}

/// Empty the cart.
#[instrument(skip(state, session, user))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    match &user {
        Some(user) => {
            if let Err(e) = state.backend_for(&user.token()).clear_cart().await {
                tracing::error!(error = %e, "failed to clear cart");
                set_flash(&session, Flash::error(e.user_message())).await;
                return back_to_cart();
            }
        }
        None => store_cart(&session, &SessionCart::default()).await,
    }

    set_flash(&session, Flash::success("Your cart is empty.")).await;
    back_to_cart()
}

/// Apply a coupon code. Coupons need a backend cart, so a sign-in is required.
#[instrument(skip(state, session, user, form))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CouponForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        set_flash(&session, Flash::error(first_error(&errors, "code"))).await;
        return back_to_cart();
    }

    let code = form.code.trim();
    let flash = match state.backend_for(&user.token()).apply_coupon(code).await {
        Ok(applied) => {
            tracing::info!(code = %applied.code, "coupon applied");
            Flash::success(format!("Coupon {} applied.", applied.code))
        }
        Err(ApiError::NotFound(_) | ApiError::Validation(_)) => {
            Flash::error(format!("Coupon {code} cannot be used on this cart."))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to apply coupon");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    back_to_cart()
}

/// Remove the applied coupon.
#[instrument(skip(state, session, user))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Response {
    let flash = match state.backend_for(&user.token()).remove_coupon().await {
        Ok(()) => Flash::success("Coupon removed."),
        Err(e) => {
            tracing::error!(error = %e, "failed to remove coupon");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    back_to_cart()
}
