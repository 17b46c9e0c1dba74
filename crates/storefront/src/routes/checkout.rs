//! Checkout route handlers.
//!
//! Checkout places an order from the signed-in shopper's backend cart, copies
//! the chosen address book entries onto the order as recipient and billing
//! details, then empties the cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopora_core::{AddressId, AddressType, OrderId};
use tower_sessions::Session;
use tracing::instrument;

use super::account::recipient_line;
use super::cart::{CART_PAGE_SIZE, CartView};
use super::views::{FieldErrors, OrderView, PageContext};
use crate::backend::{
    Address, ApiClient, Cart, CreateOrderRequest, Fetched, Order, OrderBillingCredential,
    OrderShippingCredential, PageRequest,
};
use crate::error::{Result, add_breadcrumb, not_found_as};
use crate::filters;
use crate::middleware::{RequireAuth, set_flash};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

/// An address choice in the checkout selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressChoice {
    pub id: i64,
    pub label: String,
    pub selected: bool,
}

fn address_choices(addresses: &[Address], selected: Option<AddressId>) -> Vec<AddressChoice> {
    addresses
        .iter()
        .map(|a| AddressChoice {
            id: a.id.as_i64(),
            label: format!("{} - {}", a.name, a.one_line()),
            selected: Some(a.id) == selected,
        })
        .collect()
}

/// Preferred address of a kind: its default entry, then any entry of that
/// kind, then the first address at all.
fn preferred_address(addresses: &[Address], kind: AddressType) -> Option<AddressId> {
    addresses
        .iter()
        .find(|a| a.address_type == kind && a.is_default)
        .or_else(|| addresses.iter().find(|a| a.address_type == kind))
        .or_else(|| addresses.first())
        .map(|a| a.id)
}

/// Look up a submitted address id in the shopper's own address book.
fn owned_address<'a>(addresses: &'a [Address], raw: &str) -> Option<&'a Address> {
    let id: AddressId = raw.trim().parse().ok()?;
    addresses.iter().find(|a| a.id == id)
}

/// Checkout form. Ids arrive as strings so a blank select can be reported.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub shipping_address_id: String,
    #[serde(default)]
    pub billing_address_id: String,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub summary: CartView,
    pub shipping_addresses: Vec<AddressChoice>,
    pub billing_addresses: Vec<AddressChoice>,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
    pub recipient: Fetched<String>,
}

/// What checkout needs before rendering or placing an order.
enum Prepared {
    Ready { cart: Cart, addresses: Vec<Address> },
    Redirect(Response),
}

/// Load the cart and address book, or send the shopper where they can fix
/// what is missing.
async fn prepare(backend: &ApiClient, session: &Session) -> Prepared {
    let (cart, addresses) = tokio::join!(
        backend.cart(PageRequest::new(0, CART_PAGE_SIZE)),
        backend.addresses(),
    );

    let cart = match cart {
        Ok(cart) if !cart.items.is_empty() => cart,
        Ok(_) => {
            set_flash(session, Flash::error("Your cart is empty.")).await;
            return Prepared::Redirect(Redirect::to("/cart").into_response());
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load cart for checkout");
            set_flash(session, Flash::error(e.user_message())).await;
            return Prepared::Redirect(Redirect::to("/cart").into_response());
        }
    };

    match addresses {
        Ok(addresses) if !addresses.is_empty() => Prepared::Ready { cart, addresses },
        Ok(_) => {
            set_flash(session, Flash::error("Add an address before checking out.")).await;
            Prepared::Redirect(Redirect::to("/account/addresses").into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load addresses for checkout");
            set_flash(session, Flash::error(e.user_message())).await;
            Prepared::Redirect(Redirect::to("/cart").into_response())
        }
    }
}

/// Display the checkout page.
#[instrument(skip(state, session, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Response {
    let backend = state.backend_for(&user.token());
    let (cart, addresses) = match prepare(&backend, &session).await {
        Prepared::Ready { cart, addresses } => (cart, addresses),
        Prepared::Redirect(response) => return response,
    };

    CheckoutTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        summary: CartView::from_backend(&cart, state.config().currency),
        shipping_addresses: address_choices(
            &addresses,
            preferred_address(&addresses, AddressType::Shipping),
        ),
        billing_addresses: address_choices(
            &addresses,
            preferred_address(&addresses, AddressType::Billing),
        ),
        errors: FieldErrors::default(),
        error: None,
    }
    .into_response()
}

/// Place the order.
#[instrument(skip(state, session, user, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let backend = state.backend_for(&user.token());
    let (cart, addresses) = match prepare(&backend, &session).await {
        Prepared::Ready { cart, addresses } => (cart, addresses),
        Prepared::Redirect(response) => return response,
    };

    let shipping = owned_address(&addresses, &form.shipping_address_id);
    let billing = owned_address(&addresses, &form.billing_address_id);

    let mut errors = FieldErrors::default();
    if shipping.is_none() {
        errors.insert("shipping_address_id", "Choose a shipping address");
    }
    if billing.is_none() {
        errors.insert("billing_address_id", "Choose a billing address");
    }

    let (error, order) = match (shipping, billing) {
        (Some(shipping), Some(billing)) => {
            let request = CreateOrderRequest {
                selected_cart_item_ids: Some(cart.items.iter().map(|i| i.id).collect()),
                used_coupon_id: cart.coupon_code().map(str::to_string),
                shipping_address_id: shipping.id,
                billing_address_id: billing.id,
            };
            match backend.create_order(&request).await {
                Ok(order) => (None, Some((order, shipping, billing))),
                Err(e) => {
                    tracing::error!(error = %e, "failed to place order");
                    (Some(e.user_message()), None)
                }
            }
        }
        _ => (None, None),
    };

    if let Some((order, shipping, billing)) = order {
        finish_order(&backend, &user, &order, shipping, billing).await;
        set_flash(&session, Flash::success(format!("Order #{} placed.", order.id))).await;
        return Redirect::to(&format!("/checkout/confirmation/{}", order.id)).into_response();
    }

    let selected = |raw: &str| raw.trim().parse::<AddressId>().ok();
    CheckoutTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        summary: CartView::from_backend(&cart, state.config().currency),
        shipping_addresses: address_choices(&addresses, selected(&form.shipping_address_id)),
        billing_addresses: address_choices(&addresses, selected(&form.billing_address_id)),
        errors,
        error,
    }
    .into_response()
}

/// Attach recipient and billing details to a new order and empty the cart.
///
/// The order already exists at this point, so failures are logged and the
/// shopper still reaches the confirmation page.
async fn finish_order(
    backend: &ApiClient,
    user: &CurrentUser,
    order: &Order,
    shipping: &Address,
    billing: &Address,
) {
    let id = order.id;
    let (existing_shipping, existing_billing) = tokio::join!(
        backend.order_shipping_credential(id),
        backend.order_billing_credential(id),
    );

    let shipping_exists = matches!(existing_shipping, Ok(Some(_)));
    if let Err(e) = backend
        .save_order_shipping_credential(
            id,
            &OrderShippingCredential::from_address(shipping, id),
            shipping_exists,
        )
        .await
    {
        tracing::warn!(error = %e, order_id = %id, "failed to save recipient details");
    }

    let billing_exists = matches!(existing_billing, Ok(Some(_)));
    if let Err(e) = backend
        .save_order_billing_credential(
            id,
            &OrderBillingCredential::from_address(billing, id),
            billing_exists,
        )
        .await
    {
        tracing::warn!(error = %e, order_id = %id, "failed to save billing details");
    }

    if let Err(e) = backend.clear_cart().await {
        tracing::warn!(error = %e, order_id = %id, "failed to clear cart after checkout");
    }

    let order_id = id.to_string();
    add_breadcrumb("order", "Placed order", Some(&[("order_id", order_id.as_str())]));
    tracing::info!(order_id = %id, email = %user.email, items = order.item_count(), "order placed");
}

/// Order confirmation shown after checkout.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
#[instrument(skip(state, session, user), fields(order_id = %id))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let backend = state.backend_for(&user.token());

    let (order, recipient) = tokio::join!(
        backend.order(id),
        backend.order_shipping_credential(id),
    );
    let order = order.map_err(not_found_as(format!("order {id}")))?;

    Ok(ConfirmationTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        order: OrderView::new(&order, state.config().currency),
        recipient: Fetched::from_option(recipient).map(|c| recipient_line(&c)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn addresses() -> Vec<Address> {
        serde_json::from_value(serde_json::json!([
            {"id": 1, "name": "Office", "addressLine1": "2 quai Est", "city": "Lyon",
             "postalCode": "69002", "country": "FR", "addressType": "CONTACT"},
            {"id": 2, "name": "Home", "addressLine1": "1 rue Neuve", "city": "Lyon",
             "postalCode": "69001", "country": "FR", "addressType": "SHIPPING"},
            {"id": 3, "name": "Billing", "addressLine1": "1 rue Neuve", "city": "Lyon",
             "postalCode": "69001", "country": "FR", "addressType": "BILLING", "isDefault": true}
        ]))
        .unwrap()
    }

    #[test]
    fn test_preferred_address_by_kind() {
        let addresses = addresses();
        assert_eq!(preferred_address(&addresses, AddressType::Shipping), Some(AddressId::new(2)));
        assert_eq!(preferred_address(&addresses, AddressType::Billing), Some(AddressId::new(3)));
        assert_eq!(preferred_address(&addresses, AddressType::Expedition), Some(AddressId::new(1)));
        assert_eq!(preferred_address(&[], AddressType::Shipping), None);
    }

    #[test]
    fn test_only_owned_addresses_are_accepted() {
        let addresses = addresses();
        assert_eq!(owned_address(&addresses, " 2 ").map(|a| a.id), Some(AddressId::new(2)));
        assert!(owned_address(&addresses, "42").is_none());
        assert!(owned_address(&addresses, "").is_none());
    }

    #[test]
    fn test_address_choices_mark_selection() {
        let choices = address_choices(&addresses(), Some(AddressId::new(3)));
        assert_eq!(choices.iter().filter(|c| c.selected).count(), 1);
        assert!(choices[2].selected);
        assert!(choices[1].label.starts_with("Home - 1 rue Neuve"));
    }
}
