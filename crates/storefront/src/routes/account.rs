//! Account route handlers.
//!
//! These routes require authentication. Every backend call is made with the
//! signed-in user's token.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopora_core::{
    AddressId, AddressType, CurrencyCode, OrderId, OrderItemId, OrderStatus, ReturnStatus,
};
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use super::views::{FieldErrors, OrderView, PageContext, blank_as_none};
use crate::backend::{
    Address, AddressRequest, Fetched, Order, OrderBillingCredential, OrderShipping,
    OrderShippingCredential, ReturnRequest, ReturnRequestInput, ShippingTracking,
};
use crate::error::{Result, add_breadcrumb, not_found_as};
use crate::filters;
use crate::middleware::{RequireAuth, set_flash};
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// View models
// =============================================================================

/// Carrier shipment shown on the order page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentView {
    pub carrier: String,
    pub method: String,
    pub status_label: &'static str,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
}

impl From<OrderShipping> for ShipmentView {
    fn from(shipping: OrderShipping) -> Self {
        Self {
            carrier: shipping.shipping_carrier,
            method: shipping.shipping_method,
            status_label: shipping.status.label(),
            tracking_number: shipping.tracking_number,
            tracking_url: shipping
                .tracking_url
                .filter(|u| u.starts_with("https://") || u.starts_with("http://")),
            shipped_at: shipping.shipped_at,
            delivered_at: shipping.delivered_at,
        }
    }
}

/// Tracking state shown on the order page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingView {
    pub number: String,
    pub status: String,
    pub estimated_delivery: Option<String>,
    pub last_updated: Option<String>,
}

impl From<ShippingTracking> for TrackingView {
    fn from(tracking: ShippingTracking) -> Self {
        Self {
            number: tracking.tracking_number,
            status: tracking.carrier_status,
            estimated_delivery: tracking.estimated_delivery_date,
            last_updated: tracking.last_updated,
        }
    }
}

/// A return request as listed under an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnView {
    pub id: i64,
    pub reason: String,
    pub status_label: &'static str,
    pub requested: Option<String>,
    pub refund: Option<String>,
    /// Still waiting for the seller to approve or reject it.
    pub pending: bool,
    /// Approved and ready for the seller to refund.
    pub refundable: bool,
}

impl ReturnView {
    pub(crate) fn new(request: &ReturnRequest, currency: CurrencyCode) -> Self {
        Self {
            id: request.id.as_i64(),
            reason: request.reason.clone(),
            status_label: request.status.label(),
            requested: request.request_date.clone(),
            refund: request.refund_amount.map(|a| currency.format(a)),
            pending: request.status == ReturnStatus::Pending,
            refundable: request.status == ReturnStatus::Approved,
        }
    }
}

/// Name and address on one line.
pub(crate) fn recipient_line(credential: &OrderShippingCredential) -> String {
    join_parts(&[
        &credential.recipient_name,
        &credential.address_line1,
        credential.address_line2.as_deref().unwrap_or_default(),
        &credential.postal_code,
        &credential.city,
        &credential.country,
    ])
}

fn billing_line(credential: &OrderBillingCredential) -> String {
    join_parts(&[
        &credential.billing_client_name,
        &credential.billing_address_line1,
        credential.billing_address_line2.as_deref().unwrap_or_default(),
        &credential.billing_postal_code,
        &credential.billing_city,
        &credential.billing_country,
    ])
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Address book entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressView {
    pub id: i64,
    pub name: String,
    pub kind: &'static str,
    pub line: String,
    pub phone: Option<String>,
    pub is_default: bool,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id.as_i64(),
            name: address.name.clone(),
            kind: address.address_type.label(),
            line: address.one_line(),
            phone: address.phone_number.clone(),
            is_default: address.is_default,
        }
    }
}

/// An address type choice for the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTypeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

fn address_type_options(current: AddressType) -> Vec<AddressTypeOption> {
    AddressType::ALL
        .iter()
        .map(|kind| AddressTypeOption {
            value: kind.as_str(),
            label: kind.label(),
            selected: *kind == current,
        })
        .collect()
}

// =============================================================================
// Forms
// =============================================================================

/// Address book form; `id` is set when editing an existing entry.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AddressForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Enter a name for this address"))]
    pub name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Enter a street address"))]
    pub address_line1: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub address_line2: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Enter a city"))]
    pub city: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub state: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 12, message = "Enter a valid postal code"))]
    pub postal_code: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 60, message = "Enter a country"))]
    pub country: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(min = 6, max = 20, message = "Enter a valid phone number"))]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub address_type: String,
    #[serde(default)]
    pub is_default: Option<String>,
}

impl AddressForm {
    fn from_address(address: &Address) -> Self {
        Self {
            id: Some(address.id.to_string()),
            name: address.name.clone(),
            email: address.email.clone(),
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone_number: address.phone_number.clone(),
            reference: address.reference.clone(),
            address_type: address.address_type.as_str().to_string(),
            is_default: address.is_default.then(|| "on".to_string()),
        }
    }

    /// Target address when editing; an unparseable id is treated as a create.
    fn address_id(&self) -> Option<AddressId> {
        self.id.as_deref().and_then(|id| id.parse().ok())
    }

    fn kind(&self) -> AddressType {
        self.address_type.parse().unwrap_or_default()
    }

    fn to_request(&self) -> AddressRequest {
        AddressRequest {
            name: self.name.trim().to_string(),
            email: self.email.clone(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self.address_line2.clone(),
            city: self.city.trim().to_string(),
            state: self.state.clone(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone_number: self.phone_number.clone(),
            reference: self.reference.clone(),
            address_type: self.kind(),
            is_default: self.is_default.is_some(),
        }
    }
}

/// Return request form. `items` is `all` or a single order item ID.
#[derive(Debug, Deserialize, Validate)]
pub struct ReturnForm {
    #[validate(length(min = 10, max = 500, message = "Describe the problem in at least 10 characters"))]
    pub reason: String,
    #[serde(default)]
    pub items: String,
}

impl ReturnForm {
    /// Order items covered by the request; `None` if `items` names a line
    /// that is not part of the order.
    fn item_ids(&self, order: &Order) -> Option<Vec<OrderItemId>> {
        let all: Vec<OrderItemId> = order.items.iter().filter_map(|i| i.id).collect();
        match self.items.trim() {
            "" | "all" => (!all.is_empty()).then_some(all),
            id => {
                let id: OrderItemId = id.parse().ok()?;
                all.contains(&id).then(|| vec![id])
            }
        }
    }
}

/// Query parameters of the address book page.
#[derive(Debug, Default, Deserialize)]
pub struct AddressesQuery {
    pub edit: Option<AddressId>,
}

// =============================================================================
// Templates
// =============================================================================

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Fetched<Vec<OrderView>>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderDetailTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
    pub shipment: Fetched<ShipmentView>,
    pub tracking: Fetched<TrackingView>,
    pub recipient: Fetched<String>,
    pub billing: Fetched<String>,
    pub returns: Fetched<Vec<ReturnView>>,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub ctx: PageContext,
    pub addresses: Fetched<Vec<AddressView>>,
    pub form: AddressForm,
    pub address_types: Vec<AddressTypeOption>,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// Display the order history.
#[instrument(skip(state, session, user))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> impl IntoResponse {
    let currency = state.config().currency;

    let orders = match user.id {
        Some(user_id) => {
            let result = state.backend_for(&user.token()).user_orders(user_id).await;
            Fetched::from_list(result).map(|mut orders| {
                orders.sort_by(|a, b| b.id.cmp(&a.id));
                OrderView::list(&orders, currency)
            })
        }
        None => {
            tracing::warn!(email = %user.email, "session has no user id");
            Fetched::Failed("Your order history is unavailable, please sign in again.".to_string())
        }
    };

    OrdersTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        orders,
    }
}

/// Display one order with its delivery details and returns.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
#[instrument(skip(state, session, user), fields(order_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let backend = state.backend_for(&user.token());
    let currency = state.config().currency;

    let (order, shipping, tracking, recipient, billing, returns) = tokio::join!(
        backend.order(id),
        backend.order_shipping(id),
        backend.order_tracking(id),
        backend.order_shipping_credential(id),
        backend.order_billing_credential(id),
        backend.return_requests(id),
    );

    let order = order.map_err(not_found_as(format!("order {id}")))?;

    Ok(OrderDetailTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        order: OrderView::new(&order, currency),
        shipment: Fetched::from_option(shipping).map(ShipmentView::from),
        tracking: Fetched::from_option(tracking).map(TrackingView::from),
        recipient: Fetched::from_option(recipient).map(|c| recipient_line(&c)),
        billing: Fetched::from_option(billing).map(|c| billing_line(&c)),
        returns: Fetched::from_list(returns)
            .map(|r| r.iter().map(|r| ReturnView::new(r, currency)).collect::<Vec<_>>()),
    })
}

/// Cancel an order that has not shipped yet.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
#[instrument(skip(state, session, user), fields(order_id = %id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let backend = state.backend_for(&user.token());
    let order = backend
        .order(id)
        .await
        .map_err(not_found_as(format!("order {id}")))?;

    let flash = if !order.status.is_cancellable() {
        Flash::error(format!(
            "Order #{id} is {} and can no longer be cancelled.",
            order.status.label().to_lowercase()
        ))
    } else {
        match backend.update_order_status(id, OrderStatus::Cancelled).await {
            Ok(_) => {
                let order_id = id.to_string();
                add_breadcrumb("order", "Cancelled order", Some(&[("order_id", order_id.as_str())]));
                tracing::info!("order cancelled");
                Flash::success(format!("Order #{id} has been cancelled."))
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to cancel order");
                Flash::error(e.user_message())
            }
        }
    };

    set_flash(&session, flash).await;
    Ok(Redirect::to(&format!("/account/orders/{id}")).into_response())
}

/// Open a return request for a delivered order.
///
/// # Errors
///
/// Returns 404 if the order does not exist.
#[instrument(skip(state, session, user, form), fields(order_id = %id))]
pub async fn request_return(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Form(form): Form<ReturnForm>,
) -> Result<Response> {
    let redirect = Redirect::to(&format!("/account/orders/{id}")).into_response();

    if let Err(errors) = form.validate() {
        let errors = FieldErrors::from_validation(&errors);
        let message = errors.get("reason").unwrap_or("Check the return form.");
        set_flash(&session, Flash::error(message)).await;
        return Ok(redirect);
    }

    let backend = state.backend_for(&user.token());
    let order = backend
        .order(id)
        .await
        .map_err(not_found_as(format!("order {id}")))?;

    if !order.status.is_returnable() {
        set_flash(
            &session,
            Flash::error("Returns can only be requested for delivered orders."),
        )
        .await;
        return Ok(redirect);
    }

    let Some(order_item_ids) = form.item_ids(&order) else {
        set_flash(&session, Flash::error("Choose the items to return.")).await;
        return Ok(redirect);
    };

    let request = ReturnRequestInput {
        reason: form.reason.trim().to_string(),
        order_item_ids,
        order_id: Some(id),
        refund_percentage: None,
    };

    let flash = match backend.request_return(id, &request).await {
        Ok(created) => {
            tracing::info!(return_request_id = %created.id, "return requested");
            Flash::success("Your return request has been sent to the seller.")
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to request return");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    Ok(redirect)
}

// =============================================================================
// Addresses
// =============================================================================

/// Display the address book; `?edit={id}` loads an entry into the form.
#[instrument(skip(state, session, user))]
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<AddressesQuery>,
) -> impl IntoResponse {
    let addresses = state.backend_for(&user.token()).addresses().await;

    let form = match (&addresses, query.edit) {
        (Ok(list), Some(edit)) => list
            .iter()
            .find(|a| a.id == edit)
            .map(AddressForm::from_address)
            .unwrap_or_default(),
        _ => AddressForm::default(),
    };

    AddressesTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        addresses: Fetched::from_list(addresses).map(|a| a.iter().map(AddressView::from).collect::<Vec<_>>()),
        address_types: address_type_options(form.kind()),
        form,
        errors: FieldErrors::default(),
        error: None,
    }
}

/// Create or update an address.
#[instrument(skip(state, session, user, form))]
pub async fn save_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Response {
    let backend = state.backend_for(&user.token());

    let (errors, error) = match form.validate() {
        Err(errors) => (FieldErrors::from_validation(&errors), None),
        Ok(()) => {
            let request = form.to_request();
            let result = match form.address_id() {
                Some(id) => backend.update_address(id, &request).await,
                None => backend.create_address(&request).await,
            };

            match result {
                Ok(saved) => {
                    tracing::info!(address_id = %saved.id, "address saved");
                    set_flash(&session, Flash::success("Address saved.")).await;
                    return Redirect::to("/account/addresses").into_response();
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to save address");
                    (FieldErrors::default(), Some(e.user_message()))
                }
            }
        }
    };

    let addresses = backend.addresses().await;
    AddressesTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        addresses: Fetched::from_list(addresses).map(|a| a.iter().map(AddressView::from).collect::<Vec<_>>()),
        address_types: address_type_options(form.kind()),
        form,
        errors,
        error,
    }
    .into_response()
}

/// Delete an address.
#[instrument(skip(state, session, user), fields(address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Response {
    let flash = match state.backend_for(&user.token()).delete_address(id).await {
        Ok(()) => Flash::success("Address removed."),
        Err(e) => {
            tracing::error!(error = %e, "failed to delete address");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    Redirect::to("/account/addresses").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order(status: &str) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": 12,
            "status": status,
            "items": [
                {"id": 1, "productId": 10, "quantity": 1, "price": 5},
                {"id": 2, "productId": 11, "quantity": 3, "price": 2}
            ]
        }))
        .unwrap()
    }

    fn return_form(items: &str) -> ReturnForm {
        ReturnForm {
            reason: "The lamp arrived broken".to_string(),
            items: items.to_string(),
        }
    }

    #[test]
    fn test_return_items_all_or_one() {
        let order = order("DELIVERED");
        assert_eq!(
            return_form("all").item_ids(&order),
            Some(vec![OrderItemId::new(1), OrderItemId::new(2)])
        );
        assert_eq!(return_form("2").item_ids(&order), Some(vec![OrderItemId::new(2)]));
        assert_eq!(return_form("99").item_ids(&order), None);
        assert_eq!(return_form("abc").item_ids(&order), None);
    }

    #[test]
    fn test_return_reason_is_required() {
        let form = ReturnForm {
            reason: "bad".to_string(),
            items: "all".to_string(),
        };
        let errors = FieldErrors::from_validation(&form.validate().unwrap_err());
        assert!(errors.get("reason").is_some());
    }

    #[test]
    fn test_address_form_validation() {
        let form: AddressForm = serde_json::from_value(serde_json::json!({
            "name": "Home",
            "email": "nope",
            "address_line1": "",
            "city": "Lyon",
            "postal_code": "69001",
            "country": "FR",
            "phone_number": "  "
        }))
        .unwrap();
        let errors = FieldErrors::from_validation(&form.validate().unwrap_err());

        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
        assert_eq!(errors.get("address_line1"), Some("Enter a street address"));
        assert!(errors.get("phone_number").is_none());
        assert!(errors.get("city").is_none());
    }

    #[test]
    fn test_address_form_to_request() {
        let form: AddressForm = serde_json::from_value(serde_json::json!({
            "id": "4",
            "name": "Office",
            "address_line1": "2 quai Est",
            "city": "Paris",
            "postal_code": "75001",
            "country": "FR",
            "address_type": "billing",
            "is_default": "on"
        }))
        .unwrap();
        assert!(form.validate().is_ok());
        assert_eq!(form.address_id(), Some(AddressId::new(4)));

        let request = form.to_request();
        assert_eq!(request.address_type, AddressType::Billing);
        assert!(request.is_default);
        assert_eq!(request.email, None);
    }

    #[test]
    fn test_recipient_line_skips_blank_parts() {
        let credential: OrderShippingCredential = serde_json::from_value(serde_json::json!({
            "recipientName": "Ana Diaz",
            "addressLine1": "1 rue Neuve",
            "addressLine2": "",
            "city": "Lyon",
            "postalCode": "69001",
            "country": "FR"
        }))
        .unwrap();
        assert_eq!(recipient_line(&credential), "Ana Diaz, 1 rue Neuve, 69001, Lyon, FR");
    }
}
