//! Request and response types for the e-commerce REST backend.
//!
//! Catalog types (products, categories, pages) live in `shopora_core::catalog`
//! and are re-exported here; everything else the storefront exchanges with
//! the backend is defined below. JSON field names are camelCase.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use shopora_core::catalog::{Category, PageResponse, Product, ProductImageAttach, ProductVariant};
use shopora_core::{
    AddressId, AddressType, AdminRightsId, AdminRightsStatus, CartItemId, CategoryId, CompanyId, OrderId,
    OrderItemId, OrderStatus, ProductId, ReturnRequestId, ReturnStatus, ShippingStatus, UserId,
    UserRole,
};

// =============================================================================
// Envelopes
// =============================================================================

/// Wrapper used by the address endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
}

/// Page request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

// =============================================================================
// Search
// =============================================================================

/// Server-side product search parameters (`/api/v1/products/search`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// A buyer's cart. Totals are computed by the backend; older payloads omit
/// some of them, so each accessor falls back to the lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cart {
    pub id: Option<i64>,
    pub items: Vec<CartItem>,
    pub coupon_response: Option<CartCoupon>,
    pub subtotal_price: Option<Decimal>,
    pub total_shipping_cost: Option<Decimal>,
    pub total_discount: Option<Decimal>,
    pub total_amount: Option<Decimal>,
}

impl Cart {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.subtotal_price
            .unwrap_or_else(|| self.items.iter().map(CartItem::line_total).sum())
    }

    #[must_use]
    pub fn shipping(&self) -> Decimal {
        self.total_shipping_cost.unwrap_or_default()
    }

    #[must_use]
    pub fn discount(&self) -> Decimal {
        self.total_discount.unwrap_or_default()
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total_amount
            .unwrap_or_else(|| (self.subtotal() + self.shipping() - self.discount()).max(Decimal::ZERO))
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Code of the applied coupon, if any.
    #[must_use]
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_response
            .as_ref()
            .and_then(|c| c.code.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i64,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Coupon applied to a cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartCoupon {
    pub code: Option<String>,
    pub discount: Option<Decimal>,
}

/// Body of an add-to-cart call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Result of applying a coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub cart_response: Option<Cart>,
}

// =============================================================================
// Orders
// =============================================================================

/// A buyer or seller order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub subtotal: Option<Decimal>,
    #[serde(default)]
    pub tax: Option<Decimal>,
    #[serde(default)]
    pub shipping: Option<Decimal>,
    #[serde(default)]
    pub shipping_cost: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<OrderAddress>,
}

impl Order {
    /// Total charged, whichever field the backend filled.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.total
            .or(self.total_amount)
            .unwrap_or_else(|| self.items.iter().map(OrderItem::line_total).sum())
    }

    /// Shipping charged, whichever field the backend filled.
    #[must_use]
    pub fn shipping_charge(&self) -> Decimal {
        self.shipping.or(self.shipping_cost).unwrap_or_default()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// A line in an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub total: Option<Decimal>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.total
            .unwrap_or_else(|| self.price * Decimal::from(self.quantity))
    }
}

/// Shipping address embedded in an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Checkout request placing an order from the buyer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_cart_item_ids: Option<Vec<CartItemId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_coupon_id: Option<String>,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
}

/// Body of order status updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Seller order listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerOrderFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

/// Fulfillment details posted by a seller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
}

/// Shipment attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderShipping {
    pub id: i64,
    #[serde(default)]
    pub shipping_carrier: String,
    #[serde(default)]
    pub shipping_method: String,
    #[serde(default)]
    pub shipping_method_currency: Option<String>,
    #[serde(default)]
    pub shipping_price: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub shipping_quantity: Option<i64>,
    #[serde(default)]
    pub shipping_weight: Option<String>,
    #[serde(default)]
    pub shipped_at: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<String>,
    #[serde(default)]
    pub status: ShippingStatus,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

/// Recipient details for an order's delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderShippingCredential {
    #[serde(default)]
    pub id: Option<i64>,
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_email: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

impl OrderShippingCredential {
    /// Recipient details copied from an address book entry.
    #[must_use]
    pub fn from_address(address: &Address, order_id: OrderId) -> Self {
        Self {
            id: None,
            recipient_name: address.name.clone(),
            recipient_email: address.email.clone().unwrap_or_default(),
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone_number: address.phone_number.clone(),
            reference: address.reference.clone(),
            order_id: Some(order_id),
        }
    }
}

/// Billing details for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBillingCredential {
    #[serde(default)]
    pub id: Option<i64>,
    pub billing_client_name: String,
    #[serde(default)]
    pub billing_client_email: String,
    pub billing_address_line1: String,
    #[serde(default)]
    pub billing_address_line2: Option<String>,
    pub billing_city: String,
    pub billing_postal_code: String,
    pub billing_country: String,
    #[serde(default)]
    pub billing_phone_number: Option<String>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

impl OrderBillingCredential {
    /// Billing details copied from an address book entry.
    #[must_use]
    pub fn from_address(address: &Address, order_id: OrderId) -> Self {
        Self {
            id: None,
            billing_client_name: address.name.clone(),
            billing_client_email: address.email.clone().unwrap_or_default(),
            billing_address_line1: address.address_line1.clone(),
            billing_address_line2: address.address_line2.clone(),
            billing_city: address.city.clone(),
            billing_postal_code: address.postal_code.clone(),
            billing_country: address.country.clone(),
            billing_phone_number: address.phone_number.clone(),
            order_id: Some(order_id),
        }
    }
}

/// Carrier tracking state for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingTracking {
    #[serde(default)]
    pub id: Option<i64>,
    pub tracking_number: String,
    #[serde(default)]
    pub carrier_status: String,
    #[serde(default)]
    pub estimated_delivery_date: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

/// Buyer request to return items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequestInput {
    pub reason: String,
    pub order_item_ids: Vec<OrderItemId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_percentage: Option<Decimal>,
}

/// A return request and its review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub id: ReturnRequestId,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: ReturnStatus,
    #[serde(default)]
    pub request_date: Option<String>,
    #[serde(default)]
    pub refund_amount: Option<Decimal>,
    #[serde(default)]
    pub refund_percentage: Option<Decimal>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub order_item_ids: Vec<OrderItemId>,
}

/// A refund issued for an approved return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: i64,
    #[serde(default)]
    pub refund_date: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub return_request_id: Option<ReturnRequestId>,
}

// =============================================================================
// Addresses
// =============================================================================

/// An entry in the buyer's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Single-line rendering for selectors and summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        if let Some(line2) = self.address_line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        parts.push(&self.postal_code);
        parts.push(&self.city);
        parts.push(&self.country);
        parts.join(", ")
    }
}

/// Create/update body for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub address_type: AddressType,
    pub is_default: bool,
}

// =============================================================================
// Seller
// =============================================================================

/// Create/update body for a seller product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerProductRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<Decimal>,
    pub quantity: i64,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub product_status: String,
    pub product_sell_type: String,
    pub product_condition: String,
}

/// An image uploaded alongside a seller product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantityUpdate {
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceUpdate {
    pub price: Decimal,
}

/// Stock adjustment with an optional audit reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockUpdate {
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LowStockAlert {
    pub threshold: i64,
}

/// Headline numbers for the seller dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SellerDashboardStats {
    pub total_products: i64,
    pub active_products: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_revenue: Decimal,
    pub monthly_revenue: Decimal,
    pub average_order_value: Decimal,
    pub top_selling_products: Vec<TopSellingProduct>,
    pub recent_orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSellingProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sold_quantity: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

/// Stock levels for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub reserved_stock: i64,
    #[serde(default)]
    pub available_stock: i64,
    #[serde(default)]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub is_low_stock: bool,
    #[serde(default)]
    pub last_updated: Option<String>,
}

// =============================================================================
// Companies and roles
// =============================================================================

/// A seller company with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub admins: Vec<CompanyMember>,
    #[serde(default)]
    pub sellers: Vec<CompanyMember>,
}

/// An admin or seller belonging to a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMember {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub joined_at: Option<String>,
}

impl CompanyMember {
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// Details submitted when applying to become a company admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// A pending or processed request for company admin rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRightsRequest {
    pub id: AdminRightsId,
    pub company_id: CompanyId,
    pub user_id: UserId,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub status: AdminRightsStatus,
    #[serde(default)]
    pub requested_at: Option<String>,
    #[serde(default)]
    pub processed_at: Option<String>,
}

/// Body of `update-admin-rights`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRightsUpdate {
    pub rights: Vec<String>,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_roles: Vec<UserRole>,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("user_roles", &self.user_roles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_totals_fall_back() {
        let json = r#"{
            "id": 10,
            "status": "SHIPPED",
            "items": [
                {"productId": 1, "quantity": 2, "price": 5},
                {"productId": 2, "quantity": 1, "price": 3.5, "total": 3.5}
            ],
            "shippingCost": 4
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.grand_total(), Decimal::new(135, 1));
        assert_eq!(order.shipping_charge(), Decimal::from(4));
        assert_eq!(order.item_count(), 3);

        let with_total: Order =
            serde_json::from_str(r#"{"id": 11, "totalAmount": 99.99}"#).unwrap();
        assert_eq!(with_total.grand_total(), Decimal::new(9999, 2));
        assert_eq!(with_total.status, OrderStatus::Pending);
    }

    #[test]
    fn test_create_order_request_skips_absent_fields() {
        let request = CreateOrderRequest {
            selected_cart_item_ids: None,
            used_coupon_id: None,
            shipping_address_id: AddressId::new(1),
            billing_address_id: AddressId::new(2),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"shippingAddressId": 1, "billingAddressId": 2}));
    }

    #[test]
    fn test_cart_totals_fall_back_to_lines() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "id": 3,
            "items": [
                {"id": 30, "productId": 1, "productName": "Lamp", "price": 20, "quantity": 2},
                {"id": 31, "productId": 2, "price": 5.5, "quantity": 1}
            ],
            "totalShippingCost": 4,
            "totalDiscount": 10
        }))
        .unwrap();
        assert_eq!(cart.subtotal(), Decimal::new(455, 1));
        assert_eq!(cart.total(), Decimal::new(395, 1));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.coupon_code(), None);

        let priced: Cart = serde_json::from_value(serde_json::json!({
            "items": [],
            "totalAmount": 12,
            "couponResponse": {"code": "SPRING"}
        }))
        .unwrap();
        assert_eq!(priced.total(), Decimal::from(12));
        assert_eq!(priced.coupon_code(), Some("SPRING"));
    }

    #[test]
    fn test_credentials_copy_address() {
        let address: Address = serde_json::from_value(serde_json::json!({
            "id": 4, "name": "Ana Diaz", "email": "ana@example.com", "addressLine1": "1 rue Neuve",
            "city": "Lyon", "postalCode": "69001", "country": "FR"
        }))
        .unwrap();

        let shipping = OrderShippingCredential::from_address(&address, OrderId::new(9));
        assert_eq!(shipping.recipient_name, "Ana Diaz");
        assert_eq!(shipping.order_id, Some(OrderId::new(9)));

        let billing = OrderBillingCredential::from_address(&address, OrderId::new(9));
        assert_eq!(billing.billing_client_email, "ana@example.com");
        assert_eq!(billing.billing_city, "Lyon");
    }

    #[test]
    fn test_address_envelope() {
        let json = r#"{
            "data": [{"id": 1, "name": "Home", "addressLine1": "1 rue de Paris", "city": "Lyon",
                      "postalCode": "69001", "country": "FR", "addressType": "BILLING", "isDefault": true}],
            "message": "ok",
            "status": 200
        }"#;
        let envelope: ApiEnvelope<Vec<Address>> = serde_json::from_str(json).unwrap();
        let address = envelope.data.first().unwrap();
        assert_eq!(address.address_type, AddressType::Billing);
        assert_eq!(address.one_line(), "1 rue de Paris, 69001, Lyon, FR");
    }

    #[test]
    fn test_auth_response_debug_redacts_token() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"token": "jwt-value", "email": "a@b.c", "userRoles": ["ROLE_BUYER"]}"#,
        )
        .unwrap();
        assert!(!format!("{response:?}").contains("jwt-value"));
        assert_eq!(response.user_roles, vec![UserRole::Buyer]);
    }

    #[test]
    fn test_company_member_display_name() {
        let member: CompanyMember =
            serde_json::from_str(r#"{"id": 1, "email": "s@shop.fr"}"#).unwrap();
        assert_eq!(member.display_name(), "s@shop.fr");
    }
}
