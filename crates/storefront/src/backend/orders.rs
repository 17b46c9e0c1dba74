//! Buyer order endpoints: orders, delivery details, tracking, returns, refunds.
//!
//! Every call here needs a buyer token (see [`ApiClient::with_token`]) and is
//! never cached.

use reqwest::Method;
use shopora_core::{OrderId, OrderStatus, ReturnRequestId, UserId};
use tracing::instrument;

use super::{
    ApiClient, ApiError, CreateOrderRequest, NO_QUERY, Order, OrderBillingCredential,
    OrderShipping, OrderShippingCredential, OrderStatusUpdate, Refund, ReturnRequest,
    ReturnRequestInput, ShippingTracking, optional,
};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectionQuery<'a> {
    rejection_reason: &'a str,
}

impl ApiClient {
    /// Place an order from the current cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the checkout.
    #[instrument(skip(self, request))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        self.post_json(&["buyer", "orders"], request).await
    }

    /// All orders placed by a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_orders(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        self.get_json(&["buyer", "orders", "user", &user_id.to_string()], NO_QUERY)
            .await
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: OrderId) -> Result<Order, ApiError> {
        self.get_json(&["buyer", "orders", &id.to_string()], NO_QUERY)
            .await
    }

    /// Move an order to a new status (e.g. cancel it).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the transition is not allowed.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, ApiError> {
        self.put_json(
            &["buyer", "orders", &id.to_string(), "status"],
            &OrderStatusUpdate { status },
        )
        .await
    }

    // =========================================================================
    // Delivery details
    // =========================================================================

    /// Shipment details, `None` until the seller creates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any reason other than 404.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_shipping(&self, id: OrderId) -> Result<Option<OrderShipping>, ApiError> {
        optional(
            self.get_json(
                &["buyer", "orders", &id.to_string(), "details", "shipping"],
                NO_QUERY,
            )
            .await,
        )
    }

    /// Recipient details, `None` until provided.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any reason other than 404.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_shipping_credential(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderShippingCredential>, ApiError> {
        optional(
            self.get_json(
                &["buyer", "orders", &id.to_string(), "details", "shipping-credential"],
                NO_QUERY,
            )
            .await,
        )
    }

    /// Save recipient details; creates them or updates existing ones.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the details.
    #[instrument(skip(self, credential), fields(order_id = %id))]
    pub async fn save_order_shipping_credential(
        &self,
        id: OrderId,
        credential: &OrderShippingCredential,
        exists: bool,
    ) -> Result<OrderShippingCredential, ApiError> {
        let order_id = id.to_string();
        let segments = ["buyer", "orders", &order_id, "details", "shipping-credential"];
        if exists {
            self.put_json(&segments, credential).await
        } else {
            self.post_json(&segments, credential).await
        }
    }

    /// Billing details, `None` until provided.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any reason other than 404.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_billing_credential(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderBillingCredential>, ApiError> {
        optional(
            self.get_json(
                &["buyer", "orders", &id.to_string(), "details", "billing-credential"],
                NO_QUERY,
            )
            .await,
        )
    }

    /// Save billing details; creates them or updates existing ones.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the details.
    #[instrument(skip(self, credential), fields(order_id = %id))]
    pub async fn save_order_billing_credential(
        &self,
        id: OrderId,
        credential: &OrderBillingCredential,
        exists: bool,
    ) -> Result<OrderBillingCredential, ApiError> {
        let order_id = id.to_string();
        let segments = ["buyer", "orders", &order_id, "details", "billing-credential"];
        if exists {
            self.put_json(&segments, credential).await
        } else {
            self.post_json(&segments, credential).await
        }
    }

    // =========================================================================
    // Post-order
    // =========================================================================

    /// Carrier tracking, `None` until the order ships.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails for any reason other than 404.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order_tracking(&self, id: OrderId) -> Result<Option<ShippingTracking>, ApiError> {
        optional(
            self.get_json(
                &["buyer", "post-order", "tracking", &id.to_string()],
                NO_QUERY,
            )
            .await,
        )
    }

    /// Return requests opened for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn return_requests(&self, id: OrderId) -> Result<Vec<ReturnRequest>, ApiError> {
        let result = self
            .get_json(&["buyer", "post-order", "return", &id.to_string()], NO_QUERY)
            .await;
        optional(result).map(Option::unwrap_or_default)
    }

    /// Open a return request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the request.
    #[instrument(skip(self, request), fields(order_id = %id))]
    pub async fn request_return(
        &self,
        id: OrderId,
        request: &ReturnRequestInput,
    ) -> Result<ReturnRequest, ApiError> {
        self.post_json(&["buyer", "post-order", "return", &id.to_string()], request)
            .await
    }

    /// Approve a return request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(return_request_id = %id))]
    pub async fn approve_return(&self, id: ReturnRequestId) -> Result<ReturnRequest, ApiError> {
        let url = self.url(&["buyer", "post-order", "return", "approve", &id.to_string()])?;
        self.send(self.request(Method::POST, url)).await
    }

    /// Reject a return request with a reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(return_request_id = %id))]
    pub async fn reject_return(
        &self,
        id: ReturnRequestId,
        rejection_reason: &str,
    ) -> Result<ReturnRequest, ApiError> {
        let url = self.url(&["buyer", "post-order", "return", "reject", &id.to_string()])?;
        self.send(
            self.request(Method::POST, url)
                .query(&RejectionQuery { rejection_reason }),
        )
        .await
    }

    /// Issue the refund for an approved return.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(return_request_id = %id))]
    pub async fn process_refund(&self, id: ReturnRequestId) -> Result<Refund, ApiError> {
        let url = self.url(&["buyer", "post-order", "refund", &id.to_string()])?;
        self.send(self.request(Method::POST, url)).await
    }
}
