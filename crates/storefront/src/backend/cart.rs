//! Buyer cart.
//!
//! Every call acts on the cart of the token's owner; a missing cart reads as
//! an empty one.

use reqwest::Method;
use shopora_core::{CartItemId, ProductId};
use tracing::instrument;

use super::{
    AddToCartRequest, ApiClient, ApiError, AppliedCoupon, Cart, NO_QUERY, PageRequest, optional,
};

const CART: [&str; 3] = ["buyer", "v1", "cart"];

fn cart_path<'a>(rest: &[&'a str]) -> Vec<&'a str> {
    CART.iter().copied().chain(rest.iter().copied()).collect()
}

impl ApiClient {
    /// The current user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn cart(&self, page: PageRequest) -> Result<Cart, ApiError> {
        let cart = optional(self.get_json(&CART, &page).await)?;
        Ok(cart.unwrap_or_default())
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the product cannot be added.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: i64) -> Result<Cart, ApiError> {
        let body = AddToCartRequest {
            product_id,
            quantity,
        };
        self.post_json(&cart_path(&["add"]), &body).await
    }

    /// Change the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_cart_item(&self, item_id: CartItemId, quantity: i64) -> Result<Cart, ApiError> {
        let id = item_id.to_string();
        self.query_json(Method::PUT, &cart_path(&["update", &id]), &[("quantity", quantity)])
            .await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        let id = item_id.to_string();
        self.send_empty(Method::DELETE, &cart_path(&["remove", &id]), NO_QUERY)
            .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &cart_path(&["clear"]), NO_QUERY)
            .await
    }

    /// Apply a coupon code to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` or `ApiError::NotFound` for unusable codes.
    #[instrument(skip(self))]
    pub async fn apply_coupon(&self, code: &str) -> Result<AppliedCoupon, ApiError> {
        self.query_json(
            Method::POST,
            &cart_path(&["apply-coupon"]),
            &[("couponIdentifier", code)],
        )
        .await
    }

    /// Drop the applied coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn remove_coupon(&self) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &cart_path(&["remove-coupon"]), NO_QUERY)
            .await
    }
}
