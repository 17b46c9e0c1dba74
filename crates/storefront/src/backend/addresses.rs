//! Buyer address book.
//!
//! These endpoints wrap payloads in an [`ApiEnvelope`].

use reqwest::Method;
use shopora_core::AddressId;
use tracing::instrument;

use super::{Address, AddressRequest, ApiClient, ApiEnvelope, ApiError, NO_QUERY};

impl ApiClient {
    /// The current user's addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn addresses(&self) -> Result<Vec<Address>, ApiError> {
        let envelope: ApiEnvelope<Option<Vec<Address>>> = self
            .get_json(&["buyer", "user", "addresses"], NO_QUERY)
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Add an address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the address.
    #[instrument(skip(self, address))]
    pub async fn create_address(&self, address: &AddressRequest) -> Result<Address, ApiError> {
        let envelope: ApiEnvelope<Address> = self
            .post_json(&["buyer", "user", "addresses"], address)
            .await?;
        Ok(envelope.data)
    }

    /// Replace an address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the address.
    #[instrument(skip(self, address), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        id: AddressId,
        address: &AddressRequest,
    ) -> Result<Address, ApiError> {
        let envelope: ApiEnvelope<Address> = self
            .put_json(&["buyer", "user", "addresses", &id.to_string()], address)
            .await?;
        Ok(envelope.data)
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete_address(&self, id: AddressId) -> Result<(), ApiError> {
        self.send_empty(
            Method::DELETE,
            &["buyer", "user", "addresses", &id.to_string()],
            NO_QUERY,
        )
        .await
    }
}
