//! Status enums for various entities.
//!
//! All of these mirror values issued by the backend. Unknown values fall
//! back to `Unknown` where the backend has been seen to add states over time.

use serde::{Deserialize, Serialize};

/// Buyer-facing order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
    Returned,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses a seller may move an order into from the dashboard.
    pub const SELLER_TRANSITIONS: [Self; 5] = [
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire value (e.g. `OUT_FOR_DELIVERY`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::OutForDelivery => "OUT_FOR_DELIVERY",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
            Self::Returned => "RETURNED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Returned => "Returned",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the buyer may still cancel.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Processing)
    }

    /// Whether the buyer may open a return request.
    #[must_use]
    pub const fn is_returnable(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "OUT_FOR_DELIVERY" => Ok(Self::OutForDelivery),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            "RETURNED" => Ok(Self::Returned),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Shipment status reported for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingStatus {
    #[default]
    Pending,
    Shipped,
    InTransit,
    Delivered,
    Cancelled,
    Returned,
    Failed,
    #[serde(other)]
    Unknown,
}

impl ShippingStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
            Self::InTransit => "In transit",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Returned => "Returned",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

/// Return request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ReturnStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Completed => "Completed",
        }
    }
}

/// Kind of address in a user's address book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Billing,
    #[default]
    Shipping,
    Expedition,
    Contact,
}

impl AddressType {
    pub const ALL: [Self; 4] = [
        Self::Billing,
        Self::Shipping,
        Self::Expedition,
        Self::Contact,
    ];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Billing => "BILLING",
            Self::Shipping => "SHIPPING",
            Self::Expedition => "EXPEDITION",
            Self::Contact => "CONTACT",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Billing => "Billing",
            Self::Shipping => "Shipping",
            Self::Expedition => "Expedition",
            Self::Contact => "Contact",
        }
    }
}

impl std::fmt::Display for AddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BILLING" => Ok(Self::Billing),
            "SHIPPING" => Ok(Self::Shipping),
            "EXPEDITION" => Ok(Self::Expedition),
            "CONTACT" => Ok(Self::Contact),
            _ => Err(format!("invalid address type: {s}")),
        }
    }
}

/// State of a request to become a company administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdminRightsStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

/// Role names carried in the backend's auth response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ROLE_BUYER", alias = "BUYER")]
    Buyer,
    #[serde(rename = "ROLE_SELLER", alias = "SELLER")]
    Seller,
    #[serde(rename = "ROLE_COMPANY_ADMIN_SELLER", alias = "COMPANY_ADMIN_SELLER")]
    CompanyAdminSeller,
    #[serde(rename = "ROLE_APP_ADMIN", alias = "APP_ADMIN")]
    AppAdmin,
    #[serde(other)]
    Other,
}

impl UserRole {
    /// Whether this role grants access to the seller dashboards.
    #[must_use]
    pub const fn is_seller(&self) -> bool {
        matches!(
            self,
            Self::Seller | Self::CompanyAdminSeller | Self::AppAdmin
        )
    }
}
