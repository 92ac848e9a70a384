//! Fulfillment methods for carts, orders and sellers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How an order (or cart entry) is handed to the buyer.
///
/// Pickup and delivery are mutually exclusive per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentMethod {
    /// Collected in person from the seller's booth.
    #[default]
    Pickup,
    /// Shipped to a postal address.
    Delivery,
}

impl FulfillmentMethod {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }

    /// Returns true if this method requires a postal address.
    #[must_use]
    pub const fn requires_address(&self) -> bool {
        matches!(self, Self::Delivery)
    }
}

impl fmt::Display for FulfillmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fulfillment method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for FulfillmentMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickup" | "pick-up" => Ok(Self::Pickup),
            "delivery" => Ok(Self::Delivery),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// The fulfillment methods a seller offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerMethod {
    Pickup,
    Delivery,
    Both,
}

impl SellerMethod {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
            Self::Both => "both",
        }
    }

    /// Returns true if the seller accepts orders with the given method.
    #[must_use]
    pub const fn supports(&self, method: FulfillmentMethod) -> bool {
        match self {
            Self::Both => true,
            Self::Pickup => matches!(method, FulfillmentMethod::Pickup),
            Self::Delivery => matches!(method, FulfillmentMethod::Delivery),
        }
    }

    /// The method to use when the buyer is not given a choice.
    ///
    /// Returns `None` for sellers offering both.
    #[must_use]
    pub const fn only_method(&self) -> Option<FulfillmentMethod> {
        match self {
            Self::Pickup => Some(FulfillmentMethod::Pickup),
            Self::Delivery => Some(FulfillmentMethod::Delivery),
            Self::Both => None,
        }
    }
}

impl fmt::Display for SellerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
