//! Domain types for the goods mall API.
//!
//! These mirror the JSON resources the server returns (camelCase keys) and
//! the request bodies the client sends.

use chrono::NaiveDateTime;
use goodsmall_core::{
    CartId, CategoryId, Email, FulfillmentMethod, GoodsId, OrderId, SellerId, SellerMethod, Won,
    Zipcode,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog Types
// =============================================================================

/// A seller (student council, club, or department shop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: SellerId,
    pub name: String,
    /// Fulfillment methods the seller accepts.
    pub method: SellerMethod,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub sns: Option<String>,
}

/// A stored goods image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsImage {
    /// Original upload file name.
    pub ori_img_name: String,
    #[serde(default)]
    pub img_url: Option<String>,
}

/// A purchasable color/size option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsOption {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

/// A goods item as returned by the list and detail endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goods {
    pub id: GoodsId,
    pub title: String,
    /// Unit price.
    pub price: Won,
    /// Seller's delivery fee for delivery orders.
    #[serde(default)]
    pub delivery_fee: Won,
    #[serde(default)]
    pub description: Option<String>,
    pub seller: Seller,
    /// Whether the signed-in user has scrapped this item.
    #[serde(default)]
    pub scraped: bool,
    #[serde(default)]
    pub scrap_count: u32,
    /// Number of entries in the signed-in user's cart (list responses only).
    #[serde(default)]
    pub cart_item_count: Option<u32>,
    #[serde(default)]
    pub rep_image: Option<GoodsImage>,
    #[serde(default)]
    pub goods_images: Vec<GoodsImage>,
    #[serde(default)]
    pub goods_infos: Vec<GoodsOption>,
}

/// A goods category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// The synthetic category listing every goods item.
    #[must_use]
    pub fn all_products() -> Self {
        Self {
            id: CategoryId::ALL,
            name: "ALLPRODUCT".to_string(),
        }
    }
}

/// Response to a scrap add/remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapCount {
    pub scrap_count: u32,
}

// =============================================================================
// Cart Types
// =============================================================================

/// An entry in the user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: CartId,
    pub item_id: GoodsId,
    pub title: String,
    pub seller: Seller,
    /// Line price (unit price × quantity), computed by the server.
    pub price: Won,
    pub quantity: u32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub cart_method: FulfillmentMethod,
    #[serde(default)]
    pub rep_image: Option<GoodsImage>,
}

/// Body of an add-to-cart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAddRequest {
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub cart_method: FulfillmentMethod,
}

// =============================================================================
// Order Types
// =============================================================================

/// A postal address for delivery orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub zipcode: Zipcode,
    pub main_address: String,
    #[serde(default)]
    pub detail_address: Option<String>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Absent while composing; assigned by the server on confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<GoodsId>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
    /// Line price (unit price × quantity).
    pub price: Won,
    /// Fulfillment status, null until the server assigns one.
    #[serde(default)]
    pub order_status: Option<String>,
}

/// The server's record of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    #[serde(default)]
    pub id: Option<OrderId>,
    pub buyer_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub seller: Option<Seller>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub order_method: Option<FulfillmentMethod>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub delivery_request: Option<String>,
    pub order_items: Vec<OrderItem>,
    #[serde(default, rename = "cartIdList")]
    pub cart_id_list: Option<Vec<CartId>>,
}

impl OrderConfirmation {
    /// Distinct goods ids referenced by the order's items, in first-seen order.
    #[must_use]
    pub fn goods_ids(&self) -> Vec<GoodsId> {
        let mut ids = Vec::new();
        for id in self.order_items.iter().filter_map(|item| item.item_id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

// =============================================================================
// Account Types
// =============================================================================

/// Body of a sign-up request.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: Email,
    pub password: String,
    pub user_name: String,
    /// Birth date as `YYYYMMDD`.
    pub birth: String,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("user_name", &self.user_name)
            .field("birth", &self.birth)
            .finish()
    }
}

/// Response to an email availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAvailability {
    pub available: bool,
}
