//! Replayable session operations.

use goodsmall_core::{CartId, CategoryId, Email, GoodsId};

use crate::api::{CartAddRequest, SignUpRequest};
use crate::order::OrderSubmission;

/// A network operation the session can run, and re-run on retry.
///
/// Each variant carries its full payload, so a retry sends exactly what the
/// failed attempt sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    FetchGoodsList,
    FetchGoodsByCategory(CategoryId),
    FetchCategories,
    FetchGoodsDetail(GoodsId),
    Search(String),
    FetchCart,
    AddToCart {
        goods_id: GoodsId,
        request: CartAddRequest,
    },
    UpdateCartQuantity {
        cart_id: CartId,
        quantity: u32,
    },
    DeleteCartEntry(CartId),
    DeleteCartEntries(Vec<CartId>),
    ResolveDeliveryFees(Vec<GoodsId>),
    SubmitOrder(OrderSubmission),
    FetchOrderHistory,
    AddScrap(GoodsId),
    RemoveScrap(GoodsId),
    FetchScrapList,
    CheckEmail(Email),
    SignUp(SignUpRequest),
}

impl Operation {
    /// Short name for logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FetchGoodsList => "fetch_goods_list",
            Self::FetchGoodsByCategory(_) => "fetch_goods_by_category",
            Self::FetchCategories => "fetch_categories",
            Self::FetchGoodsDetail(_) => "fetch_goods_detail",
            Self::Search(_) => "search",
            Self::FetchCart => "fetch_cart",
            Self::AddToCart { .. } => "add_to_cart",
            Self::UpdateCartQuantity { .. } => "update_cart_quantity",
            Self::DeleteCartEntry(_) => "delete_cart_entry",
            Self::DeleteCartEntries(_) => "delete_cart_entries",
            Self::ResolveDeliveryFees(_) => "resolve_delivery_fees",
            Self::SubmitOrder(_) => "submit_order",
            Self::FetchOrderHistory => "fetch_order_history",
            Self::AddScrap(_) => "add_scrap",
            Self::RemoveScrap(_) => "remove_scrap",
            Self::FetchScrapList => "fetch_scrap_list",
            Self::CheckEmail(_) => "check_email",
            Self::SignUp(_) => "sign_up",
        }
    }

    /// Returns true for cart edits, which are followed by a cart refetch.
    #[must_use]
    pub const fn refreshes_cart(&self) -> bool {
        matches!(
            self,
            Self::AddToCart { .. }
                | Self::UpdateCartQuantity { .. }
                | Self::DeleteCartEntry(_)
                | Self::DeleteCartEntries(_)
        )
    }
}
