//! Events published to the presentation layer.

use goodsmall_core::{GoodsId, OrderId, Won};

use crate::cart::SelectionSummary;
use crate::error::ErrorReport;

/// A change in session state.
///
/// Subscribers re-read the session after each event; payloads carry only
/// what is cheap to copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    GoodsListUpdated { count: usize },
    CategoriesUpdated { count: usize },
    GoodsDetailLoaded(GoodsId),
    SearchCompleted { matches: usize },
    CartUpdated { pickup: usize, delivery: usize },
    SelectionChanged(SelectionSummary),
    DeliveryFeesResolved { total: Won },
    /// The order was accepted; the session is now in the submitted phase.
    OrderSubmitted { order_id: Option<OrderId> },
    OrderHistoryUpdated { count: usize },
    /// A goods detail needed by a confirmation arrived.
    GoodsPrefetched(GoodsId),
    ScrapChanged {
        goods_id: GoodsId,
        scraped: bool,
        scrap_count: u32,
    },
    ScrapListUpdated { count: usize },
    EmailChecked { available: bool },
    SignedUp,
    ErrorRaised(ErrorReport),
    ErrorDismissed,
    Reset,
}
