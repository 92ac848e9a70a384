//! Delivery fee resolution for cart-sourced orders.
//!
//! Cart entries do not carry the seller's delivery fee, so a delivery order
//! built from the cart looks every distinct goods item up once. Each seller
//! is charged once, however many of its goods are in the order.

use std::collections::HashMap;
use std::future::Future;

use futures::future::join_all;
use goodsmall_core::{GoodsId, SellerId, Won};
use tracing::{debug, instrument, warn};

use crate::api::{Goods, GoodsMallClient, OrderItem};
use crate::error::ApiError;

/// Source of goods details used for fee resolution and prefetching.
pub trait GoodsLookup: Send + Sync {
    /// Look one goods item up.
    fn lookup_goods(&self, id: GoodsId) -> impl Future<Output = Result<Goods, ApiError>> + Send;
}

impl GoodsLookup for GoodsMallClient {
    fn lookup_goods(&self, id: GoodsId) -> impl Future<Output = Result<Goods, ApiError>> + Send {
        Self::lookup_goods(self, id)
    }
}

/// Resolved delivery fees, keyed by goods id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryFees {
    fees: HashMap<GoodsId, (SellerId, Won)>,
}

impl DeliveryFees {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fee of a looked-up goods item.
    pub fn record(&mut self, goods: &Goods) {
        self.fees
            .insert(goods.id, (goods.seller.id, goods.delivery_fee));
    }

    #[must_use]
    pub fn contains(&self, id: GoodsId) -> bool {
        self.fees.contains_key(&id)
    }

    #[must_use]
    pub fn fee_for(&self, id: GoodsId) -> Option<Won> {
        self.fees.get(&id).map(|(_, fee)| *fee)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fees.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fees.is_empty()
    }

    /// Distinct ids not yet resolved, in input order.
    #[must_use]
    pub fn unresolved(&self, ids: &[GoodsId]) -> Vec<GoodsId> {
        let mut pending = Vec::new();
        for id in ids {
            if !self.contains(*id) && !pending.contains(id) {
                pending.push(*id);
            }
        }
        pending
    }

    /// Sum of fees with each seller counted once at its largest fee.
    #[must_use]
    pub fn total(&self) -> Won {
        let mut per_seller: HashMap<SellerId, Won> = HashMap::new();
        for (seller, fee) in self.fees.values() {
            let charged = per_seller.entry(*seller).or_insert(Won::ZERO);
            *charged = (*charged).max(*fee);
        }
        per_seller.values().sum()
    }

    pub fn clear(&mut self) {
        self.fees.clear();
    }
}

/// Look up every unresolved id concurrently and record its fee.
///
/// Ids already in `fees` are skipped. If any lookup fails, the remaining
/// ids are tried once more before the error is returned.
///
/// # Errors
///
/// Returns the first lookup error of the second attempt.
#[instrument(skip(lookup, fees, ids), fields(requested = ids.len()))]
pub async fn resolve_delivery_fees<L: GoodsLookup>(
    lookup: &L,
    fees: &mut DeliveryFees,
    ids: &[GoodsId],
) -> Result<(), ApiError> {
    match resolve_once(lookup, fees, ids).await {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!(error = %err, "Delivery fee resolution failed, retrying once");
            resolve_once(lookup, fees, ids).await
        }
    }
}

async fn resolve_once<L: GoodsLookup>(
    lookup: &L,
    fees: &mut DeliveryFees,
    ids: &[GoodsId],
) -> Result<(), ApiError> {
    let pending = fees.unresolved(ids);
    if pending.is_empty() {
        return Ok(());
    }
    debug!(pending = pending.len(), "Resolving delivery fees");

    let results = join_all(pending.iter().map(|id| lookup.lookup_goods(*id))).await;

    let mut first_error = None;
    for result in results {
        match result {
            Ok(goods) => fees.record(&goods),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Order total: line prices plus resolved delivery fees.
#[must_use]
pub fn order_total(items: &[OrderItem], fees: &DeliveryFees) -> Won {
    items.iter().map(|item| item.price).sum::<Won>() + fees.total()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::api::Seller;
    use goodsmall_core::SellerMethod;
    use std::sync::Mutex;

    pub(crate) fn goods(id: i64, seller: i64, price: i64, fee: i64) -> Goods {
        Goods {
            id: GoodsId::new(id),
            title: format!("goods {id}"),
            price: Won::new(price),
            delivery_fee: Won::new(fee),
            description: None,
            seller: Seller {
                id: SellerId::new(seller),
                name: format!("seller {seller}"),
                method: SellerMethod::Both,
                phone_number: None,
                sns: None,
            },
            scraped: false,
            scrap_count: 0,
            cart_item_count: None,
            rep_image: None,
            goods_images: Vec::new(),
            goods_infos: Vec::new(),
        }
    }

    /// In-memory lookup that records calls and can fail a number of times.
    pub(crate) struct FakeLookup {
        goods: HashMap<GoodsId, Goods>,
        calls: Mutex<Vec<GoodsId>>,
        failures_left: Mutex<usize>,
    }

    impl FakeLookup {
        pub(crate) fn new(goods: Vec<Goods>) -> Self {
            Self {
                goods: goods.into_iter().map(|g| (g.id, g)).collect(),
                calls: Mutex::new(Vec::new()),
                failures_left: Mutex::new(0),
            }
        }

        pub(crate) fn failing(self, times: usize) -> Self {
            *self.failures_left.lock().unwrap() = times;
            self
        }

        pub(crate) fn calls(&self) -> Vec<GoodsId> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GoodsLookup for FakeLookup {
        fn lookup_goods(
            &self,
            id: GoodsId,
        ) -> impl Future<Output = Result<Goods, ApiError>> + Send {
            self.calls.lock().unwrap().push(id);
            let result = {
                let mut failures = self.failures_left.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    Err(ApiError::NoNetwork)
                } else {
                    self.goods
                        .get(&id)
                        .cloned()
                        .ok_or(ApiError::InvalidResponse { status: 404 })
                }
            };
            async move { result }
        }
    }

    #[tokio::test]
    async fn test_two_sellers_fee_total() {
        let lookup = FakeLookup::new(vec![goods(1, 10, 10_000, 3_000), goods(2, 20, 5_000, 0)]);
        let mut fees = DeliveryFees::new();

        resolve_delivery_fees(&lookup, &mut fees, &[GoodsId::new(1), GoodsId::new(2)])
            .await
            .unwrap();

        let items = vec![
            OrderItem::from_detail(Won::new(10_000), 1, None, None),
            OrderItem::from_detail(Won::new(5_000), 1, None, None),
        ];
        assert_eq!(fees.total(), Won::new(3_000));
        assert_eq!(order_total(&items, &fees), Won::new(18_000));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let lookup = FakeLookup::new(vec![goods(1, 10, 10_000, 3_000)]);
        let mut fees = DeliveryFees::new();
        let ids = [GoodsId::new(1), GoodsId::new(1)];

        resolve_delivery_fees(&lookup, &mut fees, &ids).await.unwrap();
        resolve_delivery_fees(&lookup, &mut fees, &ids).await.unwrap();

        assert_eq!(lookup.calls(), vec![GoodsId::new(1)]);
        assert_eq!(fees.total(), Won::new(3_000));
    }

    #[tokio::test]
    async fn test_seller_charged_once() {
        let lookup = FakeLookup::new(vec![
            goods(1, 10, 10_000, 3_000),
            goods(2, 10, 8_000, 2_500),
            goods(3, 30, 4_000, 4_000),
        ]);
        let mut fees = DeliveryFees::new();

        resolve_delivery_fees(
            &lookup,
            &mut fees,
            &[GoodsId::new(1), GoodsId::new(2), GoodsId::new(3)],
        )
        .await
        .unwrap();

        assert_eq!(fees.len(), 3);
        assert_eq!(fees.total(), Won::new(7_000));
    }

    #[tokio::test]
    async fn test_retried_once_then_succeeds() {
        let lookup =
            FakeLookup::new(vec![goods(1, 10, 10_000, 3_000), goods(2, 20, 5_000, 0)]).failing(1);
        let mut fees = DeliveryFees::new();

        resolve_delivery_fees(&lookup, &mut fees, &[GoodsId::new(1), GoodsId::new(2)])
            .await
            .unwrap();

        assert_eq!(fees.len(), 2);
        assert_eq!(lookup.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_failure_surfaces_error() {
        let lookup = FakeLookup::new(vec![goods(1, 10, 10_000, 3_000)]).failing(2);
        let mut fees = DeliveryFees::new();

        let err = resolve_delivery_fees(&lookup, &mut fees, &[GoodsId::new(1)])
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::NoNetwork);
        assert!(fees.is_empty());
        assert_eq!(lookup.calls().len(), 2);
    }
}
