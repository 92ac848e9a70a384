//! Session state for one signed-in (or anonymous) user.
//!
//! # Architecture
//!
//! - [`Session`] owns every piece of presentation-visible state
//! - All mutation goes through `&mut self` methods, so there is one writer
//! - Network work is expressed as an [`Operation`]; a failed operation is
//!   kept so [`Session::retry`] can replay it unchanged
//! - Changes are announced on a broadcast channel of [`SessionEvent`]s
//!
//! # Order flow
//!
//! ```text
//! Composing --submit_order (ok)--> Submitted --start_new_order--> Composing
//!     ^                                |
//!     +---------- submit fails --------+ (stays Composing, error surfaced)
//! ```

mod events;
mod operation;

use std::collections::HashMap;

use futures::StreamExt;
use futures::future::join_all;
use futures::stream::FuturesUnordered;
use goodsmall_core::{CartId, CategoryId, Email, FulfillmentMethod, GoodsId, Won};
use rand::seq::SliceRandom;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::api::{
    CartAddRequest, CartEntry, Category, Goods, GoodsMallClient, OrderConfirmation, OrderItem,
};
use crate::cart::{CartBook, SelectionSummary};
use crate::catalog;
use crate::error::{ApiError, ErrorReport, add_breadcrumb};
use crate::fees::{self, DeliveryFees};
use crate::order::{self, OrderContact, OrderSource, OrderSubmission, OrderValidationError};
use crate::signup::{SignUpForm, SignUpValidationError};

pub use events::SessionEvent;
pub use operation::Operation;

/// Capacity of the event channel; slow subscribers miss older events.
const EVENT_CAPACITY: usize = 64;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    InvalidOrder(#[from] OrderValidationError),
    #[error(transparent)]
    InvalidSignUp(#[from] SignUpValidationError),
    #[error("no goods detail is loaded")]
    NoGoodsSelected,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("no cart entries selected")]
    EmptySelection,
    #[error("seller does not offer {0}")]
    MethodUnavailable(FulfillmentMethod),
    #[error("nothing to retry")]
    NothingToRetry,
}

/// Where the order screen is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderPhase {
    #[default]
    Composing,
    Submitted(Box<OrderConfirmation>),
}

/// Client-side session state.
pub struct Session {
    client: GoodsMallClient,
    token: Option<SecretString>,
    events: broadcast::Sender<SessionEvent>,

    goods_list: Vec<Goods>,
    categories: Vec<Category>,
    goods_detail: Option<Goods>,
    search_results: Vec<Goods>,
    cart_item_count: u32,

    cart: CartBook,
    method: FulfillmentMethod,

    order_items: Vec<OrderItem>,
    cart_order_entries: Vec<CartEntry>,
    cart_ids: Vec<CartId>,
    fees: DeliveryFees,
    phase: OrderPhase,
    prefetched: HashMap<GoodsId, Goods>,
    order_history: Vec<OrderConfirmation>,
    pickup_item_count: usize,
    delivery_item_count: usize,

    scraps: Vec<Goods>,
    email_available: Option<bool>,

    error: Option<ErrorReport>,
    pending: Option<Operation>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("signed_in", &self.token.is_some())
            .field("method", &self.method)
            .field("phase", &self.phase)
            .field("order_items", &self.order_items.len())
            .field("cart_ids", &self.cart_ids)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session. `token` is the signed-in user's bearer token.
    #[must_use]
    pub fn new(client: GoodsMallClient, token: Option<SecretString>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self::with_events(client, token, events)
    }

    fn with_events(
        client: GoodsMallClient,
        token: Option<SecretString>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            client,
            token,
            events,
            goods_list: Vec::new(),
            categories: Vec::new(),
            goods_detail: None,
            search_results: Vec::new(),
            cart_item_count: 0,
            cart: CartBook::new(),
            method: FulfillmentMethod::default(),
            order_items: Vec::new(),
            cart_order_entries: Vec::new(),
            cart_ids: Vec::new(),
            fees: DeliveryFees::new(),
            phase: OrderPhase::Composing,
            prefetched: HashMap::new(),
            order_history: Vec::new(),
            pickup_item_count: 0,
            delivery_item_count: 0,
            scraps: Vec::new(),
            email_available: None,
            error: None,
            pending: None,
        }
    }

    /// Subscribe to state change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn goods_list(&self) -> &[Goods] {
        &self.goods_list
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub const fn goods_detail(&self) -> Option<&Goods> {
        self.goods_detail.as_ref()
    }

    #[must_use]
    pub fn search_results(&self) -> &[Goods] {
        &self.search_results
    }

    /// Cart size as reported with the goods list.
    #[must_use]
    pub const fn cart_item_count(&self) -> u32 {
        self.cart_item_count
    }

    #[must_use]
    pub const fn cart(&self) -> &CartBook {
        &self.cart
    }

    /// The fulfillment method currently shown and ordered.
    #[must_use]
    pub const fn method(&self) -> FulfillmentMethod {
        self.method
    }

    /// Working order items.
    #[must_use]
    pub fn order_items(&self) -> &[OrderItem] {
        &self.order_items
    }

    /// Cart entries behind a cart-sourced order.
    #[must_use]
    pub fn cart_order_entries(&self) -> &[CartEntry] {
        &self.cart_order_entries
    }

    #[must_use]
    pub fn cart_ids(&self) -> &[CartId] {
        &self.cart_ids
    }

    #[must_use]
    pub const fn fees(&self) -> &DeliveryFees {
        &self.fees
    }

    /// Line prices plus resolved delivery fees.
    #[must_use]
    pub fn order_total(&self) -> Won {
        fees::order_total(&self.order_items, &self.fees)
    }

    #[must_use]
    pub const fn phase(&self) -> &OrderPhase {
        &self.phase
    }

    #[must_use]
    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        match &self.phase {
            OrderPhase::Submitted(confirmation) => Some(confirmation),
            OrderPhase::Composing => None,
        }
    }

    /// Goods details fetched for confirmations and order history.
    #[must_use]
    pub fn prefetched(&self, id: GoodsId) -> Option<&Goods> {
        self.prefetched.get(&id)
    }

    /// Order history, newest first.
    #[must_use]
    pub fn order_history(&self) -> &[OrderConfirmation] {
        &self.order_history
    }

    /// Number of ordered items in pickup and delivery orders respectively.
    #[must_use]
    pub const fn order_item_counts(&self) -> (usize, usize) {
        (self.pickup_item_count, self.delivery_item_count)
    }

    #[must_use]
    pub fn scraps(&self) -> &[Goods] {
        &self.scraps
    }

    /// Result of the last email availability check.
    #[must_use]
    pub const fn email_available(&self) -> Option<bool> {
        self.email_available
    }

    /// The error currently shown, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorReport> {
        self.error.as_ref()
    }

    /// The operation a retry would replay.
    #[must_use]
    pub const fn pending_operation(&self) -> Option<&Operation> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.pending.is_some()
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    /// Run an operation, then refetch the cart if it changed the cart.
    ///
    /// The refetch is its own step: when only the refetch fails, the
    /// pending retry is `FetchCart` and the mutation is not sent again.
    async fn run(&mut self, operation: Operation) -> Result<(), SessionError> {
        let refreshes_cart = operation.refreshes_cart();
        self.attempt(operation).await?;
        if refreshes_cart {
            self.attempt(Operation::FetchCart).await?;
        }
        Ok(())
    }

    /// Dispatch one operation, surfacing API failures.
    #[instrument(skip(self, operation), fields(operation = operation.name()))]
    async fn attempt(&mut self, mut operation: Operation) -> Result<(), SessionError> {
        debug!("Running operation");
        match self.dispatch(&mut operation).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.surface(err.clone(), operation);
                Err(SessionError::Api(err))
            }
        }
    }

    /// Record an error for presentation, keeping the operation if it can be retried.
    fn surface(&mut self, error: ApiError, operation: Operation) {
        let report = ErrorReport::new(error);
        self.pending = report.presentation.offers_retry().then_some(operation);
        self.error = Some(report.clone());
        self.emit(SessionEvent::ErrorRaised(report));
    }

    /// Replay the operation that last failed.
    ///
    /// # Errors
    ///
    /// Returns `NothingToRetry` if no retryable failure is pending, or the
    /// error of the replayed operation.
    pub async fn retry(&mut self) -> Result<(), SessionError> {
        let operation = self.pending.take().ok_or(SessionError::NothingToRetry)?;
        self.error = None;
        self.emit(SessionEvent::ErrorDismissed);
        add_breadcrumb("session", "Retry", Some(&[("operation", operation.name())]));
        self.run(operation).await
    }

    /// Dismiss the current error without retrying.
    pub fn dismiss_error(&mut self) {
        if self.error.take().is_some() {
            self.pending = None;
            self.emit(SessionEvent::ErrorDismissed);
        }
    }

    /// Perform the network work of `operation`.
    ///
    /// A partially failed bulk delete narrows `operation` to the entries
    /// that are still left, so a retry only re-sends those.
    async fn dispatch(&mut self, operation: &mut Operation) -> Result<(), ApiError> {
        match operation {
            Operation::FetchGoodsList => self.load_goods_list().await,
            Operation::FetchGoodsByCategory(category_id) => {
                let category_id = *category_id;
                if category_id == CategoryId::ALL {
                    return self.load_goods_list().await;
                }
                self.goods_list = self.client.fetch_goods_by_category(category_id).await?;
                self.emit(SessionEvent::GoodsListUpdated {
                    count: self.goods_list.len(),
                });
                Ok(())
            }
            Operation::FetchCategories => {
                let categories = self.client.fetch_categories().await?;
                self.categories = catalog::with_all_products(categories);
                self.emit(SessionEvent::CategoriesUpdated {
                    count: self.categories.len(),
                });
                Ok(())
            }
            Operation::FetchGoodsDetail(goods_id) => {
                let goods_id = *goods_id;
                let goods = self
                    .client
                    .fetch_goods_detail(goods_id, self.token.as_ref())
                    .await?;
                let only = goods.seller.method.only_method();
                self.goods_detail = Some(goods);
                if let Some(only) = only {
                    self.set_fulfillment_method(only);
                }
                self.emit(SessionEvent::GoodsDetailLoaded(goods_id));
                Ok(())
            }
            Operation::Search(query) => {
                let goods = self.client.fetch_goods_list(self.token.as_ref()).await?;
                self.search_results = catalog::search(goods, query);
                self.emit(SessionEvent::SearchCompleted {
                    matches: self.search_results.len(),
                });
                Ok(())
            }
            Operation::FetchCart => self.load_cart().await,
            Operation::AddToCart { goods_id, request } => {
                self.client
                    .add_to_cart(*goods_id, request, self.token.as_ref())
                    .await?;
                let goods_id = goods_id.to_string();
                add_breadcrumb("cart", "Added to cart", Some(&[("goods_id", goods_id.as_str())]));
                self.cart_item_count += 1;
                Ok(())
            }
            Operation::UpdateCartQuantity { cart_id, quantity } => {
                self.client
                    .update_cart_quantity(*cart_id, *quantity, self.token.as_ref())
                    .await
            }
            Operation::DeleteCartEntry(cart_id) => {
                self.client
                    .delete_cart_entry(*cart_id, self.token.as_ref())
                    .await
            }
            Operation::DeleteCartEntries(cart_ids) => {
                let token = self.token.as_ref();
                let results = join_all(
                    cart_ids
                        .iter()
                        .map(|id| self.client.delete_cart_entry(*id, token)),
                )
                .await;

                let mut first_error = None;
                let mut left = Vec::new();
                for (id, result) in cart_ids.iter().zip(results) {
                    if let Err(err) = result {
                        left.push(*id);
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                }
                let deleted = (cart_ids.len() - left.len()).to_string();
                add_breadcrumb(
                    "cart",
                    "Deleted selected entries",
                    Some(&[("count", deleted.as_str())]),
                );

                let Some(err) = first_error else {
                    return Ok(());
                };
                if left.len() < cart_ids.len() {
                    // Some deletions landed; show the cart the server now has
                    if let Err(refresh) = self.load_cart().await {
                        warn!(error = %refresh, "Cart refresh after partial delete failed");
                    }
                }
                *cart_ids = left;
                Err(err)
            }
            Operation::ResolveDeliveryFees(goods_ids) => {
                fees::resolve_delivery_fees(&self.client, &mut self.fees, goods_ids).await?;
                self.emit(SessionEvent::DeliveryFeesResolved {
                    total: self.fees.total(),
                });
                Ok(())
            }
            Operation::SubmitOrder(submission) => {
                let token = self.token.as_ref();
                let confirmation = match submission.source() {
                    OrderSource::Detail { goods_id } => {
                        self.client
                            .submit_order_from_detail(*goods_id, submission, token)
                            .await?
                    }
                    OrderSource::Cart { .. } => {
                        self.client.submit_order_from_cart(submission, token).await?
                    }
                };
                self.complete_order(submission, confirmation).await;
                Ok(())
            }
            Operation::FetchOrderHistory => {
                let mut history = self.client.fetch_order_history(self.token.as_ref()).await?;
                history.sort_by(|a, b| b.created_at.cmp(&a.created_at));

                let items_for = |method: FulfillmentMethod| -> usize {
                    history
                        .iter()
                        .filter(|order| order.order_method == Some(method))
                        .map(|order| order.order_items.len())
                        .sum()
                };
                self.pickup_item_count = items_for(FulfillmentMethod::Pickup);
                self.delivery_item_count = items_for(FulfillmentMethod::Delivery);

                let mut goods_ids = Vec::new();
                for id in history.iter().flat_map(OrderConfirmation::goods_ids) {
                    if !goods_ids.contains(&id) {
                        goods_ids.push(id);
                    }
                }
                self.order_history = history;
                self.emit(SessionEvent::OrderHistoryUpdated {
                    count: self.order_history.len(),
                });
                self.prefetch(goods_ids).await;
                Ok(())
            }
            Operation::AddScrap(goods_id) => {
                let goods_id = *goods_id;
                let count = self.client.add_scrap(goods_id, self.token.as_ref()).await?;
                self.apply_scrap(goods_id, true, count.scrap_count);
                Ok(())
            }
            Operation::RemoveScrap(goods_id) => {
                let goods_id = *goods_id;
                let count = self
                    .client
                    .remove_scrap(goods_id, self.token.as_ref())
                    .await?;
                self.apply_scrap(goods_id, false, count.scrap_count);
                Ok(())
            }
            Operation::FetchScrapList => {
                self.scraps = self.client.fetch_scrap_list(self.token.as_ref()).await?;
                self.emit(SessionEvent::ScrapListUpdated {
                    count: self.scraps.len(),
                });
                Ok(())
            }
            Operation::CheckEmail(email) => {
                let available = self.client.check_email(email).await?;
                self.email_available = Some(available);
                self.emit(SessionEvent::EmailChecked { available });
                Ok(())
            }
            Operation::SignUp(request) => {
                self.client.sign_up(request).await?;
                info!("Signed up");
                self.emit(SessionEvent::SignedUp);
                Ok(())
            }
        }
    }

    async fn load_goods_list(&mut self) -> Result<(), ApiError> {
        let goods = self.client.fetch_goods_list(self.token.as_ref()).await?;
        self.cart_item_count = goods
            .first()
            .and_then(|item| item.cart_item_count)
            .unwrap_or(0);
        self.goods_list = goods;
        self.emit(SessionEvent::GoodsListUpdated {
            count: self.goods_list.len(),
        });
        Ok(())
    }

    async fn load_cart(&mut self) -> Result<(), ApiError> {
        let entries = self.client.fetch_cart(self.token.as_ref()).await?;
        self.cart.replace(entries);
        self.emit(SessionEvent::CartUpdated {
            pickup: self.cart.entries(FulfillmentMethod::Pickup).len(),
            delivery: self.cart.entries(FulfillmentMethod::Delivery).len(),
        });
        self.emit(SessionEvent::SelectionChanged(self.selection_summary()));
        Ok(())
    }

    fn apply_scrap(&mut self, goods_id: GoodsId, scraped: bool, scrap_count: u32) {
        if let Some(detail) = self.goods_detail.as_mut().filter(|d| d.id == goods_id) {
            detail.scraped = scraped;
            detail.scrap_count = scrap_count;
        }
        if !scraped {
            self.scraps.retain(|goods| goods.id != goods_id);
        }
        self.emit(SessionEvent::ScrapChanged {
            goods_id,
            scraped,
            scrap_count,
        });
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Load every goods item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn fetch_goods_list(&mut self) -> Result<(), SessionError> {
        self.run(Operation::FetchGoodsList).await
    }

    /// Load the goods of one category; the "all products" category loads everything.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn fetch_goods_by_category(
        &mut self,
        category_id: CategoryId,
    ) -> Result<(), SessionError> {
        self.run(Operation::FetchGoodsByCategory(category_id)).await
    }

    /// Load the category list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn fetch_categories(&mut self) -> Result<(), SessionError> {
        self.run(Operation::FetchCategories).await
    }

    /// Load one goods item for its detail page.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn fetch_goods_detail(&mut self, goods_id: GoodsId) -> Result<(), SessionError> {
        self.run(Operation::FetchGoodsDetail(goods_id)).await
    }

    /// Search goods by title, seller and description.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn search(&mut self, query: &str) -> Result<(), SessionError> {
        self.run(Operation::Search(query.to_owned())).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Load the cart.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn fetch_cart(&mut self) -> Result<(), SessionError> {
        self.run(Operation::FetchCart).await
    }

    /// Add the loaded goods item to the cart with the current method.
    ///
    /// # Errors
    ///
    /// Returns `NoGoodsSelected`, `InvalidQuantity` or `MethodUnavailable`
    /// without a request, or `SessionError::Api` if the request fails.
    pub async fn add_to_cart(
        &mut self,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Result<(), SessionError> {
        let goods_id = self.checked_detail(quantity)?.id;
        let request = CartAddRequest {
            quantity,
            color,
            size,
            cart_method: self.method,
        };
        self.run(Operation::AddToCart { goods_id, request }).await
    }

    /// Change the quantity of a cart entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for zero, or `SessionError::Api` if the request fails.
    pub async fn update_cart_quantity(
        &mut self,
        cart_id: CartId,
        quantity: u32,
    ) -> Result<(), SessionError> {
        if quantity == 0 {
            return Err(SessionError::InvalidQuantity);
        }
        self.run(Operation::UpdateCartQuantity { cart_id, quantity })
            .await
    }

    /// Delete one cart entry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn delete_cart_entry(&mut self, cart_id: CartId) -> Result<(), SessionError> {
        self.run(Operation::DeleteCartEntry(cart_id)).await
    }

    /// Delete every selected entry of the current method.
    ///
    /// # Errors
    ///
    /// Returns `EmptySelection` if nothing is selected, or `SessionError::Api`
    /// if a request fails.
    pub async fn delete_selected_cart_entries(&mut self) -> Result<(), SessionError> {
        let cart_ids = self.cart.take_selected(self.method);
        if cart_ids.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        self.run(Operation::DeleteCartEntries(cart_ids)).await
    }

    /// Flip the selection of a cart entry.
    pub fn toggle_cart_entry(&mut self, cart_id: CartId) {
        if self.cart.toggle(cart_id).is_some() {
            self.emit(SessionEvent::SelectionChanged(self.selection_summary()));
        }
    }

    /// Select every entry of the current method.
    pub fn select_all_cart_entries(&mut self) {
        self.cart.select_all(self.method);
        self.emit(SessionEvent::SelectionChanged(self.selection_summary()));
    }

    pub fn clear_cart_selection(&mut self) {
        self.cart.clear_selection();
        self.emit(SessionEvent::SelectionChanged(self.selection_summary()));
    }

    /// Selected count and price for the current method.
    #[must_use]
    pub fn selection_summary(&self) -> SelectionSummary {
        self.cart.summary(self.method)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Switch between pickup and delivery.
    ///
    /// Changing method discards resolved fees. Whether the loaded goods
    /// item's seller offers the method is checked only when a detail order
    /// or cart addition is made, so the cart can switch freely.
    pub fn set_fulfillment_method(&mut self, method: FulfillmentMethod) {
        if self.method != method {
            self.method = method;
            self.fees.clear();
            self.emit(SessionEvent::SelectionChanged(self.selection_summary()));
        }
    }

    fn checked_detail(&self, quantity: u32) -> Result<&Goods, SessionError> {
        let detail = self
            .goods_detail
            .as_ref()
            .ok_or(SessionError::NoGoodsSelected)?;
        if quantity == 0 {
            return Err(SessionError::InvalidQuantity);
        }
        if !detail.seller.method.supports(self.method) {
            return Err(SessionError::MethodUnavailable(self.method));
        }
        Ok(detail)
    }

    /// Start a single-item order for the loaded goods item.
    ///
    /// # Errors
    ///
    /// Returns `NoGoodsSelected`, `InvalidQuantity` or `MethodUnavailable`.
    pub fn begin_detail_order(
        &mut self,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Result<(), SessionError> {
        let detail = self.checked_detail(quantity)?;
        let item = OrderItem::from_detail(detail.price, quantity, color, size);

        let mut fees = DeliveryFees::new();
        if self.method == FulfillmentMethod::Delivery {
            fees.record(detail);
        }

        self.order_items = vec![item];
        self.cart_order_entries.clear();
        self.cart_ids.clear();
        self.fees = fees;
        self.phase = OrderPhase::Composing;
        Ok(())
    }

    /// Start an order from the selected cart entries of the current method.
    ///
    /// For delivery, every distinct goods item is looked up for its seller's fee.
    ///
    /// # Errors
    ///
    /// Returns `EmptySelection` if nothing is selected, or `SessionError::Api`
    /// if fee resolution fails twice.
    pub async fn begin_cart_order(&mut self) -> Result<(), SessionError> {
        let entries: Vec<CartEntry> = self
            .cart
            .selected_entries(self.method)
            .into_iter()
            .cloned()
            .collect();
        if entries.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        self.order_items = entries.iter().map(OrderItem::from_cart).collect();
        self.cart_ids = entries.iter().map(|entry| entry.id).collect();
        let goods_ids: Vec<GoodsId> = entries.iter().map(|entry| entry.item_id).collect();
        self.cart_order_entries = entries;
        self.fees.clear();
        self.phase = OrderPhase::Composing;

        if self.method == FulfillmentMethod::Delivery {
            self.run(Operation::ResolveDeliveryFees(goods_ids)).await?;
        }
        Ok(())
    }

    /// Validate the working order against the buyer's contact details and submit it.
    ///
    /// A cart-sourced order is submitted when cart ids are present, otherwise
    /// a single-item order for the loaded goods item.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrder` or `NoGoodsSelected` before any request, or
    /// `SessionError::Api` if the submission fails (state is left unchanged).
    pub async fn submit_order(&mut self, contact: &OrderContact) -> Result<(), SessionError> {
        let submission = self.compose(contact)?;
        self.run(Operation::SubmitOrder(submission)).await
    }

    fn compose(&self, contact: &OrderContact) -> Result<OrderSubmission, SessionError> {
        let items = self.order_items.clone();
        if self.cart_ids.is_empty() {
            let goods_id = self
                .goods_detail
                .as_ref()
                .map(|detail| detail.id)
                .ok_or(SessionError::NoGoodsSelected)?;
            Ok(order::compose_from_detail(
                goods_id,
                self.method,
                contact,
                items,
            )?)
        } else {
            Ok(order::compose_from_cart(
                self.cart_ids.clone(),
                self.method,
                contact,
                items,
            )?)
        }
    }

    /// Move to the submitted phase and fetch the confirmation's goods details.
    async fn complete_order(
        &mut self,
        submission: &OrderSubmission,
        confirmation: OrderConfirmation,
    ) {
        let order_id = confirmation.id;
        info!(
            order_id = ?order_id,
            items = confirmation.order_items.len(),
            "Order submitted"
        );
        add_breadcrumb(
            "order",
            "Order submitted",
            Some(&[("method", submission.method().as_str())]),
        );

        if let Some(cart_ids) = submission.cart_ids() {
            self.cart.remove(cart_ids);
        }
        self.order_items.clear();
        self.cart_order_entries.clear();
        self.cart_ids.clear();

        let goods_ids = confirmation.goods_ids();
        self.phase = OrderPhase::Submitted(Box::new(confirmation));
        self.emit(SessionEvent::OrderSubmitted { order_id });

        self.prefetch(goods_ids).await;
    }

    /// Fetch goods details concurrently, in random order, storing each as it arrives.
    ///
    /// Failed lookups are tried once more, then skipped.
    async fn prefetch(&mut self, mut goods_ids: Vec<GoodsId>) {
        goods_ids.retain(|id| !self.prefetched.contains_key(id));
        goods_ids.shuffle(&mut rand::rng());

        let client = self.client.clone();
        for attempt in 1..=2 {
            if goods_ids.is_empty() {
                return;
            }
            let mut lookups: FuturesUnordered<_> = goods_ids
                .iter()
                .map(|&id| {
                    let client = &client;
                    async move { (id, client.lookup_goods(id).await) }
                })
                .collect();

            let mut failed = Vec::new();
            while let Some((id, result)) = lookups.next().await {
                match result {
                    Ok(goods) => {
                        self.prefetched.insert(id, goods);
                        self.emit(SessionEvent::GoodsPrefetched(id));
                    }
                    Err(err) => {
                        warn!(goods_id = %id, attempt, error = %err, "Goods prefetch failed");
                        failed.push(id);
                    }
                }
            }
            goods_ids = failed;
        }
    }

    /// Leave the submitted phase for a fresh order.
    pub fn start_new_order(&mut self) {
        self.phase = OrderPhase::Composing;
        self.order_items.clear();
        self.cart_order_entries.clear();
        self.cart_ids.clear();
        self.fees.clear();
    }

    /// Load the order history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn fetch_order_history(&mut self) -> Result<(), SessionError> {
        self.run(Operation::FetchOrderHistory).await
    }

    // =========================================================================
    // Scraps
    // =========================================================================

    /// Scrap the loaded goods item.
    ///
    /// # Errors
    ///
    /// Returns `NoGoodsSelected` if no detail is loaded, or `SessionError::Api`
    /// if the request fails.
    pub async fn add_scrap(&mut self) -> Result<(), SessionError> {
        let goods_id = self.loaded_goods_id()?;
        self.run(Operation::AddScrap(goods_id)).await
    }

    /// Remove the scrap on the loaded goods item.
    ///
    /// # Errors
    ///
    /// Returns `NoGoodsSelected` if no detail is loaded, or `SessionError::Api`
    /// if the request fails.
    pub async fn remove_scrap(&mut self) -> Result<(), SessionError> {
        let goods_id = self.loaded_goods_id()?;
        self.run(Operation::RemoveScrap(goods_id)).await
    }

    /// Scrap the goods item behind a cart entry.
    ///
    /// # Errors
    ///
    /// Returns `EmptySelection` if the entry is unknown, or `SessionError::Api`
    /// if the request fails.
    pub async fn scrap_cart_entry(&mut self, cart_id: CartId) -> Result<(), SessionError> {
        let goods_id = self
            .cart
            .entry(cart_id)
            .map(|entry| entry.item_id)
            .ok_or(SessionError::EmptySelection)?;
        self.run(Operation::AddScrap(goods_id)).await
    }

    /// Scrap or unscrap any goods item by id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn set_scrap(&mut self, goods_id: GoodsId, scraped: bool) -> Result<(), SessionError> {
        let operation = if scraped {
            Operation::AddScrap(goods_id)
        } else {
            Operation::RemoveScrap(goods_id)
        };
        self.run(operation).await
    }

    /// Load the scrap list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the request fails; the error is also surfaced.
    pub async fn fetch_scrap_list(&mut self) -> Result<(), SessionError> {
        self.run(Operation::FetchScrapList).await
    }

    fn loaded_goods_id(&self) -> Result<GoodsId, SessionError> {
        self.goods_detail
            .as_ref()
            .map(|detail| detail.id)
            .ok_or(SessionError::NoGoodsSelected)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Ask whether an email address is free.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignUp` for a malformed address, or `SessionError::Api`
    /// if the request fails.
    pub async fn check_email(&mut self, email: &str) -> Result<bool, SessionError> {
        let email = Email::parse(email).map_err(SignUpValidationError::from)?;
        self.run(Operation::CheckEmail(email)).await?;
        Ok(self.email_available.unwrap_or(false))
    }

    /// Validate the form and register.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignUp` before any request, or `SessionError::Api` if
    /// the request fails.
    pub async fn sign_up(&mut self, form: &SignUpForm) -> Result<(), SessionError> {
        let request = form.validate()?;
        self.run(Operation::SignUp(request)).await
    }

    /// Restore every field to its initial value and forget the token.
    pub fn reset(&mut self) {
        let client = self.client.clone();
        let events = self.events.clone();
        *self = Self::with_events(client, None, events);
        self.emit(SessionEvent::Reset);
    }
}
