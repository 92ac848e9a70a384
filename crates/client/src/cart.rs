//! Cart aggregation and selection.
//!
//! The server returns a single flat cart; the client shows it split by
//! fulfillment method and lets the user tick entries for ordering or
//! deletion. Everything here lives in process memory and is rebuilt on
//! every cart fetch.

use std::collections::HashMap;

use goodsmall_core::{CartId, FulfillmentMethod, Won};

use crate::api::CartEntry;

/// Number and total line price of the selected entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionSummary {
    pub count: usize,
    pub total: Won,
}

/// Count and sum the entries whose id is selected.
///
/// Ids missing from `selections` count as unselected.
#[must_use]
pub fn recompute_selection(
    entries: &[CartEntry],
    selections: &HashMap<CartId, bool>,
) -> SelectionSummary {
    entries
        .iter()
        .filter(|entry| selections.get(&entry.id).copied().unwrap_or(false))
        .fold(SelectionSummary::default(), |mut summary, entry| {
            summary.count += 1;
            summary.total += entry.price;
            summary
        })
}

/// The user's cart, split by fulfillment method, with per-entry selection.
#[derive(Debug, Clone, Default)]
pub struct CartBook {
    pickup: Vec<CartEntry>,
    delivery: Vec<CartEntry>,
    selections: HashMap<CartId, bool>,
}

impl CartBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a freshly fetched cart.
    ///
    /// Selections for entries that no longer exist are dropped.
    pub fn replace(&mut self, entries: Vec<CartEntry>) {
        let (pickup, delivery): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| entry.cart_method == FulfillmentMethod::Pickup);
        self.pickup = pickup;
        self.delivery = delivery;

        let live: Vec<CartId> = self.all_entries().map(|entry| entry.id).collect();
        self.selections.retain(|id, _| live.contains(id));
    }

    /// Entries for one method, in server order.
    #[must_use]
    pub fn entries(&self, method: FulfillmentMethod) -> &[CartEntry] {
        match method {
            FulfillmentMethod::Pickup => &self.pickup,
            FulfillmentMethod::Delivery => &self.delivery,
        }
    }

    fn all_entries(&self) -> impl Iterator<Item = &CartEntry> {
        self.pickup.iter().chain(self.delivery.iter())
    }

    /// Look up an entry by id in either list.
    #[must_use]
    pub fn entry(&self, id: CartId) -> Option<&CartEntry> {
        self.all_entries().find(|entry| entry.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pickup.is_empty() && self.delivery.is_empty()
    }

    #[must_use]
    pub fn is_selected(&self, id: CartId) -> bool {
        self.selections.get(&id).copied().unwrap_or(false)
    }

    /// Flip the selection of one entry. Returns the new state, or `None`
    /// if the entry is unknown.
    pub fn toggle(&mut self, id: CartId) -> Option<bool> {
        self.entry(id)?;
        let selected = self.selections.entry(id).or_insert(false);
        *selected = !*selected;
        Some(*selected)
    }

    /// Set the selection of one entry.
    pub fn set_selected(&mut self, id: CartId, selected: bool) {
        if self.entry(id).is_some() {
            self.selections.insert(id, selected);
        }
    }

    /// Select every entry of one method.
    pub fn select_all(&mut self, method: FulfillmentMethod) {
        let ids: Vec<CartId> = self.entries(method).iter().map(|entry| entry.id).collect();
        for id in ids {
            self.selections.insert(id, true);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selections.clear();
    }

    /// Selected entries of one method, in server order.
    #[must_use]
    pub fn selected_entries(&self, method: FulfillmentMethod) -> Vec<&CartEntry> {
        self.entries(method)
            .iter()
            .filter(|entry| self.is_selected(entry.id))
            .collect()
    }

    /// Selection summary for one method.
    #[must_use]
    pub fn summary(&self, method: FulfillmentMethod) -> SelectionSummary {
        recompute_selection(self.entries(method), &self.selections)
    }

    /// Ids of the selected entries of one method; their selections are forgotten.
    pub fn take_selected(&mut self, method: FulfillmentMethod) -> Vec<CartId> {
        let ids: Vec<CartId> = self
            .selected_entries(method)
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        for id in &ids {
            self.selections.remove(id);
        }
        ids
    }

    /// Drop entries locally, e.g. after they were ordered.
    pub fn remove(&mut self, ids: &[CartId]) {
        self.pickup.retain(|entry| !ids.contains(&entry.id));
        self.delivery.retain(|entry| !ids.contains(&entry.id));
        for id in ids {
            self.selections.remove(id);
        }
    }
}
