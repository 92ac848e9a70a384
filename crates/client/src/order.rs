//! Order composition.
//!
//! An order is either a single goods item bought straight from its detail
//! page or a set of previously saved cart entries. [`OrderSource`] keeps the
//! two apart; the composer validates buyer contact details before anything
//! is sent.

use goodsmall_core::{
    CartId, FulfillmentMethod, GoodsId, PhoneNumber, PhoneNumberError, Won, Zipcode, ZipcodeError,
};
use serde::Serialize;
use thiserror::Error;

use crate::api::{Address, CartEntry, OrderItem};

/// Validation failures detected before an order is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("buyer name is required")]
    EmptyBuyerName,
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(#[from] PhoneNumberError),
    #[error("order has no items")]
    NoItems,
    #[error("order item quantity must be at least 1")]
    ZeroQuantity,
    #[error("delivery orders require an address")]
    MissingAddress,
    #[error("invalid zipcode: {0}")]
    InvalidZipcode(#[from] ZipcodeError),
    #[error("main address is required")]
    MissingMainAddress,
    #[error("no cart entries selected")]
    EmptyCartSelection,
}

/// Address fields as typed by the buyer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
    pub zipcode: String,
    pub main_address: String,
    pub detail_address: String,
}

/// Buyer contact details as typed by the buyer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderContact {
    pub buyer_name: String,
    pub phone_number: String,
    pub address: Option<AddressForm>,
    pub delivery_note: String,
}

/// Where an order's items come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSource {
    /// One goods item from its detail page.
    Detail { goods_id: GoodsId },
    /// Saved cart entries; never empty.
    Cart { cart_ids: Vec<CartId> },
}

/// A validated order, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSubmission {
    buyer_name: String,
    phone_number: PhoneNumber,
    address: Option<Address>,
    delivery_note: Option<String>,
    method: FulfillmentMethod,
    items: Vec<OrderItem>,
    source: OrderSource,
}

/// Wire form of an order submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestBody<'a> {
    buyer_name: &'a str,
    phone_number: &'a PhoneNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a Address>,
    order_method: FulfillmentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery_request: Option<&'a str>,
    order_items: &'a [OrderItem],
    #[serde(rename = "cartIdList", skip_serializing_if = "Option::is_none")]
    cart_id_list: Option<&'a [CartId]>,
}

impl OrderSubmission {
    #[must_use]
    pub fn buyer_name(&self) -> &str {
        &self.buyer_name
    }

    #[must_use]
    pub const fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    #[must_use]
    pub const fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    #[must_use]
    pub fn delivery_note(&self) -> Option<&str> {
        self.delivery_note.as_deref()
    }

    #[must_use]
    pub const fn method(&self) -> FulfillmentMethod {
        self.method
    }

    #[must_use]
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    #[must_use]
    pub const fn source(&self) -> &OrderSource {
        &self.source
    }

    /// Source cart ids; `None` for a detail-page order.
    #[must_use]
    pub fn cart_ids(&self) -> Option<&[CartId]> {
        match &self.source {
            OrderSource::Cart { cart_ids } => Some(cart_ids),
            OrderSource::Detail { .. } => None,
        }
    }

    /// Returns true for a single-item order from a detail page.
    #[must_use]
    pub const fn is_single_item(&self) -> bool {
        matches!(self.source, OrderSource::Detail { .. })
    }

    /// Sum of line prices, excluding delivery fees.
    #[must_use]
    pub fn items_total(&self) -> Won {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Request body for the order endpoints.
    #[must_use]
    pub fn to_body(&self) -> OrderRequestBody<'_> {
        OrderRequestBody {
            buyer_name: &self.buyer_name,
            phone_number: &self.phone_number,
            address: self.address.as_ref(),
            order_method: self.method,
            delivery_request: self.delivery_note.as_deref(),
            order_items: &self.items,
            cart_id_list: self.cart_ids(),
        }
    }
}

impl OrderItem {
    /// Line for a goods item bought from its detail page.
    #[must_use]
    pub fn from_detail(
        unit_price: Won,
        quantity: u32,
        color: Option<String>,
        size: Option<String>,
    ) -> Self {
        Self {
            item_id: None,
            color,
            size,
            quantity,
            price: unit_price.times(quantity),
            order_status: None,
        }
    }

    /// Line for a saved cart entry; the entry already carries its line price.
    #[must_use]
    pub fn from_cart(entry: &CartEntry) -> Self {
        Self {
            item_id: None,
            color: entry.color.clone(),
            size: entry.size.clone(),
            quantity: entry.quantity,
            price: entry.price,
            order_status: None,
        }
    }
}

/// Compose a single-item order from a goods detail page.
///
/// # Errors
///
/// Returns an `OrderValidationError` if the contact details or items are invalid.
pub fn compose_from_detail(
    goods_id: GoodsId,
    method: FulfillmentMethod,
    contact: &OrderContact,
    items: Vec<OrderItem>,
) -> Result<OrderSubmission, OrderValidationError> {
    compose(OrderSource::Detail { goods_id }, method, contact, items)
}

/// Compose an order from saved cart entries.
///
/// # Errors
///
/// Returns `EmptyCartSelection` if `cart_ids` is empty, or another
/// `OrderValidationError` if the contact details or items are invalid.
pub fn compose_from_cart(
    cart_ids: Vec<CartId>,
    method: FulfillmentMethod,
    contact: &OrderContact,
    items: Vec<OrderItem>,
) -> Result<OrderSubmission, OrderValidationError> {
    if cart_ids.is_empty() {
        return Err(OrderValidationError::EmptyCartSelection);
    }
    compose(OrderSource::Cart { cart_ids }, method, contact, items)
}

fn compose(
    source: OrderSource,
    method: FulfillmentMethod,
    contact: &OrderContact,
    items: Vec<OrderItem>,
) -> Result<OrderSubmission, OrderValidationError> {
    let buyer_name = contact.buyer_name.trim();
    if buyer_name.is_empty() {
        return Err(OrderValidationError::EmptyBuyerName);
    }
    let phone_number = PhoneNumber::parse(contact.phone_number.trim())?;

    if items.is_empty() {
        return Err(OrderValidationError::NoItems);
    }
    if items.iter().any(|item| item.quantity == 0) {
        return Err(OrderValidationError::ZeroQuantity);
    }

    let address = if method.requires_address() {
        let form = contact
            .address
            .as_ref()
            .ok_or(OrderValidationError::MissingAddress)?;
        Some(validate_address(form)?)
    } else {
        None
    };

    let delivery_note = Some(contact.delivery_note.trim())
        .filter(|note| method.requires_address() && !note.is_empty())
        .map(str::to_owned);

    Ok(OrderSubmission {
        buyer_name: buyer_name.to_owned(),
        phone_number,
        address,
        delivery_note,
        method,
        items,
        source,
    })
}

fn validate_address(form: &AddressForm) -> Result<Address, OrderValidationError> {
    let zipcode = Zipcode::parse(&form.zipcode)?;
    let main_address = form.main_address.trim();
    if main_address.is_empty() {
        return Err(OrderValidationError::MissingMainAddress);
    }
    let detail_address = Some(form.detail_address.trim())
        .filter(|detail| !detail.is_empty())
        .map(str::to_owned);

    Ok(Address {
        zipcode,
        main_address: main_address.to_owned(),
        detail_address,
    })
}
