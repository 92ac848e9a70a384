//! Integration tests for the goods mall client.
//!
//! Every test runs a [`Session`] against an `httpmock` server standing in
//! for the goods mall API, so no network or credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p goodsmall-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_scenarios` - Detail and cart orders, fees, failures and retry
//! - `cart_flow` - Cart fetch, selection and editing
//! - `catalog` - Goods list, categories, search and scraps
//! - `signup` - Email check and registration

#![allow(clippy::unwrap_used)]

use goodsmall_client::order::{AddressForm, OrderContact};
use goodsmall_client::{ApiConfig, GoodsMallClient, Session};
use httpmock::MockServer;
use secrecy::SecretString;
use serde_json::{Value, json};

/// Bearer token the mocked API expects.
pub const TOKEN: &str = "integration-session-token";

/// A session signed in with [`TOKEN`] against a mock server.
pub fn signed_in_session(server: &MockServer) -> Session {
    let config = ApiConfig::new(&server.base_url()).unwrap();
    let client = GoodsMallClient::new(&config).unwrap();
    Session::new(client, Some(SecretString::from(TOKEN)))
}

/// Authorization header value for [`TOKEN`].
pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

/// Seller JSON.
pub fn seller_json(id: i64, method: &str) -> Value {
    json!({
        "id": id,
        "name": format!("seller {id}"),
        "method": method,
        "phoneNumber": "02-3408-3114"
    })
}

/// Goods JSON as returned by `items/{id}`.
pub fn goods_json(id: i64, seller: i64, price: i64, delivery_fee: i64) -> Value {
    json!({
        "id": id,
        "title": format!("goods {id}"),
        "price": price,
        "deliveryFee": delivery_fee,
        "description": format!("description of goods {id}"),
        "seller": seller_json(seller, "both"),
        "scraped": false,
        "scrapCount": 0,
        "goodsInfos": [{ "color": "navy", "size": "L" }]
    })
}

/// Cart entry JSON as returned by `carts`.
pub fn cart_entry_json(id: i64, item_id: i64, seller: i64, price: i64, method: &str) -> Value {
    json!({
        "id": id,
        "itemId": item_id,
        "title": format!("goods {item_id}"),
        "seller": seller_json(seller, "both"),
        "price": price,
        "quantity": 1,
        "cartMethod": method
    })
}

/// Order confirmation JSON for the given goods ids.
pub fn confirmation_json(order_id: i64, method: &str, item_ids: &[i64]) -> Value {
    let items: Vec<Value> = item_ids
        .iter()
        .map(|id| json!({ "itemId": id, "quantity": 1, "price": 5000, "orderStatus": null }))
        .collect();
    json!({
        "id": order_id,
        "buyerName": "Kim Sejong",
        "phoneNumber": "010-1234-5678",
        "seller": seller_json(1, "both"),
        "orderMethod": method,
        "createdAt": "2023-03-02T09:30:00",
        "orderItems": items
    })
}

/// Contact details for a pickup order.
pub fn pickup_contact() -> OrderContact {
    OrderContact {
        buyer_name: "Kim Sejong".to_string(),
        phone_number: "010-1234-5678".to_string(),
        address: None,
        delivery_note: String::new(),
    }
}

/// Contact details for a delivery order.
pub fn delivery_contact() -> OrderContact {
    OrderContact {
        address: Some(AddressForm {
            zipcode: "05006".to_string(),
            main_address: "209 Neungdong-ro, Gwangjin-gu, Seoul".to_string(),
            detail_address: "Daeyang AI Center 502".to_string(),
        }),
        delivery_note: "Call before delivery".to_string(),
        ..pickup_contact()
    }
}
