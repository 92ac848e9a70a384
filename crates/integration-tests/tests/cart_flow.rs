//! Cart fetch, selection and editing against a mocked goods mall API.

#![allow(clippy::unwrap_used)]

use goodsmall_client::cart::SelectionSummary;
use goodsmall_client::{ApiError, Conflict, SessionError, SessionEvent};
use goodsmall_core::{CartId, FulfillmentMethod, GoodsId, Won};
use goodsmall_integration_tests::{bearer, cart_entry_json, goods_json, signed_in_session};
use httpmock::prelude::*;
use serde_json::json;

fn mock_cart(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/carts").header("authorization", bearer());
        then.status(200).json_body(json!([
            cart_entry_json(100, 1, 10, 10_000, "pickup"),
            cart_entry_json(101, 2, 10, 4_000, "pickup"),
            cart_entry_json(102, 3, 20, 7_000, "delivery"),
        ]));
    })
}

#[tokio::test]
async fn test_selection_summary_follows_method() {
    let server = MockServer::start();
    mock_cart(&server);

    let mut session = signed_in_session(&server);
    session.fetch_cart().await.unwrap();
    session.toggle_cart_entry(CartId::new(100));
    session.toggle_cart_entry(CartId::new(102));

    assert_eq!(
        session.selection_summary(),
        SelectionSummary {
            count: 1,
            total: Won::new(10_000)
        }
    );

    session.set_fulfillment_method(FulfillmentMethod::Delivery);
    assert_eq!(session.selection_summary().total, Won::new(7_000));

    session.set_fulfillment_method(FulfillmentMethod::Pickup);
    session.select_all_cart_entries();
    assert_eq!(
        session.selection_summary(),
        SelectionSummary {
            count: 2,
            total: Won::new(14_000)
        }
    );

    session.clear_cart_selection();
    assert_eq!(session.selection_summary(), SelectionSummary::default());
}

#[tokio::test]
async fn test_add_to_cart_refreshes_cart() {
    let server = MockServer::start();
    let cart = mock_cart(&server);
    server.mock(|when, then| {
        when.method(GET).path("/items/5");
        then.status(200).json_body(goods_json(5, 10, 8_000, 2_500));
    });
    let add = server.mock(|when, then| {
        when.method(POST)
            .path("/carts/items/5")
            .header("authorization", bearer())
            .json_body(json!({ "quantity": 3, "size": "M", "cartMethod": "delivery" }));
        then.status(200);
    });

    let mut session = signed_in_session(&server);
    let mut events = session.subscribe();
    session.fetch_goods_detail(GoodsId::new(5)).await.unwrap();
    session.set_fulfillment_method(FulfillmentMethod::Delivery);
    session
        .add_to_cart(3, None, Some("M".to_string()))
        .await
        .unwrap();

    assert_eq!(add.calls(), 1);
    assert_eq!(cart.calls(), 1);
    assert_eq!(session.cart_item_count(), 1);

    let mut saw_cart_update = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::CartUpdated { pickup: 2, delivery: 1 }) {
            saw_cart_update = true;
        }
    }
    assert!(saw_cart_update);
}

#[tokio::test]
async fn test_add_to_cart_twice_conflicts() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/items/5");
        then.status(200).json_body(goods_json(5, 10, 8_000, 0));
    });
    server.mock(|when, then| {
        when.method(POST).path("/carts/items/5");
        then.status(409);
    });

    let mut session = signed_in_session(&server);
    session.fetch_goods_detail(GoodsId::new(5)).await.unwrap();
    let err = session.add_to_cart(1, None, None).await.unwrap_err();

    assert_eq!(
        err,
        SessionError::Api(ApiError::Conflict(Conflict::AlreadyInCart))
    );
    assert!(!session.can_retry());
    assert!(session.error().is_some());

    session.dismiss_error();
    assert!(session.error().is_none());
}

#[tokio::test]
async fn test_add_to_cart_requires_quantity() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/items/5");
        then.status(200).json_body(goods_json(5, 10, 8_000, 0));
    });

    let mut session = signed_in_session(&server);
    assert_eq!(
        session.add_to_cart(1, None, None).await,
        Err(SessionError::NoGoodsSelected)
    );

    session.fetch_goods_detail(GoodsId::new(5)).await.unwrap();
    assert_eq!(
        session.add_to_cart(0, None, None).await,
        Err(SessionError::InvalidQuantity)
    );
}

#[tokio::test]
async fn test_update_quantity() {
    let server = MockServer::start();
    let cart = mock_cart(&server);
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/carts/101")
            .json_body(json!({ "quantity": 4 }));
        then.status(200);
    });

    let mut session = signed_in_session(&server);
    session
        .update_cart_quantity(CartId::new(101), 4)
        .await
        .unwrap();

    assert_eq!(update.calls(), 1);
    assert_eq!(cart.calls(), 1);
    assert_eq!(
        session.update_cart_quantity(CartId::new(101), 0).await,
        Err(SessionError::InvalidQuantity)
    );
}

#[tokio::test]
async fn test_delete_selected_entries() {
    let server = MockServer::start();
    let cart = mock_cart(&server);
    let first = server.mock(|when, then| {
        when.method(DELETE).path("/carts/100");
        then.status(200);
    });
    let second = server.mock(|when, then| {
        when.method(DELETE).path("/carts/101");
        then.status(200);
    });
    let delivery = server.mock(|when, then| {
        when.method(DELETE).path("/carts/102");
        then.status(200);
    });

    let mut session = signed_in_session(&server);
    session.fetch_cart().await.unwrap();
    session.select_all_cart_entries();
    session.toggle_cart_entry(CartId::new(102));
    session.delete_selected_cart_entries().await.unwrap();

    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(delivery.calls(), 0, "other method's selection is untouched");
    assert_eq!(cart.calls(), 2);
    assert!(session.cart().is_selected(CartId::new(102)));
}

#[tokio::test]
async fn test_scrap_from_cart() {
    let server = MockServer::start();
    mock_cart(&server);
    let scrap = server.mock(|when, then| {
        when.method(POST).path("/scraps/items/3");
        then.status(200).json_body(json!({ "scrapCount": 12 }));
    });

    let mut session = signed_in_session(&server);
    session.fetch_cart().await.unwrap();
    session.scrap_cart_entry(CartId::new(102)).await.unwrap();

    assert_eq!(scrap.calls(), 1);
    assert_eq!(
        session.scrap_cart_entry(CartId::new(999)).await,
        Err(SessionError::EmptySelection)
    );
}

#[tokio::test]
async fn test_expired_token() {
    let server = MockServer::start();
    let cart = server.mock(|when, then| {
        when.method(GET).path("/carts");
        then.status(401);
    });

    let mut session = signed_in_session(&server);
    let err = session.fetch_cart().await.unwrap_err();

    assert_eq!(err, SessionError::Api(ApiError::AuthenticationFailure));
    assert_eq!(cart.calls(), 1);
    assert!(!session.can_retry());
}
