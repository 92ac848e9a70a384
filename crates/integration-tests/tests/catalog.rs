//! Catalog browsing and scraps against a mocked goods mall API.

#![allow(clippy::unwrap_used)]

use goodsmall_client::api::Category;
use goodsmall_client::{ApiError, Presentation, SessionError};
use goodsmall_core::{CategoryId, GoodsId};
use goodsmall_integration_tests::{bearer, goods_json, signed_in_session};
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_goods_list_records_cart_count() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/items/all").header("authorization", bearer());
        let mut first = goods_json(1, 10, 12_000, 0);
        first["cartItemCount"] = json!(3);
        then.status(200)
            .json_body(json!([first, goods_json(2, 20, 8_000, 2_500)]));
    });

    let mut session = signed_in_session(&server);
    session.fetch_goods_list().await.unwrap();

    assert_eq!(list.calls(), 1);
    assert_eq!(session.goods_list().len(), 2);
    assert_eq!(session.cart_item_count(), 3);
}

#[tokio::test]
async fn test_category_listing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/categories/all");
        then.status(200).json_body(json!([
            { "id": 1, "name": "Apparel" },
            { "id": 2, "name": "Stationery" }
        ]));
    });
    let by_category = server.mock(|when, then| {
        when.method(GET).path("/items/categories/2");
        then.status(200).json_body(json!([goods_json(7, 10, 3_000, 0)]));
    });
    let all = server.mock(|when, then| {
        when.method(GET).path("/items/all");
        then.status(200).json_body(json!([]));
    });

    let mut session = signed_in_session(&server);
    session.fetch_categories().await.unwrap();

    let names: Vec<&str> = session
        .categories()
        .iter()
        .map(|category| category.name.as_str())
        .collect();
    assert_eq!(names, vec!["ALLPRODUCT", "Apparel", "Stationery"]);
    assert_eq!(session.categories()[0], Category::all_products());

    session
        .fetch_goods_by_category(CategoryId::new(2))
        .await
        .unwrap();
    assert_eq!(by_category.calls(), 1);
    assert_eq!(session.goods_list().len(), 1);

    session
        .fetch_goods_by_category(CategoryId::ALL)
        .await
        .unwrap();
    assert_eq!(all.calls(), 1);
    assert!(session.goods_list().is_empty());
}

#[tokio::test]
async fn test_search() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/items/all");
        let mut hoodie = goods_json(1, 10, 35_000, 3_000);
        hoodie["title"] = json!("Sejong Hoodie");
        let mut mug = goods_json(2, 20, 9_000, 0);
        mug["title"] = json!("Campus Mug");
        then.status(200).json_body(json!([hoodie, mug]));
    });

    let mut session = signed_in_session(&server);
    session.search("hoodie").await.unwrap();

    let titles: Vec<&str> = session
        .search_results()
        .iter()
        .map(|goods| goods.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Sejong Hoodie"]);

    session.search("seller 20").await.unwrap();
    assert_eq!(session.search_results().len(), 1);
    assert_eq!(session.search_results()[0].id, GoodsId::new(2));
}

#[tokio::test]
async fn test_scrap_toggle_updates_detail() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/items/9");
        then.status(200).json_body(goods_json(9, 10, 5_000, 0));
    });
    server.mock(|when, then| {
        when.method(POST).path("/scraps/items/9");
        then.status(200).json_body(json!({ "scrapCount": 5 }));
    });
    server.mock(|when, then| {
        when.method(DELETE).path("/scraps/items/9");
        then.status(200).json_body(json!({ "scrapCount": 4 }));
    });

    let mut session = signed_in_session(&server);
    assert_eq!(session.add_scrap().await, Err(SessionError::NoGoodsSelected));

    session.fetch_goods_detail(GoodsId::new(9)).await.unwrap();
    session.add_scrap().await.unwrap();
    let detail = session.goods_detail().unwrap();
    assert!(detail.scraped);
    assert_eq!(detail.scrap_count, 5);

    session.remove_scrap().await.unwrap();
    let detail = session.goods_detail().unwrap();
    assert!(!detail.scraped);
    assert_eq!(detail.scrap_count, 4);
}

#[tokio::test]
async fn test_scrap_list() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/scraps").header("authorization", bearer());
        then.status(200)
            .json_body(json!([goods_json(1, 10, 5_000, 0), goods_json(2, 10, 6_000, 0)]));
    });

    let mut session = signed_in_session(&server);
    session.fetch_scrap_list().await.unwrap();

    assert_eq!(session.scraps().len(), 2);
}

#[tokio::test]
async fn test_malformed_payload_is_silent() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET).path("/items/all");
        then.status(200).body("<html>maintenance</html>");
    });

    let mut session = signed_in_session(&server);
    let err = session.fetch_goods_list().await.unwrap_err();

    assert!(matches!(err, SessionError::Api(ApiError::Decode(_))));
    assert_eq!(list.calls(), 1);
    assert!(matches!(
        session.error().map(|report| report.presentation),
        Some(Presentation::Silent { .. })
    ));
    assert!(!session.can_retry());
}

#[tokio::test]
async fn test_server_error_is_retried_once_then_offered_for_retry() {
    let server = MockServer::start();
    let mut failing = server.mock(|when, then| {
        when.method(GET).path("/categories/all");
        then.status(502);
    });

    let mut session = signed_in_session(&server);
    let err = session.fetch_categories().await.unwrap_err();

    assert_eq!(err, SessionError::Api(ApiError::InvalidResponse { status: 502 }));
    assert_eq!(failing.calls(), 2);
    assert!(session.can_retry());

    failing.delete();
    server.mock(|when, then| {
        when.method(GET).path("/categories/all");
        then.status(200).json_body(json!([{ "id": 1, "name": "Apparel" }]));
    });

    session.retry().await.unwrap();
    assert_eq!(session.categories().len(), 2);
    assert!(session.error().is_none());
}
