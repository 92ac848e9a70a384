//! Goods mall HTTP API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`, JSON bodies with camelCase keys
//! - Optional bearer token per call (the signed-in user's session)
//! - Idempotent calls are retried once on transient failures; order
//!   submission and other mutations are not
//! - Anonymous goods lookups are cached via `moka` (5 minute TTL by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use goodsmall_client::api::GoodsMallClient;
//!
//! let client = GoodsMallClient::new(&config.api)?;
//!
//! let goods = client.fetch_goods_list(None).await?;
//! let detail = client.fetch_goods_detail(goods[0].id, token.as_ref()).await?;
//! ```

pub mod types;

use std::sync::Arc;

use goodsmall_core::{CartId, CategoryId, Email, GoodsId};
use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{ApiError, Conflict};
use crate::order::OrderSubmission;

pub use types::*;

/// Longest response body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

/// How a 404/409 is interpreted for a given call.
#[derive(Debug, Clone, Copy)]
enum ConflictRule {
    None,
    AlreadyInCart,
    CartEmpty,
}

/// A single API call, rebuilt for every attempt.
struct Call<'a> {
    method: Method,
    url: Url,
    token: Option<&'a SecretString>,
    body: Option<Vec<u8>>,
    retry: bool,
    conflict: ConflictRule,
}

impl<'a> Call<'a> {
    fn new(method: Method, url: Url, token: Option<&'a SecretString>) -> Self {
        let retry = matches!(method, Method::GET);
        Self {
            method,
            url,
            token,
            body: None,
            retry,
            conflict: ConflictRule::None,
        }
    }

    fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.body = Some(bytes);
        Ok(self)
    }

    const fn retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    const fn conflict(mut self, rule: ConflictRule) -> Self {
        self.conflict = rule;
        self
    }
}

// =============================================================================
// GoodsMallClient
// =============================================================================

/// Client for the goods mall API.
///
/// Cheap to clone; clones share the HTTP connection pool and goods cache.
#[derive(Clone)]
pub struct GoodsMallClient {
    inner: Arc<GoodsMallClientInner>,
}

struct GoodsMallClientInner {
    client: reqwest::Client,
    base_url: Url,
    goods_cache: Cache<GoodsId, Goods>,
}

impl std::fmt::Debug for GoodsMallClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoodsMallClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GoodsMallClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("goodsmall-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let goods_cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(GoodsMallClientInner {
                client,
                base_url: config.base_url.clone(),
                goods_cache,
            }),
        })
    }

    /// Resolve a path relative to the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::Unknown(format!("invalid endpoint {path}: {e}")))
    }

    /// Send a call, retrying once if it is retryable and the failure transient.
    async fn send(&self, call: &Call<'_>) -> Result<String, ApiError> {
        match self.attempt(call).await {
            Err(err) if call.retry && err.is_transient() => {
                warn!(
                    method = %call.method,
                    url = %call.url,
                    error = %err,
                    "API call failed, retrying once"
                );
                self.attempt(call).await
            }
            outcome => outcome,
        }
    }

    /// One HTTP round trip.
    async fn attempt(&self, call: &Call<'_>) -> Result<String, ApiError> {
        let mut request = self
            .inner
            .client
            .request(call.method.clone(), call.url.clone())
            .header("Accept", "application/json");

        if let Some(token) = call.token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &call.body {
            request = request
                .header("Content-Type", "application/json")
                .body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                url = %call.url,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "API returned non-success status"
            );
            return Err(classify_status(status, call.conflict));
        }

        Ok(body)
    }

    /// Send a call and decode the JSON response.
    async fn execute<T: DeserializeOwned>(&self, call: Call<'_>) -> Result<T, ApiError> {
        let body = self.send(&call).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %call.url,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to decode API response"
            );
            ApiError::Decode(e.to_string())
        })
    }

    /// Send a call whose response body is not needed.
    async fn execute_discarding(&self, call: Call<'_>) -> Result<(), ApiError> {
        self.send(&call).await.map(|_| ())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch every goods item.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_goods_list(
        &self,
        token: Option<&SecretString>,
    ) -> Result<Vec<Goods>, ApiError> {
        let url = self.endpoint("items/all")?;
        self.execute(Call::new(Method::GET, url, token)).await
    }

    /// Fetch the goods in one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn fetch_goods_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Goods>, ApiError> {
        let url = self.endpoint(&format!("items/categories/{category_id}"))?;
        self.execute(Call::new(Method::GET, url, None)).await
    }

    /// Fetch the category list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        let url = self.endpoint("categories/all")?;
        self.execute(Call::new(Method::GET, url, None)).await
    }

    /// Fetch one goods item as seen by the (optionally) signed-in user.
    ///
    /// Never cached: the scrap flag depends on the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(goods_id = %goods_id))]
    pub async fn fetch_goods_detail(
        &self,
        goods_id: GoodsId,
        token: Option<&SecretString>,
    ) -> Result<Goods, ApiError> {
        let url = self.endpoint(&format!("items/{goods_id}"))?;
        self.execute(Call::new(Method::GET, url, token)).await
    }

    /// Look up a goods item anonymously, without automatic retry.
    ///
    /// Results are cached. Callers that fan out over many ids (fee
    /// resolution, confirmation prefetch) apply their own retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(goods_id = %goods_id))]
    pub async fn lookup_goods(&self, goods_id: GoodsId) -> Result<Goods, ApiError> {
        if let Some(goods) = self.inner.goods_cache.get(&goods_id).await {
            debug!("Cache hit for goods");
            return Ok(goods);
        }

        let url = self.endpoint(&format!("items/{goods_id}"))?;
        let goods: Goods = self
            .execute(Call::new(Method::GET, url, None).retry(false))
            .await?;

        self.inner.goods_cache.insert(goods_id, goods.clone()).await;
        Ok(goods)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a goods item to the cart.
    ///
    /// # Errors
    ///
    /// Returns `Conflict::AlreadyInCart` on HTTP 409, or another error if
    /// the API request fails.
    #[instrument(skip(self, token, request), fields(goods_id = %goods_id))]
    pub async fn add_to_cart(
        &self,
        goods_id: GoodsId,
        request: &CartAddRequest,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("carts/items/{goods_id}"))?;
        let call = Call::new(Method::POST, url, token)
            .json(request)?
            .conflict(ConflictRule::AlreadyInCart);
        self.execute_discarding(call).await
    }

    /// Fetch the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_cart(&self, token: Option<&SecretString>) -> Result<Vec<CartEntry>, ApiError> {
        let url = self.endpoint("carts")?;
        self.execute(Call::new(Method::GET, url, token)).await
    }

    /// Change the quantity of a cart entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn update_cart_quantity(
        &self,
        cart_id: CartId,
        quantity: u32,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct QuantityUpdate {
            quantity: u32,
        }

        let url = self.endpoint(&format!("carts/{cart_id}"))?;
        let call = Call::new(Method::PATCH, url, token).json(&QuantityUpdate { quantity })?;
        self.execute_discarding(call).await
    }

    /// Delete a cart entry.
    ///
    /// Deleting is idempotent, so transient failures are retried once.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(cart_id = %cart_id))]
    pub async fn delete_cart_entry(
        &self,
        cart_id: CartId,
        token: Option<&SecretString>,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("carts/{cart_id}"))?;
        self.execute_discarding(Call::new(Method::DELETE, url, token).retry(true))
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place a single-item order straight from a goods detail page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, submission), fields(goods_id = %goods_id))]
    pub async fn submit_order_from_detail(
        &self,
        goods_id: GoodsId,
        submission: &OrderSubmission,
        token: Option<&SecretString>,
    ) -> Result<OrderConfirmation, ApiError> {
        let url = self.endpoint(&format!("orders/items/{goods_id}"))?;
        let call = Call::new(Method::POST, url, token).json(&submission.to_body())?;
        self.execute(call).await
    }

    /// Place an order for previously saved cart entries.
    ///
    /// # Errors
    ///
    /// Returns `Conflict::CartEmpty` when the server no longer has the cart
    /// entries (HTTP 404/409), or another error if the API request fails.
    #[instrument(skip(self, token, submission))]
    pub async fn submit_order_from_cart(
        &self,
        submission: &OrderSubmission,
        token: Option<&SecretString>,
    ) -> Result<OrderConfirmation, ApiError> {
        let url = self.endpoint("orders/carts")?;
        let call = Call::new(Method::POST, url, token)
            .json(&submission.to_body())?
            .conflict(ConflictRule::CartEmpty);
        self.execute(call).await
    }

    /// Fetch the signed-in user's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_order_history(
        &self,
        token: Option<&SecretString>,
    ) -> Result<Vec<OrderConfirmation>, ApiError> {
        let url = self.endpoint("orders")?;
        self.execute(Call::new(Method::GET, url, token)).await
    }

    // =========================================================================
    // Scraps
    // =========================================================================

    /// Scrap (wishlist) a goods item.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(goods_id = %goods_id))]
    pub async fn add_scrap(
        &self,
        goods_id: GoodsId,
        token: Option<&SecretString>,
    ) -> Result<ScrapCount, ApiError> {
        let url = self.endpoint(&format!("scraps/items/{goods_id}"))?;
        self.execute(Call::new(Method::POST, url, token)).await
    }

    /// Remove a scrap.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(goods_id = %goods_id))]
    pub async fn remove_scrap(
        &self,
        goods_id: GoodsId,
        token: Option<&SecretString>,
    ) -> Result<ScrapCount, ApiError> {
        let url = self.endpoint(&format!("scraps/items/{goods_id}"))?;
        self.execute(Call::new(Method::DELETE, url, token).retry(true))
            .await
    }

    /// Fetch the signed-in user's scrapped goods.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn fetch_scrap_list(
        &self,
        token: Option<&SecretString>,
    ) -> Result<Vec<Goods>, ApiError> {
        let url = self.endpoint("scraps")?;
        self.execute(Call::new(Method::GET, url, token)).await
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Ask whether an email address is still free for sign-up.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn check_email(&self, email: &Email) -> Result<bool, ApiError> {
        let mut url = self.endpoint("auth/email")?;
        url.query_pairs_mut().append_pair("email", email.as_str());
        let availability: EmailAvailability =
            self.execute(Call::new(Method::GET, url, None)).await?;
        Ok(availability.available)
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        let url = self.endpoint("auth/signup")?;
        let call = Call::new(Method::POST, url, None).json(request)?;
        self.execute_discarding(call).await
    }
}

/// Map a non-success status to an error.
fn classify_status(status: StatusCode, rule: ConflictRule) -> ApiError {
    match (status, rule) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => ApiError::AuthenticationFailure,
        (StatusCode::CONFLICT, ConflictRule::AlreadyInCart) => {
            ApiError::Conflict(Conflict::AlreadyInCart)
        }
        (StatusCode::CONFLICT | StatusCode::NOT_FOUND, ConflictRule::CartEmpty) => {
            ApiError::Conflict(Conflict::CartEmpty)
        }
        _ => ApiError::InvalidResponse {
            status: status.as_u16(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client(server: &MockServer) -> GoodsMallClient {
        let config = ApiConfig::new(&server.base_url()).unwrap();
        GoodsMallClient::new(&config).unwrap()
    }

    fn goods_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Sejong eco bag",
            "price": 12000,
            "deliveryFee": 3000,
            "seller": { "id": 1, "name": "Student council", "method": "both" }
        })
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, ConflictRule::None),
            ApiError::AuthenticationFailure
        );
        assert_eq!(
            classify_status(StatusCode::CONFLICT, ConflictRule::AlreadyInCart),
            ApiError::Conflict(Conflict::AlreadyInCart)
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND, ConflictRule::CartEmpty),
            ApiError::Conflict(Conflict::CartEmpty)
        );
        assert_eq!(
            classify_status(StatusCode::CONFLICT, ConflictRule::None),
            ApiError::InvalidResponse { status: 409 }
        );
    }

    #[tokio::test]
    async fn test_fetch_goods_detail_sends_bearer_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/items/5")
                .header("authorization", "Bearer session-token");
            then.status(200).json_body(goods_json(5));
        });

        let client = test_client(&server);
        let token = SecretString::from("session-token");
        let goods = client
            .fetch_goods_detail(GoodsId::new(5), Some(&token))
            .await
            .unwrap();

        assert_eq!(goods.id, GoodsId::new(5));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_is_retried_once_on_server_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/items/all");
            then.status(503);
        });

        let client = test_client(&server);
        let err = client.fetch_goods_list(None).await.unwrap_err();

        assert_eq!(err, ApiError::InvalidResponse { status: 503 });
        assert_eq!(mock.calls(), 2, "GET should be attempted twice");
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/carts");
            then.status(401);
        });

        let client = test_client(&server);
        let err = client.fetch_cart(None).await.unwrap_err();

        assert_eq!(err, ApiError::AuthenticationFailure);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_add_to_cart_conflict() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/carts/items/3")
                .json_body(json!({ "quantity": 1, "color": "navy", "cartMethod": "delivery" }));
            then.status(409);
        });

        let client = test_client(&server);
        let request = CartAddRequest {
            quantity: 1,
            color: Some("navy".to_string()),
            size: None,
            cart_method: goodsmall_core::FulfillmentMethod::Delivery,
        };
        let err = client
            .add_to_cart(GoodsId::new(3), &request, None)
            .await
            .unwrap_err();

        assert_eq!(err, ApiError::Conflict(Conflict::AlreadyInCart));
        assert_eq!(mock.calls(), 1, "POST should not be retried");
    }

    #[tokio::test]
    async fn test_lookup_goods_is_cached() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/items/8");
            then.status(200).json_body(goods_json(8));
        });

        let client = test_client(&server);
        let first = client.lookup_goods(GoodsId::new(8)).await.unwrap();
        let second = client.lookup_goods(GoodsId::new(8)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/categories/all");
            then.status(200).body("{\"not\": \"a list\"}");
        });

        let client = test_client(&server);
        let err = client.fetch_categories().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_check_email_encodes_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/auth/email")
                .query_param("email", "first+goods@sju.ac.kr");
            then.status(200).json_body(json!({ "available": false }));
        });

        let client = test_client(&server);
        let email = Email::parse("first+goods@sju.ac.kr").unwrap();
        assert!(!client.check_email(&email).await.unwrap());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_no_network() {
        // Port 9 (discard) is closed on test hosts
        let config = ApiConfig::new("http://127.0.0.1:9").unwrap();
        let client = GoodsMallClient::new(&config).unwrap();

        let err = client.fetch_categories().await.unwrap_err();
        assert_eq!(err, ApiError::NoNetwork);
    }
}
