//! Catalog validation protocol behavior, end to end through the client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cart_core::{cancel_pair, CallContext, Cart, Currency, Decimal, ProductId, SessionId};
use cart_observability::Logger;
use catalog_validation::{
    CartItemRequest, CartValidationRequest, CatalogClient, CatalogError, CatalogServer,
    CatalogService, ClientConfig, InMemoryCatalog, LookupError, Product, ProductLookup,
    ProductValidationRequest, StatusCode,
};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::with_products([
        Product::new(1, "Mug", dec("10.00")).with_stock(3),
        Product::new(2, "Cap", dec("12.50")).with_stock(10),
        Product::new(3, "Pen", dec("1.99")).with_stock(0),
    ]))
}

fn server(catalog: Arc<InMemoryCatalog>) -> CatalogServer {
    CatalogServer::new(catalog, Logger::disabled())
}

fn client(catalog: Arc<InMemoryCatalog>) -> CatalogClient {
    CatalogClient::new(
        Arc::new(server(catalog)),
        ClientConfig::default(),
        Logger::disabled(),
    )
}

#[tokio::test]
async fn test_insufficient_stock_in_bulk() {
    let client = client(catalog());

    let response = client
        .validate_cart_items(&CallContext::background(), vec![CartItemRequest::new("1", 5)])
        .await
        .unwrap();

    let result = &response.results[0];
    assert!(result.valid);
    assert!(!result.in_stock);
    assert_eq!(result.available_quantity, 3);
    assert!(result
        .error_message
        .as_deref()
        .unwrap()
        .contains("Available: 3, Requested: 5"));
    assert!(!response.all_valid);
    assert_eq!(response.total_price, Decimal::ZERO);
    assert_eq!(response.currency, Currency::USD);
}

#[tokio::test]
async fn test_empty_product_id_is_invalid_argument() {
    let client = client(catalog());

    let err = client
        .validate_product(&CallContext::background(), "", 1)
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidArgument(_)));
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[tokio::test]
async fn test_invalid_argument_checked_before_lookup() {
    let catalog = catalog();
    catalog.fail_with(Some("database down"));
    let client = client(catalog);
    let ctx = CallContext::background();

    let err = client.validate_product(&ctx, "1", -2).await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidArgument(_)));

    let err = client.validate_product(&ctx, "1", 1).await.unwrap_err();
    assert!(matches!(err, CatalogError::Internal(_)));
}

#[tokio::test]
async fn test_unknown_product_is_negative_result() {
    let client = client(catalog());

    let response = client
        .validate_product(&CallContext::background(), "404", 1)
        .await
        .unwrap();

    assert!(!response.valid);
    assert!(!response.in_stock);
    assert_eq!(response.error_message.as_deref(), Some("Product not found"));
}

#[tokio::test]
async fn test_get_product_price() {
    let client = client(catalog());
    let ctx = CallContext::background();

    let found = client.get_product_price(&ctx, "2").await.unwrap();
    assert!(found.found);
    assert_eq!(found.price, dec("12.50"));
    assert_eq!(found.currency, Some(Currency::USD));

    let missing = client.get_product_price(&ctx, "999").await.unwrap();
    assert!(!missing.found);
    assert_eq!(missing.currency, None);

    let err = client.get_product_price(&ctx, "").await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_bulk_results_keep_request_order() {
    let client = client(catalog());

    let response = client
        .validate_cart_items(
            &CallContext::background(),
            vec![
                CartItemRequest::new("3", 1),
                CartItemRequest::new("404", 1),
                CartItemRequest::new("1", 2),
            ],
        )
        .await
        .unwrap();

    let names: Vec<&str> = response
        .results
        .iter()
        .map(|r| r.product_name.as_str())
        .collect();
    assert_eq!(names, vec!["Pen", "", "Mug"]);
}

#[tokio::test]
async fn test_bulk_total_counts_only_orderable_lines() {
    let catalog = catalog();
    let service = server(catalog.clone());
    let ctx = CallContext::background();

    let items = vec![
        CartItemRequest::new("1", 2),   // 20.00, in stock
        CartItemRequest::new("1", 4),   // over stock
        CartItemRequest::new("2", 3),   // 37.50, in stock
        CartItemRequest::new("3", 1),   // out of stock
        CartItemRequest::new("404", 1), // unknown
    ];

    let bulk = service
        .validate_cart_items(&ctx, CartValidationRequest::new(items.clone()))
        .await
        .unwrap();

    // Same sum when each line is validated on its own.
    let mut expected = Decimal::ZERO;
    for item in &items {
        let single = service
            .validate_product(&ctx, ProductValidationRequest::from(item))
            .await
            .unwrap();
        if single.valid && single.in_stock {
            expected += single.unit_price * Decimal::from(item.quantity);
        }
    }

    assert_eq!(bulk.total_price, expected);
    assert_eq!(bulk.total_price, dec("57.50"));
    assert!(!bulk.all_valid);
    assert_eq!(bulk.results.len(), items.len());
}

#[tokio::test]
async fn test_bulk_all_valid() {
    let client = client(catalog());

    let response = client
        .validate_cart_items(
            &CallContext::background(),
            vec![CartItemRequest::new("1", 3), CartItemRequest::new("2", 1)],
        )
        .await
        .unwrap();

    assert!(response.all_valid);
    assert_eq!(response.total_price, dec("42.50"));
}

#[tokio::test]
async fn test_empty_bulk_request_is_all_valid() {
    let client = client(catalog());

    let response = client
        .validate_cart_items(&CallContext::background(), Vec::new())
        .await
        .unwrap();

    assert!(response.results.is_empty());
    assert!(response.all_valid);
    assert_eq!(response.total_price, Decimal::ZERO);
}

#[tokio::test]
async fn test_bulk_fails_fast_on_invalid_line() {
    let client = client(catalog());

    let err = client
        .validate_cart_items(
            &CallContext::background(),
            vec![
                CartItemRequest::new("1", 1),
                CartItemRequest::new("2", 0),
                CartItemRequest::new("3", 1),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidArgument(_)));
}

/// Counts lookups and fails on one id.
struct FailingLookup {
    inner: Arc<InMemoryCatalog>,
    poisoned: &'static str,
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl ProductLookup for FailingLookup {
    async fn find(&self, product_id: &str) -> Result<Option<Product>, LookupError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if product_id == self.poisoned {
            return Err(LookupError::new("connection reset by peer"));
        }
        self.inner.find(product_id).await
    }
}

#[tokio::test]
async fn test_bulk_backend_failure_aborts_remaining_lines() {
    let lookup = Arc::new(FailingLookup {
        inner: catalog(),
        poisoned: "2",
        calls: Default::default(),
    });
    let service = CatalogServer::new(lookup.clone(), Logger::disabled());

    let err = service
        .validate_cart_items(
            &CallContext::background(),
            CartValidationRequest::new([
                CartItemRequest::new("1", 1),
                CartItemRequest::new("2", 1),
                CartItemRequest::new("3", 1),
            ]),
        )
        .await
        .unwrap_err();

    assert_eq!(err, CatalogError::Internal("Failed to retrieve product".into()));
    assert_eq!(lookup.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

/// Never answers within any reasonable deadline.
struct StalledService;

#[async_trait]
impl CatalogService for StalledService {
    async fn validate_product(
        &self,
        _ctx: &CallContext,
        _request: ProductValidationRequest,
    ) -> Result<catalog_validation::ProductValidationResponse, CatalogError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(CatalogError::Unavailable("unreachable".into()))
    }

    async fn get_product_price(
        &self,
        _ctx: &CallContext,
        _request: catalog_validation::ProductPriceRequest,
    ) -> Result<catalog_validation::ProductPriceResponse, CatalogError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(CatalogError::Unavailable("unreachable".into()))
    }

    async fn validate_cart_items(
        &self,
        _ctx: &CallContext,
        _request: CartValidationRequest,
    ) -> Result<catalog_validation::CartValidationResponse, CatalogError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(CatalogError::Unavailable("unreachable".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_client_deadline_applies_without_caller_deadline() {
    let client = CatalogClient::new(
        Arc::new(StalledService),
        ClientConfig { timeout_ms: 500 },
        Logger::disabled(),
    );

    let err = client
        .validate_product(&CallContext::background(), "1", 1)
        .await
        .unwrap_err();

    assert_eq!(err, CatalogError::DeadlineExceeded(Duration::from_millis(500)));
    assert_eq!(err.code(), StatusCode::DeadlineExceeded);
}

#[tokio::test(start_paused = true)]
async fn test_caller_deadline_tighter_than_client_default() {
    let client = CatalogClient::new(Arc::new(StalledService), ClientConfig::default(), Logger::disabled());

    let err = client
        .get_product_price(&CallContext::with_timeout(Duration::from_millis(50)), "1")
        .await
        .unwrap_err();

    assert_eq!(err, CatalogError::DeadlineExceeded(Duration::from_millis(50)));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_call() {
    let client = Arc::new(CatalogClient::new(
        Arc::new(StalledService),
        ClientConfig { timeout_ms: 60_000 },
        Logger::disabled(),
    ));
    let (handle, signal) = cancel_pair();
    let ctx = CallContext::background().with_cancel(signal);

    let call = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .validate_cart_items(&ctx, vec![CartItemRequest::new("1", 1)])
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();

    assert_eq!(call.await.unwrap().unwrap_err(), CatalogError::Cancelled);
}

#[tokio::test]
async fn test_validate_session_cart() {
    let client = client(catalog());
    let mut cart = Cart::new(SessionId::new("s1"));
    cart.add_item(ProductId::new(1), 2, dec("9.00"), "Mug").unwrap();
    cart.add_item(ProductId::new(2), 1, dec("12.50"), "Cap").unwrap();

    let response = client
        .validate_cart(&CallContext::background(), &cart)
        .await
        .unwrap();

    // Authoritative prices, not the ones captured at add time.
    assert!(response.all_valid);
    assert_eq!(response.total_price, dec("32.50"));
}

#[tokio::test]
async fn test_validate_session_cart_rejects_quantity_beyond_protocol_range() {
    let client = client(Arc::new(InMemoryCatalog::with_products([
        Product::new(1, "Mug", dec("9.00")).with_stock(2_500_000_000),
    ])));
    let mut cart = Cart::new(SessionId::new("s1"));
    cart.add_item(ProductId::new(1), 1, dec("9.00"), "Mug").unwrap();
    cart.items[0].quantity = 3_000_000_000;

    let err = client
        .validate_cart(&CallContext::background(), &cart)
        .await
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}
