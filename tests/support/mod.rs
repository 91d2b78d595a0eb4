//! Shared helpers for driving the router over in-memory repository doubles.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use vitrina::{
    application::{
        invalidation::{InvalidationCoordinator, PageCache},
        repos::{
            CategoriesRepo, ProductsRepo, RatesRepo, RepoError, SessionsRepo, SourceHealth,
        },
        sessions::{SessionService, digest_token},
    },
    cache::{
        CacheConfig, CacheState, CategoryCache, ProductCatalog, RateCache, ResponseStore,
    },
    domain::{
        currency::CurrencyCode,
        entities::{CategoryRecord, ProductRecord, RateRow, SessionRecord},
    },
    infra::http::{RequestPolicy, RouterState, build_router},
};

/// In-memory stand-in for the Postgres source of truth, with failure
/// injection and fetch counters.
#[derive(Default)]
pub struct InMemorySource {
    pub products: Mutex<Vec<ProductRecord>>,
    pub categories: Mutex<Vec<CategoryRecord>>,
    pub rates: Mutex<Vec<RateRow>>,
    pub sessions: Mutex<Vec<SessionRecord>>,
    pub product_fetches: AtomicUsize,
    pub fail_products: AtomicBool,
    pub fail_rates: AtomicBool,
}

impl InMemorySource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_products(&self, products: Vec<ProductRecord>) {
        *self.products.lock().expect("products lock") = products;
    }

    pub fn set_categories(&self, categories: Vec<CategoryRecord>) {
        *self.categories.lock().expect("categories lock") = categories;
    }

    pub fn set_rates(&self, rates: Vec<RateRow>) {
        *self.rates.lock().expect("rates lock") = rates;
    }

    pub fn add_session(&self, token: &str, expires_in: Duration) {
        self.sessions
            .lock()
            .expect("sessions lock")
            .push(SessionRecord {
                token_digest: digest_token(token),
                expires_at: OffsetDateTime::now_utc() + expires_in,
            });
    }
}

#[async_trait]
impl ProductsRepo for InMemorySource {
    async fn fetch_all_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        self.product_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("products source offline"));
        }
        Ok(self.products.lock().expect("products lock").clone())
    }
}

#[async_trait]
impl CategoriesRepo for InMemorySource {
    async fn fetch_all_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        Ok(self.categories.lock().expect("categories lock").clone())
    }
}

#[async_trait]
impl RatesRepo for InMemorySource {
    async fn fetch_rates_to_pivot(&self) -> Result<Vec<RateRow>, RepoError> {
        if self.fail_rates.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("rates source offline"));
        }
        Ok(self.rates.lock().expect("rates lock").clone())
    }
}

#[async_trait]
impl SessionsRepo for InMemorySource {
    async fn find_session(&self, token_digest: &str) -> Result<Option<SessionRecord>, RepoError> {
        Ok(self
            .sessions
            .lock()
            .expect("sessions lock")
            .iter()
            .find(|s| s.token_digest == token_digest)
            .cloned())
    }
}

#[async_trait]
impl SourceHealth for InMemorySource {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub source: Arc<InMemorySource>,
    pub response_store: Arc<ResponseStore>,
}

pub struct TestAppOptions {
    pub invalidate_token: Option<String>,
    pub enable_response_cache: bool,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            invalidate_token: Some("secret-token".to_string()),
            enable_response_cache: true,
        }
    }
}

pub fn build_app(source: Arc<InMemorySource>, options: TestAppOptions) -> TestApp {
    let cache_config = CacheConfig::default();

    let products = Arc::new(ProductCatalog::new(
        Arc::clone(&source) as Arc<dyn ProductsRepo>,
        &cache_config,
    ));
    let categories = Arc::new(CategoryCache::new(
        Arc::clone(&source) as Arc<dyn CategoriesRepo>,
        &cache_config,
    ));
    let rates = Arc::new(RateCache::new(
        Arc::clone(&source) as Arc<dyn RatesRepo>,
        &cache_config,
    ));
    let sessions = Arc::new(SessionService::new(
        Arc::clone(&source) as Arc<dyn SessionsRepo>
    ));

    let response_store = Arc::new(ResponseStore::new(&cache_config));
    let coordinator = Arc::new(InvalidationCoordinator::new(
        Arc::clone(&response_store) as Arc<dyn PageCache>,
        Arc::clone(&products),
    ));

    let state = RouterState {
        products,
        categories,
        rates,
        sessions,
        coordinator,
        source_health: Arc::clone(&source) as Arc<dyn SourceHealth>,
        response_cache: Some(CacheState {
            enabled: options.enable_response_cache,
            store: Arc::clone(&response_store),
        }),
        policy: Arc::new(RequestPolicy {
            default_page_size: 20,
            max_page_size: 100,
            invalidate_token: options.invalidate_token,
            products_cache_control: "public, s-maxage=300, stale-while-revalidate=600"
                .to_string(),
            categories_cache_control: "public, s-maxage=600, stale-while-revalidate=1200"
                .to_string(),
        }),
    };

    TestApp {
        router: build_router(state),
        source,
        response_store,
    }
}

pub fn product(name: &str, price: f64, currency: &str, stock: i32) -> ProductRecord {
    ProductRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        price,
        currency: CurrencyCode::new(currency),
        stock,
        category_id: Uuid::new_v4(),
        on_sale: false,
        featured: false,
        is_new: false,
        image_urls: Vec::new(),
        created_at: OffsetDateTime::now_utc(),
    }
}

pub fn category(name: &str, position: i32) -> CategoryRecord {
    CategoryRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        icon: format!("{name}-icon"),
        position,
    }
}

pub fn rate(from: &str, rate: f64) -> RateRow {
    RateRow {
        currency_from: CurrencyCode::new(from),
        currency_to: CurrencyCode::pivot(),
        rate,
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router
        .clone()
        .oneshot(request)
        .await
        .expect("router ran")
}

pub async fn get(app: &TestApp, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = send(
        app,
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request built"),
    )
    .await;
    split_json(response).await
}

pub async fn post_json(
    app: &TestApp,
    uri: &str,
    headers: &[(&str, &str)],
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = send(
        app,
        builder
            .body(Body::from(body.to_string()))
            .expect("request built"),
    )
    .await;
    split_json(response).await
}

async fn split_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collected")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
