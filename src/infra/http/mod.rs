//! HTTP surface: router assembly and shared state.

mod catalog;
mod error;
mod invalidate;
mod middleware;

pub use error::ApiError;
pub use middleware::{RequestContext, log_responses, set_request_context};

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    application::{
        error::ErrorReport, invalidation::InvalidationCoordinator, repos::SourceHealth,
        sessions::SessionService,
    },
    cache::{CacheState, CategoryCache, ProductCatalog, RateCache, response_cache_layer},
    config::Settings,
};

/// Cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "vitrina_session";

/// Per-request policy derived from settings at startup: pagination bounds,
/// the invalidation secret, and the cache-control values the public routes
/// advertise.
#[derive(Debug)]
pub struct RequestPolicy {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub invalidate_token: Option<String>,
    pub products_cache_control: String,
    pub categories_cache_control: String,
}

impl RequestPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        let products_ttl = settings.cache.products_ttl_secs.get();
        let categories_ttl = settings.cache.categories_ttl_secs.get();
        Self {
            default_page_size: settings.catalog.default_page_size.get(),
            max_page_size: settings.catalog.max_page_size.get(),
            invalidate_token: settings.security.invalidate_token.clone(),
            products_cache_control: cache_control(products_ttl),
            categories_cache_control: cache_control(categories_ttl),
        }
    }
}

/// `s-maxage` tracks the in-process TTL; stale responses may be served by
/// intermediaries for one further TTL while they revalidate.
fn cache_control(ttl_secs: u64) -> String {
    format!("public, s-maxage={ttl_secs}, stale-while-revalidate={}", ttl_secs * 2)
}

#[derive(Clone)]
pub struct RouterState {
    pub products: Arc<ProductCatalog>,
    pub categories: Arc<CategoryCache>,
    pub rates: Arc<RateCache>,
    pub sessions: Arc<SessionService>,
    pub coordinator: Arc<InvalidationCoordinator>,
    pub source_health: Arc<dyn SourceHealth>,
    pub response_cache: Option<CacheState>,
    pub policy: Arc<RequestPolicy>,
}

pub fn build_router(state: RouterState) -> Router {
    // Public catalog reads sit behind the response-cache layer; the layer
    // itself skips non-GET methods, so the refresh trigger can share the
    // products route entry.
    let cached_routes = Router::new()
        .route(
            "/catalog/products",
            get(catalog::list_products).post(catalog::refresh_products),
        )
        .route("/catalog/categories", get(catalog::list_categories))
        .route("/catalog/rates", get(catalog::list_rates));

    let cached_routes = if let Some(cache_state) = state.response_cache.clone() {
        cached_routes.layer(axum_middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ))
    } else {
        cached_routes
    };

    let uncached_routes = Router::new()
        .route("/cart/totals", post(catalog::cart_totals))
        .route("/catalog/invalidate", post(invalidate::invalidate))
        .route("/health", get(health))
        .route("/health/db", get(db_health));

    cached_routes
        .merge(uncached_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn db_health(State(state): State<RouterState>) -> Response {
    match state.source_health.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
