//! Response cache middleware.
//!
//! Caches successful GET responses on the public catalog routes and serves
//! them until the invalidation coordinator revalidates their path. Response
//! bodies here are small JSON documents; anything over the buffer cap is
//! passed through uncached.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{debug, instrument};

use super::store::{CachedResponse, ResponseKey, ResponseStore, hash_query};

const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

const METRIC_RESPONSE_HIT: &str = "vitrina_response_cache_hit_total";
const METRIC_RESPONSE_MISS: &str = "vitrina_response_cache_miss_total";

/// Shared cache state for the middleware layer.
#[derive(Clone)]
pub struct CacheState {
    pub enabled: bool,
    pub store: Arc<ResponseStore>,
}

/// Middleware for response caching.
///
/// Only GET requests that return 200 OK are cached.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !cache.enabled || request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = ResponseKey {
        path: request.uri().path().to_string(),
        query_hash: hash_query(request.uri().query().unwrap_or("")),
    };

    if let Some(cached) = cache.store.get(&key) {
        counter!(METRIC_RESPONSE_HIT).increment(1);
        debug!(outcome = "hit", "serving cached response");
        return build_response(cached);
    }

    counter!(METRIC_RESPONSE_MISS).increment(1);
    debug!(outcome = "miss", "executing handler");

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        headers: parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect(),
        body: bytes.clone(),
    };
    cache.store.set(key, cached);

    Response::from_parts(parts, Body::from(bytes))
}

fn build_response(cached: CachedResponse) -> Response {
    use axum::http::HeaderValue;

    let mut builder = Response::builder().status(cached.status);
    for (name, value) in cached.headers {
        if let Ok(header_value) = HeaderValue::from_str(&value) {
            builder = builder.header(name, header_value);
        }
    }

    builder
        .body(Body::from(cached.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
