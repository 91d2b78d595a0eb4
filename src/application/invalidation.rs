//! Invalidation coordinator.
//!
//! Fans one authorized "data changed" event out to the response cache and
//! the product catalog cache. The two steps form a deliberate two-step saga:
//! they are evaluated and reported independently, a failure in either never
//! rolls back the other, and the outcome carries one boolean per step.
//!
//! Only the caches of this process instance are refreshed. In a horizontally
//! scaled deployment every other instance keeps serving its own TTL schedule
//! until it naturally expires, so cross-instance convergence is eventual,
//! bounded by the longest TTL in play.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use crate::cache::{ProductCatalog, ResponseStore};

const METRIC_FANOUT_MS: &str = "vitrina_invalidate_fanout_ms";

/// Seam to the page-level response cache, so the coordinator can be
/// exercised against a failing cache in tests.
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Drop cached pages at `path` and below; returns how many were dropped.
    async fn revalidate(&self, path: &str) -> Result<usize, PageCacheError>;
}

#[derive(Debug, Error)]
pub enum PageCacheError {
    #[error("page cache revalidation failed: {0}")]
    Revalidate(String),
}

#[async_trait]
impl PageCache for ResponseStore {
    async fn revalidate(&self, path: &str) -> Result<usize, PageCacheError> {
        Ok(self.revalidate_path(path))
    }
}

/// Per-step outcome of one fan-out.
#[derive(Debug, Clone)]
pub struct InvalidationOutcome {
    pub revalidated: bool,
    pub products_refreshed: bool,
    pub path: String,
    pub timestamp: OffsetDateTime,
}

pub struct InvalidationCoordinator {
    page_cache: Arc<dyn PageCache>,
    products: Arc<ProductCatalog>,
}

impl InvalidationCoordinator {
    pub fn new(page_cache: Arc<dyn PageCache>, products: Arc<ProductCatalog>) -> Self {
        Self {
            page_cache,
            products,
        }
    }

    /// Run both fan-out steps for an already-authorized request.
    #[instrument(skip(self))]
    pub async fn fan_out(&self, path: &str) -> InvalidationOutcome {
        let started_at = Instant::now();
        info!(path, phase = "fanning_out", "invalidation fan-out starting");

        let revalidated = match self.page_cache.revalidate(path).await {
            Ok(dropped) => {
                info!(path, dropped, step = "revalidate", "response cache revalidated");
                true
            }
            Err(err) => {
                error!(path, error = %err, step = "revalidate", "response cache revalidation failed");
                false
            }
        };

        let products_refreshed = match self.products.refresh().await {
            Ok(count) => {
                info!(count, step = "refresh_products", "product catalog refreshed");
                true
            }
            Err(err) => {
                error!(error = %err, step = "refresh_products", "product catalog refresh failed");
                false
            }
        };

        histogram!(METRIC_FANOUT_MS).record(started_at.elapsed().as_millis() as f64);
        info!(
            path,
            revalidated, products_refreshed, phase = "done", "invalidation fan-out finished"
        );

        InvalidationOutcome {
            revalidated,
            products_refreshed,
            path: path.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}
