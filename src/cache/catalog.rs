//! Product catalog cache.
//!
//! One cell holds the entire product dataset, ordered by creation time
//! descending; pages are sliced out of the cached snapshot. Source failures
//! propagate — there is no stale-serving for products.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::pagination::{OffsetPage, paginate};
use crate::application::repos::{ProductsRepo, RepoError};
use crate::domain::entities::ProductRecord;

use super::cell::TtlCell;
use super::config::CacheConfig;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog source unavailable")]
    Source(#[from] RepoError),
}

pub struct ProductCatalog {
    cell: TtlCell<Vec<ProductRecord>>,
    repo: Arc<dyn ProductsRepo>,
}

impl ProductCatalog {
    pub fn new(repo: Arc<dyn ProductsRepo>, config: &CacheConfig) -> Self {
        Self {
            cell: TtlCell::new("products", config.products_ttl),
            repo,
        }
    }

    /// One page of the catalog. The whole snapshot is fetched on a miss;
    /// slicing is purely in-memory.
    pub async fn list(&self, page: u32, limit: u32) -> Result<OffsetPage<ProductRecord>, CatalogError> {
        let snapshot = self.snapshot().await?;
        Ok(paginate(&snapshot, page, limit))
    }

    /// Resolve a single product from the cached snapshot.
    pub async fn get(&self, product_id: Uuid) -> Result<Option<ProductRecord>, CatalogError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.iter().find(|p| p.id == product_id).cloned())
    }

    /// Force an immediate repopulation regardless of TTL state. Safe to call
    /// concurrently with in-flight `list` calls: readers see either the old
    /// or the new snapshot, never a mix.
    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        let repo = Arc::clone(&self.repo);
        let snapshot = self
            .cell
            .refresh(move || async move { repo.fetch_all_products().await })
            .await?;
        info!(count = snapshot.len(), "product catalog refreshed");
        Ok(snapshot.len())
    }

    /// Mark the snapshot stale without dropping it.
    pub fn invalidate(&self) {
        self.cell.invalidate();
    }

    async fn snapshot(&self) -> Result<Arc<Vec<ProductRecord>>, CatalogError> {
        let repo = Arc::clone(&self.repo);
        Ok(self
            .cell
            .get(move || async move { repo.fetch_all_products().await })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use tokio::time::advance;

    use crate::domain::currency::CurrencyCode;

    use super::*;
    use std::time::Duration;

    struct StubProducts {
        products: std::sync::Mutex<Vec<ProductRecord>>,
        fetches: AtomicUsize,
        fail: AtomicBool,
    }

    impl StubProducts {
        fn with_count(count: usize) -> Arc<Self> {
            Arc::new(Self {
                products: std::sync::Mutex::new(sample_products(count)),
                fetches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            })
        }

        fn replace(&self, products: Vec<ProductRecord>) {
            *self.products.lock().expect("stub lock") = products;
        }
    }

    #[async_trait]
    impl ProductsRepo for StubProducts {
        async fn fetch_all_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(RepoError::from_persistence("source offline"));
            }
            Ok(self.products.lock().expect("stub lock").clone())
        }
    }

    fn sample_products(count: usize) -> Vec<ProductRecord> {
        (0..count)
            .map(|i| ProductRecord {
                id: Uuid::new_v4(),
                name: format!("product-{i}"),
                price: 10.0 + i as f64,
                currency: CurrencyCode::new("USD"),
                stock: 5,
                category_id: Uuid::new_v4(),
                on_sale: false,
                featured: false,
                is_new: i < 3,
                image_urls: Vec::new(),
                created_at: OffsetDateTime::now_utc(),
            })
            .collect()
    }

    fn catalog(repo: Arc<StubProducts>) -> ProductCatalog {
        ProductCatalog::new(repo, &CacheConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn pages_cover_the_dataset_without_refetching() {
        let repo = StubProducts::with_count(45);
        let catalog = catalog(Arc::clone(&repo));

        let page1 = catalog.list(1, 20).await.expect("page 1");
        let page2 = catalog.list(2, 20).await.expect("page 2");
        let page3 = catalog.list(3, 20).await.expect("page 3");

        assert_eq!(page1.items.len(), 20);
        assert_eq!(page2.items.len(), 20);
        assert_eq!(page3.items.len(), 5);
        assert_eq!(page1.total, 45);
        assert_eq!(page1.total_pages, 3);
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn page_beyond_data_is_empty_not_an_error() {
        let repo = StubProducts::with_count(5);
        let catalog = catalog(repo);

        let page = catalog.list(9, 20).await.expect("page");
        assert!(page.items.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn source_failure_surfaces_to_the_caller() {
        let repo = StubProducts::with_count(5);
        repo.fail.store(true, Ordering::SeqCst);
        let catalog = catalog(repo);

        let err = catalog.list(1, 20).await.expect_err("propagated");
        assert!(matches!(err, CatalogError::Source(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_swaps_in_the_new_dataset_before_ttl_expiry() {
        let repo = StubProducts::with_count(2);
        let catalog = catalog(Arc::clone(&repo));

        catalog.list(1, 20).await.expect("initial");
        repo.replace(sample_products(7));

        // Still fresh: the old snapshot is served.
        let stale = catalog.list(1, 20).await.expect("cached");
        assert_eq!(stale.total, 2);

        let count = catalog.refresh().await.expect("refreshed");
        assert_eq!(count, 7);

        let fresh = catalog.list(1, 20).await.expect("served");
        assert_eq!(fresh.total, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_triggers_exactly_one_refetch() {
        let repo = StubProducts::with_count(3);
        let catalog = catalog(Arc::clone(&repo));

        catalog.list(1, 20).await.expect("initial");
        advance(Duration::from_secs(301)).await;
        catalog.list(1, 20).await.expect("repopulated");

        assert_eq!(repo.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_repopulation_before_ttl_expiry() {
        let repo = StubProducts::with_count(2);
        let catalog = catalog(Arc::clone(&repo));

        catalog.list(1, 20).await.expect("initial");
        repo.replace(sample_products(6));
        catalog.invalidate();

        let page = catalog.list(1, 20).await.expect("repopulated");
        assert_eq!(page.total, 6);
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn get_resolves_a_product_from_the_snapshot() {
        let repo = StubProducts::with_count(4);
        let wanted = repo.products.lock().expect("stub lock")[2].clone();
        let catalog = catalog(repo);

        let found = catalog.get(wanted.id).await.expect("resolved");
        assert_eq!(found, Some(wanted));

        let missing = catalog.get(Uuid::new_v4()).await.expect("resolved");
        assert!(missing.is_none());
    }
}
