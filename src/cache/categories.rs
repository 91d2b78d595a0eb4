//! Category cache.
//!
//! Same cell pattern as the product catalog with a longer TTL and no
//! pagination: the category list is small and changes rarely.

use std::sync::Arc;

use tracing::info;

use crate::application::repos::CategoriesRepo;
use crate::domain::entities::CategoryRecord;

use super::catalog::CatalogError;
use super::cell::TtlCell;
use super::config::CacheConfig;

pub struct CategoryCache {
    cell: TtlCell<Vec<CategoryRecord>>,
    repo: Arc<dyn CategoriesRepo>,
}

impl CategoryCache {
    pub fn new(repo: Arc<dyn CategoriesRepo>, config: &CacheConfig) -> Self {
        Self {
            cell: TtlCell::new("categories", config.categories_ttl),
            repo,
        }
    }

    /// The full category list, ordered by display position.
    pub async fn list(&self) -> Result<Arc<Vec<CategoryRecord>>, CatalogError> {
        let repo = Arc::clone(&self.repo);
        Ok(self
            .cell
            .get(move || async move { repo.fetch_all_categories().await })
            .await?)
    }

    pub async fn refresh(&self) -> Result<usize, CatalogError> {
        let repo = Arc::clone(&self.repo);
        let snapshot = self
            .cell
            .refresh(move || async move { repo.fetch_all_categories().await })
            .await?;
        info!(count = snapshot.len(), "category cache refreshed");
        Ok(snapshot.len())
    }

    pub fn invalidate(&self) {
        self.cell.invalidate();
    }
}
