//! Repository traits describing the source-of-truth store.
//!
//! The caches and services consume these traits only; the Postgres
//! implementations live in `infra::db`, and the integration tests inject
//! in-memory doubles through the same seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CategoryRecord, ProductRecord, RateRow, SessionRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Full-dataset product reads. The catalog cache always fetches everything
/// and slices pages in memory; there is no server-side filtering.
#[async_trait]
pub trait ProductsRepo: Send + Sync {
    /// All products, ordered by creation time descending.
    async fn fetch_all_products(&self) -> Result<Vec<ProductRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All categories, ordered by display position.
    async fn fetch_all_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait RatesRepo: Send + Sync {
    /// All rate rows whose target currency is the pivot.
    async fn fetch_rates_to_pivot(&self) -> Result<Vec<RateRow>, RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    /// Look up an admin session by its token digest.
    async fn find_session(&self, token_digest: &str) -> Result<Option<SessionRecord>, RepoError>;
}

/// Reachability probe for the source store, backing `GET /health/db`.
#[async_trait]
pub trait SourceHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
