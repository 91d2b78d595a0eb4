//! Exchange-rate cache.
//!
//! Unlike the product and category caches, the rate cache never propagates a
//! source failure: currency display must not block checkout, so an
//! unavailable source degrades to the canonical static fallback table. The
//! fallback is not stored in the cell — the next request retries the source.

use std::sync::Arc;

use metrics::counter;
use tracing::warn;

use crate::application::repos::{RatesRepo, RepoError};
use crate::domain::currency::{RateTable, fallback_rates};

use super::cell::TtlCell;
use super::config::CacheConfig;

const METRIC_RATE_FALLBACK: &str = "vitrina_rate_fallback_total";

/// One consistent rate snapshot. `degraded` marks the static fallback.
#[derive(Clone)]
pub struct RateSnapshot {
    pub table: Arc<RateTable>,
    pub degraded: bool,
}

pub struct RateCache {
    cell: TtlCell<RateTable>,
    repo: Arc<dyn RatesRepo>,
}

impl RateCache {
    pub fn new(repo: Arc<dyn RatesRepo>, config: &CacheConfig) -> Self {
        Self {
            cell: TtlCell::new("rates", config.rates_ttl),
            repo,
        }
    }

    /// The current rate table. Callers converting several amounts (cart
    /// aggregation) must hold on to the returned snapshot rather than
    /// calling this again mid-computation.
    pub async fn snapshot(&self) -> RateSnapshot {
        let repo = Arc::clone(&self.repo);
        let populated = self
            .cell
            .get(move || async move {
                let rows = repo.fetch_rates_to_pivot().await?;
                Ok::<_, RepoError>(RateTable::from_pairs(
                    rows.into_iter().map(|row| (row.currency_from, row.rate)),
                ))
            })
            .await;

        match populated {
            Ok(table) => RateSnapshot {
                table,
                degraded: false,
            },
            Err(err) => {
                counter!(METRIC_RATE_FALLBACK).increment(1);
                warn!(error = %err, "rate source unavailable, serving fallback table");
                RateSnapshot {
                    table: fallback_rates(),
                    degraded: true,
                }
            }
        }
    }
}
