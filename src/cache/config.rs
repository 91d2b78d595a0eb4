//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

const DEFAULT_PRODUCTS_TTL: Duration = Duration::from_secs(300);
const DEFAULT_CATEGORIES_TTL: Duration = Duration::from_secs(600);
const DEFAULT_RATES_TTL: Duration = Duration::from_secs(300);
const DEFAULT_RESPONSE_LIMIT: usize = 200;

/// Cache configuration, bridged from the `[cache]` settings section.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for the product catalog cell.
    pub products_ttl: Duration,
    /// Time-to-live for the category cell.
    pub categories_ttl: Duration,
    /// Time-to-live for the exchange-rate cell.
    pub rates_ttl: Duration,
    /// Enable the response cache in front of the public catalog routes.
    pub enable_response_cache: bool,
    /// Maximum cached responses.
    pub response_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            products_ttl: DEFAULT_PRODUCTS_TTL,
            categories_ttl: DEFAULT_CATEGORIES_TTL,
            rates_ttl: DEFAULT_RATES_TTL,
            enable_response_cache: true,
            response_limit: DEFAULT_RESPONSE_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            products_ttl: Duration::from_secs(settings.products_ttl_secs.get()),
            categories_ttl: Duration::from_secs(settings.categories_ttl_secs.get()),
            rates_ttl: Duration::from_secs(settings.rates_ttl_secs.get()),
            enable_response_cache: settings.enable_response_cache,
            response_limit: settings.response_cache_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
