//! Shared request and response types for the Vitrina catalog API.
//!
//! These types define the public JSON wire format served by the catalog
//! routes. The server crate converts its domain records into these payloads
//! at the HTTP boundary; API consumers and the integration tests deserialize
//! the same types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A product as exposed by `GET /catalog/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub stock: i32,
    pub category_id: Uuid,
    pub on_sale: bool,
    pub featured: bool,
    pub is_new: bool,
    pub image_urls: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Paginated product listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsPageResponse {
    pub products: Vec<ProductPayload>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// A category as exposed by `GET /catalog/categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryPayload>,
}

/// Current exchange-rate snapshot, normalized to the pivot currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesResponse {
    pub pivot: String,
    pub rates: BTreeMap<String, f64>,
    /// True when the snapshot is the static fallback table rather than
    /// live data.
    pub degraded: bool,
}

/// Response to the internal product refresh trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub revalidated: bool,
    pub count: u64,
}

/// One requested cart line; quantities are clamped server-side to the
/// product's available stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartTotalsRequest {
    pub lines: Vec<CartLineRequest>,
    /// Target display currencies; totals are reported per currency.
    pub currencies: Vec<String>,
}

/// Totals per target currency. A `null` amount means the conversion is
/// undefined for that currency (missing or invalid rate); `formatted`
/// carries "N/A" for that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartTotalsResponse {
    pub totals: BTreeMap<String, Option<f64>>,
    pub formatted: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateRequest {
    pub path: Option<String>,
}

/// Per-step outcome of an invalidation fan-out. The two steps are
/// independent; either flag may be false while the other is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub revalidated: bool,
    pub products_refreshed: bool,
    pub path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Error envelope returned by every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_request_tolerates_missing_path() {
        let parsed: InvalidateRequest = serde_json::from_str("{}").expect("parsed");
        assert!(parsed.path.is_none());
    }

    #[test]
    fn cart_totals_response_serializes_null_sentinel() {
        let mut totals = BTreeMap::new();
        totals.insert("USD".to_string(), Some(25.41));
        totals.insert("XXX".to_string(), None);
        let mut formatted = BTreeMap::new();
        formatted.insert("USD".to_string(), "$25.41".to_string());
        formatted.insert("XXX".to_string(), "N/A".to_string());

        let body = CartTotalsResponse { totals, formatted };
        let json = serde_json::to_value(&body).expect("serialized");
        assert_eq!(json["totals"]["XXX"], serde_json::Value::Null);
        assert_eq!(json["formatted"]["XXX"], "N/A");
    }
}
