//! Domain entities mirrored from persistent storage.
//!
//! The caches only mirror these records; they are never mutated in process.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::currency::CurrencyCode;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub currency: CurrencyCode,
    pub stock: i32,
    pub category_id: Uuid,
    pub on_sale: bool,
    pub featured: bool,
    pub is_new: bool,
    pub image_urls: Vec<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub position: i32,
}

/// One exchange-rate row from the source store. Only rows whose target is
/// the pivot currency are consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRow {
    pub currency_from: CurrencyCode,
    pub currency_to: CurrencyCode,
    pub rate: f64,
}

/// An admin session as persisted by the (out-of-scope) auth surface.
/// Only the token digest and expiry matter to this service.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub token_digest: String,
    pub expires_at: OffsetDateTime,
}
