//! Shared offset pagination helpers.
//!
//! Pages are computed over an already-materialized snapshot: `offset =
//! (page - 1) * limit`, `total_pages = ceil(total / limit)`. A page beyond
//! the data is an empty page with correct totals, not an error.

use serde::Serialize;

/// One page sliced out of a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct OffsetPage<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Slice `items` into the requested page. `page` and `limit` must already be
/// validated as non-zero by the caller.
pub fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> OffsetPage<T> {
    let total = items.len() as u64;
    let total_pages = total.div_ceil(u64::from(limit)) as u32;

    let offset = (page as usize - 1).saturating_mul(limit as usize);
    let slice = if offset >= items.len() {
        &[]
    } else {
        let end = offset.saturating_add(limit as usize).min(items.len());
        &items[offset..end]
    };

    OffsetPage {
        items: slice.to_vec(),
        page,
        limit,
        total,
        total_pages,
    }
}
