//! Currency codes, pivot-normalized rate tables, and conversion.
//!
//! All cross-rate math goes through the pivot currency: a table maps each
//! currency to its rate against the pivot, so `rate(A→B) = table[A] /
//! table[B]` for any pair present in the table. Conversions that cannot be
//! computed (missing or non-positive entries) yield `None`, never NaN or
//! infinity; the formatter renders that sentinel as "N/A".

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The reference currency all rates are normalized to.
pub const PIVOT_CURRENCY: &str = "CUP";

/// Uppercase ISO-4217-style currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn pivot() -> Self {
        Self::new(PIVOT_CURRENCY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_pivot(&self) -> bool {
        self.0 == PIVOT_CURRENCY
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Immutable snapshot of rates-to-pivot. A refresh replaces the whole table;
/// it is never mutated in place, so readers always observe one consistent
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<CurrencyCode, f64>,
}

impl RateTable {
    /// Build a table from `(currency, rate-to-pivot)` pairs. The pivot entry
    /// is always present and always exactly 1.0, regardless of input.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (CurrencyCode, f64)>) -> Self {
        let mut rates: BTreeMap<CurrencyCode, f64> = pairs.into_iter().collect();
        rates.insert(CurrencyCode::pivot(), 1.0);
        Self { rates }
    }

    /// Rate to the pivot for `code`, or `None` when the entry is missing,
    /// non-positive, or non-finite.
    pub fn rate_to_pivot(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates
            .get(code)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Cross rate `from → to` via the pivot, or `None` when undefined.
    pub fn cross_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }
        let from_rate = self.rate_to_pivot(from)?;
        let to_rate = self.rate_to_pivot(to)?;
        Some(from_rate / to_rate)
    }

    /// Convert `amount` from one currency to another. Identity conversions
    /// succeed even for codes absent from the table.
    pub fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        if from == to {
            return Some(amount);
        }
        self.cross_rate(from, to).map(|rate| amount * rate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.rates.iter().map(|(code, rate)| (code, *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

static FALLBACK_RATES: Lazy<Arc<RateTable>> = Lazy::new(|| {
    Arc::new(RateTable::from_pairs([
        (CurrencyCode::new("USD"), 250.0),
        (CurrencyCode::new("EUR"), 270.5),
        (CurrencyCode::new(PIVOT_CURRENCY), 1.0),
    ]))
});

/// The canonical static fallback table, served when the rate source is
/// unavailable. Every caller (engine, cache, tests) shares this constant.
pub fn fallback_rates() -> Arc<RateTable> {
    Arc::clone(&FALLBACK_RATES)
}

fn currency_symbol(code: &CurrencyCode) -> Option<&'static str> {
    match code.as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        _ => None,
    }
}

/// Format an amount for display: two decimal places, symbol-prefixed for
/// known currencies, code-suffixed otherwise. Rounding happens only here;
/// accumulation upstream keeps full precision.
pub fn format_amount(amount: f64, code: &CurrencyCode) -> String {
    match currency_symbol(code) {
        Some(symbol) => format!("{symbol}{amount:.2}"),
        None => format!("{amount:.2} {code}"),
    }
}

/// Format a possibly-undefined amount; the sentinel renders as "N/A".
pub fn format_optional(amount: Option<f64>, code: &CurrencyCode) -> String {
    match amount {
        Some(value) => format_amount(value, code),
        None => "N/A".to_string(),
    }
}
