//! Cart lines, quantity clamping, and multi-currency total aggregation.
//!
//! Totals are computed against a single `RateTable` snapshot: each line's
//! subtotal is taken in its native currency at full precision, converted into
//! every target currency, and accumulated. Rounding is deferred to display.
//! A line whose currency cannot be converted into a target makes that
//! target's total undefined rather than silently wrong.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::currency::{CurrencyCode, RateTable};

/// One cart line. Quantity is kept within `0 ..= stock` at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub unit_price: f64,
    pub currency: CurrencyCode,
    pub stock: u32,
    quantity: u32,
}

impl CartLine {
    /// Build a line, clamping the requested quantity to available stock.
    pub fn new(
        product_id: Uuid,
        unit_price: f64,
        currency: CurrencyCode,
        stock: u32,
        quantity: u32,
    ) -> Self {
        Self {
            product_id,
            unit_price,
            currency,
            stock,
            quantity: quantity.min(stock),
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Subtotal in the line's native currency, at full precision.
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Accumulated totals per target currency. `None` marks a total that could
/// not be computed because at least one line had no usable rate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartTotals {
    totals: BTreeMap<CurrencyCode, Option<f64>>,
}

impl CartTotals {
    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.totals.get(code).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, Option<f64>)> {
        self.totals.iter().map(|(code, total)| (code, *total))
    }
}

/// An ordered set of cart lines with clamp-preserving quantity edits.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line or replace the quantity of an existing one. The effective
    /// quantity is clamped to `[0, stock]`; an effective quantity of zero
    /// removes the line. Returns the quantity actually applied.
    pub fn set_quantity(&mut self, line: CartLine) -> u32 {
        let applied = line.quantity;
        let existing = self
            .lines
            .iter()
            .position(|l| l.product_id == line.product_id);

        match (existing, applied) {
            (Some(index), 0) => {
                self.lines.remove(index);
            }
            (Some(index), _) => {
                self.lines[index] = line;
            }
            (None, 0) => {}
            (None, _) => self.lines.push(line),
        }
        applied
    }

    /// Increase a line's quantity by one, saturating at stock.
    pub fn increment(&mut self, product_id: Uuid) -> Option<u32> {
        let line = self.lines.iter_mut().find(|l| l.product_id == product_id)?;
        line.quantity = line.quantity.saturating_add(1).min(line.stock);
        Some(line.quantity)
    }

    /// Decrease a line's quantity by one; reaching zero removes the line.
    pub fn decrement(&mut self, product_id: Uuid) -> Option<u32> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        let line = &mut self.lines[index];
        line.quantity = line.quantity.saturating_sub(1);
        let remaining = line.quantity;
        if remaining == 0 {
            self.lines.remove(index);
        }
        Some(remaining)
    }

    /// Aggregate totals into each target currency against one rate snapshot.
    /// Callers must not swap the snapshot mid-aggregation; the whole cart is
    /// converted against the table passed here.
    pub fn totals(&self, table: &RateTable, targets: &[CurrencyCode]) -> CartTotals {
        let mut totals = BTreeMap::new();

        for target in targets {
            let mut sum = Some(0.0);
            for line in &self.lines {
                sum = match (sum, table.convert(line.subtotal(), &line.currency, target)) {
                    (Some(acc), Some(converted)) => Some(acc + converted),
                    _ => None,
                };
            }
            totals.insert(target.clone(), sum);
        }

        CartTotals { totals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::fallback_rates;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD")
    }

    fn eur() -> CurrencyCode {
        CurrencyCode::new("EUR")
    }

    fn cup() -> CurrencyCode {
        CurrencyCode::pivot()
    }

    fn line(price: f64, currency: CurrencyCode, stock: u32, quantity: u32) -> CartLine {
        CartLine::new(Uuid::new_v4(), price, currency, stock, quantity)
    }

    #[test]
    fn quantity_clamps_to_stock() {
        let clamped = line(10.0, usd(), 5, 999);
        assert_eq!(clamped.quantity(), 5);
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let id = Uuid::new_v4();
        cart.set_quantity(CartLine::new(id, 10.0, usd(), 5, 2));
        assert_eq!(cart.lines().len(), 1);

        cart.set_quantity(CartLine::new(id, 10.0, usd(), 5, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn increment_saturates_at_stock() {
        let mut cart = Cart::new();
        let id = Uuid::new_v4();
        cart.set_quantity(CartLine::new(id, 10.0, usd(), 2, 2));

        assert_eq!(cart.increment(id), Some(2));
    }

    #[test]
    fn decrement_to_zero_removes_line() {
        let mut cart = Cart::new();
        let id = Uuid::new_v4();
        cart.set_quantity(CartLine::new(id, 10.0, usd(), 5, 1));

        assert_eq!(cart.decrement(id), Some(0));
        assert!(cart.is_empty());
    }

    #[test]
    fn totals_match_worked_example() {
        // line1: 10 USD × 2, line2: 5 EUR × 1, against the fallback table.
        let table = fallback_rates();
        let mut cart = Cart::new();
        cart.set_quantity(line(10.0, usd(), 10, 2));
        cart.set_quantity(line(5.0, eur(), 10, 1));

        let totals = cart.totals(&table, &[cup(), usd()]);

        let total_cup = totals.get(&cup()).expect("defined");
        assert!((total_cup - 6352.5).abs() < 1e-9);

        let total_usd = totals.get(&usd()).expect("defined");
        assert!((total_usd - 25.41).abs() < 0.005);
    }

    #[test]
    fn totals_are_order_independent() {
        let table = fallback_rates();
        let a = line(10.0, usd(), 10, 2);
        let b = line(5.0, eur(), 10, 1);

        let mut forward = Cart::new();
        forward.set_quantity(a.clone());
        forward.set_quantity(b.clone());

        let mut reverse = Cart::new();
        reverse.set_quantity(b);
        reverse.set_quantity(a);

        assert_eq!(
            forward.totals(&table, &[cup()]),
            reverse.totals(&table, &[cup()])
        );
    }

    #[test]
    fn unconvertible_line_poisons_only_affected_targets() {
        let table = fallback_rates();
        let mxn = CurrencyCode::new("MXN");
        let mut cart = Cart::new();
        cart.set_quantity(line(7.0, mxn.clone(), 10, 2));

        let totals = cart.totals(&table, &[mxn.clone(), cup()]);

        // Identity keeps the native target defined even for an unknown code;
        // the pivot target has no usable rate and stays undefined.
        assert_eq!(totals.get(&mxn), Some(14.0));
        assert_eq!(totals.get(&cup()), None);
    }

    #[test]
    fn accumulation_keeps_full_precision() {
        // Three lines of 1/3 each; rounding per line would drift.
        let table = fallback_rates();
        let mut cart = Cart::new();
        for _ in 0..3 {
            cart.set_quantity(line(1.0 / 3.0, usd(), 10, 1));
        }
        let totals = cart.totals(&table, &[usd()]);
        let total = totals.get(&usd()).expect("defined");
        assert!((total - 1.0).abs() < 1e-9);
    }
}
