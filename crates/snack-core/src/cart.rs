//! # Cart
//!
//! The shopping cart the operator fills before recording a sale.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI Action              Cart method             Effect                  │
//! │  ─────────              ───────────             ──────                  │
//! │  Pick snack ──────────► add()             ────► merge or push line      │
//! │  Change quantity ─────► update_quantity() ────► line.quantity = n       │
//! │  Remove ──────────────► remove()          ────► drop line               │
//! │  Confirm ─────────────► to_new_sale()     ────► NewSale for workflow    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `(snack_id, mode)`; adding again raises the quantity
//! - Quantity per line is 1..=`MAX_ITEM_QUANTITY`
//! - At most `MAX_CART_ITEMS` lines
//! - Units of one snack across all its lines never exceed the stock seen
//!   when it was added
//!
//! Prices shown in the cart are estimates. The sale workflow re-reads every
//! snack and prices the sale from the database.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::stock;
use crate::types::{NewSale, NewSaleItem, QuantityMode, Snack};
use crate::validation::{validate_cart_size, validate_quantity};
use crate::MAX_ITEM_QUANTITY;

/// A line in the cart.
///
/// Name, price and combo size are frozen copies taken when the line was
/// added, so the cart renders consistently while the operator works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub snack_id: String,
    pub snack_name: String,
    pub mode: QuantityMode,
    /// Units or combos, depending on `mode`.
    pub quantity: i64,
    /// Units per counted item: 1, or the combo size.
    pub units_per_item: i64,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Units this line takes from stock.
    pub fn units(&self) -> i64 {
        self.quantity.saturating_mul(self.units_per_item)
    }

    /// Estimated subtotal, rounded the same way the workflow rounds.
    pub fn subtotal(&self) -> Money {
        Money::line_subtotal(self.unit_price, self.units())
    }
}

/// The cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a snack, merging with an existing line of the same mode.
    ///
    /// ## Errors
    /// - `Validation` for a bad quantity or a full cart
    /// - `ComboNotAvailable` for combos of a unit-only snack
    /// - `InsufficientStock` when the snack's units in the cart would exceed
    ///   its stock
    pub fn add(&mut self, snack: &Snack, quantity: i64, mode: QuantityMode) -> CoreResult<()> {
        validate_quantity(quantity)?;
        let units_per_item = stock::requested_units(snack, 1, mode)?;

        let existing = self
            .lines
            .iter()
            .position(|l| l.snack_id == snack.id && l.mode == mode);

        let new_quantity = match existing {
            Some(i) => self.lines[i].quantity + quantity,
            None => {
                validate_cart_size(self.lines.len())?;
                quantity
            }
        };
        validate_quantity(new_quantity)?;

        let other_units = self.units_for(&snack.id) - existing.map_or(0, |i| self.lines[i].units());
        let line_units = stock::requested_units(snack, new_quantity, mode)?;
        stock::check_available(snack, other_units.saturating_add(line_units))?;

        match existing {
            Some(i) => self.lines[i].quantity = new_quantity,
            None => self.lines.push(CartLine {
                snack_id: snack.id.clone(),
                snack_name: snack.name.clone(),
                mode,
                quantity,
                units_per_item,
                unit_price: snack.effective_unit_sale_price,
                added_at: Utc::now(),
            }),
        }
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// Stock is not re-checked here; the sale workflow is the authority.
    pub fn update_quantity(
        &mut self,
        snack_id: &str,
        mode: QuantityMode,
        quantity: i64,
    ) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(snack_id, mode);
        }
        validate_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.snack_id == snack_id && l.mode == mode)
            .ok_or_else(|| CoreError::SnackNotFound(snack_id.to_string()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, snack_id: &str, mode: QuantityMode) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines
            .retain(|l| !(l.snack_id == snack_id && l.mode == mode));
        if self.lines.len() == before {
            return Err(CoreError::SnackNotFound(snack_id.to_string()));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Units of one snack across its lines.
    pub fn units_for(&self, snack_id: &str) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.snack_id == snack_id)
            .map(CartLine::units)
            .sum()
    }

    pub fn total_units(&self) -> i64 {
        self.lines.iter().map(CartLine::units).sum()
    }

    /// Estimated total.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Converts the cart into a sale request.
    ///
    /// ## Errors
    /// `EmptyCart` when there are no lines.
    pub fn to_new_sale(
        &self,
        person_id: impl Into<String>,
        sale_date: NaiveDate,
        paid: bool,
    ) -> CoreResult<NewSale> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        Ok(NewSale {
            person_id: person_id.into(),
            sale_date,
            items: self
                .lines
                .iter()
                .map(|l| NewSaleItem {
                    snack_id: l.snack_id.clone(),
                    quantity: l.quantity,
                    mode: l.mode,
                })
                .collect(),
            paid,
        })
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_units: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_units: cart.total_units(),
            total_cents: cart.total().cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PurchaseType, SaleType};
    use crate::MAX_CART_ITEMS;

    fn unit_snack(id: &str, stock: i64) -> Snack {
        let now = Utc::now();
        Snack {
            id: id.to_string(),
            name: format!("Snack {id}"),
            purchase_type: PurchaseType::Box,
            units_per_container: 12,
            container_cost_cents: 2400,
            containers_purchased: 3,
            sale_type: SaleType::Unit,
            unit_sale_price_cents: Some(500),
            combo_units: None,
            combo_price_cents: None,
            unit_cost: Decimal::new(2, 0),
            effective_unit_sale_price: Decimal::new(5, 0),
            profit_margin_per_unit: Decimal::new(3, 0),
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    fn combo_snack(stock: i64) -> Snack {
        Snack {
            sale_type: SaleType::Combo,
            unit_sale_price_cents: None,
            combo_units: Some(3),
            combo_price_cents: Some(200),
            unit_cost: Decimal::new(5, 1),
            effective_unit_sale_price: Decimal::new(6667, 4),
            profit_margin_per_unit: Decimal::new(1667, 4),
            ..unit_snack("c", stock)
        }
    }

    #[test]
    fn test_add_merges_same_snack_and_mode() {
        let mut cart = Cart::new();
        let snack = unit_snack("1", 36);

        cart.add(&snack, 2, QuantityMode::Unit).unwrap();
        cart.add(&snack, 3, QuantityMode::Unit).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_units(), 5);
        assert_eq!(cart.total().cents(), 2500);
    }

    #[test]
    fn test_combo_and_unit_lines_are_separate() {
        let mut cart = Cart::new();
        let snack = combo_snack(24);

        cart.add(&snack, 2, QuantityMode::Combo).unwrap();
        cart.add(&snack, 1, QuantityMode::Unit).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.units_for("c"), 7);
        // 6 × 0.6667 = 4.0002 → 4.00, 1 × 0.6667 → 0.67
        assert_eq!(cart.total().cents(), 467);
    }

    #[test]
    fn test_add_respects_stock_across_lines() {
        let mut cart = Cart::new();
        let snack = combo_snack(7);

        cart.add(&snack, 2, QuantityMode::Combo).unwrap();
        cart.add(&snack, 1, QuantityMode::Unit).unwrap();
        let err = cart.add(&snack, 1, QuantityMode::Unit).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 7, requested: 8, .. }
        ));
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        let snack = unit_snack("1", 10_000);

        cart.add(&snack, MAX_ITEM_QUANTITY, QuantityMode::Unit).unwrap();
        assert!(cart.add(&snack, 1, QuantityMode::Unit).is_err());
        assert_eq!(cart.total_units(), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_cart_size_cap() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add(&unit_snack(&i.to_string(), 10), 1, QuantityMode::Unit)
                .unwrap();
        }
        assert!(cart
            .add(&unit_snack("overflow", 10), 1, QuantityMode::Unit)
            .is_err());
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = Cart::new();
        let snack = unit_snack("1", 36);
        cart.add(&snack, 2, QuantityMode::Unit).unwrap();

        cart.update_quantity("1", QuantityMode::Unit, 4).unwrap();
        assert_eq!(cart.total_units(), 4);

        cart.update_quantity("1", QuantityMode::Unit, 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.remove("1", QuantityMode::Unit).is_err());
    }

    #[test]
    fn test_to_new_sale() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let cart = Cart::new();
        assert!(matches!(
            cart.to_new_sale("p1", date, false),
            Err(CoreError::EmptyCart)
        ));

        let mut cart = Cart::new();
        cart.add(&combo_snack(24), 2, QuantityMode::Combo).unwrap();
        let sale = cart.to_new_sale("p1", date, false).unwrap();
        assert_eq!(sale.items, vec![NewSaleItem::combos("c", 2)]);
        assert!(!sale.paid);
    }
}
