//! # Pricing Calculator
//!
//! Derives the per-unit economics of a snack from what the operator typed in.
//!
//! ```text
//! container_cost / units_per_container            ──► unit_cost
//! unit_sale_price   OR   combo_price / combo_units ──► effective_unit_sale_price
//! effective_unit_sale_price − unit_cost            ──► profit_margin_per_unit
//! containers_purchased × units_per_container       ──► stock
//! ```
//!
//! Per-unit values are rounded to [`PRICE_SCALE`] decimal places. The margin is
//! computed from the already rounded prices so the three stored values always
//! satisfy `margin == price − cost` exactly.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{SaleType, SnackInput};
use crate::validation;

/// Decimal places kept for per-unit values.
pub const PRICE_SCALE: u32 = 4;

/// Values derived from a snack's purchase and sale attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPricing {
    pub unit_cost: Decimal,
    pub effective_unit_sale_price: Decimal,
    pub profit_margin_per_unit: Decimal,
    pub stock: i64,
}

/// Pure pricing functions. No state, no I/O.
pub struct PricingCalculator;

impl PricingCalculator {
    /// `container_cost / units_per_container`.
    ///
    /// ## Errors
    /// `DivisionInvalid` when `units_per_container <= 0`.
    pub fn unit_cost(container_cost: Money, units_per_container: i64) -> CoreResult<Decimal> {
        divide(container_cost, units_per_container, "units_per_container")
    }

    /// Price of a single unit.
    ///
    /// For combos this is `combo_price / combo_units`, whatever
    /// `unit_sale_price` holds.
    pub fn effective_unit_sale_price(input: &SnackInput) -> CoreResult<Decimal> {
        match input.sale_type {
            SaleType::Unit => {
                let cents = input.unit_sale_price_cents.ok_or_else(|| {
                    CoreError::from(crate::ValidationError::Required {
                        field: "unit_sale_price".to_string(),
                    })
                })?;
                Ok(round_price(Money::from_cents(cents).to_decimal()))
            }
            SaleType::Combo => {
                let (units, price) = match (input.combo_units, input.combo_price_cents) {
                    (Some(units), Some(price)) => (units, price),
                    (None, _) => {
                        return Err(crate::ValidationError::Required {
                            field: "combo_units".to_string(),
                        }
                        .into())
                    }
                    (_, None) => {
                        return Err(crate::ValidationError::Required {
                            field: "combo_price".to_string(),
                        }
                        .into())
                    }
                };
                divide(Money::from_cents(price), units, "combo_units")
            }
        }
    }

    /// `containers_purchased × units_per_container`.
    ///
    /// ## Errors
    /// `OutOfRange` on `containers_purchased` when the product does not fit
    /// in an `i64`.
    pub fn stock(containers_purchased: i64, units_per_container: i64) -> CoreResult<i64> {
        containers_purchased
            .checked_mul(units_per_container)
            .ok_or_else(|| {
                crate::ValidationError::OutOfRange {
                    field: "containers_purchased".to_string(),
                    min: 0,
                    max: i64::MAX / units_per_container.max(1),
                }
                .into()
            })
    }

    /// Computes every derived value. Negative margins are returned as-is;
    /// rejecting them is [`PricingCalculator::validated`]'s job.
    pub fn derive(input: &SnackInput) -> CoreResult<DerivedPricing> {
        let unit_cost = Self::unit_cost(
            Money::from_cents(input.container_cost_cents),
            input.units_per_container,
        )?;
        let effective_unit_sale_price = Self::effective_unit_sale_price(input)?;

        Ok(DerivedPricing {
            unit_cost,
            effective_unit_sale_price,
            profit_margin_per_unit: effective_unit_sale_price - unit_cost,
            stock: Self::stock(input.containers_purchased, input.units_per_container)?,
        })
    }

    /// Validates the input, derives the pricing and requires a positive margin.
    ///
    /// This is what create and update run before writing anything.
    pub fn validated(input: &SnackInput) -> CoreResult<DerivedPricing> {
        validation::validate_snack_input(input)?;
        let derived = Self::derive(input)?;

        if derived.effective_unit_sale_price <= derived.unit_cost {
            return Err(CoreError::PriceNotAboveCost {
                unit_price: derived.effective_unit_sale_price.to_string(),
                unit_cost: derived.unit_cost.to_string(),
            });
        }

        Ok(derived)
    }
}

fn divide(amount: Money, divisor: i64, field: &str) -> CoreResult<Decimal> {
    if divisor <= 0 {
        return Err(CoreError::DivisionInvalid {
            field: field.to_string(),
        });
    }
    Ok(round_price(amount.to_decimal() / Decimal::from(divisor)))
}

/// Rounds a per-unit value to [`PRICE_SCALE`] places (half away from zero).
pub fn round_price(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

// =============================================================================
// Unit Tests
// =============================================================================
