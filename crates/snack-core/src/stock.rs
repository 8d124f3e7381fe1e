//! # Stock Ledger (pure part)
//!
//! Unit normalization and the availability check. The database crate owns
//! the decrement itself, which it performs as one conditional update; the
//! functions here decide how many units a cart line asks for and build the
//! error when there are not enough.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{QuantityMode, SaleType, Snack};

/// Units requested by a cart line.
///
/// ```text
/// mode = Unit   →  quantity
/// mode = Combo  →  quantity × combo_units
/// ```
///
/// ## Errors
/// - `ComboNotAvailable` when combos are requested for a snack sold by the unit
/// - `OutOfRange` on `quantity` when the unit count does not fit in an `i64`
pub fn requested_units(snack: &Snack, quantity: i64, mode: QuantityMode) -> CoreResult<i64> {
    match mode {
        QuantityMode::Unit => Ok(quantity),
        QuantityMode::Combo => match (snack.sale_type, snack.combo_units) {
            (SaleType::Combo, Some(units)) if units > 0 => {
                quantity.checked_mul(units).ok_or_else(|| {
                    ValidationError::OutOfRange {
                        field: "quantity".to_string(),
                        min: 1,
                        max: i64::MAX / units,
                    }
                    .into()
                })
            }
            _ => Err(CoreError::ComboNotAvailable(snack.name.clone())),
        },
    }
}

/// Outcome of a successful availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub requested: i64,
    pub available: i64,
}

/// Checks `requested` against the snack's current stock.
///
/// ## Errors
/// `InsufficientStock` carrying the snack name and both numbers.
pub fn check_available(snack: &Snack, requested: i64) -> CoreResult<Reservation> {
    if requested > snack.stock {
        return Err(insufficient(snack, requested));
    }
    Ok(Reservation {
        requested,
        available: snack.stock,
    })
}

/// Builds the `InsufficientStock` error for a snack.
pub fn insufficient(snack: &Snack, requested: i64) -> CoreError {
    CoreError::InsufficientStock {
        snack_name: snack.name.clone(),
        available: snack.stock,
        requested,
    }
}
