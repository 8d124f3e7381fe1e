//! # Error Types
//!
//! Domain-specific error types for snack-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  snack-core errors (this file)                                         │
//! │  ├── CoreError        - Not-found, conflict and pricing failures       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  snack-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures, carries CoreError as-is     │
//! │                                                                         │
//! │  Admin API errors (in app)                                             │
//! │  └── ApiError         - What the UI sees (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conflict messages carry the numbers the operator needs (available stock,
//! remaining balance) because the UI shows them verbatim.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and lookup failures.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Snack not found: {0}")]
    SnackNotFound(String),

    #[error("Person not found: {0}")]
    PersonNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Debt not found: {0}")]
    DebtNotFound(String),

    /// A sale was requested with no lines.
    #[error("Cannot record a sale with an empty cart")]
    EmptyCart,

    /// Not enough units on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart line: 6 × Doritos
    ///      │
    ///      ▼
    /// Conditional decrement affects 0 rows, stock re-read = 5
    ///      │
    ///      ▼
    /// InsufficientStock { snack_name: "Doritos", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock for Doritos: only 5 units available ..."
    /// ```
    #[error("Insufficient stock for {snack_name}: only {available} units available, {requested} requested")]
    InsufficientStock {
        snack_name: String,
        available: i64,
        requested: i64,
    },

    /// Units per container (or combo units) was zero or negative.
    #[error("Cannot derive a per-unit value: {field} must be greater than zero")]
    DivisionInvalid { field: String },

    /// Sale price per unit does not exceed the unit cost.
    #[error("Unit sale price {unit_price} must be greater than unit cost {unit_cost}")]
    PriceNotAboveCost { unit_price: String, unit_cost: String },

    /// Delete refused because other records still reference the entity.
    #[error("Cannot delete: {reason}")]
    DeleteBlocked { reason: String },

    #[error("Person {0} has no pending debts")]
    NoPendingDebts(String),

    #[error("Sale {0} already has a debt")]
    DebtAlreadyExists(String),

    #[error("Debt {0} is already paid")]
    DebtAlreadyPaid(String),

    /// Payment larger than what is still owed.
    #[error("Payment of {requested} exceeds the remaining balance of {remaining}")]
    Overpayment { remaining: Money, requested: Money },

    /// A combo quantity was requested for a snack sold by the unit.
    #[error("Snack {0} is not sold in combos")]
    ComboNotAvailable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the "id does not resolve" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::SnackNotFound(_)
                | CoreError::PersonNotFound(_)
                | CoreError::SaleNotFound(_)
                | CoreError::DebtNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any mutation, so a validation failure never leaves
/// partial state behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, unknown enum value).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message_carries_numbers() {
        let err = CoreError::InsufficientStock {
            snack_name: "Doritos".to_string(),
            available: 5,
            requested: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Doritos: only 5 units available, 6 requested"
        );
    }

    #[test]
    fn test_overpayment_message() {
        let err = CoreError::Overpayment {
            remaining: Money::from_cents(1200),
            requested: Money::from_cents(1500),
        };
        assert_eq!(
            err.to_string(),
            "Payment of $15.00 exceeds the remaining balance of $12.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
        assert!(CoreError::DebtNotFound("d1".into()).is_not_found());
    }
}
