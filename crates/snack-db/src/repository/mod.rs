//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Admin command                                                          │
//! │       │                                                                 │
//! │       │  db.sales().create_sale(new_sale)                               │
//! │       ▼                                                                 │
//! │  SaleRepository ──► snack-core (pricing, stock, debt rules)             │
//! │       │                                                                 │
//! │       │  one SQLite transaction                                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │       │                                                                 │
//! │       ▼  after commit                                                   │
//! │  ActivityLogger (best effort, never fails the caller)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SnackRepository`](snack::SnackRepository) - Snack CRUD, search, public catalog
//! - [`PersonRepository`](person::PersonRepository) - People, debt totals, guarded delete
//! - [`SaleRepository`](sale::SaleRepository) - Sale workflow transaction and history
//! - [`DebtRepository`](debt::DebtRepository) - Debt lifecycle
//! - [`ActivityLogRepository`](activity::ActivityLogRepository) - Audit trail
//! - [`ReportRepository`](report::ReportRepository) - Portfolio figures

pub mod activity;
pub mod debt;
pub mod person;
pub mod report;
pub mod sale;
pub mod snack;

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{DbError, DbResult};

/// Builds a `LIKE` pattern for a case-insensitive substring search.
///
/// `%`, `_` and `\` in the query are escaped; use with `ESCAPE '\'`.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Parses a decimal stored as TEXT.
pub(crate) fn parse_decimal(column: &str, value: &str) -> DbResult<Decimal> {
    Decimal::from_str(value).map_err(|_| DbError::Decode {
        column: column.to_string(),
        value: value.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("dor"), "%dor%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("unit_cost", "0.6667").unwrap(), Decimal::new(6667, 4));
        assert!(matches!(
            parse_decimal("unit_cost", "abc"),
            Err(DbError::Decode { .. })
        ));
    }
}
