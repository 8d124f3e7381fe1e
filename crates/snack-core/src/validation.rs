//! # Validation Module
//!
//! Input validation for the snack manager.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin UI                                                     │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core (Rust)                                                  │
//! │  └── THIS MODULE: runs before any row is touched                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (stock >= 0, status values)                     │
//! │  ├── UNIQUE (one debt per sale)                                        │
//! │  └── Foreign keys (RESTRICT on snacks/people)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{NewSale, SaleType, SnackInput};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted name for snacks and people.
pub const MAX_NAME_LEN: usize = 120;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a snack or person name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use snack_core::validation::validate_name;
///
/// assert_eq!(validate_name("  Doritos ").unwrap(), "Doritos");
/// assert!(validate_name("").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## User Workflow
/// ```text
/// User enters quantity: 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty <= 0?   → "quantity must be positive"
///      ├── qty > 999?  → "quantity must be between 1 and 999"
///      └── OK          → stock check
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a payment amount in cents. Must be positive.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates the amount a debt is opened for. Must be positive.
pub fn validate_debt_amount(cents: i64) -> ValidationResult<()> {
    require_positive(cents, "amount")
}

fn require_positive(value: i64, field: &str) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates the operator-supplied attributes of a snack.
///
/// ## Rules
/// - name present
/// - `units_per_container > 0`, `containers_purchased > 0`
/// - `container_cost >= 0`
/// - unit sale: `unit_sale_price` present and `>= 0`
/// - combo sale: `combo_units > 0` and `combo_price > 0`
///
/// The "price above cost" rule needs derived values and lives in
/// [`crate::pricing::PricingCalculator::validated`].
pub fn validate_snack_input(input: &SnackInput) -> ValidationResult<()> {
    validate_name(&input.name)?;
    require_positive(input.units_per_container, "units_per_container")?;
    require_positive(input.containers_purchased, "containers_purchased")?;

    if input.container_cost_cents < 0 {
        return Err(ValidationError::Negative {
            field: "container_cost".to_string(),
        });
    }

    match input.sale_type {
        SaleType::Unit => match input.unit_sale_price_cents {
            None => Err(ValidationError::Required {
                field: "unit_sale_price".to_string(),
            }),
            Some(cents) if cents < 0 => Err(ValidationError::Negative {
                field: "unit_sale_price".to_string(),
            }),
            Some(_) => Ok(()),
        },
        SaleType::Combo => {
            let units = input.combo_units.ok_or_else(|| ValidationError::Required {
                field: "combo_units".to_string(),
            })?;
            require_positive(units, "combo_units")?;
            let price = input.combo_price_cents.ok_or_else(|| ValidationError::Required {
                field: "combo_price".to_string(),
            })?;
            require_positive(price, "combo_price")
        }
    }
}

/// Validates the shape of a sale request: ids present, cart size and
/// quantities in range.
///
/// An empty item list is reported by the workflow as `EmptyCart`, so this
/// only checks non-empty requests.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    if sale.person_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "person_id".to_string(),
        });
    }

    if sale.items.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    for item in &sale.items {
        if item.snack_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "snack_id".to_string(),
            });
        }
        validate_quantity(item.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size before adding another distinct line.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use snack_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Pagination
// =============================================================================

/// A page request. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Default page size used by the admin lists.
    pub const DEFAULT_SIZE: u32 = 12;

    /// Builds a page, clamping `number` to at least 1 and `size` to 1..=100.
    pub fn new(number: u32, size: u32) -> Self {
        Page {
            number: number.max(1),
            size: size.clamp(1, 100),
        }
    }

    pub fn first(size: u32) -> Self {
        Page::new(1, size)
    }

    /// Row offset for `LIMIT ? OFFSET ?`.
    pub fn offset(&self) -> i64 {
        i64::from(self.number.saturating_sub(1)) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// `ceil(total / size)`, never less than 1.
    pub fn total_pages(&self, total: i64) -> u32 {
        let size = i64::from(self.size.max(1));
        let pages = (total.max(0) + size - 1) / size;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::first(Page::DEFAULT_SIZE)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Paged {
            items,
            total,
            page: page.number,
            total_pages: page.total_pages(total),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewSaleItem, PurchaseType};
    use chrono::NaiveDate;

    fn snack_input() -> SnackInput {
        SnackInput {
            name: "Doritos".to_string(),
            purchase_type: PurchaseType::Box,
            units_per_container: 12,
            container_cost_cents: 2400,
            containers_purchased: 3,
            sale_type: SaleType::Unit,
            unit_sale_price_cents: Some(500),
            combo_units: None,
            combo_price_cents: None,
        }
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name(" Ana ").unwrap(), "Ana");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_amount_messages_name_their_field() {
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_debt_amount(1).is_ok());

        let err = validate_payment_amount(0).unwrap_err();
        assert_eq!(err.to_string(), "payment amount must be positive");
        let err = validate_debt_amount(0).unwrap_err();
        assert_eq!(err.to_string(), "amount must be positive");
        assert!(validate_debt_amount(-5).is_err());
    }

    #[test]
    fn test_validate_snack_input() {
        assert!(validate_snack_input(&snack_input()).is_ok());

        let mut input = snack_input();
        input.units_per_container = 0;
        assert!(validate_snack_input(&input).is_err());

        let mut input = snack_input();
        input.container_cost_cents = -1;
        assert!(validate_snack_input(&input).is_err());

        let mut input = snack_input();
        input.sale_type = SaleType::Combo;
        assert!(matches!(
            validate_snack_input(&input),
            Err(ValidationError::Required { .. })
        ));

        input.combo_units = Some(3);
        input.combo_price_cents = Some(0);
        assert!(matches!(
            validate_snack_input(&input),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_new_sale() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut sale = NewSale {
            person_id: "p1".to_string(),
            sale_date: date,
            items: vec![NewSaleItem::units("s1", 2)],
            paid: true,
        };
        assert!(validate_new_sale(&sale).is_ok());

        sale.items.push(NewSaleItem::units("s2", 0));
        assert!(validate_new_sale(&sale).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(3, 12);
        assert_eq!(page.offset(), 24);
        assert_eq!(page.limit(), 12);
        assert_eq!(page.total_pages(0), 1);
        assert_eq!(page.total_pages(12), 1);
        assert_eq!(page.total_pages(13), 2);

        assert_eq!(Page::new(0, 0), Page { number: 1, size: 1 });
    }
}
