//! # Domain Types
//!
//! Core domain types used throughout the snack manager.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Snack       │   │      Sale       │   │      Debt       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  purchase data  │   │  person_id (FK) │   │  sale_id (1:1)  │       │
//! │  │  sale data      │   │  sale_date      │   │  amount         │       │
//! │  │  derived prices │   │  total, paid    │   │  amount_paid    │       │
//! │  │  stock          │   │  items[]        │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Person      │   │    SaleItem     │   │  ActivityLog    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  quantity       │   │  entity_type    │       │
//! │  │  total_debt*    │   │  unit_price     │   │  action         │       │
//! │  │  (* derived)    │   │  (snapshot)     │   │  details (JSON) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored amounts are `*_cents: i64`; per-unit values are `Decimal`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Snack Enums
// =============================================================================

/// How a snack is bought from the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType {
    Box,
    Bag,
}

/// How a snack is sold to people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleType {
    /// One unit at `unit_sale_price`.
    #[default]
    Unit,
    /// `combo_units` units at `combo_price`.
    Combo,
}

// =============================================================================
// Snack
// =============================================================================

/// A sellable product with its purchase economics.
///
/// `unit_cost`, `effective_unit_sale_price`, `profit_margin_per_unit` and
/// the initial `stock` are derived by [`crate::pricing::PricingCalculator`]
/// and never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Snack {
    pub id: String,
    pub name: String,
    pub purchase_type: PurchaseType,
    pub units_per_container: i64,
    pub container_cost_cents: i64,
    pub containers_purchased: i64,
    pub sale_type: SaleType,
    pub unit_sale_price_cents: Option<i64>,
    pub combo_units: Option<i64>,
    pub combo_price_cents: Option<i64>,

    #[ts(as = "String")]
    pub unit_cost: Decimal,
    /// Price of one unit: `unit_sale_price`, or `combo_price / combo_units`.
    #[ts(as = "String")]
    pub effective_unit_sale_price: Decimal,
    #[ts(as = "String")]
    pub profit_margin_per_unit: Decimal,

    /// Units currently on hand.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Snack {
    #[inline]
    pub fn container_cost(&self) -> Money {
        Money::from_cents(self.container_cost_cents)
    }

    /// Converts the attributes the operator edits back into an input.
    pub fn to_input(&self) -> SnackInput {
        SnackInput {
            name: self.name.clone(),
            purchase_type: self.purchase_type,
            units_per_container: self.units_per_container,
            container_cost_cents: self.container_cost_cents,
            containers_purchased: self.containers_purchased,
            sale_type: self.sale_type,
            unit_sale_price_cents: self.unit_sale_price_cents,
            combo_units: self.combo_units,
            combo_price_cents: self.combo_price_cents,
        }
    }

    /// Stock at cost: `unit_cost × stock`.
    pub fn stock_value(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.stock)
    }
}

/// Operator-supplied snack attributes (create, or the result of a merge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SnackInput {
    pub name: String,
    pub purchase_type: PurchaseType,
    pub units_per_container: i64,
    pub container_cost_cents: i64,
    pub containers_purchased: i64,
    #[serde(default)]
    pub sale_type: SaleType,
    #[serde(default)]
    pub unit_sale_price_cents: Option<i64>,
    #[serde(default)]
    pub combo_units: Option<i64>,
    #[serde(default)]
    pub combo_price_cents: Option<i64>,
}

/// Partial snack update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct SnackPatch {
    pub name: Option<String>,
    pub purchase_type: Option<PurchaseType>,
    pub units_per_container: Option<i64>,
    pub container_cost_cents: Option<i64>,
    pub containers_purchased: Option<i64>,
    pub sale_type: Option<SaleType>,
    pub unit_sale_price_cents: Option<i64>,
    pub combo_units: Option<i64>,
    pub combo_price_cents: Option<i64>,
}

impl SnackPatch {
    /// Merges this patch over the current record.
    ///
    /// Derived fields are never computed from the patch alone; the caller
    /// recomputes them from the merged result.
    pub fn merge_onto(&self, current: &Snack) -> SnackInput {
        let base = current.to_input();
        SnackInput {
            name: self.name.clone().unwrap_or(base.name),
            purchase_type: self.purchase_type.unwrap_or(base.purchase_type),
            units_per_container: self.units_per_container.unwrap_or(base.units_per_container),
            container_cost_cents: self.container_cost_cents.unwrap_or(base.container_cost_cents),
            containers_purchased: self.containers_purchased.unwrap_or(base.containers_purchased),
            sale_type: self.sale_type.unwrap_or(base.sale_type),
            unit_sale_price_cents: self.unit_sale_price_cents.or(base.unit_sale_price_cents),
            combo_units: self.combo_units.or(base.combo_units),
            combo_price_cents: self.combo_price_cents.or(base.combo_price_cents),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SnackPatch::default()
    }
}

// =============================================================================
// Person
// =============================================================================

/// A customer or colleague who buys snacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A person plus the sum of what they still owe on pending debts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonWithDebt {
    #[serde(flatten)]
    pub person: Person,
    pub total_debt_cents: i64,
}

/// Answer to "may this person be deleted?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeleteCheck {
    pub can_delete: bool,
    pub reason: Option<String>,
}

impl DeleteCheck {
    pub fn allowed() -> Self {
        DeleteCheck {
            can_delete: true,
            reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        DeleteCheck {
            can_delete: false,
            reason: Some(reason.into()),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub person_id: String,
    /// Calendar date chosen by the operator, independent of `created_at`.
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    /// Sum of line subtotals.
    pub total_cents: i64,
    /// Paid at the time of the sale. Unpaid sales carry a debt.
    pub paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a sale.
/// Uses snapshot pattern to freeze snack data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub snack_id: String,
    /// Snack name at time of sale (frozen).
    pub snack_name: String,
    /// Quantity in units, already normalized from combos.
    pub quantity: i64,
    /// Effective unit price at time of sale (frozen).
    #[ts(as = "String")]
    pub unit_price: Decimal,
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// Whether a requested quantity counts units or combos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum QuantityMode {
    #[default]
    Unit,
    Combo,
}

/// One requested line of a new sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub snack_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub mode: QuantityMode,
}

impl NewSaleItem {
    pub fn units(snack_id: impl Into<String>, quantity: i64) -> Self {
        NewSaleItem {
            snack_id: snack_id.into(),
            quantity,
            mode: QuantityMode::Unit,
        }
    }

    pub fn combos(snack_id: impl Into<String>, quantity: i64) -> Self {
        NewSaleItem {
            snack_id: snack_id.into(),
            quantity,
            mode: QuantityMode::Combo,
        }
    }
}

/// Request to record a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub person_id: String,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub items: Vec<NewSaleItem>,
    pub paid: bool,
}

/// Editable sale header fields. Lines and totals are immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct SaleHeaderPatch {
    pub person_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub sale_date: Option<NaiveDate>,
    pub paid: Option<bool>,
}

/// A sale with its person and lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub person_name: String,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Debt
// =============================================================================

/// Debt status. One way: `Pending → Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DebtStatus {
    #[default]
    Pending,
    Paid,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Pending => "pending",
            DebtStatus::Paid => "paid",
        }
    }
}

/// The balance owed for one unpaid sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Debt {
    pub id: String,
    pub sale_id: String,
    pub amount_cents: i64,
    pub amount_paid_cents: i64,
    pub status: DebtStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Debt {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    /// `max(0, amount − amount_paid)`. Always computed, never read back.
    #[inline]
    pub fn remaining(&self) -> Money {
        self.amount().saturating_remaining(self.amount_paid())
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == DebtStatus::Paid
    }
}

/// A debt with the sale and person it belongs to, as listed in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DebtDetail {
    #[serde(flatten)]
    pub debt: Debt,
    pub remaining_amount_cents: i64,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub sale_total_cents: i64,
    pub person_id: String,
    pub person_name: String,
}

/// What to do with a payment larger than the remaining balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OverpaymentPolicy {
    /// Refuse with `CoreError::Overpayment`.
    #[default]
    Reject,
    /// Accept and record the full amount; the remainder floors at zero.
    Allow,
}

// =============================================================================
// Activity Log
// =============================================================================

/// The kind of entity an activity entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Snack,
    Person,
    Sale,
    Debt,
    System,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Snack => "snack",
            EntityType::Person => "person",
            EntityType::Sale => "sale",
            EntityType::Debt => "debt",
            EntityType::System => "system",
        }
    }
}

/// Action codes written by the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    SnackCreated,
    SnackUpdated,
    SnackDeleted,
    PersonCreated,
    PersonUpdated,
    PersonDeleted,
    SaleCreated,
    SaleUpdated,
    SaleDeleted,
    DebtPaymentAdded,
    DebtMarkedPaid,
    DebtsSettledForPerson,
    DebtDeleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::SnackCreated => "snack_created",
            ActivityAction::SnackUpdated => "snack_updated",
            ActivityAction::SnackDeleted => "snack_deleted",
            ActivityAction::PersonCreated => "person_created",
            ActivityAction::PersonUpdated => "person_updated",
            ActivityAction::PersonDeleted => "person_deleted",
            ActivityAction::SaleCreated => "sale_created",
            ActivityAction::SaleUpdated => "sale_updated",
            ActivityAction::SaleDeleted => "sale_deleted",
            ActivityAction::DebtPaymentAdded => "debt_payment_added",
            ActivityAction::DebtMarkedPaid => "debt_marked_paid",
            ActivityAction::DebtsSettledForPerson => "debts_settled_for_person",
            ActivityAction::DebtDeleted => "debt_deleted",
        }
    }

    /// Entity type the action is filed under.
    pub fn entity_type(&self) -> EntityType {
        match self {
            ActivityAction::SnackCreated
            | ActivityAction::SnackUpdated
            | ActivityAction::SnackDeleted => EntityType::Snack,
            ActivityAction::PersonCreated
            | ActivityAction::PersonUpdated
            | ActivityAction::PersonDeleted
            | ActivityAction::DebtsSettledForPerson => EntityType::Person,
            ActivityAction::SaleCreated
            | ActivityAction::SaleUpdated
            | ActivityAction::SaleDeleted => EntityType::Sale,
            ActivityAction::DebtPaymentAdded
            | ActivityAction::DebtMarkedPaid
            | ActivityAction::DebtDeleted => EntityType::Debt,
        }
    }
}

/// An audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityLog {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    /// Free-form action code, e.g. `sale_created`.
    pub action: String,
    pub description: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub details: Option<serde_json::Value>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An audit entry before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub action: String,
    pub description: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl NewActivity {
    /// Entry for one of the standard actions.
    pub fn new(action: ActivityAction, entity_id: impl Into<String>, description: impl Into<String>) -> Self {
        NewActivity {
            entity_type: action.entity_type(),
            entity_id: Some(entity_id.into()),
            action: action.as_str().to_string(),
            description: Some(description.into()),
            details: None,
        }
    }

    /// System entry with a free-form action code and no entity.
    pub fn system(action: impl Into<String>, description: impl Into<String>) -> Self {
        NewActivity {
            entity_type: EntityType::System,
            entity_id: None,
            action: action.into(),
            description: Some(description.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Portfolio-level figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reports {
    /// Σ unit_cost × stock over current snacks.
    pub total_investment_cents: i64,
    /// Σ sale totals, paid and unpaid.
    pub total_sales_cents: i64,
    /// total_sales − total_investment.
    pub total_profit_cents: i64,
    /// Σ amount of pending debts (ignores partial payments).
    pub total_debts_cents: i64,
    /// Σ remaining amount of pending debts.
    pub total_outstanding_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snack() -> Snack {
        let now = Utc::now();
        Snack {
            id: "s1".into(),
            name: "Doritos".into(),
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
            stock: 36,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_patch_merges_over_current() {
        let current = snack();
        let patch = SnackPatch {
            containers_purchased: Some(5),
            sale_type: Some(SaleType::Combo),
            combo_units: Some(3),
            combo_price_cents: Some(1200),
            ..Default::default()
        };

        let merged = patch.merge_onto(&current);
        assert_eq!(merged.name, "Doritos");
        assert_eq!(merged.units_per_container, 12);
        assert_eq!(merged.containers_purchased, 5);
        assert_eq!(merged.sale_type, SaleType::Combo);
        assert_eq!(merged.unit_sale_price_cents, Some(500));
        assert_eq!(merged.combo_units, Some(3));
        assert!(!patch.is_empty());
        assert!(SnackPatch::default().is_empty());
    }

    #[test]
    fn test_debt_remaining_floors_at_zero() {
        let now = Utc::now();
        let mut debt = Debt {
            id: "d1".into(),
            sale_id: "s1".into(),
            amount_cents: 2000,
            amount_paid_cents: 800,
            status: DebtStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(debt.remaining().cents(), 1200);

        debt.amount_paid_cents = 2500;
        assert_eq!(debt.remaining().cents(), 0);
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(ActivityAction::SaleCreated.as_str(), "sale_created");
        assert_eq!(ActivityAction::DebtsSettledForPerson.entity_type(), EntityType::Person);
        let entry = NewActivity::new(ActivityAction::DebtPaymentAdded, "d1", "Payment");
        assert_eq!(entry.entity_type, EntityType::Debt);
        assert_eq!(entry.action, "debt_payment_added");
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&PurchaseType::Bag).unwrap(), "\"bag\"");
        assert_eq!(serde_json::to_string(&DebtStatus::Pending).unwrap(), "\"pending\"");
        let mode: QuantityMode = serde_json::from_str("\"combo\"").unwrap();
        assert_eq!(mode, QuantityMode::Combo);
    }
}
