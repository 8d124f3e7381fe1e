//! # snack-core: Pure Business Logic for the Snack Manager
//!
//! Inventory, sales and debts for a small snack stand, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Snack Manager Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Admin UI                                     │   │
//! │  │    Snacks ──► Cart ──► Sales ──► Debts ──► Reports / Activity   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    snack-admin (commands, session)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ snack-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐   │   │
//! │  │   │ pricing │ │  stock  │ │  debt   │ │ report  │ │  cart   │   │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    snack-db (SQLite, sale transaction)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Snack, Person, Sale, Debt, ActivityLog)
//! - [`money`] - Integer-cent money and the bridge to `Decimal`
//! - [`pricing`] - Derived per-unit pricing
//! - [`stock`] - Unit normalization and availability checks
//! - [`debt`] - Debt state machine
//! - [`report`] - Portfolio figures
//! - [`cart`] - Operator cart
//! - [`validation`] - Input rules and pagination
//! - [`auth`] - Auth collaborator trait
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use snack_core::pricing::PricingCalculator;
//! use snack_core::{PurchaseType, SaleType, SnackInput};
//!
//! let input = SnackInput {
//!     name: "Doritos".into(),
//!     purchase_type: PurchaseType::Box,
//!     units_per_container: 12,
//!     container_cost_cents: 2400,
//!     containers_purchased: 3,
//!     sale_type: SaleType::Unit,
//!     unit_sale_price_cents: Some(500),
//!     combo_units: None,
//!     combo_price_cents: None,
//! };
//!
//! let derived = PricingCalculator::validated(&input).unwrap();
//! assert_eq!(derived.stock, 36);
//! assert_eq!(derived.profit_margin_per_unit.to_string(), "3");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod cart;
pub mod debt;
pub mod error;
pub mod money;
pub mod pricing;
pub mod report;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use auth::{AuthProvider, Role, StaticAuth, User};
pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{DerivedPricing, PricingCalculator};
pub use types::*;
pub use validation::{Page, Paged};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) before they reach the stock check.
pub const MAX_ITEM_QUANTITY: i64 = 999;
