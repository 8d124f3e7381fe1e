//! # Commands Module
//!
//! Every operation the admin UI can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (guards, exports)
//! ├── session.rs   ◄─── Sign in / sign out
//! ├── snack.rs     ◄─── Snack CRUD, search, public catalog
//! ├── person.rs    ◄─── People, balances, guarded delete
//! ├── cart.rs      ◄─── Cart manipulation
//! ├── sale.rs      ◄─── Sale workflow, checkout, history
//! ├── debt.rs      ◄─── Payments and settlement
//! ├── report.rs    ◄─── Portfolio report
//! └── activity.rs  ◄─── Activity log
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  UI: invoke('add_debt_payment', { id, amountCents: 800 })              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  add_debt_payment(db: &DbState, auth: &dyn AuthProvider, ...)          │
//! │         │                                                               │
//! │         ├── require_admin(auth)?        ◄── UNAUTHORIZED / FORBIDDEN   │
//! │         │                                                               │
//! │         ├── db.inner().debts().add_payment(..).await?                  │
//! │         │         (DbError ──► ApiError via From)                      │
//! │         ▼                                                               │
//! │  Ok(Debt) ──► JSON                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Access Policy
//! | Command kind          | Session needed | Role needed |
//! |-----------------------|----------------|-------------|
//! | `public_catalog`      | no             | -           |
//! | reads (list/get/...)  | yes            | any         |
//! | mutations             | yes            | admin       |
//!
//! The repositories never check who is calling; this module is the only
//! authorization boundary.

pub mod activity;
pub mod cart;
pub mod debt;
pub mod person;
pub mod report;
pub mod sale;
pub mod session;
pub mod snack;

use snack_core::{AuthProvider, User};
use tracing::warn;

use crate::error::{ApiError, ApiResult};

/// Requires a signed-in user.
///
/// ## Errors
/// `UNAUTHORIZED` when nobody is signed in.
pub fn require_auth(auth: &dyn AuthProvider) -> ApiResult<User> {
    auth.current_user().ok_or_else(ApiError::unauthorized)
}

/// Requires a signed-in admin.
///
/// ## Errors
/// - `UNAUTHORIZED` when nobody is signed in
/// - `FORBIDDEN` for a viewer
pub fn require_admin(auth: &dyn AuthProvider) -> ApiResult<User> {
    let user = require_auth(auth)?;
    if !user.is_admin() {
        warn!(username = %user.username, "Mutation refused for non-admin");
        return Err(ApiError::forbidden());
    }
    Ok(user)
}

#[cfg(test)]
pub(crate) mod test_support {
    use snack_core::{PurchaseType, Role, SaleType, SnackInput, StaticAuth, User};
    use snack_db::{Database, DbConfig};

    use crate::state::DbState;

    pub async fn db() -> DbState {
        DbState::new(Database::new(DbConfig::in_memory()).await.unwrap())
    }

    pub fn admin() -> StaticAuth {
        StaticAuth::admin("ana")
    }

    pub fn viewer() -> StaticAuth {
        StaticAuth(Some(User {
            id: "v1".into(),
            username: "juan".into(),
            role: Role::Viewer,
        }))
    }

    pub fn anonymous() -> StaticAuth {
        StaticAuth::anonymous()
    }

    /// 36 units at 2.00 cost, sold at 5.00.
    pub fn doritos() -> SnackInput {
        SnackInput {
            name: "Doritos".into(),
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

    /// 24 units at 0.50 cost, 3 for 2.00.
    pub fn gummies() -> SnackInput {
        SnackInput {
            name: "Gummies".into(),
            purchase_type: PurchaseType::Bag,
            units_per_container: 24,
            container_cost_cents: 1200,
            containers_purchased: 1,
            sale_type: SaleType::Combo,
            unit_sale_price_cents: None,
            combo_units: Some(3),
            combo_price_cents: Some(200),
        }
    }
}
