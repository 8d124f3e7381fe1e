//! # Report Commands
//!
//! The dashboard figures.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Investment    Σ unit_cost × stock           (what sits on the shelf)  │
//! │  Sales         Σ sale totals, paid or not                              │
//! │  Profit        Sales − Investment                                      │
//! │  Debts         Σ amount of pending debts                               │
//! │  Outstanding   Σ remaining of pending debts                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use snack_core::{AuthProvider, Reports};
use tracing::debug;

use crate::commands::require_auth;
use crate::error::ApiResult;
use crate::state::DbState;

pub async fn get_reports(db: &DbState, auth: &dyn AuthProvider) -> ApiResult<Reports> {
    require_auth(auth)?;
    debug!("get_reports command");
    Ok(db.inner().reports().get_reports().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_reports() {
        let db = db().await;
        let err = get_reports(&db, &anonymous()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        db.inner().snacks().create(doritos()).await.unwrap();
        let reports = get_reports(&db, &viewer()).await.unwrap();
        assert_eq!(reports.total_investment_cents, 7200);
        assert_eq!(reports.total_profit_cents, -7200);
        assert_eq!(reports.total_sales_cents, 0);
    }
}
