//! # Debt Commands
//!
//! Payments against unpaid sales.
//!
//! ## Debt Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   unpaid sale ──► ┌─────────┐  add_debt_payment (partial)              │
//! │                   │ PENDING │◄─────────────┐                            │
//! │                   └────┬────┘──────────────┘                            │
//! │                        │ payment covers remaining / mark_debt_paid     │
//! │                        │ / settle_person_debts                         │
//! │                        ▼                                                │
//! │                   ┌─────────┐                                           │
//! │                   │  PAID   │  (terminal)                               │
//! │                   └─────────┘                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use snack_core::{AuthProvider, Debt, DebtDetail, Money};
use tracing::debug;

use crate::commands::{require_admin, require_auth};
use crate::error::ApiResult;
use crate::state::DbState;

/// Payment payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount_cents: i64,
}

/// Manual debt for a sale recorded without one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebtRequest {
    pub sale_id: String,
    pub amount_cents: i64,
}

/// Result of settling a person's debts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleResponse {
    pub settled: u64,
}

/// Every debt, newest first, with sale and person.
pub async fn list_debts(db: &DbState, auth: &dyn AuthProvider) -> ApiResult<Vec<DebtDetail>> {
    require_auth(auth)?;
    debug!("list_debts command");
    Ok(db.inner().debts().list().await?)
}

pub async fn list_person_debts(
    db: &DbState,
    auth: &dyn AuthProvider,
    person_id: String,
) -> ApiResult<Vec<DebtDetail>> {
    require_auth(auth)?;
    debug!(person_id = %person_id, "list_person_debts command");
    Ok(db.inner().debts().list_for_person(&person_id).await?)
}

pub async fn get_debt(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<DebtDetail> {
    require_auth(auth)?;
    Ok(db.inner().debts().get_detail(&id).await?)
}

/// Opens a debt by hand.
///
/// ## Errors
/// `CONFLICT` when the sale already has one.
pub async fn create_debt(
    db: &DbState,
    auth: &dyn AuthProvider,
    request: NewDebtRequest,
) -> ApiResult<Debt> {
    require_admin(auth)?;
    debug!(sale_id = %request.sale_id, "create_debt command");
    Ok(db
        .inner()
        .debts()
        .create(&request.sale_id, Money::from_cents(request.amount_cents))
        .await?)
}

/// Records a payment. Reaching the full amount marks the debt paid.
///
/// ## Errors
/// - `VALIDATION_ERROR` for a non-positive amount, or an overpayment under
///   the `reject` policy
/// - `CONFLICT` when the debt is already paid
pub async fn add_debt_payment(
    db: &DbState,
    auth: &dyn AuthProvider,
    id: String,
    request: PaymentRequest,
) -> ApiResult<Debt> {
    require_admin(auth)?;
    debug!(id = %id, amount_cents = request.amount_cents, "add_debt_payment command");
    Ok(db
        .inner()
        .debts()
        .add_payment(&id, Money::from_cents(request.amount_cents))
        .await?)
}

pub async fn mark_debt_paid(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<Debt> {
    require_admin(auth)?;
    debug!(id = %id, "mark_debt_paid command");
    Ok(db.inner().debts().mark_as_paid(&id).await?)
}

/// Pays off every pending debt of one person.
///
/// ## Errors
/// `CONFLICT` when nothing is pending.
pub async fn settle_person_debts(
    db: &DbState,
    auth: &dyn AuthProvider,
    person_id: String,
) -> ApiResult<SettleResponse> {
    require_admin(auth)?;
    debug!(person_id = %person_id, "settle_person_debts command");
    let settled = db.inner().debts().mark_all_paid_for_person(&person_id).await?;
    Ok(SettleResponse { settled })
}

pub async fn delete_debt(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<()> {
    require_admin(auth)?;
    debug!(id = %id, "delete_debt command");
    Ok(db.inner().debts().delete(&id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;
    use snack_core::{DebtStatus, NewSale, NewSaleItem};

    /// Unpaid sale of 4 Doritos: a 20.00 debt.
    async fn open_debt(db: &DbState) -> (String, String) {
        let person = db.inner().people().create("Ana").await.unwrap();
        let snack = db.inner().snacks().create(doritos()).await.unwrap();
        db.inner()
            .sales()
            .create_sale(NewSale {
                person_id: person.id.clone(),
                sale_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                items: vec![NewSaleItem::units(&snack.id, 4)],
                paid: false,
            })
            .await
            .unwrap();
        let debt = db.inner().debts().list().await.unwrap().remove(0).debt;
        (debt.id, person.id)
    }

    #[tokio::test]
    async fn test_payments() {
        let db = db().await;
        let (id, _) = open_debt(&db).await;

        let err = add_debt_payment(&db, &viewer(), id.clone(), PaymentRequest { amount_cents: 800 })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let debt = add_debt_payment(&db, &admin(), id.clone(), PaymentRequest { amount_cents: 800 })
            .await
            .unwrap();
        assert_eq!(debt.status, DebtStatus::Pending);

        let err = add_debt_payment(&db, &admin(), id.clone(), PaymentRequest { amount_cents: 5000 })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let debt = add_debt_payment(&db, &admin(), id.clone(), PaymentRequest { amount_cents: 1200 })
            .await
            .unwrap();
        assert_eq!(debt.status, DebtStatus::Paid);

        let err = mark_debt_paid(&db, &admin(), id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_settle_person() {
        let db = db().await;
        let (_, person_id) = open_debt(&db).await;

        let response = settle_person_debts(&db, &admin(), person_id.clone()).await.unwrap();
        assert_eq!(response, SettleResponse { settled: 1 });

        let err = settle_person_debts(&db, &admin(), person_id.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let debts = list_person_debts(&db, &viewer(), person_id).await.unwrap();
        assert_eq!(debts[0].remaining_amount_cents, 0);
    }
}
