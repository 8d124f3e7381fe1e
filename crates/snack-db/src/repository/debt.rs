//! # Debt Repository
//!
//! Debts opened by unpaid sales, and the payments against them.
//!
//! Transitions are computed by [`snack_core::debt`] on the current row and
//! written back with a compare-and-set `UPDATE` guarded by the values that
//! were read. A concurrent payment makes the guard miss; the operation then
//! re-reads and tries again, so two payments never overwrite each other.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use snack_core::debt::{self, DebtState};
use snack_core::{
    ActivityAction, CoreError, Debt, DebtDetail, DebtStatus, Money, NewActivity,
    OverpaymentPolicy,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity::ActivityLogger;

/// Attempts of a compare-and-set write before giving up.
const MAX_CAS_ATTEMPTS: usize = 3;

#[derive(sqlx::FromRow)]
struct DebtDetailRow {
    #[sqlx(flatten)]
    debt: Debt,
    sale_date: NaiveDate,
    sale_total_cents: i64,
    person_id: String,
    person_name: String,
}

impl From<DebtDetailRow> for DebtDetail {
    fn from(row: DebtDetailRow) -> Self {
        DebtDetail {
            remaining_amount_cents: row.debt.remaining().cents(),
            debt: row.debt,
            sale_date: row.sale_date,
            sale_total_cents: row.sale_total_cents,
            person_id: row.person_id,
            person_name: row.person_name,
        }
    }
}

const DEBT_COLUMNS: &str =
    "d.id, d.sale_id, d.amount_cents, d.amount_paid_cents, d.status, d.created_at, d.updated_at";

const DETAIL_FROM: &str = r#"
    FROM debts d
    JOIN sales s ON s.id = d.sale_id
    JOIN people p ON p.id = s.person_id
"#;

/// Inserts a pending debt for `sale_id`.
///
/// Runs on whatever connection the caller holds, so the sale workflow can
/// open the debt inside its own transaction.
pub(crate) async fn insert_debt(
    conn: &mut SqliteConnection,
    sale_id: &str,
    amount: Money,
    now: DateTime<Utc>,
) -> DbResult<Debt> {
    let debt = Debt {
        id: Uuid::new_v4().to_string(),
        sale_id: sale_id.to_string(),
        amount_cents: amount.cents(),
        amount_paid_cents: 0,
        status: DebtStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO debts (id, sale_id, amount_cents, amount_paid_cents, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&debt.id)
    .bind(&debt.sale_id)
    .bind(debt.amount_cents)
    .bind(debt.amount_paid_cents)
    .bind(debt.status)
    .bind(debt.created_at)
    .bind(debt.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        DbError::from(e)
            .on_unique("debts.sale_id", || CoreError::DebtAlreadyExists(sale_id.to_string()))
            .on_foreign_key(|| CoreError::SaleNotFound(sale_id.to_string()))
    })?;

    Ok(debt)
}

/// Repository for debt database operations.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
    activity: ActivityLogger,
    policy: OverpaymentPolicy,
}

impl DebtRepository {
    pub fn new(pool: SqlitePool, activity: ActivityLogger, policy: OverpaymentPolicy) -> Self {
        DebtRepository {
            pool,
            activity,
            policy,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every debt with sale and person context, newest first.
    pub async fn list(&self) -> DbResult<Vec<DebtDetail>> {
        let rows: Vec<DebtDetailRow> = sqlx::query_as(&format!(
            r#"
            SELECT {DEBT_COLUMNS}, s.sale_date, s.total_cents AS sale_total_cents,
                   p.id AS person_id, p.name AS person_name
            {DETAIL_FROM}
            ORDER BY d.created_at DESC, d.rowid DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DebtDetail::from).collect())
    }

    /// Debts of one person, newest first.
    pub async fn list_for_person(&self, person_id: &str) -> DbResult<Vec<DebtDetail>> {
        let rows: Vec<DebtDetailRow> = sqlx::query_as(&format!(
            r#"
            SELECT {DEBT_COLUMNS}, s.sale_date, s.total_cents AS sale_total_cents,
                   p.id AS person_id, p.name AS person_name
            {DETAIL_FROM}
            WHERE s.person_id = ?1
            ORDER BY d.created_at DESC, d.rowid DESC
            "#
        ))
        .bind(person_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DebtDetail::from).collect())
    }

    /// Every pending debt, used by the report.
    pub async fn list_pending(&self) -> DbResult<Vec<Debt>> {
        let debts = sqlx::query_as::<_, Debt>(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts d WHERE d.status = 'pending'"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(debts)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Debt>> {
        let debt = sqlx::query_as::<_, Debt>(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts d WHERE d.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(debt)
    }

    /// Gets a debt or fails with `DebtNotFound`.
    pub async fn require(&self, id: &str) -> DbResult<Debt> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::DebtNotFound(id.to_string()).into())
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<DebtDetail> {
        let row: Option<DebtDetailRow> = sqlx::query_as(&format!(
            r#"
            SELECT {DEBT_COLUMNS}, s.sale_date, s.total_cents AS sale_total_cents,
                   p.id AS person_id, p.name AS person_name
            {DETAIL_FROM}
            WHERE d.id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DebtDetail::from)
            .ok_or_else(|| CoreError::DebtNotFound(id.to_string()).into())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens a debt for an existing sale.
    ///
    /// ## Errors
    /// - `Validation` when `amount` is not positive
    /// - `SaleNotFound`
    /// - `DebtAlreadyExists` when the sale already has one
    pub async fn create(&self, sale_id: &str, amount: Money) -> DbResult<Debt> {
        snack_core::validation::validate_debt_amount(amount.cents())?;

        let mut conn = self.pool.acquire().await?;
        let debt = insert_debt(&mut conn, sale_id, amount, Utc::now()).await?;
        drop(conn);

        info!(id = %debt.id, sale_id = %sale_id, "Debt created");
        Ok(debt)
    }

    /// Writes `next` if the row still holds what `current` says.
    async fn compare_and_set(&self, current: &Debt, next: DebtState) -> DbResult<Option<Debt>> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE debts SET amount_paid_cents = ?2, status = ?3, updated_at = ?4
            WHERE id = ?1 AND amount_paid_cents = ?5 AND status = ?6
            "#,
        )
        .bind(&current.id)
        .bind(next.amount_paid.cents())
        .bind(next.status)
        .bind(now)
        .bind(current.amount_paid_cents)
        .bind(current.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Debt {
            amount_paid_cents: next.amount_paid.cents(),
            status: next.status,
            updated_at: now,
            ..current.clone()
        }))
    }

    /// Runs `transition` against the latest row until the write lands.
    async fn transition(
        &self,
        id: &str,
        transition: impl Fn(&Debt) -> Result<DebtState, CoreError>,
    ) -> DbResult<Debt> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.require(id).await?;
            let next = transition(&current)?;
            if let Some(updated) = self.compare_and_set(&current, next).await? {
                return Ok(updated);
            }
            warn!(id = %id, attempt, "Debt changed concurrently, retrying");
        }
        Err(DbError::QueryFailed(format!(
            "debt {id} kept changing during update"
        )))
    }

    /// Records a payment.
    ///
    /// ## Errors
    /// - `Validation` for a non-positive amount
    /// - `DebtNotFound`, `DebtAlreadyPaid`
    /// - `Overpayment` above the remaining balance, unless the repository
    ///   was built with [`OverpaymentPolicy::Allow`]
    pub async fn add_payment(&self, id: &str, payment: Money) -> DbResult<Debt> {
        let policy = self.policy;
        let debt = self
            .transition(id, |current| debt::apply_payment(current, payment, policy))
            .await?;

        info!(id = %id, paid_cents = debt.amount_paid_cents, status = debt.status.as_str(), "Debt payment recorded");
        self.activity
            .log(
                NewActivity::new(
                    ActivityAction::DebtPaymentAdded,
                    id,
                    format!("Payment of {payment} recorded"),
                )
                .with_details(json!({
                    "payment_cents": payment.cents(),
                    "amount_paid_cents": debt.amount_paid_cents,
                    "remaining_cents": debt.remaining().cents(),
                    "status": debt.status.as_str(),
                })),
            )
            .await;

        Ok(debt)
    }

    /// Forces a debt to paid; `amount_paid` keeps its value.
    pub async fn mark_as_paid(&self, id: &str) -> DbResult<Debt> {
        let debt = self.transition(id, debt::mark_as_paid).await?;

        info!(id = %id, "Debt marked as paid");
        self.activity
            .log(NewActivity::new(
                ActivityAction::DebtMarkedPaid,
                id,
                "Debt marked as paid",
            ))
            .await;

        Ok(debt)
    }

    /// Settles every pending debt of a person in one transaction and
    /// returns how many were settled.
    ///
    /// ## Errors
    /// - `PersonNotFound`
    /// - `NoPendingDebts` when nothing is pending
    pub async fn mark_all_paid_for_person(&self, person_id: &str) -> DbResult<u64> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let person: Option<String> = sqlx::query_scalar("SELECT name FROM people WHERE id = ?1")
            .bind(person_id)
            .fetch_optional(&mut *tx)
            .await?;
        let person_name =
            person.ok_or_else(|| CoreError::PersonNotFound(person_id.to_string()))?;

        let pending = sqlx::query_as::<_, Debt>(&format!(
            r#"
            SELECT {DEBT_COLUMNS}
            FROM debts d
            JOIN sales s ON s.id = d.sale_id
            WHERE s.person_id = ?1 AND d.status = 'pending'
            "#
        ))
        .bind(person_id)
        .fetch_all(&mut *tx)
        .await?;

        if pending.is_empty() {
            return Err(CoreError::NoPendingDebts(person_id.to_string()).into());
        }

        let mut settled = Money::zero();
        for current in &pending {
            let next = debt::settle(current);
            settled += current.remaining();
            sqlx::query(
                r#"
                UPDATE debts SET amount_paid_cents = ?2, status = ?3, updated_at = ?4
                WHERE id = ?1 AND status = 'pending'
                "#,
            )
            .bind(&current.id)
            .bind(next.amount_paid.cents())
            .bind(next.status)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let count = pending.len() as u64;
        info!(person_id = %person_id, count, "Debts settled for person");
        self.activity
            .log(
                NewActivity::new(
                    ActivityAction::DebtsSettledForPerson,
                    person_id,
                    format!("All debts of {person_name} settled"),
                )
                .with_details(json!({
                    "count": count,
                    "settled_cents": settled.cents(),
                })),
            )
            .await;

        Ok(count)
    }

    /// Deletes a debt. The sale stays.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let debt = self.require(id).await?;

        sqlx::query("DELETE FROM debts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(id = %id, "Debt deleted");
        self.activity
            .log(
                NewActivity::new(ActivityAction::DebtDeleted, id, "Debt deleted")
                    .with_details(json!({
                        "sale_id": debt.sale_id,
                        "amount_cents": debt.amount_cents,
                        "amount_paid_cents": debt.amount_paid_cents,
                    })),
            )
            .await;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
