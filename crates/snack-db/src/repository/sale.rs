//! # Sale Repository
//!
//! The sale workflow and the sale history.
//!
//! ## Sale Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  create_sale (one transaction)                          │
//! │                                                                         │
//! │  1. VALIDATE                                                            │
//! │     └── non-empty cart, quantities in range, person exists              │
//! │                                                                         │
//! │  2. FOR EACH LINE                                                       │
//! │     └── load snack → SnackNotFound                                      │
//! │     └── quantity × combo_units when sold by combo                       │
//! │     └── UPDATE snacks SET stock = stock - n WHERE stock >= n            │
//! │         (0 rows → InsufficientStock, whole sale rolls back)             │
//! │     └── subtotal = unit_price × n, rounded to cents                     │
//! │                                                                         │
//! │  3. WRITE                                                               │
//! │     └── sale header with the summed total                               │
//! │     └── sale items (name and unit price snapshotted)                    │
//! │     └── debt for the full total when the sale is unpaid                 │
//! │                                                                         │
//! │  4. COMMIT, then log `sale_created`                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting a sale removes its items and debt but does not return stock.

use chrono::{DateTime, Utc};
use serde_json::json;
use snack_core::stock::{check_available, insufficient, requested_units};
use snack_core::validation::validate_new_sale;
use snack_core::{
    ActivityAction, CoreError, Money, NewActivity, NewSale, Page, Paged, Sale, SaleDetail,
    SaleHeaderPatch, SaleItem, Snack, ValidationError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity::ActivityLogger;
use crate::repository::debt::insert_debt;
use crate::repository::parse_decimal;
use crate::repository::snack::{SnackRow, SNACK_COLUMNS};

#[derive(sqlx::FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    snack_id: String,
    snack_name: String,
    quantity: i64,
    unit_price: String,
    subtotal_cents: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<SaleItemRow> for SaleItem {
    type Error = DbError;

    fn try_from(row: SaleItemRow) -> DbResult<Self> {
        Ok(SaleItem {
            unit_price: parse_decimal("sale_items.unit_price", &row.unit_price)?,
            id: row.id,
            sale_id: row.sale_id,
            snack_id: row.snack_id,
            snack_name: row.snack_name,
            quantity: row.quantity,
            subtotal_cents: row.subtotal_cents,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SaleHeaderRow {
    #[sqlx(flatten)]
    sale: Sale,
    person_name: String,
}

const SALE_COLUMNS: &str = "s.id, s.person_id, s.sale_date, s.total_cents, s.paid, s.created_at";

async fn snack_for_update(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Snack>> {
    let row: Option<SnackRow> =
        sqlx::query_as(&format!("SELECT {SNACK_COLUMNS} FROM snacks WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    row.map(Snack::try_from).transpose()
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    activity: ActivityLogger,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool, activity: ActivityLogger) -> Self {
        SaleRepository { pool, activity }
    }

    // =========================================================================
    // Workflow
    // =========================================================================

    /// Records a sale: decrements stock, writes header and items, and opens
    /// a debt when unpaid. All or nothing.
    ///
    /// ## Errors
    /// - `EmptyCart` for a request without items
    /// - `Validation` for out-of-range quantities
    /// - `PersonNotFound`, `SnackNotFound`
    /// - `ComboNotAvailable` for combos of a unit-sold snack
    /// - `InsufficientStock` naming the snack and both quantities
    /// - `Validation` (`OutOfRange`) when a unit count or an amount does not
    ///   fit in an `i64`
    pub async fn create_sale(&self, new_sale: NewSale) -> DbResult<Sale> {
        if new_sale.items.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        validate_new_sale(&new_sale)?;

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();

        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        let person: Option<String> = sqlx::query_scalar("SELECT id FROM people WHERE id = ?1")
            .bind(&new_sale.person_id)
            .fetch_optional(&mut *tx)
            .await?;
        if person.is_none() {
            return Err(CoreError::PersonNotFound(new_sale.person_id.clone()).into());
        }

        let mut items = Vec::with_capacity(new_sale.items.len());
        let mut total = Money::zero();

        for line in &new_sale.items {
            let snack = snack_for_update(&mut tx, &line.snack_id)
                .await?
                .ok_or_else(|| CoreError::SnackNotFound(line.snack_id.clone()))?;

            let units = requested_units(&snack, line.quantity, line.mode)?;
            check_available(&snack, units)?;

            let result = sqlx::query(
                r#"
                UPDATE snacks SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&snack.id)
            .bind(units)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Another writer got there between the read and the update.
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM snacks WHERE id = ?1")
                        .bind(&snack.id)
                        .fetch_optional(&mut *tx)
                        .await?;
                return Err(match available {
                    Some(stock) => insufficient(&Snack { stock, ..snack }, units),
                    None => CoreError::SnackNotFound(snack.id),
                }
                .into());
            }

            let subtotal = Money::checked_line_subtotal(snack.effective_unit_sale_price, units)
                .ok_or_else(|| amount_out_of_range("subtotal"))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| amount_out_of_range("total"))?;

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                snack_id: snack.id,
                snack_name: snack.name,
                quantity: units,
                unit_price: snack.effective_unit_sale_price,
                subtotal_cents: subtotal.cents(),
                created_at: now,
            });
        }

        let sale = Sale {
            id: sale_id,
            person_id: new_sale.person_id,
            sale_date: new_sale.sale_date,
            total_cents: total.cents(),
            paid: new_sale.paid,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (id, person_id, sale_date, total_cents, paid, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.person_id)
        .bind(sale.sale_date)
        .bind(sale.total_cents)
        .bind(sale.paid)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, snack_id, snack_name, quantity, unit_price, subtotal_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.snack_id)
            .bind(&item.snack_name)
            .bind(item.quantity)
            .bind(item.unit_price.to_string())
            .bind(item.subtotal_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        if !sale.paid {
            insert_debt(&mut tx, &sale.id, total, now).await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            total_cents = sale.total_cents,
            items = items.len(),
            paid = sale.paid,
            "Sale recorded"
        );
        self.activity
            .log(
                NewActivity::new(
                    ActivityAction::SaleCreated,
                    &sale.id,
                    format!("Sale recorded: {}", sale.total()),
                )
                .with_details(json!({
                    "person_id": sale.person_id,
                    "total_cents": sale.total_cents,
                    "items": items.len(),
                    "paid": sale.paid,
                })),
            )
            .await;

        Ok(sale)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    async fn with_items(&self, headers: Vec<SaleHeaderRow>) -> DbResult<Vec<SaleDetail>> {
        let mut details = Vec::with_capacity(headers.len());
        for header in headers {
            let items = self.items(&header.sale.id).await?;
            details.push(SaleDetail {
                sale: header.sale,
                person_name: header.person_name,
                items,
            });
        }
        Ok(details)
    }

    /// Every sale with its buyer and lines, newest first.
    pub async fn list(&self) -> DbResult<Vec<SaleDetail>> {
        let headers: Vec<SaleHeaderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SALE_COLUMNS}, p.name AS person_name
            FROM sales s
            JOIN people p ON p.id = s.person_id
            ORDER BY s.sale_date DESC, s.created_at DESC, s.rowid DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_items(headers).await
    }

    /// One page of [`list`](Self::list).
    pub async fn list_page(&self, page: Page) -> DbResult<Paged<SaleDetail>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        let headers: Vec<SaleHeaderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SALE_COLUMNS}, p.name AS person_name
            FROM sales s
            JOIN people p ON p.id = s.person_id
            ORDER BY s.sale_date DESC, s.created_at DESC, s.rowid DESC
            LIMIT ?1 OFFSET ?2
            "#
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Paged::new(self.with_items(headers).await?, total, page))
    }

    /// Sales of one person, newest first.
    pub async fn list_for_person(&self, person_id: &str) -> DbResult<Vec<SaleDetail>> {
        let headers: Vec<SaleHeaderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SALE_COLUMNS}, p.name AS person_name
            FROM sales s
            JOIN people p ON p.id = s.person_id
            WHERE s.person_id = ?1
            ORDER BY s.sale_date DESC, s.created_at DESC, s.rowid DESC
            "#
        ))
        .bind(person_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_items(headers).await
    }

    /// Gets a sale header by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales s WHERE s.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale header or fails with `SaleNotFound`.
    pub async fn require(&self, id: &str) -> DbResult<Sale> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()).into())
    }

    /// A sale with its buyer and lines.
    pub async fn get_detail(&self, id: &str) -> DbResult<SaleDetail> {
        let header: Option<SaleHeaderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SALE_COLUMNS}, p.name AS person_name
            FROM sales s
            JOIN people p ON p.id = s.person_id
            WHERE s.id = ?1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let header = header.ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = self.items(id).await?;
        Ok(SaleDetail {
            sale: header.sale,
            person_name: header.person_name,
            items,
        })
    }

    /// Lines of a sale in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let rows: Vec<SaleItemRow> = sqlx::query_as(
            r#"
            SELECT id, sale_id, snack_id, snack_name, quantity, unit_price, subtotal_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(sale_id = %sale_id, count = rows.len(), "Loaded sale items");
        rows.into_iter().map(SaleItem::try_from).collect()
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Edits buyer, date or paid flag. Lines, totals and debts are untouched.
    pub async fn update_header(&self, id: &str, patch: SaleHeaderPatch) -> DbResult<Sale> {
        let current = self.require(id).await?;

        let updated = Sale {
            person_id: patch.person_id.unwrap_or_else(|| current.person_id.clone()),
            sale_date: patch.sale_date.unwrap_or(current.sale_date),
            paid: patch.paid.unwrap_or(current.paid),
            ..current
        };

        let person_id = updated.person_id.clone();
        sqlx::query("UPDATE sales SET person_id = ?2, sale_date = ?3, paid = ?4 WHERE id = ?1")
            .bind(&updated.id)
            .bind(&updated.person_id)
            .bind(updated.sale_date)
            .bind(updated.paid)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from(e).on_foreign_key(|| CoreError::PersonNotFound(person_id)))?;

        self.activity
            .log(
                NewActivity::new(ActivityAction::SaleUpdated, &updated.id, "Sale updated")
                    .with_details(json!({
                        "person_id": updated.person_id,
                        "sale_date": updated.sale_date,
                        "paid": updated.paid,
                    })),
            )
            .await;

        Ok(updated)
    }

    /// Deletes a sale with its items and debt. Stock is not restored.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let sale = self.require(id).await?;

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(id = %id, "Sale deleted");
        self.activity
            .log(
                NewActivity::new(
                    ActivityAction::SaleDeleted,
                    id,
                    format!("Sale deleted: {}", sale.total()),
                )
                .with_details(json!({ "total_cents": sale.total_cents })),
            )
            .await;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

fn amount_out_of_range(field: &str) -> DbError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}
