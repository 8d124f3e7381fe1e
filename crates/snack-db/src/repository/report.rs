//! # Report Repository
//!
//! Reads the three inputs of the portfolio report and folds them with
//! [`ReportBuilder`]. The reads are separate statements, so figures may
//! straddle a concurrent write.

use snack_core::report::ReportBuilder;
use snack_core::{Debt, Money, Reports};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::parse_decimal;

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Investment, sales, profit, pending debt and outstanding balance.
    pub async fn get_reports(&self) -> DbResult<Reports> {
        let stock: Vec<(String, i64)> = sqlx::query_as("SELECT unit_cost, stock FROM snacks")
            .fetch_all(&self.pool)
            .await?;

        let sales_total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_cents), 0) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        let pending = sqlx::query_as::<_, Debt>(
            r#"
            SELECT id, sale_id, amount_cents, amount_paid_cents, status, created_at, updated_at
            FROM debts
            WHERE status = 'pending'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut builder = ReportBuilder::new();
        for (unit_cost, units) in &stock {
            builder.add_stock(parse_decimal("snacks.unit_cost", unit_cost)?, *units);
        }
        builder.add_sale(Money::from_cents(sales_total));
        for debt in &pending {
            builder.add_debt(debt);
        }

        let reports = builder.build();
        debug!(?reports, "Reports computed");
        Ok(reports)
    }
}
