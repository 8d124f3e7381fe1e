//! # Snack Repository
//!
//! Database operations for snacks.
//!
//! ## Derived Columns
//! `unit_cost`, `effective_unit_sale_price`, `profit_margin_per_unit` and
//! `stock` are never taken from the caller. Every create and update runs
//! [`PricingCalculator::validated`] and writes what it returns, so a stored
//! snack always satisfies `effective_unit_sale_price > unit_cost`.
//!
//! Updating a snack recomputes `stock` from the purchase fields, which
//! discards any sales recorded against the previous figure. Operators
//! restock by editing `containers_purchased`.

use chrono::{DateTime, Utc};
use serde_json::json;
use snack_core::validation::{validate_search_query, validate_uuid};
use snack_core::{
    ActivityAction, CoreError, NewActivity, Page, Paged, PricingCalculator, PurchaseType,
    SaleType, Snack, SnackInput, SnackPatch,
};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity::ActivityLogger;
use crate::repository::{like_pattern, parse_decimal};

#[derive(sqlx::FromRow)]
pub(crate) struct SnackRow {
    id: String,
    name: String,
    purchase_type: PurchaseType,
    units_per_container: i64,
    container_cost_cents: i64,
    containers_purchased: i64,
    sale_type: SaleType,
    unit_sale_price_cents: Option<i64>,
    combo_units: Option<i64>,
    combo_price_cents: Option<i64>,
    unit_cost: String,
    effective_unit_sale_price: String,
    profit_margin_per_unit: String,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SnackRow> for Snack {
    type Error = DbError;

    fn try_from(row: SnackRow) -> DbResult<Self> {
        Ok(Snack {
            unit_cost: parse_decimal("snacks.unit_cost", &row.unit_cost)?,
            effective_unit_sale_price: parse_decimal(
                "snacks.effective_unit_sale_price",
                &row.effective_unit_sale_price,
            )?,
            profit_margin_per_unit: parse_decimal(
                "snacks.profit_margin_per_unit",
                &row.profit_margin_per_unit,
            )?,
            id: row.id,
            name: row.name,
            purchase_type: row.purchase_type,
            units_per_container: row.units_per_container,
            container_cost_cents: row.container_cost_cents,
            containers_purchased: row.containers_purchased,
            sale_type: row.sale_type,
            unit_sale_price_cents: row.unit_sale_price_cents,
            combo_units: row.combo_units,
            combo_price_cents: row.combo_price_cents,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) const SNACK_COLUMNS: &str = r#"
    id, name, purchase_type, units_per_container, container_cost_cents,
    containers_purchased, sale_type, unit_sale_price_cents, combo_units,
    combo_price_cents, unit_cost, effective_unit_sale_price,
    profit_margin_per_unit, stock, created_at, updated_at
"#;

fn into_snacks(rows: Vec<SnackRow>) -> DbResult<Vec<Snack>> {
    rows.into_iter().map(Snack::try_from).collect()
}

/// Repository for snack database operations.
#[derive(Debug, Clone)]
pub struct SnackRepository {
    pool: SqlitePool,
    activity: ActivityLogger,
}

impl SnackRepository {
    /// Creates a new SnackRepository.
    pub fn new(pool: SqlitePool, activity: ActivityLogger) -> Self {
        SnackRepository { pool, activity }
    }

    /// All snacks, newest first.
    pub async fn list(&self) -> DbResult<Vec<Snack>> {
        let rows: Vec<SnackRow> = sqlx::query_as(&format!(
            "SELECT {SNACK_COLUMNS} FROM snacks ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_snacks(rows)
    }

    /// One page of snacks, newest first.
    pub async fn list_page(&self, page: Page) -> DbResult<Paged<Snack>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snacks")
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<SnackRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SNACK_COLUMNS} FROM snacks
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1 OFFSET ?2
            "#
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Paged::new(into_snacks(rows)?, total, page))
    }

    /// Case-insensitive substring search on the name, newest first.
    /// An empty query returns every snack.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Snack>> {
        let query = validate_search_query(query)?;
        if query.is_empty() {
            return self.list().await;
        }

        let rows: Vec<SnackRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SNACK_COLUMNS} FROM snacks
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY created_at DESC, rowid DESC
            "#
        ))
        .bind(like_pattern(&query))
        .fetch_all(&self.pool)
        .await?;

        debug!(query = %query, count = rows.len(), "Snack search");
        into_snacks(rows)
    }

    /// Snacks with stock on hand, by name. Served without a session.
    pub async fn public_catalog(&self, query: &str) -> DbResult<Vec<Snack>> {
        let query = validate_search_query(query)?;

        let rows: Vec<SnackRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SNACK_COLUMNS} FROM snacks
            WHERE stock > 0 AND name LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE
            "#
        ))
        .bind(like_pattern(&query))
        .fetch_all(&self.pool)
        .await?;

        into_snacks(rows)
    }

    /// Gets a snack by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Snack>> {
        let row: Option<SnackRow> =
            sqlx::query_as(&format!("SELECT {SNACK_COLUMNS} FROM snacks WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Snack::try_from).transpose()
    }

    /// Gets a snack by ID or fails with `SnackNotFound`.
    pub async fn require(&self, id: &str) -> DbResult<Snack> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::SnackNotFound(id.to_string()).into())
    }

    /// Creates a snack, deriving its pricing and stock.
    ///
    /// ## Errors
    /// - `Validation` for malformed input
    /// - `DivisionInvalid` for a zero divisor
    /// - `PriceNotAboveCost` when the sale price does not beat the unit cost
    pub async fn create(&self, input: SnackInput) -> DbResult<Snack> {
        let derived = PricingCalculator::validated(&input)?;
        let now = Utc::now();

        let snack = Snack {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            purchase_type: input.purchase_type,
            units_per_container: input.units_per_container,
            container_cost_cents: input.container_cost_cents,
            containers_purchased: input.containers_purchased,
            sale_type: input.sale_type,
            unit_sale_price_cents: input.unit_sale_price_cents,
            combo_units: input.combo_units,
            combo_price_cents: input.combo_price_cents,
            unit_cost: derived.unit_cost,
            effective_unit_sale_price: derived.effective_unit_sale_price,
            profit_margin_per_unit: derived.profit_margin_per_unit,
            stock: derived.stock,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO snacks (
                id, name, purchase_type, units_per_container, container_cost_cents,
                containers_purchased, sale_type, unit_sale_price_cents, combo_units,
                combo_price_cents, unit_cost, effective_unit_sale_price,
                profit_margin_per_unit, stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&snack.id)
        .bind(&snack.name)
        .bind(snack.purchase_type)
        .bind(snack.units_per_container)
        .bind(snack.container_cost_cents)
        .bind(snack.containers_purchased)
        .bind(snack.sale_type)
        .bind(snack.unit_sale_price_cents)
        .bind(snack.combo_units)
        .bind(snack.combo_price_cents)
        .bind(snack.unit_cost.to_string())
        .bind(snack.effective_unit_sale_price.to_string())
        .bind(snack.profit_margin_per_unit.to_string())
        .bind(snack.stock)
        .bind(snack.created_at)
        .bind(snack.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %snack.id, name = %snack.name, stock = snack.stock, "Snack created");
        self.activity
            .log(
                NewActivity::new(
                    ActivityAction::SnackCreated,
                    &snack.id,
                    format!("Snack created: {}", snack.name),
                )
                .with_details(json!({
                    "stock": snack.stock,
                    "unit_cost": snack.unit_cost.to_string(),
                    "unit_sale_price": snack.effective_unit_sale_price.to_string(),
                })),
            )
            .await;

        Ok(snack)
    }

    /// Applies a partial update and re-derives pricing and stock from the
    /// merged record.
    pub async fn update(&self, id: &str, patch: SnackPatch) -> DbResult<Snack> {
        validate_uuid(id)?;
        let current = self.require(id).await?;
        let input = patch.merge_onto(&current);
        let derived = PricingCalculator::validated(&input)?;

        let snack = Snack {
            id: current.id,
            name: input.name.trim().to_string(),
            purchase_type: input.purchase_type,
            units_per_container: input.units_per_container,
            container_cost_cents: input.container_cost_cents,
            containers_purchased: input.containers_purchased,
            sale_type: input.sale_type,
            unit_sale_price_cents: input.unit_sale_price_cents,
            combo_units: input.combo_units,
            combo_price_cents: input.combo_price_cents,
            unit_cost: derived.unit_cost,
            effective_unit_sale_price: derived.effective_unit_sale_price,
            profit_margin_per_unit: derived.profit_margin_per_unit,
            stock: derived.stock,
            created_at: current.created_at,
            updated_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            UPDATE snacks SET
                name = ?2,
                purchase_type = ?3,
                units_per_container = ?4,
                container_cost_cents = ?5,
                containers_purchased = ?6,
                sale_type = ?7,
                unit_sale_price_cents = ?8,
                combo_units = ?9,
                combo_price_cents = ?10,
                unit_cost = ?11,
                effective_unit_sale_price = ?12,
                profit_margin_per_unit = ?13,
                stock = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(&snack.id)
        .bind(&snack.name)
        .bind(snack.purchase_type)
        .bind(snack.units_per_container)
        .bind(snack.container_cost_cents)
        .bind(snack.containers_purchased)
        .bind(snack.sale_type)
        .bind(snack.unit_sale_price_cents)
        .bind(snack.combo_units)
        .bind(snack.combo_price_cents)
        .bind(snack.unit_cost.to_string())
        .bind(snack.effective_unit_sale_price.to_string())
        .bind(snack.profit_margin_per_unit.to_string())
        .bind(snack.stock)
        .bind(snack.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SnackNotFound(id.to_string()).into());
        }

        info!(id = %snack.id, stock = snack.stock, "Snack updated");
        self.activity
            .log(
                NewActivity::new(
                    ActivityAction::SnackUpdated,
                    &snack.id,
                    format!("Snack updated: {}", snack.name),
                )
                .with_details(json!({ "stock": snack.stock })),
            )
            .await;

        Ok(snack)
    }

    /// Deletes a snack.
    ///
    /// ## Errors
    /// `DeleteBlocked` when recorded sale lines still reference it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let snack = self.require(id).await?;

        sqlx::query("DELETE FROM snacks WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::from(e).on_foreign_key(|| CoreError::DeleteBlocked {
                    reason: "This snack appears in recorded sales".to_string(),
                })
            })?;

        info!(id = %id, "Snack deleted");
        self.activity
            .log(NewActivity::new(
                ActivityAction::SnackDeleted,
                id,
                format!("Snack deleted: {}", snack.name),
            ))
            .await;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{self, combo_snack, unit_snack};
    use rust_decimal::Decimal;
    use snack_core::{EntityType, NewSaleItem, ValidationError};

    #[tokio::test]
    async fn test_create_derives_pricing() {
        let db = test_support::db().await;
        let snack = db.snacks().create(unit_snack("Doritos")).await.unwrap();

        assert_eq!(snack.stock, 36);
        assert_eq!(snack.unit_cost, Decimal::from(2));
        assert_eq!(snack.effective_unit_sale_price, Decimal::from(5));
        assert_eq!(snack.profit_margin_per_unit, Decimal::from(3));

        let stored = db.snacks().require(&snack.id).await.unwrap();
        assert_eq!(stored, snack);
    }

    #[tokio::test]
    async fn test_create_combo_snack_round_trips_decimals() {
        let db = test_support::db().await;
        let snack = db.snacks().create(combo_snack("Gummies")).await.unwrap();

        let stored = db.snacks().require(&snack.id).await.unwrap();
        assert_eq!(stored.unit_cost, Decimal::new(5, 1));
        assert_eq!(stored.effective_unit_sale_price, Decimal::new(6667, 4));
        assert_eq!(stored.profit_margin_per_unit, Decimal::new(1667, 4));
        assert_eq!(stored.stock, 24);
    }

    #[tokio::test]
    async fn test_create_rejects_price_not_above_cost() {
        let db = test_support::db().await;
        let mut input = unit_snack("Loss leader");
        input.unit_sale_price_cents = Some(200);

        let err = db.snacks().create(input).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::PriceNotAboveCost { .. })
        ));
        assert!(db.snacks().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_recomputes_stock() {
        let db = test_support::db().await;
        let snack = db.snacks().create(unit_snack("Doritos")).await.unwrap();

        let patch = SnackPatch {
            containers_purchased: Some(5),
            ..Default::default()
        };
        let updated = db.snacks().update(&snack.id, patch).await.unwrap();

        assert_eq!(updated.stock, 60);
        assert_eq!(updated.name, "Doritos");
        assert_eq!(updated.created_at, snack.created_at);
    }

    #[tokio::test]
    async fn test_stock_overflow_rejected_on_create_and_update() {
        let db = test_support::db().await;
        let mut input = unit_snack("Doritos");
        input.units_per_container = i64::MAX / 2;
        input.containers_purchased = 3;

        let err = db.snacks().create(input).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(db.snacks().list().await.unwrap().is_empty());

        let snack = db.snacks().create(unit_snack("Doritos")).await.unwrap();
        let patch = SnackPatch {
            units_per_container: Some(i64::MAX / 2),
            ..Default::default()
        };
        let err = db.snacks().update(&snack.id, patch).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(db.snacks().require(&snack.id).await.unwrap().stock, 36);
    }

    #[tokio::test]
    async fn test_update_missing_snack() {
        let db = test_support::db().await;
        let id = Uuid::new_v4().to_string();

        let err = db
            .snacks()
            .update(&id, SnackPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::SnackNotFound(_))));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let db = test_support::db().await;
        db.snacks().create(unit_snack("Doritos")).await.unwrap();
        db.snacks().create(unit_snack("Cheetos")).await.unwrap();

        let found = db.snacks().search("dOR").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Doritos");

        assert_eq!(db.snacks().search("  ").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_public_catalog_hides_sold_out() {
        let db = test_support::db().await;
        let doritos = db.snacks().create(unit_snack("Doritos")).await.unwrap();
        let mut single_box = unit_snack("Cheetos");
        single_box.containers_purchased = 1;
        let cheetos = db.snacks().create(single_box).await.unwrap();

        let person = test_support::person(&db, "Ana").await;
        db.sales()
            .create_sale(test_support::sale(
                &person,
                vec![NewSaleItem::units(&cheetos.id, 12)],
                true,
            ))
            .await
            .unwrap();

        let catalog = db.snacks().public_catalog("").await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id, doritos.id);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_sales() {
        let db = test_support::db().await;
        let snack = test_support::snack(&db, unit_snack("Doritos")).await;
        let person = test_support::person(&db, "Ana").await;
        db.sales()
            .create_sale(test_support::sale(
                &person,
                vec![NewSaleItem::units(&snack.id, 1)],
                true,
            ))
            .await
            .unwrap();

        let err = db.snacks().delete(&snack.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::DeleteBlocked { .. })));
        assert!(db.snacks().get(&snack.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_logs_activity() {
        let db = test_support::db().await;
        let snack = test_support::snack(&db, unit_snack("Doritos")).await;

        db.snacks().delete(&snack.id).await.unwrap();

        assert!(db.snacks().get(&snack.id).await.unwrap().is_none());
        let history = db
            .activity()
            .list_for_entity(EntityType::Snack, &snack.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, "snack_deleted");
    }

    #[tokio::test]
    async fn test_list_page() {
        let db = test_support::db().await;
        for name in ["A", "B", "C"] {
            db.snacks().create(unit_snack(name)).await.unwrap();
        }

        let page = db.snacks().list_page(Page::new(2, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
    }
}
