//! # Person Repository
//!
//! People who buy snacks, their outstanding balance, and the delete guard.
//!
//! A person with sales cannot be deleted. Debts always hang off a sale, so
//! the sales check also covers people who still owe money.

use chrono::Utc;
use serde_json::json;
use snack_core::validation::{validate_name, validate_search_query};
use snack_core::{ActivityAction, CoreError, DeleteCheck, NewActivity, Person, PersonWithDebt};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::activity::ActivityLogger;
use crate::repository::like_pattern;

#[derive(sqlx::FromRow)]
struct PersonDebtRow {
    #[sqlx(flatten)]
    person: Person,
    total_debt_cents: i64,
}

/// Repository for person database operations.
#[derive(Debug, Clone)]
pub struct PersonRepository {
    pool: SqlitePool,
    activity: ActivityLogger,
}

impl PersonRepository {
    pub fn new(pool: SqlitePool, activity: ActivityLogger) -> Self {
        PersonRepository { pool, activity }
    }

    /// Everyone, by name.
    pub async fn list(&self) -> DbResult<Vec<Person>> {
        let people = sqlx::query_as::<_, Person>(
            "SELECT id, name, created_at, updated_at FROM people ORDER BY name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(people)
    }

    /// Everyone with the remaining balance of their pending debts.
    ///
    /// ## Query Shape
    /// ```text
    /// people ──< sales ──< debts (status = 'pending')
    ///            Σ max(0, amount - amount_paid) per person, 0 when none
    /// ```
    pub async fn list_with_debts(&self) -> DbResult<Vec<PersonWithDebt>> {
        let rows: Vec<PersonDebtRow> = sqlx::query_as(
            r#"
            SELECT
                p.id, p.name, p.created_at, p.updated_at,
                COALESCE((
                    SELECT SUM(MAX(0, d.amount_cents - d.amount_paid_cents))
                    FROM debts d
                    JOIN sales s ON s.id = d.sale_id
                    WHERE s.person_id = p.id AND d.status = 'pending'
                ), 0) AS total_debt_cents
            FROM people p
            ORDER BY p.name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PersonWithDebt {
                person: row.person,
                total_debt_cents: row.total_debt_cents,
            })
            .collect())
    }

    /// Case-insensitive substring search on the name.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Person>> {
        let query = validate_search_query(query)?;

        let people = sqlx::query_as::<_, Person>(
            r#"
            SELECT id, name, created_at, updated_at FROM people
            WHERE name LIKE ?1 ESCAPE '\'
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .bind(like_pattern(&query))
        .fetch_all(&self.pool)
        .await?;

        Ok(people)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(
            "SELECT id, name, created_at, updated_at FROM people WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    /// Gets a person or fails with `PersonNotFound`.
    pub async fn require(&self, id: &str) -> DbResult<Person> {
        self.get(id)
            .await?
            .ok_or_else(|| CoreError::PersonNotFound(id.to_string()).into())
    }

    /// Creates a person. The name is trimmed and must not be empty.
    pub async fn create(&self, name: &str) -> DbResult<Person> {
        let name = validate_name(name)?;
        let now = Utc::now();
        let person = Person {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO people (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&person.id)
        .bind(&person.name)
        .bind(person.created_at)
        .bind(person.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %person.id, "Person created");
        self.activity
            .log(NewActivity::new(
                ActivityAction::PersonCreated,
                &person.id,
                format!("Person created: {}", person.name),
            ))
            .await;

        Ok(person)
    }

    /// Renames a person.
    pub async fn update(&self, id: &str, name: &str) -> DbResult<Person> {
        let name = validate_name(name)?;
        let current = self.require(id).await?;
        let updated = Person {
            name,
            updated_at: Utc::now(),
            ..current.clone()
        };

        sqlx::query("UPDATE people SET name = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&updated.id)
            .bind(&updated.name)
            .bind(updated.updated_at)
            .execute(&self.pool)
            .await?;

        self.activity
            .log(
                NewActivity::new(
                    ActivityAction::PersonUpdated,
                    &updated.id,
                    format!("Person updated: {}", updated.name),
                )
                .with_details(json!({ "previous_name": current.name })),
            )
            .await;

        Ok(updated)
    }

    /// Whether the person may be deleted, and why not.
    pub async fn can_delete(&self, id: &str) -> DbResult<DeleteCheck> {
        self.require(id).await?;

        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE person_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if sales > 0 {
            return Ok(DeleteCheck::blocked("This person has associated sales"));
        }
        Ok(DeleteCheck::allowed())
    }

    /// Deletes a person after [`can_delete`](Self::can_delete) allows it.
    ///
    /// ## Errors
    /// - `PersonNotFound`
    /// - `DeleteBlocked` with the reason from the guard
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let check = self.can_delete(id).await?;
        if !check.can_delete {
            return Err(CoreError::DeleteBlocked {
                reason: check.reason.unwrap_or_default(),
            }
            .into());
        }

        // A sale recorded between the check and here trips the foreign key.
        sqlx::query("DELETE FROM people WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DbError::from(e).on_foreign_key(|| CoreError::DeleteBlocked {
                    reason: "This person has associated sales".to_string(),
                })
            })?;

        info!(id = %id, "Person deleted");
        self.activity
            .log(NewActivity::new(
                ActivityAction::PersonDeleted,
                id,
                "Person deleted",
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
    use crate::repository::test_support::{self, unit_snack};
    use snack_core::{Money, NewSaleItem};

    #[tokio::test]
    async fn test_create_trims_and_lists_by_name() {
        let db = test_support::db().await;
        db.people().create("  zoe ").await.unwrap();
        db.people().create("Ana").await.unwrap();

        let people = db.people().list().await.unwrap();
        let names: Vec<_> = people.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ana", "zoe"]);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let db = test_support::db().await;
        let err = db.people().create("   ").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_renames() {
        let db = test_support::db().await;
        let person = test_support::person(&db, "Ana").await;

        let updated = db.people().update(&person.id, "Ana Maria").await.unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(db.people().require(&person.id).await.unwrap().name, "Ana Maria");
    }

    #[tokio::test]
    async fn test_search() {
        let db = test_support::db().await;
        test_support::person(&db, "Ana").await;
        test_support::person(&db, "Juan").await;

        let found = db.people().search("an").await.unwrap();
        assert_eq!(found.len(), 2);
        let found = db.people().search("JUA").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_guard() {
        let db = test_support::db().await;
        let snack = test_support::snack(&db, unit_snack("Doritos")).await;
        let buyer = test_support::person(&db, "Ana").await;
        let idle = test_support::person(&db, "Juan").await;

        db.sales()
            .create_sale(test_support::sale(
                &buyer,
                vec![NewSaleItem::units(&snack.id, 1)],
                true,
            ))
            .await
            .unwrap();

        let check = db.people().can_delete(&buyer.id).await.unwrap();
        assert!(!check.can_delete);
        assert_eq!(check.reason.as_deref(), Some("This person has associated sales"));

        let err = db.people().delete(&buyer.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::DeleteBlocked { .. })));

        assert!(db.people().can_delete(&idle.id).await.unwrap().can_delete);
        db.people().delete(&idle.id).await.unwrap();
        assert!(db.people().get(&idle.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_with_debts_sums_remaining() {
        let db = test_support::db().await;
        let snack = test_support::snack(&db, unit_snack("Doritos")).await;
        let ana = test_support::person(&db, "Ana").await;
        let juan = test_support::person(&db, "Juan").await;

        // Two unpaid sales of 3 units at 5.00 each: 30.00 owed.
        for _ in 0..2 {
            db.sales()
                .create_sale(test_support::sale(
                    &ana,
                    vec![NewSaleItem::units(&snack.id, 3)],
                    false,
                ))
                .await
                .unwrap();
        }
        let debts = db.debts().list_for_person(&ana.id).await.unwrap();
        db.debts()
            .add_payment(&debts[0].debt.id, Money::from_cents(500))
            .await
            .unwrap();

        let rows = db.people().list_with_debts().await.unwrap();
        let ana_row = rows.iter().find(|r| r.person.id == ana.id).unwrap();
        let juan_row = rows.iter().find(|r| r.person.id == juan.id).unwrap();
        assert_eq!(ana_row.total_debt_cents, 2500);
        assert_eq!(juan_row.total_debt_cents, 0);
    }
}
