//! # Activity Log Repository
//!
//! Append-only audit trail.
//!
//! Writes from the other repositories go through [`ActivityLogger`], which
//! never returns an error: a failed audit write is logged with `warn!` and
//! dropped, and the operation that triggered it still succeeds. Entries are
//! written after the triggering transaction commits, so a rolled-back
//! workflow leaves no trace here.

use chrono::{DateTime, Utc};
use snack_core::validation::validate_search_query;
use snack_core::{ActivityLog, EntityType, NewActivity, Page, Paged};
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: String,
    entity_type: EntityType,
    entity_id: Option<String>,
    action: String,
    description: Option<String>,
    details: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = DbError;

    fn try_from(row: ActivityRow) -> DbResult<Self> {
        let details = match row.details {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|_| DbError::Decode {
                column: "activity_log.details".to_string(),
                value: raw,
            })?),
            None => None,
        };
        Ok(ActivityLog {
            id: row.id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            action: row.action,
            description: row.description,
            details,
            created_at: row.created_at,
        })
    }
}

const COLUMNS: &str = "id, entity_type, entity_id, action, description, details, created_at";

/// Repository for the activity log.
#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogRepository { pool }
    }

    /// Appends an entry. Errors propagate; use [`ActivityLogger`] for
    /// best-effort writes.
    pub async fn record(&self, entry: &NewActivity) -> DbResult<ActivityLog> {
        let details = entry
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let log = ActivityLog {
            id: Uuid::new_v4().to_string(),
            entity_type: entry.entity_type,
            entity_id: entry.entity_id.clone(),
            action: entry.action.clone(),
            description: entry.description.clone(),
            details: entry.details.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO activity_log (id, entity_type, entity_id, action, description, details, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&log.id)
        .bind(log.entity_type)
        .bind(&log.entity_id)
        .bind(&log.action)
        .bind(&log.description)
        .bind(details)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        debug!(action = %log.action, entity_id = ?log.entity_id, "Activity recorded");
        Ok(log)
    }

    /// Newest first.
    pub async fn list(&self, page: Page) -> DbResult<Paged<ActivityLog>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_log")
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<ActivityRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM activity_log ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(ActivityLog::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Paged::new(items, total, page))
    }

    /// Case-insensitive substring search over action and description.
    pub async fn search(&self, query: &str, page: Page) -> DbResult<Paged<ActivityLog>> {
        let query = validate_search_query(query)?;
        if query.is_empty() {
            return self.list(page).await;
        }
        let pattern = like_pattern(&query);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_log
            WHERE action LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\'
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<ActivityRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM activity_log
            WHERE action LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\'
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(ActivityLog::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Paged::new(items, total, page))
    }

    /// Every entry about one entity, newest first.
    pub async fn list_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> DbResult<Vec<ActivityLog>> {
        let rows: Vec<ActivityRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM activity_log
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY created_at DESC, rowid DESC
            "#
        ))
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ActivityLog::try_from).collect()
    }
}

// =============================================================================
// Best-effort logger
// =============================================================================

/// Non-critical audit sink held by the other repositories.
#[derive(Debug, Clone)]
pub struct ActivityLogger {
    repo: ActivityLogRepository,
}

impl ActivityLogger {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogger {
            repo: ActivityLogRepository::new(pool),
        }
    }

    /// Writes the entry; any failure is logged and discarded.
    pub async fn log(&self, entry: NewActivity) {
        if let Err(e) = self.repo.record(&entry).await {
            warn!(action = %entry.action, error = %e, "Failed to write activity log entry");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use serde_json::json;
    use snack_core::ActivityAction;

    #[tokio::test]
    async fn test_record_and_list_newest_first() {
        let db = test_support::db().await;
        let repo = db.activity();

        repo.record(&NewActivity::system("backup", "First")).await.unwrap();
        repo.record(
            &NewActivity::new(ActivityAction::SnackCreated, "s1", "Snack created: Doritos")
                .with_details(json!({ "stock": 36 })),
        )
        .await
        .unwrap();

        let page = repo.list(Page::first(10)).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items[0].action, "snack_created");
        assert_eq!(page.items[0].details, Some(json!({ "stock": 36 })));
        assert_eq!(page.items[1].entity_type, EntityType::System);
        assert_eq!(page.items[1].entity_id, None);
    }

    #[tokio::test]
    async fn test_search_and_entity_filter() {
        let db = test_support::db().await;
        let repo = db.activity();

        repo.record(&NewActivity::new(ActivityAction::PersonCreated, "p1", "Person created: Ana"))
            .await
            .unwrap();
        repo.record(&NewActivity::new(ActivityAction::PersonUpdated, "p1", "Person renamed to Ana M"))
            .await
            .unwrap();
        repo.record(&NewActivity::new(ActivityAction::SnackCreated, "s1", "Snack created: Doritos"))
            .await
            .unwrap();

        let found = repo.search("ANA", Page::first(10)).await.unwrap();
        assert_eq!(found.total, 2);

        let found = repo.search("snack_", Page::first(10)).await.unwrap();
        assert_eq!(found.total, 1);

        let for_person = repo.list_for_entity(EntityType::Person, "p1").await.unwrap();
        assert_eq!(for_person.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination() {
        let db = test_support::db().await;
        let repo = db.activity();
        for i in 0..5 {
            repo.record(&NewActivity::system("tick", format!("tick {i}")))
                .await
                .unwrap();
        }

        let second = repo.list(Page::new(2, 2)).await.unwrap();
        assert_eq!(second.total, 5);
        assert_eq!(second.total_pages, 3);
        assert_eq!(second.items.len(), 2);
    }

    #[tokio::test]
    async fn test_logger_swallows_failures() {
        let db = test_support::db().await;
        let logger = ActivityLogger::new(db.pool().clone());

        // A closed pool makes every write fail.
        db.close().await;
        logger
            .log(NewActivity::system("noop", "ignored"))
            .await;
    }
}
