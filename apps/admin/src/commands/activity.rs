//! # Activity Commands
//!
//! Read access to the audit trail. Entries are written by the repositories;
//! there is no command to add or remove them.

use snack_core::{ActivityLog, AuthProvider, EntityType, Paged};
use tracing::debug;

use crate::commands::require_auth;
use crate::error::ApiResult;
use crate::state::{AppConfig, DbState};

/// One page of entries, newest first.
pub async fn list_activity(
    db: &DbState,
    auth: &dyn AuthProvider,
    config: &AppConfig,
    page: u32,
) -> ApiResult<Paged<ActivityLog>> {
    require_auth(auth)?;
    debug!(page, "list_activity command");
    Ok(db.inner().activity().list(config.page(page)).await?)
}

/// Substring search over action code and description.
pub async fn search_activity(
    db: &DbState,
    auth: &dyn AuthProvider,
    config: &AppConfig,
    query: String,
    page: u32,
) -> ApiResult<Paged<ActivityLog>> {
    require_auth(auth)?;
    debug!(query = %query, page, "search_activity command");
    Ok(db.inner().activity().search(&query, config.page(page)).await?)
}

/// History of one snack, person, sale or debt.
pub async fn entity_activity(
    db: &DbState,
    auth: &dyn AuthProvider,
    entity_type: EntityType,
    entity_id: String,
) -> ApiResult<Vec<ActivityLog>> {
    require_auth(auth)?;
    Ok(db
        .inner()
        .activity()
        .list_for_entity(entity_type, &entity_id)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::person::{create_person, update_person, PersonInput};
    use crate::commands::test_support::*;

    #[tokio::test]
    async fn test_mutations_show_up() {
        let db = db().await;
        let config = AppConfig::default();

        let person = create_person(&db, &admin(), PersonInput { name: "Ana".into() })
            .await
            .unwrap();
        update_person(&db, &admin(), person.id.clone(), PersonInput { name: "Ana M".into() })
            .await
            .unwrap();

        let page = list_activity(&db, &viewer(), &config, 1).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].action, "person_updated");

        let found = search_activity(&db, &viewer(), &config, "created".into(), 1)
            .await
            .unwrap();
        assert_eq!(found.total, 1);

        let history = entity_activity(&db, &viewer(), EntityType::Person, person.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }
}
