//! # Snack Commands
//!
//! Inventory CRUD plus the public catalog.
//!
//! ## Stock Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_snack ──► stock = units_per_container × containers_purchased   │
//! │  update_snack ──► merge patch ──► recompute stock and unit economics   │
//! │  record_sale  ──► stock -= units sold (sale.rs)                        │
//! │  delete_snack ──► refused once any sale line references the snack      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use snack_core::{AuthProvider, Paged, Snack, SnackInput, SnackPatch};
use tracing::debug;

use crate::commands::{require_admin, require_auth};
use crate::error::ApiResult;
use crate::state::{AppConfig, DbState};

/// Lists all snacks, newest first.
pub async fn list_snacks(db: &DbState, auth: &dyn AuthProvider) -> ApiResult<Vec<Snack>> {
    require_auth(auth)?;
    debug!("list_snacks command");
    Ok(db.inner().snacks().list().await?)
}

/// One page of snacks, newest first.
pub async fn list_snacks_page(
    db: &DbState,
    auth: &dyn AuthProvider,
    config: &AppConfig,
    page: u32,
) -> ApiResult<Paged<Snack>> {
    require_auth(auth)?;
    debug!(page, "list_snacks_page command");
    Ok(db.inner().snacks().list_page(config.page(page)).await?)
}

/// Case-insensitive substring search on name.
///
/// ## Arguments
/// * `query` - Search text; blank lists everything
pub async fn search_snacks(
    db: &DbState,
    auth: &dyn AuthProvider,
    query: String,
) -> ApiResult<Vec<Snack>> {
    require_auth(auth)?;
    debug!(query = %query, "search_snacks command");
    Ok(db.inner().snacks().search(&query).await?)
}

/// Snacks in stock, for the public catalog page. No session needed.
pub async fn public_catalog(db: &DbState, query: Option<String>) -> ApiResult<Vec<Snack>> {
    let query = query.unwrap_or_default();
    debug!(query = %query, "public_catalog command");
    Ok(db.inner().snacks().public_catalog(&query).await?)
}

pub async fn get_snack(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<Snack> {
    require_auth(auth)?;
    debug!(id = %id, "get_snack command");
    Ok(db.inner().snacks().require(&id).await?)
}

/// Registers a snack.
///
/// ## Errors
/// - `VALIDATION_ERROR` for bad input or a price not above unit cost
/// - `FORBIDDEN` for viewers
pub async fn create_snack(
    db: &DbState,
    auth: &dyn AuthProvider,
    input: SnackInput,
) -> ApiResult<Snack> {
    require_admin(auth)?;
    debug!(name = %input.name, "create_snack command");
    Ok(db.inner().snacks().create(input).await?)
}

/// Applies a partial update and recomputes the derived fields.
pub async fn update_snack(
    db: &DbState,
    auth: &dyn AuthProvider,
    id: String,
    patch: SnackPatch,
) -> ApiResult<Snack> {
    require_admin(auth)?;
    debug!(id = %id, "update_snack command");
    Ok(db.inner().snacks().update(&id, patch).await?)
}

/// Deletes a snack with no recorded sales.
///
/// ## Errors
/// `CONFLICT` when a sale line references the snack.
pub async fn delete_snack(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<()> {
    require_admin(auth)?;
    debug!(id = %id, "delete_snack command");
    Ok(db.inner().snacks().delete(&id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_reads_need_a_session() {
        let db = db().await;
        let err = list_snacks(&db, &anonymous()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        assert!(list_snacks(&db, &viewer()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutations_need_admin() {
        let db = db().await;

        let err = create_snack(&db, &viewer(), doritos()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(db.inner().snacks().list().await.unwrap().is_empty());

        let snack = create_snack(&db, &admin(), doritos()).await.unwrap();
        assert_eq!(snack.stock, 36);

        let err = delete_snack(&db, &viewer(), snack.id.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_catalog_is_public() {
        let db = db().await;
        create_snack(&db, &admin(), doritos()).await.unwrap();

        let catalog = public_catalog(&db, None).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(public_catalog(&db, Some("chee".into())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_translation() {
        let db = db().await;

        let err = get_snack(&db, &viewer(), uuid::Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let mut cheap = doritos();
        cheap.unit_sale_price_cents = Some(150);
        let err = create_snack(&db, &admin(), cheap).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_and_search() {
        let db = db().await;
        let snack = create_snack(&db, &admin(), doritos()).await.unwrap();

        let patch = SnackPatch {
            name: Some("Doritos Nacho".into()),
            ..SnackPatch::default()
        };
        let updated = update_snack(&db, &admin(), snack.id, patch).await.unwrap();
        assert_eq!(updated.name, "Doritos Nacho");

        let found = search_snacks(&db, &viewer(), "NACHO".into()).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
