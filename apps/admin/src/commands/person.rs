//! # Person Commands
//!
//! People who buy snacks, with their outstanding balance.

use serde::Deserialize;
use snack_core::{AuthProvider, DeleteCheck, Person, PersonWithDebt};
use tracing::debug;

use crate::commands::{require_admin, require_auth};
use crate::error::ApiResult;
use crate::state::DbState;

/// Create / rename payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonInput {
    pub name: String,
}

/// Everyone, by name.
pub async fn list_people(db: &DbState, auth: &dyn AuthProvider) -> ApiResult<Vec<Person>> {
    require_auth(auth)?;
    debug!("list_people command");
    Ok(db.inner().people().list().await?)
}

/// Everyone with the sum still owed on pending debts.
pub async fn list_people_with_debts(
    db: &DbState,
    auth: &dyn AuthProvider,
) -> ApiResult<Vec<PersonWithDebt>> {
    require_auth(auth)?;
    debug!("list_people_with_debts command");
    Ok(db.inner().people().list_with_debts().await?)
}

pub async fn search_people(
    db: &DbState,
    auth: &dyn AuthProvider,
    query: String,
) -> ApiResult<Vec<Person>> {
    require_auth(auth)?;
    debug!(query = %query, "search_people command");
    Ok(db.inner().people().search(&query).await?)
}

pub async fn get_person(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<Person> {
    require_auth(auth)?;
    Ok(db.inner().people().require(&id).await?)
}

pub async fn create_person(
    db: &DbState,
    auth: &dyn AuthProvider,
    input: PersonInput,
) -> ApiResult<Person> {
    require_admin(auth)?;
    debug!(name = %input.name, "create_person command");
    Ok(db.inner().people().create(&input.name).await?)
}

pub async fn update_person(
    db: &DbState,
    auth: &dyn AuthProvider,
    id: String,
    input: PersonInput,
) -> ApiResult<Person> {
    require_admin(auth)?;
    debug!(id = %id, "update_person command");
    Ok(db.inner().people().update(&id, &input.name).await?)
}

/// Whether the delete button should be enabled, and why not.
pub async fn can_delete_person(
    db: &DbState,
    auth: &dyn AuthProvider,
    id: String,
) -> ApiResult<DeleteCheck> {
    require_auth(auth)?;
    Ok(db.inner().people().can_delete(&id).await?)
}

/// Deletes a person with no sales.
///
/// ## Errors
/// `CONFLICT` with "Cannot delete: This person has associated sales".
pub async fn delete_person(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<()> {
    require_admin(auth)?;
    debug!(id = %id, "delete_person command");
    Ok(db.inner().people().delete(&id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;
    use snack_core::{NewSale, NewSaleItem};

    fn ana() -> PersonInput {
        PersonInput { name: "Ana".into() }
    }

    #[tokio::test]
    async fn test_create_and_rename() {
        let db = db().await;

        let err = create_person(&db, &anonymous(), ana()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);

        let person = create_person(&db, &admin(), ana()).await.unwrap();
        let renamed = update_person(
            &db,
            &admin(),
            person.id.clone(),
            PersonInput {
                name: "Ana María".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Ana María");
        assert_eq!(list_people(&db, &viewer()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_is_a_validation_error() {
        let db = db().await;
        let err = create_person(&db, &admin(), PersonInput { name: "  ".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_sales() {
        let db = db().await;
        let person = create_person(&db, &admin(), ana()).await.unwrap();
        let snack = db.inner().snacks().create(doritos()).await.unwrap();
        db.inner()
            .sales()
            .create_sale(NewSale {
                person_id: person.id.clone(),
                sale_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                items: vec![NewSaleItem::units(&snack.id, 1)],
                paid: false,
            })
            .await
            .unwrap();

        let check = can_delete_person(&db, &viewer(), person.id.clone()).await.unwrap();
        assert!(!check.can_delete);

        let err = delete_person(&db, &admin(), person.id.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(err.message.contains("associated sales"));

        let balances = list_people_with_debts(&db, &viewer()).await.unwrap();
        assert_eq!(balances[0].total_debt_cents, 500);
    }
}
