//! # Sale Commands
//!
//! Recording sales, from a direct request or from the cart, and the sale
//! history.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout_cart(person, date?, paid)                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  cart.to_new_sale() ──── empty? ──► VALIDATION_ERROR (EmptyCart)       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  sales().create_sale()  ◄── one transaction: stock, header, lines,     │
//! │         │                   debt when unpaid                            │
//! │         ├── Err ──► cart untouched, error returned                     │
//! │         ▼                                                               │
//! │  cart.clear() ──► Ok(Sale)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use snack_core::{AuthProvider, NewSale, Paged, Sale, SaleDetail, SaleHeaderPatch, SaleItem};
use tracing::{debug, info};

use crate::commands::{require_admin, require_auth};
use crate::error::ApiResult;
use crate::state::{AppConfig, CartState, DbState};

/// Checkout payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub person_id: String,
    /// Default: today (UTC)
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
    pub paid: bool,
}

/// Records a sale.
///
/// ## Errors
/// - `VALIDATION_ERROR` for no lines, bad quantities, combos of a unit-only
///   snack
/// - `NOT_FOUND` for an unknown person or snack
/// - `INSUFFICIENT_STOCK` naming the snack and the units available
pub async fn record_sale(
    db: &DbState,
    auth: &dyn AuthProvider,
    request: NewSale,
) -> ApiResult<Sale> {
    require_admin(auth)?;
    debug!(person_id = %request.person_id, lines = request.items.len(), "record_sale command");
    Ok(db.inner().sales().create_sale(request).await?)
}

/// Records the cart as one sale and empties it.
pub async fn checkout_cart(
    db: &DbState,
    auth: &dyn AuthProvider,
    cart: &CartState,
    request: CheckoutRequest,
) -> ApiResult<Sale> {
    require_admin(auth)?;
    let sale_date = request.sale_date.unwrap_or_else(|| Utc::now().date_naive());
    debug!(person_id = %request.person_id, %sale_date, "checkout_cart command");

    let new_sale =
        cart.with_cart(|c| c.to_new_sale(request.person_id.clone(), sale_date, request.paid))?;

    let sale = db.inner().sales().create_sale(new_sale).await?;
    cart.with_cart_mut(|c| c.clear());

    info!(sale_id = %sale.id, total_cents = sale.total_cents, "Cart checked out");
    Ok(sale)
}

/// Every sale, newest first, with person and lines.
pub async fn list_sales(db: &DbState, auth: &dyn AuthProvider) -> ApiResult<Vec<SaleDetail>> {
    require_auth(auth)?;
    debug!("list_sales command");
    Ok(db.inner().sales().list().await?)
}

pub async fn list_sales_page(
    db: &DbState,
    auth: &dyn AuthProvider,
    config: &AppConfig,
    page: u32,
) -> ApiResult<Paged<SaleDetail>> {
    require_auth(auth)?;
    debug!(page, "list_sales_page command");
    Ok(db.inner().sales().list_page(config.page(page)).await?)
}

pub async fn list_person_sales(
    db: &DbState,
    auth: &dyn AuthProvider,
    person_id: String,
) -> ApiResult<Vec<SaleDetail>> {
    require_auth(auth)?;
    Ok(db.inner().sales().list_for_person(&person_id).await?)
}

pub async fn get_sale(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<SaleDetail> {
    require_auth(auth)?;
    Ok(db.inner().sales().get_detail(&id).await?)
}

pub async fn get_sale_items(
    db: &DbState,
    auth: &dyn AuthProvider,
    sale_id: String,
) -> ApiResult<Vec<SaleItem>> {
    require_auth(auth)?;
    Ok(db.inner().sales().items(&sale_id).await?)
}

/// Edits person, date or paid flag. Lines, totals and debts are untouched.
pub async fn update_sale(
    db: &DbState,
    auth: &dyn AuthProvider,
    id: String,
    patch: SaleHeaderPatch,
) -> ApiResult<Sale> {
    require_admin(auth)?;
    debug!(id = %id, "update_sale command");
    Ok(db.inner().sales().update_header(&id, patch).await?)
}

/// Deletes a sale and its lines. Stock is not restored.
pub async fn delete_sale(db: &DbState, auth: &dyn AuthProvider, id: String) -> ApiResult<()> {
    require_admin(auth)?;
    debug!(id = %id, "delete_sale command");
    Ok(db.inner().sales().delete(&id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, AddToCartRequest};
    use crate::commands::test_support::*;
    use crate::error::ErrorCode;
    use snack_core::{NewSaleItem, QuantityMode};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn test_record_sale_and_oversell() {
        let db = db().await;
        let person = db.inner().people().create("Ana").await.unwrap();
        let snack = db.inner().snacks().create(doritos()).await.unwrap();

        let request = |qty| NewSale {
            person_id: person.id.clone(),
            sale_date: date(),
            items: vec![NewSaleItem::units(&snack.id, qty)],
            paid: true,
        };

        let err = record_sale(&db, &viewer(), request(1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let sale = record_sale(&db, &admin(), request(30)).await.unwrap();
        assert_eq!(sale.total_cents, 15000);

        let err = record_sale(&db, &admin(), request(7)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Doritos"));
        assert!(err.message.contains('6'));
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_only_on_success() {
        let db = db().await;
        let cart = CartState::new();
        let person = db.inner().people().create("Ana").await.unwrap();
        let snack = db.inner().snacks().create(doritos()).await.unwrap();

        let checkout = |person_id: &str| CheckoutRequest {
            person_id: person_id.to_string(),
            sale_date: Some(date()),
            paid: false,
        };

        let err = checkout_cart(&db, &admin(), &cart, checkout(&person.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        add_to_cart(
            &db,
            &admin(),
            &cart,
            AddToCartRequest {
                snack_id: snack.id.clone(),
                quantity: Some(3),
                mode: QuantityMode::Unit,
            },
        )
        .await
        .unwrap();

        let missing = uuid::Uuid::new_v4().to_string();
        let err = checkout_cart(&db, &admin(), &cart, checkout(&missing))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(!cart.with_cart(|c| c.is_empty()));

        let sale = checkout_cart(&db, &admin(), &cart, checkout(&person.id))
            .await
            .unwrap();
        assert_eq!(sale.total_cents, 1500);
        assert!(!sale.paid);
        assert!(cart.with_cart(|c| c.is_empty()));

        let detail = get_sale(&db, &viewer(), sale.id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(db.inner().debts().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_and_header_edit() {
        let db = db().await;
        let ana = db.inner().people().create("Ana").await.unwrap();
        let juan = db.inner().people().create("Juan").await.unwrap();
        let snack = db.inner().snacks().create(doritos()).await.unwrap();

        let sale = record_sale(
            &db,
            &admin(),
            NewSale {
                person_id: ana.id.clone(),
                sale_date: date(),
                items: vec![NewSaleItem::units(&snack.id, 2)],
                paid: true,
            },
        )
        .await
        .unwrap();

        let patch = SaleHeaderPatch {
            person_id: Some(juan.id.clone()),
            ..SaleHeaderPatch::default()
        };
        let updated = update_sale(&db, &admin(), sale.id.clone(), patch).await.unwrap();
        assert_eq!(updated.person_id, juan.id);

        assert!(list_person_sales(&db, &viewer(), ana.id).await.unwrap().is_empty());
        assert_eq!(list_person_sales(&db, &viewer(), juan.id).await.unwrap().len(), 1);

        let config = AppConfig::default();
        let page = list_sales_page(&db, &viewer(), &config, 1).await.unwrap();
        assert_eq!(page.total, 1);

        delete_sale(&db, &admin(), sale.id.clone()).await.unwrap();
        assert!(list_sales(&db, &viewer()).await.unwrap().is_empty());
        assert_eq!(db.inner().snacks().require(&snack.id).await.unwrap().stock, 34);
    }
}
