//! # Cart Commands
//!
//! Build a multi-line sale before checking it out.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐                         │
//! │  │  Empty   │────►│ In Cart  │────►│ Recorded │                         │
//! │  │  Cart    │     │          │     │   Sale   │                         │
//! │  └──────────┘     └──────────┘     └──────────┘                         │
//! │                        │                 ▲                              │
//! │                   add_to_cart       checkout_cart                      │
//! │                   update_cart_item  (sale.rs)                          │
//! │                   remove_from_cart                                      │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are keyed by (snack, quantity mode). Stock is checked against the
//! snack as read when adding; the sale workflow re-checks it atomically.

use serde::{Deserialize, Serialize};
use snack_core::{AuthProvider, Cart, CartLine, CartTotals, QuantityMode};
use tracing::debug;

use crate::commands::{require_admin, require_auth};
use crate::error::ApiResult;
use crate::state::{CartState, DbState};

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines.clone(),
            totals: CartTotals::from(cart),
        }
    }
}

/// Add payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub snack_id: String,
    /// Default: 1
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub mode: QuantityMode,
}

pub fn get_cart(auth: &dyn AuthProvider, cart: &CartState) -> ApiResult<CartResponse> {
    require_auth(auth)?;
    Ok(cart.with_cart(|c| CartResponse::from(c)))
}

/// Adds a snack, merging with an existing line of the same mode.
///
/// ## Errors
/// - `NOT_FOUND` for an unknown snack
/// - `VALIDATION_ERROR` for combos of a unit-only snack or a full cart
/// - `INSUFFICIENT_STOCK` when the cart would hold more units than stock
pub async fn add_to_cart(
    db: &DbState,
    auth: &dyn AuthProvider,
    cart: &CartState,
    request: AddToCartRequest,
) -> ApiResult<CartResponse> {
    require_admin(auth)?;
    let quantity = request.quantity.unwrap_or(1);
    debug!(snack_id = %request.snack_id, quantity, mode = ?request.mode, "add_to_cart command");

    let snack = db.inner().snacks().require(&request.snack_id).await?;

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.add(&snack, quantity, request.mode)?;
        Ok(CartResponse::from(&*c))
    })
}

/// Sets a line's quantity; zero removes it.
pub fn update_cart_item(
    auth: &dyn AuthProvider,
    cart: &CartState,
    snack_id: String,
    mode: QuantityMode,
    quantity: i64,
) -> ApiResult<CartResponse> {
    require_admin(auth)?;
    debug!(snack_id = %snack_id, quantity, "update_cart_item command");

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.update_quantity(&snack_id, mode, quantity)?;
        Ok(CartResponse::from(&*c))
    })
}

pub fn remove_from_cart(
    auth: &dyn AuthProvider,
    cart: &CartState,
    snack_id: String,
    mode: QuantityMode,
) -> ApiResult<CartResponse> {
    require_admin(auth)?;
    debug!(snack_id = %snack_id, "remove_from_cart command");

    cart.with_cart_mut(|c| -> ApiResult<CartResponse> {
        c.remove(&snack_id, mode)?;
        Ok(CartResponse::from(&*c))
    })
}

pub fn clear_cart(auth: &dyn AuthProvider, cart: &CartState) -> ApiResult<CartResponse> {
    require_admin(auth)?;
    debug!("clear_cart command");

    Ok(cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::from(&*c)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;
    use crate::error::ErrorCode;

    fn add(snack_id: &str, quantity: i64, mode: QuantityMode) -> AddToCartRequest {
        AddToCartRequest {
            snack_id: snack_id.to_string(),
            quantity: Some(quantity),
            mode,
        }
    }

    #[tokio::test]
    async fn test_add_merges_lines() {
        let db = db().await;
        let cart = CartState::new();
        let doritos = db.inner().snacks().create(doritos()).await.unwrap();

        add_to_cart(&db, &admin(), &cart, add(&doritos.id, 2, QuantityMode::Unit))
            .await
            .unwrap();
        let response = add_to_cart(&db, &admin(), &cart, add(&doritos.id, 3, QuantityMode::Unit))
            .await
            .unwrap();

        assert_eq!(response.lines.len(), 1);
        assert_eq!(response.totals.total_units, 5);
        assert_eq!(response.totals.total_cents, 2500);
    }

    #[tokio::test]
    async fn test_add_checks_stock_and_combo() {
        let db = db().await;
        let cart = CartState::new();
        let doritos = db.inner().snacks().create(doritos()).await.unwrap();
        let gummies = db.inner().snacks().create(gummies()).await.unwrap();

        let err = add_to_cart(&db, &admin(), &cart, add(&doritos.id, 37, QuantityMode::Unit))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = add_to_cart(&db, &admin(), &cart, add(&doritos.id, 1, QuantityMode::Combo))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let response = add_to_cart(&db, &admin(), &cart, add(&gummies.id, 2, QuantityMode::Combo))
            .await
            .unwrap();
        assert_eq!(response.totals.total_units, 6);
        assert_eq!(response.totals.total_cents, 400);
    }

    #[tokio::test]
    async fn test_update_remove_clear() {
        let db = db().await;
        let cart = CartState::new();
        let doritos = db.inner().snacks().create(doritos()).await.unwrap();
        add_to_cart(&db, &admin(), &cart, add(&doritos.id, 2, QuantityMode::Unit))
            .await
            .unwrap();

        let response =
            update_cart_item(&admin(), &cart, doritos.id.clone(), QuantityMode::Unit, 4).unwrap();
        assert_eq!(response.totals.total_units, 4);

        let err = remove_from_cart(&admin(), &cart, "missing".into(), QuantityMode::Unit)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = clear_cart(&viewer(), &cart).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let response = clear_cart(&admin(), &cart).unwrap();
        assert!(response.lines.is_empty());
        assert_eq!(get_cart(&viewer(), &cart).unwrap().totals.line_count, 0);
    }
}
