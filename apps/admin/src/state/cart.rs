//! # Cart State
//!
//! The operator's cart between commands.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>`: several commands touch it and
//! only one may modify it at a time. A poisoned lock is recovered, since
//! every cart mutation leaves the cart valid or returns before touching it.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator Action          Command                 Cart State Change     │
//! │  ───────────────          ───────                 ─────────────────     │
//! │                                                                         │
//! │  Pick snack ─────────────► add_to_cart() ───────► merge or push line   │
//! │  Change quantity ────────► update_cart_item() ──► line.quantity = n    │
//! │  Click remove ───────────► remove_from_cart() ──► drop line            │
//! │  Click clear ────────────► clear_cart() ────────► lines.clear()        │
//! │  Check out ──────────────► checkout_cart() ─────► record sale, clear   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use snack_core::Cart;

/// Shared cart.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(|e| e.into_inner());
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_shared_between_clones() {
        let state = CartState::new();
        let other = state.clone();

        other.with_cart_mut(|cart| cart.clear());
        let created = other.with_cart(|cart| cart.created_at);

        assert_eq!(state.with_cart(|cart| cart.created_at), created);
        assert!(state.with_cart(Cart::is_empty));
    }
}
