//! Per-visitor cart store.
//!
//! The cart lives in the visitor's session. [`CartStore::dispatch`] is the
//! only way to change it: load, apply the reducer, write back.

use scoder_core::{CartAction, CartState, reduce};

use crate::models::session_keys;
use crate::session::{SessionError, SessionStorage};

/// A visitor's cart, backed by their session.
pub struct CartStore<S> {
    storage: S,
}

impl<S: SessionStorage> CartStore<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Current cart state.
    ///
    /// A missing or undecodable entry yields an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(&self) -> Result<CartState, SessionError> {
        let Some(value) = self.storage.read(session_keys::CART).await? else {
            return Ok(CartState::default());
        };

        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding undecodable cart");
            CartState::default()
        }))
    }

    /// Apply an action and store the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn dispatch(&self, action: CartAction) -> Result<CartState, SessionError> {
        let name = action.name();
        let state = reduce(self.load().await?, action);
        tracing::debug!(
            action = name,
            items = state.total_items(),
            "Cart updated"
        );
        self.storage
            .write(session_keys::CART, serde_json::to_value(&state)?)
            .await?;
        Ok(state)
    }
}
