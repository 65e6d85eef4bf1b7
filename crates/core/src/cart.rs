//! Cart state and the reducer that drives it.
//!
//! Every change to a cart goes through [`reduce`], which takes the current
//! [`CartState`] and a [`CartAction`] and returns the next state. Totals are
//! derived from the line list on every call and never stored.
//!
//! ```
//! use rust_decimal::Decimal;
//! use scoder_core::{CartAction, CartState, Product, ProductId, Rating, reduce};
//!
//! let mug = Product {
//!     id: ProductId::new(1),
//!     title: "Mug".to_string(),
//!     price: Decimal::new(1000, 2),
//!     description: String::new(),
//!     category: "kitchen".to_string(),
//!     image: String::new(),
//!     rating: Rating::default(),
//! };
//!
//! let cart = reduce(CartState::default(), CartAction::AddItem(mug.clone()));
//! let cart = reduce(cart, CartAction::AddItem(mug));
//! assert_eq!(cart.total_items(), 2);
//! assert_eq!(cart.total_price(), Decimal::new(2000, 2));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::types::ProductId;

/// One product plus the chosen quantity.
///
/// A line's quantity is always at least 1; a line that would drop to zero is
/// removed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A visitor's cart and overlay visibility.
///
/// Lines keep insertion order. Opening checkout always closes the cart
/// panel, so the two overlays are never shown together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CartState {
    lines: Vec<CartLine>,
    cart_open: bool,
    checkout_open: bool,
}

impl CartState {
    /// Cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart panel overlay is open.
    #[must_use]
    pub const fn is_cart_open(&self) -> bool {
        self.cart_open
    }

    /// Whether the checkout overlay is open.
    #[must_use]
    pub const fn is_checkout_open(&self) -> bool {
        self.checkout_open
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether a line for the product exists.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.lines.iter().any(|line| line.product.id == id)
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == id)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }
}

/// The operations a cart accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Add one unit of a product, creating the line if needed.
    AddItem(Product),
    /// Remove a product's line; no-op when absent.
    RemoveItem(ProductId),
    /// Set a line's quantity; zero or negative removes the line.
    UpdateQuantity { id: ProductId, quantity: i64 },
    /// Flip the cart panel.
    ToggleCart,
    /// Open checkout and close the cart panel.
    OpenCheckout,
    /// Close checkout, keeping the lines.
    CloseCheckout,
    /// Empty the cart and close both overlays.
    ClearCart,
}

impl CartAction {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddItem(_) => "add_item",
            Self::RemoveItem(_) => "remove_item",
            Self::UpdateQuantity { .. } => "update_quantity",
            Self::ToggleCart => "toggle_cart",
            Self::OpenCheckout => "open_checkout",
            Self::CloseCheckout => "close_checkout",
            Self::ClearCart => "clear_cart",
        }
    }
}

/// Apply an action to a cart, producing the next state.
///
/// All actions are total: ids that are not in the cart are ignored.
#[must_use]
pub fn reduce(mut state: CartState, action: CartAction) -> CartState {
    match action {
        CartAction::AddItem(product) => {
            if let Some(line) = state
                .lines
                .iter_mut()
                .find(|line| line.product.id == product.id)
            {
                line.quantity = line.quantity.saturating_add(1);
            } else {
                state.lines.push(CartLine {
                    product,
                    quantity: 1,
                });
            }
        }
        CartAction::RemoveItem(id) => {
            state.lines.retain(|line| line.product.id != id);
        }
        CartAction::UpdateQuantity { id, quantity } => {
            if quantity <= 0 {
                state.lines.retain(|line| line.product.id != id);
            } else if let Some(line) = state.lines.iter_mut().find(|line| line.product.id == id) {
                line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            }
        }
        CartAction::ToggleCart => {
            state.cart_open = !state.cart_open;
        }
        CartAction::OpenCheckout => {
            state.checkout_open = true;
            state.cart_open = false;
        }
        CartAction::CloseCheckout => {
            state.checkout_open = false;
        }
        CartAction::ClearCart => {
            state.lines.clear();
            state.cart_open = false;
            state.checkout_open = false;
        }
    }
    state
}
