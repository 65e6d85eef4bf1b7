//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (product grid)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products/{id}          - Product detail overlay (fragment)
//!
//! # Cart (HTMX fragments)
//! GET  /cart/panel             - Cart panel overlay
//! GET  /cart/count             - Cart count badge
//! POST /cart/toggle            - Open or close the cart panel
//! POST /cart/add               - Add one unit (triggers cart-updated)
//! POST /cart/update            - Set a line's quantity
//! POST /cart/remove            - Remove a line
//!
//! # Checkout (HTMX fragments)
//! GET  /checkout               - Current checkout overlay
//! POST /checkout/open          - Start checkout (login required)
//! POST /checkout/delivery      - Submit delivery details
//! POST /checkout/payment       - Submit payment details
//! POST /checkout/back          - Return from review to payment
//! POST /checkout/place-order   - Place the order
//! POST /checkout/close         - Cancel, or dismiss the success step
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    Router,
    routing::{get, post},
};
use rust_decimal::Decimal;
use scoder_core::{CurrencyCode, Price};

use crate::state::AppState;

/// HTMX event fired whenever the cart changes.
pub const CART_UPDATED: &str = "cart-updated";

/// Format an amount in the store currency.
pub(crate) fn format_money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/panel", get(cart::panel))
        .route("/count", get(cart::count))
        .route("/toggle", post(cart::toggle))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/open", post(checkout::open))
        .route("/delivery", post(checkout::delivery))
        .route("/payment", post(checkout::payment))
        .route("/back", post(checkout::back))
        .route("/place-order", post(checkout::place_order))
        .route("/close", post(checkout::close))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
}
