//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Login against the catalog service
//! - `cart` - Per-visitor cart kept in the session
//! - `checkout` - Checkout wizard orchestration and order submission

pub mod auth;
pub mod cart;
pub mod checkout;
