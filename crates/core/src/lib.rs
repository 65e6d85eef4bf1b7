//! Scoder Core - Storefront domain library.
//!
//! This crate holds the parts of the storefront that are pure functions of
//! their inputs:
//! - the cart reducer and its derived totals
//! - the four-stage checkout state machine
//! - form validation for delivery, payment and login data
//! - display formatting for prices and form values
//!
//! # Architecture
//!
//! The core crate contains only types and transitions - no I/O, no HTTP
//! clients, no clocks. Callers pass "today" in where validation depends on
//! it, which keeps every transition deterministic under test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and emails
//! - [`product`] - Catalog product records
//! - [`cart`] - Cart state, actions and the reducer
//! - [`checkout`] - Checkout wizard state machine
//! - [`validation`] - Form schemas and per-field errors
//! - [`format`] - Display helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod format;
pub mod product;
pub mod types;
pub mod validation;

pub use cart::{CartAction, CartLine, CartState, reduce};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutStage, CheckoutStep};
pub use product::{Product, Rating};
pub use types::*;
pub use validation::{
    CardExpiry, DeliveryForm, DeliveryInfo, FieldErrors, LoginForm, LoginInfo, PaymentForm, PaymentInfo,
    PaymentMethod,
};
