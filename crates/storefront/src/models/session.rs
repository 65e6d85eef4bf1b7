//! Session-related types.
//!
//! Types stored in the visitor's session.

use secrecy::SecretString;

use super::UserProfile;

/// An authenticated visitor.
///
/// The token is opaque to the storefront and never logged.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: SecretString,
    pub user: UserProfile,
}

impl AuthSession {
    #[must_use]
    pub const fn new(token: SecretString, user: UserProfile) -> Self {
        Self { token, user }
    }
}

/// Session keys.
pub mod keys {
    /// Auth token issued at login.
    pub const TOKEN: &str = "token";

    /// JSON-encoded [`UserProfile`](crate::models::UserProfile).
    pub const USER: &str = "user";

    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// The visitor's checkout wizard.
    pub const CHECKOUT: &str = "checkout";
}
