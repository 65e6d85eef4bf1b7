//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The auth service rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The auth service could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The auth service answered with something other than a token.
    #[error("unexpected auth response: {0}")]
    UnexpectedResponse(String),
}

impl AuthError {
    /// Message shown on the login form for rejected credentials, whatever
    /// the reason the service gave.
    pub const USER_MESSAGE: &'static str = "Invalid username or password";
}
