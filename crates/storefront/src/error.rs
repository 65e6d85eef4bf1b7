//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers that can fail return
//! `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scoder_core::CheckoutError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutServiceError;
use crate::session::SessionError;

/// Coarse classification of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An upstream service could not be reached or answered badly.
    Network,
    /// Credentials were rejected.
    Auth,
    /// Input or a wizard transition was refused.
    Validation,
    /// The session store failed.
    Persistence,
    /// The requested resource does not exist.
    NotFound,
    /// Anything else.
    Internal,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog fetch failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutServiceError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) | Self::NotFound(_) => ErrorKind::NotFound,
            Self::Catalog(_)
            | Self::Auth(AuthError::Http(_) | AuthError::UnexpectedResponse(_))
            | Self::Checkout(CheckoutServiceError::Order(_)) => ErrorKind::Network,
            Self::Auth(AuthError::InvalidCredentials) => ErrorKind::Auth,
            Self::Session(_) | Self::Checkout(CheckoutServiceError::Session(_)) => {
                ErrorKind::Persistence
            }
            Self::Checkout(CheckoutServiceError::Flow(_) | CheckoutServiceError::NotOpen)
            | Self::BadRequest(_) => ErrorKind::Validation,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(CheckoutServiceError::Flow(CheckoutError::Validation(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Checkout(CheckoutServiceError::Flow(_) | CheckoutServiceError::NotOpen) => {
                StatusCode::CONFLICT
            }
            _ => match self.kind() {
                ErrorKind::Network => StatusCode::BAD_GATEWAY,
                ErrorKind::Auth => StatusCode::UNAUTHORIZED,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Persistence | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to show to the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) => "Product not found".to_string(),
            Self::Catalog(_) => "Failed to fetch products".to_string(),
            Self::Auth(AuthError::InvalidCredentials) => AuthError::USER_MESSAGE.to_string(),
            Self::Auth(_) => "Login is unavailable right now. Please try again.".to_string(),
            Self::Checkout(CheckoutServiceError::Order(e)) => e.user_message(),
            Self::Checkout(CheckoutServiceError::Flow(e)) => e.to_string(),
            Self::Checkout(CheckoutServiceError::NotOpen) => "Checkout is not open".to_string(),
            Self::Session(_)
            | Self::Checkout(CheckoutServiceError::Session(_))
            | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self.kind(),
            ErrorKind::Network | ErrorKind::Persistence | ErrorKind::Internal
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (self.status(), self.user_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for visitor actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use scoder_core::{FieldErrors, ProductId};

    use super::*;
    use crate::services::checkout::OrderError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            AppError::Catalog(CatalogError::NotFound(ProductId::new(9))).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::Catalog(CatalogError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
                .kind(),
            ErrorKind::Network
        );
        assert_eq!(
            AppError::Checkout(CheckoutServiceError::Flow(CheckoutError::Validation(
                FieldErrors::new()
            )))
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutServiceError::Flow(
                CheckoutError::AlreadyProcessing
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutServiceError::Order(
                OrderError::Unavailable("down".to_string())
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages_hide_internals() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.user_message(), "Internal server error");

        let err = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(err.user_message(), "Invalid username or password");

        let err = AppError::Catalog(CatalogError::Status(reqwest::StatusCode::BAD_GATEWAY));
        assert_eq!(err.user_message(), "Failed to fetch products");
    }
}
