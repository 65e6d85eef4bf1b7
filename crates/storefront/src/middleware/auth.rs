//! Authentication extractors.
//!
//! Both extractors read the login stored by
//! [`SessionRepository`](crate::session::SessionRepository). A corrupt or
//! unreadable session counts as logged out.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::UserProfile;
use crate::session::SessionRepository;

/// Login page path.
pub const LOGIN_PATH: &str = "/auth/login";

async fn load_user(parts: &Parts) -> Option<UserProfile> {
    let session = parts.extensions.get::<Session>()?.clone();
    match SessionRepository::new(session).load().await {
        Ok(auth) => auth.map(|auth| auth.user),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read auth session");
            None
        }
    }
}

/// Extractor that optionally gets the logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.display_name()),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct CurrentUser(pub Option<UserProfile>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(load_user(parts).await))
    }
}

/// Extractor that requires a logged-in user.
///
/// Logged-out visitors are sent to the login page: HTMX requests through an
/// `HX-Redirect` header, plain requests through a 303 redirect.
pub struct RequireUser(pub UserProfile);

/// Rejection for [`RequireUser`].
pub enum LoginRequired {
    /// Full-page redirect.
    Redirect,
    /// Client-side redirect for HTMX requests.
    HxRedirect,
}

impl IntoResponse for LoginRequired {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect => Redirect::to(LOGIN_PATH).into_response(),
            Self::HxRedirect => {
                (StatusCode::OK, AppendHeaders([("HX-Redirect", LOGIN_PATH)])).into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = LoginRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        load_user(parts).await.map(Self).ok_or_else(|| {
            if parts.headers.contains_key("hx-request") {
                LoginRequired::HxRedirect
            } else {
                LoginRequired::Redirect
            }
        })
    }
}
