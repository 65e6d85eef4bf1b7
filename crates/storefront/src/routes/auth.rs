//! Authentication route handlers.
//!
//! Login exchanges credentials for a token at the catalog service and keeps
//! the token and profile in the visitor's session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use scoder_core::{FieldErrors, LoginForm};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::CurrentUser;
use crate::services::auth::AuthError;
use crate::session::SessionRepository;
use crate::state::AppState;

/// Demo account accepted by the public catalog service.
pub const DEMO_USERNAME: &str = "mor_2314";
/// Password of the demo account.
pub const DEMO_PASSWORD: &str = "83r5^_";

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user_name: Option<String>,
    pub username: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
    pub demo_username: &'static str,
    pub demo_password: &'static str,
}

impl LoginTemplate {
    fn new(username: String, errors: FieldErrors, error: Option<String>) -> Self {
        Self {
            user_name: None,
            username,
            errors,
            error,
            demo_username: DEMO_USERNAME,
            demo_password: DEMO_PASSWORD,
        }
    }
}

/// Display the login page. Logged-in visitors go home.
pub async fn login_page(CurrentUser(user): CurrentUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate::new(String::new(), FieldErrors::new(), None).into_response()
}

/// Handle login form submission.
///
/// Every failure re-renders the form with the visitor's username. Rejected
/// credentials get the generic message; an unreachable service says so.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            return Ok(LoginTemplate::new(form.username, errors, None).into_response());
        }
    };

    let auth = match state.auth().login(&credentials).await {
        Ok(auth) => auth,
        Err(AuthError::InvalidCredentials) => {
            let message = AuthError::USER_MESSAGE.to_string();
            return Ok(
                LoginTemplate::new(form.username, FieldErrors::new(), Some(message))
                    .into_response(),
            );
        }
        Err(e) => {
            let err = AppError::from(e);
            let event_id = sentry::capture_error(&err);
            tracing::error!(error = %err, sentry_event_id = %event_id, "Login service failed");
            return Ok(
                LoginTemplate::new(form.username, FieldErrors::new(), Some(err.user_message()))
                    .into_response(),
            );
        }
    };

    SessionRepository::new(session).save(&auth).await?;
    set_sentry_user(&auth.user.id, &auth.user.username);

    Ok(Redirect::to("/").into_response())
}

/// Log out, keeping the cart.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect> {
    SessionRepository::new(session).clear().await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
