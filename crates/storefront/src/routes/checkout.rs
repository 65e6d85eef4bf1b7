//! Checkout route handlers.
//!
//! Every handler answers with the whole checkout overlay, swapped into
//! `#checkout` by HTMX. Validation failures re-render the current step with
//! inline messages and the visitor's input; they are never server errors.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use scoder_core::{
    CheckoutError, CheckoutStep, DeliveryForm, DeliveryInfo, FieldErrors,
    PaymentForm, PaymentInfo,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireUser;
use crate::routes::cart::CartView;
use crate::routes::{CART_UPDATED, format_money};
use crate::services::checkout::{CheckoutService, CheckoutServiceError, CheckoutSnapshot};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One entry of the progress indicator.
#[derive(Clone)]
pub struct ProgressView {
    pub number: u8,
    pub label: &'static str,
    pub is_done: bool,
    pub is_current: bool,
}

fn progress(current: CheckoutStep) -> Vec<ProgressView> {
    CheckoutStep::PROGRESS
        .iter()
        .map(|&step| ProgressView {
            number: step.number(),
            label: step.label(),
            is_done: step < current,
            is_current: step == current,
        })
        .collect()
}

/// Captured details shown on the review step.
#[derive(Clone)]
pub struct ReviewView {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city_state: String,
    pub zip_code: String,
    pub payment_method: &'static str,
    pub card_number: String,
    pub card_name: String,
    pub expiry: String,
}

impl ReviewView {
    fn new(delivery: &DeliveryInfo, payment: &PaymentInfo) -> Self {
        Self {
            full_name: delivery.full_name.clone(),
            email: delivery.email.to_string(),
            phone: delivery.phone.clone(),
            address: delivery.address.clone(),
            city_state: format!("{}, {}", delivery.city, delivery.state),
            zip_code: delivery.zip_code.clone(),
            payment_method: payment.method.label(),
            card_number: payment.masked_card_number(),
            card_name: payment.card_name.clone(),
            expiry: payment.expiry.to_string(),
        }
    }
}

/// Checkout overlay fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout.html")]
pub struct CheckoutTemplate {
    pub visible: bool,
    pub step: u8,
    pub progress: Vec<ProgressView>,
    pub delivery: DeliveryForm,
    pub payment: PaymentForm,
    pub errors: FieldErrors,
    pub review: Option<ReviewView>,
    pub cart: CartView,
    pub processing: bool,
    pub message: Option<String>,
    pub success_total: Option<String>,
    pub success_delay_ms: u128,
}

/// Form values and messages to show on top of the stored state.
#[derive(Default)]
struct Feedback {
    delivery: Option<DeliveryForm>,
    payment: Option<PaymentForm>,
    errors: FieldErrors,
    message: Option<String>,
}

impl Feedback {
    fn message(message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::default()
        }
    }
}

fn render(state: &AppState, snapshot: &CheckoutSnapshot, feedback: Feedback) -> CheckoutTemplate {
    let currency = state.config().currency;
    let flow = &snapshot.flow;
    let step = flow.step();

    let delivery = feedback
        .delivery
        .or_else(|| flow.delivery().map(DeliveryForm::from))
        .unwrap_or_default();
    let payment = feedback
        .payment
        .or_else(|| flow.payment().map(PaymentForm::from))
        .unwrap_or_default();

    let review = match (step, flow.delivery(), flow.payment()) {
        (CheckoutStep::Review, Some(delivery), Some(payment)) => {
            Some(ReviewView::new(delivery, payment))
        }
        _ => None,
    };

    CheckoutTemplate {
        visible: snapshot.is_visible(),
        step: step.number(),
        progress: progress(step),
        delivery,
        payment,
        errors: feedback.errors,
        review,
        cart: CartView::new(&snapshot.cart, currency),
        processing: flow.is_processing(),
        message: feedback.message,
        success_total: flow.order_total().map(|total| format_money(total, currency)),
        success_delay_ms: state.config().checkout.success_display.as_millis(),
    }
}

/// Overlay fragment with the `cart-updated` trigger.
fn with_cart_updated(template: CheckoutTemplate) -> Response {
    (AppendHeaders([("HX-Trigger", CART_UPDATED)]), template).into_response()
}

/// Re-render the current step for a refused submission.
///
/// Validation errors come back inline with the visitor's input. Other
/// refusals from the wizard come back as a message.
async fn rejected(
    state: &AppState,
    service: &CheckoutService<Session>,
    err: CheckoutServiceError,
    mut feedback: Feedback,
) -> Result<CheckoutTemplate> {
    match err {
        CheckoutServiceError::Flow(CheckoutError::Validation(errors)) => {
            feedback.errors = errors;
        }
        CheckoutServiceError::Flow(e) => {
            tracing::info!(error = %e, "Checkout transition refused");
            feedback = Feedback::message(e.to_string());
        }
        CheckoutServiceError::Order(e) => {
            feedback = Feedback::message(e.user_message());
        }
        other => return Err(AppError::from(other)),
    }

    let snapshot = service.snapshot().await?;
    Ok(render(state, &snapshot, feedback))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout overlay for the current state.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CheckoutTemplate> {
    let snapshot = CheckoutService::new(session).snapshot().await?;
    Ok(render(&state, &snapshot, Feedback::default()))
}

/// Start checkout at the delivery step.
///
/// Logged-out visitors are redirected to the login page by [`RequireUser`].
#[instrument(skip_all, fields(username = %user.username))]
pub async fn open(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
) -> Result<Response> {
    let snapshot = CheckoutService::new(session).open().await?;
    add_breadcrumb("checkout", "Opened checkout", None);
    Ok(with_cart_updated(render(&state, &snapshot, Feedback::default())))
}

/// Submit the delivery form.
#[instrument(skip(state, session, form))]
pub async fn delivery(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<DeliveryForm>,
) -> Result<CheckoutTemplate> {
    let service = CheckoutService::new(session);
    match service.submit_delivery(&form).await {
        Ok(snapshot) => Ok(render(&state, &snapshot, Feedback::default())),
        Err(e) => {
            let feedback = Feedback {
                delivery: Some(form.masked()),
                ..Feedback::default()
            };
            rejected(&state, &service, e, feedback).await
        }
    }
}

/// Submit the payment form. Expiry is checked against today's date.
#[instrument(skip(state, session, form))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Result<CheckoutTemplate> {
    let service = CheckoutService::new(session);
    let today = chrono::Utc::now().date_naive();
    match service.submit_payment(&form, today).await {
        Ok(snapshot) => Ok(render(&state, &snapshot, Feedback::default())),
        Err(e) => {
            let feedback = Feedback {
                payment: Some(form.masked()),
                ..Feedback::default()
            };
            rejected(&state, &service, e, feedback).await
        }
    }
}

/// Go back from review to payment.
#[instrument(skip(state, session))]
pub async fn back(State(state): State<AppState>, session: Session) -> Result<CheckoutTemplate> {
    let service = CheckoutService::new(session);
    match service.back().await {
        Ok(snapshot) => Ok(render(&state, &snapshot, Feedback::default())),
        Err(e) => rejected(&state, &service, e, Feedback::default()).await,
    }
}

/// Place the order.
///
/// Holds the request for the order submission. On success the cart is
/// cleared and the success step is shown; on failure the review step comes
/// back with the reason.
#[instrument(skip(state, session))]
pub async fn place_order(State(state): State<AppState>, session: Session) -> Result<Response> {
    let service = CheckoutService::new(session);
    match service.place_order(state.orders()).await {
        Ok(snapshot) => {
            add_breadcrumb("checkout", "Order placed", None);
            Ok(with_cart_updated(render(
                &state,
                &snapshot,
                Feedback::default(),
            )))
        }
        Err(e) => Ok(rejected(&state, &service, e, Feedback::default())
            .await?
            .into_response()),
    }
}

/// Cancel checkout, or dismiss the success step.
#[instrument(skip(state, session))]
pub async fn close(State(state): State<AppState>, session: Session) -> Result<Response> {
    let service = CheckoutService::new(session);
    match service.close().await {
        Ok(snapshot) => Ok(with_cart_updated(render(
            &state,
            &snapshot,
            Feedback::default(),
        ))),
        Err(e) => Ok(rejected(&state, &service, e, Feedback::default())
            .await?
            .into_response()),
    }
}
