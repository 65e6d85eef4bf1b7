//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the visitor's session; every change goes through
//! [`CartStore::dispatch`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use scoder_core::{CartAction, CartLine, CartState, CurrencyCode, ProductId, format::truncate_text};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::routes::products::{ProductModalTemplate, into_modal};
use crate::routes::{CART_UPDATED, format_money};
use crate::services::cart::CartStore;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

/// Largest count the badge shows before switching to `99+`.
const BADGE_MAX: u64 = 99;

/// Titles longer than this are cut in the cart panel.
const LINE_TITLE_MAX: usize = 30;

/// Shown when the cart is changed while an order is being placed.
const ORDER_IN_FLIGHT: &str = "Your order is being placed. The cart can be changed once it is done.";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub price: String,
    pub quantity: u32,
    pub subtotal: String,
    pub decrement: i64,
    pub increment: i64,
}

impl CartItemView {
    fn new(line: &CartLine, currency: CurrencyCode) -> Self {
        let quantity = i64::from(line.quantity);
        Self {
            id: line.product.id.as_i64(),
            title: truncate_text(&line.product.title, LINE_TITLE_MAX),
            image: line.product.image.clone(),
            price: format_money(line.product.price, currency),
            quantity: line.quantity,
            subtotal: format_money(line.subtotal(), currency),
            decrement: quantity - 1,
            increment: quantity + 1,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u64,
    pub is_open: bool,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &CartState, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView::new(line, currency))
                .collect(),
            total: format_money(cart.total_price(), currency),
            item_count: cart.total_items(),
            is_open: cart.is_cart_open(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Badge text for an item count: hidden at zero, capped at `99+`.
#[must_use]
pub fn badge_text(count: u64) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_MAX => Some(format!("{BADGE_MAX}+")),
        n => Some(n.to_string()),
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i64,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i64,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i64,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart panel overlay fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_panel.html")]
pub struct CartPanelTemplate {
    pub cart: CartView,
    pub notice: Option<String>,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub badge: Option<String>,
}

fn panel_for(state: &AppState, cart: &CartState) -> CartPanelTemplate {
    CartPanelTemplate {
        cart: CartView::new(cart, state.config().currency),
        notice: None,
    }
}

/// Whether the visitor has an order being placed. Cart lines stay frozen
/// until it settles.
async fn order_in_flight(session: &Session) -> Result<bool> {
    Ok(CheckoutService::new(session.clone())
        .order_in_flight()
        .await?)
}

/// Unchanged panel explaining why a line change was refused.
async fn frozen_panel(state: &AppState, session: Session) -> Result<Response> {
    tracing::info!("Cart change refused while an order is placed");
    let cart = CartStore::new(session).load().await?;
    let mut panel = panel_for(state, &cart);
    panel.cart.is_open = true;
    panel.notice = Some(ORDER_IN_FLIGHT.to_string());
    Ok(panel.into_response())
}

/// Panel fragment with the `cart-updated` trigger.
fn updated_panel(state: &AppState, cart: &CartState) -> Response {
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        panel_for(state, cart),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart panel.
#[instrument(skip(state, session))]
pub async fn panel(State(state): State<AppState>, session: Session) -> Result<CartPanelTemplate> {
    let cart = CartStore::new(session).load().await?;
    Ok(panel_for(&state, &cart))
}

/// Get the cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<CartCountTemplate> {
    let cart = CartStore::new(session).load().await?;
    Ok(CartCountTemplate {
        badge: badge_text(cart.total_items()),
    })
}

/// Open or close the cart panel.
#[instrument(skip(state, session))]
pub async fn toggle(State(state): State<AppState>, session: Session) -> Result<CartPanelTemplate> {
    let cart = CartStore::new(session).dispatch(CartAction::ToggleCart).await?;
    Ok(panel_for(&state, &cart))
}

/// Add one unit of a product.
///
/// Returns the updated badge and triggers `cart-updated` so the panel and any
/// open product overlay refresh. When the product cannot be added, the
/// product overlay is re-rendered with the reason instead.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);
    let product = match state.catalog().get_product(id).await {
        Ok(product) => product,
        Err(e) => return Ok(into_modal(ProductModalTemplate::failed(id, &e))),
    };

    if order_in_flight(&session).await? {
        tracing::info!(product_id = %id, "Add refused while an order is placed");
        let in_cart = CartStore::new(session).load().await?.contains(id);
        let mut modal = ProductModalTemplate::loaded(&product, &state, in_cart);
        modal.notice = Some(ORDER_IN_FLIGHT.to_string());
        return Ok(into_modal(modal));
    }

    let cart = CartStore::new(session)
        .dispatch(CartAction::AddItem(product))
        .await?;

    let product_id = form.product_id.to_string();
    add_breadcrumb("cart", "Added item", Some(&[("product_id", product_id.as_str())]));

    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartCountTemplate {
            badge: badge_text(cart.total_items()),
        },
    )
        .into_response())
}

/// Set a line's quantity. Zero or less removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    if order_in_flight(&session).await? {
        return frozen_panel(&state, session).await;
    }
    let cart = CartStore::new(session)
        .dispatch(CartAction::UpdateQuantity {
            id: ProductId::new(form.product_id),
            quantity: form.quantity,
        })
        .await?;
    Ok(updated_panel(&state, &cart))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    if order_in_flight(&session).await? {
        return frozen_panel(&state, session).await;
    }
    let cart = CartStore::new(session)
        .dispatch(CartAction::RemoveItem(ProductId::new(form.product_id)))
        .await?;
    Ok(updated_panel(&state, &cart))
}
