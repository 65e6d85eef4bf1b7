//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{AppendHeaders, IntoResponse, Response},
};
use scoder_core::{Product, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::CatalogError;
use crate::error::Result;
use crate::filters;
use crate::routes::format_money;
use crate::services::cart::CartStore;
use crate::state::AppState;

/// Product detail display data.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: String,
    pub price: String,
    pub rating: String,
    pub rating_count: u32,
}

impl ProductDetailView {
    fn new(product: &Product, state: &AppState) -> Self {
        Self {
            id: product.id.as_i64(),
            title: product.title.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            image: product.image.clone(),
            price: format_money(product.price, state.config().currency),
            rating: format!("{:.1}", product.rating.rate),
            rating_count: product.rating.count,
        }
    }
}

/// Product detail overlay fragment.
///
/// Without a product it shows why the product could not be loaded, with a
/// retry button when the failure may pass.
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_modal.html")]
pub struct ProductModalTemplate {
    pub product_id: i64,
    pub product: Option<ProductDetailView>,
    pub in_cart: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub can_retry: bool,
}

impl ProductModalTemplate {
    pub(crate) fn loaded(product: &Product, state: &AppState, in_cart: bool) -> Self {
        Self {
            product_id: product.id.as_i64(),
            product: Some(ProductDetailView::new(product, state)),
            in_cart,
            notice: None,
            error: None,
            can_retry: false,
        }
    }

    pub(crate) fn failed(id: ProductId, err: &CatalogError) -> Self {
        let (message, can_retry) = match err {
            CatalogError::NotFound(_) => ("Product not found.", false),
            _ => {
                tracing::warn!(error = %err, product_id = %id, "Product detail unavailable");
                ("Error loading product data.", true)
            }
        };
        Self {
            product_id: id.as_i64(),
            product: None,
            in_cart: false,
            notice: None,
            error: Some(message.to_string()),
            can_retry,
        }
    }
}

/// Swap a modal fragment into the product overlay, whatever the request
/// targeted.
pub(crate) fn into_modal(template: ProductModalTemplate) -> Response {
    (
        AppendHeaders([("HX-Retarget", "#product-modal"), ("HX-Reswap", "innerHTML")]),
        template,
    )
        .into_response()
}

/// Display the product detail overlay.
///
/// "Add to Cart" is replaced by a disabled "In Cart" once the product is in
/// the visitor's cart. A failed fetch renders inside the overlay.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<ProductModalTemplate> {
    let id = ProductId::new(id);
    let product = match state.catalog().get_product(id).await {
        Ok(product) => product,
        Err(e) => return Ok(ProductModalTemplate::failed(id, &e)),
    };
    let cart = CartStore::new(session).load().await?;

    Ok(ProductModalTemplate::loaded(&product, &state, cart.contains(id)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use httpmock::prelude::*;

    use crate::routes::test_support::{TestApp, product_json};

    #[tokio::test]
    async fn test_modal_switches_to_in_cart() {
        let app = TestApp::start().await;
        app.server
            .mock_async(|when, then| {
                when.method(GET).path("/products/5");
                then.status(200).json_body(product_json(5, 695.0));
            })
            .await;

        let modal = app.get("/products/5").await;
        assert_eq!(modal.status, StatusCode::OK);
        assert!(modal.body.contains("Add to Cart"));
        assert!(modal.body.contains("R$ 695,00"));
        assert!(modal.body.contains("Electronics"));

        app.post_form("/cart/add", "product_id=5").await;
        let modal = app.get("/products/5").await;
        assert!(modal.body.contains("In Cart"));
        assert!(!modal.body.contains("Add to Cart"));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let app = TestApp::start().await;
        app.server
            .mock_async(|when, then| {
                when.method(GET).path("/products/404");
                then.status(200).body("null");
            })
            .await;

        let modal = app.get("/products/404").await;
        assert_eq!(modal.status, StatusCode::OK);
        assert!(modal.body.contains("Product not found."));
        assert!(!modal.body.contains("Try again"));
        assert!(!modal.body.contains("Add to Cart"));
    }

    #[tokio::test]
    async fn test_catalog_failure_renders_in_modal_with_retry() {
        let app = TestApp::start().await;
        app.server
            .mock_async(|when, then| {
                when.method(GET).path("/products/3");
                then.status(500);
            })
            .await;

        let modal = app.get("/products/3").await;
        assert_eq!(modal.status, StatusCode::OK);
        assert!(modal.body.contains("Error loading product data."));
        assert!(modal.body.contains(r#"hx-get="/products/3""#));
        assert!(modal.body.contains("Try again"));
    }
}
