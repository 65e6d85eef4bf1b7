//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use scoder_core::{CurrencyCode, Product, format::truncate_text};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::CurrentUser;
use crate::routes::format_money;
use crate::state::AppState;

/// Titles longer than this are cut on product cards.
const CARD_TITLE_MAX: usize = 40;

/// Product card display data.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i64,
    pub title: String,
    pub short_title: String,
    pub category: String,
    pub image: String,
    pub price: String,
    pub rating: String,
    pub rating_count: u32,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        Self {
            id: product.id.as_i64(),
            title: product.title.clone(),
            short_title: truncate_text(&product.title, CARD_TITLE_MAX),
            category: product.category.clone(),
            image: product.image.clone(),
            price: format_money(product.price, currency),
            rating: format!("{:.1}", product.rating.rate),
            rating_count: product.rating.count,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user_name: Option<String>,
    pub products: Vec<ProductCardView>,
    pub error: Option<String>,
}

/// Display the home page.
///
/// A catalog failure renders the page with the error and a retry button
/// instead of failing the request.
#[instrument(skip(state, user))]
pub async fn home(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> HomeTemplate {
    let currency = state.config().currency;
    let (products, error) = match state.catalog().get_products().await {
        Ok(products) => (
            products
                .iter()
                .map(|p| ProductCardView::new(p, currency))
                .collect(),
            None,
        ),
        Err(e) => {
            let err = AppError::from(e);
            tracing::warn!(error = %err, "Product list unavailable");
            (Vec::new(), Some(err.user_message()))
        }
    };

    HomeTemplate {
        user_name: user.map(|u| u.display_name().to_string()),
        products,
        error,
    }
}

/// Liveness health check endpoint.
pub async fn health() -> impl IntoResponse {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::routes::test_support::{TestApp, product_json};

    #[tokio::test]
    async fn test_home_lists_products() {
        let app = TestApp::start().await;
        app.server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(200)
                    .json_body(json!([product_json(1, 109.95), product_json(2, 22.3)]));
            })
            .await;

        let page = app.get("/").await;
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("Product 1"));
        assert!(page.body.contains("R$ 109,95"));
        assert!(page.body.contains("R$ 22,30"));
        assert!(page.body.contains("/auth/login"));
    }

    #[tokio::test]
    async fn test_catalog_failure_shows_retry() {
        let app = TestApp::start().await;
        app.server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(500);
            })
            .await;

        let page = app.get("/").await;
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("Failed to fetch products"));
        assert!(page.body.contains("Try again"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::start().await;
        let response = app.get("/health").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "ok");
    }
}
