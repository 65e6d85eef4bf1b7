//! Integration test harness for the Scoder storefront.
//!
//! [`TestContext::start`] serves the real router on an ephemeral port, backed
//! by an `httpmock` stand-in for the catalog service, and returns a
//! cookie-keeping `reqwest` client so a test can walk through the site like
//! a browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p scoder-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use reqwest::{Client, redirect::Policy};
use scoder_core::CurrencyCode;
use scoder_storefront::config::{CatalogConfig, CheckoutConfig, StorefrontConfig};
use scoder_storefront::services::checkout::{OrderSubmitter, SimulatedOrderSubmitter};
use scoder_storefront::state::AppState;
use serde_json::{Value, json};
use url::Url;

/// Demo credentials accepted by the mocked login endpoint.
pub const USERNAME: &str = "mor_2314";
pub const PASSWORD: &str = "83r5^_";

/// A running storefront plus its mocked catalog service.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub catalog: MockServer,
}

impl TestContext {
    /// Start with the simulated order submitter and a short order delay.
    pub async fn start() -> Self {
        Self::start_with(Arc::new(SimulatedOrderSubmitter::new(Duration::from_millis(
            50,
        ))))
        .await
    }

    /// Start with a custom order submitter.
    pub async fn start_with(orders: Arc<dyn OrderSubmitter>) -> Self {
        let catalog = MockServer::start_async().await;
        let config = config_for(&catalog.base_url());
        let state = AppState::with_order_submitter(config, orders)
            .expect("Failed to build application state");

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let app = scoder_storefront::app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{addr}"),
            catalog,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a page as HTMX would, returning status, headers and body.
    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, reqwest::header::HeaderMap, String) {
        let response = self
            .client
            .get(self.url(path))
            .header("hx-request", "true")
            .send()
            .await
            .expect("GET failed");
        split(response).await
    }

    /// POST a form as HTMX would, returning status, headers and body.
    pub async fn post(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> (reqwest::StatusCode, reqwest::header::HeaderMap, String) {
        let response = self
            .client
            .post(self.url(path))
            .header("hx-request", "true")
            .form(form)
            .send()
            .await
            .expect("POST failed");
        split(response).await
    }

    /// Serve `products` from the mocked catalog, list and detail endpoints.
    pub async fn mock_products(&self, products: &[Value]) {
        let list = Value::Array(products.to_vec());
        self.catalog
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(200).json_body(list);
            })
            .await;

        for product in products {
            let id = product["id"].as_i64().expect("product id");
            let body = product.clone();
            self.catalog
                .mock_async(|when, then| {
                    when.method(GET).path(format!("/products/{id}"));
                    then.status(200).json_body(body);
                })
                .await;
        }
    }

    /// Log in with the demo account against a mocked login endpoint.
    pub async fn login(&self) {
        self.catalog
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/login")
                    .json_body(json!({ "username": USERNAME, "password": PASSWORD }));
                then.status(200).json_body(json!({ "token": "integration-token" }));
            })
            .await;

        let (status, headers, _) = self
            .post("/auth/login", &[("username", USERNAME), ("password", PASSWORD)])
            .await;
        assert_eq!(status, reqwest::StatusCode::SEE_OTHER);
        assert_eq!(headers["location"], "/");
    }
}

async fn split(
    response: reqwest::Response,
) -> (reqwest::StatusCode, reqwest::header::HeaderMap, String) {
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.text().await.expect("Failed to read body");
    (status, headers, body)
}

fn config_for(catalog_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost".to_string(),
        currency: CurrencyCode::BRL,
        catalog: CatalogConfig {
            base_url: Url::parse(catalog_url).expect("Invalid mock URL"),
            cache_ttl: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
        },
        checkout: CheckoutConfig {
            order_delay: Duration::from_millis(50),
            success_display: Duration::from_millis(3000),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Catalog JSON for a product.
#[must_use]
pub fn product(id: i64, title: &str, price: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "price": price,
        "description": format!("{title} description"),
        "category": "men's clothing",
        "image": format!("https://fakestoreapi.com/img/{id}.jpg"),
        "rating": { "rate": 3.9, "count": 120 }
    })
}
