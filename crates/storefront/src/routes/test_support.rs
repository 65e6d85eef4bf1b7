//! Router harness for handler tests.
//!
//! Drives the full router with `oneshot`, against an `httpmock` catalog
//! service, carrying the session cookie between requests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use httpmock::prelude::*;
use scoder_core::CurrencyCode;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

use crate::config::{CatalogConfig, CheckoutConfig, StorefrontConfig};
use crate::state::AppState;

pub fn test_config(catalog_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        currency: CurrencyCode::BRL,
        catalog: CatalogConfig {
            base_url: Url::parse(catalog_url).unwrap(),
            cache_ttl: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
        },
        checkout: CheckoutConfig {
            order_delay: Duration::from_millis(10),
            success_display: Duration::from_millis(3000),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

pub fn product_json(id: i64, price: f64) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "price": price,
        "description": "A product",
        "category": "electronics",
        "image": format!("https://example.com/{id}.jpg"),
        "rating": { "rate": 4.5, "count": 10 }
    })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct TestApp {
    pub server: MockServer,
    router: Router,
    cookie: Mutex<Option<String>>,
}

impl TestApp {
    pub async fn start() -> Self {
        Self::with_order_delay(Duration::from_millis(10)).await
    }

    pub async fn with_order_delay(delay: Duration) -> Self {
        let server = MockServer::start_async().await;
        let mut config = test_config(&server.base_url());
        config.checkout.order_delay = delay;
        let state = AppState::new(config).unwrap();
        Self {
            router: crate::app(state),
            server,
            cookie: Mutex::new(None),
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            *self.cookie.lock().unwrap() = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("hx-request", "true");
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Log in with the demo account against a mocked login endpoint.
    pub async fn login(&self) -> TestResponse {
        self.server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(200).json_body(json!({ "token": "test-token" }));
            })
            .await;
        self.post_form("/auth/login", "username=mor_2314&password=83r5%5E_")
            .await
    }
}
