//! Catalog service client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP (`GET /products`, `GET /products/{id}`)
//! - The catalog service is the source of truth, nothing is stored locally
//! - In-memory caching via `moka` for responses (TTL from config)
//!
//! # Example
//!
//! ```rust,ignore
//! use scoder_storefront::catalog::CatalogClient;
//!
//! let client = CatalogClient::new(&config.catalog)?;
//! let products = client.get_products().await?;
//! let product = client.get_product(products[0].id).await?;
//! ```

mod cache;

use std::sync::Arc;

use moka::future::Cache;
use scoder_core::{Product, ProductId};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CatalogConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("catalog returned status {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// No product with this id.
    #[error("Product not found: {0}")]
    NotFound(ProductId),
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the catalog service.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// GET a path and return the body of a successful response.
    async fn fetch(&self, path: &str) -> Result<String, CatalogError> {
        let url = format!("{}{path}", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, url = %url, "Catalog returned non-success status");
            return Err(CatalogError::Status(status));
        }

        Ok(response.text().await?)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the service answers with a
    /// non-success status, or the body is not a product list.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let body = self.fetch("/products").await?;
        let products: Vec<Product> = serde_json::from_str(&body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse product list"
            );
        })?;

        debug!(count = products.len(), "Fetched products");
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product by id.
    ///
    /// Served from the cached product list when it is warm.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when the service has no such product
    /// (it answers unknown ids with an empty or `null` body), or another
    /// error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(CacheValue::Product(product)) =
            self.inner.cache.get(&CacheKey::Product(id)).await
        {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
            && let Some(product) = products.into_iter().find(|p| p.id == id)
        {
            debug!("Product found in cached list");
            return Ok(product);
        }

        let body = self.fetch(&format!("/products/{id}")).await?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(CatalogError::NotFound(id));
        }

        let product: Product = serde_json::from_str(trimmed)?;
        self.inner
            .cache
            .insert(CacheKey::Product(id), CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    use super::*;

    fn client_for(server: &MockServer) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url: Url::parse(&server.base_url()).unwrap(),
            cache_ttl: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn product_json(id: i64, price: f64) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Product {id}"),
            "price": price,
            "description": "A product",
            "category": "electronics",
            "image": "https://example.com/img.jpg",
            "rating": { "rate": 4.1, "count": 259 }
        })
    }

    #[tokio::test]
    async fn test_get_products_is_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(200)
                    .json_body(json!([product_json(1, 109.95), product_json(2, 22.3)]));
            })
            .await;

        let client = client_for(&server);
        let first = client.get_products().await.unwrap();
        let second = client.get_products().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_get_product_uses_cached_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(200).json_body(json!([product_json(3, 55.99)]));
            })
            .await;
        let detail = server
            .mock_async(|when, then| {
                when.method(GET).path("/products/3");
                then.status(200).json_body(product_json(3, 55.99));
            })
            .await;

        let client = client_for(&server);
        client.get_products().await.unwrap();
        let product = client.get_product(ProductId::new(3)).await.unwrap();

        assert_eq!(product.title, "Product 3");
        detail.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_get_product_null_body_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/999");
                then.status(200).body("null");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/998");
                then.status(200).body("");
            })
            .await;

        let client = client_for(&server);
        for id in [999, 998] {
            let err = client.get_product(ProductId::new(id)).await.unwrap_err();
            assert!(matches!(err, CatalogError::NotFound(found) if found.as_i64() == id));
        }
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(503).body("unavailable");
            })
            .await;

        let err = client_for(&server).get_products().await.unwrap_err();
        assert!(
            matches!(err, CatalogError::Status(status) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(200).body("{\"not\": \"a list\"}");
            })
            .await;

        let err = client_for(&server).get_products().await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let server = MockServer::start_async().await;
        let mut failing = server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(500);
            })
            .await;

        let client = client_for(&server);
        assert!(client.get_products().await.is_err());

        failing.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products");
                then.status(200).json_body(json!([product_json(1, 10.0)]));
            })
            .await;

        assert_eq!(client.get_products().await.unwrap().len(), 1);
    }
}
