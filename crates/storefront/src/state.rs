//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{CatalogClient, CatalogError};
use crate::config::StorefrontConfig;
use crate::services::auth::{AuthClient, AuthError};
use crate::services::checkout::{OrderSubmitter, SimulatedOrderSubmitter};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("auth client: {0}")]
    Auth(#[from] AuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// upstream clients, the order submitter and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogClient,
    auth: AuthClient,
    orders: Arc<dyn OrderSubmitter>,
}

impl AppState {
    /// Create a new application state with the simulated order submitter.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let orders = Arc::new(SimulatedOrderSubmitter::new(config.checkout.order_delay));
        Self::with_order_submitter(config, orders)
    }

    /// Create a new application state with a custom order submitter.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn with_order_submitter(
        config: StorefrontConfig,
        orders: Arc<dyn OrderSubmitter>,
    ) -> Result<Self, StateError> {
        let catalog = CatalogClient::new(&config.catalog)?;
        let auth = AuthClient::new(&config.catalog)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                auth,
                orders,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    /// Get a reference to the auth client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a shared handle to the order submitter.
    #[must_use]
    pub fn orders(&self) -> Arc<dyn OrderSubmitter> {
        Arc::clone(&self.inner.orders)
    }
}
