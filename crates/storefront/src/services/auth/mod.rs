//! Authentication service.
//!
//! Exchanges credentials for a token at the catalog service's
//! `POST /auth/login` endpoint.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use scoder_core::LoginInfo;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use crate::config::CatalogConfig;
use crate::models::{AuthSession, UserProfile};

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Client for the login endpoint.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    login_url: String,
}

impl AuthClient {
    /// Create a new auth client against the catalog service.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let login_url = format!(
            "{}/auth/login",
            config.base_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            inner: Arc::new(AuthClientInner { client, login_url }),
        })
    }

    /// Log in with validated credentials.
    ///
    /// The service returns only a token, so the session carries a
    /// placeholder profile built from the username.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the service rejects the
    /// credentials, or another variant when it cannot be reached or answers
    /// unexpectedly.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &LoginInfo) -> Result<AuthSession, AuthError> {
        let response = self
            .inner
            .client
            .post(&self.inner.login_url)
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            tracing::info!(status = %status, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AuthError::UnexpectedResponse(format!("status {status}")));
        }

        let body = response.text().await?;
        let TokenResponse { token } = serde_json::from_str(&body)
            .map_err(|e| AuthError::UnexpectedResponse(e.to_string()))?;
        if token.is_empty() {
            return Err(AuthError::UnexpectedResponse("empty token".to_string()));
        }

        tracing::info!("Login succeeded");
        Ok(AuthSession::new(
            SecretString::from(token),
            UserProfile::placeholder(&credentials.username),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use url::Url;

    use super::*;

    fn client_for(server: &MockServer) -> AuthClient {
        AuthClient::new(&CatalogConfig {
            base_url: Url::parse(&server.base_url()).unwrap(),
            cache_ttl: Duration::from_secs(60),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn credentials() -> LoginInfo {
        LoginInfo {
            username: "mor_2314".to_string(),
            password: "83r5^_".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/auth/login")
                    .json_body(json!({ "username": "mor_2314", "password": "83r5^_" }));
                then.status(200).json_body(json!({ "token": "tok-123" }));
            })
            .await;

        let session = client_for(&server).login(&credentials()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.token.expose_secret(), "tok-123");
        assert_eq!(session.user.username, "mor_2314");
        assert_eq!(session.user.name.lastname, "Doe");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(401).body("username or password is incorrect");
            })
            .await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(502);
            })
            .await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::UnexpectedResponse(_)));
    }

    #[tokio::test]
    async fn test_login_missing_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/login");
                then.status(200).json_body(json!({ "status": "ok" }));
            })
            .await;

        let err = client_for(&server).login(&credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::UnexpectedResponse(_)));
    }
}
