//! Per-visitor session storage.
//!
//! Handlers reach the visitor's session through [`SessionStorage`], a small
//! key/value seam implemented by `tower_sessions::Session` in production and
//! by [`MemoryStorage`] in tests. [`SessionRepository`] keeps the
//! authenticated session under two entries, `token` and `user`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;

use crate::models::{AuthSession, UserProfile, session_keys};

/// Errors from the session backend.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session store failed.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),

    /// A value could not be encoded for storage.
    #[error("session encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key/value access to one visitor's session.
pub trait SessionStorage: Send + Sync {
    /// Read the value under `key`.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Value>, SessionError>> + Send;

    /// Replace the value under `key`.
    fn write(&self, key: &str, value: Value)
    -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Remove the value under `key`, if any.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Persist pending changes now instead of at the end of the request.
    fn flush(&self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

impl SessionStorage for Session {
    async fn read(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.get_value(key).await?)
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.insert_value(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.remove_value(key).await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), SessionError> {
        Ok(self.save().await?)
    }
}

/// In-memory session storage.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry exists under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

impl SessionStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<Value>, SessionError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), SessionError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn flush(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

// =============================================================================
// SessionRepository
// =============================================================================

/// Loads, saves and clears the authenticated session.
pub struct SessionRepository<S> {
    storage: S,
}

impl<S: SessionStorage> SessionRepository<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the authenticated session.
    ///
    /// Returns `None` when logged out. When only one entry exists, or either
    /// entry does not decode, both entries are removed and the visitor is
    /// treated as logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(&self) -> Result<Option<AuthSession>, SessionError> {
        let token = self.storage.read(session_keys::TOKEN).await?;
        let user = self.storage.read(session_keys::USER).await?;

        let (token, user) = match (token, user) {
            (None, None) => return Ok(None),
            (Some(token), Some(user)) => (token, user),
            _ => {
                tracing::warn!("Incomplete auth session, discarding");
                self.clear().await?;
                return Ok(None);
            }
        };

        match decode(token, &user) {
            Ok(session) => Ok(Some(session)),
            Err(reason) => {
                tracing::warn!(reason, "Corrupt auth session, discarding");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    /// Store an authenticated session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be encoded or the store fails.
    pub async fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        let user = serde_json::to_string(&session.user)?;
        self.storage
            .write(
                session_keys::TOKEN,
                Value::String(session.token.expose_secret().to_string()),
            )
            .await?;
        self.storage
            .write(session_keys::USER, Value::String(user))
            .await
    }

    /// Remove both session entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.storage.delete(session_keys::TOKEN).await?;
        self.storage.delete(session_keys::USER).await
    }
}

fn decode(token: Value, user: &Value) -> Result<AuthSession, &'static str> {
    let Value::String(token) = token else {
        return Err("token is not a string");
    };
    let Value::String(user) = user else {
        return Err("user is not a string");
    };
    if token.is_empty() {
        return Err("token is empty");
    }
    let user: UserProfile = serde_json::from_str(user).map_err(|_| "user does not parse")?;
    Ok(AuthSession::new(SecretString::from(token), user))
}
