//! Session store
//!
//! Owns the auth token and the cached user profile. Both live in a
//! [`KeyValueStore`] under fixed keys and are always written or cleared
//! together.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::model::{Session, User};
use super::storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
use crate::error::Error;
use crate::Result;

pub const TOKEN_KEY: &str = "taskflux_token";
pub const USER_KEY: &str = "taskflux_user";

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Cheap-to-clone handle to the process-wide session
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    /// Serializes writers so a clear never interleaves with a profile refresh
    write_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Session that is forgotten when the process exits
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Session persisted to a JSON file
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let storage = FileKeyValueStore::open(path).await?;
        Ok(Self::new(Arc::new(storage)))
    }

    /// Store a token and its user in one write
    pub async fn set_session(&self, token: &str, user: &User) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidInput("Session token cannot be empty".into()));
        }
        let user_json = serde_json::to_string(user)?;

        let _guard = self.write_lock.lock().await;
        self.storage
            .set_many(&[(TOKEN_KEY, token.to_string()), (USER_KEY, user_json)])
            .await?;
        info!("Session started for {}", user.email);
        Ok(())
    }

    /// Refresh the cached profile of the current session
    ///
    /// Returns `false` without writing when there is no token.
    pub async fn update_user(&self, user: &User) -> Result<bool> {
        let user_json = serde_json::to_string(user)?;

        let _guard = self.write_lock.lock().await;
        if self.read_token().await.is_none() {
            warn!("Ignoring profile update without an active session");
            return Ok(false);
        }
        self.storage.set_many(&[(USER_KEY, user_json)]).await?;
        Ok(true)
    }

    /// Remove the token and user together
    pub async fn clear_session(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY]).await?;
        info!("Session cleared");
        Ok(())
    }

    /// Current token, or an empty string when signed out
    pub async fn token(&self) -> String {
        self.read_token().await.unwrap_or_default()
    }

    /// Current user, or `None` when signed out or the stored profile is unreadable
    pub async fn user(&self) -> Option<User> {
        self.read_token().await?;

        let raw = match self.storage.get(USER_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read stored user: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring malformed stored user: {}", e);
                None
            }
        }
    }

    /// Token and user, when both are present
    pub async fn session(&self) -> Option<Session> {
        let token = self.read_token().await?;
        let user = self.user().await?;
        Some(Session { token, user })
    }

    pub async fn is_authenticated(&self) -> bool {
        self.read_token().await.is_some()
    }

    /// Expiry of the current token, read from its `exp` claim
    ///
    /// The signature is not checked; the client never holds the signing key.
    /// Tokens that are not JWTs, or carry no `exp`, have no known expiry.
    pub async fn token_expiry(&self) -> Option<DateTime<Utc>> {
        let token = self.read_token().await?;
        token_expiry(&token)
    }

    pub async fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expiry().await.is_some_and(|expiry| expiry <= now)
    }

    async fn read_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(e) => {
                warn!("Failed to read stored token: {}", e);
                None
            }
        }
    }
}

fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    Utc.timestamp_opt(data.claims.exp?, 0).single()
}
