//! Access token storage
//!
//! The optional inference API token lives in the `settings` table under a
//! fixed key and is mirrored in memory. At most one token is stored.

use rsa_common::db::settings::{delete_setting, get_setting, set_setting};
use rsa_common::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Settings key holding the token
pub const TOKEN_SETTING_KEY: &str = "hf_api_token";

#[derive(Clone)]
pub struct CredentialStore {
    db: SqlitePool,
    token: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Store the trimmed token, or remove it when the input is blank
    ///
    /// **Returns:** the token now held, if any. Contents are not validated.
    pub async fn save(&self, input: &str) -> Result<Option<String>> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            let removed = delete_setting(&self.db, TOKEN_SETTING_KEY).await?;
            *self.token.write().await = None;
            if removed {
                info!("Access token cleared");
            }
            return Ok(None);
        }

        set_setting(&self.db, TOKEN_SETTING_KEY, trimmed).await?;
        *self.token.write().await = Some(trimmed.to_string());
        info!("Access token saved");
        Ok(Some(trimmed.to_string()))
    }

    /// Read the persisted token into memory (startup)
    pub async fn load_saved(&self) -> Result<Option<String>> {
        let saved: Option<String> = get_setting(&self.db, TOKEN_SETTING_KEY).await?;
        let saved = saved.filter(|token| !token.is_empty());
        debug!(present = saved.is_some(), "Loaded saved access token");
        *self.token.write().await = saved.clone();
        Ok(saved)
    }

    /// Token currently in memory
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}
