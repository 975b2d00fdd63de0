//! # Credential Repository
//!
//! Access and refresh tokens for the remote API. Stored like any other
//! document; the sync crate only ever asks "is there an access token".

use tracing::info;

use crate::error::DbResult;
use crate::repository::keys;
use crate::repository::kv::KvRepository;

#[derive(Debug, Clone)]
pub struct CredentialRepository {
    kv: KvRepository,
}

impl CredentialRepository {
    pub fn new(kv: KvRepository) -> Self {
        CredentialRepository { kv }
    }

    /// Stores a new token pair. A missing refresh token removes any old one.
    pub async fn save_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> DbResult<()> {
        self.kv.set_json(keys::AUTH_TOKEN, access_token).await?;

        match refresh_token {
            Some(token) => self.kv.set_json(keys::REFRESH_TOKEN, token).await?,
            None => {
                self.kv.delete(keys::REFRESH_TOKEN).await?;
            }
        }

        info!("Stored auth tokens");
        Ok(())
    }

    pub async fn access_token(&self) -> DbResult<Option<String>> {
        self.kv.get_json(keys::AUTH_TOKEN).await
    }

    pub async fn refresh_token(&self) -> DbResult<Option<String>> {
        self.kv.get_json(keys::REFRESH_TOKEN).await
    }

    pub async fn clear_tokens(&self) -> DbResult<()> {
        self.kv.delete(keys::AUTH_TOKEN).await?;
        self.kv.delete(keys::REFRESH_TOKEN).await?;
        info!("Cleared auth tokens");
        Ok(())
    }
}
