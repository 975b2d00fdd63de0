//! # Auth Session
//!
//! Exposes "is the user signed in" as a reactive boolean for the engines,
//! backed by an opaque credential store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  restore() ── token present? ──┐                                        │
//! │  login(tokens) ────────────────┼──► watch<bool> ──► SyncedSave watcher │
//! │  logout() ─────────────────────┘                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CredentialStore (liftlog-db CredentialRepository in production)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use liftlog_db::CredentialRepository;

use crate::error::SyncResult;

// =============================================================================
// Credential Store
// =============================================================================

/// Durable token storage.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn save_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> SyncResult<()>;

    async fn access_token(&self) -> SyncResult<Option<String>>;

    async fn refresh_token(&self) -> SyncResult<Option<String>>;

    async fn clear_tokens(&self) -> SyncResult<()>;
}

#[async_trait]
impl CredentialStore for CredentialRepository {
    async fn save_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> SyncResult<()> {
        Ok(CredentialRepository::save_tokens(self, access_token, refresh_token).await?)
    }

    async fn access_token(&self) -> SyncResult<Option<String>> {
        Ok(CredentialRepository::access_token(self).await?)
    }

    async fn refresh_token(&self) -> SyncResult<Option<String>> {
        Ok(CredentialRepository::refresh_token(self).await?)
    }

    async fn clear_tokens(&self) -> SyncResult<()> {
        Ok(CredentialRepository::clear_tokens(self).await?)
    }
}

// =============================================================================
// Auth Session
// =============================================================================

/// Signed-in state shared by every engine instance.
#[derive(Clone)]
pub struct AuthSession {
    store: Arc<dyn CredentialStore>,
    tx: Arc<watch::Sender<bool>>,
}

impl AuthSession {
    /// Creates a signed-out session. Call [`restore`](Self::restore) to pick
    /// up a stored token.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (tx, _) = watch::channel(false);
        AuthSession {
            store,
            tx: Arc::new(tx),
        }
    }

    /// Marks the session authenticated iff an access token is stored.
    pub async fn restore(&self) -> SyncResult<bool> {
        let authenticated = self.store.access_token().await?.is_some();
        self.publish(authenticated);
        Ok(authenticated)
    }

    /// Stores tokens and flips the session to authenticated.
    pub async fn login(&self, access_token: &str, refresh_token: Option<&str>) -> SyncResult<()> {
        self.store.save_tokens(access_token, refresh_token).await?;
        self.publish(true);
        info!("Signed in");
        Ok(())
    }

    /// Clears tokens and flips the session to signed out.
    pub async fn logout(&self) -> SyncResult<()> {
        self.store.clear_tokens().await?;
        self.publish(false);
        info!("Signed out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// The credential store, for the API client's bearer token.
    pub fn store(&self) -> Arc<dyn CredentialStore> {
        self.store.clone()
    }

    fn publish(&self, authenticated: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != authenticated;
            *current = authenticated;
            changed
        });
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
