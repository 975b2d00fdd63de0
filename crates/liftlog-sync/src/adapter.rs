//! # Sync Adapter
//!
//! The seam between the generic engine and one kind of data. An adapter
//! knows where its pending item lives, how to turn it into a request and
//! how to send it; the engine owns everything about when.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SyncAdapter                                    │
//! │                                                                         │
//! │  required                          optional (default: no-op)           │
//! │  ────────                          ─────────────────────────           │
//! │  get_pending    → Option<Local>    on_sync_success(response, local)    │
//! │  save_local     (durable write)    last_sync_time                      │
//! │  clear_pending                     set_last_sync_time                  │
//! │  to_remote      Local → Remote                                         │
//! │  sync_remote    Remote → Response                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SyncResult;

/// Binds the synced-save engine to one domain type.
#[async_trait]
pub trait SyncAdapter: Send + Sync + 'static {
    /// What is stored in the pending slot. Compared after a successful sync
    /// to detect a newer save that landed mid-flight.
    type Local: Clone + PartialEq + Send + Sync + 'static;

    /// Wire representation.
    type Remote: Send + 'static;

    /// What the server returns.
    type Response: Send + Sync + 'static;

    /// Short identifier used in logs and events.
    fn name(&self) -> &'static str;

    /// Reads the pending item, if any.
    async fn get_pending(&self) -> SyncResult<Option<Self::Local>>;

    /// Durably stores `data` as the pending item, replacing any previous one.
    async fn save_local(&self, data: &Self::Local) -> SyncResult<()>;

    /// Removes the pending item after a confirmed sync.
    async fn clear_pending(&self) -> SyncResult<()>;

    /// Pure transform to the wire shape.
    fn to_remote(&self, local: &Self::Local) -> Self::Remote;

    /// Performs the network call. No internal retries.
    async fn sync_remote(&self, data: Self::Remote) -> SyncResult<Self::Response>;

    /// Post-sync cache updates. A failure here does not undo the sync.
    async fn on_sync_success(&self, _response: &Self::Response, _local: &Self::Local) -> SyncResult<()> {
        Ok(())
    }

    async fn last_sync_time(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(None)
    }

    async fn set_last_sync_time(&self, _at: DateTime<Utc>) -> SyncResult<()> {
        Ok(())
    }
}
