use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use liftlog_core::StoredWorkout;
use liftlog_db::{Database, LocalStore, PendingSlot};

use crate::adapter::SyncAdapter;
use crate::api::WorkoutRemote;
use crate::error::SyncResult;
use crate::protocol::{SyncWorkoutRequest, SyncWorkoutResponse};

/// Syncs finished workouts and feeds the server's previous-set echo back
/// into the local history cache.
#[derive(Clone)]
pub struct WorkoutSyncAdapter {
    slot: PendingSlot<StoredWorkout>,
    store: LocalStore,
    remote: Arc<dyn WorkoutRemote>,
}

impl WorkoutSyncAdapter {
    pub fn new(slot: PendingSlot<StoredWorkout>, store: LocalStore, remote: Arc<dyn WorkoutRemote>) -> Self {
        WorkoutSyncAdapter { slot, store, remote }
    }

    pub fn from_database(db: &Database, remote: Arc<dyn WorkoutRemote>) -> Self {
        Self::new(db.pending_workout(), db.local_store(), remote)
    }
}

#[async_trait]
impl SyncAdapter for WorkoutSyncAdapter {
    type Local = StoredWorkout;
    type Remote = SyncWorkoutRequest;
    type Response = SyncWorkoutResponse;

    fn name(&self) -> &'static str {
        "workout"
    }

    async fn get_pending(&self) -> SyncResult<Option<StoredWorkout>> {
        Ok(self.slot.get().await?)
    }

    async fn save_local(&self, data: &StoredWorkout) -> SyncResult<()> {
        Ok(self.slot.set(data).await?)
    }

    async fn clear_pending(&self) -> SyncResult<()> {
        Ok(self.slot.clear().await?)
    }

    fn to_remote(&self, local: &StoredWorkout) -> SyncWorkoutRequest {
        SyncWorkoutRequest::from_stored(local, Utc::now())
    }

    async fn sync_remote(&self, data: SyncWorkoutRequest) -> SyncResult<SyncWorkoutResponse> {
        self.remote.sync_workout(data).await
    }

    async fn on_sync_success(&self, response: &SyncWorkoutResponse, local: &StoredWorkout) -> SyncResult<()> {
        let history = response.previous_sets(Utc::now());
        debug!(
            workout_id = %local.id,
            server_id = response.id.as_deref().unwrap_or("-"),
            entries = history.len(),
            "Applying previous-set echo"
        );
        Ok(self.store.merge_previous_sets(history).await?)
    }

    async fn last_sync_time(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(self.store.last_sync().await?)
    }

    async fn set_last_sync_time(&self, at: DateTime<Utc>) -> SyncResult<()> {
        Ok(self.store.set_last_sync(at).await?)
    }
}
