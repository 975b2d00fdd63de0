use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use liftlog_core::StoredWorkout;
use liftlog_db::{Database, LocalStore, PendingSlot};

use crate::adapter::SyncAdapter;
use crate::api::WorkoutRemote;
use crate::error::SyncResult;
use crate::protocol::{SyncWorkoutRequest, SyncWorkoutResponse};

/// Syncs logged rest days. Same endpoint as workouts, separate slot, no
/// history to update.
#[derive(Clone)]
pub struct RestDaySyncAdapter {
    slot: PendingSlot<StoredWorkout>,
    store: LocalStore,
    remote: Arc<dyn WorkoutRemote>,
}

impl RestDaySyncAdapter {
    pub fn new(slot: PendingSlot<StoredWorkout>, store: LocalStore, remote: Arc<dyn WorkoutRemote>) -> Self {
        RestDaySyncAdapter { slot, store, remote }
    }

    pub fn from_database(db: &Database, remote: Arc<dyn WorkoutRemote>) -> Self {
        Self::new(db.pending_rest_day(), db.local_store(), remote)
    }
}

#[async_trait]
impl SyncAdapter for RestDaySyncAdapter {
    type Local = StoredWorkout;
    type Remote = SyncWorkoutRequest;
    type Response = SyncWorkoutResponse;

    fn name(&self) -> &'static str {
        "rest_day"
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
        SyncWorkoutRequest::from_stored(local, local.start_time)
    }

    async fn sync_remote(&self, data: SyncWorkoutRequest) -> SyncResult<SyncWorkoutResponse> {
        self.remote.sync_workout(data).await
    }

    async fn last_sync_time(&self) -> SyncResult<Option<DateTime<Utc>>> {
        Ok(self.store.last_sync().await?)
    }

    async fn set_last_sync_time(&self, at: DateTime<Utc>) -> SyncResult<()> {
        Ok(self.store.set_last_sync(at).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog_core::{StoredSettings, WorkoutKind};
    use liftlog_db::DbConfig;

    struct Unreachable;

    #[async_trait]
    impl WorkoutRemote for Unreachable {
        async fn sync_workout(&self, _request: SyncWorkoutRequest) -> SyncResult<SyncWorkoutResponse> {
            Err(crate::error::SyncError::RequestFailed("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn test_rest_day_uses_its_own_slot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let adapter = RestDaySyncAdapter::from_database(&db, Arc::new(Unreachable));

        let rest = StoredWorkout::rest_day(&StoredSettings::default(), Utc::now());
        adapter.save_local(&rest).await.unwrap();

        assert!(db.pending_workout().get().await.unwrap().is_none());
        assert_eq!(db.pending_rest_day().get().await.unwrap(), Some(rest.clone()));

        let request = adapter.to_remote(&rest);
        assert_eq!(request.kind, WorkoutKind::Rest);
        assert_eq!(request.name.as_deref(), Some("Rest Day"));
        assert!(request.exercises.is_empty());
        assert_eq!(request.end_time, rest.start_time);
    }
}
