//! # Workout Tracker
//!
//! The consumer side: edits the in-progress workout, persisting it after
//! every change, and hands finished workouts and rest days to their
//! engines.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  load() ── older than 24h? ──► capped ──► workouts.save()               │
//! │                                                                         │
//! │  start() ─► add_exercise / add_set / update_set / ... ─► current_workout│
//! │                                                           (persisted)   │
//! │  finish(name, gym) ─► workouts.stage()  ──► pending_workout slot        │
//! │                    ─► clear current_workout                             │
//! │                    ─► seed previous sets                                │
//! │                    ─► workouts.sync_staged()                            │
//! │                                                                         │
//! │  log_rest_day()    ─► rest_days.save()  ──► pending_rest_day slot       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use liftlog_core::{
    suggest_next_set, CoreError, CoreResult, PreviousSets, SetSuggestion, SetUpdate, StoredSet, StoredWorkout,
    WeightUnit,
};
use liftlog_db::LocalStore;

use crate::adapters::{RestDaySyncAdapter, WorkoutSyncAdapter};
use crate::engine::SyncedSave;
use crate::error::SyncResult;

/// What [`WorkoutTracker::load`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// No workout in progress.
    Idle,

    /// A workout is in progress and can be resumed.
    Active(StoredWorkout),

    /// The stored workout was too old; it was closed and queued for sync.
    Capped(StoredWorkout),
}

/// A workout or rest day handed to its engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Finished {
    pub workout: StoredWorkout,

    /// Synced during the call. False still means it is stored safely.
    pub synced: bool,
}

pub struct WorkoutTracker {
    store: LocalStore,
    workouts: SyncedSave<WorkoutSyncAdapter>,
    rest_days: SyncedSave<RestDaySyncAdapter>,
    edit: Mutex<()>,
}

impl WorkoutTracker {
    pub fn new(
        store: LocalStore,
        workouts: SyncedSave<WorkoutSyncAdapter>,
        rest_days: SyncedSave<RestDaySyncAdapter>,
    ) -> Self {
        WorkoutTracker {
            store,
            workouts,
            rest_days,
            edit: Mutex::new(()),
        }
    }

    pub fn workouts(&self) -> &SyncedSave<WorkoutSyncAdapter> {
        &self.workouts
    }

    pub fn rest_days(&self) -> &SyncedSave<RestDaySyncAdapter> {
        &self.rest_days
    }

    /// Picks up the stored in-progress workout, capping it if stale.
    pub async fn load(&self) -> SyncResult<LoadOutcome> {
        let _edit = self.edit.lock().await;

        let Some(current) = self.store.current_workout().await? else {
            return Ok(LoadOutcome::Idle);
        };

        if !current.is_stale(Utc::now()) {
            return Ok(LoadOutcome::Active(current));
        }

        info!(workout_id = %current.id, start_time = %current.start_time, "Capping stale workout");
        self.workouts.save(current.clone()).await?;
        self.store.clear_current_workout().await?;

        Ok(LoadOutcome::Capped(current))
    }

    pub async fn current(&self) -> SyncResult<Option<StoredWorkout>> {
        Ok(self.store.current_workout().await?)
    }

    pub async fn start(&self) -> SyncResult<StoredWorkout> {
        let _edit = self.edit.lock().await;

        if let Some(current) = self.store.current_workout().await? {
            return Err(CoreError::WorkoutInProgress(current.id).into());
        }

        let settings = self.store.settings().await?;
        let workout = StoredWorkout::start(&settings, Utc::now());
        self.store.save_current_workout(&workout).await?;

        info!(workout_id = %workout.id, "Workout started");
        Ok(workout)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub async fn add_exercise(
        &self,
        exercise_id: &str,
        exercise_name: &str,
        profile_id: Option<String>,
    ) -> SyncResult<StoredWorkout> {
        self.modify(|w| {
            w.add_exercise(exercise_id, exercise_name, profile_id);
            Ok(())
        })
        .await
        .map(|(workout, ())| workout)
    }

    pub async fn remove_exercise(&self, exercise_id: &str) -> SyncResult<StoredWorkout> {
        self.modify(|w| w.remove_exercise(exercise_id))
            .await
            .map(|(workout, ())| workout)
    }

    pub async fn reorder_exercises(&self, new_order: &[String]) -> SyncResult<StoredWorkout> {
        self.modify(|w| {
            w.reorder_exercises(new_order);
            Ok(())
        })
        .await
        .map(|(workout, ())| workout)
    }

    pub async fn add_set(
        &self,
        exercise_id: &str,
        reps: u32,
        weight: f64,
        weight_unit: WeightUnit,
    ) -> SyncResult<StoredSet> {
        self.modify(|w| w.add_set(exercise_id, reps, weight, weight_unit, Utc::now()))
            .await
            .map(|(_, set)| set)
    }

    pub async fn update_set(&self, exercise_id: &str, set_id: &str, update: SetUpdate) -> SyncResult<StoredWorkout> {
        self.modify(|w| w.update_set(exercise_id, set_id, update))
            .await
            .map(|(workout, ())| workout)
    }

    pub async fn remove_set(&self, exercise_id: &str, set_id: &str) -> SyncResult<StoredWorkout> {
        self.modify(|w| w.remove_set(exercise_id, set_id))
            .await
            .map(|(workout, ())| workout)
    }

    /// Sets logged last time for this exercise, for prefilling entry.
    pub async fn previous_sets_for(&self, exercise_id: &str, profile_id: Option<&str>) -> SyncResult<Vec<StoredSet>> {
        Ok(self.store.previous_sets_for(exercise_id, profile_id).await?)
    }

    /// Prefill for the next set of `exercise_id`, from last session's set at
    /// the same position.
    pub async fn suggest_set(&self, exercise_id: &str) -> SyncResult<SetSuggestion> {
        let workout = self
            .store
            .current_workout()
            .await?
            .ok_or(CoreError::NoActiveWorkout)?;
        let exercise = workout
            .exercise(exercise_id)
            .ok_or_else(|| CoreError::ExerciseNotFound(exercise_id.to_string()))?;

        let previous = self
            .store
            .previous_sets_for(exercise_id, exercise.profile_id.as_deref())
            .await?;
        let fallback_unit = self.store.settings().await?.display_unit.unwrap_or_default();

        Ok(suggest_next_set(&previous, exercise.sets.len(), fallback_unit))
    }

    // =========================================================================
    // Finishing
    // =========================================================================

    /// Closes the workout and hands it to the sync engine.
    ///
    /// The finished workout is in the pending slot before the in-progress
    /// copy is removed, so a failed write leaves it in one place or the
    /// other. History is seeded before the sync attempt, so a server echo
    /// from that attempt replaces it.
    pub async fn finish(&self, name: Option<String>, gym_location: Option<String>) -> SyncResult<Finished> {
        let _edit = self.edit.lock().await;

        let current = self
            .store
            .current_workout()
            .await?
            .ok_or(CoreError::NoActiveWorkout)?;
        let workout = current.finish(name, gym_location);

        self.workouts.stage(&workout).await?;
        self.store.clear_current_workout().await?;
        info!(workout_id = %workout.id, sets = workout.set_count(), "Workout finished");

        // Exercises without sets keep their older history.
        let history: PreviousSets = workout
            .exercises
            .iter()
            .filter(|e| !e.sets.is_empty())
            .map(|e| (e.history_key(), e.sets.clone()))
            .collect();
        if let Err(e) = self.store.merge_previous_sets(history).await {
            warn!(workout_id = %workout.id, error = %e, "Failed to seed previous sets");
        }

        let synced = self.workouts.sync_staged().await;
        Ok(Finished { workout, synced })
    }

    /// Discards the in-progress workout.
    pub async fn cancel(&self) -> SyncResult<()> {
        let _edit = self.edit.lock().await;
        self.store.clear_current_workout().await?;
        info!("Workout cancelled");
        Ok(())
    }

    pub async fn log_rest_day(&self) -> SyncResult<Finished> {
        let settings = self.store.settings().await?;
        let rest = StoredWorkout::rest_day(&settings, Utc::now());

        info!(rest_day_id = %rest.id, "Rest day logged");
        let synced = self.rest_days.save(rest.clone()).await?;
        Ok(Finished { workout: rest, synced })
    }

    /// Applies one edit to the stored workout and writes it back.
    async fn modify<R>(&self, edit: impl FnOnce(&mut StoredWorkout) -> CoreResult<R>) -> SyncResult<(StoredWorkout, R)> {
        let _edit = self.edit.lock().await;

        let mut workout = self
            .store
            .current_workout()
            .await?
            .ok_or(CoreError::NoActiveWorkout)?;
        let result = edit(&mut workout)?;
        self.store.save_current_workout(&workout).await?;

        Ok((workout, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WorkoutRemote;
    use crate::engine::{EngineOptions, SyncSignals};
    use crate::error::SyncError;
    use crate::protocol::{SyncWorkoutRequest, SyncWorkoutResponse};
    use async_trait::async_trait;
    use chrono::Duration;
    use liftlog_db::{Database, DbConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::watch;

    #[derive(Default)]
    struct CountingRemote {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WorkoutRemote for CountingRemote {
        async fn sync_workout(&self, _request: SyncWorkoutRequest) -> SyncResult<SyncWorkoutResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SyncWorkoutResponse::default())
        }
    }

    struct Fixture {
        db: Database,
        remote: Arc<CountingRemote>,
        _online: watch::Sender<bool>,
        _auth: watch::Sender<bool>,
        tracker: WorkoutTracker,
    }

    async fn fixture(online: bool) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let remote = Arc::new(CountingRemote::default());
        let online = watch::channel(online).0;
        let auth = watch::channel(true).0;
        let signals = SyncSignals::new(online.subscribe(), auth.subscribe());

        let workouts = SyncedSave::start(
            WorkoutSyncAdapter::from_database(&db, remote.clone()),
            signals.clone(),
            EngineOptions::default(),
        )
        .await
        .unwrap();
        let rest_days = SyncedSave::start(
            RestDaySyncAdapter::from_database(&db, remote.clone()),
            signals,
            EngineOptions::default(),
        )
        .await
        .unwrap();

        Fixture {
            tracker: WorkoutTracker::new(db.local_store(), workouts, rest_days),
            db,
            remote,
            _online: online,
            _auth: auth,
        }
    }

    #[tokio::test]
    async fn test_full_session_syncs_and_seeds_history() {
        let f = fixture(true).await;

        f.tracker.start().await.unwrap();
        f.tracker.add_exercise("bench", "Bench Press", None).await.unwrap();
        let set = f.tracker.add_set("bench", 10, 60.0, WeightUnit::Kg).await.unwrap();
        f.tracker
            .update_set(
                "bench",
                &set.id,
                SetUpdate {
                    reps: Some(8),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let finished = f.tracker.finish(Some("Push".into()), None).await.unwrap();

        assert!(finished.synced);
        assert_eq!(f.remote.calls.load(Ordering::SeqCst), 1);
        assert!(f.tracker.current().await.unwrap().is_none());
        assert!(f.db.pending_workout().get().await.unwrap().is_none());

        let history = f.tracker.previous_sets_for("bench", None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].reps, 8);

        // The next session is prefilled from this one.
        f.tracker.start().await.unwrap();
        f.tracker.add_exercise("bench", "Bench Press", None).await.unwrap();
        let suggestion = f.tracker.suggest_set("bench").await.unwrap();
        assert_eq!((suggestion.reps, suggestion.weight), (8, 60.0));
    }

    #[tokio::test]
    async fn test_offline_finish_keeps_pending() {
        let f = fixture(false).await;

        f.tracker.start().await.unwrap();
        let finished = f.tracker.finish(None, None).await.unwrap();

        assert!(!finished.synced);
        assert_eq!(f.db.pending_workout().get().await.unwrap(), Some(finished.workout));
        assert!(f.tracker.workouts().state().has_pending);
        assert_eq!(f.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_pending_write_keeps_workout_in_progress() {
        let f = fixture(true).await;

        f.tracker.start().await.unwrap();
        f.tracker.add_exercise("squat", "Squat", None).await.unwrap();
        f.tracker.add_set("squat", 5, 100.0, WeightUnit::Kg).await.unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER reject_pending_workout BEFORE INSERT ON kv_store
            WHEN NEW.key = 'pending_workout'
            BEGIN
                SELECT RAISE(ABORT, 'disk full');
            END
            "#,
        )
        .execute(f.db.pool())
        .await
        .unwrap();

        let err = f.tracker.finish(Some("Legs".into()), None).await.unwrap_err();
        assert!(matches!(err, SyncError::Storage(_)));

        let current = f.tracker.current().await.unwrap().expect("workout still in progress");
        assert_eq!(current.set_count(), 1);
        assert!(f.db.pending_workout().get().await.unwrap().is_none());
        assert!(f.tracker.previous_sets_for("squat", None).await.unwrap().is_empty());
        assert!(!f.tracker.workouts().state().has_pending);
        assert_eq!(f.remote.calls.load(Ordering::SeqCst), 0);

        // Once the store accepts writes again the same workout finishes.
        sqlx::query("DROP TRIGGER reject_pending_workout")
            .execute(f.db.pool())
            .await
            .unwrap();
        let finished = f.tracker.finish(Some("Legs".into()), None).await.unwrap();
        assert_eq!(finished.workout.id, current.id);
        assert!(finished.synced);
    }

    #[tokio::test]
    async fn test_editing_rules() {
        let f = fixture(false).await;

        let err = f.tracker.add_exercise("bench", "Bench", None).await.unwrap_err();
        assert!(matches!(err, SyncError::Workout(CoreError::NoActiveWorkout)));

        f.tracker.start().await.unwrap();
        let err = f.tracker.start().await.unwrap_err();
        assert!(matches!(err, SyncError::Workout(CoreError::WorkoutInProgress(_))));

        let err = f.tracker.add_set("ghost", 5, 20.0, WeightUnit::Kg).await.unwrap_err();
        assert!(matches!(err, SyncError::Workout(CoreError::ExerciseNotFound(_))));

        f.tracker.add_exercise("a", "A", None).await.unwrap();
        f.tracker.add_exercise("b", "B", None).await.unwrap();
        let reordered = f
            .tracker
            .reorder_exercises(&["b".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(reordered.exercises[0].exercise_id, "b");

        f.tracker.remove_exercise("a").await.unwrap();
        assert_eq!(f.tracker.current().await.unwrap().unwrap().exercises.len(), 1);

        f.tracker.cancel().await.unwrap();
        assert!(f.tracker.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_workout_is_capped_on_load() {
        let f = fixture(false).await;

        let settings = f.db.local_store().settings().await.unwrap();
        let stale = StoredWorkout::start(&settings, Utc::now() - Duration::hours(25));
        f.db.local_store().save_current_workout(&stale).await.unwrap();

        assert_eq!(f.tracker.load().await.unwrap(), LoadOutcome::Capped(stale.clone()));
        assert!(f.tracker.current().await.unwrap().is_none());
        assert_eq!(f.db.pending_workout().get().await.unwrap(), Some(stale));
    }

    #[tokio::test]
    async fn test_fresh_workout_resumes() {
        let f = fixture(false).await;

        let started = f.tracker.start().await.unwrap();
        assert_eq!(f.tracker.load().await.unwrap(), LoadOutcome::Active(started));
    }

    #[tokio::test]
    async fn test_rest_day_does_not_touch_workout_slot() {
        let f = fixture(false).await;

        f.tracker.start().await.unwrap();
        let workout = f.tracker.finish(None, None).await.unwrap().workout;
        let rest = f.tracker.log_rest_day().await.unwrap();

        assert!(!rest.synced);
        assert!(rest.workout.is_rest_day());
        assert_eq!(f.db.pending_workout().get().await.unwrap(), Some(workout));
        assert_eq!(f.db.pending_rest_day().get().await.unwrap(), Some(rest.workout));
    }
}
