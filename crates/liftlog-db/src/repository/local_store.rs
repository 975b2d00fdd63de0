//! # Local Store
//!
//! Typed accessors for the documents the app keeps besides pending items:
//! the in-progress workout, user settings, previous-set history and the
//! last successful sync time.
//!
//! ```text
//! ┌───────────────────┬──────────────────────────────┬──────────────────┐
//! │ key               │ type                         │ when missing     │
//! ├───────────────────┼──────────────────────────────┼──────────────────┤
//! │ current_workout   │ StoredWorkout                │ None             │
//! │ settings          │ StoredSettings               │ defaults         │
//! │ previous_sets     │ PreviousSets                 │ empty map        │
//! │ last_sync         │ DateTime<Utc>                │ None             │
//! └───────────────────┴──────────────────────────────┴──────────────────┘
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;

use liftlog_core::{previous_sets_key, PreviousSets, StoredSet, StoredSettings, StoredWorkout};

use crate::error::DbResult;
use crate::repository::keys;
use crate::repository::kv::KvRepository;

#[derive(Debug, Clone)]
pub struct LocalStore {
    kv: KvRepository,
}

impl LocalStore {
    pub fn new(kv: KvRepository) -> Self {
        LocalStore { kv }
    }

    // =========================================================================
    // Current Workout
    // =========================================================================

    pub async fn current_workout(&self) -> DbResult<Option<StoredWorkout>> {
        self.kv.get_json(keys::CURRENT_WORKOUT).await
    }

    pub async fn save_current_workout(&self, workout: &StoredWorkout) -> DbResult<()> {
        self.kv.set_json(keys::CURRENT_WORKOUT, workout).await
    }

    pub async fn clear_current_workout(&self) -> DbResult<()> {
        self.kv.delete(keys::CURRENT_WORKOUT).await.map(|_| ())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Stored settings, or defaults when none were saved yet.
    pub async fn settings(&self) -> DbResult<StoredSettings> {
        Ok(self.kv.get_json(keys::SETTINGS).await?.unwrap_or_default())
    }

    pub async fn save_settings(&self, settings: &StoredSettings) -> DbResult<()> {
        self.kv.set_json(keys::SETTINGS, settings).await
    }

    // =========================================================================
    // Previous Sets
    // =========================================================================

    /// The whole history map.
    pub async fn previous_sets(&self) -> DbResult<PreviousSets> {
        Ok(self.kv.get_json(keys::PREVIOUS_SETS).await?.unwrap_or_default())
    }

    /// Last logged sets for one exercise/profile, used to prefill entry.
    pub async fn previous_sets_for(&self, exercise_id: &str, profile_id: Option<&str>) -> DbResult<Vec<StoredSet>> {
        let mut all = self.previous_sets().await?;
        Ok(all
            .remove(&previous_sets_key(exercise_id, profile_id))
            .unwrap_or_default())
    }

    /// Replaces the history of a single exercise/profile.
    pub async fn update_previous_sets(
        &self,
        exercise_id: &str,
        profile_id: Option<&str>,
        sets: Vec<StoredSet>,
    ) -> DbResult<()> {
        let entry = PreviousSets::from([(previous_sets_key(exercise_id, profile_id), sets)]);
        self.kv.merge_json(keys::PREVIOUS_SETS, &entry).await
    }

    /// Replaces several history keys in one write. Keys not in `entries`
    /// are kept.
    pub async fn merge_previous_sets(&self, entries: PreviousSets) -> DbResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        debug!(count = entries.len(), "Merging previous sets");

        self.kv.merge_json(keys::PREVIOUS_SETS, &entries).await
    }

    // =========================================================================
    // Last Sync
    // =========================================================================

    pub async fn last_sync(&self) -> DbResult<Option<DateTime<Utc>>> {
        self.kv.get_json(keys::LAST_SYNC).await
    }

    pub async fn set_last_sync(&self, at: DateTime<Utc>) -> DbResult<()> {
        self.kv.set_json(keys::LAST_SYNC, &at).await
    }

    /// Wipes every stored document, pending items and tokens included.
    pub async fn clear_all(&self) -> DbResult<()> {
        self.kv.clear_all().await.map(|_| ())
    }
}
