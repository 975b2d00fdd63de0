//! # Workout Editing Rules
//!
//! Pure operations on an in-progress [`StoredWorkout`]. The caller supplies
//! the clock; persisting the result is the tracker's job in `liftlog-sync`.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Workout Lifecycle                                │
//! │                                                                         │
//! │  StoredWorkout::start(settings, now)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_exercise / add_set / update_set / remove_set / reorder ...        │
//! │       │                                                                 │
//! │       ├──── cancel ──► discarded, nothing queued                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  finish(name, gym) ──► pending item ──► synced-save engine             │
//! │                                                                         │
//! │  StoredWorkout::rest_day(settings, now) goes straight to pending.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{StoredSet, StoredSettings, StoredWorkout, StoredWorkoutExercise, WeightUnit, WorkoutKind};
use crate::REST_DAY_NAME;

/// Reps offered for a set with no history.
pub const DEFAULT_SET_REPS: u32 = 10;

/// Weight offered for a set with no history.
pub const DEFAULT_SET_WEIGHT: f64 = 20.0;

/// Prefilled values for the next set of an exercise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetSuggestion {
    pub reps: u32,
    pub weight: f64,
    pub weight_unit: WeightUnit,
}

/// Suggests the next set from what was lifted at the same position last
/// time, falling back to fixed defaults in `fallback_unit`.
pub fn suggest_next_set(previous: &[StoredSet], logged: usize, fallback_unit: WeightUnit) -> SetSuggestion {
    match previous.get(logged) {
        Some(set) => SetSuggestion {
            reps: set.reps,
            weight: set.weight,
            weight_unit: set.weight_unit,
        },
        None => SetSuggestion {
            reps: DEFAULT_SET_REPS,
            weight: DEFAULT_SET_WEIGHT,
            weight_unit: fallback_unit,
        },
    }
}

/// Partial update applied to an existing set. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetUpdate {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
}

impl StoredWorkout {
    /// Starts an empty workout using the user's default privacy.
    pub fn start(settings: &StoredSettings, now: DateTime<Utc>) -> Self {
        StoredWorkout {
            id: Uuid::new_v4().to_string(),
            start_time: now,
            exercises: Vec::new(),
            name: None,
            privacy: settings.default_privacy,
            gym_location: None,
            kind: WorkoutKind::Workout,
        }
    }

    /// Builds a rest day entry. Rest days have no exercises and skip the
    /// in-progress state entirely.
    pub fn rest_day(settings: &StoredSettings, now: DateTime<Utc>) -> Self {
        StoredWorkout {
            id: Uuid::new_v4().to_string(),
            start_time: now,
            exercises: Vec::new(),
            name: Some(REST_DAY_NAME.to_string()),
            privacy: settings.default_privacy,
            gym_location: None,
            kind: WorkoutKind::Rest,
        }
    }

    /// Appends an exercise with no sets.
    pub fn add_exercise(
        &mut self,
        exercise_id: impl Into<String>,
        exercise_name: impl Into<String>,
        profile_id: Option<String>,
    ) {
        self.exercises.push(StoredWorkoutExercise {
            exercise_id: exercise_id.into(),
            profile_id,
            exercise_name: exercise_name.into(),
            sets: Vec::new(),
        });
    }

    /// Removes every entry for the exercise.
    pub fn remove_exercise(&mut self, exercise_id: &str) -> CoreResult<()> {
        let before = self.exercises.len();
        self.exercises.retain(|e| e.exercise_id != exercise_id);

        if self.exercises.len() == before {
            return Err(CoreError::ExerciseNotFound(exercise_id.to_string()));
        }
        Ok(())
    }

    /// Reorders exercises to match `new_order`. Exercises missing from
    /// `new_order` are dropped; unknown ids are ignored.
    pub fn reorder_exercises(&mut self, new_order: &[String]) {
        let mut remaining = std::mem::take(&mut self.exercises);
        let mut reordered = Vec::with_capacity(new_order.len());

        for id in new_order {
            if let Some(pos) = remaining.iter().position(|e| &e.exercise_id == id) {
                reordered.push(remaining.remove(pos));
            }
        }

        self.exercises = reordered;
    }

    /// Logs a new set on the exercise and returns it.
    pub fn add_set(
        &mut self,
        exercise_id: &str,
        reps: u32,
        weight: f64,
        weight_unit: WeightUnit,
        now: DateTime<Utc>,
    ) -> CoreResult<StoredSet> {
        let exercise = self.exercise_mut(exercise_id)?;

        let set = StoredSet {
            id: Uuid::new_v4().to_string(),
            reps,
            weight,
            weight_unit,
            created_at: now,
        };
        exercise.sets.push(set.clone());

        Ok(set)
    }

    /// Applies a partial update to one set.
    pub fn update_set(&mut self, exercise_id: &str, set_id: &str, update: SetUpdate) -> CoreResult<()> {
        let exercise = self.exercise_mut(exercise_id)?;
        let set = exercise
            .sets
            .iter_mut()
            .find(|s| s.id == set_id)
            .ok_or_else(|| CoreError::SetNotFound {
                exercise_id: exercise_id.to_string(),
                set_id: set_id.to_string(),
            })?;

        if let Some(reps) = update.reps {
            set.reps = reps;
        }
        if let Some(weight) = update.weight {
            set.weight = weight;
        }
        if let Some(unit) = update.weight_unit {
            set.weight_unit = unit;
        }

        Ok(())
    }

    /// Deletes one set.
    pub fn remove_set(&mut self, exercise_id: &str, set_id: &str) -> CoreResult<()> {
        let exercise = self.exercise_mut(exercise_id)?;
        let before = exercise.sets.len();
        exercise.sets.retain(|s| s.id != set_id);

        if exercise.sets.len() == before {
            return Err(CoreError::SetNotFound {
                exercise_id: exercise_id.to_string(),
                set_id: set_id.to_string(),
            });
        }
        Ok(())
    }

    /// Produces the finished workout with its final name and location.
    pub fn finish(mut self, name: Option<String>, gym_location: Option<String>) -> Self {
        self.name = name;
        self.gym_location = gym_location;
        self
    }

    fn exercise_mut(&mut self, exercise_id: &str) -> CoreResult<&mut StoredWorkoutExercise> {
        self.exercises
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
            .ok_or_else(|| CoreError::ExerciseNotFound(exercise_id.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
