//! # Domain Types
//!
//! Core domain types used throughout LiftLog.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │ StoredWorkout   │   │ StoredWorkoutExercise│   │   StoredSet     │  │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ─────────────  │  │
//! │  │  id (UUID)      │──►│  exercise_id         │──►│  id (UUID)      │  │
//! │  │  start_time     │   │  profile_id?         │   │  reps           │  │
//! │  │  kind           │   │  exercise_name       │   │  weight         │  │
//! │  │  privacy        │   │  sets                │   │  weight_unit    │  │
//! │  └─────────────────┘   └──────────────────────┘   └─────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ StoredSettings  │   │  PreviousSets   │   │   WeightUnit    │       │
//! │  │  default privacy│   │  "bench_default"│   │   Kg / Lbs      │       │
//! │  │  rest timer     │   │   → [sets]      │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored shapes serialize in camelCase; the wire shapes live in
//! `liftlog-sync::protocol` and use snake_case.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::CoreError;
use crate::{DEFAULT_PROFILE_KEY, MAX_ACTIVE_WORKOUT_AGE_HOURS};

// =============================================================================
// Weight Unit
// =============================================================================

/// Unit a set's weight was entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightUnit::Kg => write!(f, "kg"),
            WeightUnit::Lbs => write!(f, "lbs"),
        }
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kg" | "kgs" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lbs),
            other => Err(CoreError::UnknownWeightUnit(other.to_string())),
        }
    }
}

/// Converts a weight between units, rounded to one decimal place.
///
/// Display only: stored sets keep the unit they were entered in.
pub fn convert_weight(weight: f64, from: WeightUnit, to: WeightUnit) -> f64 {
    const LBS_PER_KG: f64 = 2.20462;

    match (from, to) {
        (WeightUnit::Kg, WeightUnit::Lbs) => (weight * LBS_PER_KG * 10.0).round() / 10.0,
        (WeightUnit::Lbs, WeightUnit::Kg) => (weight / LBS_PER_KG * 10.0).round() / 10.0,
        _ => weight,
    }
}

// =============================================================================
// Privacy
// =============================================================================

/// Who can see a workout in the social feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Public,
    #[default]
    Friends,
    Private,
}

impl std::fmt::Display for Privacy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Privacy::Public => write!(f, "public"),
            Privacy::Friends => write!(f, "friends"),
            Privacy::Private => write!(f, "private"),
        }
    }
}

impl std::str::FromStr for Privacy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Privacy::Public),
            "friends" => Ok(Privacy::Friends),
            "private" => Ok(Privacy::Private),
            other => Err(CoreError::UnknownPrivacy(other.to_string())),
        }
    }
}

// =============================================================================
// Workout Kind
// =============================================================================

/// Whether a stored workout is a training session or a logged rest day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    #[default]
    Workout,
    Rest,
}

impl std::fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkoutKind::Workout => write!(f, "workout"),
            WorkoutKind::Rest => write!(f, "rest"),
        }
    }
}

// =============================================================================
// Stored Set
// =============================================================================

/// One set of an exercise as kept on the device.
///
/// Numeric fields default to zero when absent from stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoredSet {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Repetitions performed.
    #[serde(default)]
    pub reps: u32,

    /// Weight lifted, in `weight_unit`.
    #[serde(default)]
    pub weight: f64,

    /// Unit the weight was entered in.
    #[serde(default)]
    pub weight_unit: WeightUnit,

    /// When the set was logged.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stored Workout Exercise
// =============================================================================

/// An exercise within a stored workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkoutExercise {
    /// Server-side exercise id.
    pub exercise_id: String,

    /// Optional exercise profile (e.g. a specific machine setup).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,

    /// Display name at the time it was added.
    pub exercise_name: String,

    /// Sets in the order they were logged.
    #[serde(default)]
    pub sets: Vec<StoredSet>,
}

impl StoredWorkoutExercise {
    /// Key used for this exercise in the previous-set history.
    pub fn history_key(&self) -> String {
        previous_sets_key(&self.exercise_id, self.profile_id.as_deref())
    }
}

// =============================================================================
// Stored Workout
// =============================================================================

/// A workout (or rest day) as kept on the device.
///
/// The same shape is used for the in-progress workout and for the single
/// pending item awaiting sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkout {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// When the workout started.
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,

    /// Exercises in display order.
    #[serde(default)]
    pub exercises: Vec<StoredWorkoutExercise>,

    /// Optional name given at finish time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Feed visibility.
    #[serde(default)]
    pub privacy: Privacy,

    /// Optional gym location given at finish time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gym_location: Option<String>,

    /// Training session or rest day.
    #[serde(default)]
    pub kind: WorkoutKind,
}

impl StoredWorkout {
    /// Returns true for a logged rest day.
    pub fn is_rest_day(&self) -> bool {
        self.kind == WorkoutKind::Rest
    }

    /// Total number of sets across all exercises.
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Looks up an exercise by id.
    pub fn exercise(&self, exercise_id: &str) -> Option<&StoredWorkoutExercise> {
        self.exercises.iter().find(|e| e.exercise_id == exercise_id)
    }

    /// Returns true when the workout has been open longer than
    /// [`MAX_ACTIVE_WORKOUT_AGE_HOURS`] and should be capped.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.start_time > Duration::hours(MAX_ACTIVE_WORKOUT_AGE_HOURS)
    }
}

// =============================================================================
// Settings
// =============================================================================

/// User preferences kept on the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoredSettings {
    /// Unit to display weights in. `None` shows each set in its own unit.
    #[serde(default)]
    pub display_unit: Option<WeightUnit>,

    /// Workouts longer than this are flagged in the UI.
    #[serde(default = "default_max_workout_duration")]
    pub max_workout_duration_minutes: u32,

    /// Rest timer length between sets.
    #[serde(default = "default_rest_timer")]
    pub default_rest_timer_seconds: u32,

    /// Privacy applied to new workouts and rest days.
    #[serde(default)]
    pub default_privacy: Privacy,

    /// Whether the gym location is attached to shared workouts.
    #[serde(default = "default_share_gym_location")]
    pub share_gym_location: bool,
}

fn default_max_workout_duration() -> u32 {
    120
}

fn default_rest_timer() -> u32 {
    90
}

fn default_share_gym_location() -> bool {
    true
}

impl Default for StoredSettings {
    fn default() -> Self {
        StoredSettings {
            display_unit: None,
            max_workout_duration_minutes: default_max_workout_duration(),
            default_rest_timer_seconds: default_rest_timer(),
            default_privacy: Privacy::default(),
            share_gym_location: default_share_gym_location(),
        }
    }
}

// =============================================================================
// Previous Sets
// =============================================================================

/// Last-known sets per exercise, used to prefill set entry.
///
/// Keyed by [`previous_sets_key`].
pub type PreviousSets = HashMap<String, Vec<StoredSet>>;

/// Builds the history key `"{exercise_id}_{profile_id}"`, using
/// `"default"` when there is no profile.
pub fn previous_sets_key(exercise_id: &str, profile_id: Option<&str>) -> String {
    format!(
        "{}_{}",
        exercise_id,
        profile_id.unwrap_or(DEFAULT_PROFILE_KEY)
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
