//! # Wire Protocol
//!
//! Request and response bodies for `POST /api/workouts/sync`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StoredWorkout (camelCase, device)     SyncWorkoutRequest (snake_case) │
//! │  ─────────────────────────────────     ─────────────────────────────── │
//! │  startTime                       ──►   start_time                      │
//! │  (transform time)                ──►   end_time                        │
//! │  exercises[].exerciseId          ──►   exercises[].exercise_id         │
//! │  sets[].weight  (f64)            ──►   sets[].weight  ("62.5")         │
//! │                                                                         │
//! │  SyncWorkoutResponse.previous_sets ──► PreviousSets cache              │
//! │  (missing reps → 0, unparsable weight → 0)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use liftlog_core::{
    previous_sets_key, Privacy, PreviousSets, StoredSet, StoredWorkout, WeightUnit, WorkoutKind,
};

// =============================================================================
// Request
// =============================================================================

/// Body of a workout sync call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncWorkoutRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub privacy: Privacy,
    #[serde(default)]
    pub gym_location: Option<String>,
    pub kind: WorkoutKind,
    pub exercises: Vec<SyncExercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncExercise {
    pub exercise_id: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    pub sets: Vec<SyncSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSet {
    pub reps: u32,
    /// Decimal string, e.g. `"62.5"`.
    pub weight: String,
    pub weight_unit: WeightUnit,
    pub created_at: DateTime<Utc>,
}

impl SyncWorkoutRequest {
    /// Flattens a stored workout into the wire shape. `end_time` is when the
    /// request is built, not when the workout was saved.
    pub fn from_stored(workout: &StoredWorkout, end_time: DateTime<Utc>) -> Self {
        SyncWorkoutRequest {
            name: workout.name.clone(),
            start_time: workout.start_time,
            end_time,
            privacy: workout.privacy,
            gym_location: workout.gym_location.clone(),
            kind: workout.kind,
            exercises: workout
                .exercises
                .iter()
                .map(|exercise| SyncExercise {
                    exercise_id: exercise.exercise_id.clone(),
                    profile_id: exercise.profile_id.clone(),
                    sets: exercise
                        .sets
                        .iter()
                        .map(|set| SyncSet {
                            reps: set.reps,
                            weight: set.weight.to_string(),
                            weight_unit: set.weight_unit,
                            created_at: set.created_at,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// Server reply to a workout sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncWorkoutResponse {
    /// Server-assigned workout id.
    #[serde(default)]
    pub id: Option<String>,

    /// Latest sets per exercise after this workout, echoed back so the
    /// device can prefill the next session.
    #[serde(default)]
    pub previous_sets: Option<Vec<PreviousSetsEcho>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousSetsEcho {
    pub exercise_id: String,
    #[serde(default)]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub sets: Vec<EchoSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoSet {
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<EchoWeight>,
    #[serde(default)]
    pub weight_unit: Option<WeightUnit>,
}

/// Servers have sent weights both as numbers and as decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EchoWeight {
    Number(f64),
    Text(String),
}

impl EchoWeight {
    fn value(&self) -> f64 {
        match self {
            EchoWeight::Number(n) if n.is_finite() => *n,
            EchoWeight::Number(_) => 0.0,
            EchoWeight::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
        }
    }
}

impl SyncWorkoutResponse {
    /// Converts the echo into history entries stamped `received_at`.
    pub fn previous_sets(&self, received_at: DateTime<Utc>) -> PreviousSets {
        let Some(echoes) = &self.previous_sets else {
            return PreviousSets::new();
        };

        echoes
            .iter()
            .map(|echo| {
                let sets = echo
                    .sets
                    .iter()
                    .map(|set| StoredSet {
                        id: Uuid::new_v4().to_string(),
                        reps: set.reps.unwrap_or(0),
                        weight: set.weight.as_ref().map(EchoWeight::value).unwrap_or(0.0),
                        weight_unit: set.weight_unit.unwrap_or_default(),
                        created_at: received_at,
                    })
                    .collect();

                (previous_sets_key(&echo.exercise_id, echo.profile_id.as_deref()), sets)
            })
            .collect()
    }
}
