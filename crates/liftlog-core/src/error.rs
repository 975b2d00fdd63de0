//! # Error Types
//!
//! Domain-specific error types for liftlog-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  liftlog-core errors (this file)                                       │
//! │  └── CoreError        - Workout editing rule violations                │
//! │                                                                         │
//! │  liftlog-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  liftlog-sync errors (separate crate)                                  │
//! │  └── SyncError        - Preconditions, transport, exhaustion           │
//! │                                                                         │
//! │  Flow: CoreError → SyncError → Consumer (rendered as text)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Workout editing errors.
///
/// Each variant is something a consumer asked for that the current workout
/// cannot satisfy. None of them involve I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// An operation needed an active workout but none is in progress.
    #[error("No active workout")]
    NoActiveWorkout,

    /// A workout is already in progress.
    #[error("A workout is already in progress: {0}")]
    WorkoutInProgress(String),

    /// The exercise is not part of the workout.
    #[error("Exercise not found in workout: {0}")]
    ExerciseNotFound(String),

    /// The set does not exist on the exercise.
    #[error("Set {set_id} not found on exercise {exercise_id}")]
    SetNotFound { exercise_id: String, set_id: String },

    /// A weight unit string was not recognized.
    #[error("Unknown weight unit: '{0}'. Valid options: kg, lbs")]
    UnknownWeightUnit(String),

    /// A privacy string was not recognized.
    #[error("Unknown privacy level: '{0}'. Valid options: public, friends, private")]
    UnknownPrivacy(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
