//! # Domain Adapters
//!
//! Concrete [`SyncAdapter`](crate::adapter::SyncAdapter) bindings. Each one
//! owns its own pending slot, so a rest day never overwrites an unsynced
//! workout.
//!
//! ```text
//! ┌────────────────────┬──────────────────────┬─────────────────────────────┐
//! │ Adapter            │ Pending slot         │ Post-sync hook              │
//! ├────────────────────┼──────────────────────┼─────────────────────────────┤
//! │ WorkoutSyncAdapter │ pending_workout      │ merge previous-set echo     │
//! │ RestDaySyncAdapter │ pending_rest_day     │ none                        │
//! └────────────────────┴──────────────────────┴─────────────────────────────┘
//! ```

mod rest_day;
mod workout;

pub use rest_day::RestDaySyncAdapter;
pub use workout::WorkoutSyncAdapter;
