//! # liftlog-core: Pure Domain Logic for LiftLog
//!
//! This crate holds the workout model and every rule that can be expressed
//! without touching storage, the network or a clock it does not receive as
//! an argument.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LiftLog Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Consumers (CLI / UI)                         │   │
//! │  │    start ──► add sets ──► finish ──► "saved locally, syncing"   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 liftlog-sync (engine + adapters)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ liftlog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌────────────┐  │   │
//! │  │   │   types   │  │  workout  │  │   retry   │  │pending_view│  │   │
//! │  │   │ Workout   │  │  editing  │  │  backoff  │  │ merge lists│  │   │
//! │  │   │ Set       │  │  rules    │  │  policy   │  │            │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Stored workout, set, settings and history types
//! - [`workout`] - Editing rules for an in-progress workout
//! - [`retry`] - Retry policy and exponential backoff arithmetic
//! - [`pending_view`] - Merging unsynced local items with remote lists
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use liftlog_core::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//!
//! // First failure waits the base delay, then it doubles
//! assert_eq!(policy.delay_for(0), Duration::from_secs(30));
//! assert_eq!(policy.delay_for(2), Duration::from_secs(120));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pending_view;
pub mod retry;
pub mod types;
pub mod workout;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult};
pub use pending_view::{merge_with_pending, MaybePending, PendingView};
pub use retry::{RetryDecision, RetryPolicy};
pub use workout::{suggest_next_set, SetSuggestion, SetUpdate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name given to logged rest days.
pub const REST_DAY_NAME: &str = "Rest Day";

/// An in-progress workout older than this is capped and queued for sync.
pub const MAX_ACTIVE_WORKOUT_AGE_HOURS: i64 = 24;

/// Profile segment used in previous-set keys when an exercise has no profile.
pub const DEFAULT_PROFILE_KEY: &str = "default";
