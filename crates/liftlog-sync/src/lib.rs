//! # liftlog-sync: Local-First Sync Engine for LiftLog
//!
//! Save locally first, sync remotely when possible, retry with backoff.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Synced-Save Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 WorkoutTracker (consumer)                        │  │
//! │  │   start / edit / finish / rest day ──► save(data)                │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │  ┌────────────────────────────▼─────────────────────────────────────┐  │
//! │  │               SyncedSave<A: SyncAdapter> (engine)                │  │
//! │  │                                                                  │  │
//! │  │  save ─► local slot ─► attempt ─► success │ backoff timer        │  │
//! │  │  auto-sync watcher on connectivity / auth / state changes        │  │
//! │  └───────┬─────────────────────┬────────────────────────┬───────────┘  │
//! │          ▼                     ▼                        ▼               │
//! │  ┌────────────────┐  ┌──────────────────┐  ┌────────────────────────┐  │
//! │  │ Connectivity   │  │ AuthSession      │  │ Adapters               │  │
//! │  │ Monitor        │  │                  │  │                        │  │
//! │  │ watch<bool>    │  │ watch<bool> +    │  │ workout ─► ApiClient   │  │
//! │  │ online/offline │  │ credential store │  │ rest day ─► ApiClient  │  │
//! │  └────────────────┘  └──────────────────┘  └────────────────────────┘  │
//! │                                                                         │
//! │  STATUS EVENTS (to hosts via SyncEventEmitter):                        │
//! │  • emit_status           - every state change                          │
//! │  • emit_retry_scheduled  - backoff timer armed                         │
//! │  • emit_error            - failures, exhaustion, post-sync hook errors │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - The `SyncedSave` state machine and auto-sync watcher
//! - [`adapter`] - The `SyncAdapter` trait binding the engine to a data type
//! - [`adapters`] - Workout and rest-day adapters
//! - [`state`] - `SyncState`, the consumer `SyncView` and its DTO
//! - [`events`] - Event emitter trait
//! - [`connectivity`] - Online/offline signal
//! - [`auth`] - Authenticated signal and credential store
//! - [`protocol`] - Wire request/response types
//! - [`api`] - HTTP client for the workout API
//! - [`tracker`] - In-progress workout editing and hand-off
//! - [`config`] - Sync configuration (API URL, retry policy, storage)
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use liftlog_sync::{SyncConfig, SyncedSave, SyncSignals, WorkoutSyncAdapter};
//!
//! let config = SyncConfig::load_or_default(None);
//! let adapter = WorkoutSyncAdapter::from_database(&db, api.clone());
//! let engine = SyncedSave::start(adapter, signals, config.engine_options()).await?;
//!
//! // Returns Ok(false) when offline; the workout syncs on reconnect.
//! let synced = engine.save(workout).await?;
//! println!("{}", engine.view().status_line(chrono::Utc::now()));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapter;
pub mod adapters;
pub mod api;
pub mod auth;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod events;
pub mod protocol;
pub mod state;
pub mod tracker;

// =============================================================================
// Re-exports
// =============================================================================

pub use adapter::SyncAdapter;
pub use adapters::{RestDaySyncAdapter, WorkoutSyncAdapter};
pub use api::{ApiClient, WorkoutRemote};
pub use auth::{AuthSession, CredentialStore};
pub use config::SyncConfig;
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use engine::{EngineOptions, SyncSignals, SyncedSave, Trigger, DEFAULT_SYNC_TIMEOUT};
pub use error::{SyncError, SyncResult};
pub use events::{NoOpEmitter, SyncEventEmitter};
pub use protocol::{SyncWorkoutRequest, SyncWorkoutResponse};
pub use state::{SyncState, SyncStatusDto, SyncView};
pub use tracker::{Finished, LoadOutcome, WorkoutTracker};
