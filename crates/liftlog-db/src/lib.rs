//! # liftlog-db: Local Persistence for LiftLog
//!
//! Durable key-value storage on SQLite via sqlx. Pending items, the last sync
//! timestamp, read-through caches and auth tokens all live here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LiftLog Data Flow                                │
//! │                                                                         │
//! │  SyncedSave::save(workout)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    liftlog-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ KvRepository  │    │ 001_kv.sql   │  │   │
//! │  │   │ SqlitePool    │◄───│ PendingSlot   │    │              │  │   │
//! │  │   │               │    │ LocalStore    │    │              │  │   │
//! │  │   │               │    │ Credentials   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir)/liftlog.db                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Typed repositories over the key-value table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use liftlog_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("liftlog.db")).await?;
//!
//! db.pending_workout().set(&workout).await?;
//! let settings = db.local_store().settings().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::credentials::CredentialRepository;
pub use repository::keys;
pub use repository::kv::KvRepository;
pub use repository::local_store::LocalStore;
pub use repository::pending::PendingSlot;
