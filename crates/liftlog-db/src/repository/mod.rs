//! # Repository Module
//!
//! Typed access to the key-value store.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LocalStore        PendingSlot<T>       CredentialRepository           │
//! │  (caches,          (one unsynced        (access / refresh              │
//! │   settings)         item per key)        tokens)                       │
//! │       │                  │                     │                        │
//! │       └──────────────────┼─────────────────────┘                        │
//! │                          ▼                                              │
//! │                   KvRepository  (JSON text under a key)                │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                   kv_store table                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`KvRepository`](kv::KvRepository) - Untyped JSON documents
//! - [`PendingSlot`](pending::PendingSlot) - A single pending item
//! - [`LocalStore`](local_store::LocalStore) - Workout, settings, history, last sync
//! - [`CredentialRepository`](credentials::CredentialRepository) - Auth tokens

pub mod credentials;
pub mod kv;
pub mod local_store;
pub mod pending;

/// Well-known storage keys.
pub mod keys {
    pub const CURRENT_WORKOUT: &str = "current_workout";
    pub const SETTINGS: &str = "settings";
    pub const PREVIOUS_SETS: &str = "previous_sets";
    pub const LAST_SYNC: &str = "last_sync";
    pub const PENDING_WORKOUT: &str = "pending_workout";
    pub const PENDING_REST_DAY: &str = "pending_rest_day";
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
}
