//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Precondition   │  │     Transport           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Offline        │  │  RequestFailed          │ │
//! │  │  InvalidUrl     │  │  NotAuthenticated│ │  ServerRejected         │ │
//! │  │  ConfigLoad/Save│  │                 │  │  Timeout                │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Protocol     │  │     Storage     │  │      Engine             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Serialization  │  │  Storage        │  │  RetriesExhausted       │ │
//! │  │  Deserialization│  │  (from DbError) │  │  Workout (CoreError)    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never returns these from `force_sync`; it renders them into
//! the observable `error` text. They surface as `Err` only from config
//! loading, local writes and direct API calls.

use liftlog_core::CoreError;
use liftlog_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Precondition Errors
    // =========================================================================
    /// The device is offline.
    #[error("No internet connection")]
    Offline,

    /// No signed-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never got a response (DNS, TLS, connection reset...).
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status.
    #[error("Server rejected sync ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// The remote call did not finish in time.
    #[error("Sync timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Failed to encode a request.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Failed to decode a response.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // Storage / Domain Errors
    // =========================================================================
    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    /// A workout editing rule was violated.
    #[error(transparent)]
    Workout(#[from] CoreError),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Automatic retries stopped.
    #[error("Sync failed after {0} attempts. Tap to retry.")]
    RetriesExhausted(u32),

    /// Internal engine error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::RequestFailed(format!("request timed out: {}", err))
        } else if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::ServerRejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SyncError::RequestFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if an automatic retry may succeed.
    ///
    /// ## Retryable Errors
    /// - Transport failures and timeouts
    /// - Server errors
    /// - Local storage hiccups during an attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RequestFailed(_)
                | SyncError::ServerRejected { .. }
                | SyncError::Timeout(_)
                | SyncError::DeserializationFailed(_)
                | SyncError::Storage(_)
        )
    }

    /// Returns true for offline / signed-out failures. These never arm a
    /// retry timer; the auto-sync watcher picks up once the signal flips.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SyncError::Offline | SyncError::NotAuthenticated)
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages() {
        assert_eq!(SyncError::Offline.to_string(), "No internet connection");
        assert_eq!(SyncError::NotAuthenticated.to_string(), "Not authenticated");
        assert!(SyncError::Offline.is_precondition());
        assert!(!SyncError::Offline.is_retryable());
    }

    #[test]
    fn test_exhaustion_message() {
        assert_eq!(
            SyncError::RetriesExhausted(5).to_string(),
            "Sync failed after 5 attempts. Tap to retry."
        );
    }

    #[test]
    fn test_categories() {
        assert!(SyncError::Timeout(60).is_retryable());
        assert!(SyncError::ServerRejected {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(SyncError::InvalidUrl("nope".into()).is_config_error());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: SyncError = CoreError::NoActiveWorkout.into();
        assert_eq!(err.to_string(), "No active workout");
    }
}
