//! # Sync State
//!
//! The observable condition of one synced-save engine, and the read-only
//! projections consumers render.
//!
//! ## Status Lines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  is_syncing                              → "Syncing…"                  │
//! │  retries exhausted                       → "Sync failed after N        │
//! │                                             attempts, tap to retry."    │
//! │  next_retry_at set                       → "Sync failed, retrying      │
//! │                                             in Ns"                      │
//! │  has_pending                             → "Saved locally, will sync"  │
//! │  otherwise                               → "All changes synced"        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Sync State
// =============================================================================

/// Engine-owned, process-local state. Never persisted except for
/// `last_sync_time`, which the adapter stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// A remote call is in flight.
    pub is_syncing: bool,

    /// The pending slot holds an item.
    pub has_pending: bool,

    /// Last failure description. Cleared on success or `clear_error`.
    pub error: Option<String>,

    /// Consecutive failed attempts since the last success or manual trigger.
    pub retry_count: u32,

    /// When the armed retry timer fires. Never set while `is_syncing`.
    pub next_retry_at: Option<DateTime<Utc>>,

    /// Last successful sync.
    pub last_sync_time: Option<DateTime<Utc>>,
}

// =============================================================================
// Sync View
// =============================================================================

/// What a consumer sees: the state plus the connectivity signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncView {
    pub is_syncing: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub has_pending: bool,
    pub error: Option<String>,
    pub retry_count: u32,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub is_online: bool,

    /// Automatic retries have stopped; only a manual sync will try again.
    pub retries_exhausted: bool,
}

impl SyncView {
    pub fn new(state: &SyncState, is_online: bool, max_retries: u32) -> Self {
        SyncView {
            is_syncing: state.is_syncing,
            last_sync_time: state.last_sync_time,
            has_pending: state.has_pending,
            error: state.error.clone(),
            retry_count: state.retry_count,
            next_retry_at: state.next_retry_at,
            is_online,
            retries_exhausted: state.has_pending && state.retry_count >= max_retries,
        }
    }

    /// One-line summary for the UI.
    pub fn status_line(&self, now: DateTime<Utc>) -> String {
        if self.is_syncing {
            return "Syncing…".to_string();
        }

        if self.retries_exhausted {
            return format!("Sync failed after {} attempts, tap to retry.", self.retry_count);
        }

        if let Some(at) = self.next_retry_at {
            let secs = (at - now).num_seconds().max(0);
            return format!("Sync failed, retrying in {}s", secs);
        }

        if self.has_pending {
            return "Saved locally, will sync".to_string();
        }

        "All changes synced".to_string()
    }
}

// =============================================================================
// Status DTO
// =============================================================================

/// Serialized form of [`SyncView`] for UI hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusDto {
    pub is_syncing: bool,
    pub last_sync_time: Option<String>,
    pub has_pending: bool,
    pub error: Option<String>,
    pub retry_count: u32,
    pub next_retry_at: Option<String>,
    pub is_online: bool,
}

impl From<&SyncView> for SyncStatusDto {
    fn from(view: &SyncView) -> Self {
        SyncStatusDto {
            is_syncing: view.is_syncing,
            last_sync_time: view.last_sync_time.map(|t| t.to_rfc3339()),
            has_pending: view.has_pending,
            error: view.error.clone(),
            retry_count: view.retry_count,
            next_retry_at: view.next_retry_at.map(|t| t.to_rfc3339()),
            is_online: view.is_online,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn view(state: SyncState) -> SyncView {
        SyncView::new(&state, true, 5)
    }

    #[test]
    fn test_status_lines() {
        let now = Utc::now();

        assert_eq!(view(SyncState::default()).status_line(now), "All changes synced");

        let pending = SyncState {
            has_pending: true,
            ..Default::default()
        };
        assert_eq!(view(pending.clone()).status_line(now), "Saved locally, will sync");

        let syncing = SyncState {
            is_syncing: true,
            ..pending.clone()
        };
        assert_eq!(view(syncing).status_line(now), "Syncing…");

        let retrying = SyncState {
            retry_count: 1,
            next_retry_at: Some(now + Duration::seconds(30)),
            error: Some("boom".into()),
            ..pending.clone()
        };
        assert_eq!(view(retrying).status_line(now), "Sync failed, retrying in 30s");

        let exhausted = SyncState {
            retry_count: 5,
            error: Some("Sync failed after 5 attempts. Tap to retry.".into()),
            ..pending
        };
        assert_eq!(
            view(exhausted).status_line(now),
            "Sync failed after 5 attempts, tap to retry."
        );
    }

    #[test]
    fn test_dto_is_camel_case() {
        let state = SyncState {
            has_pending: true,
            retry_count: 2,
            ..Default::default()
        };
        let dto = SyncStatusDto::from(&view(state));
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["hasPending"], true);
        assert_eq!(json["retryCount"], 2);
        assert_eq!(json["isOnline"], true);
        assert!(json["nextRetryAt"].is_null());
    }

    #[test]
    fn test_dto_typescript_shape() {
        let decl = SyncStatusDto::decl();

        assert!(decl.contains("hasPending: boolean"));
        assert!(decl.contains("retryCount: number"));
        assert!(decl.contains("nextRetryAt: string | null"));
    }
}
