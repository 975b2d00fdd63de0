//! # Pending View
//!
//! Combines items that only exist locally (saved but not yet synced) with the
//! list the server returned, so a history screen can show both and badge the
//! unsynced ones.
//!
//! ```text
//! pending (local) ──► transform ──┐
//!                                 ├──► drop duplicates ──► [pending..., synced...]
//! synced (remote) ──► transform ──┘
//! ```

use serde::{Deserialize, Serialize};

/// One entry of a merged list, tagged with whether it is still local-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaybePending<T> {
    pub data: T,
    pub is_pending: bool,
}

/// Result of [`merge_with_pending`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingView<T> {
    /// Pending entries first, then synced entries.
    pub items: Vec<MaybePending<T>>,

    /// Pending entries that survived duplicate filtering.
    pub pending_items: Vec<T>,

    /// Entries the server already knows about.
    pub synced_items: Vec<T>,
}

impl<T> Default for PendingView<T> {
    fn default() -> Self {
        PendingView {
            items: Vec::new(),
            pending_items: Vec::new(),
            synced_items: Vec::new(),
        }
    }
}

impl<T> PendingView<T> {
    pub fn has_pending(&self) -> bool {
        !self.pending_items.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_items.len()
    }

    /// Just the data, pending first.
    pub fn data(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|item| &item.data)
    }
}

/// Merges already-transformed pending and synced items.
///
/// When `is_duplicate` is given, a pending item that matches any synced item
/// is dropped: the server already has it and the local slot just has not
/// been cleared yet.
pub fn merge_with_pending<T, F>(pending: Vec<T>, synced: Vec<T>, is_duplicate: Option<F>) -> PendingView<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let pending_items: Vec<T> = match is_duplicate {
        Some(dup) => pending
            .into_iter()
            .filter(|p| !synced.iter().any(|s| dup(p, s)))
            .collect(),
        None => pending,
    };

    let items = pending_items
        .iter()
        .cloned()
        .map(|data| MaybePending { data, is_pending: true })
        .chain(synced.iter().cloned().map(|data| MaybePending {
            data,
            is_pending: false,
        }))
        .collect();

    PendingView {
        items,
        pending_items,
        synced_items: synced,
    }
}
