//! # Sync Events
//!
//! Push notifications from an engine to whatever hosts it (a UI shell, the
//! CLI, a test recorder). Every callback runs synchronously on the engine's
//! task, so implementations must not block.

use std::time::Duration;

use crate::state::SyncView;

/// Receives engine notifications. `adapter` names the engine instance
/// (e.g. `"workout"`, `"rest_day"`).
pub trait SyncEventEmitter: Send + Sync {
    /// The observable state changed.
    fn emit_status(&self, adapter: &str, view: &SyncView);

    /// An automatic retry was armed. `attempt` is the consecutive failure
    /// count that caused it.
    fn emit_retry_scheduled(&self, adapter: &str, attempt: u32, delay: Duration);

    /// Something failed. `retryable` is false for exhaustion and for
    /// post-sync hook failures.
    fn emit_error(&self, adapter: &str, message: &str, retryable: bool);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _adapter: &str, _view: &SyncView) {}
    fn emit_retry_scheduled(&self, _adapter: &str, _attempt: u32, _delay: Duration) {}
    fn emit_error(&self, _adapter: &str, _message: &str, _retryable: bool) {}
}
