//! # Synced-Save Engine
//!
//! Owns the save → sync → retry lifecycle for exactly one pending item.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SyncedSave<A> Lifecycle                            │
//! │                                                                         │
//! │  save(data)                                                            │
//! │     │  1. adapter.save_local(data)        durable before anything else │
//! │     │  2. has_pending = true                                           │
//! │     ▼                                                                   │
//! │  attempt (Manual)  ◄──── force_sync()                                  │
//! │     │                                                                   │
//! │     ├── in flight already? ──────────────► false                       │
//! │     ├── offline / signed out? ─── error ─► false                       │
//! │     ├── nothing pending? ── clean state ─► true                        │
//! │     ▼                                                                   │
//! │  sync_remote(to_remote(item)) bounded by sync_timeout                  │
//! │     │                                                                   │
//! │     ├── Ok ──► on_sync_success ─► clear slot if unchanged ─► true      │
//! │     │                                                                   │
//! │     └── Err ─► retry_count += 1                                        │
//! │                 ├── < max: next_retry_at = now + 2^prior × base        │
//! │                 │          arm timer ─► (fires) next_retry_at = None   │
//! │                 └── ≥ max: "Sync failed after N attempts. Tap to retry."│
//! │                                                                         │
//! │  Auto-sync watcher (background task), re-evaluated on every change of  │
//! │  connectivity, auth or state:                                          │
//! │     online ∧ authenticated ∧ has_pending ∧ ¬is_syncing                 │
//! │       ∧ next_retry_at = None ∧ ¬in_flight ∧ retry_count < max          │
//! │       ──► attempt (Automatic)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The in-flight flag is taken with a compare-and-swap before any await
//! point, so two overlapping triggers can never both reach the network. The
//! flag lives in an RAII guard: it is released even if the attempt future is
//! dropped halfway, and releasing it wakes the watcher so a save that landed
//! mid-flight is picked up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use liftlog_core::{RetryDecision, RetryPolicy};

use crate::adapter::SyncAdapter;
use crate::auth::AuthSession;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};
use crate::events::{NoOpEmitter, SyncEventEmitter};
use crate::state::{SyncState, SyncView};

/// Default upper bound on a single remote sync call.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(60);

// =============================================================================
// Options and Inputs
// =============================================================================

/// What started an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// `save` or `force_sync`. Preempts any armed retry and restarts the
    /// failure count.
    Manual,

    /// The auto-sync watcher.
    Automatic,
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub retry: RetryPolicy,
    pub sync_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            retry: RetryPolicy::default(),
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

/// The two reactive booleans an engine depends on.
#[derive(Debug, Clone)]
pub struct SyncSignals {
    pub online: watch::Receiver<bool>,
    pub authenticated: watch::Receiver<bool>,
}

impl SyncSignals {
    pub fn new(online: watch::Receiver<bool>, authenticated: watch::Receiver<bool>) -> Self {
        SyncSignals { online, authenticated }
    }

    pub fn from_sources(connectivity: &ConnectivityMonitor, auth: &AuthSession) -> Self {
        SyncSignals::new(connectivity.subscribe(), auth.subscribe())
    }

    fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }
}

// =============================================================================
// Engine Handle
// =============================================================================

/// A running synced-save engine. Cheap to clone; clones share state.
///
/// The background watcher and any armed retry timer stop when the last
/// clone is dropped or [`shutdown`](Self::shutdown) is called.
pub struct SyncedSave<A: SyncAdapter> {
    shared: Arc<Shared<A>>,
}

impl<A: SyncAdapter> Clone for SyncedSave<A> {
    fn clone(&self) -> Self {
        SyncedSave {
            shared: self.shared.clone(),
        }
    }
}

struct Shared<A: SyncAdapter> {
    adapter: A,
    options: EngineOptions,
    signals: SyncSignals,
    state: watch::Sender<SyncState>,

    /// Held by at most one attempt at a time. Distinct from `is_syncing`,
    /// which is only set once an attempt reaches the network.
    in_flight: AtomicBool,

    /// Serializes writes to the pending slot with the post-sync
    /// compare-and-clear.
    slot: tokio::sync::Mutex<()>,

    retry_timer: Mutex<Option<JoinHandle<()>>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    wake: Arc<Notify>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl<A: SyncAdapter> SyncedSave<A> {
    /// Loads the initial state from the adapter and spawns the auto-sync
    /// watcher. Must be called inside a tokio runtime.
    pub async fn start(adapter: A, signals: SyncSignals, options: EngineOptions) -> SyncResult<Self> {
        Self::start_with_emitter(adapter, signals, options, Arc::new(NoOpEmitter)).await
    }

    /// Like [`start`](Self::start), reporting events to `emitter`.
    pub async fn start_with_emitter(
        adapter: A,
        signals: SyncSignals,
        options: EngineOptions,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> SyncResult<Self> {
        let has_pending = adapter.get_pending().await?.is_some();
        let last_sync_time = adapter.last_sync_time().await?;

        let (state, _) = watch::channel(SyncState {
            has_pending,
            last_sync_time,
            ..Default::default()
        });

        let shared = Arc::new(Shared {
            adapter,
            options,
            signals,
            state,
            in_flight: AtomicBool::new(false),
            slot: tokio::sync::Mutex::new(()),
            retry_timer: Mutex::new(None),
            watcher: Mutex::new(None),
            wake: Arc::new(Notify::new()),
            emitter,
        });

        let watcher = tokio::spawn(watch_loop(
            Arc::downgrade(&shared),
            shared.signals.clone(),
            shared.state.subscribe(),
            shared.wake.clone(),
        ));
        if let Ok(mut slot) = shared.watcher.lock() {
            *slot = Some(watcher);
        }

        info!(
            adapter = shared.adapter.name(),
            has_pending,
            max_retries = options.retry.max_retries,
            "Synced save started"
        );

        Ok(SyncedSave { shared })
    }

    /// Persists `data` locally, then tries to sync it right away.
    ///
    /// ## Returns
    /// * `Ok(true)` - Synced during this call
    /// * `Ok(false)` - Safely stored; it will sync later
    /// * `Err(_)` - The local write itself failed; nothing was stored
    pub async fn save(&self, data: A::Local) -> SyncResult<bool> {
        self.stage(&data).await?;
        Ok(self.sync_staged().await)
    }

    /// First half of [`save`](Self::save): the durable local write, without
    /// publishing `has_pending` or starting an attempt. Callers that must do
    /// local bookkeeping once the item is safe, but before it syncs, follow
    /// up with [`sync_staged`](Self::sync_staged).
    pub async fn stage(&self, data: &A::Local) -> SyncResult<()> {
        let _slot = self.shared.slot.lock().await;
        self.shared.adapter.save_local(data).await?;
        info!(adapter = self.shared.adapter.name(), "Saved locally");
        Ok(())
    }

    /// Second half of [`save`](Self::save): marks the staged item pending
    /// and runs a manual attempt.
    pub async fn sync_staged(&self) -> bool {
        let shared = &self.shared;

        // Take the in-flight flag before publishing has_pending so the
        // watcher cannot race this call's own attempt.
        let guard = InFlightGuard::acquire(shared);
        shared.update(|s| s.has_pending = true);

        match guard {
            Some(guard) => shared.run_attempt(guard, Trigger::Manual).await,
            None => {
                debug!(
                    adapter = shared.adapter.name(),
                    "Sync already in flight, new item will follow"
                );
                false
            }
        }
    }

    /// Manual sync. Returns false without side effects if an attempt is
    /// already running.
    pub async fn force_sync(&self) -> bool {
        self.shared.try_attempt(Trigger::Manual).await
    }

    /// Clears `error` and nothing else.
    pub fn clear_error(&self) {
        self.shared.update(|s| s.error = None);
    }

    pub fn state(&self) -> SyncState {
        self.shared.state.borrow().clone()
    }

    pub fn view(&self) -> SyncView {
        self.shared.view()
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.shared.state.subscribe()
    }

    pub fn adapter(&self) -> &A {
        &self.shared.adapter
    }

    pub fn options(&self) -> EngineOptions {
        self.shared.options
    }

    /// Stops the watcher and cancels any armed retry. An attempt already in
    /// flight runs to completion.
    pub fn shutdown(&self) {
        self.shared.stop_tasks();
        info!(adapter = self.shared.adapter.name(), "Synced save stopped");
    }
}

// =============================================================================
// Attempt
// =============================================================================

impl<A: SyncAdapter> Shared<A> {
    async fn try_attempt(self: &Arc<Self>, trigger: Trigger) -> bool {
        match InFlightGuard::acquire(self) {
            Some(guard) => self.run_attempt(guard, trigger).await,
            None => {
                debug!(adapter = self.adapter.name(), ?trigger, "Sync already in flight, skipping");
                false
            }
        }
    }

    async fn run_attempt(self: &Arc<Self>, _guard: InFlightGuard<A>, trigger: Trigger) -> bool {
        let name = self.adapter.name();

        if trigger == Trigger::Manual {
            self.cancel_retry_timer();
            self.update(|s| {
                s.retry_count = 0;
                s.next_retry_at = None;
            });
        }

        if !self.signals.is_online() {
            info!(adapter = name, "Sync skipped: offline");
            self.update(|s| s.error = Some(SyncError::Offline.to_string()));
            return false;
        }

        if !self.signals.is_authenticated() {
            info!(adapter = name, "Sync skipped: not authenticated");
            self.update(|s| s.error = Some(SyncError::NotAuthenticated.to_string()));
            return false;
        }

        let local = match self.adapter.get_pending().await {
            Ok(Some(local)) => local,
            Ok(None) => {
                debug!(adapter = name, "Nothing pending");
                self.update(|s| {
                    s.has_pending = false;
                    s.retry_count = 0;
                    s.next_retry_at = None;
                    s.error = None;
                });
                return true;
            }
            Err(e) => return self.record_failure(trigger, e),
        };

        self.update(|s| {
            s.is_syncing = true;
            s.has_pending = true;
            s.error = None;
        });
        info!(adapter = name, ?trigger, "Sync attempt started");

        let remote = self.adapter.to_remote(&local);
        let result = match tokio::time::timeout(self.options.sync_timeout, self.adapter.sync_remote(remote)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(self.options.sync_timeout.as_secs())),
        };

        match result {
            Ok(response) => self.complete(&local, response, trigger).await,
            Err(e) => self.record_failure(trigger, e),
        }
    }

    async fn complete(self: &Arc<Self>, local: &A::Local, response: A::Response, trigger: Trigger) -> bool {
        let name = self.adapter.name();

        if let Err(e) = self.adapter.on_sync_success(&response, local).await {
            warn!(adapter = name, error = %e, "Post-sync hook failed, keeping sync result");
            self.emitter.emit_error(name, &e.to_string(), false);
        }

        // Clear the slot only if it still holds what was just synced.
        let still_pending = {
            let _slot = self.slot.lock().await;
            match self.adapter.get_pending().await {
                Ok(Some(current)) if current != *local => true,
                Ok(Some(_)) => match self.adapter.clear_pending().await {
                    Ok(()) => false,
                    Err(e) => return self.record_failure(trigger, e),
                },
                Ok(None) => false,
                Err(e) => return self.record_failure(trigger, e),
            }
        };

        let now = Utc::now();
        if let Err(e) = self.adapter.set_last_sync_time(now).await {
            warn!(adapter = name, error = %e, "Failed to persist last sync time");
        }

        self.update(|s| {
            s.is_syncing = false;
            s.has_pending = still_pending;
            s.last_sync_time = Some(now);
            s.retry_count = 0;
            s.next_retry_at = None;
            s.error = None;
        });

        info!(adapter = name, still_pending, "Sync succeeded");
        true
    }

    fn record_failure(self: &Arc<Self>, trigger: Trigger, err: SyncError) -> bool {
        let name = self.adapter.name();
        let prior = match trigger {
            Trigger::Manual => 0,
            Trigger::Automatic => self.state.borrow().retry_count,
        };
        let message = err.to_string();

        match self.options.retry.decide(prior) {
            RetryDecision::Retry { attempt, delay } => {
                let next_at = chrono::Duration::from_std(delay)
                    .ok()
                    .and_then(|d| Utc::now().checked_add_signed(d))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);

                self.update(|s| {
                    s.is_syncing = false;
                    s.error = Some(message.clone());
                    s.retry_count = attempt;
                    s.next_retry_at = Some(next_at);
                });
                self.arm_retry_timer(delay, next_at);

                warn!(
                    adapter = name,
                    error = %message,
                    retry_count = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Sync failed, retry scheduled"
                );
                self.emitter.emit_retry_scheduled(name, attempt, delay);
                self.emitter.emit_error(name, &message, true);
            }
            RetryDecision::Exhausted { attempts } => {
                let exhausted = SyncError::RetriesExhausted(attempts).to_string();

                self.update(|s| {
                    s.is_syncing = false;
                    s.error = Some(exhausted.clone());
                    s.retry_count = prior.saturating_add(1);
                    s.next_retry_at = None;
                });

                error!(adapter = name, error = %message, attempts, "Sync retries exhausted");
                self.emitter.emit_error(name, &exhausted, false);
            }
        }

        false
    }

    // =========================================================================
    // Retry Timer
    // =========================================================================

    fn arm_retry_timer(self: &Arc<Self>, delay: Duration, deadline: DateTime<Utc>) {
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.on_retry_timer(deadline);
            }
        });

        if let Ok(mut timer) = self.retry_timer.lock() {
            if let Some(previous) = timer.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Clears `next_retry_at` if it still belongs to this timer. The watcher
    /// reacts to the change; the timer never starts a sync itself.
    fn on_retry_timer(&self, deadline: DateTime<Utc>) {
        let fired = self.state.send_if_modified(|s| {
            if s.next_retry_at == Some(deadline) {
                s.next_retry_at = None;
                true
            } else {
                false
            }
        });

        if fired {
            debug!(adapter = self.adapter.name(), "Retry timer fired");
            self.emit_status();
        }
    }

    fn cancel_retry_timer(&self) {
        if let Ok(mut timer) = self.retry_timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }

    fn stop_tasks(&self) {
        self.cancel_retry_timer();
        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    fn should_auto_sync(&self) -> bool {
        let state = self.state.borrow();

        self.signals.is_online()
            && self.signals.is_authenticated()
            && state.has_pending
            && !state.is_syncing
            && state.next_retry_at.is_none()
            && !self.in_flight.load(Ordering::Acquire)
            && !self.options.retry.is_exhausted(state.retry_count)
    }

    fn update(&self, f: impl FnOnce(&mut SyncState)) {
        self.state.send_modify(f);
        self.emit_status();
    }

    fn view(&self) -> SyncView {
        SyncView::new(
            &self.state.borrow(),
            self.signals.is_online(),
            self.options.retry.max_retries,
        )
    }

    fn emit_status(&self) {
        self.emitter.emit_status(self.adapter.name(), &self.view());
    }
}

impl<A: SyncAdapter> Drop for Shared<A> {
    fn drop(&mut self) {
        if let Ok(timer) = self.retry_timer.get_mut() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
        if let Ok(watcher) = self.watcher.get_mut() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }
}

// =============================================================================
// In-Flight Guard
// =============================================================================

struct InFlightGuard<A: SyncAdapter> {
    shared: Arc<Shared<A>>,
}

impl<A: SyncAdapter> InFlightGuard<A> {
    fn acquire(shared: &Arc<Shared<A>>) -> Option<Self> {
        shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                shared: shared.clone(),
            })
    }
}

impl<A: SyncAdapter> Drop for InFlightGuard<A> {
    fn drop(&mut self) {
        self.shared.in_flight.store(false, Ordering::Release);

        // Only true here if the attempt future was dropped mid-call.
        self.shared.state.send_if_modified(|s| {
            let stuck = s.is_syncing;
            s.is_syncing = false;
            stuck
        });

        self.shared.wake.notify_one();
    }
}

// =============================================================================
// Auto-Sync Watcher
// =============================================================================

async fn watch_loop<A: SyncAdapter>(
    shared: Weak<Shared<A>>,
    mut signals: SyncSignals,
    mut state: watch::Receiver<SyncState>,
    wake: Arc<Notify>,
) {
    let mut online_open = true;
    let mut auth_open = true;

    loop {
        match shared.upgrade() {
            Some(engine) => {
                if engine.should_auto_sync() {
                    engine.try_attempt(Trigger::Automatic).await;
                }
            }
            None => break,
        }

        tokio::select! {
            changed = signals.online.changed(), if online_open => online_open = changed.is_ok(),
            changed = signals.authenticated.changed(), if auth_open => auth_open = changed.is_ok(),
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = wake.notified() => {}
        }
    }

    debug!("Auto-sync watcher stopped");
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        reps: u32,
    }

    fn item(id: &str, reps: u32) -> Item {
        Item {
            id: id.to_string(),
            reps,
        }
    }

    /// Durable storage shared across engine restarts.
    #[derive(Default, Clone)]
    struct Store {
        slot: Arc<Mutex<Option<Item>>>,
        last_sync: Arc<Mutex<Option<DateTime<Utc>>>>,
    }

    #[derive(Default, Clone)]
    struct MockAdapter {
        store: Store,
        outcomes: Arc<Mutex<VecDeque<bool>>>,
        synced: Arc<Mutex<Vec<Item>>>,
        calls: Arc<AtomicUsize>,
        hook_calls: Arc<AtomicUsize>,
        latency: Duration,
        hook_fails: bool,
        save_fails: bool,
    }

    impl MockAdapter {
        fn with_outcomes(outcomes: &[bool]) -> Self {
            let adapter = MockAdapter::default();
            adapter.outcomes.lock().unwrap().extend(outcomes.iter().copied());
            adapter
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn stored(&self) -> Option<Item> {
            self.store.slot.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SyncAdapter for MockAdapter {
        type Local = Item;
        type Remote = Item;
        type Response = ();

        fn name(&self) -> &'static str {
            "mock"
        }

        async fn get_pending(&self) -> SyncResult<Option<Item>> {
            Ok(self.stored())
        }

        async fn save_local(&self, data: &Item) -> SyncResult<()> {
            if self.save_fails {
                return Err(SyncError::Internal("disk full".into()));
            }
            *self.store.slot.lock().unwrap() = Some(data.clone());
            Ok(())
        }

        async fn clear_pending(&self) -> SyncResult<()> {
            *self.store.slot.lock().unwrap() = None;
            Ok(())
        }

        fn to_remote(&self, local: &Item) -> Item {
            local.clone()
        }

        async fn sync_remote(&self, data: Item) -> SyncResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let ok = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                self.synced.lock().unwrap().push(data);
                Ok(())
            } else {
                Err(SyncError::ServerRejected {
                    status: 503,
                    message: "unavailable".into(),
                })
            }
        }

        async fn on_sync_success(&self, _response: &(), _local: &Item) -> SyncResult<()> {
            self.hook_calls.fetch_add(1, Ordering::SeqCst);
            if self.hook_fails {
                Err(SyncError::Internal("cache write failed".into()))
            } else {
                Ok(())
            }
        }

        async fn last_sync_time(&self) -> SyncResult<Option<DateTime<Utc>>> {
            Ok(*self.store.last_sync.lock().unwrap())
        }

        async fn set_last_sync_time(&self, at: DateTime<Utc>) -> SyncResult<()> {
            *self.store.last_sync.lock().unwrap() = Some(at);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingEmitter {
        delays: Mutex<Vec<Duration>>,
        errors: Mutex<Vec<(String, bool)>>,
    }

    impl SyncEventEmitter for RecordingEmitter {
        fn emit_status(&self, _adapter: &str, _view: &SyncView) {}

        fn emit_retry_scheduled(&self, _adapter: &str, _attempt: u32, delay: Duration) {
            self.delays.lock().unwrap().push(delay);
        }

        fn emit_error(&self, _adapter: &str, message: &str, retryable: bool) {
            self.errors.lock().unwrap().push((message.to_string(), retryable));
        }
    }

    struct Harness {
        online: watch::Sender<bool>,
        auth: watch::Sender<bool>,
        emitter: Arc<RecordingEmitter>,
    }

    impl Harness {
        fn new(online: bool, auth: bool) -> Self {
            Harness {
                online: watch::channel(online).0,
                auth: watch::channel(auth).0,
                emitter: Arc::new(RecordingEmitter::default()),
            }
        }

        async fn start(&self, adapter: MockAdapter, options: EngineOptions) -> SyncedSave<MockAdapter> {
            let signals = SyncSignals::new(self.online.subscribe(), self.auth.subscribe());
            SyncedSave::start_with_emitter(adapter, signals, options, self.emitter.clone())
                .await
                .unwrap()
        }

        fn delays(&self) -> Vec<Duration> {
            self.emitter.delays.lock().unwrap().clone()
        }
    }

    fn options(max_retries: u32, base_ms: u64) -> EngineOptions {
        EngineOptions {
            retry: RetryPolicy::new(max_retries, Duration::from_millis(base_ms)),
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }

    async fn wait_until(engine: &SyncedSave<MockAdapter>, pred: impl FnMut(&SyncState) -> bool) {
        let mut rx = engine.subscribe();
        tokio::time::timeout(Duration::from_secs(24 * 3600), async {
            rx.wait_for(pred).await.map(|_| ()).unwrap();
        })
        .await
        .expect("state condition never reached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_is_durable_before_sync() {
        let harness = Harness::new(false, true);
        let adapter = MockAdapter::default();
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        let synced = engine.save(item("w1", 10)).await.unwrap();

        assert!(!synced);
        let state = engine.state();
        assert!(state.has_pending);
        assert_eq!(state.error.as_deref(), Some("No internet connection"));
        assert_eq!(adapter.calls(), 0);

        // Restart over the same durable store.
        drop(engine);
        let restarted = harness
            .start(
                MockAdapter {
                    store: adapter.store.clone(),
                    ..Default::default()
                },
                options(5, 1000),
            )
            .await;

        assert!(restarted.state().has_pending);
        assert_eq!(restarted.adapter().get_pending().await.unwrap(), Some(item("w1", 10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_local_write_is_the_only_save_error() {
        let h = Harness::new(true, true);
        let adapter = MockAdapter {
            save_fails: true,
            ..Default::default()
        };
        let engine = h.start(adapter.clone(), options(5, 1000)).await;

        let err = engine.save(item("a", 5)).await.unwrap_err();
        assert!(matches!(err, SyncError::Internal(_)));

        let state = engine.state();
        assert!(!state.has_pending);
        assert!(!state.is_syncing);
        assert_eq!(state.error, None);
        assert_eq!(state.retry_count, 0);
        assert_eq!(state.next_retry_at, None);
        assert_eq!(adapter.stored(), None);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(adapter.calls(), 0);
        assert!(h.delays().is_empty());
        assert!(engine.state().next_retry_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_local_write_keeps_earlier_pending_item() {
        let h = Harness::new(false, true);
        let adapter = MockAdapter::default();
        *adapter.store.slot.lock().unwrap() = Some(item("a", 5));
        let failing = MockAdapter {
            save_fails: true,
            ..adapter.clone()
        };
        let engine = h.start(failing, options(5, 1000)).await;
        assert!(engine.state().has_pending);

        assert!(engine.save(item("b", 8)).await.is_err());

        assert!(engine.state().has_pending);
        assert_eq!(adapter.stored(), Some(item("a", 5)));
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_writes_without_syncing() {
        let h = Harness::new(true, true);
        let adapter = MockAdapter::default();
        let engine = h.start(adapter.clone(), options(5, 1000)).await;

        engine.stage(&item("a", 5)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(adapter.stored(), Some(item("a", 5)));
        assert!(!engine.state().has_pending);
        assert_eq!(adapter.calls(), 0);

        assert!(engine.sync_staged().await);
        assert_eq!(adapter.calls(), 1);
        assert_eq!(adapter.stored(), None);
        assert!(!engine.state().has_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_one_sync_in_flight() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter {
            latency: Duration::from_secs(1),
            ..Default::default()
        };
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        // Written behind the engine's back so the watcher stays idle.
        adapter.save_local(&item("w1", 5)).await.unwrap();

        let (first, second) = tokio::join!(engine.force_sync(), engine.force_sync());

        assert!(first);
        assert!(!second);
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_then_stops() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter::with_outcomes(&[false; 10]);
        let engine = harness.start(adapter.clone(), options(4, 1000)).await;
        let started = tokio::time::Instant::now();

        assert!(!engine.save(item("w1", 1)).await.unwrap());
        assert_eq!(engine.state().retry_count, 1);
        assert!(engine.state().next_retry_at.is_some());

        wait_until(&engine, |s| s.retry_count == 4).await;

        assert_eq!(
            harness.delays(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_secs(8));

        let state = engine.state();
        assert_eq!(state.error.as_deref(), Some("Sync failed after 4 attempts. Tap to retry."));
        assert!(state.next_retry_at.is_none());
        assert!(state.has_pending);
        assert!(engine.view().retries_exhausted);

        // Nothing else fires on its own.
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(adapter.calls(), 4);

        // A manual retry starts over.
        adapter.outcomes.lock().unwrap().clear();
        assert!(engine.force_sync().await);
        assert_eq!(engine.state().retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_state() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter::default();
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        assert!(engine.save(item("w1", 8)).await.unwrap());

        let state = engine.state();
        assert!(!state.has_pending);
        assert!(!state.is_syncing);
        assert_eq!(state.error, None);
        assert_eq!(state.retry_count, 0);
        assert_eq!(state.next_retry_at, None);
        assert!(state.last_sync_time.is_some());
        assert_eq!(*adapter.store.last_sync.lock().unwrap(), state.last_sync_time);
        assert_eq!(adapter.stored(), None);
        assert_eq!(adapter.hook_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_triggers_one_sync() {
        let harness = Harness::new(false, true);
        let adapter = MockAdapter::default();
        adapter.save_local(&item("w1", 3)).await.unwrap();

        let engine = harness.start(adapter.clone(), options(5, 1000)).await;
        assert!(engine.state().has_pending);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(adapter.calls(), 0);

        harness.online.send_replace(true);
        wait_until(&engine, |s| !s.has_pending).await;

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_triggers_sync() {
        let harness = Harness::new(true, false);
        let adapter = MockAdapter::default();
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        assert!(!engine.save(item("w1", 3)).await.unwrap());
        assert_eq!(engine.state().error.as_deref(), Some("Not authenticated"));

        harness.auth.send_replace(true);
        wait_until(&engine, |s| !s.has_pending).await;
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_sync_preempts_scheduled_retry() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter::with_outcomes(&[false]);
        let engine = harness.start(adapter.clone(), options(5, 60_000)).await;

        assert!(!engine.save(item("w1", 1)).await.unwrap());
        assert!(engine.state().next_retry_at.is_some());

        let started = tokio::time::Instant::now();
        assert!(engine.force_sync().await);
        assert!(started.elapsed() < Duration::from_secs(1));

        let state = engine.state();
        assert_eq!(state.next_retry_at, None);
        assert_eq!(state.retry_count, 0);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(adapter.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_save_then_recover_after_two_failures() {
        let harness = Harness::new(false, true);
        let adapter = MockAdapter::with_outcomes(&[false, false, true]);
        let engine = harness.start(adapter.clone(), options(5, 30_000)).await;

        assert!(!engine.save(item("w1", 10)).await.unwrap());
        let state = engine.state();
        assert!(state.has_pending);
        assert_eq!(state.error.as_deref(), Some("No internet connection"));

        harness.online.send_replace(true);
        wait_until(&engine, |s| !s.has_pending).await;

        let state = engine.state();
        assert_eq!(state.retry_count, 0);
        assert!(state.last_sync_time.is_some());
        assert_eq!(adapter.calls(), 3);
        assert_eq!(
            harness.delays(),
            vec![Duration::from_secs(30), Duration::from_secs(60)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hook_failure_still_clears_pending() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter {
            hook_fails: true,
            ..Default::default()
        };
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        assert!(engine.save(item("w1", 5)).await.unwrap());
        assert!(!engine.state().has_pending);
        assert_eq!(adapter.stored(), None);

        let errors = harness.emitter.errors.lock().unwrap().clone();
        assert_eq!(errors, vec![("Internal error: cache write failed".to_string(), false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_during_flight_is_not_lost() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter {
            latency: Duration::from_secs(1),
            ..Default::default()
        };
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        let (first, second) = tokio::join!(engine.save(item("a", 1)), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            engine.save(item("b", 2)).await
        });

        assert!(first.unwrap());
        assert!(!second.unwrap());

        wait_until(&engine, |s| !s.has_pending).await;
        assert_eq!(*adapter.synced.lock().unwrap(), vec![item("a", 1), item("b", 2)]);
        assert_eq!(adapter.stored(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_remote_times_out() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter {
            latency: Duration::from_secs(600),
            ..Default::default()
        };
        let engine = harness
            .start(
                adapter,
                EngineOptions {
                    retry: RetryPolicy::new(5, Duration::from_secs(30)),
                    sync_timeout: Duration::from_secs(5),
                },
            )
            .await;

        assert!(!engine.save(item("w1", 1)).await.unwrap());

        let state = engine.state();
        assert!(!state.is_syncing);
        assert_eq!(state.error.as_deref(), Some("Sync timed out after 5 seconds"));
        assert_eq!(state.retry_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_error_and_trivial_success() {
        let harness = Harness::new(false, true);
        let adapter = MockAdapter::default();
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        assert!(!engine.force_sync().await);
        assert_eq!(engine.state().error.as_deref(), Some("No internet connection"));

        engine.clear_error();
        assert_eq!(engine.state().error, None);

        harness.online.send_replace(true);
        assert!(engine.force_sync().await);
        assert!(!engine.state().has_pending);
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_retry_timer() {
        let harness = Harness::new(true, true);
        let adapter = MockAdapter::with_outcomes(&[false]);
        let engine = harness.start(adapter.clone(), options(5, 1000)).await;

        assert!(!engine.save(item("w1", 1)).await.unwrap());
        engine.shutdown();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(adapter.calls(), 1);
        assert!(engine.state().next_retry_at.is_some());
    }
}
