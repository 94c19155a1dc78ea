// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregate sync state for the presentation layer.
//!
//! The orchestrator publishes `{syncing, offline, pending_count}` through a
//! watch channel and exposes one command, [`SyncOrchestrator::sync_now`]. It
//! wires the connectivity observer to the queue processor: every transition
//! that is affirmatively online triggers a drain.
//!
//! # State machine
//!
//! ```text
//!              connectivity: online edge
//!   ┌──────────────┐  sync_now()   ┌──────────────┐
//!   │     idle     │──────────────►│   syncing    │
//!   │              │◄──────────────│              │
//!   └──────────────┘  pass settles └──────────────┘
//!          ×  {online, offline} tracked independently
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connectivity::NetworkState;
use crate::fanout::Subscription;
use crate::processor::{ProcessOutcome, QueueProcessor};

/// Sync state observed by the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub syncing: bool,
    pub offline: bool,
    pub pending_count: usize,
}

struct Inner {
    processor: Arc<QueueProcessor>,
    status: watch::Sender<SyncStatus>,
    syncing: AtomicBool,
    shutdown: CancellationToken,
}

/// Resets the syncing flag when a drain settles, even by unwinding.
struct SyncingGuard<'a> {
    inner: &'a Inner,
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.inner.syncing.store(false, Ordering::Release);
        self.inner.status.send_modify(|s| s.syncing = false);
    }
}

impl Inner {
    async fn sync_now(&self) -> Option<ProcessOutcome> {
        if self.syncing.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            debug!("sync already in progress");
            return None;
        }
        let _guard = SyncingGuard { inner: self };
        self.status.send_modify(|s| s.syncing = true);

        let outcome = self.processor.process_until(&self.shutdown).await;
        match &outcome {
            ProcessOutcome::Completed(report) if report.attempted() > 0 => {
                info!(
                    delivered = report.delivered,
                    failed = report.failed + report.timed_out,
                    skipped = report.skipped,
                    "sync finished"
                );
            }
            ProcessOutcome::Failed(e) => warn!(error = %e, "sync failed"),
            other => debug!(outcome = ?other, "sync settled"),
        }
        Some(outcome)
    }

    fn apply_network(&self, state: NetworkState) {
        let offline = state.is_offline();
        self.status.send_if_modified(|s| {
            let changed = s.offline != offline;
            s.offline = offline;
            changed
        });
    }

    fn set_pending(&self, count: usize) {
        self.status.send_if_modified(|s| {
            let changed = s.pending_count != count;
            s.pending_count = count;
            changed
        });
    }
}

/// Owns the aggregate sync state and the automatic reconnect trigger.
pub struct SyncOrchestrator {
    inner: Arc<Inner>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SyncOrchestrator {
    /// Starts observing connectivity and the queue.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(processor: Arc<QueueProcessor>) -> Self {
        let connectivity = Arc::clone(processor.connectivity());
        let initial = connectivity.current();
        let (status, _) = watch::channel(SyncStatus {
            syncing: false,
            offline: initial.is_offline(),
            pending_count: 0,
        });

        let store = Arc::clone(processor.store());
        let inner = Arc::new(Inner {
            processor,
            status,
            syncing: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        });

        let listener = Arc::downgrade(&inner);
        let subscription = store.subscribe(move |records| {
            if let Some(inner) = listener.upgrade() {
                inner.set_pending(records.len());
            }
        });

        let mut transitions = connectivity.watch();
        let watched = Arc::clone(&inner);
        let watcher = tokio::spawn(async move {
            while transitions.changed().await.is_ok() {
                let state = *transitions.borrow_and_update();
                debug!(?state, "connectivity transition");
                watched.apply_network(state);

                if state.is_affirmatively_online() {
                    info!("connectivity restored, draining offline queue");
                    let trigger = Arc::clone(&watched);
                    tokio::spawn(async move {
                        trigger.sync_now().await;
                    });
                }
            }
        });

        SyncOrchestrator {
            inner,
            watcher: Mutex::new(Some(watcher)),
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Current sync state.
    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    /// A receiver that wakes whenever the sync state changes.
    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    pub fn is_syncing(&self) -> bool {
        self.status().syncing
    }

    pub fn is_offline(&self) -> bool {
        self.status().offline
    }

    pub fn pending_count(&self) -> usize {
        self.status().pending_count
    }

    /// Drains the queue unless a drain is already in progress.
    ///
    /// Returns `None` when the call was a no-op. Failures are logged, never
    /// raised.
    pub async fn sync_now(&self) -> Option<ProcessOutcome> {
        self.inner.sync_now().await
    }

    /// Re-reads the queue to pick up records written by other processes.
    pub fn refresh(&self) -> usize {
        let count = self.inner.processor.store().pending_count();
        self.inner.set_pending(count);
        count
    }

    /// Stops the reconnect trigger, drops the queue subscription and cancels
    /// any in-flight pass.
    ///
    /// Only passes driven by this orchestrator are affected. After shutdown
    /// its [`sync_now`](Self::sync_now) attempts nothing, while the shared
    /// processor keeps working for its other callers.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.detach();
    }

    fn detach(&self) {
        if let Some(watcher) = self.watcher.lock().unwrap_or_else(|e| e.into_inner()).take() {
            watcher.abort();
        }
        self.subscription.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

impl Drop for SyncOrchestrator {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
