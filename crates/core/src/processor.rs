// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight consumer that drains the queue store.
//!
//! One pass reads the record list once and walks it in store order:
//!
//! - records at or above the retry budget are skipped and left in place
//! - every other record is handed to the [`ItemSynchronizer`] under a
//!   per-record timeout
//! - a delivered record is removed; a failed or timed-out one has its retry
//!   count bumped
//!
//! A pass never starts while offline and never overlaps another pass: a
//! concurrent call returns [`ProcessOutcome::AlreadyRunning`] without doing
//! any work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connectivity::ConnectivityObserver;
use crate::error::{Error, SyncError};
use crate::record::{QueueRecord, RecordId};
use crate::store::QueueStore;
use crate::synchronizer::ItemSynchronizer;

/// Default number of failed attempts after which a record is no longer retried.
pub const MAX_RETRIES: u32 = 3;

/// Default upper bound on a single delivery call.
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning for the queue processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Retry budget per record.
    pub max_retries: u32,
    /// Timeout applied to each delivery call.
    pub item_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig { max_retries: MAX_RETRIES, item_timeout: DEFAULT_ITEM_TIMEOUT }
    }
}

/// Tally of one processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    /// Records delivered and removed.
    pub delivered: usize,
    /// Records whose delivery call failed.
    pub failed: usize,
    /// Records whose delivery call exceeded the timeout.
    pub timed_out: usize,
    /// Records skipped because their retry budget is spent.
    pub skipped: usize,
}

impl PassReport {
    /// Number of delivery calls made.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed + self.timed_out
    }
}

/// How a call to [`QueueProcessor::process`] ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Connectivity reported offline; the store was not touched.
    Offline,
    /// Another pass was in progress; this call did nothing.
    AlreadyRunning,
    /// The pass walked the whole snapshot.
    Completed(PassReport),
    /// The processor was cancelled mid-pass. The in-flight record is untouched.
    Cancelled(PassReport),
    /// The pass could not read the store.
    Failed(Error),
}

impl ProcessOutcome {
    /// The pass report, if a pass actually ran.
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            ProcessOutcome::Completed(report) | ProcessOutcome::Cancelled(report) => Some(report),
            _ => None,
        }
    }
}

/// Clears the running flag on every exit path, unwinding included.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

enum Attempt {
    Delivered,
    Failed(SyncError),
    TimedOut,
}

/// Drains the queue store through an item synchronizer.
pub struct QueueProcessor {
    store: Arc<QueueStore>,
    synchronizer: Arc<dyn ItemSynchronizer>,
    connectivity: Arc<dyn ConnectivityObserver>,
    config: ProcessorConfig,
    running: AtomicBool,
    current_pass: Mutex<CancellationToken>,
}

impl QueueProcessor {
    /// Creates a processor with the default retry budget and timeout.
    pub fn new(
        store: Arc<QueueStore>,
        synchronizer: Arc<dyn ItemSynchronizer>,
        connectivity: Arc<dyn ConnectivityObserver>,
    ) -> Self {
        Self::with_config(store, synchronizer, connectivity, ProcessorConfig::default())
    }

    pub fn with_config(
        store: Arc<QueueStore>,
        synchronizer: Arc<dyn ItemSynchronizer>,
        connectivity: Arc<dyn ConnectivityObserver>,
        config: ProcessorConfig,
    ) -> Self {
        QueueProcessor {
            store,
            synchronizer,
            connectivity,
            config,
            running: AtomicBool::new(false),
            current_pass: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn store(&self) -> &Arc<QueueStore> {
        &self.store
    }

    pub fn connectivity(&self) -> &Arc<dyn ConnectivityObserver> {
        &self.connectivity
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// True while a pass is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Abandons the pass in flight, if any. Later passes run normally.
    pub fn cancel(&self) {
        self.current_pass.lock().unwrap_or_else(|e| e.into_inner()).cancel();
    }

    /// Runs one processing pass.
    pub async fn process(&self) -> ProcessOutcome {
        self.run_pass(None).await
    }

    /// Runs one processing pass that is also abandoned once `shutdown` fires.
    ///
    /// A pass started after `shutdown` fired delivers nothing. It reports
    /// [`ProcessOutcome::Cancelled`] at the first record it would attempt.
    pub async fn process_until(&self, shutdown: &CancellationToken) -> ProcessOutcome {
        self.run_pass(Some(shutdown)).await
    }

    async fn run_pass(&self, shutdown: Option<&CancellationToken>) -> ProcessOutcome {
        if self.connectivity.current().is_offline() {
            debug!("offline, skipping queue pass");
            return ProcessOutcome::Offline;
        }

        let Some(_guard) = RunGuard::acquire(&self.running) else {
            debug!("queue pass already running");
            return ProcessOutcome::AlreadyRunning;
        };

        let cancel = match shutdown {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        *self.current_pass.lock().unwrap_or_else(|e| e.into_inner()) = cancel.clone();

        let records = match self.store.try_list() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "queue pass aborted: cannot read store");
                return ProcessOutcome::Failed(e);
            }
        };

        debug!(records = records.len(), "starting queue pass");
        let mut report = PassReport::default();

        for record in &records {
            if record.is_exhausted(self.config.max_retries) {
                debug!(id = %record.id, retries = record.retry_count, "retry budget spent, skipping");
                report.skipped += 1;
                continue;
            }

            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(id = %record.id, "queue pass cancelled");
                    return ProcessOutcome::Cancelled(report);
                }
                attempt = self.attempt(record) => attempt,
            };

            match attempt {
                Attempt::Delivered => {
                    info!(id = %record.id, kind = %record.kind, "delivered queued mutation");
                    self.store.remove(&record.id);
                    report.delivered += 1;
                }
                Attempt::Failed(e) => {
                    warn!(id = %record.id, kind = %record.kind, error = %e, "delivery failed");
                    self.record_retry(&record.id);
                    report.failed += 1;
                }
                Attempt::TimedOut => {
                    warn!(
                        id = %record.id,
                        kind = %record.kind,
                        timeout = ?self.config.item_timeout,
                        "delivery timed out"
                    );
                    self.record_retry(&record.id);
                    report.timed_out += 1;
                }
            }
        }

        debug!(?report, "queue pass finished");
        ProcessOutcome::Completed(report)
    }

    async fn attempt(&self, record: &QueueRecord) -> Attempt {
        match tokio::time::timeout(self.config.item_timeout, self.synchronizer.sync_item(record))
            .await
        {
            Ok(Ok(())) => Attempt::Delivered,
            Ok(Err(e)) => Attempt::Failed(e),
            Err(_) => Attempt::TimedOut,
        }
    }

    fn record_retry(&self, id: &RecordId) {
        match self.store.try_increment_retry(id) {
            Ok(count) if count >= self.config.max_retries => {
                warn!(id = %id, retries = count, "record exhausted its retry budget");
            }
            Ok(_) => {}
            // Cleared while the delivery call was in flight.
            Err(Error::RecordNotFound(_)) => debug!(id = %id, "record vanished before retry bump"),
            Err(e) => warn!(id = %id, error = %e, "failed to record retry"),
        }
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
