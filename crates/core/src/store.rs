// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue store.
//!
//! Records live in a single storage slot as a JSON array in insertion order.
//! Every write rewrites the whole array. Each operation comes in two forms:
//! a `try_*` form returning [`Result`], and a best-effort form that logs the
//! failure and degrades to a no-op (or an empty list) so producers are never
//! disrupted by persistence trouble.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::fanout::{EventFanout, Subscription};
use crate::record::{MutationKind, QueueRecord, RecordId};
use crate::storage::{FileStorage, MemoryStorage, QueueStorage};

/// Persisted, observable FIFO of pending mutations.
pub struct QueueStore {
    storage: Box<dyn QueueStorage>,
    clock: Arc<dyn ClockSource>,
    fanout: EventFanout,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl QueueStore {
    /// Creates a store over the given backend using the system clock.
    pub fn new(storage: impl QueueStorage + 'static) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Creates a store with a custom clock source (for testing).
    pub fn with_clock(storage: impl QueueStorage + 'static, clock: Arc<dyn ClockSource>) -> Self {
        QueueStore {
            storage: Box::new(storage),
            clock,
            fanout: EventFanout::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Opens a file-backed store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileStorage::open(path)?))
    }

    /// Creates a store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Reads the current record list.
    ///
    /// A slot that was never written, or was cleared, yields an empty list.
    pub fn try_list(&self) -> Result<Vec<QueueRecord>> {
        match self.storage.load()? {
            Some(contents) if !contents.trim().is_empty() => Ok(serde_json::from_str(&contents)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Reads the current record list, returning an empty list on any failure.
    pub fn list(&self) -> Vec<QueueRecord> {
        self.try_list().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read offline queue");
            Vec::new()
        })
    }

    /// Number of records currently queued.
    pub fn pending_count(&self) -> usize {
        self.list().len()
    }

    /// Appends a new record and notifies listeners.
    pub fn try_enqueue(&self, kind: MutationKind, data: serde_json::Value) -> Result<QueueRecord> {
        let mut record = QueueRecord::new(kind, data, self.clock.now_ms());

        let (seq, snapshot) = self.mutate(|records| {
            while records.iter().any(|r| r.id == record.id) {
                record.id = RecordId::generate(kind, record.created_at);
            }
            records.push(record.clone());
            Ok(())
        })?;

        debug!(id = %record.id, kind = %kind, "enqueued record");
        self.fanout.publish(seq, snapshot);
        Ok(record)
    }

    /// Appends a new record, logging instead of failing.
    ///
    /// Returns the stored record, or `None` if it could not be persisted.
    pub fn enqueue(&self, kind: MutationKind, data: serde_json::Value) -> Option<QueueRecord> {
        match self.try_enqueue(kind, data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind = %kind, error = %e, "failed to persist queued mutation");
                None
            }
        }
    }

    /// Removes the record with `id` and notifies listeners.
    ///
    /// Returns whether a record was removed.
    pub fn try_remove(&self, id: &RecordId) -> Result<bool> {
        let mut removed = false;
        let (seq, snapshot) = self.mutate(|records| {
            let before = records.len();
            records.retain(|r| &r.id != id);
            removed = records.len() != before;
            Ok(())
        })?;

        self.fanout.publish(seq, snapshot);
        Ok(removed)
    }

    /// Removes the record with `id`, logging instead of failing.
    pub fn remove(&self, id: &RecordId) {
        if let Err(e) = self.try_remove(id) {
            warn!(id = %id, error = %e, "failed to remove queued record");
        }
    }

    /// Bumps the retry count of the record with `id` and returns the new count.
    ///
    /// This is internal bookkeeping: listeners are not notified.
    pub fn try_increment_retry(&self, id: &RecordId) -> Result<u32> {
        let mut count = None;
        self.mutate(|records| {
            let record = records
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
            record.retry_count = record.retry_count.saturating_add(1);
            count = Some(record.retry_count);
            Ok(())
        })?;

        count.ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    /// Bumps the retry count of the record with `id`, logging instead of failing.
    pub fn increment_retry(&self, id: &RecordId) {
        if let Err(e) = self.try_increment_retry(id) {
            warn!(id = %id, error = %e, "failed to record retry");
        }
    }

    /// Deletes the persisted slot and notifies listeners once.
    pub fn try_clear(&self) -> Result<()> {
        let seq = {
            let _local = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            let _storage = self.storage.lock()?;
            self.storage.delete()?;
            self.fanout.stamp()
        };

        debug!("cleared offline queue");
        self.fanout.publish(seq, Vec::new());
        Ok(())
    }

    /// Deletes the persisted slot, logging instead of failing.
    pub fn clear(&self) {
        if let Err(e) = self.try_clear() {
            warn!(error = %e, "failed to clear offline queue");
        }
    }

    /// Registers a listener; it is called at once with the current records and
    /// again after every enqueue, remove and clear.
    ///
    /// No mutation can commit between reading the first snapshot and
    /// registering, so the listener never settles on a stale list. Under
    /// contention the first call may already carry a newer snapshot.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[QueueRecord]) + Send + Sync + 'static,
    {
        let (seq, snapshot, subscription) = {
            let _local = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            let snapshot = self.list();
            (self.fanout.latest(), snapshot, self.fanout.register(listener))
        };
        self.fanout.deliver(&subscription, seq, snapshot);
        subscription
    }

    /// The fan-out this store notifies.
    pub fn fanout(&self) -> &EventFanout {
        &self.fanout
    }

    /// Runs one read-modify-write cycle and returns the records as written,
    /// stamped with their fan-out sequence number.
    ///
    /// Listeners are notified by the caller after the locks are released.
    fn mutate<F>(&self, apply: F) -> Result<(u64, Vec<QueueRecord>)>
    where
        F: FnOnce(&mut Vec<QueueRecord>) -> Result<()>,
    {
        let _local = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let _storage = self.storage.lock()?;

        let mut records = match self.try_list() {
            Ok(records) => records,
            Err(Error::Json(e)) => {
                warn!(error = %e, "offline queue is unreadable, starting from an empty list");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        apply(&mut records)?;
        self.storage.save(&serde_json::to_string(&records)?)?;
        Ok((self.fanout.stamp(), records))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
