// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry of queue listeners.
//!
//! Listeners receive the full record list after every externally observable
//! store mutation. Each snapshot carries the sequence number stamped when it
//! was committed; a listener only ever moves forward, so a snapshot older than
//! one it has already seen (or is about to see) is dropped. Identical contents
//! under distinct sequence numbers are still delivered. Listeners are called
//! in no particular order relative to each other, always outside the registry
//! lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::record::QueueRecord;

type Listener = Box<dyn Fn(&[QueueRecord]) + Send + Sync>;

/// A committed record list, shared by every listener it is delivered to.
pub type Snapshot = Arc<[QueueRecord]>;

#[derive(Default)]
struct Mailbox {
    delivered: Option<u64>,
    pending: Option<(u64, Snapshot)>,
    draining: bool,
}

struct Slot {
    listener: Listener,
    mailbox: Mutex<Mailbox>,
}

impl Slot {
    fn mailbox(&self) -> std::sync::MutexGuard<'_, Mailbox> {
        self.mailbox.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues `snapshot` unless something at least as new is already queued
    /// or delivered. Whichever caller finds the slot idle drains it; a caller
    /// that finds it busy (including the listener itself, re-entering through
    /// a store mutation) leaves the snapshot for the active drainer.
    fn offer(&self, seq: u64, snapshot: &Snapshot) {
        {
            let mut mailbox = self.mailbox();
            let newest = mailbox.pending.as_ref().map(|(s, _)| *s).or(mailbox.delivered);
            if newest.is_some_and(|newest| newest >= seq) {
                return;
            }
            mailbox.pending = Some((seq, Arc::clone(snapshot)));
            if mailbox.draining {
                return;
            }
            mailbox.draining = true;
        }

        let _idle = DrainGuard { slot: self };
        loop {
            let next = {
                let mut mailbox = self.mailbox();
                match mailbox.pending.take() {
                    Some((seq, snapshot)) => {
                        mailbox.delivered = Some(seq);
                        snapshot
                    }
                    None => {
                        mailbox.draining = false;
                        return;
                    }
                }
            };
            (self.listener)(&next);
        }
    }
}

/// Marks the slot idle again if a listener unwinds mid-drain.
struct DrainGuard<'a> {
    slot: &'a Slot,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.slot.mailbox().draining = false;
        }
    }
}

#[derive(Default)]
struct Registry {
    listeners: Mutex<BTreeMap<u64, Arc<Slot>>>,
    next_id: AtomicU64,
    seq: AtomicU64,
}

impl Registry {
    fn slots(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Arc<Slot>>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove(&self, id: u64) {
        self.slots().remove(&id);
    }
}

/// Fan-out of queue snapshots to registered listeners.
#[derive(Clone, Default)]
pub struct EventFanout {
    registry: Arc<Registry>,
}

impl EventFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the sequence number for a new snapshot.
    ///
    /// Call it while holding the lock that orders the mutations being
    /// published, so sequence order matches commit order.
    pub fn stamp(&self) -> u64 {
        self.registry.seq.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// The most recently stamped sequence number, `0` before the first stamp.
    pub fn latest(&self) -> u64 {
        self.registry.seq.load(Ordering::Acquire)
    }

    /// Registers `listener` without calling it.
    ///
    /// Pair with [`deliver`](Self::deliver) to hand it its first snapshot once
    /// any caller-held locks are released.
    pub fn register<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[QueueRecord]) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot { listener: Box::new(listener), mailbox: Mutex::default() });
        self.registry.slots().insert(id, slot);
        Subscription { registry: Arc::downgrade(&self.registry), id: Some(id) }
    }

    /// Offers one snapshot to a single subscription.
    pub fn deliver(
        &self,
        subscription: &Subscription,
        seq: u64,
        snapshot: impl Into<Snapshot>,
    ) {
        let slot = subscription.id.and_then(|id| self.registry.slots().get(&id).cloned());
        if let Some(slot) = slot {
            slot.offer(seq, &snapshot.into());
        }
    }

    /// Registers `listener` and immediately calls it once with `snapshot`.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, snapshot: impl Into<Snapshot>, listener: F) -> Subscription
    where
        F: Fn(&[QueueRecord]) + Send + Sync + 'static,
    {
        let seq = self.latest();
        let subscription = self.register(listener);
        self.deliver(&subscription, seq, snapshot);
        subscription
    }

    /// Offers the snapshot committed as `seq` to every listener.
    pub fn publish(&self, seq: u64, snapshot: impl Into<Snapshot>) {
        let snapshot = snapshot.into();
        // Listeners run outside the lock so they may subscribe or unsubscribe.
        let slots: Vec<Arc<Slot>> = self.registry.slots().values().cloned().collect();
        for slot in slots {
            slot.offer(seq, &snapshot);
        }
    }

    /// Stamps and publishes `snapshot` in one step.
    pub fn notify(&self, snapshot: impl Into<Snapshot>) {
        let seq = self.stamp();
        self.publish(seq, snapshot);
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.slots().len()
    }
}

/// Disposer returned by [`EventFanout::subscribe`].
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    registry: Weak<Registry>,
    id: Option<u64>,
}

impl Subscription {
    /// Removes the listener from the registry.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let (Some(id), Some(registry)) = (self.id.take(), self.registry.upgrade()) {
            registry.remove(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[path = "fanout_tests.rs"]
mod tests;
