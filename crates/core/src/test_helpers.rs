// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for processor and orchestrator tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::connectivity::{NetworkState, WatchConnectivity};
use crate::error::SyncError;
use crate::processor::{ProcessorConfig, QueueProcessor};
use crate::record::{QueueRecord, RecordId};
use crate::store::QueueStore;
use crate::synchronizer::{ItemSynchronizer, SyncFuture};

/// How the scripted synchronizer answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    /// Never settles.
    Hang,
}

/// Synchronizer whose answers are scripted by the test.
pub struct ScriptedSynchronizer {
    behavior: Mutex<Behavior>,
    failing: Mutex<HashSet<RecordId>>,
    calls: Mutex<Vec<RecordId>>,
    call_count: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedSynchronizer {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(ScriptedSynchronizer {
            behavior: Mutex::new(behavior),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
            delay: Mutex::new(None),
            gate: Mutex::new(None),
        })
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Makes deliveries of `id` fail regardless of the default behavior.
    pub fn fail_for(&self, id: &RecordId) {
        self.failing.lock().unwrap().insert(id.clone());
    }

    /// Sleeps before answering, so concurrent callers interleave.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Blocks every delivery until the returned semaphore gets a permit.
    pub fn gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordId> {
        self.calls.lock().unwrap().clone()
    }
}

impl ItemSynchronizer for ScriptedSynchronizer {
    fn sync_item<'a>(&'a self, record: &'a QueueRecord) -> SyncFuture<'a> {
        Box::pin(async move {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push(record.id.clone());

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }

            if self.failing.lock().unwrap().contains(&record.id) {
                return Err(SyncError::Transient("scripted failure".into()));
            }
            let behavior = *self.behavior.lock().unwrap();
            match behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(SyncError::Transient("scripted failure".into())),
                Behavior::Hang => std::future::pending().await,
            }
        })
    }
}

/// A processor over an in-memory store with a scripted synchronizer.
pub struct Harness {
    pub store: Arc<QueueStore>,
    pub synchronizer: Arc<ScriptedSynchronizer>,
    pub connectivity: Arc<WatchConnectivity>,
    pub processor: Arc<QueueProcessor>,
}

impl Harness {
    pub fn new(behavior: Behavior, network: NetworkState) -> Self {
        Self::with_config(behavior, network, ProcessorConfig::default())
    }

    pub fn with_config(behavior: Behavior, network: NetworkState, config: ProcessorConfig) -> Self {
        let store = Arc::new(QueueStore::in_memory());
        let synchronizer = ScriptedSynchronizer::new(behavior);
        let connectivity = Arc::new(WatchConnectivity::new(network));
        let processor = Arc::new(QueueProcessor::with_config(
            Arc::clone(&store),
            synchronizer.clone(),
            connectivity.clone(),
            config,
        ));
        Harness { store, synchronizer, connectivity, processor }
    }
}
