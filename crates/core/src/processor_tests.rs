// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::connectivity::{NetworkState, WatchConnectivity};
use crate::record::MutationKind;
use crate::storage::MemoryStorage;
use crate::test_helpers::{Behavior, Harness, ScriptedSynchronizer};
use serde_json::json;
use std::sync::Mutex;

fn enqueue(store: &QueueStore, n: i64) -> QueueRecord {
    store.enqueue(MutationKind::SyncXp, json!({ "amount": n })).unwrap()
}

async fn wait_for_calls(sync: &ScriptedSynchronizer, count: usize) {
    while sync.call_count() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn drains_records_in_order_with_shrinking_notifications() {
    let h = Harness::new(Behavior::Succeed, NetworkState::ONLINE);
    let a = enqueue(&h.store, 1);
    let b = enqueue(&h.store, 2);
    let c = enqueue(&h.store, 3);

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sizes);
    let _sub = h.store.subscribe(move |records| sink.lock().unwrap().push(records.len()));

    let outcome = h.processor.process().await;

    let report = outcome.report().copied().unwrap();
    assert_eq!(report.delivered, 3);
    assert_eq!(report.attempted(), 3);
    assert!(h.store.list().is_empty());
    assert_eq!(h.synchronizer.calls(), vec![a.id, b.id, c.id]);
    assert_eq!(*sizes.lock().unwrap(), vec![3, 2, 1, 0]);
}

#[tokio::test]
async fn failing_record_stops_at_retry_budget() {
    let h = Harness::new(Behavior::Fail, NetworkState::ONLINE);
    let record = enqueue(&h.store, 1);

    for pass in 1..=3 {
        let outcome = h.processor.process().await;
        assert_eq!(outcome.report().unwrap().failed, 1);
        assert_eq!(h.store.list()[0].retry_count, pass);
    }

    let outcome = h.processor.process().await;

    let report = outcome.report().copied().unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.attempted(), 0);
    assert_eq!(h.synchronizer.call_count(), 3);
    let records = h.store.list();
    assert_eq!(records.len(), 1, "exhausted records are never auto-discarded");
    assert_eq!(records[0].id, record.id);
    assert_eq!(records[0].retry_count, 3);
}

#[tokio::test]
async fn exhausted_record_does_not_block_later_records() {
    let h = Harness::new(Behavior::Succeed, NetworkState::ONLINE);
    let stuck = enqueue(&h.store, 1);
    for _ in 0..MAX_RETRIES {
        h.store.increment_retry(&stuck.id);
    }
    let next = enqueue(&h.store, 2);

    let outcome = h.processor.process().await;

    let report = outcome.report().copied().unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(h.synchronizer.calls(), vec![next.id]);
    assert_eq!(h.store.list()[0].id, stuck.id);
}

#[tokio::test]
async fn failure_only_bumps_the_failing_record() {
    let h = Harness::new(Behavior::Succeed, NetworkState::ONLINE);
    let a = enqueue(&h.store, 1);
    let b = enqueue(&h.store, 2);
    let c = enqueue(&h.store, 3);
    h.synchronizer.fail_for(&b.id);

    let report = h.processor.process().await.report().copied().unwrap();

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 1);
    let records = h.store.list();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, b.id);
    assert_eq!(records[0].retry_count, 1);
    assert_eq!(h.synchronizer.calls(), vec![a.id, b.id, c.id]);
}

#[tokio::test]
async fn concurrent_passes_drain_exactly_once() {
    let h = Harness::new(Behavior::Succeed, NetworkState::ONLINE);
    h.synchronizer.set_delay(Duration::from_millis(5));
    for n in 0..3 {
        enqueue(&h.store, n);
    }

    let (first, second) = tokio::join!(h.processor.process(), h.processor.process());

    assert!(matches!(first, ProcessOutcome::Completed(_)));
    assert!(matches!(second, ProcessOutcome::AlreadyRunning));
    assert_eq!(h.synchronizer.call_count(), 3);
    assert!(h.store.list().is_empty());
    assert!(!h.processor.is_running());
}

#[tokio::test]
async fn offline_pass_makes_no_calls() {
    let h = Harness::new(Behavior::Succeed, NetworkState::OFFLINE);
    enqueue(&h.store, 1);
    enqueue(&h.store, 2);

    let outcome = h.processor.process().await;

    assert!(matches!(outcome, ProcessOutcome::Offline));
    assert_eq!(h.synchronizer.call_count(), 0);
    assert_eq!(h.store.pending_count(), 2);
    assert!(!h.processor.is_running());
}

#[tokio::test]
async fn unknown_connectivity_is_treated_as_online() {
    let h = Harness::new(Behavior::Succeed, NetworkState::UNKNOWN);
    enqueue(&h.store, 1);

    let outcome = h.processor.process().await;

    assert_eq!(outcome.report().unwrap().delivered, 1);
}

#[tokio::test]
async fn guard_is_released_after_each_pass() {
    let h = Harness::new(Behavior::Fail, NetworkState::ONLINE);
    enqueue(&h.store, 1);

    h.processor.process().await;
    assert!(!h.processor.is_running());

    h.synchronizer.set_behavior(Behavior::Succeed);
    let outcome = h.processor.process().await;
    assert_eq!(outcome.report().unwrap().delivered, 1);
}

#[tokio::test(start_paused = true)]
async fn hung_delivery_times_out_and_counts_as_failure() {
    let config = ProcessorConfig { max_retries: 3, item_timeout: Duration::from_secs(5) };
    let h = Harness::with_config(Behavior::Hang, NetworkState::ONLINE, config);
    enqueue(&h.store, 1);
    enqueue(&h.store, 2);

    let report = h.processor.process().await.report().copied().unwrap();

    assert_eq!(report.timed_out, 2);
    assert!(h.store.list().iter().all(|r| r.retry_count == 1));
    assert!(!h.processor.is_running());
}

#[tokio::test]
async fn cancel_abandons_in_flight_record() {
    let h = Harness::new(Behavior::Hang, NetworkState::ONLINE);
    let record = enqueue(&h.store, 1);

    let processor = Arc::clone(&h.processor);
    let pass = tokio::spawn(async move { processor.process().await });
    wait_for_calls(&h.synchronizer, 1).await;

    h.processor.cancel();
    let outcome = pass.await.unwrap();

    assert!(matches!(outcome, ProcessOutcome::Cancelled(report) if report.attempted() == 0));
    let records = h.store.list();
    assert_eq!(records[0].id, record.id);
    assert_eq!(records[0].retry_count, 0);
    assert!(!h.processor.is_running());
}

#[tokio::test]
async fn pass_after_cancel_runs_normally() {
    let h = Harness::new(Behavior::Hang, NetworkState::ONLINE);
    enqueue(&h.store, 1);

    let processor = Arc::clone(&h.processor);
    let pass = tokio::spawn(async move { processor.process().await });
    wait_for_calls(&h.synchronizer, 1).await;
    h.processor.cancel();
    assert!(matches!(pass.await.unwrap(), ProcessOutcome::Cancelled(_)));

    h.synchronizer.set_behavior(Behavior::Succeed);
    let report = h.processor.process().await.report().copied().unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(h.store.pending_count(), 0);
}

#[tokio::test]
async fn cancel_while_idle_does_not_affect_next_pass() {
    let h = Harness::new(Behavior::Succeed, NetworkState::ONLINE);
    enqueue(&h.store, 1);

    h.processor.cancel();
    let report = h.processor.process().await.report().copied().unwrap();

    assert_eq!(report.delivered, 1);
}

#[tokio::test]
async fn process_until_fired_token_attempts_nothing() {
    let h = Harness::new(Behavior::Succeed, NetworkState::ONLINE);
    enqueue(&h.store, 1);
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let outcome = h.processor.process_until(&shutdown).await;

    assert!(matches!(outcome, ProcessOutcome::Cancelled(report) if report.attempted() == 0));
    assert_eq!(h.synchronizer.call_count(), 0);
    assert_eq!(h.store.pending_count(), 1);
    assert!(!h.processor.is_running());
}

#[tokio::test]
async fn records_enqueued_mid_pass_wait_for_next_pass() {
    let h = Harness::new(Behavior::Succeed, NetworkState::ONLINE);
    let gate = h.synchronizer.gate();
    enqueue(&h.store, 1);
    enqueue(&h.store, 2);

    let processor = Arc::clone(&h.processor);
    let pass = tokio::spawn(async move { processor.process().await });
    wait_for_calls(&h.synchronizer, 1).await;

    let late = enqueue(&h.store, 3);
    gate.add_permits(10);
    let report = pass.await.unwrap().report().copied().unwrap();

    assert_eq!(report.delivered, 2);
    assert_eq!(h.store.list(), vec![late.clone()]);

    let report = h.processor.process().await.report().copied().unwrap();
    assert_eq!(report.delivered, 1);
    assert!(h.store.list().is_empty());
}

#[tokio::test]
async fn record_cleared_during_failed_delivery_is_ignored() {
    let h = Harness::new(Behavior::Fail, NetworkState::ONLINE);
    let gate = h.synchronizer.gate();
    enqueue(&h.store, 1);

    let processor = Arc::clone(&h.processor);
    let pass = tokio::spawn(async move { processor.process().await });
    wait_for_calls(&h.synchronizer, 1).await;

    h.store.clear();
    gate.add_permits(1);
    let report = pass.await.unwrap().report().copied().unwrap();

    assert_eq!(report.failed, 1);
    assert!(h.store.list().is_empty());
}

#[tokio::test]
async fn unreadable_store_fails_the_pass_and_releases_guard() {
    let storage = Arc::new(MemoryStorage::new());
    let store = Arc::new(QueueStore::new(Arc::clone(&storage)));
    store.enqueue(MutationKind::GenericSync, json!({})).unwrap();
    storage.set_fail_reads(true);

    let synchronizer = ScriptedSynchronizer::new(Behavior::Succeed);
    let processor = QueueProcessor::new(
        store,
        synchronizer.clone(),
        Arc::new(WatchConnectivity::new(NetworkState::ONLINE)),
    );

    let outcome = processor.process().await;

    assert!(matches!(outcome, ProcessOutcome::Failed(Error::Io(_))));
    assert!(!processor.is_running());
    assert_eq!(synchronizer.call_count(), 0);
}

#[test]
fn default_config_uses_three_retries() {
    let config = ProcessorConfig::default();
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.item_timeout, DEFAULT_ITEM_TIMEOUT);
}
