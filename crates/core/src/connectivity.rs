// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity signals and their classification.
//!
//! A device reports two independent signals: whether a network interface is
//! connected, and whether the internet is reachable through it. Either may be
//! unknown. Unknown signals are classified as online (fail-open).

use serde::Serialize;
use tokio::sync::watch;

/// One connectivity reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub connected: Option<bool>,
    pub internet_reachable: Option<bool>,
}

impl NetworkState {
    /// Both signals unknown.
    pub const UNKNOWN: NetworkState = NetworkState { connected: None, internet_reachable: None };

    /// Connected with a reachable internet path.
    pub const ONLINE: NetworkState =
        NetworkState { connected: Some(true), internet_reachable: Some(true) };

    /// No connection at all.
    pub const OFFLINE: NetworkState =
        NetworkState { connected: Some(false), internet_reachable: Some(false) };

    pub fn new(connected: Option<bool>, internet_reachable: Option<bool>) -> Self {
        NetworkState { connected, internet_reachable }
    }

    /// True only when a signal affirmatively says offline.
    pub fn is_offline(&self) -> bool {
        self.connected == Some(false) || self.internet_reachable == Some(false)
    }

    /// True when connected and reachability is not known to be false.
    ///
    /// This is the edge that triggers an automatic drain.
    pub fn is_affirmatively_online(&self) -> bool {
        self.connected == Some(true) && self.internet_reachable != Some(false)
    }
}

/// Source of connectivity readings and transitions.
pub trait ConnectivityObserver: Send + Sync {
    /// The latest reading, without waiting.
    fn current(&self) -> NetworkState;

    /// A receiver that wakes on every published transition.
    fn watch(&self) -> watch::Receiver<NetworkState>;
}

/// Channel-backed observer that a signal source pushes readings into.
#[derive(Debug)]
pub struct WatchConnectivity {
    tx: watch::Sender<NetworkState>,
}

impl WatchConnectivity {
    pub fn new(initial: NetworkState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        WatchConnectivity { tx }
    }

    /// Publishes a reading. Returns `true` if it differs from the previous one.
    ///
    /// Repeating the current reading wakes no watcher.
    pub fn set(&self, state: NetworkState) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }
}

impl Default for WatchConnectivity {
    fn default() -> Self {
        Self::new(NetworkState::UNKNOWN)
    }
}

impl ConnectivityObserver for WatchConnectivity {
    fn current(&self) -> NetworkState {
        *self.tx.borrow()
    }

    fn watch(&self) -> watch::Receiver<NetworkState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
