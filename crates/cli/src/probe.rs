// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Backend reachability by TCP connect.
//!
//! A successful connect within the timeout reads as online, anything else as
//! offline. Until the first probe the state is unknown, which the processor
//! treats as online.

use std::time::Duration;

use syncq_core::{ConnectivityObserver, NetworkState, WatchConnectivity};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;

pub struct ProbeConnectivity {
    host: String,
    port: u16,
    timeout: Duration,
    state: WatchConnectivity,
}

impl ProbeConnectivity {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        ProbeConnectivity {
            host: host.into(),
            port,
            timeout,
            state: WatchConnectivity::default(),
        }
    }

    /// Probes the configured backend host.
    pub fn from_config(config: &Config) -> Result<Self> {
        let (host, port) = config.probe_target()?;
        Ok(Self::new(host, port, config.sync.probe_timeout()))
    }

    pub fn target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Runs one probe and publishes the result. Watchers wake only when the
    /// reading changes.
    pub async fn check(&self) -> NetworkState {
        let reachable = matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect((self.host.as_str(), self.port)))
                .await,
            Ok(Ok(_))
        );
        let state = if reachable { NetworkState::ONLINE } else { NetworkState::OFFLINE };
        debug!(target = %self.target(), reachable, "probe");
        if self.state.set(state) {
            info!(target = %self.target(), reachable, "backend reachability changed");
        }
        state
    }
}

impl ConnectivityObserver for ProbeConnectivity {
    fn current(&self) -> NetworkState {
        self.state.current()
    }

    fn watch(&self) -> watch::Receiver<NetworkState> {
        self.state.watch()
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
