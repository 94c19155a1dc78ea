// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod clear;
pub mod enqueue;
pub mod list;
pub mod status;
pub mod sync;
pub mod watch;

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use syncq_core::{QueueProcessor, QueueRecord, QueueStore};
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::HttpSynchronizer;
use crate::probe::ProbeConnectivity;

/// Shared state handed to every command.
pub struct Context {
    pub config: Config,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Context { config }
    }

    /// Opens the configured queue file, creating its directory if needed.
    pub fn open_store(&self) -> Result<Arc<QueueStore>> {
        let path = self.config.queue_path()?;
        tracing::debug!(path = %path.display(), "opening queue");
        Ok(Arc::new(QueueStore::open(path)?))
    }

    /// Wires a processor that delivers over HTTP and gates on `probe`.
    pub fn processor(
        &self,
        store: Arc<QueueStore>,
        probe: Arc<ProbeConnectivity>,
    ) -> Result<Arc<QueueProcessor>> {
        let synchronizer = HttpSynchronizer::new(&self.config.backend)?;
        Ok(Arc::new(QueueProcessor::with_config(
            store,
            Arc::new(synchronizer),
            probe,
            self.config.processor_config(),
        )))
    }
}

/// Queue contents for display. A queue file that does not parse shows as
/// empty with a warning pointing at `syncq clear`.
pub(crate) fn read_queue(store: &QueueStore) -> Result<Vec<QueueRecord>> {
    match store.try_list() {
        Ok(records) => Ok(records),
        Err(syncq_core::Error::Json(e)) => {
            tracing::warn!(error = %e, "queue file is unreadable, run `syncq clear` to reset it");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Single-threaded runtime for the commands that talk to the network.
pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)
}

/// Pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// "1 mutation" / "3 mutations"
pub(crate) fn mutations(count: usize) -> String {
    if count == 1 {
        "1 mutation".to_string()
    } else {
        format!("{} mutations", count)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
