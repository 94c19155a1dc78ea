// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! syncq-core: offline mutation queue and reconciliation.
//!
//! State-changing actions performed without reliable connectivity are queued
//! durably and delivered once the network returns, with bounded retries and
//! observable queue state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐ enqueue ┌─────────────┐ notify  ┌─────────────┐
//! │  Producer   │────────►│ QueueStore  │────────►│ EventFanout │
//! └─────────────┘         └─────────────┘         └─────────────┘
//!                                ▲                       │
//!                  list/remove/  │                       ▼ pending_count
//!                  retry         │                ┌──────────────────┐
//!                         ┌──────┴───────┐ drive  │ SyncOrchestrator │
//!                         │QueueProcessor│◄───────│                  │
//!                         └──────────────┘        └──────────────────┘
//!                                │                       ▲
//!                                ▼                       │ transitions
//!                        ┌────────────────┐     ┌──────────────────────┐
//!                        │ItemSynchronizer│     │ConnectivityObserver  │
//!                        └────────────────┘     └──────────────────────┘
//! ```

pub mod clock;
pub mod connectivity;
pub mod error;
pub mod fanout;
pub mod orchestrator;
pub mod processor;
pub mod record;
pub mod storage;
pub mod store;
pub mod synchronizer;

#[cfg(test)]
mod test_helpers;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use connectivity::{ConnectivityObserver, NetworkState, WatchConnectivity};
pub use error::{Error, Result, SyncError};
pub use fanout::{EventFanout, Snapshot, Subscription};
pub use orchestrator::{SyncOrchestrator, SyncStatus};
pub use processor::{
    PassReport, ProcessOutcome, ProcessorConfig, QueueProcessor, DEFAULT_ITEM_TIMEOUT, MAX_RETRIES,
};
pub use record::{MutationKind, QueueRecord, RecordId};
pub use storage::{FileStorage, MemoryStorage, QueueStorage, StorageGuard};
pub use store::QueueStore;
pub use synchronizer::{ItemSynchronizer, SyncFuture};
