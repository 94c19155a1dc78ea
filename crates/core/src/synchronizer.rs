// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery seam between the queue and the backend.
//!
//! The queue hands each record to an [`ItemSynchronizer`], which performs one
//! delivery call for it. Implementations dispatch on [`MutationKind`] and are
//! responsible for idempotency; the record id is stable across retries and
//! can be used as an idempotency key.
//!
//! [`MutationKind`]: crate::record::MutationKind

use std::future::Future;
use std::pin::Pin;

use crate::error::SyncError;
use crate::record::QueueRecord;

/// Future returned by [`ItemSynchronizer::sync_item`].
pub type SyncFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>>;

/// Performs the delivery call for one queued record.
pub trait ItemSynchronizer: Send + Sync {
    /// Delivers `record`. Any error leaves the record queued for a later retry.
    fn sync_item<'a>(&'a self, record: &'a QueueRecord) -> SyncFuture<'a>;
}
