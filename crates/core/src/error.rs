// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for syncq-core operations.

use thiserror::Error;

/// All possible errors raised by the queue store and its storage backends.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to lock queue storage at {path}: {source}")]
    Lock {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("queue record not found: {0}")]
    RecordNotFound(String),

    #[error("unknown mutation kind: '{0}'\n  hint: valid kinds are: submit-quiz-result, submit-game-result, generic-sync, sync-xp, sync-chapter-progress")]
    UnknownKind(String),
}

/// A specialized Result type for syncq-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by an item synchronizer for a single delivery attempt.
///
/// Every variant is treated as transient by the queue processor: the record
/// stays queued and its retry count goes up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The delivery call failed before the backend accepted it.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// The backend answered but refused the mutation.
    #[error("backend rejected mutation (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The delivery call did not settle within the per-record timeout.
    #[error("delivery timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
