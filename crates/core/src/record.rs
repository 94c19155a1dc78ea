// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue records: the durable unit of pending work.
//!
//! A record pairs a [`MutationKind`] with an opaque JSON payload. The queue
//! never looks inside the payload; only the item synchronizer does.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed set of state-changing actions that can be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    SubmitQuizResult,
    SubmitGameResult,
    GenericSync,
    SyncXp,
    SyncChapterProgress,
}

impl MutationKind {
    /// All kinds, in declaration order.
    pub const ALL: [MutationKind; 5] = [
        MutationKind::SubmitQuizResult,
        MutationKind::SubmitGameResult,
        MutationKind::GenericSync,
        MutationKind::SyncXp,
        MutationKind::SyncChapterProgress,
    ];

    /// Kebab-case name used in record ids and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            MutationKind::SubmitQuizResult => "submit-quiz-result",
            MutationKind::SubmitGameResult => "submit-game-result",
            MutationKind::GenericSync => "generic-sync",
            MutationKind::SyncXp => "sync-xp",
            MutationKind::SyncChapterProgress => "sync-chapter-progress",
        }
    }

    /// Name used in the persisted layout.
    pub fn wire_name(&self) -> &'static str {
        match self {
            MutationKind::SubmitQuizResult => "SUBMIT_QUIZ_RESULT",
            MutationKind::SubmitGameResult => "SUBMIT_GAME_RESULT",
            MutationKind::GenericSync => "GENERIC_SYNC",
            MutationKind::SyncXp => "SYNC_XP",
            MutationKind::SyncChapterProgress => "SYNC_CHAPTER_PROGRESS",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for MutationKind {
    type Err = Error;

    /// Accepts both `sync-xp` and `SYNC_XP` spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        MutationKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// Opaque identifier of a queue record.
///
/// Format: `{kind-slug}-{created_ms}-{8 random hex chars}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh id for a record of `kind` created at `created_ms`.
    pub fn generate(kind: MutationKind, created_ms: i64) -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        RecordId(format!("{}-{}-{}", kind.slug(), created_ms, &random[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

/// One pending mutation awaiting delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: MutationKind,
    pub data: serde_json::Value,
    /// Creation instant in milliseconds since Unix epoch.
    pub created_at: i64,
    #[serde(default)]
    pub retry_count: u32,
}

impl QueueRecord {
    /// Builds a fresh record with a generated id and no retries.
    pub fn new(kind: MutationKind, data: serde_json::Value, created_at: i64) -> Self {
        QueueRecord {
            id: RecordId::generate(kind, created_at),
            kind,
            data,
            created_at,
            retry_count: 0,
        }
    }

    /// True once at least one delivery attempt has failed.
    pub fn is_retrying(&self) -> bool {
        self.retry_count > 0
    }

    /// True when the record has used up its retry budget and is no longer
    /// attempted automatically.
    pub fn is_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }

    /// Creation instant as a UTC timestamp, if representable.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
