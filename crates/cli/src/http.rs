// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivers queued mutations to the backend over HTTP.

use std::time::Duration;

use reqwest::Client;
use syncq_core::{ItemSynchronizer, MutationKind, QueueRecord, SyncError, SyncFuture};
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::Result;

/// Header carrying the record id so the backend can drop replays.
pub const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// Posts each record's payload to the endpoint for its kind.
pub struct HttpSynchronizer {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSynchronizer {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("syncq/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpSynchronizer {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Path, relative to the base url, that accepts `kind`.
    pub fn route(kind: MutationKind) -> &'static str {
        match kind {
            MutationKind::SubmitQuizResult => "/quiz-results",
            MutationKind::SubmitGameResult => "/game-results",
            MutationKind::GenericSync => "/sync",
            MutationKind::SyncXp => "/xp",
            MutationKind::SyncChapterProgress => "/chapter-progress",
        }
    }

    pub fn endpoint(&self, kind: MutationKind) -> String {
        format!("{}{}", self.base_url, Self::route(kind))
    }
}

impl ItemSynchronizer for HttpSynchronizer {
    fn sync_item<'a>(&'a self, record: &'a QueueRecord) -> SyncFuture<'a> {
        Box::pin(async move {
            let url = self.endpoint(record.kind);
            debug!(id = %record.id, %url, "posting record");

            let mut request = self
                .client
                .post(&url)
                .header(IDEMPOTENCY_KEY, record.id.as_str())
                .json(&record.data);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response =
                request.send().await.map_err(|e| SyncError::Transient(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            let message = response.text().await.unwrap_or_default();
            Err(SyncError::Rejected { status: status.as_u16(), message })
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
