// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the `syncq` command line.
///
/// Messages carry a hint where the user can act on them.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] syncq_core::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid config file {}: {source}\n  hint: check the TOML syntax and field names", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid backend url '{0}'\n  hint: use an absolute http(s) url such as http://localhost:8080/api")]
    InvalidUrl(String),

    #[error("invalid payload: {0}\n  hint: pass the payload as a JSON document, e.g. '{{\"amount\": 10}}'")]
    InvalidPayload(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Result type alias for `syncq` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
