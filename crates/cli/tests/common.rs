// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub use wiremock::matchers::{header, method, path};
pub use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "../src/test_helpers.rs"]
mod test_helpers;
pub use test_helpers::{api_url, closed_port_url};

/// A temp directory holding a config whose queue lives beside it.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: PathBuf,
}

impl TestEnv {
    /// Points the backend at `url`.
    pub fn new(url: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "queue_path = \"queue.json\"\n\n\
                 [backend]\nurl = \"{}\"\nrequest_timeout_secs = 5\n\n\
                 [sync]\nprobe_timeout_ms = 500\n",
                url
            ),
        )
        .unwrap();
        TestEnv { dir, config }
    }

    /// Backend on a port nothing listens on.
    pub fn offline() -> Self {
        Self::new(&closed_port_url())
    }

    pub fn queue_path(&self) -> PathBuf {
        self.dir.path().join("queue.json")
    }

    pub fn syncq(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("syncq");
        cmd.arg("--config").arg(&self.config).env_remove("SYNCQ_LOG");
        cmd
    }

    /// Enqueues and returns the new record's id.
    pub fn enqueue(&self, kind: &str, payload: &str) -> String {
        let output = self.syncq().args(["enqueue", kind, payload]).output().unwrap();
        assert!(output.status.success(), "enqueue failed: {:?}", output);
        String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .last()
            .unwrap()
            .to_string()
    }

    pub fn list_json(&self) -> serde_json::Value {
        let output = self.syncq().args(["list", "-o", "json"]).output().unwrap();
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    }
}
