// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Backend addresses for tests. Shared by unit and integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::net::TcpListener;

use wiremock::MockServer;

/// Base url of `server` with the `/api` prefix the config expects.
pub fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// An address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}
