// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn core_errors_pass_through_unchanged() {
    let core = syncq_core::Error::UnknownKind("bogus".into());
    let expected = core.to_string();
    let err: Error = core.into();
    assert_eq!(err.to_string(), expected);
}

#[test]
fn payload_error_carries_hint() {
    let msg = Error::InvalidPayload("expected value at line 1 column 1".into()).to_string();
    assert!(msg.starts_with("invalid payload: expected value"));
    assert!(msg.contains("hint:"));
}

#[test]
fn toml_error_names_the_file() {
    let source = toml::from_str::<toml::Table>("queue_path = ").unwrap_err();
    let err = Error::Toml { path: PathBuf::from("/etc/syncq/config.toml"), source };
    assert!(err.to_string().contains("/etc/syncq/config.toml"));
}

#[test]
fn invalid_url_mentions_example() {
    let msg = Error::InvalidUrl("localhost".into()).to_string();
    assert!(msg.contains("'localhost'"));
    assert!(msg.contains("http://localhost:8080/api"));
}
