// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

use crate::errors::{Error, SchemeError};

#[test]
fn test_not_found_display() {
    let err = Error::NotFound {
        kind: "machine type",
        name: "large".to_string(),
        scope: "cloud profile \"kubevirt\"".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "machine type \"large\" not found in cloud profile \"kubevirt\""
    );
}

#[test]
fn test_in_pool_prefixes_pool_name() {
    let err = Error::Precondition("missing volume".to_string()).in_pool("pool-a");
    assert_eq!(err.to_string(), "worker pool \"pool-a\": missing volume");
}

#[test]
fn test_root_cause_looks_through_pool_context() {
    let err = Error::NotFound {
        kind: "volume type",
        name: "ssd".to_string(),
        scope: "cloud profile".to_string(),
    }
    .in_pool("pool-a");

    assert!(err.is_not_found());
    assert!(matches!(err.root_cause(), Error::NotFound { name, .. } if name == "ssd"));
}

#[test]
fn test_precondition_is_not_not_found() {
    let err = Error::Precondition("missing sshPublicKey in worker".to_string());
    assert!(!err.is_not_found());
}

#[test]
fn test_unknown_fields_display_lists_paths() {
    let err = SchemeError::UnknownFields(vec!["foo".to_string(), "devices.bar".to_string()]);
    assert_eq!(err.to_string(), "unknown fields: foo, devices.bar");
}

#[test]
fn test_decode_error_keeps_source() {
    let err = Error::Decode {
        what: "providerConfig of worker pool \"pool-a\"".to_string(),
        source: SchemeError::MissingTypeMeta,
    };
    assert!(err.to_string().contains("pool-a"));
    assert!(std::error::Error::source(&err).is_some());
}
