// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `field.rs`

use super::*;

fn workers() -> FieldPath {
    FieldPath::new("spec").child("provider").child("workers")
}

#[test]
fn test_path_building() {
    let path = workers().index(2).child("dataVolumes").index(0).child("name");
    assert_eq!(path.as_str(), "spec.provider.workers[2].dataVolumes[0].name");

    let key = FieldPath::new("data").key("kubeconfig");
    assert_eq!(key.to_string(), "data[kubeconfig]");
}

#[test]
fn test_error_display() {
    let path = workers().index(0).child("providerConfig").child("dnsPolicy");

    assert_eq!(
        FieldError::invalid(&path, "x", "must be set").to_string(),
        "spec.provider.workers[0].providerConfig.dnsPolicy: Invalid value: \"x\": must be set"
    );
    assert_eq!(
        FieldError::not_supported(&path, "Host", &["ClusterFirst", "None"]).to_string(),
        "spec.provider.workers[0].providerConfig.dnsPolicy: Unsupported value: \"Host\": supported values: \"ClusterFirst\", \"None\""
    );
    assert_eq!(
        FieldError::duplicate(&path, "a").to_string(),
        "spec.provider.workers[0].providerConfig.dnsPolicy: Duplicate value: \"a\""
    );
}

#[test]
fn test_list_display() {
    let path = FieldPath::new("spec");
    let mut errors = ErrorList::new();
    errors.push(FieldError::required(&path.child("a"), "missing"));
    errors.push(FieldError::forbidden(&path.child("b"), "not allowed"));

    assert_eq!(
        errors.to_string(),
        "[spec.a: Required value: missing, spec.b: Forbidden: not allowed]"
    );
}

#[test]
fn test_into_result() {
    assert!(ErrorList::new().into_result().is_ok());

    let errors = ErrorList::from(vec![FieldError::required(&FieldPath::new("spec"), "x")]);
    let err = errors.into_result().unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.iter().next().unwrap().kind, FieldErrorKind::Required);
}

#[test]
fn test_append_keeps_order() {
    let path = FieldPath::new("spec");
    let mut first = ErrorList::from(vec![FieldError::required(&path.child("a"), "")]);
    let second = ErrorList::from(vec![FieldError::required(&path.child("b"), "")]);
    first.append(second);

    let paths: Vec<&str> = first.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["spec.a", "spec.b"]);
}
