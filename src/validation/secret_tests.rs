// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `secret.rs`

use super::*;
use crate::crd::{SecretBinding, SecretReference};
use crate::errors::Error;
use crate::validation::lookup::InMemoryLookup;
use crate::worker::fixtures;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

fn secret(data: &[(&str, &[u8])]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some("cloudprovider".to_string()),
            namespace: Some("garden-dev".to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), ByteString(v.to_vec())))
                .collect::<BTreeMap<_, _>>(),
        ),
        ..Default::default()
    }
}

fn in_use_lookup() -> InMemoryLookup {
    InMemoryLookup::new()
        .with_secret_binding(SecretBinding {
            metadata: ObjectMeta {
                name: Some("cloudprovider".to_string()),
                namespace: Some("garden-dev".to_string()),
                ..Default::default()
            },
            secret_ref: SecretReference {
                name: "cloudprovider".to_string(),
                namespace: "garden-dev".to_string(),
            },
            provider: None,
        })
        .with_shoot(fixtures::shoot())
}

#[tokio::test]
async fn test_secret_in_use_is_validated() {
    let lookup = in_use_lookup();
    let validator = SecretValidator::new(&lookup);

    validator
        .validate(&secret(&[("kubeconfig", fixtures::KUBECONFIG.as_bytes())]), None)
        .await
        .unwrap();

    let err = validator
        .validate(&secret(&[("token", b"abc")]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn test_unused_secret_is_not_validated() {
    let lookup = InMemoryLookup::new().with_shoot(fixtures::shoot());
    let validator = SecretValidator::new(&lookup);

    validator
        .validate(&secret(&[("token", b"abc")]), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unchanged_data_is_not_revalidated() {
    let lookup = in_use_lookup();
    let validator = SecretValidator::new(&lookup);

    let old = secret(&[("token", b"abc")]);
    let mut new = old.clone();
    new.metadata.labels = Some(BTreeMap::from([("team".to_string(), "dev".to_string())]));

    validator.validate(&new, Some(&old)).await.unwrap();
}

#[tokio::test]
async fn test_changed_data_is_revalidated() {
    let lookup = in_use_lookup();
    let validator = SecretValidator::new(&lookup);

    let old = secret(&[("kubeconfig", fixtures::KUBECONFIG.as_bytes())]);
    let new = secret(&[("kubeconfig", b"")]);

    let err = validator.validate(&new, Some(&old)).await.unwrap_err();
    assert!(err.to_string().contains("data[kubeconfig]"));
}
