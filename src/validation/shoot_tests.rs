// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `shoot.rs`

use super::*;
use crate::crd::{
    MachineImageReference, SecretBinding, SecretReference, ShootMachine, Volume,
};
use crate::validation::lookup::InMemoryLookup;
use crate::worker::fixtures;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use k8s_openapi::ByteString;
use serde_json::json;

const GROUP_VERSION: &str = "kubevirt.provider.extensions.gardener.cloud/v1alpha1";

fn worker_config(dns_policy: &str) -> RawExtension {
    RawExtension(json!({
        "apiVersion": GROUP_VERSION,
        "kind": "WorkerConfig",
        "dnsPolicy": dns_policy
    }))
}

fn infrastructure_config(networks: &[&str]) -> RawExtension {
    let tenant: Vec<_> = networks
        .iter()
        .map(|name| json!({ "name": name, "config": "{}" }))
        .collect();
    RawExtension(json!({
        "apiVersion": GROUP_VERSION,
        "kind": "InfrastructureConfig",
        "networks": { "tenantNetworks": tenant }
    }))
}

fn shoot_worker(name: &str, zones: &[&str], config: Option<RawExtension>) -> ShootWorker {
    ShootWorker {
        name: name.to_string(),
        machine: ShootMachine {
            r#type: "standard-2".to_string(),
            image: Some(MachineImageReference {
                name: "ubuntu".to_string(),
                version: "22.04".to_string(),
            }),
        },
        minimum: 1,
        maximum: 3,
        volume: Some(Volume {
            name: None,
            r#type: Some("standard".to_string()),
            size: "20Gi".to_string(),
        }),
        zones: zones.iter().map(ToString::to_string).collect(),
        provider_config: config,
        ..Default::default()
    }
}

fn kubevirt_shoot(workers: Vec<ShootWorker>) -> Shoot {
    let mut shoot = fixtures::shoot();
    shoot.spec.networking.nodes = Some("10.250.0.0/16".to_string());
    shoot.spec.provider.infrastructure_config = Some(infrastructure_config(&["net-1"]));
    shoot.spec.provider.workers = workers;
    shoot
}

fn provider_secret(kubeconfig: &[u8]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some("cloudprovider".to_string()),
            namespace: Some("garden-dev".to_string()),
            ..Default::default()
        },
        data: Some(
            [("kubeconfig".to_string(), ByteString(kubeconfig.to_vec()))]
                .into_iter()
                .collect(),
        ),
        ..Default::default()
    }
}

fn lookup() -> InMemoryLookup {
    InMemoryLookup::new()
        .with_cloud_profile(fixtures::cloud_profile())
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
        .with_secret(provider_secret(fixtures::KUBECONFIG.as_bytes()))
}

fn violation_paths(err: Error) -> Vec<String> {
    match err {
        Error::Validation(errors) => errors.iter().map(|e| e.path.to_string()).collect(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_valid_shoot() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let shoot = kubevirt_shoot(vec![shoot_worker(
        "pool-a",
        &["zone-a"],
        Some(worker_config("ClusterFirst")),
    )]);
    validator.validate(&shoot, None).await.unwrap();
}

#[tokio::test]
async fn test_other_provider_types_are_skipped() {
    let scheme = Scheme::new();
    let lookup = InMemoryLookup::new();
    let validator = ShootValidator::new(&scheme, &lookup);

    let mut shoot = kubevirt_shoot(vec![shoot_worker("pool-a", &[], None)]);
    shoot.spec.provider.r#type = "aws".to_string();
    validator.validate(&shoot, None).await.unwrap();
}

#[tokio::test]
async fn test_create_reports_all_violations() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let mut unknown_image = shoot_worker("pool-b", &["zone-a"], None);
    unknown_image.machine.image = Some(MachineImageReference {
        name: "ubuntu".to_string(),
        version: "18.04".to_string(),
    });
    let mut shoot = kubevirt_shoot(vec![
        shoot_worker("pool-a", &[], Some(worker_config("Host"))),
        unknown_image,
    ]);
    shoot.spec.networking.nodes = None;

    let err = validator.validate(&shoot, None).await.unwrap_err();
    assert_eq!(
        violation_paths(err),
        vec![
            "spec.networking.nodes",
            "spec.provider.workers[0].zones",
            "spec.provider.workers[0].providerConfig.dnsPolicy",
            "spec.provider.workers[1].machine.image",
        ]
    );
}

#[tokio::test]
async fn test_create_decodes_strictly() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let config = RawExtension(json!({
        "apiVersion": GROUP_VERSION,
        "kind": "WorkerConfig",
        "dnsPolicyy": "None"
    }));
    let shoot = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], Some(config))]);

    let err = validator.validate(&shoot, None).await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    assert!(err.to_string().contains("providerConfig of worker \"pool-a\" in shoot garden-dev/dev"));
}

#[tokio::test]
async fn test_create_requires_cloud_profile() {
    let scheme = Scheme::new();
    let lookup = InMemoryLookup::new();
    let validator = ShootValidator::new(&scheme, &lookup);

    let shoot = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);
    let err = validator.validate(&shoot, None).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_requires_cloud_profile_provider_config() {
    let scheme = Scheme::new();
    let mut cloud_profile = fixtures::cloud_profile();
    cloud_profile.spec.provider_config = None;
    let lookup = InMemoryLookup::new().with_cloud_profile(cloud_profile);
    let validator = ShootValidator::new(&scheme, &lookup);

    let shoot = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);
    let err = validator.validate(&shoot, None).await.unwrap_err();
    assert!(matches!(err, Error::Precondition(_)), "{err:?}");
}

#[tokio::test]
async fn test_create_checks_shoot_secret() {
    let scheme = Scheme::new();
    let lookup = InMemoryLookup::new()
        .with_cloud_profile(fixtures::cloud_profile())
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
        .with_secret(provider_secret(b""));
    let validator = ShootValidator::new(&scheme, &lookup);

    let shoot = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);
    let err = validator.validate(&shoot, None).await.unwrap_err();
    assert_eq!(violation_paths(err), vec!["data[kubeconfig]"]);
}

#[tokio::test]
async fn test_create_missing_secret_binding() {
    let scheme = Scheme::new();
    let lookup = InMemoryLookup::new().with_cloud_profile(fixtures::cloud_profile());
    let validator = ShootValidator::new(&scheme, &lookup);

    let shoot = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);
    let err = validator.validate(&shoot, None).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("secret binding"));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_only_rechecks_changed_pools() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    // pool-a was accepted before the Host policy became invalid
    let old = kubevirt_shoot(vec![
        shoot_worker("pool-a", &["zone-a"], Some(worker_config("Host"))),
        shoot_worker("pool-b", &["zone-a"], Some(worker_config("ClusterFirst"))),
    ]);
    // Reordered, pool-a untouched, pool-b changed to an invalid policy
    let new = kubevirt_shoot(vec![
        shoot_worker("pool-b", &["zone-a"], Some(worker_config("Bogus"))),
        shoot_worker("pool-a", &["zone-a"], Some(worker_config("Host"))),
    ]);

    let err = validator.validate(&new, Some(&old)).await.unwrap_err();
    assert_eq!(
        violation_paths(err),
        vec!["spec.provider.workers[0].providerConfig.dnsPolicy"]
    );
}

#[tokio::test]
async fn test_update_checks_new_pools() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let old = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);
    let new = kubevirt_shoot(vec![
        shoot_worker("pool-a", &["zone-a"], None),
        shoot_worker("pool-c", &["zone-a"], Some(worker_config("Host"))),
    ]);

    let err = validator.validate(&new, Some(&old)).await.unwrap_err();
    assert_eq!(
        violation_paths(err),
        vec!["spec.provider.workers[1].providerConfig.dnsPolicy"]
    );
}

#[tokio::test]
async fn test_update_unchanged_infrastructure_is_not_rechecked() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let mut old = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);
    old.spec.provider.infrastructure_config = Some(infrastructure_config(&["net-1", "net-1"]));
    let mut new = old.clone();
    new.spec.provider.workers[0].maximum = 5;

    validator.validate(&new, Some(&old)).await.unwrap();
}

#[tokio::test]
async fn test_update_networks_are_immutable() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let old = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);
    let mut new = old.clone();
    new.spec.provider.infrastructure_config = Some(infrastructure_config(&["net-1", "net-2"]));

    let err = validator.validate(&new, Some(&old)).await.unwrap_err();
    assert_eq!(
        violation_paths(err),
        vec!["spec.provider.infrastructureConfig.networks"]
    );
}

#[tokio::test]
async fn test_update_forbids_zone_removal() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let old = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a", "zone-b"], None)]);
    let new = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-b"], None)]);

    let err = validator.validate(&new, Some(&old)).await.unwrap_err();
    assert_eq!(violation_paths(err), vec!["spec.provider.workers[0].zones"]);
}

#[tokio::test]
async fn test_update_decodes_old_shoot_leniently() {
    let scheme = Scheme::new();
    let lookup = lookup();
    let validator = ShootValidator::new(&scheme, &lookup);

    let stale = RawExtension(json!({
        "apiVersion": GROUP_VERSION,
        "kind": "WorkerConfig",
        "removedField": true
    }));
    let old = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], Some(stale))]);
    let new = kubevirt_shoot(vec![shoot_worker("pool-a", &["zone-a"], None)]);

    validator.validate(&new, Some(&old)).await.unwrap();
}
