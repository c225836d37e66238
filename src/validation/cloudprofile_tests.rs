// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `cloudprofile.rs`

use super::*;
use crate::worker::fixtures;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde_json::json;

#[test]
fn test_valid_cloud_profile() {
    let scheme = Scheme::new();
    CloudProfileValidator::new(&scheme)
        .validate(&fixtures::cloud_profile())
        .unwrap();
}

#[test]
fn test_other_provider_type_is_skipped() {
    let scheme = Scheme::new();
    let mut cloud_profile = fixtures::cloud_profile();
    cloud_profile.spec.r#type = "openstack".to_string();
    cloud_profile.spec.provider_config = None;

    CloudProfileValidator::new(&scheme)
        .validate(&cloud_profile)
        .unwrap();
}

#[test]
fn test_provider_config_required() {
    let scheme = Scheme::new();
    let mut cloud_profile = fixtures::cloud_profile();
    cloud_profile.spec.provider_config = None;

    let err = CloudProfileValidator::new(&scheme)
        .validate(&cloud_profile)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "spec.providerConfig: Required value: providerConfig must be set for KubeVirt cloud profiles"
    );
}

#[test]
fn test_provider_config_decoded_leniently() {
    let scheme = Scheme::new();
    let mut cloud_profile = fixtures::cloud_profile();
    cloud_profile.spec.provider_config = Some(RawExtension(json!({
        "apiVersion": "kubevirt.provider.extensions.gardener.cloud/v1alpha1",
        "kind": "CloudProfileConfig",
        "legacyField": "ignored",
        "machineImages": [
            { "name": "ubuntu", "versions": [{ "version": "22.04", "sourceURL": fixtures::IMAGE_URL }] }
        ]
    })));

    CloudProfileValidator::new(&scheme)
        .validate(&cloud_profile)
        .unwrap();
}

#[test]
fn test_invalid_provider_config() {
    let scheme = Scheme::new();
    let mut cloud_profile = fixtures::cloud_profile();
    cloud_profile.spec.provider_config = Some(RawExtension(json!({
        "apiVersion": "kubevirt.provider.extensions.gardener.cloud/v1alpha1",
        "kind": "CloudProfileConfig",
        "machineImages": [
            { "name": "ubuntu", "versions": [{ "version": "22.04", "sourceURL": "::" }] }
        ],
        "machineTypes": [{ "name": "gpu-8" }]
    })));

    let err = CloudProfileValidator::new(&scheme)
        .validate(&cloud_profile)
        .unwrap_err();
    let Error::Validation(errors) = err else {
        panic!("expected validation error");
    };
    let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "spec.providerConfig.machineImages[0].versions[0].sourceURL",
            "spec.providerConfig.machineTypes[0].name",
        ]
    );
}

#[test]
fn test_wrong_kind_is_a_decode_error() {
    let scheme = Scheme::new();
    let mut cloud_profile = fixtures::cloud_profile();
    cloud_profile.spec.provider_config = Some(RawExtension(json!({
        "apiVersion": "kubevirt.provider.extensions.gardener.cloud/v1alpha1",
        "kind": "WorkerConfig"
    })));

    let err = CloudProfileValidator::new(&scheme)
        .validate(&cloud_profile)
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }), "{err:?}");
}
