// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared test fixtures: a worker, its cluster and provider credentials.

use crate::credentials::StaticCredentialSource;
use crate::crd::{
    CloudProfile, CloudProfileSpec, Cluster, KubernetesSettings, MachineImageReference,
    MachineType, MachineTypeStorage, SecretReference, Shoot, ShootProvider, ShootSpec, Volume,
    VolumeType, Worker, WorkerPool, WorkerSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::ByteString;
use serde_json::json;

pub const NAMESPACE: &str = "shoot--dev--local";
pub const PROVIDER_NAMESPACE: &str = "machines";
pub const IMAGE_URL: &str = "https://images.example.com/ubuntu-22.04.img";

pub const KUBECONFIG: &str = r#"apiVersion: v1
kind: Config
current-context: provider
contexts:
- name: provider
  context:
    cluster: provider
    user: admin
    namespace: machines
clusters:
- name: provider
  cluster:
    server: https://provider.example.com:6443
users:
- name: admin
  user:
    token: secret-token
"#;

fn quantity(value: &str) -> Quantity {
    Quantity(value.to_string())
}

/// A pool of `standard-2` machines with a 20Gi `standard` root volume.
pub fn pool(name: &str, zones: &[&str]) -> WorkerPool {
    WorkerPool {
        name: name.to_string(),
        machine_type: "standard-2".to_string(),
        machine_image: MachineImageReference {
            name: "ubuntu".to_string(),
            version: "22.04".to_string(),
        },
        minimum: 1,
        maximum: 3,
        max_surge: IntOrString::Int(1),
        max_unavailable: IntOrString::Int(0),
        annotations: Default::default(),
        labels: Default::default(),
        taints: vec![],
        user_data: Some(ByteString(b"#cloud-config".to_vec())),
        volume: Some(Volume {
            name: None,
            r#type: Some("standard".to_string()),
            size: "20Gi".to_string(),
        }),
        data_volumes: vec![],
        zones: zones.iter().map(|z| (*z).to_string()).collect(),
        provider_config: None,
        kubernetes_version: None,
        machine_controller_manager_settings: None,
    }
}

pub fn worker(pools: Vec<WorkerPool>) -> Worker {
    let mut worker = Worker::new(
        "worker",
        WorkerSpec {
            r#type: "kubevirt".to_string(),
            region: "local".to_string(),
            secret_ref: SecretReference {
                name: "cloudprovider".to_string(),
                namespace: NAMESPACE.to_string(),
            },
            infrastructure_provider_status: Some(RawExtension(json!({
                "apiVersion": "kubevirt.provider.extensions.gardener.cloud/v1alpha1",
                "kind": "InfrastructureStatus",
                "networks": [{ "name": "net-1", "default": true, "sha": "abc123" }]
            }))),
            ssh_public_key: Some(ByteString(b"ssh-rsa AAAA".to_vec())),
            pools,
        },
    );
    worker.metadata.namespace = Some(NAMESPACE.to_string());
    worker
}

pub fn cloud_profile() -> CloudProfile {
    CloudProfile::new(
        "kubevirt",
        CloudProfileSpec {
            r#type: "kubevirt".to_string(),
            machine_types: vec![
                MachineType {
                    name: "standard-2".to_string(),
                    cpu: quantity("2"),
                    gpu: quantity("0"),
                    memory: quantity("4Gi"),
                    usable: Some(true),
                    storage: None,
                },
                MachineType {
                    name: "local-4".to_string(),
                    cpu: quantity("4"),
                    gpu: quantity("0"),
                    memory: quantity("8Gi"),
                    usable: Some(true),
                    storage: Some(MachineTypeStorage {
                        class: "local-path".to_string(),
                        storage_size: Some(quantity("30Gi")),
                        r#type: "local".to_string(),
                    }),
                },
            ],
            volume_types: vec![
                VolumeType {
                    name: "standard".to_string(),
                    class: "standard-sc".to_string(),
                    usable: Some(true),
                },
                VolumeType {
                    name: "fast".to_string(),
                    class: "fast-sc".to_string(),
                    usable: Some(true),
                },
            ],
            provider_config: Some(RawExtension(json!({
                "apiVersion": "kubevirt.provider.extensions.gardener.cloud/v1alpha1",
                "kind": "CloudProfileConfig",
                "machineImages": [
                    {
                        "name": "ubuntu",
                        "versions": [
                            { "version": "22.04", "sourceURL": IMAGE_URL },
                            { "version": "20.04", "sourceURL": "https://images.example.com/ubuntu-20.04.img" }
                        ]
                    }
                ],
                "machineTypes": [
                    { "name": "standard-2", "limits": { "cpu": "4", "memory": "8Gi" } }
                ]
            }))),
        },
    )
}

pub fn shoot() -> Shoot {
    let mut shoot = Shoot::new(
        "dev",
        ShootSpec {
            cloud_profile_name: "kubevirt".to_string(),
            region: "local".to_string(),
            secret_binding_name: "cloudprovider".to_string(),
            kubernetes: KubernetesSettings {
                version: "1.31.2".to_string(),
            },
            networking: Default::default(),
            provider: ShootProvider {
                r#type: "kubevirt".to_string(),
                ..Default::default()
            },
        },
    );
    shoot.metadata.namespace = Some("garden-dev".to_string());
    shoot
}

pub fn cluster() -> Cluster {
    Cluster {
        cloud_profile: cloud_profile(),
        shoot: shoot(),
    }
}

pub fn credentials() -> StaticCredentialSource {
    StaticCredentialSource::new().with_kubeconfig(NAMESPACE, "cloudprovider", KUBECONFIG.as_bytes())
}
