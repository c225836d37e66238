// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::client::Client;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const WORKER: &str = r#"
apiVersion: extensions.gardener.cloud/v1alpha1
kind: Worker
metadata:
  name: worker
  namespace: shoot--dev--local
spec:
  type: kubevirt
  region: local
  secretRef:
    name: cloudprovider
    namespace: shoot--dev--local
  sshPublicKey: c3NoLXJzYSBBQUFB
  infrastructureProviderStatus:
    apiVersion: kubevirt.provider.extensions.gardener.cloud/v1alpha1
    kind: InfrastructureStatus
    networks:
    - name: net-1
      default: true
      sha: abc123
  pools:
  - name: pool-a
    machineType: standard-2
    machineImage:
      name: ubuntu
      version: "22.04"
    minimum: 4
    maximum: 6
    maxSurge: 50%
    maxUnavailable: 0
    userData: I2Nsb3VkLWNvbmZpZw==
    volume:
      type: standard
      size: 20Gi
    zones: [z1, z2]
  - name: pool-b
    machineType: local-4
    machineImage:
      name: ubuntu
      version: "22.04"
    minimum: 1
    maximum: 1
    maxSurge: 1
    maxUnavailable: 0
    dataVolumes:
    - name: data-1
      type: fast
      size: 50Gi
    providerConfig:
      apiVersion: kubevirt.provider.extensions.gardener.cloud/v1alpha1
      kind: WorkerConfig
      disablePreAllocatedDataVolumes: true
      dnsPolicy: ClusterFirst
    zones: [z1]
"#;

pub const CLOUD_PROFILE: &str = r#"
apiVersion: core.gardener.cloud/v1beta1
kind: CloudProfile
metadata:
  name: kubevirt
spec:
  type: kubevirt
  machineTypes:
  - name: standard-2
    cpu: "2"
    memory: 4Gi
  - name: local-4
    cpu: "4"
    memory: 8Gi
    storage:
      class: local-path
      storageSize: 30Gi
      type: local
  volumeTypes:
  - name: standard
    class: standard-sc
  - name: fast
    class: fast-sc
  providerConfig:
    apiVersion: kubevirt.provider.extensions.gardener.cloud/v1alpha1
    kind: CloudProfileConfig
    machineImages:
    - name: ubuntu
      versions:
      - version: "22.04"
        sourceURL: https://images.example.com/ubuntu-22.04.img
    machineTypes:
    - name: standard-2
      limits:
        cpu: "4"
        memory: 8Gi
"#;

pub const SHOOT: &str = r#"
apiVersion: core.gardener.cloud/v1beta1
kind: Shoot
metadata:
  name: dev
  namespace: garden-dev
spec:
  cloudProfileName: kubevirt
  region: local
  secretBindingName: cloudprovider
  kubernetes:
    version: 1.31.2
  networking:
    nodes: 10.250.0.0/16
  provider:
    type: kubevirt
    infrastructureConfig:
      apiVersion: kubevirt.provider.extensions.gardener.cloud/v1alpha1
      kind: InfrastructureConfig
      networks:
        tenantNetworks:
        - name: net-1
          config: '{"cniVersion":"0.4.0","type":"bridge"}'
          default: true
    workers:
    - name: pool-a
      machine:
        type: standard-2
        image:
          name: ubuntu
          version: "22.04"
      minimum: 4
      maximum: 6
      volume:
        type: standard
        size: 20Gi
      zones: [z1, z2]
"#;

pub const SECRET_BINDING: &str = r#"
apiVersion: core.gardener.cloud/v1beta1
kind: SecretBinding
metadata:
  name: cloudprovider
  namespace: garden-dev
secretRef:
  name: cloudprovider
  namespace: garden-dev
provider:
  type: kubevirt
"#;

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

/// A cloud provider secret in `garden-dev` holding `kubeconfig`, as YAML.
pub fn secret(kubeconfig: &[u8]) -> String {
    let secret = Secret {
        metadata: ObjectMeta {
            name: Some("cloudprovider".to_string()),
            namespace: Some("garden-dev".to_string()),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            "kubeconfig".to_string(),
            ByteString(kubeconfig.to_vec()),
        )])),
        ..Default::default()
    };
    serde_yaml::to_string(&secret).expect("serialize secret")
}

/// The cluster manifest: the cloud profile and the shoot under one document.
pub fn cluster() -> String {
    let indent = |doc: &str| {
        doc.trim_start_matches('\n')
            .lines()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "cloudProfile:\n{}\nshoot:\n{}\n",
        indent(CLOUD_PROFILE),
        indent(SHOOT)
    )
}

/// Writes a manifest into `dir` and returns its path.
pub fn write_manifest(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write manifest");
    path
}

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {}", e);
            None
        }
    }
}
