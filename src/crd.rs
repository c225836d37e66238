// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Gardener resources consumed by the KubeVirt worker compiler.
//!
//! Only the fields the compiler and the admission validators read are modelled.
//! Provider-specific sections travel as [`RawExtension`] payloads and are decoded
//! by [`crate::scheme`].
//!
//! # Resource Types
//!
//! ## Extension resources
//!
//! - [`Worker`] - Worker pools of a shoot, handed to the provider extension
//!
//! ## Core resources
//!
//! - [`CloudProfile`] - Machine and volume type catalog plus provider config
//! - [`Shoot`] - The user-facing cluster specification validated on admission
//! - [`SecretBinding`] - Binds a cloud provider secret to shoots
//!
//! # Example: Describing a Worker Pool
//!
//! ```rust,no_run
//! use kubevirt_worker::crd::{MachineImageReference, Volume, WorkerPool};
//! use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
//!
//! let pool = WorkerPool {
//!     name: "pool-a".to_string(),
//!     machine_type: "standard-2".to_string(),
//!     machine_image: MachineImageReference {
//!         name: "ubuntu".to_string(),
//!         version: "22.04".to_string(),
//!     },
//!     minimum: 1,
//!     maximum: 3,
//!     max_surge: IntOrString::Int(1),
//!     max_unavailable: IntOrString::Int(0),
//!     annotations: Default::default(),
//!     labels: Default::default(),
//!     taints: vec![],
//!     user_data: None,
//!     volume: Some(Volume {
//!         name: None,
//!         r#type: Some("standard".to_string()),
//!         size: "20Gi".to_string(),
//!     }),
//!     data_volumes: vec![],
//!     zones: vec!["zone-1".to_string()],
//!     provider_config: None,
//!     kubernetes_version: None,
//!     machine_controller_manager_settings: None,
//! };
//! ```

use k8s_openapi::api::core::v1::Taint;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::ByteString;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a secret by namespace and name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Name of the secret
    pub name: String,

    /// Namespace of the secret
    pub namespace: String,
}

// ============================================================================
// Worker (extensions.gardener.cloud)
// ============================================================================

/// Worker describes the worker pools of one shoot for a provider extension.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "extensions.gardener.cloud",
    version = "v1alpha1",
    kind = "Worker",
    namespaced,
    doc = "Worker carries the worker pools of a shoot. The namespace of a Worker is the shoot's technical namespace in the seed."
)]
#[kube(status = "WorkerExtensionStatus")]
#[serde(rename_all = "camelCase")]
pub struct WorkerSpec {
    /// Provider type (`kubevirt`)
    pub r#type: String,

    /// Region the shoot runs in
    pub region: String,

    /// Secret holding the provider cluster kubeconfig
    pub secret_ref: SecretReference,

    /// Status written by the infrastructure controller (networks of the provider cluster)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_provider_status: Option<RawExtension>,

    /// Public SSH key injected into every machine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub ssh_public_key: Option<ByteString>,

    /// Worker pools, processed in order
    #[serde(default)]
    pub pools: Vec<WorkerPool>,
}

/// Status of a [`Worker`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerExtensionStatus {
    /// Provider status payload (a `WorkerStatus` listing the machine images in use)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_status: Option<RawExtension>,
}

/// A named group of nodes sharing machine type, volumes and scaling bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPool {
    /// Pool name, unique within the worker
    pub name: String,

    /// Machine type name, resolved against the cloud profile
    pub machine_type: String,

    /// Machine image name and version
    pub machine_image: MachineImageReference,

    /// Minimum number of machines across all zones
    pub minimum: i32,

    /// Maximum number of machines across all zones
    pub maximum: i32,

    /// Surge during rolling updates, absolute or a percentage of `maximum`
    pub max_surge: IntOrString,

    /// Unavailability during rolling updates, absolute or a percentage of `minimum`
    pub max_unavailable: IntOrString,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub taints: Vec<Taint>,

    /// Bootstrap cloud config for the machines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub user_data: Option<ByteString>,

    /// Root volume; falls back to the machine type's storage when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Volume>,

    /// Additional data disks, always created empty
    #[serde(default)]
    pub data_volumes: Vec<DataVolume>,

    /// Zones the pool is spread over, in order
    pub zones: Vec<String>,

    /// `WorkerConfig` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<RawExtension>,

    /// Kubernetes version override for this pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,

    /// Settings passed through to the machine controller manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_controller_manager_settings: Option<MachineControllerManagerSettings>,
}

/// Name and version of a machine image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineImageReference {
    pub name: String,
    pub version: String,
}

/// Root volume of a worker pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Volume type name, resolved against the cloud profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// Size as a Kubernetes quantity (e.g. `20Gi`)
    pub size: String,
}

/// Additional data volume of a worker pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataVolume {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    pub size: String,
}

/// Machine controller manager settings of a worker pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineControllerManagerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_drain_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_health_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_creation_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_evict_retries: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_conditions: Option<Vec<String>>,
}

// ============================================================================
// CloudProfile (core.gardener.cloud)
// ============================================================================

/// CloudProfile lists the machine and volume types available to shoots.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "core.gardener.cloud",
    version = "v1beta1",
    kind = "CloudProfile",
    doc = "CloudProfile is the catalog of machine types, volume types and provider specific settings available to shoots."
)]
#[serde(rename_all = "camelCase")]
pub struct CloudProfileSpec {
    /// Provider type (`kubevirt`)
    pub r#type: String,

    #[serde(default)]
    pub machine_types: Vec<MachineType>,

    #[serde(default)]
    pub volume_types: Vec<VolumeType>,

    /// `CloudProfileConfig` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<RawExtension>,
}

/// Machine type catalog entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineType {
    pub name: String,

    pub cpu: Quantity,

    #[serde(default)]
    pub gpu: Quantity,

    pub memory: Quantity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usable: Option<bool>,

    /// Built-in storage used as root volume when the pool does not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<MachineTypeStorage>,
}

/// Storage attached to a machine type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineTypeStorage {
    /// Storage class name
    pub class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<Quantity>,

    #[serde(default)]
    pub r#type: String,
}

/// Volume type catalog entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeType {
    pub name: String,

    /// Storage class name
    pub class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usable: Option<bool>,
}

// ============================================================================
// Shoot (core.gardener.cloud)
// ============================================================================

/// Shoot is the user-facing cluster specification checked by the admission validators.
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "core.gardener.cloud",
    version = "v1beta1",
    kind = "Shoot",
    namespaced,
    doc = "Shoot describes a Kubernetes cluster managed by Gardener."
)]
#[serde(rename_all = "camelCase")]
pub struct ShootSpec {
    pub cloud_profile_name: String,

    pub region: String,

    #[serde(default)]
    pub secret_binding_name: String,

    pub kubernetes: KubernetesSettings,

    #[serde(default)]
    pub networking: Networking,

    pub provider: ShootProvider,
}

/// Kubernetes settings of a shoot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesSettings {
    pub version: String,
}

/// Networking settings of a shoot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// CIDR of the node network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<String>,
}

/// Provider section of a shoot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShootProvider {
    pub r#type: String,

    /// `InfrastructureConfig` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_config: Option<RawExtension>,

    /// `ControlPlaneConfig` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_config: Option<RawExtension>,

    #[serde(default)]
    pub workers: Vec<ShootWorker>,
}

/// Worker pool as written by the user in a shoot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShootWorker {
    pub name: String,

    pub machine: ShootMachine,

    pub minimum: i32,

    pub maximum: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<IntOrString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<IntOrString>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Volume>,

    #[serde(default)]
    pub data_volumes: Vec<DataVolume>,

    #[serde(default)]
    pub zones: Vec<String>,

    /// `WorkerConfig` payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<RawExtension>,
}

/// Machine selection of a shoot worker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShootMachine {
    /// Machine type name
    pub r#type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MachineImageReference>,
}

// ============================================================================
// SecretBinding (core.gardener.cloud)
// ============================================================================

/// SecretBinding binds a cloud provider secret to shoots in its namespace.
///
/// SecretBindings have no `spec`, so they are read as dynamic objects and
/// converted into this type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBinding {
    #[serde(default)]
    pub metadata: ObjectMeta,

    pub secret_ref: SecretReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<SecretBindingProvider>,
}

/// Provider types a secret binding may be used with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBindingProvider {
    /// Comma separated list of provider types
    pub r#type: String,
}

impl SecretBinding {
    /// Returns `true` if the binding may be used with the given provider type.
    ///
    /// A binding without a provider section is usable with every provider.
    #[must_use]
    pub fn supports_provider(&self, provider_type: &str) -> bool {
        match &self.provider {
            None => true,
            Some(provider) => provider
                .r#type
                .split(',')
                .any(|t| t.trim() == provider_type),
        }
    }
}

// ============================================================================
// Cluster
// ============================================================================

/// Snapshot of the cluster a worker belongs to.
///
/// The catalog in `cloud_profile` is treated as immutable for the duration of a
/// generation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub cloud_profile: CloudProfile,
    pub shoot: Shoot,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
