// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! KubeVirt provider configuration types.
//!
//! These are the shapes carried inside the opaque `providerConfig` and
//! `providerStatus` payloads of Gardener resources. They are decoded by
//! [`crate::scheme::Decoder`] and never exchanged as raw bytes past that point.
//!
//! Every type has a `Default` value meaning "no overrides", which is what an
//! absent payload decodes to.

use crate::constants::{
    KIND_CLOUD_PROFILE_CONFIG, KIND_CONTROL_PLANE_CONFIG, KIND_INFRASTRUCTURE_CONFIG,
    KIND_INFRASTRUCTURE_STATUS, KIND_WORKER_CONFIG, KIND_WORKER_STATUS,
};
use crate::scheme::ProviderKind;
use k8s_openapi::api::core::v1::PodDNSConfig;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CloudProfileConfig
// ============================================================================

/// Provider section of a cloud profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudProfileConfig {
    /// Machine images and the URLs their versions are downloaded from
    pub machine_images: Vec<MachineImages>,

    /// Sparse per-machine-type overrides, keyed by machine type name
    pub machine_types: Vec<MachineTypeExtension>,
}

/// All versions of one machine image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineImages {
    pub name: String,
    pub versions: Vec<MachineImageVersion>,
}

/// One version of a machine image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineImageVersion {
    pub version: String,

    /// URL the root disk image is imported from
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

/// Provider specific attributes layered on top of a cloud profile machine type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineTypeExtension {
    pub name: String,

    /// Resource limits of the virtual machine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceLimits>,
}

/// CPU and memory limits of a virtual machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceLimits {
    pub cpu: Quantity,
    pub memory: Quantity,
}

// ============================================================================
// InfrastructureConfig / InfrastructureStatus
// ============================================================================

/// Provider section of a shoot's infrastructure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct InfrastructureConfig {
    pub networks: NetworksConfig,
}

/// Networks the shoot's machines are attached to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworksConfig {
    /// Pre-existing network attachment definitions in the provider cluster
    pub shared_networks: Vec<NetworkAttachmentReference>,

    /// Networks created for this shoot only
    pub tenant_networks: Vec<TenantNetwork>,
}

/// Reference to a network attachment definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkAttachmentReference {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Network created for a single shoot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantNetwork {
    pub name: String,

    /// CNI configuration of the network attachment definition
    pub config: String,

    /// Whether this network replaces the pod network as the default interface
    pub default: bool,
}

/// Infrastructure status written by the infrastructure controller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct InfrastructureStatus {
    pub networks: Vec<NetworkStatus>,
}

/// One network of the provider cluster as seen by machines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkStatus {
    pub name: String,
    pub default: bool,

    /// Hash of the network attachment definition
    pub sha: String,
}

impl InfrastructureStatus {
    /// Flattens the networks into `[name, default, sha, ...]` hash tokens.
    #[must_use]
    pub fn network_tokens(&self) -> Vec<String> {
        self.networks
            .iter()
            .flat_map(|n| [n.name.clone(), n.default.to_string(), n.sha.clone()])
            .collect()
    }
}

// ============================================================================
// ControlPlaneConfig
// ============================================================================

/// Provider section of a shoot's control plane.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlPlaneConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_controller_manager: Option<CloudControllerManagerConfig>,
}

/// Settings of the cloud controller manager.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudControllerManagerConfig {
    pub feature_gates: BTreeMap<String, bool>,
}

// ============================================================================
// WorkerConfig
// ============================================================================

/// Provider section of a worker pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    /// Disks and interface settings of the virtual machines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Devices>,

    /// CPU topology override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Cpu>,

    /// Memory override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Memory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_policy: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_config: Option<PodDNSConfig>,

    /// Do not reserve memory for the guest overhead in the launcher pod
    pub overcommit_guest_overhead: bool,

    /// Import the machine image directly into every root volume instead of cloning
    /// a pre-allocated volume per machine class
    pub disable_pre_allocated_data_volumes: bool,
}

/// Device settings of a virtual machine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Devices {
    /// Per-disk settings; names refer to data volumes of the pool
    pub disks: Vec<Disk>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_interface_multiqueue: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_multi_queue: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_virtio_transitional: Option<bool>,
}

/// Settings of one disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Disk {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub io: Option<String>,

    #[serde(rename = "dedicatedIOThread", skip_serializing_if = "Option::is_none")]
    pub dedicated_io_thread: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_order: Option<u32>,
}

/// CPU topology of a virtual machine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Cpu {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sockets: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedicated_cpu_placement: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolate_emulator_thread: Option<bool>,
}

/// Memory settings of a virtual machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Memory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hugepages: Option<Hugepages>,

    /// Memory visible to the guest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<Quantity>,
}

/// Hugepages backing the guest memory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Hugepages {
    pub page_size: String,
}

// ============================================================================
// WorkerStatus
// ============================================================================

/// Provider status of a worker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerStatus {
    /// Machine images in use by the worker's pools
    pub machine_images: Vec<MachineImage>,
}

/// A machine image version together with its source URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineImage {
    pub name: String,
    pub version: String,

    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

// ============================================================================
// Scheme registration
// ============================================================================

impl ProviderKind for CloudProfileConfig {
    const KIND: &'static str = KIND_CLOUD_PROFILE_CONFIG;
}

impl ProviderKind for InfrastructureConfig {
    const KIND: &'static str = KIND_INFRASTRUCTURE_CONFIG;
}

impl ProviderKind for InfrastructureStatus {
    const KIND: &'static str = KIND_INFRASTRUCTURE_STATUS;
}

impl ProviderKind for ControlPlaneConfig {
    const KIND: &'static str = KIND_CONTROL_PLANE_CONFIG;
}

impl ProviderKind for WorkerConfig {
    const KIND: &'static str = KIND_WORKER_CONFIG;
}

impl ProviderKind for WorkerStatus {
    const KIND: &'static str = KIND_WORKER_STATUS;
}
