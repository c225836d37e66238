// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Output types of a machine generation run.

use crate::crd::{MachineControllerManagerSettings, Worker};
use crate::errors::Result;
use crate::labels::CLUSTER_LABEL;
use crate::provider::{Cpu, Devices, MachineImage, Memory, NetworkStatus, WorkerStatus};
use crate::scheme::{Scheme, Versioned};
use crate::worker::volumes::DataVolumeSpec;
use k8s_openapi::api::core::v1::{PodDNSConfig, Taint};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Machine class for one zone of one worker pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineClass {
    /// `{namespace}-{pool}-z{ordinal}-{hash}`
    pub name: String,
    pub region: String,
    pub zone: String,
    pub resources: ResourceRequirements,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Devices>,

    pub root_volume: DataVolumeSpec,

    #[serde(default)]
    pub additional_volumes: Vec<AdditionalVolume>,

    pub ssh_keys: Vec<String>,
    pub networks: Vec<NetworkStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Cpu>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Memory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_config: Option<PodDNSConfig>,

    /// Machine controller manager tags (cluster, role, machine class)
    pub tags: BTreeMap<String, String>,

    pub secret: MachineClassSecret,
}

/// Compute resources of a virtual machine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    pub requests: BTreeMap<String, Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<BTreeMap<String, Quantity>>,

    pub overcommit_guest_overhead: bool,
}

/// Data disk attached to every machine of a class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalVolume {
    pub name: String,
    pub data_volume: DataVolumeSpec,
}

/// Secret material of a machine class.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineClassSecret {
    /// Bootstrap user data of the pool
    pub cloud_config: String,

    /// Kubeconfig of the provider cluster
    pub kubeconfig: String,
}

/// Machine deployment for one zone of one worker pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDeployment {
    /// `{namespace}-{pool}-z{ordinal}`
    pub name: String,
    pub class_name: String,
    pub secret_name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub max_surge: i32,
    pub max_unavailable: i32,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default)]
    pub taints: Vec<Taint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_configuration: Option<MachineConfiguration>,
}

/// Per-deployment overrides of the machine controller manager.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_drain_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_health_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_creation_timeout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_evict_retries: Option<i32>,

    /// Comma separated node conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_conditions: Option<String>,
}

impl MachineConfiguration {
    /// Reads the machine controller manager settings of a pool.
    #[must_use]
    pub fn from_settings(settings: Option<&MachineControllerManagerSettings>) -> Option<Self> {
        let settings = settings?;
        Some(Self {
            machine_drain_timeout: settings.machine_drain_timeout.clone(),
            machine_health_timeout: settings.machine_health_timeout.clone(),
            machine_creation_timeout: settings.machine_creation_timeout.clone(),
            max_evict_retries: settings.max_evict_retries,
            node_conditions: settings.node_conditions.as_ref().map(|c| c.join(",")),
        })
    }
}

/// Everything a generation run produces.
///
/// Classes and deployments are in pool order, then zone order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub machine_classes: Vec<MachineClass>,
    pub machine_deployments: Vec<MachineDeployment>,

    /// Images in use, without duplicates
    pub machine_images: Vec<MachineImage>,

    /// Pre-allocated root volumes keyed by machine class name
    pub machine_class_volumes: BTreeMap<String, DataVolumeSpec>,
}

impl GenerationResult {
    /// Returns the provider status listing the machine images in use.
    #[must_use]
    pub fn worker_status(&self) -> WorkerStatus {
        WorkerStatus {
            machine_images: self.machine_images.clone(),
        }
    }

    /// Labels put on the pre-allocated volumes of the cluster in `namespace`.
    #[must_use]
    pub fn volume_labels(namespace: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(CLUSTER_LABEL.to_string(), namespace.to_string())])
    }

    /// Completes the result with what gets written back for `worker`: the encoded
    /// provider status, the volume labels and the images the previous status
    /// listed that no pool uses anymore.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::Error::Decode`] if the worker's current provider
    /// status is invalid, or [`crate::errors::Error::Conversion`] if the new one
    /// cannot be encoded.
    pub fn into_output(self, scheme: &Scheme, worker: &Worker) -> Result<GenerationOutput> {
        let previous = scheme.worker_status(worker)?;
        let status = self.worker_status();

        let retired_machine_images = previous
            .machine_images
            .into_iter()
            .filter(|old| {
                !status
                    .machine_images
                    .iter()
                    .any(|image| image.name == old.name && image.version == old.version)
            })
            .collect();
        let provider_status = scheme.convert(&status, "worker status")?;
        let volume_labels = Self::volume_labels(&worker.namespace().unwrap_or_default());

        Ok(GenerationOutput {
            result: self,
            volume_labels,
            provider_status,
            retired_machine_images,
        })
    }
}

/// A generation result together with the state written back to the worker.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    #[serde(flatten)]
    pub result: GenerationResult,

    /// Labels for the volumes in `result.machine_class_volumes`
    pub volume_labels: BTreeMap<String, String>,

    /// `WorkerStatus` to persist in the worker's `status.providerStatus`
    pub provider_status: Versioned<WorkerStatus>,

    pub retired_machine_images: Vec<MachineImage>,
}

/// Adds `image` unless an image with the same name and version is already listed.
pub fn append_machine_image(images: &mut Vec<MachineImage>, image: MachineImage) {
    let known = images
        .iter()
        .any(|i| i.name == image.name && i.version == image.version);
    if !known {
        images.push(image);
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
