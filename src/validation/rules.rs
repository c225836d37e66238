// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Structural validation rules for KubeVirt shoots, cloud profiles and secrets.
//!
//! Every rule is a pure function returning an [`ErrorList`]; an empty list means
//! the input is valid. Callers decide which rules to run (see
//! [`crate::validation::shoot`] for the create/update scoping).

use crate::constants::{DNS_POLICY_NONE, KUBECONFIG_SECRET_KEY, SUPPORTED_DNS_POLICIES};
use crate::crd::{CloudProfileSpec, DataVolume, Networking, ShootWorker, Volume};
use crate::provider::{
    CloudProfileConfig, ControlPlaneConfig, InfrastructureConfig, WorkerConfig,
};
use crate::validation::field::{ErrorList, FieldError, FieldPath};
use crate::worker::resolver::parse_quantity;
use k8s_openapi::api::core::v1::Secret;
use ipnetwork::IpNetwork;
use std::collections::BTreeSet;

/// Hugepage sizes KubeVirt can back guest memory with
const SUPPORTED_HUGEPAGE_SIZES: &[&str] = &["2Mi", "1Gi"];

// ============================================================================
// Shoot networking
// ============================================================================

/// Validates the networking section of a shoot.
///
/// The node network is required because machines are attached to it.
#[must_use]
pub fn validate_networking(networking: &Networking, path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();
    let nodes_path = path.child("nodes");

    match networking.nodes.as_deref() {
        None | Some("") => errors.push(FieldError::required(
            &nodes_path,
            "a nodes CIDR must be provided for KubeVirt shoots",
        )),
        Some(cidr) if !is_cidr(cidr) => {
            errors.push(FieldError::invalid(&nodes_path, cidr, "must be a valid CIDR"));
        }
        Some(_) => {}
    }

    errors
}

/// A bare address parses as a host network, so the prefix length must be explicit.
fn is_cidr(value: &str) -> bool {
    value.contains('/') && value.parse::<IpNetwork>().is_ok()
}

// ============================================================================
// InfrastructureConfig
// ============================================================================

/// Validates the provider infrastructure configuration of a shoot.
#[must_use]
pub fn validate_infrastructure_config(config: &InfrastructureConfig, path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();
    let networks_path = path.child("networks");

    let shared_path = networks_path.child("sharedNetworks");
    for (i, network) in config.networks.shared_networks.iter().enumerate() {
        if network.name.is_empty() {
            errors.push(FieldError::required(
                &shared_path.index(i).child("name"),
                "name of the shared network is required",
            ));
        }
    }

    let tenant_path = networks_path.child("tenantNetworks");
    let mut names = BTreeSet::new();
    let mut default_seen = false;
    for (i, network) in config.networks.tenant_networks.iter().enumerate() {
        let network_path = tenant_path.index(i);

        if network.name.is_empty() {
            errors.push(FieldError::required(
                &network_path.child("name"),
                "name of the tenant network is required",
            ));
        } else if !names.insert(network.name.as_str()) {
            errors.push(FieldError::duplicate(&network_path.child("name"), &network.name));
        }

        if network.config.is_empty() {
            errors.push(FieldError::required(
                &network_path.child("config"),
                "network configuration is required",
            ));
        } else if let Err(e) = serde_json::from_str::<serde_json::Value>(&network.config) {
            errors.push(FieldError::invalid(
                &network_path.child("config"),
                &network.config,
                &format!("must be valid JSON: {e}"),
            ));
        }

        if network.default {
            if default_seen {
                errors.push(FieldError::forbidden(
                    &network_path.child("default"),
                    "only one tenant network can be the default network",
                ));
            }
            default_seen = true;
        }
    }

    errors
}

/// Validates a change of the infrastructure configuration. Networks are immutable.
#[must_use]
pub fn validate_infrastructure_config_update(
    old: &InfrastructureConfig,
    new: &InfrastructureConfig,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();
    if old.networks != new.networks {
        errors.push(FieldError::forbidden(&path.child("networks"), "field is immutable"));
    }
    errors
}

// ============================================================================
// ControlPlaneConfig
// ============================================================================

/// Validates the provider control plane configuration of a shoot.
#[must_use]
pub fn validate_control_plane_config(config: &ControlPlaneConfig, path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();

    if let Some(ccm) = &config.cloud_controller_manager {
        let gates_path = path.child("cloudControllerManager").child("featureGates");
        for name in ccm.feature_gates.keys() {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
                errors.push(FieldError::invalid(
                    &gates_path.key(name),
                    name,
                    "feature gate names consist of letters and digits only",
                ));
            }
        }
    }

    errors
}

// ============================================================================
// Workers
// ============================================================================

/// Validates the worker pools of a shoot.
#[must_use]
pub fn validate_workers(workers: &[ShootWorker], path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();

    for (i, worker) in workers.iter().enumerate() {
        let worker_path = path.index(i);

        let zones_path = worker_path.child("zones");
        if worker.zones.is_empty() {
            errors.push(FieldError::required(
                &zones_path,
                "at least one zone must be configured",
            ));
        }
        let mut zones = BTreeSet::new();
        for (j, zone) in worker.zones.iter().enumerate() {
            if !zones.insert(zone.as_str()) {
                errors.push(FieldError::duplicate(&zones_path.index(j), zone));
            }
        }

        if worker.minimum < 0 {
            errors.push(FieldError::invalid(
                &worker_path.child("minimum"),
                &worker.minimum.to_string(),
                "must not be negative",
            ));
        }
        if worker.maximum < worker.minimum {
            errors.push(FieldError::invalid(
                &worker_path.child("maximum"),
                &worker.maximum.to_string(),
                "must not be less than minimum",
            ));
        }

        if let Some(volume) = &worker.volume {
            validate_volume(volume, &worker_path.child("volume"), &mut errors);
        }

        let data_volumes_path = worker_path.child("dataVolumes");
        let mut names = BTreeSet::new();
        for (j, volume) in worker.data_volumes.iter().enumerate() {
            validate_data_volume(volume, &data_volumes_path.index(j), &mut names, &mut errors);
        }
    }

    errors
}

fn validate_volume(volume: &Volume, path: &FieldPath, errors: &mut ErrorList) {
    if volume.r#type.as_deref().unwrap_or_default().is_empty() {
        errors.push(FieldError::required(&path.child("type"), "volume type is required"));
    }
    validate_size(&volume.size, &path.child("size"), errors);
}

fn validate_data_volume<'a>(
    volume: &'a DataVolume,
    path: &FieldPath,
    names: &mut BTreeSet<&'a str>,
    errors: &mut ErrorList,
) {
    if volume.name.is_empty() {
        errors.push(FieldError::required(&path.child("name"), "data volume name is required"));
    } else if !names.insert(volume.name.as_str()) {
        errors.push(FieldError::duplicate(&path.child("name"), &volume.name));
    }
    if volume.r#type.as_deref().unwrap_or_default().is_empty() {
        errors.push(FieldError::required(&path.child("type"), "data volume type is required"));
    }
    validate_size(&volume.size, &path.child("size"), errors);
}

fn validate_size(size: &str, path: &FieldPath, errors: &mut ErrorList) {
    if let Err(reason) = parse_quantity(size) {
        errors.push(FieldError::invalid(path, size, &format!("must be a quantity: {reason}")));
    }
}

/// Validates a change of the worker pools. Zones of existing pools cannot be removed.
///
/// Pools are matched by name; new and deleted pools are not checked here.
#[must_use]
pub fn validate_workers_update(old: &[ShootWorker], new: &[ShootWorker], path: &FieldPath) -> ErrorList {
    let mut errors = ErrorList::new();

    for (i, worker) in new.iter().enumerate() {
        let Some(previous) = old.iter().find(|w| w.name == worker.name) else {
            continue;
        };
        for zone in &previous.zones {
            if !worker.zones.contains(zone) {
                errors.push(FieldError::forbidden(
                    &path.index(i).child("zones"),
                    &format!("zone {zone} cannot be removed"),
                ));
            }
        }
    }

    errors
}

/// Validates the `WorkerConfig` of one pool against the pool's data volumes.
#[must_use]
pub fn validate_worker_config(
    config: &WorkerConfig,
    data_volumes: &[DataVolume],
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();

    if let Some(policy) = config.dns_policy.as_deref() {
        if !SUPPORTED_DNS_POLICIES.contains(&policy) {
            errors.push(FieldError::not_supported(
                &path.child("dnsPolicy"),
                policy,
                SUPPORTED_DNS_POLICIES,
            ));
        } else if policy == DNS_POLICY_NONE {
            let has_nameserver = config
                .dns_config
                .as_ref()
                .and_then(|c| c.nameservers.as_ref())
                .is_some_and(|n| !n.is_empty());
            if !has_nameserver {
                errors.push(FieldError::required(
                    &path.child("dnsConfig").child("nameservers"),
                    "at least one nameserver is required when dnsPolicy is None",
                ));
            }
        }
    }

    if let Some(devices) = &config.devices {
        let disks_path = path.child("devices").child("disks");
        let volume_names: BTreeSet<&str> = data_volumes.iter().map(|v| v.name.as_str()).collect();
        let mut disk_names = BTreeSet::new();

        for (i, disk) in devices.disks.iter().enumerate() {
            let name_path = disks_path.index(i).child("name");
            if disk.name.is_empty() {
                errors.push(FieldError::required(&name_path, "disk name is required"));
            } else if !disk_names.insert(disk.name.as_str()) {
                errors.push(FieldError::duplicate(&name_path, &disk.name));
            } else if !volume_names.contains(disk.name.as_str()) {
                errors.push(FieldError::invalid(
                    &name_path,
                    &disk.name,
                    "must reference a data volume of the worker pool",
                ));
            }
        }
    }

    if let Some(cpu) = &config.cpu {
        if cpu.isolate_emulator_thread == Some(true) && cpu.dedicated_cpu_placement != Some(true) {
            errors.push(FieldError::forbidden(
                &path.child("cpu").child("isolateEmulatorThread"),
                "requires dedicatedCpuPlacement",
            ));
        }
    }

    if let Some(hugepages) = config.memory.as_ref().and_then(|m| m.hugepages.as_ref()) {
        if !SUPPORTED_HUGEPAGE_SIZES.contains(&hugepages.page_size.as_str()) {
            errors.push(FieldError::not_supported(
                &path.child("memory").child("hugepages").child("pageSize"),
                &hugepages.page_size,
                SUPPORTED_HUGEPAGE_SIZES,
            ));
        }
    }

    errors
}

// ============================================================================
// CloudProfileConfig
// ============================================================================

/// Validates the provider configuration of a cloud profile.
#[must_use]
pub fn validate_cloud_profile_config(
    spec: &CloudProfileSpec,
    config: &CloudProfileConfig,
    path: &FieldPath,
) -> ErrorList {
    let mut errors = ErrorList::new();

    let images_path = path.child("machineImages");
    if config.machine_images.is_empty() {
        errors.push(FieldError::required(
            &images_path,
            "at least one machine image must be configured",
        ));
    }
    for (i, image) in config.machine_images.iter().enumerate() {
        let image_path = images_path.index(i);
        if image.name.is_empty() {
            errors.push(FieldError::required(&image_path.child("name"), "must provide a name"));
        }
        if image.versions.is_empty() {
            errors.push(FieldError::required(
                &image_path.child("versions"),
                &format!("must provide at least one version for machine image {:?}", image.name),
            ));
        }
        for (j, version) in image.versions.iter().enumerate() {
            let version_path = image_path.child("versions").index(j);
            if version.version.is_empty() {
                errors.push(FieldError::required(
                    &version_path.child("version"),
                    "must provide a version",
                ));
            }
            if version.source_url.is_empty() {
                errors.push(FieldError::required(
                    &version_path.child("sourceURL"),
                    "must provide a source URL",
                ));
            } else if let Err(e) = url::Url::parse(&version.source_url) {
                errors.push(FieldError::invalid(
                    &version_path.child("sourceURL"),
                    &version.source_url,
                    &format!("must be a valid URL: {e}"),
                ));
            }
        }
    }

    let types_path = path.child("machineTypes");
    for (i, machine_type) in config.machine_types.iter().enumerate() {
        let type_path = types_path.index(i);
        if !spec.machine_types.iter().any(|mt| mt.name == machine_type.name) {
            errors.push(FieldError::invalid(
                &type_path.child("name"),
                &machine_type.name,
                "must reference a machine type of the cloud profile",
            ));
        }
        if let Some(limits) = &machine_type.limits {
            let limits_path = type_path.child("limits");
            validate_size(&limits.cpu.0, &limits_path.child("cpu"), &mut errors);
            validate_size(&limits.memory.0, &limits_path.child("memory"), &mut errors);
        }
    }

    errors
}

// ============================================================================
// Cloud provider secret
// ============================================================================

/// Validates a cloud provider secret: it must carry a non-empty kubeconfig.
#[must_use]
pub fn validate_cloud_provider_secret(secret: &Secret) -> ErrorList {
    let mut errors = ErrorList::new();
    let path = FieldPath::new("data").key(KUBECONFIG_SECRET_KEY);

    match secret
        .data
        .as_ref()
        .and_then(|data| data.get(KUBECONFIG_SECRET_KEY))
    {
        None => errors.push(FieldError::required(
            &path,
            &format!("missing {KUBECONFIG_SECRET_KEY:?} field in secret"),
        )),
        Some(value) if value.0.is_empty() => errors.push(FieldError::required(
            &path,
            &format!("{KUBECONFIG_SECRET_KEY:?} field in secret must not be empty"),
        )),
        Some(_) => {}
    }

    errors
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod rules_tests;
