// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generation of machine classes and machine deployments for a worker.
//!
//! A run walks the worker's pools in order and, for every zone of a pool, emits
//! one machine class and one machine deployment. Classes carry everything the
//! machine controller manager needs to create a KubeVirt virtual machine;
//! deployments carry the per-zone scaling bounds.
//!
//! Any failure aborts the whole run. Partial results are never returned.
//!
//! # Root volumes
//!
//! By default the machine image is imported once per machine class into a
//! pre-allocated volume in the provider cluster, and every machine's root volume
//! is cloned from it. Pools that set `disablePreAllocatedDataVolumes` import the
//! image directly into each root volume instead.
//!
//! # Example
//!
//! ```rust,no_run
//! use kubevirt_worker::credentials::SecretCredentialSource;
//! use kubevirt_worker::crd::{Cluster, Worker};
//! use kubevirt_worker::scheme::Scheme;
//! use kubevirt_worker::worker::MachineGenerator;
//!
//! async fn run(worker: Worker, cluster: Cluster) -> anyhow::Result<()> {
//!     let client = kube::Client::try_default().await?;
//!     let credentials = SecretCredentialSource::new(client);
//!     let scheme = Scheme::new();
//!
//!     let result = MachineGenerator::new(&scheme, &credentials)
//!         .generate(&worker, &cluster)
//!         .await?;
//!     println!("{} machine classes", result.machine_classes.len());
//!     Ok(())
//! }
//! ```

use crate::constants::{MACHINE_ROLE_NODE, RESOURCE_CPU, RESOURCE_MEMORY};
use crate::credentials::{kubeconfig_namespace, CredentialSource};
use crate::crd::{Cluster, MachineTypeStorage, Worker, WorkerPool};
use crate::errors::{Error, Result, SchemeError};
use crate::labels::{MCM_CLUSTER_TAG, MCM_MACHINE_CLASS_TAG, MCM_ROLE_TAG};
use crate::provider::{CloudProfileConfig, MachineImage, NetworkStatus};
use crate::scheme::Scheme;
use crate::worker::distribution::{distribute_over_zones, distribute_positive_int_or_percent};
use crate::worker::hash::worker_pool_hash;
use crate::worker::resolver;
use crate::worker::types::{
    append_machine_image, AdditionalVolume, GenerationResult, MachineClass, MachineClassSecret,
    MachineConfiguration, MachineDeployment, ResourceRequirements,
};
use crate::worker::volumes::DataVolumeSpec;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Access to the provider cluster, read from the worker's cloud provider secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderCluster {
    /// Raw kubeconfig, copied into every machine class secret
    pub kubeconfig: String,

    /// Namespace of the kubeconfig's current context; machines and volumes live here
    pub namespace: String,
}

impl ProviderCluster {
    /// Parses a kubeconfig and reads its namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the kubeconfig is not UTF-8 or not a kubeconfig.
    pub fn from_kubeconfig(kubeconfig: Vec<u8>) -> Result<Self> {
        let kubeconfig = String::from_utf8(kubeconfig).map_err(|e| Error::Decode {
            what: "provider cluster kubeconfig".to_string(),
            source: SchemeError::Malformed(e.to_string()),
        })?;
        let namespace = kubeconfig_namespace(&kubeconfig)?;
        Ok(Self {
            kubeconfig,
            namespace,
        })
    }
}

/// Compiles the worker pools of a [`Worker`] into machine classes and deployments.
pub struct MachineGenerator<'a> {
    scheme: &'a Scheme,
    credentials: &'a dyn CredentialSource,
}

impl<'a> MachineGenerator<'a> {
    #[must_use]
    pub fn new(scheme: &'a Scheme, credentials: &'a dyn CredentialSource) -> Self {
        Self {
            scheme,
            credentials,
        }
    }

    /// Fetches the provider cluster credentials and compiles the worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the cloud provider secret or its kubeconfig
    /// is missing, and any error of [`MachineGenerator::compile`].
    pub async fn generate(&self, worker: &Worker, cluster: &Cluster) -> Result<GenerationResult> {
        let secret_ref = &worker.spec.secret_ref;
        info!(
            "Generating machine config for worker {}/{} ({} pools)",
            worker.namespace().unwrap_or_default(),
            worker.name_any(),
            worker.spec.pools.len()
        );

        let kubeconfig = self.credentials.kubeconfig(secret_ref).await?;
        let provider = ProviderCluster::from_kubeconfig(kubeconfig)?;
        debug!(
            "Provider cluster namespace is {} (from secret {}/{})",
            provider.namespace, secret_ref.namespace, secret_ref.name
        );

        self.compile(worker, cluster, &provider)
    }

    /// Compiles the worker against already fetched provider cluster credentials.
    ///
    /// # Errors
    ///
    /// Returns the first failure among: undecodable provider payloads, a missing
    /// SSH key, unresolvable machine types, volume types or images, pools without
    /// any root volume, and malformed scaling bounds.
    pub fn compile(
        &self,
        worker: &Worker,
        cluster: &Cluster,
        provider: &ProviderCluster,
    ) -> Result<GenerationResult> {
        let infrastructure_status = self.scheme.infrastructure_status(worker)?;
        let networks = self
            .scheme
            .convert(&infrastructure_status, "InfrastructureStatus")?
            .object
            .networks;
        let network_tokens = infrastructure_status.network_tokens();

        let ssh_key = match &worker.spec.ssh_public_key {
            Some(key) if !key.0.is_empty() => String::from_utf8_lossy(&key.0).into_owned(),
            _ => {
                return Err(Error::Precondition(format!(
                    "missing sshPublicKey in worker {}",
                    worker.name_any()
                )))
            }
        };

        let cloud_profile_config = self.scheme.cloud_profile_config(&cluster.cloud_profile)?;

        let run = Run {
            scheme: self.scheme,
            worker,
            cluster,
            provider,
            cloud_profile_config: &cloud_profile_config,
            networks: &networks,
            network_tokens: &network_tokens,
            ssh_key,
            namespace: worker.namespace().unwrap_or_default(),
        };

        let mut result = GenerationResult::default();
        for pool in &worker.spec.pools {
            run.compile_pool(pool, &mut result)
                .map_err(|e| e.in_pool(&pool.name))?;
        }

        info!(
            "Generated {} machine classes, {} machine deployments, {} machine images for worker {}",
            result.machine_classes.len(),
            result.machine_deployments.len(),
            result.machine_images.len(),
            worker.name_any()
        );
        Ok(result)
    }
}

/// Inputs shared by all pools of one run.
struct Run<'r> {
    scheme: &'r Scheme,
    worker: &'r Worker,
    cluster: &'r Cluster,
    provider: &'r ProviderCluster,
    cloud_profile_config: &'r CloudProfileConfig,
    networks: &'r [NetworkStatus],
    network_tokens: &'r [String],
    ssh_key: String,
    namespace: String,
}

impl Run<'_> {
    fn compile_pool(&self, pool: &WorkerPool, result: &mut GenerationResult) -> Result<()> {
        let cloud_profile = &self.cluster.cloud_profile;
        let worker_config = self.scheme.worker_config(pool)?;
        let machine_type = resolver::machine_type(cloud_profile, &pool.machine_type)?;
        let pool_hash = worker_pool_hash(pool, self.worker, self.cluster, self.network_tokens)?;
        debug!("Worker pool {} has hash {}", pool.name, pool_hash);

        let image_url = resolver::machine_image_url(
            self.cloud_profile_config,
            &pool.machine_image.name,
            &pool.machine_image.version,
        )?;
        append_machine_image(
            &mut result.machine_images,
            MachineImage {
                name: pool.machine_image.name.clone(),
                version: pool.machine_image.version.clone(),
                source_url: image_url.clone(),
            },
        );

        let limits = resolver::machine_type_extension(self.cloud_profile_config, &machine_type.name)
            .and_then(|extension| extension.limits.as_ref())
            .map(|limits| {
                [(RESOURCE_CPU, &limits.cpu), (RESOURCE_MEMORY, &limits.memory)]
                    .into_iter()
                    .filter(|(_, quantity)| !quantity.0.is_empty())
                    .map(|(name, quantity)| (name.to_string(), quantity.clone()))
                    .collect::<BTreeMap<_, _>>()
            })
            .filter(|limits| !limits.is_empty());
        let resources = ResourceRequirements {
            requests: BTreeMap::from([
                (RESOURCE_CPU.to_string(), machine_type.cpu.clone()),
                (RESOURCE_MEMORY.to_string(), machine_type.memory.clone()),
            ]),
            limits,
            overcommit_guest_overhead: worker_config.overcommit_guest_overhead,
        };

        let (root_class, root_size) = match (&pool.volume, &machine_type.storage) {
            (Some(volume), _) => resolver::storage_class_and_size(
                cloud_profile,
                volume.r#type.as_deref(),
                &volume.size,
            )?,
            (
                None,
                Some(MachineTypeStorage {
                    class,
                    storage_size: Some(size),
                    ..
                }),
            ) => (class.clone(), size.clone()),
            _ => {
                return Err(Error::Precondition(format!(
                    "missing volume in worker pool and storage in machine type \"{}\"",
                    machine_type.name
                )))
            }
        };

        let additional_volumes = pool
            .data_volumes
            .iter()
            .map(|volume| {
                let (class, size) = resolver::storage_class_and_size(
                    cloud_profile,
                    volume.r#type.as_deref(),
                    &volume.size,
                )?;
                Ok(AdditionalVolume {
                    name: volume.name.clone(),
                    data_volume: DataVolumeSpec::with_blank_source(&class, &size),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let zone_count = i32::try_from(pool.zones.len()).map_err(|_| {
            Error::Precondition(format!("too many zones in worker pool {}", pool.name))
        })?;

        for (zone_index, zone) in (0_i32..).zip(&pool.zones) {
            let deployment_name = format!("{}-{}-z{}", self.namespace, pool.name, zone_index + 1);
            let class_name = format!("{deployment_name}-{pool_hash}");

            let root_volume = if worker_config.disable_pre_allocated_data_volumes {
                DataVolumeSpec::with_http_source(&root_class, &root_size, &image_url)
            } else {
                result.machine_class_volumes.insert(
                    class_name.clone(),
                    DataVolumeSpec::with_http_source(&root_class, &root_size, &image_url),
                );
                DataVolumeSpec::with_pvc_source(
                    &root_class,
                    &root_size,
                    &self.provider.namespace,
                    &class_name,
                )
            };

            result.machine_classes.push(MachineClass {
                name: class_name.clone(),
                region: self.worker.spec.region.clone(),
                zone: zone.clone(),
                resources: resources.clone(),
                devices: worker_config.devices.clone(),
                root_volume,
                additional_volumes: additional_volumes.clone(),
                ssh_keys: vec![self.ssh_key.clone()],
                networks: self.networks.to_vec(),
                cpu: worker_config.cpu.clone(),
                memory: worker_config.memory.clone(),
                dns_policy: worker_config.dns_policy.clone(),
                dns_config: worker_config.dns_config.clone(),
                tags: BTreeMap::from([
                    (MCM_CLUSTER_TAG.to_string(), self.namespace.clone()),
                    (MCM_ROLE_TAG.to_string(), MACHINE_ROLE_NODE.to_string()),
                    (MCM_MACHINE_CLASS_TAG.to_string(), class_name.clone()),
                ]),
                secret: MachineClassSecret {
                    cloud_config: pool
                        .user_data
                        .as_ref()
                        .map(|data| String::from_utf8_lossy(&data.0).into_owned())
                        .unwrap_or_default(),
                    kubeconfig: self.provider.kubeconfig.clone(),
                },
            });

            result.machine_deployments.push(MachineDeployment {
                name: deployment_name,
                class_name: class_name.clone(),
                secret_name: class_name,
                minimum: distribute_over_zones(zone_index, pool.minimum, zone_count),
                maximum: distribute_over_zones(zone_index, pool.maximum, zone_count),
                max_surge: distribute_positive_int_or_percent(
                    zone_index,
                    &pool.max_surge,
                    zone_count,
                    pool.maximum,
                )?,
                max_unavailable: distribute_positive_int_or_percent(
                    zone_index,
                    &pool.max_unavailable,
                    zone_count,
                    pool.minimum,
                )?,
                labels: pool.labels.clone(),
                annotations: pool.annotations.clone(),
                taints: pool.taints.clone(),
                machine_configuration: MachineConfiguration::from_settings(
                    pool.machine_controller_manager_settings.as_ref(),
                ),
            });
        }

        debug!(
            "Worker pool {} compiled into {} zones",
            pool.name,
            pool.zones.len()
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "machines_tests.rs"]
mod machines_tests;
