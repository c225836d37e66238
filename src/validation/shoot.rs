// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission validation of KubeVirt shoots.
//!
//! On create, every provider section of the shoot is decoded strictly and
//! validated, and the cloud provider secret the shoot binds is checked.
//!
//! On update, the previous shoot is decoded leniently and compared with the new
//! one. Structural checks only run for sections whose decoded value changed, so
//! an edit of one worker pool does not re-flag an unrelated pool that was
//! accepted earlier. Worker pools are matched by name, never by position.

use crate::constants::PROVIDER_TYPE;
use crate::crd::{Shoot, ShootWorker};
use crate::errors::{Error, Result};
use crate::provider::{CloudProfileConfig, ControlPlaneConfig, InfrastructureConfig, WorkerConfig};
use crate::scheme::{Decoder, Scheme};
use crate::validation::field::{ErrorList, FieldError, FieldPath};
use crate::validation::lookup::ShootLookup;
use crate::validation::rules;
use crate::worker::resolver::machine_image_url;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Provider sections of one shoot, decoded.
#[derive(Debug, Default)]
struct ShootConfigs {
    infrastructure: InfrastructureConfig,
    control_plane: ControlPlaneConfig,
    /// Keyed by worker pool name
    workers: BTreeMap<String, WorkerConfig>,
}

/// Everything needed to validate the new version of a shoot.
struct ValidationContext<'s> {
    shoot: &'s Shoot,
    configs: ShootConfigs,
    cloud_profile_config: CloudProfileConfig,
}

/// Validates KubeVirt shoots on create and update.
pub struct ShootValidator<'a> {
    scheme: &'a Scheme,
    lookup: &'a dyn ShootLookup,
}

impl<'a> ShootValidator<'a> {
    #[must_use]
    pub fn new(scheme: &'a Scheme, lookup: &'a dyn ShootLookup) -> Self {
        Self { scheme, lookup }
    }

    /// Validates `new`, or the transition from `old` to `new` when `old` is given.
    ///
    /// Shoots of other provider types pass without checks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with all field violations,
    /// [`Error::Decode`] if a provider section cannot be decoded, and
    /// [`Error::Precondition`] if the cloud profile has no provider config.
    pub async fn validate(&self, new: &Shoot, old: Option<&Shoot>) -> Result<()> {
        if new.spec.provider.r#type != PROVIDER_TYPE {
            debug!(
                "Skipping shoot {} with provider type {}",
                shoot_key(new),
                new.spec.provider.r#type
            );
            return Ok(());
        }

        match old {
            None => self.validate_create(new).await,
            Some(old) => self.validate_update(new, old).await,
        }
    }

    async fn validate_create(&self, shoot: &Shoot) -> Result<()> {
        info!("Validating creation of shoot {}", shoot_key(shoot));

        let context = self.context(shoot).await?;
        let mut errors = ErrorList::new();

        errors.append(rules::validate_networking(&shoot.spec.networking, &networking_path()));
        errors.append(rules::validate_infrastructure_config(
            &context.configs.infrastructure,
            &infrastructure_path(),
        ));
        errors.append(rules::validate_control_plane_config(
            &context.configs.control_plane,
            &control_plane_path(),
        ));
        errors.append(rules::validate_workers(&shoot.spec.provider.workers, &workers_path()));
        for (i, worker) in shoot.spec.provider.workers.iter().enumerate() {
            errors.append(context.validate_pool(i, worker));
        }
        errors.into_result()?;

        self.validate_shoot_secret(shoot).await
    }

    async fn validate_update(&self, new: &Shoot, old: &Shoot) -> Result<()> {
        info!("Validating update of shoot {}", shoot_key(new));

        let previous = decode_configs(old, self.scheme.lenient_decoder())?;
        let context = self.context(new).await?;
        let mut errors = ErrorList::new();

        errors.append(rules::validate_networking(&new.spec.networking, &networking_path()));

        if previous.infrastructure != context.configs.infrastructure {
            debug!("infrastructureConfig of shoot {} changed", shoot_key(new));
            errors.append(rules::validate_infrastructure_config_update(
                &previous.infrastructure,
                &context.configs.infrastructure,
                &infrastructure_path(),
            ));
            errors.append(rules::validate_infrastructure_config(
                &context.configs.infrastructure,
                &infrastructure_path(),
            ));
        }

        if previous.control_plane != context.configs.control_plane {
            debug!("controlPlaneConfig of shoot {} changed", shoot_key(new));
            errors.append(rules::validate_control_plane_config(
                &context.configs.control_plane,
                &control_plane_path(),
            ));
        }

        let old_workers = &old.spec.provider.workers;
        let new_workers = &new.spec.provider.workers;
        errors.append(rules::validate_workers(new_workers, &workers_path()));
        errors.append(rules::validate_workers_update(old_workers, new_workers, &workers_path()));

        for (i, worker) in new_workers.iter().enumerate() {
            let unchanged = old_workers
                .iter()
                .find(|w| w.name == worker.name)
                .is_some_and(|prior| {
                    prior.machine == worker.machine
                        && prior.data_volumes == worker.data_volumes
                        && previous.workers.get(&prior.name)
                            == context.configs.workers.get(&worker.name)
                });
            if unchanged {
                continue;
            }
            debug!("Worker pool {} of shoot {} changed", worker.name, shoot_key(new));
            errors.append(context.validate_pool(i, worker));
        }

        Ok(errors.into_result()?)
    }

    /// Decodes the new shoot strictly and loads its cloud profile config.
    async fn context<'s>(&self, shoot: &'s Shoot) -> Result<ValidationContext<'s>> {
        let configs = decode_configs(shoot, self.scheme.strict_decoder())?;

        let cloud_profile = self.lookup.cloud_profile(&shoot.spec.cloud_profile_name).await?;
        let raw = cloud_profile.spec.provider_config.as_ref().ok_or_else(|| {
            Error::Precondition(format!(
                "cloud profile \"{}\" of shoot {} has no providerConfig",
                cloud_profile.name_any(),
                shoot_key(shoot)
            ))
        })?;
        let cloud_profile_config = self
            .scheme
            .lenient_decoder()
            .decode(Some(raw))
            .map_err(|source| Error::Decode {
                what: format!("providerConfig of cloud profile \"{}\"", cloud_profile.name_any()),
                source,
            })?;

        Ok(ValidationContext {
            shoot,
            configs,
            cloud_profile_config,
        })
    }

    /// Checks the cloud provider secret bound to a new shoot.
    async fn validate_shoot_secret(&self, shoot: &Shoot) -> Result<()> {
        let namespace = shoot.namespace().unwrap_or_default();
        let binding_name = &shoot.spec.secret_binding_name;
        if binding_name.is_empty() {
            debug!("Shoot {} has no secret binding", shoot_key(shoot));
            return Ok(());
        }

        let binding = self.lookup.secret_binding(&namespace, binding_name).await?;
        let secret = self
            .lookup
            .secret(&binding.secret_ref.namespace, &binding.secret_ref.name)
            .await?;

        Ok(rules::validate_cloud_provider_secret(&secret).into_result()?)
    }
}

impl ValidationContext<'_> {
    /// Structural checks of one pool that depend on decoded provider data.
    fn validate_pool(&self, index: usize, worker: &ShootWorker) -> ErrorList {
        let worker_path = workers_path().index(index);
        let mut errors = ErrorList::new();

        if let Some(config) = self.configs.workers.get(&worker.name) {
            errors.append(rules::validate_worker_config(
                config,
                &worker.data_volumes,
                &worker_path.child("providerConfig"),
            ));
        }

        if let Some(image) = &worker.machine.image {
            if machine_image_url(&self.cloud_profile_config, &image.name, &image.version).is_err() {
                errors.push(FieldError::invalid(
                    &worker_path.child("machine").child("image"),
                    &format!("{}:{}", image.name, image.version),
                    &format!(
                        "machine image is not configured in the providerConfig of cloud profile {:?}",
                        self.shoot.spec.cloud_profile_name
                    ),
                ));
            }
        }

        errors
    }
}

fn decode_configs(shoot: &Shoot, decoder: Decoder<'_>) -> Result<ShootConfigs> {
    let key = shoot_key(shoot);
    let provider = &shoot.spec.provider;

    let infrastructure = decoder
        .decode(provider.infrastructure_config.as_ref())
        .map_err(|source| Error::Decode {
            what: format!("infrastructureConfig of shoot {key}"),
            source,
        })?;
    let control_plane = decoder
        .decode(provider.control_plane_config.as_ref())
        .map_err(|source| Error::Decode {
            what: format!("controlPlaneConfig of shoot {key}"),
            source,
        })?;

    let mut workers = BTreeMap::new();
    for worker in &provider.workers {
        let config = decoder
            .decode(worker.provider_config.as_ref())
            .map_err(|source| Error::Decode {
                what: format!("providerConfig of worker \"{}\" in shoot {key}", worker.name),
                source,
            })?;
        workers.insert(worker.name.clone(), config);
    }

    Ok(ShootConfigs {
        infrastructure,
        control_plane,
        workers,
    })
}

fn shoot_key(shoot: &Shoot) -> String {
    format!("{}/{}", shoot.namespace().unwrap_or_default(), shoot.name_any())
}

fn networking_path() -> FieldPath {
    FieldPath::new("spec").child("networking")
}

fn infrastructure_path() -> FieldPath {
    FieldPath::new("spec").child("provider").child("infrastructureConfig")
}

fn control_plane_path() -> FieldPath {
    FieldPath::new("spec").child("provider").child("controlPlaneConfig")
}

fn workers_path() -> FieldPath {
    FieldPath::new("spec").child("provider").child("workers")
}

#[cfg(test)]
#[path = "shoot_tests.rs"]
mod shoot_tests;
