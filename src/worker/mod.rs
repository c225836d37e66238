// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Compilation of Gardener worker pools into KubeVirt machine configuration.
//!
//! # Modules
//!
//! - [`distribution`] - Spreads pool bounds over zones
//! - [`volumes`] - Data volume specs for root and data disks
//! - [`resolver`] - Cloud profile lookups
//! - [`hash`] - Worker pool hash embedded in class names
//! - [`types`] - Machine classes, deployments and the run result
//! - [`machines`] - The generator tying it all together
//!
//! # Naming
//!
//! For pool `pool-a` in namespace `shoot--dev--local`, the deployment of the first
//! zone is `shoot--dev--local-pool-a-z1` and its class is
//! `shoot--dev--local-pool-a-z1-<hash>`. The class secret has the class name.

pub mod distribution;
pub mod hash;
pub mod machines;
pub mod resolver;
pub mod types;
pub mod volumes;

pub use distribution::{distribute_over_zones, distribute_positive_int_or_percent};
pub use machines::{MachineGenerator, ProviderCluster};
pub use types::{
    AdditionalVolume, GenerationOutput, GenerationResult, MachineClass, MachineClassSecret,
    MachineConfiguration, MachineDeployment, ResourceRequirements,
};
pub use volumes::{DataVolumeSource, DataVolumeSpec};

#[cfg(test)]
pub(crate) mod fixtures;
