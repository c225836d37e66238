// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # kubevirt-worker - KubeVirt worker pool compiler for Gardener
//!
//! Turns the worker pools of a Gardener `Worker` into the machine classes,
//! machine deployments and pre-allocated data volumes that the machine
//! controller manager needs to run shoot nodes as KubeVirt virtual machines.
//! It also carries the admission checks for KubeVirt shoots, cloud profiles and
//! cloud provider secrets.
//!
//! ## Modules
//!
//! - [`crd`] - Gardener resource types (`Worker`, `CloudProfile`, `Shoot`, ...)
//! - [`provider`] - KubeVirt provider configuration payloads
//! - [`scheme`] - Strict and lenient decoding of provider payloads
//! - [`worker`] - Generation of machine classes and deployments
//! - [`credentials`] - Access to the provider cluster kubeconfig
//! - [`validation`] - Admission validation
//! - [`manifest`] - Loading manifests from files
//! - [`errors`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use kubevirt_worker::credentials::StaticCredentialSource;
//! use kubevirt_worker::crd::{Cluster, Worker};
//! use kubevirt_worker::scheme::Scheme;
//! use kubevirt_worker::worker::MachineGenerator;
//!
//! # async fn run(worker: Worker, cluster: Cluster, kubeconfig: Vec<u8>) -> kubevirt_worker::errors::Result<()> {
//! let scheme = Scheme::new();
//! let credentials = StaticCredentialSource::new().with_kubeconfig(
//!     &worker.spec.secret_ref.namespace,
//!     &worker.spec.secret_ref.name,
//!     &kubeconfig,
//! );
//!
//! let result = MachineGenerator::new(&scheme, &credentials)
//!     .generate(&worker, &cluster)
//!     .await?;
//! for class in &result.machine_classes {
//!     println!("{} in zone {}", class.name, class.zone);
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod crd;
pub mod credentials;
pub mod errors;
pub mod labels;
pub mod manifest;
pub mod provider;
pub mod scheme;
pub mod validation;
pub mod worker;
