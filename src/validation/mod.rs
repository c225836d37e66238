// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission validation for KubeVirt shoots, cloud profiles and secrets.
//!
//! # Modules
//!
//! - [`field`] - Field paths, field errors and error lists
//! - [`rules`] - Structural validation rules
//! - [`lookup`] - Access to cloud profiles, secret bindings, secrets and shoots
//! - [`shoot`] - Create and update validation of shoots
//! - [`cloudprofile`] - Validation of cloud profile provider configs
//! - [`secret`] - Validation of cloud provider secrets

pub mod cloudprofile;
pub mod field;
pub mod lookup;
pub mod rules;
pub mod secret;
pub mod shoot;

pub use cloudprofile::CloudProfileValidator;
pub use field::{ErrorList, FieldError, FieldErrorKind, FieldPath};
pub use lookup::{secret_in_use_by_shoot, InMemoryLookup, KubeShootLookup, ShootLookup};
pub use secret::SecretValidator;
pub use shoot::ShootValidator;
