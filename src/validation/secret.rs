// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission validation of cloud provider secrets.
//!
//! Only secrets that a KubeVirt shoot uses through a secret binding are
//! checked. Updates that leave the secret data untouched are not re-validated.

use crate::constants::PROVIDER_TYPE;
use crate::errors::Result;
use crate::validation::lookup::{secret_in_use_by_shoot, ShootLookup};
use crate::validation::rules::validate_cloud_provider_secret;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::debug;

/// Validates cloud provider secrets on create and update.
pub struct SecretValidator<'a> {
    lookup: &'a dyn ShootLookup,
}

impl<'a> SecretValidator<'a> {
    #[must_use]
    pub fn new(lookup: &'a dyn ShootLookup) -> Self {
        Self { lookup }
    }

    /// Validates `new`, or the transition from `old` to `new` when `old` is given.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::Error::Validation`] if a secret in use lacks a
    /// kubeconfig, or a lookup error if bindings or shoots cannot be listed.
    pub async fn validate(&self, new: &Secret, old: Option<&Secret>) -> Result<()> {
        let key = format!("{}/{}", new.namespace().unwrap_or_default(), new.name_any());

        if old.is_some_and(|old| old.data == new.data) {
            debug!("Data of secret {} unchanged, skipping validation", key);
            return Ok(());
        }

        if !secret_in_use_by_shoot(self.lookup, new, PROVIDER_TYPE).await? {
            debug!("Secret {} is not used by any KubeVirt shoot", key);
            return Ok(());
        }

        Ok(validate_cloud_provider_secret(new).into_result()?)
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod secret_tests;
