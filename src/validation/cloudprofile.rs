// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission validation of KubeVirt cloud profiles.

use crate::constants::PROVIDER_TYPE;
use crate::crd::CloudProfile;
use crate::errors::{Error, Result};
use crate::provider::CloudProfileConfig;
use crate::scheme::Scheme;
use crate::validation::field::{ErrorList, FieldError, FieldPath};
use crate::validation::rules::validate_cloud_profile_config;
use kube::ResourceExt;
use tracing::{debug, info};

/// Validates the provider configuration of KubeVirt cloud profiles.
pub struct CloudProfileValidator<'a> {
    scheme: &'a Scheme,
}

impl<'a> CloudProfileValidator<'a> {
    #[must_use]
    pub fn new(scheme: &'a Scheme) -> Self {
        Self { scheme }
    }

    /// Validates a cloud profile. Profiles of other provider types pass.
    ///
    /// The provider config is decoded leniently, since cloud profiles are
    /// long-lived and may carry fields of older schema versions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the provider config is missing or
    /// invalid, and [`Error::Decode`] if it cannot be decoded.
    pub fn validate(&self, cloud_profile: &CloudProfile) -> Result<()> {
        if cloud_profile.spec.r#type != PROVIDER_TYPE {
            debug!(
                "Skipping cloud profile {} with provider type {}",
                cloud_profile.name_any(),
                cloud_profile.spec.r#type
            );
            return Ok(());
        }
        info!("Validating cloud profile {}", cloud_profile.name_any());

        let path = FieldPath::new("spec").child("providerConfig");
        let Some(raw) = cloud_profile.spec.provider_config.as_ref() else {
            let errors = ErrorList::from(vec![FieldError::required(
                &path,
                "providerConfig must be set for KubeVirt cloud profiles",
            )]);
            return Err(errors.into());
        };

        let config: CloudProfileConfig = self
            .scheme
            .lenient_decoder()
            .decode(Some(raw))
            .map_err(|source| Error::Decode {
                what: format!("providerConfig of cloud profile \"{}\"", cloud_profile.name_any()),
                source,
            })?;

        Ok(validate_cloud_profile_config(&cloud_profile.spec, &config, &path).into_result()?)
    }
}

#[cfg(test)]
#[path = "cloudprofile_tests.rs"]
mod cloudprofile_tests;
