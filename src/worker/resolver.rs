// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lookups of worker pool references in the cloud profile.
//!
//! All lookups are linear scans with exact, case-sensitive name matching. When a
//! catalog lists a name twice the first entry wins.

use crate::crd::{CloudProfile, MachineType, VolumeType};
use crate::errors::{Error, Result};
use crate::provider::{CloudProfileConfig, MachineTypeExtension};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::ResourceExt;

const BINARY_SI_SUFFIXES: &[&str] = &["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SI_SUFFIXES: &[&str] = &["n", "u", "m", "", "k", "M", "G", "T", "P", "E"];

fn scope(cloud_profile: &CloudProfile) -> String {
    format!("cloud profile \"{}\"", cloud_profile.name_any())
}

/// Finds a machine type by name.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the cloud profile has no such machine type.
pub fn machine_type<'a>(cloud_profile: &'a CloudProfile, name: &str) -> Result<&'a MachineType> {
    cloud_profile
        .spec
        .machine_types
        .iter()
        .find(|mt| mt.name == name)
        .ok_or_else(|| Error::NotFound {
            kind: "machine type",
            name: name.to_string(),
            scope: scope(cloud_profile),
        })
}

/// Finds a volume type by name.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the cloud profile has no such volume type.
pub fn volume_type<'a>(cloud_profile: &'a CloudProfile, name: &str) -> Result<&'a VolumeType> {
    cloud_profile
        .spec
        .volume_types
        .iter()
        .find(|vt| vt.name == name)
        .ok_or_else(|| Error::NotFound {
            kind: "volume type",
            name: name.to_string(),
            scope: scope(cloud_profile),
        })
}

/// Finds the provider overrides of a machine type, if any.
#[must_use]
pub fn machine_type_extension<'a>(
    config: &'a CloudProfileConfig,
    name: &str,
) -> Option<&'a MachineTypeExtension> {
    config.machine_types.iter().find(|mt| mt.name == name)
}

/// Returns the source URL of a machine image version.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the image or the version is not listed.
pub fn machine_image_url(config: &CloudProfileConfig, name: &str, version: &str) -> Result<String> {
    config
        .machine_images
        .iter()
        .filter(|image| image.name == name)
        .flat_map(|image| image.versions.iter())
        .find(|v| v.version == version)
        .map(|v| v.source_url.clone())
        .ok_or_else(|| Error::NotFound {
            kind: "machine image",
            name: format!("{name}:{version}"),
            scope: "cloud profile config".to_string(),
        })
}

/// Resolves a volume type to its storage class and parses the requested size.
///
/// # Errors
///
/// Returns [`Error::Precondition`] if no volume type is given or the size is not a
/// valid quantity, and [`Error::NotFound`] if the volume type does not exist.
pub fn storage_class_and_size(
    cloud_profile: &CloudProfile,
    volume_type_name: Option<&str>,
    size: &str,
) -> Result<(String, Quantity)> {
    let Some(volume_type_name) = volume_type_name else {
        return Err(Error::Precondition(format!(
            "volume of size {size} does not specify a volume type"
        )));
    };
    let class = volume_type(cloud_profile, volume_type_name)?.class.clone();
    let size = parse_quantity(size).map_err(|reason| {
        Error::Precondition(format!("could not parse volume size {size:?} as quantity: {reason}"))
    })?;
    Ok((class, size))
}

/// Checks that `value` is a Kubernetes quantity such as `20Gi`, `500m` or `1e3`.
///
/// # Errors
///
/// Returns a description of the problem if the value is not a quantity.
pub fn parse_quantity(value: &str) -> std::result::Result<Quantity, String> {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let number_len = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);

    let mut parts = number.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err("more than one decimal point".to_string());
    }
    if whole.is_empty() && fraction.is_empty() {
        return Err("missing number".to_string());
    }

    let suffix_ok = BINARY_SI_SUFFIXES.contains(&suffix)
        || DECIMAL_SI_SUFFIXES.contains(&suffix)
        || suffix
            .strip_prefix(['e', 'E'])
            .map(|exp| exp.strip_prefix(['+', '-']).unwrap_or(exp))
            .is_some_and(|exp| !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit()));
    if !suffix_ok {
        return Err(format!("unknown suffix {suffix:?}"));
    }

    Ok(Quantity(value.to_string()))
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
