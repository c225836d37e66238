// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Data volume specifications for machine root and data disks.
//!
//! Every disk of a KubeVirt machine is backed by a CDI data volume. All of them
//! share the same claim envelope (`ReadWriteOnce`, a storage request and a
//! storage class) and differ only in where the initial content comes from.
//! The source is an enum, so a spec can never carry more than one.

use crate::constants::{ACCESS_MODE_READ_WRITE_ONCE, RESOURCE_STORAGE};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A CDI data volume: a claim plus the source its content is imported from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSpec {
    pub pvc: DataVolumeClaim,
    pub source: DataVolumeSource,
}

/// Persistent volume claim backing a data volume.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeClaim {
    pub access_modes: Vec<String>,
    pub resources: VolumeResources,
    pub storage_class_name: String,
}

/// Resource requests of a claim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeResources {
    pub requests: BTreeMap<String, Quantity>,
}

/// Where the content of a data volume comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataVolumeSource {
    /// Clone of an existing claim in the provider cluster
    Pvc { namespace: String, name: String },
    /// Import from an HTTP(S) URL
    Http { url: String },
    /// Empty disk
    Blank {},
}

impl DataVolumeSpec {
    /// Builds a volume cloned from the claim `namespace/name`.
    #[must_use]
    pub fn with_pvc_source(
        storage_class_name: &str,
        size: &Quantity,
        namespace: &str,
        name: &str,
    ) -> Self {
        Self::new(
            storage_class_name,
            size,
            DataVolumeSource::Pvc {
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
        )
    }

    /// Builds a volume imported from `url`.
    #[must_use]
    pub fn with_http_source(storage_class_name: &str, size: &Quantity, url: &str) -> Self {
        Self::new(
            storage_class_name,
            size,
            DataVolumeSource::Http {
                url: url.to_string(),
            },
        )
    }

    /// Builds an empty volume.
    #[must_use]
    pub fn with_blank_source(storage_class_name: &str, size: &Quantity) -> Self {
        Self::new(storage_class_name, size, DataVolumeSource::Blank {})
    }

    fn new(storage_class_name: &str, size: &Quantity, source: DataVolumeSource) -> Self {
        let mut requests = BTreeMap::new();
        requests.insert(RESOURCE_STORAGE.to_string(), size.clone());

        Self {
            pvc: DataVolumeClaim {
                access_modes: vec![ACCESS_MODE_READ_WRITE_ONCE.to_string()],
                resources: VolumeResources { requests },
                storage_class_name: storage_class_name.to_string(),
            },
            source,
        }
    }

    /// Returns the requested storage size.
    #[must_use]
    pub fn storage_request(&self) -> Option<&Quantity> {
        self.pvc.resources.requests.get(RESOURCE_STORAGE)
    }
}

#[cfg(test)]
#[path = "volumes_tests.rs"]
mod volumes_tests;
