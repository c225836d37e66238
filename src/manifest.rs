// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Loading of Kubernetes manifests from files.

use crate::errors::{Error, Result, SchemeError};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// Reads a YAML (or JSON) manifest and deserializes it.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Decode`] if
/// its content does not match `T`.
pub async fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading manifest {}", path.display());
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
    parse(&content, &path.display().to_string())
}

/// Reads a raw file, e.g. a kubeconfig.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Deserializes a YAML (or JSON) manifest; `origin` names it in errors.
///
/// # Errors
///
/// Returns [`Error::Decode`] if `content` does not match `T`.
pub fn parse<T: DeserializeOwned>(content: &str, origin: &str) -> Result<T> {
    serde_yaml::from_str(content).map_err(|e| Error::Decode {
        what: format!("manifest {origin}"),
        source: SchemeError::Malformed(e.to_string()),
    })
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod manifest_tests;
