// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Worker pool hashing.
//!
//! The hash is embedded in machine class names. Whenever a pool's inputs change
//! the class name changes, which makes the machine controller manager roll the
//! pool's machines onto the new class.

use crate::constants::WORKER_POOL_HASH_LENGTH;
use crate::crd::{Cluster, Worker, WorkerPool};
use crate::errors::{Error, Result};
use kube::ResourceExt;
use sha2::{Digest, Sha256};

/// Computes the short hash of a worker pool.
///
/// The digest covers, in order:
/// - the pool as canonical JSON
/// - the effective Kubernetes version (pool override, else the shoot's)
/// - the worker namespace and region
/// - `extra`, e.g. the network tokens of the infrastructure status
///
/// Nothing else goes in, so the hash does not depend on other pools or on time.
///
/// # Errors
///
/// Returns [`Error::Conversion`] if the pool cannot be serialized.
pub fn worker_pool_hash(
    pool: &WorkerPool,
    worker: &Worker,
    cluster: &Cluster,
    extra: &[String],
) -> Result<String> {
    // Going through `Value` sorts the keys of every map in the pool
    let canonical = serde_json::to_value(pool)
        .and_then(|value| serde_json::to_string(&value))
        .map_err(|e| Error::Conversion {
            what: format!("worker pool \"{}\" for hashing", pool.name),
            reason: e.to_string(),
        })?;

    let kubernetes_version = pool
        .kubernetes_version
        .as_deref()
        .unwrap_or(&cluster.shoot.spec.kubernetes.version);
    let namespace = worker.namespace().unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    for part in [kubernetes_version, namespace.as_str(), worker.spec.region.as_str()]
        .into_iter()
        .chain(extra.iter().map(String::as_str))
    {
        hasher.update(b"\n");
        hasher.update(part.as_bytes());
    }

    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..WORKER_POOL_HASH_LENGTH].to_string())
}

#[cfg(test)]
#[path = "hash_tests.rs"]
mod hash_tests;
