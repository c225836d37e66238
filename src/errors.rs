// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for machine generation and admission validation.
//!
//! This module provides:
//! - [`SchemeError`] for failures while decoding provider configuration payloads
//! - [`Error`], the crate-wide error returned by generation and validation runs
//!
//! None of these errors are retried internally. A failed run produces no output
//! and the caller decides whether to requeue.

use crate::validation::ErrorList;
use thiserror::Error;

/// Errors raised while decoding or encoding provider configuration payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemeError {
    /// The payload is neither valid JSON nor valid YAML, or its shape does not
    /// match the target type.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The payload does not carry `apiVersion` and `kind`.
    #[error("payload is missing apiVersion or kind")]
    MissingTypeMeta,

    /// The payload's `apiVersion`/`kind` pair is not registered in the scheme.
    #[error("no kind \"{kind}\" is registered for version \"{api_version}\"")]
    Unrecognized {
        /// The `apiVersion` found in the payload
        api_version: String,
        /// The `kind` found in the payload
        kind: String,
    },

    /// The payload is a registered kind but not the one the caller asked for.
    #[error("expected kind \"{expected}\" but payload has kind \"{found}\"")]
    KindMismatch {
        /// Kind the caller decodes into
        expected: &'static str,
        /// Kind found in the payload
        found: String,
    },

    /// Strict decoding found fields the target type does not know.
    ///
    /// Only returned by strict decoders. Lenient decoders drop these fields so that
    /// objects stored before a schema change still decode.
    #[error("unknown fields: {}", .0.join(", "))]
    UnknownFields(Vec<String>),
}

/// Crate-wide error type.
///
/// Every variant names the object it refers to so that a failed reconciliation
/// can be traced back to a worker pool, a secret or a cloud profile.
#[derive(Error, Debug)]
pub enum Error {
    /// A catalog lookup or a referenced object did not resolve.
    ///
    /// Raised for unknown machine types, volume types, machine image versions,
    /// secrets, secret keys and cloud profiles.
    #[error("{kind} \"{name}\" not found in {scope}")]
    NotFound {
        /// What was looked up (e.g. "machine type")
        kind: &'static str,
        /// The name that was looked up
        name: String,
        /// Where it was looked up (e.g. "cloud profile")
        scope: String,
    },

    /// An opaque payload could not be decoded.
    #[error("could not decode {what}: {source}")]
    Decode {
        /// Description of the payload and its owner
        what: String,
        /// Underlying decoding failure
        #[source]
        source: SchemeError,
    },

    /// A required input is missing or unusable (SSH key, volume, provider config).
    #[error("{0}")]
    Precondition(String),

    /// Conversion between the internal and a versioned representation failed.
    #[error("could not convert {what}: {reason}")]
    Conversion {
        /// Description of the converted object
        what: String,
        /// Underlying failure
        reason: String,
    },

    /// A scaling bound could not be spread over zones.
    #[error("could not distribute {value} over zones: {reason}")]
    Distribution {
        /// The bound as written in the pool
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The failure happened while processing a specific worker pool.
    #[error("worker pool \"{pool}\": {source}")]
    WorkerPool {
        /// Name of the offending pool
        pool: String,
        /// The failure itself
        #[source]
        source: Box<Error>,
    },

    /// Admission validation found field violations.
    #[error(transparent)]
    Validation(#[from] ErrorList),

    /// A manifest file could not be read.
    #[error("could not read {path}: {source}")]
    Io {
        /// Path of the file
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A call to the Kubernetes API failed.
    #[error("kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),
}

impl Error {
    /// Wraps this error with the name of the worker pool it occurred in.
    #[must_use]
    pub fn in_pool(self, pool: &str) -> Self {
        Error::WorkerPool {
            pool: pool.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through worker pool context.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::WorkerPool { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` if the root cause is a [`Error::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Error::NotFound { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
