// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Decoding of provider configuration payloads.
//!
//! Gardener resources carry provider specific sections as opaque payloads tagged
//! with `apiVersion` and `kind`. A [`Scheme`] knows which kinds the KubeVirt
//! provider understands and hands out [`Decoder`]s that turn those payloads into
//! the typed structures of [`crate::provider`].
//!
//! The scheme is built once at startup and shared read-only afterwards:
//!
//! ```rust
//! use kubevirt_worker::provider::WorkerConfig;
//! use kubevirt_worker::scheme::Scheme;
//!
//! let scheme = Scheme::new();
//! let config: WorkerConfig = scheme.strict_decoder().decode(None).unwrap();
//! assert_eq!(config, WorkerConfig::default());
//! ```
//!
//! # Strict and lenient decoding
//!
//! Freshly submitted objects are decoded strictly: fields the target type does
//! not know are rejected. Objects read back for an update comparison are decoded
//! leniently so that records stored before a schema change are not bounced.

use crate::constants::{
    API_GROUP_VERSION, KIND_CLOUD_PROFILE_CONFIG, KIND_CONTROL_PLANE_CONFIG,
    KIND_INFRASTRUCTURE_CONFIG, KIND_INFRASTRUCTURE_STATUS, KIND_WORKER_CONFIG,
    KIND_WORKER_STATUS,
};
use crate::crd::{CloudProfile, Worker, WorkerPool};
use crate::errors::{Error, Result, SchemeError};
use crate::provider::{
    CloudProfileConfig, ControlPlaneConfig, InfrastructureConfig, InfrastructureStatus,
    WorkerConfig, WorkerStatus,
};
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use kube::ResourceExt;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A provider payload type registered in the [`Scheme`].
pub trait ProviderKind: Serialize + DeserializeOwned + Default + JsonSchema {
    /// The `kind` written into payloads of this type.
    const KIND: &'static str;
}

/// Any provider payload, decoded once at the boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderConfig {
    CloudProfileConfig(CloudProfileConfig),
    InfrastructureConfig(InfrastructureConfig),
    InfrastructureStatus(InfrastructureStatus),
    ControlPlaneConfig(ControlPlaneConfig),
    WorkerConfig(WorkerConfig),
    WorkerStatus(WorkerStatus),
}

impl ProviderConfig {
    /// Returns the `kind` of the contained payload.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::CloudProfileConfig(_) => KIND_CLOUD_PROFILE_CONFIG,
            ProviderConfig::InfrastructureConfig(_) => KIND_INFRASTRUCTURE_CONFIG,
            ProviderConfig::InfrastructureStatus(_) => KIND_INFRASTRUCTURE_STATUS,
            ProviderConfig::ControlPlaneConfig(_) => KIND_CONTROL_PLANE_CONFIG,
            ProviderConfig::WorkerConfig(_) => KIND_WORKER_CONFIG,
            ProviderConfig::WorkerStatus(_) => KIND_WORKER_STATUS,
        }
    }
}

/// A payload together with its `apiVersion` and `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioned<T> {
    pub api_version: String,
    pub kind: String,
    #[serde(flatten)]
    pub object: T,
}

/// Registry of the payload kinds understood by the provider.
#[derive(Clone, Debug)]
pub struct Scheme {
    kinds: BTreeMap<String, BTreeSet<&'static str>>,
    preferred_version: String,
}

impl Default for Scheme {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheme {
    /// Builds a scheme with all KubeVirt provider kinds registered under
    /// `kubevirt.provider.extensions.gardener.cloud/v1alpha1`.
    #[must_use]
    pub fn new() -> Self {
        let mut scheme = Self {
            kinds: BTreeMap::new(),
            preferred_version: API_GROUP_VERSION.to_string(),
        };
        scheme.register(
            API_GROUP_VERSION,
            &[
                KIND_CLOUD_PROFILE_CONFIG,
                KIND_INFRASTRUCTURE_CONFIG,
                KIND_INFRASTRUCTURE_STATUS,
                KIND_CONTROL_PLANE_CONFIG,
                KIND_WORKER_CONFIG,
                KIND_WORKER_STATUS,
            ],
        );
        scheme
    }

    /// Registers kinds under an `apiVersion`.
    pub fn register(&mut self, api_version: &str, kinds: &[&'static str]) {
        self.kinds
            .entry(api_version.to_string())
            .or_default()
            .extend(kinds.iter().copied());
    }

    /// Returns `true` if `kind` is registered under `api_version`.
    #[must_use]
    pub fn recognizes(&self, api_version: &str, kind: &str) -> bool {
        self.kinds
            .get(api_version)
            .is_some_and(|kinds| kinds.contains(kind))
    }

    /// Decoder that rejects unknown fields.
    #[must_use]
    pub fn strict_decoder(&self) -> Decoder<'_> {
        Decoder {
            scheme: self,
            strict: true,
        }
    }

    /// Decoder that drops unknown fields.
    #[must_use]
    pub fn lenient_decoder(&self) -> Decoder<'_> {
        Decoder {
            scheme: self,
            strict: false,
        }
    }

    /// Encodes a payload with the preferred `apiVersion` and its `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemeError::Malformed`] if the payload cannot be serialized.
    pub fn encode<T: ProviderKind>(&self, object: &T) -> Result<RawExtension, SchemeError> {
        let versioned = Versioned {
            api_version: self.preferred_version.clone(),
            kind: T::KIND.to_string(),
            object,
        };
        serde_json::to_value(&versioned)
            .map(RawExtension)
            .map_err(|e| SchemeError::Malformed(e.to_string()))
    }

    /// Encodes a payload of any registered kind.
    ///
    /// # Errors
    ///
    /// See [`Scheme::encode`].
    pub fn encode_any(&self, config: &ProviderConfig) -> Result<RawExtension, SchemeError> {
        match config {
            ProviderConfig::CloudProfileConfig(config) => self.encode(config),
            ProviderConfig::InfrastructureConfig(config) => self.encode(config),
            ProviderConfig::InfrastructureStatus(status) => self.encode(status),
            ProviderConfig::ControlPlaneConfig(config) => self.encode(config),
            ProviderConfig::WorkerConfig(config) => self.encode(config),
            ProviderConfig::WorkerStatus(status) => self.encode(status),
        }
    }

    /// Converts an internal payload into its versioned representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the payload does not survive the round trip.
    pub fn convert<T: ProviderKind>(&self, object: &T, what: &str) -> Result<Versioned<T>> {
        let conversion_error = |reason: String| Error::Conversion {
            what: format!("{what} to {}", self.preferred_version),
            reason,
        };
        let raw = self
            .encode(object)
            .map_err(|e| conversion_error(e.to_string()))?;
        serde_json::from_value(raw.0).map_err(|e| conversion_error(e.to_string()))
    }

    /// Decodes the `WorkerConfig` of a worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] naming the pool if the payload is invalid.
    pub fn worker_config(&self, pool: &WorkerPool) -> Result<WorkerConfig> {
        self.strict_decoder()
            .decode(pool.provider_config.as_ref())
            .map_err(|source| Error::Decode {
                what: format!("providerConfig of worker pool \"{}\"", pool.name),
                source,
            })
    }

    /// Decodes the `InfrastructureStatus` attached to a worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] naming the worker if the payload is invalid.
    pub fn infrastructure_status(&self, worker: &Worker) -> Result<InfrastructureStatus> {
        self.strict_decoder()
            .decode(worker.spec.infrastructure_provider_status.as_ref())
            .map_err(|source| Error::Decode {
                what: format!(
                    "infrastructureProviderStatus of worker \"{}\"",
                    object_name(worker)
                ),
                source,
            })
    }

    /// Decodes the `WorkerStatus` in a worker's status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] naming the worker if the payload is invalid.
    pub fn worker_status(&self, worker: &Worker) -> Result<WorkerStatus> {
        let raw = worker
            .status
            .as_ref()
            .and_then(|s| s.provider_status.as_ref());
        self.strict_decoder()
            .decode(raw)
            .map_err(|source| Error::Decode {
                what: format!("providerStatus of worker \"{}\"", object_name(worker)),
                source,
            })
    }

    /// Decodes the `CloudProfileConfig` of a cloud profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] naming the cloud profile if the payload is invalid.
    pub fn cloud_profile_config(&self, cloud_profile: &CloudProfile) -> Result<CloudProfileConfig> {
        self.strict_decoder()
            .decode(cloud_profile.spec.provider_config.as_ref())
            .map_err(|source| Error::Decode {
                what: format!(
                    "providerConfig of cloud profile \"{}\"",
                    cloud_profile.name_any()
                ),
                source,
            })
    }
}

/// Decodes provider payloads registered in a [`Scheme`].
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'a> {
    scheme: &'a Scheme,
    strict: bool,
}

impl Decoder<'_> {
    /// Returns `true` if unknown fields are rejected.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Decodes an optional payload; an absent payload yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemeError`] if the payload is malformed, has the wrong kind
    /// or (strict only) carries unknown fields.
    pub fn decode<T: ProviderKind>(&self, raw: Option<&RawExtension>) -> Result<T, SchemeError> {
        match raw {
            None => Ok(T::default()),
            Some(raw) => self.decode_value(&raw.0),
        }
    }

    /// Decodes a payload from raw JSON or YAML bytes.
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode`].
    pub fn decode_bytes<T: ProviderKind>(&self, bytes: &[u8]) -> Result<T, SchemeError> {
        let value = parse_bytes(bytes)?;
        self.decode_value(&value)
    }

    /// Decodes a payload of any registered kind.
    ///
    /// # Errors
    ///
    /// See [`Decoder::decode`].
    pub fn decode_any(&self, raw: &RawExtension) -> Result<ProviderConfig, SchemeError> {
        let value = self.materialize(&raw.0)?;
        let kind = self.type_meta(&value)?;
        let config = match kind.as_str() {
            KIND_CLOUD_PROFILE_CONFIG => {
                ProviderConfig::CloudProfileConfig(self.decode_value(&value)?)
            }
            KIND_INFRASTRUCTURE_CONFIG => {
                ProviderConfig::InfrastructureConfig(self.decode_value(&value)?)
            }
            KIND_INFRASTRUCTURE_STATUS => {
                ProviderConfig::InfrastructureStatus(self.decode_value(&value)?)
            }
            KIND_CONTROL_PLANE_CONFIG => {
                ProviderConfig::ControlPlaneConfig(self.decode_value(&value)?)
            }
            KIND_WORKER_CONFIG => ProviderConfig::WorkerConfig(self.decode_value(&value)?),
            KIND_WORKER_STATUS => ProviderConfig::WorkerStatus(self.decode_value(&value)?),
            _ => {
                return Err(SchemeError::Unrecognized {
                    api_version: value["apiVersion"].as_str().unwrap_or_default().to_string(),
                    kind,
                })
            }
        };
        Ok(config)
    }

    fn decode_value<T: ProviderKind>(&self, value: &Value) -> Result<T, SchemeError> {
        let value = self.materialize(value)?;
        if value.is_null() {
            return Ok(T::default());
        }

        let kind = self.type_meta(&value)?;
        if kind != T::KIND {
            return Err(SchemeError::KindMismatch {
                expected: T::KIND,
                found: kind,
            });
        }

        let mut object = value;
        if let Value::Object(map) = &mut object {
            map.remove("apiVersion");
            map.remove("kind");
        }

        let typed: T = serde_json::from_value(object.clone())
            .map_err(|e| SchemeError::Malformed(e.to_string()))?;

        if self.strict {
            let known =
                serde_json::to_value(&typed).map_err(|e| SchemeError::Malformed(e.to_string()))?;
            let schema = schemars::schema_for!(T);
            let mut unknown = Vec::new();
            collect_unknown_fields(
                &object,
                &known,
                SchemaNode::root(schema.as_value()),
                "",
                &mut unknown,
            );
            if !unknown.is_empty() {
                return Err(SchemeError::UnknownFields(unknown));
            }
        }

        Ok(typed)
    }

    /// Payloads stored as a string hold serialized bytes; parse them first.
    fn materialize(&self, value: &Value) -> Result<Value, SchemeError> {
        match value {
            Value::String(s) => parse_bytes(s.as_bytes()),
            other => Ok(other.clone()),
        }
    }

    fn type_meta(&self, value: &Value) -> Result<String, SchemeError> {
        let api_version = value.get("apiVersion").and_then(Value::as_str);
        let kind = value.get("kind").and_then(Value::as_str);
        let (Some(api_version), Some(kind)) = (api_version, kind) else {
            return Err(SchemeError::MissingTypeMeta);
        };
        if !self.scheme.recognizes(api_version, kind) {
            return Err(SchemeError::Unrecognized {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
            });
        }
        Ok(kind.to_string())
    }
}

/// Parses JSON or YAML bytes. YAML is a superset of JSON, so one parser covers both.
fn parse_bytes(bytes: &[u8]) -> Result<Value, SchemeError> {
    serde_yaml::from_slice(bytes).map_err(|e| SchemeError::Malformed(e.to_string()))
}

/// Walks the submitted payload and records every field that does not survive a
/// decode/encode round trip through the target type.
///
/// Explicit nulls never survive the round trip, so for those the target type's
/// schema decides whether the field exists.
fn collect_unknown_fields(
    original: &Value,
    known: &Value,
    schema: SchemaNode<'_>,
    path: &str,
    unknown: &mut Vec<String>,
) {
    match (original, known) {
        (Value::Object(original), Value::Object(known)) => {
            for (key, value) in original {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                if value.is_null() {
                    if !schema.allows(key) {
                        unknown.push(child);
                    }
                    continue;
                }
                match known.get(key) {
                    Some(known_value) => collect_unknown_fields(
                        value,
                        known_value,
                        schema.property(key),
                        &child,
                        unknown,
                    ),
                    None => unknown.push(child),
                }
            }
        }
        (Value::Array(original), Value::Array(known)) => {
            for (index, (value, known_value)) in original.iter().zip(known).enumerate() {
                collect_unknown_fields(
                    value,
                    known_value,
                    schema.items(),
                    &format!("{path}[{index}]"),
                    unknown,
                );
            }
        }
        _ => {}
    }
}

/// Upper bound on `$ref` hops and schema variants visited per lookup
const MAX_SCHEMA_STEPS: usize = 64;

/// Position in the JSON schema of a payload type.
///
/// `node` is `None` once the walk leaves the part of the schema it can follow;
/// every field is allowed from there on.
#[derive(Clone, Copy)]
struct SchemaNode<'a> {
    root: &'a Value,
    node: Option<&'a Value>,
}

impl<'a> SchemaNode<'a> {
    fn root(root: &'a Value) -> Self {
        Self {
            root,
            node: Some(root),
        }
    }

    fn at(self, node: Option<&'a Value>) -> Self {
        Self {
            root: self.root,
            node,
        }
    }

    fn resolve(self, mut node: &'a Value) -> &'a Value {
        for _ in 0..MAX_SCHEMA_STEPS {
            let target = node
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|reference| reference.strip_prefix('#'))
                .and_then(|pointer| self.root.pointer(pointer));
            match target {
                Some(target) => node = target,
                None => break,
            }
        }
        node
    }

    /// The node itself plus every `anyOf`/`oneOf`/`allOf` member, references resolved.
    fn variants(self) -> Vec<&'a Value> {
        let mut pending: Vec<&'a Value> = self.node.into_iter().collect();
        let mut variants = Vec::new();
        while let Some(node) = pending.pop() {
            if variants.len() >= MAX_SCHEMA_STEPS {
                break;
            }
            let node = self.resolve(node);
            for keyword in ["anyOf", "oneOf", "allOf"] {
                if let Some(members) = node.get(keyword).and_then(Value::as_array) {
                    pending.extend(members);
                }
            }
            variants.push(node);
        }
        variants
    }

    fn property(self, key: &str) -> Self {
        let found = self.variants().into_iter().find_map(|variant| {
            variant
                .get("properties")
                .and_then(|properties| properties.get(key))
                .or_else(|| variant.get("additionalProperties").filter(|a| a.is_object()))
        });
        self.at(found)
    }

    fn items(self) -> Self {
        let found = self
            .variants()
            .into_iter()
            .find_map(|variant| variant.get("items"));
        self.at(found)
    }

    fn allows(self, key: &str) -> bool {
        if self.node.is_none() {
            return true;
        }
        self.variants().into_iter().any(|variant| {
            *variant == Value::Bool(true)
                || variant
                    .get("properties")
                    .is_some_and(|properties| properties.get(key).is_some())
                || variant
                    .get("additionalProperties")
                    .is_some_and(|additional| *additional != Value::Bool(false))
        })
    }
}

fn object_name<K: ResourceExt>(object: &K) -> String {
    match object.namespace() {
        Some(namespace) => format!("{namespace}/{}", object.name_any()),
        None => object.name_any(),
    }
}

#[cfg(test)]
#[path = "scheme_tests.rs"]
mod scheme_tests;
