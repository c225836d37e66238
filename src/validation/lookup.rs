// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read access to the Gardener objects admission validation depends on.
//!
//! Validators never talk to the API server directly. They go through a
//! [`ShootLookup`] so that the same checks run against a live cluster
//! ([`KubeShootLookup`]) or against objects loaded from files
//! ([`InMemoryLookup`]).

use crate::constants::{CORE_API_GROUP, CORE_API_VERSION, KIND_SECRET_BINDING, PLURAL_SECRET_BINDINGS};
use crate::crd::{CloudProfile, SecretBinding, Shoot};
use crate::errors::{Error, Result, SchemeError};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Client, Resource, ResourceExt};
use tracing::debug;

/// Lookups performed while validating shoots and secrets.
#[async_trait::async_trait]
pub trait ShootLookup: Send + Sync {
    /// Returns the cloud profile with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    async fn cloud_profile(&self, name: &str) -> Result<CloudProfile>;

    /// Returns a secret binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    async fn secret_binding(&self, namespace: &str, name: &str) -> Result<SecretBinding>;

    /// Returns a secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if it does not exist.
    async fn secret(&self, namespace: &str, name: &str) -> Result<Secret>;

    /// Returns the secret bindings of all namespaces.
    async fn secret_bindings(&self) -> Result<Vec<SecretBinding>>;

    /// Returns the shoots of a namespace.
    async fn shoots(&self, namespace: &str) -> Result<Vec<Shoot>>;
}

/// Returns `true` if a shoot of `provider_type` uses the secret through a secret binding.
///
/// A secret is in use when a binding referencing it supports the provider and a
/// shoot in the binding's namespace names that binding.
///
/// # Errors
///
/// Returns an error if secret bindings or shoots cannot be listed.
pub async fn secret_in_use_by_shoot(
    lookup: &dyn ShootLookup,
    secret: &Secret,
    provider_type: &str,
) -> Result<bool> {
    let secret_namespace = secret.namespace().unwrap_or_default();
    let secret_name = secret.name_any();

    for binding in lookup.secret_bindings().await? {
        if binding.secret_ref.name != secret_name
            || binding.secret_ref.namespace != secret_namespace
            || !binding.supports_provider(provider_type)
        {
            continue;
        }

        let binding_namespace = binding.metadata.namespace.clone().unwrap_or_default();
        let binding_name = binding.metadata.name.clone().unwrap_or_default();
        let in_use = lookup.shoots(&binding_namespace).await?.iter().any(|shoot| {
            shoot.spec.secret_binding_name == binding_name
                && shoot.spec.provider.r#type == provider_type
        });
        if in_use {
            debug!(
                "Secret {}/{} is used by a {} shoot through binding {}/{}",
                secret_namespace, secret_name, provider_type, binding_namespace, binding_name
            );
            return Ok(true);
        }
    }

    Ok(false)
}

fn not_found(kind: &'static str, namespace: &str, name: &str) -> Error {
    Error::NotFound {
        kind,
        name: name.to_string(),
        scope: format!("namespace {namespace}"),
    }
}

// ============================================================================
// Kubernetes API
// ============================================================================

/// Reads objects from the Kubernetes API.
#[derive(Clone)]
pub struct KubeShootLookup {
    client: Client,
}

impl KubeShootLookup {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// `SecretBinding` has no spec, so it is read as a dynamic object.
    fn secret_binding_resource() -> ApiResource {
        let gvk = GroupVersionKind::gvk(CORE_API_GROUP, CORE_API_VERSION, KIND_SECRET_BINDING);
        ApiResource::from_gvk_with_plural(&gvk, PLURAL_SECRET_BINDINGS)
    }
}

fn into_secret_binding(object: DynamicObject) -> Result<SecretBinding> {
    let name = object.name_any();
    serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(|e| Error::Decode {
            what: format!("secret binding \"{name}\""),
            source: SchemeError::Malformed(e.to_string()),
        })
}

#[async_trait::async_trait]
impl ShootLookup for KubeShootLookup {
    async fn cloud_profile(&self, name: &str) -> Result<CloudProfile> {
        let api: Api<CloudProfile> = Api::all(self.client.clone());
        api.get_opt(name).await?.ok_or_else(|| Error::NotFound {
            kind: "cloud profile",
            name: name.to_string(),
            scope: "cluster".to_string(),
        })
    }

    async fn secret_binding(&self, namespace: &str, name: &str) -> Result<SecretBinding> {
        let resource = Self::secret_binding_resource();
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &resource);
        let object = api
            .get_opt(name)
            .await?
            .ok_or_else(|| not_found("secret binding", namespace, name))?;
        into_secret_binding(object)
    }

    async fn secret(&self, namespace: &str, name: &str) -> Result<Secret> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await?
            .ok_or_else(|| not_found("secret", namespace, name))
    }

    async fn secret_bindings(&self) -> Result<Vec<SecretBinding>> {
        let resource = Self::secret_binding_resource();
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
        api.list(&ListParams::default())
            .await?
            .items
            .into_iter()
            .map(into_secret_binding)
            .collect()
    }

    async fn shoots(&self, namespace: &str) -> Result<Vec<Shoot>> {
        let api: Api<Shoot> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Serves objects from memory, for the CLI and for tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLookup {
    cloud_profiles: Vec<CloudProfile>,
    secret_bindings: Vec<SecretBinding>,
    secrets: Vec<Secret>,
    shoots: Vec<Shoot>,
}

impl InMemoryLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cloud_profile(mut self, cloud_profile: CloudProfile) -> Self {
        self.cloud_profiles.push(cloud_profile);
        self
    }

    #[must_use]
    pub fn with_secret_binding(mut self, binding: SecretBinding) -> Self {
        self.secret_bindings.push(binding);
        self
    }

    #[must_use]
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.secrets.push(secret);
        self
    }

    #[must_use]
    pub fn with_shoot(mut self, shoot: Shoot) -> Self {
        self.shoots.push(shoot);
        self
    }
}

fn is_object<K: Resource>(object: &K, namespace: &str, name: &str) -> bool {
    object.name_any() == name && object.namespace().as_deref().unwrap_or_default() == namespace
}

#[async_trait::async_trait]
impl ShootLookup for InMemoryLookup {
    async fn cloud_profile(&self, name: &str) -> Result<CloudProfile> {
        self.cloud_profiles
            .iter()
            .find(|cp| cp.name_any() == name)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: "cloud profile",
                name: name.to_string(),
                scope: "cluster".to_string(),
            })
    }

    async fn secret_binding(&self, namespace: &str, name: &str) -> Result<SecretBinding> {
        self.secret_bindings
            .iter()
            .find(|b| {
                b.metadata.name.as_deref() == Some(name)
                    && b.metadata.namespace.as_deref().unwrap_or_default() == namespace
            })
            .cloned()
            .ok_or_else(|| not_found("secret binding", namespace, name))
    }

    async fn secret(&self, namespace: &str, name: &str) -> Result<Secret> {
        self.secrets
            .iter()
            .find(|s| is_object(*s, namespace, name))
            .cloned()
            .ok_or_else(|| not_found("secret", namespace, name))
    }

    async fn secret_bindings(&self) -> Result<Vec<SecretBinding>> {
        Ok(self.secret_bindings.clone())
    }

    async fn shoots(&self, namespace: &str) -> Result<Vec<Shoot>> {
        Ok(self
            .shoots
            .iter()
            .filter(|s| s.namespace().as_deref().unwrap_or_default() == namespace)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod lookup_tests;
