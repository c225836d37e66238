// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Access to the cloud provider secret of a worker.
//!
//! The secret referenced by a worker holds the kubeconfig of the provider
//! cluster (the cluster the virtual machines run in). Generation only needs the
//! raw kubeconfig and the namespace of its current context.
//!
//! # Example
//!
//! ```rust
//! use kubevirt_worker::credentials::kubeconfig_namespace;
//!
//! let kubeconfig = r#"
//! apiVersion: v1
//! kind: Config
//! current-context: provider
//! contexts:
//! - name: provider
//!   context:
//!     cluster: provider
//!     user: admin
//!     namespace: machines
//! "#;
//! assert_eq!(kubeconfig_namespace(kubeconfig).unwrap(), "machines");
//! ```

use crate::constants::{DEFAULT_NAMESPACE, KUBECONFIG_SECRET_KEY};
use crate::crd::SecretReference;
use crate::errors::{Error, Result, SchemeError};
use k8s_openapi::api::core::v1::Secret;
use kube::config::Kubeconfig;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

/// Source of secret data.
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Returns the data of the referenced secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the secret does not exist.
    async fn secret_data(&self, secret_ref: &SecretReference) -> Result<BTreeMap<String, Vec<u8>>>;

    /// Returns the provider cluster kubeconfig stored in the referenced secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the secret or its `kubeconfig` key is missing.
    async fn kubeconfig(&self, secret_ref: &SecretReference) -> Result<Vec<u8>> {
        let mut data = self.secret_data(secret_ref).await?;
        data.remove(KUBECONFIG_SECRET_KEY)
            .ok_or_else(|| Error::NotFound {
                kind: "secret key",
                name: KUBECONFIG_SECRET_KEY.to_string(),
                scope: format!("secret {}/{}", secret_ref.namespace, secret_ref.name),
            })
    }
}

/// Reads secrets from the Kubernetes API.
#[derive(Clone)]
pub struct SecretCredentialSource {
    client: Client,
}

impl SecretCredentialSource {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl CredentialSource for SecretCredentialSource {
    async fn secret_data(&self, secret_ref: &SecretReference) -> Result<BTreeMap<String, Vec<u8>>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &secret_ref.namespace);
        debug!(
            "Reading secret {}/{}",
            secret_ref.namespace, secret_ref.name
        );

        let secret = api
            .get_opt(&secret_ref.name)
            .await?
            .ok_or_else(|| Error::NotFound {
                kind: "secret",
                name: secret_ref.name.clone(),
                scope: format!("namespace {}", secret_ref.namespace),
            })?;

        Ok(secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, value.0))
            .collect())
    }
}

/// Serves secrets from memory, for the CLI and for tests.
#[derive(Clone, Debug, Default)]
pub struct StaticCredentialSource {
    secrets: BTreeMap<(String, String), BTreeMap<String, Vec<u8>>>,
}

impl StaticCredentialSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret.
    #[must_use]
    pub fn with_secret(
        mut self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Self {
        self.secrets
            .insert((namespace.to_string(), name.to_string()), data);
        self
    }

    /// Adds a secret holding only a kubeconfig.
    #[must_use]
    pub fn with_kubeconfig(self, namespace: &str, name: &str, kubeconfig: &[u8]) -> Self {
        let data = BTreeMap::from([(KUBECONFIG_SECRET_KEY.to_string(), kubeconfig.to_vec())]);
        self.with_secret(namespace, name, data)
    }
}

#[async_trait::async_trait]
impl CredentialSource for StaticCredentialSource {
    async fn secret_data(&self, secret_ref: &SecretReference) -> Result<BTreeMap<String, Vec<u8>>> {
        self.secrets
            .get(&(secret_ref.namespace.clone(), secret_ref.name.clone()))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind: "secret",
                name: secret_ref.name.clone(),
                scope: format!("namespace {}", secret_ref.namespace),
            })
    }
}

/// Returns the namespace of the kubeconfig's current context.
///
/// Falls back to `default` when the current context does not set a namespace.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the kubeconfig cannot be parsed.
pub fn kubeconfig_namespace(kubeconfig: &str) -> Result<String> {
    let config = Kubeconfig::from_yaml(kubeconfig).map_err(|e| Error::Decode {
        what: "provider cluster kubeconfig".to_string(),
        source: SchemeError::Malformed(e.to_string()),
    })?;

    let namespace = config
        .current_context
        .as_deref()
        .and_then(|current| config.contexts.iter().find(|c| c.name == current))
        .and_then(|named| named.context.as_ref())
        .and_then(|context| context.namespace.clone())
        .filter(|namespace| !namespace.is_empty());

    Ok(namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()))
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod credentials_tests;
