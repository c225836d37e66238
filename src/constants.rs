// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the KubeVirt worker compiler.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Provider API Constants
// ============================================================================

/// Provider type string used by shoots, cloud profiles and extension resources
pub const PROVIDER_TYPE: &str = "kubevirt";

/// API version (group/version) of the provider-specific configuration payloads
pub const API_GROUP_VERSION: &str = "kubevirt.provider.extensions.gardener.cloud/v1alpha1";

/// Kind name for `CloudProfileConfig` payloads
pub const KIND_CLOUD_PROFILE_CONFIG: &str = "CloudProfileConfig";

/// Kind name for `InfrastructureConfig` payloads
pub const KIND_INFRASTRUCTURE_CONFIG: &str = "InfrastructureConfig";

/// Kind name for `InfrastructureStatus` payloads
pub const KIND_INFRASTRUCTURE_STATUS: &str = "InfrastructureStatus";

/// Kind name for `ControlPlaneConfig` payloads
pub const KIND_CONTROL_PLANE_CONFIG: &str = "ControlPlaneConfig";

/// Kind name for `WorkerConfig` payloads
pub const KIND_WORKER_CONFIG: &str = "WorkerConfig";

/// Kind name for `WorkerStatus` payloads
pub const KIND_WORKER_STATUS: &str = "WorkerStatus";

// ============================================================================
// Gardener API Constants
// ============================================================================

/// API group of the Gardener core resources (`Shoot`, `CloudProfile`, `SecretBinding`)
pub const CORE_API_GROUP: &str = "core.gardener.cloud";

/// API version of the Gardener core resources
pub const CORE_API_VERSION: &str = "v1beta1";

/// Kind name for `SecretBinding` resources
pub const KIND_SECRET_BINDING: &str = "SecretBinding";

/// Plural resource name for `SecretBinding` resources
pub const PLURAL_SECRET_BINDINGS: &str = "secretbindings";

// ============================================================================
// Credential Constants
// ============================================================================

/// Key of the provider cluster kubeconfig in the cloud provider secret
pub const KUBECONFIG_SECRET_KEY: &str = "kubeconfig";

/// Namespace used when the kubeconfig's current context does not set one
pub const DEFAULT_NAMESPACE: &str = "default";

// ============================================================================
// Machine Class Constants
// ============================================================================

/// Number of hex characters of the worker pool hash embedded in class names
pub const WORKER_POOL_HASH_LENGTH: usize = 5;

/// Role tag value for machines created from worker pools
pub const MACHINE_ROLE_NODE: &str = "node";

/// Access mode requested for every data volume
pub const ACCESS_MODE_READ_WRITE_ONCE: &str = "ReadWriteOnce";

/// Resource name for storage requests
pub const RESOURCE_STORAGE: &str = "storage";

/// Resource name for CPU requests and limits
pub const RESOURCE_CPU: &str = "cpu";

/// Resource name for memory requests and limits
pub const RESOURCE_MEMORY: &str = "memory";

// ============================================================================
// Validation Constants
// ============================================================================

/// DNS policies accepted in `WorkerConfig.dnsPolicy`
pub const SUPPORTED_DNS_POLICIES: &[&str] = &["ClusterFirstWithHostNet", "ClusterFirst", "Default", "None"];

/// DNS policy that requires an explicit `dnsConfig`
pub const DNS_POLICY_NONE: &str = "None";
