// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tag and label keys attached to generated machine classes.
//!
//! The machine controller manager uses these tags to find the machines that
//! belong to a shoot and to the machine class they were created from.

// ============================================================================
// Machine Controller Manager Tags
// ============================================================================

/// Tag carrying the shoot's technical namespace
pub const MCM_CLUSTER_TAG: &str = "mcm.gardener.cloud/cluster";

/// Tag carrying the machine role (always `node` for worker pools)
pub const MCM_ROLE_TAG: &str = "mcm.gardener.cloud/role";

/// Tag carrying the name of the machine class a machine was created from
pub const MCM_MACHINE_CLASS_TAG: &str = "mcm.gardener.cloud/machineclass";

// ============================================================================
// Provider Labels
// ============================================================================

/// Label put on machine class volumes in the provider cluster
pub const CLUSTER_LABEL: &str = "kubevirt.provider.extensions.gardener.cloud/cluster";
