// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `manifest.rs`

use super::*;
use crate::crd::Shoot;
use std::io::Write;

const SHOOT: &str = r#"
apiVersion: core.gardener.cloud/v1beta1
kind: Shoot
metadata:
  name: dev
  namespace: garden-dev
spec:
  cloudProfileName: kubevirt
  region: local
  secretBindingName: cloudprovider
  kubernetes:
    version: 1.31.2
  provider:
    type: kubevirt
    workers:
    - name: pool-a
      machine:
        type: standard-2
      minimum: 1
      maximum: 2
      zones: [zone-a]
"#;

#[tokio::test]
async fn test_load_shoot() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SHOOT.as_bytes()).unwrap();

    let shoot: Shoot = load(file.path()).await.unwrap();
    assert_eq!(shoot.spec.provider.workers[0].name, "pool-a");
    assert_eq!(shoot.spec.kubernetes.version, "1.31.2");
}

#[tokio::test]
async fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load::<Shoot>(&dir.path().join("missing.yaml")).await.unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err:?}");
}

#[test]
fn test_parse_names_origin() {
    let err = parse::<Shoot>("kind: Shoot\nspec: 3\n", "shoot.yaml").unwrap_err();
    assert!(err.to_string().starts_with("could not decode manifest shoot.yaml"));
}
