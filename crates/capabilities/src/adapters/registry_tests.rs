// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn splits_tagged_reference() {
    let (repo, reference) = split_image_ref("myapp:1.2.3").unwrap();
    assert_eq!(repo, "myapp");
    assert_eq!(reference, "1.2.3");
}

#[test]
fn splits_digest_reference() {
    let (repo, reference) = split_image_ref("myapp@sha256:deadbeef").unwrap();
    assert_eq!(repo, "myapp");
    assert_eq!(reference, "sha256:deadbeef");
}

#[test]
fn defaults_to_latest_when_untagged() {
    let (repo, reference) = split_image_ref("registry.example.com/team/myapp").unwrap();
    assert_eq!(repo, "registry.example.com/team/myapp");
    assert_eq!(reference, "latest");
}

#[test]
fn manifest_url_joins_base_and_reference() {
    let adapter = HttpRegistryAdapter::new("https://registry.example.com/");
    let url = adapter.manifest_url("team/myapp:1.0").unwrap();
    assert_eq!(url, "https://registry.example.com/v2/team/myapp/manifests/1.0");
}
