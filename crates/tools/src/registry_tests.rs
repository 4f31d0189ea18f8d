// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures::fixture;
use dh_engine::registry::ToolRegistry;

const EXPECTED_NAMES: &[&str] = &[
    "analyze_repository",
    "generate_dockerfile",
    "build_image",
    "scan_image",
    "tag_image",
    "push_image",
    "generate_manifests",
    "deploy",
    "check_health",
    "chat",
    "containerize_and_deploy",
];

#[test]
fn registers_exactly_the_eleven_spec_tools() {
    let f = fixture();
    let registry = ToolRegistry::new();
    register_all_tools(&registry, Arc::new(f.ctx)).unwrap();

    assert_eq!(registry.len(), EXPECTED_NAMES.len());
    for name in EXPECTED_NAMES {
        assert!(registry.lookup(name).is_ok(), "missing tool: {name}");
    }
}

#[test]
fn freezes_the_registry_so_late_registration_fails() {
    let f = fixture();
    let registry = ToolRegistry::new();
    register_all_tools(&registry, Arc::new(f.ctx)).unwrap();

    assert!(registry.is_frozen());
    let extra = descriptors(Arc::new(fixture().ctx)).remove(0);
    assert!(registry.register(extra).is_err());
}

#[test]
fn containerize_and_deploy_requires_every_capability() {
    let f = fixture();
    let list = descriptors(Arc::new(f.ctx));
    let saga = list.iter().find(|d| d.name == "containerize_and_deploy").unwrap();

    assert_eq!(saga.required_capabilities.len(), 4);
}

#[test]
fn export_schemas_covers_every_registered_tool() {
    let f = fixture();
    let registry = ToolRegistry::new();
    register_all_tools(&registry, Arc::new(f.ctx)).unwrap();

    let schemas = registry.export_schemas();
    assert_eq!(schemas.len(), EXPECTED_NAMES.len());
}
