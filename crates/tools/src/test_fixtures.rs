// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only `ToolContext` wiring shared by every tool module's test
//! file: an in-memory session manager over a temp directory plus the
//! mock capability adapters from `dh-capabilities`.

use crate::common::ToolContext;
use dh_capabilities::adapters::mock::{MockClusterAdapter, MockContainerRuntime, MockRegistryAdapter, MockScannerAdapter};
use dh_capabilities::BreakerConfig;
use dh_capabilities::BreakerRegistry;
use dh_core::clock::FakeClock;
use dh_session::{SessionManager, SessionManagerConfig, SessionStore, WorkspaceConfig, WorkspaceManager};
use std::sync::Arc;
use tempfile::TempDir;

/// Owns the temp directory backing the fixture so it is not cleaned up
/// out from under a running test. The concrete mocks are kept alongside
/// `ctx` (which only sees them through their trait objects) so tests can
/// script scenario outcomes directly.
pub struct Fixture {
    pub ctx: ToolContext<FakeClock>,
    pub clock: FakeClock,
    pub container_runtime: Arc<MockContainerRuntime>,
    pub cluster: Arc<MockClusterAdapter>,
    pub registry: Arc<MockRegistryAdapter>,
    pub scanner: Arc<MockScannerAdapter>,
    _dir: TempDir,
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = FakeClock::new();
    let workspaces = Arc::new(WorkspaceManager::new(WorkspaceConfig {
        base_dir: dir.path().join("workspaces"),
        per_session_cap_bytes: 1024 * 1024,
        global_cap_bytes: 16 * 1024 * 1024,
    }));
    let store = Arc::new(SessionStore::new(dir.path()).expect("session store"));
    let sessions = Arc::new(SessionManager::new(clock.clone(), SessionManagerConfig::default(), workspaces.clone(), store));
    let breakers = Arc::new(BreakerRegistry::new(clock.clone(), BreakerConfig::default()));

    let container_runtime = Arc::new(MockContainerRuntime::default());
    let cluster = Arc::new(MockClusterAdapter::default());
    let registry = Arc::new(MockRegistryAdapter::default());
    let scanner = Arc::new(MockScannerAdapter::default());

    let ctx = ToolContext::new(
        clock.clone(),
        sessions,
        workspaces,
        breakers,
        container_runtime.clone(),
        cluster.clone(),
        registry.clone(),
        scanner.clone(),
    );
    Fixture { ctx, clock, container_runtime, cluster, registry, scanner, _dir: dir }
}
