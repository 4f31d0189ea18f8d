// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::app::AppContext;
use dh_capabilities::adapters::mock::{MockClusterAdapter, MockContainerRuntime, MockRegistryAdapter, MockScannerAdapter};
use dh_capabilities::BreakerConfig;
use dh_core::clock::SystemClock;
use dh_session::{SessionManagerConfig, SessionStore, WorkspaceConfig, WorkspaceManager};
use dh_tools::register_all_tools;
use dh_wire::{decode, encode, read_message, write_message, Method, Request};
use tempfile::TempDir;
use tokio::net::UnixStream;

fn test_app() -> (Arc<AppContext>, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = SystemClock;

    let workspaces = Arc::new(WorkspaceManager::new(WorkspaceConfig {
        base_dir: dir.path().join("workspaces"),
        per_session_cap_bytes: 1024 * 1024,
        global_cap_bytes: 16 * 1024 * 1024,
    }));
    let store = Arc::new(SessionStore::new(dir.path()).expect("session store"));
    let sessions = Arc::new(dh_session::SessionManager::new(
        clock.clone(),
        SessionManagerConfig::default(),
        workspaces.clone(),
        store,
    ));
    let breakers = Arc::new(dh_capabilities::BreakerRegistry::new(clock.clone(), BreakerConfig::default()));

    let ctx = Arc::new(dh_tools::ToolContext::new(
        clock.clone(),
        sessions.clone(),
        workspaces,
        breakers,
        Arc::new(MockContainerRuntime::default()),
        Arc::new(MockClusterAdapter::default()),
        Arc::new(MockRegistryAdapter::default()),
        Arc::new(MockScannerAdapter::default()),
    ));

    let registry = Arc::new(dh_engine::ToolRegistry::new());
    register_all_tools(&registry, ctx).expect("register tools");
    let dispatcher = Arc::new(dh_engine::Dispatcher::new(registry.clone()));
    let jobs = Arc::new(dh_engine::JobManager::new(dispatcher.clone(), clock, dh_engine::JobManagerConfig::default()));

    let app = Arc::new(AppContext { sessions, registry, dispatcher, jobs, started_at: std::time::Instant::now() });
    (app, dir)
}

#[tokio::test]
async fn binding_twice_at_the_same_path_removes_the_stale_socket() {
    let (app, dir) = test_app();
    let socket_path = dir.path().join("dockhand.sock");

    let first = Transport::bind(&socket_path, None, app.clone()).await.expect("first bind");
    drop(first);

    let second = Transport::bind(&socket_path, None, app).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn accepted_unix_connections_are_served_end_to_end() {
    let (app, dir) = test_app();
    let socket_path = dir.path().join("dockhand.sock");
    let transport = Transport::bind(&socket_path, None, app).await.expect("bind");

    let shutdown = CancellationToken::new();
    let run_shutdown = shutdown.clone();
    let server = tokio::spawn(async move { transport.run(run_shutdown).await });

    let mut client = UnixStream::connect(&socket_path).await.expect("connect");
    let request = Request::new("1", Method::ServerStatus);
    write_message(&mut client, &encode(&request).unwrap()).await.unwrap();
    let bytes = read_message(&mut client).await.unwrap();
    let response: dh_wire::Response = decode(&bytes).unwrap();
    assert!(response.is_ok());

    shutdown.cancel();
    server.await.expect("transport task");
}
