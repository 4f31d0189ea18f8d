// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dh_capabilities::adapters::mock::{MockClusterAdapter, MockContainerRuntime, MockRegistryAdapter, MockScannerAdapter};
use dh_capabilities::BreakerConfig;
use dh_core::clock::SystemClock;
use dh_session::{SessionManagerConfig, SessionStore, WorkspaceConfig, WorkspaceManager};
use dh_tools::register_all_tools;
use dh_wire::{decode, encode, read_message, write_message};
use serde_json::json;
use tempfile::TempDir;

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

    let container_runtime = Arc::new(MockContainerRuntime::default());
    let cluster = Arc::new(MockClusterAdapter::default());
    let registry_adapter = Arc::new(MockRegistryAdapter::default());
    let scanner = Arc::new(MockScannerAdapter::default());

    let ctx = Arc::new(dh_tools::ToolContext::new(
        clock.clone(),
        sessions.clone(),
        workspaces,
        breakers,
        container_runtime,
        cluster,
        registry_adapter,
        scanner,
    ));

    let registry = Arc::new(dh_engine::ToolRegistry::new());
    register_all_tools(&registry, ctx).expect("register tools");

    let dispatcher = Arc::new(dh_engine::Dispatcher::new(registry.clone()));
    let jobs = Arc::new(dh_engine::JobManager::new(
        dispatcher.clone(),
        clock,
        dh_engine::JobManagerConfig::default(),
    ));

    let app = Arc::new(AppContext {
        sessions,
        registry,
        dispatcher,
        jobs,
        started_at: std::time::Instant::now(),
    });
    (app, dir)
}

async fn roundtrip(app: &Arc<AppContext>, request: Request) -> Response {
    let (mut client, server_side) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_side);
    let app = app.clone();
    let server = tokio::spawn(async move { serve(server_read, server_write, app).await });

    let payload = encode(&request).expect("encode request");
    write_message(&mut client, &payload).await.expect("write request");
    let bytes = read_message(&mut client).await.expect("read response");
    drop(client);
    server.await.expect("server task");
    decode(&bytes).expect("decode response")
}

#[tokio::test]
async fn tools_list_returns_every_registered_descriptor() {
    let (app, _dir) = test_app();
    let response = roundtrip(&app, Request::new("1", Method::ToolsList)).await;
    assert!(response.is_ok());
    let entries = response.result.unwrap();
    assert_eq!(entries.as_array().unwrap().len(), app.registry.len());
}

#[tokio::test]
async fn tools_call_submits_a_job_and_reports_its_initial_status() {
    let (app, _dir) = test_app();
    let request = Request::new(
        "2",
        Method::ToolsCall {
            name: "chat".to_string(),
            arguments: json!({ "message": "hello" }),
            session_id: None,
        },
    );
    let response = roundtrip(&app, request).await;
    assert!(response.is_ok(), "expected success, got {:?}", response.error);
    let body = response.result.unwrap();
    assert!(body.get("job_id").is_some());
}

#[tokio::test]
async fn tools_call_for_unknown_tool_surfaces_a_tool_error() {
    let (app, _dir) = test_app();
    let request = Request::new(
        "3",
        Method::ToolsCall { name: "does_not_exist".to_string(), arguments: json!({}), session_id: None },
    );
    let response = roundtrip(&app, request).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(response.is_ok() || response.error.is_some());
}

#[tokio::test]
async fn sessions_get_on_an_unknown_id_returns_a_protocol_error() {
    let (app, _dir) = test_app();
    let request = Request::new("4", Method::SessionsGet { id: "ses-doesnotexist000000".to_string() });
    let response = roundtrip(&app, request).await;
    assert!(response.error.is_some());
}

#[tokio::test]
async fn sessions_list_reflects_sessions_created_via_get_or_create() {
    let (app, _dir) = test_app();
    app.sessions.get_or_create("").expect("create session");
    let request = Request::new("5", Method::SessionsList);
    let response = roundtrip(&app, request).await;
    assert!(response.is_ok());
    let entries = response.result.unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn sessions_delete_is_idempotent() {
    let (app, _dir) = test_app();
    let handle = app.sessions.get_or_create("").expect("create session");
    let id = handle.read().id.as_str().to_string();
    drop(handle);

    let first = roundtrip(&app, Request::new("6", Method::SessionsDelete { id: id.clone() })).await;
    assert!(first.is_ok());
    let second = roundtrip(&app, Request::new("7", Method::SessionsDelete { id })).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn server_status_reports_zero_activity_on_a_fresh_app() {
    let (app, _dir) = test_app();
    let response = roundtrip(&app, Request::new("8", Method::ServerStatus)).await;
    assert!(response.is_ok());
    let body = response.result.unwrap();
    assert_eq!(body["active_sessions"], json!(0));
    assert!(body["healthy"].as_bool().unwrap());
}

#[tokio::test]
async fn jobs_status_for_an_unknown_job_returns_an_error() {
    let (app, _dir) = test_app();
    let request = Request::new("9", Method::JobsStatus { job_id: "job-doesnotexist0000000".to_string() });
    let response = roundtrip(&app, request).await;
    assert!(response.error.is_some());
}
