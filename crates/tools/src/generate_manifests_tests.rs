// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures::fixture;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::sync::Arc;

#[tokio::test]
async fn renders_deployment_and_service_and_marks_stage_done() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let step = StepContext::new(Some(session_id));

    let result =
        generate_manifests_core(&f.ctx, &step, session_id, "app:v1", None, 3, false).await.unwrap();
    assert_eq!(result.namespace, "default");
    assert_eq!(result.manifests.len(), 2);
    assert!(result.manifests[0].contains("kind: Deployment"));
    assert!(result.manifests[0].contains("replicas: 3"));
    assert!(result.manifests[1].contains("kind: Service"));

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(handle.read().stages.is_done(Stage::Manifest));
}

#[tokio::test]
async fn test_mode_namespaces_the_target_namespace() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let mut step = StepContext::new(Some(session_id));
    step.test_mode = true;
    step.test_namespace = Some("test-namespace".to_string());

    let result =
        generate_manifests_core(&f.ctx, &step, session_id, "app:v1", None, 1, false).await.unwrap();
    assert_eq!(result.namespace, "test-namespace");
}

#[tokio::test]
async fn dry_run_never_writes_the_workspace_file_or_marks_stage_done() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let step = StepContext::new(Some(session_id));

    generate_manifests_core(&f.ctx, &step, session_id, "app:v1", None, 1, true).await.unwrap();

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(!handle.read().stages.is_done(Stage::Manifest));
    let workspace_id = f.ctx.workspace_id(session_id.as_str()).unwrap();
    assert!(f.ctx.workspaces.resolve_within(workspace_id, std::path::Path::new("manifests.yaml")).is_ok());
    assert!(!f.ctx.workspaces.path(workspace_id).join("manifests.yaml").exists());
}

#[tokio::test]
async fn handler_call_round_trips_through_json() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = Arc::new(f.ctx);
    let handler = GenerateManifestsHandler::new(ctx);
    let call_ctx = CallContext::new("req-1", "generate_manifests");
    let args = serde_json::json!({"session_id": session_id.as_str(), "image_ref": "app:v1", "namespace": "prod"});
    let value = handler.call(&call_ctx, args).await.unwrap();
    assert_eq!(value["namespace"], "prod");
}

#[tokio::test]
async fn step_reads_image_ref_from_push_output_and_is_compensable() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = Arc::new(f.ctx);
    let step = GenerateManifestsStep::new(ctx, session_id, None, 1, false);
    assert!(step.can_compensate());

    let mut shared = SharedBag::new();
    shared.insert("push".to_string(), serde_json::json!({"image_ref": "app:v1"}));
    step.execute(&StepContext::new(Some(session_id)), &mut shared).await.unwrap();
    assert!(shared["manifest"]["manifests"][0].as_str().unwrap().contains("app:v1"));

    step.compensate(&StepContext::new(Some(session_id)), &mut shared).await.unwrap();
}
