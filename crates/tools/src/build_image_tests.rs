// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures::fixture;
use dh_capabilities::adapters::mock::Scripted;
use dh_core::error::ErrorKind;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::sync::Arc;

#[tokio::test]
async fn builds_through_the_mock_runtime_and_marks_stage_done() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let step = StepContext::new(Some(session_id));

    let result = build_image_core(&f.ctx, &step, session_id, Some("app:v1"), false).await.unwrap();
    assert_eq!(result.image_ref, "app:v1");
    assert_eq!(result.image_id, "sha256:mock");

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(handle.read().stages.is_done(Stage::Build));
}

#[tokio::test]
async fn test_mode_namespaces_the_image_reference() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let mut step = StepContext::new(Some(session_id));
    step.test_mode = true;
    step.test_namespace = Some("test-namespace".to_string());

    let result = build_image_core(&f.ctx, &step, session_id, Some("app:v1"), false).await.unwrap();
    assert_eq!(result.image_ref, "test-app:v1");
}

#[tokio::test]
async fn dry_run_never_invokes_the_adapter_or_marks_stage_done() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let step = StepContext::new(Some(session_id));

    build_image_core(&f.ctx, &step, session_id, Some("app:v1"), true).await.unwrap();

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(!handle.read().stages.is_done(Stage::Build));
}

#[tokio::test]
async fn adapter_failure_surfaces_as_capability_failure() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let step = StepContext::new(Some(session_id));
    *f.container_runtime.build_result.lock() = Scripted::Fail(ErrorKind::CapabilityFailure);

    let err = build_image_core(&f.ctx, &step, session_id, Some("app:v1"), false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapabilityFailure);
}

#[tokio::test]
async fn handler_call_round_trips_through_json() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = Arc::new(f.ctx);
    let handler = BuildImageHandler::new(ctx);
    let call_ctx = CallContext::new("req-1", "build_image");
    let args = serde_json::json!({"session_id": session_id.as_str(), "image_tag": "svc:latest"});
    let value = handler.call(&call_ctx, args).await.unwrap();
    assert_eq!(value["image_ref"], "svc:latest");
}

#[tokio::test]
async fn step_is_not_compensable() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = Arc::new(f.ctx);
    let step = BuildImageStep::new(ctx, session_id, false);
    assert!(!step.can_compensate());

    let mut shared = SharedBag::new();
    step.compensate(&StepContext::new(Some(session_id)), &mut shared).await.unwrap();
}
