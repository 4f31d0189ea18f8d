// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures::fixture;
use dh_capabilities::adapters::DeploymentStatus;
use dh_core::error::ErrorKind;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::sync::Arc;

#[tokio::test]
async fn healthy_deployment_marks_verify_stage_done() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;

    let result = check_health_core(&f.ctx, session_id, "dockhand-app", "prod", false).await.unwrap();
    assert!(result.healthy);
    assert_eq!(result.status, "available");

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(handle.read().stages.is_done(Stage::Verify));
}

#[tokio::test]
async fn failed_deployment_surfaces_as_capability_failure() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    *f.cluster.status.lock() = DeploymentStatus::Failed;

    let err = check_health_core(&f.ctx, session_id, "dockhand-app", "prod", false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapabilityFailure);

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(!handle.read().stages.is_done(Stage::Verify));
}

#[tokio::test]
async fn progressing_deployment_is_reported_unhealthy_without_failing() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    *f.cluster.status.lock() = DeploymentStatus::Progressing;

    let result = check_health_core(&f.ctx, session_id, "dockhand-app", "prod", false).await.unwrap();
    assert!(!result.healthy);
    assert_eq!(result.status, "progressing");
}

#[tokio::test]
async fn dry_run_skips_the_cluster_and_always_reports_healthy() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;

    let result = check_health_core(&f.ctx, session_id, "dockhand-app", "prod", true).await.unwrap();
    assert!(result.healthy);
    assert!(f.cluster.calls.lock().is_empty());
}

#[tokio::test]
async fn handler_call_round_trips_through_json() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = Arc::new(f.ctx);
    let handler = CheckHealthHandler::new(ctx);
    let call_ctx = CallContext::new("req-1", "check_health");
    let args = serde_json::json!({"session_id": session_id.as_str(), "deployment_name": "dockhand-app", "namespace": "prod"});
    let value = handler.call(&call_ctx, args).await.unwrap();
    assert_eq!(value["healthy"], true);
}

#[tokio::test]
async fn step_is_not_compensable() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = Arc::new(f.ctx);
    let step = CheckHealthStep::new(ctx, session_id, false);
    assert!(!step.can_compensate());
    let mut shared = SharedBag::new();
    step.compensate(&StepContext::new(Some(session_id)), &mut shared).await.unwrap();
}
