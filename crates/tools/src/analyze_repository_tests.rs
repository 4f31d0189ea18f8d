// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures::fixture;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::path::Path;
use std::sync::Arc;

#[tokio::test]
async fn detects_rust_stack_from_repo_url() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let result = analyze_repository_core(&f.ctx, session_id, "https://example.com/rust-app", "main", false)
        .await
        .unwrap();
    assert_eq!(result.language, "rust");
    assert!(result.has_tests);
}

#[tokio::test]
async fn successful_analysis_marks_stage_done_and_writes_workspace_file() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    analyze_repository_core(&f.ctx, session_id, "https://example.com/node-app", "main", false).await.unwrap();

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(handle.read().stages.is_done(Stage::Analyze));

    let workspace_id = f.ctx.workspace_id(session_id.as_str()).unwrap();
    let path = f.ctx.workspaces.resolve_within(workspace_id, Path::new("analysis.json")).unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn dry_run_never_marks_stage_or_writes_workspace_file() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    analyze_repository_core(&f.ctx, session_id, "https://example.com/go-app", "main", true).await.unwrap();

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(!handle.read().stages.is_done(Stage::Analyze));
}

#[tokio::test]
async fn handler_call_round_trips_through_json() {
    let f = fixture();
    let ctx = Arc::new(f.ctx);
    let handler = AnalyzeRepositoryHandler::new(ctx);
    let call_ctx = CallContext::new("req-1", "analyze_repository");
    let args = serde_json::json!({"repo_url": "https://example.com/python-svc", "branch": "main"});
    let value = handler.call(&call_ctx, args).await.unwrap();
    assert_eq!(value["language"], "python");
}

#[tokio::test]
async fn step_compensation_removes_the_analysis_file() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = Arc::new(f.ctx);
    let step = AnalyzeRepositoryStep::new(ctx.clone(), session_id, "https://example.com/app".to_string(), "main".to_string(), false);
    let mut shared = SharedBag::new();
    step.execute(&StepContext::new(Some(session_id)), &mut shared).await.unwrap();

    let workspace_id = ctx.workspace_id(session_id.as_str()).unwrap();
    let path = ctx.workspaces.resolve_within(workspace_id, Path::new("analysis.json")).unwrap();
    assert!(path.exists());

    step.compensate(&StepContext::new(Some(session_id)), &mut shared).await.unwrap();
    assert!(!path.exists());
}
