// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures::fixture;
use dh_capabilities::adapters::VulnerabilitySummary;
use dh_core::error::ErrorKind;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_session::Stage;

#[tokio::test]
async fn passes_and_marks_stage_done_when_under_threshold() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;

    let result = scan_image_core(&f.ctx, session_id, "app:v1", 0, 5, false).await.unwrap();
    assert!(result.passed);

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(handle.read().stages.is_done(Stage::Scan));
}

#[tokio::test]
async fn exceeding_thresholds_fails_validation_and_does_not_mark_stage_done() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    *f.scanner.summary.lock() = VulnerabilitySummary { critical: 2, high: 0, medium: 0, low: 0 };

    let err = scan_image_core(&f.ctx, session_id, "app:v1", 0, 5, false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationFailed);

    let handle = f.ctx.sessions.get(session_id.as_str()).unwrap();
    assert!(!handle.read().stages.is_done(Stage::Scan));
}

#[tokio::test]
async fn dry_run_skips_the_scanner_and_always_passes() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    *f.scanner.summary.lock() = VulnerabilitySummary { critical: 9, high: 9, medium: 0, low: 0 };

    let result = scan_image_core(&f.ctx, session_id, "app:v1", 0, 5, true).await.unwrap();
    assert!(result.passed);
}

#[tokio::test]
async fn step_is_not_compensable() {
    let f = fixture();
    let session = f.ctx.resolve_session("").unwrap();
    let session_id = session.read().id;
    let ctx = std::sync::Arc::new(f.ctx);
    let step = ScanImageStep::new(ctx, session_id, 0, 5, true);
    assert!(!step.can_compensate());
    let mut shared = SharedBag::new();
    step.compensate(&StepContext::new(Some(session_id)), &mut shared).await.unwrap();
}
