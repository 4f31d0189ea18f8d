// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dh_core::ids::{SessionId, WorkspaceId};

#[test]
fn new_session_expires_after_ttl() {
    let session = Session::new(SessionId::new(), WorkspaceId::new(), 1_000, 500);
    assert_eq!(session.expires_at_ms, 1_500);
    assert!(!session.is_expired(1_499));
    assert!(session.is_expired(1_500));
}

#[test]
fn touch_never_moves_updated_at_backward() {
    let mut session = Session::new(SessionId::new(), WorkspaceId::new(), 1_000, 500);
    session.touch(2_000, 500);
    session.touch(1_500, 500);
    assert_eq!(session.updated_at_ms, 2_000);
}

#[test]
fn record_error_appends_a_summary() {
    let mut session = Session::new(SessionId::new(), WorkspaceId::new(), 1_000, 500);
    let err = ToolError::new(ErrorKind::QuotaExceeded, "workspace too large").tool("analyze_repository");
    session.record_error(&err, 1_200);
    assert_eq!(session.errors.len(), 1);
    assert_eq!(session.errors[0].kind, ErrorKind::QuotaExceeded);
    assert_eq!(session.errors[0].tool.as_deref(), Some("analyze_repository"));
}

#[test]
fn session_round_trips_through_json() {
    let mut session = Session::new(SessionId::new(), WorkspaceId::new(), 1_000, 500);
    session.stages.mark_done(crate::stage::Stage::Analyze, 1_100).unwrap();
    let json = serde_json::to_string(&session).unwrap();
    let restored: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.id, session.id);
    assert!(restored.stages.is_done(crate::stage::Stage::Analyze));
}
