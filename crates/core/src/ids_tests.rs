// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn session_id_round_trips_through_string() {
    let id = SessionId::new();
    let parsed = SessionId::from_string(id.as_str());
    assert_eq!(id, parsed);
}

#[test]
fn session_id_adopts_caller_supplied_value() {
    let id = SessionId::from_string("ses-custom-caller-id");
    assert_eq!(id.as_str(), "ses-custom-caller-id");
}

#[test]
fn workspace_id_carries_its_prefix() {
    let id = WorkspaceId::new();
    assert!(id.as_str().starts_with(WorkspaceId::PREFIX));
}

#[test]
fn job_id_and_saga_id_are_distinct_types() {
    let job = JobId::new();
    let saga = SagaId::new();
    assert_ne!(job.as_str(), saga.as_str());
}

#[test]
fn ids_compare_equal_to_their_string_form() {
    let id = SessionId::from_string("ses-abc");
    assert_eq!(id, "ses-abc");
    assert_eq!(id, "ses-abc".to_string().as_str());
}
