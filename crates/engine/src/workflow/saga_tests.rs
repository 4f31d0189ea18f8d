// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::workflow::step::{SharedBag, StepContext, WorkflowStep};
use async_trait::async_trait;
use dh_core::clock::FakeClock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct RecordingStep {
    name: &'static str,
    fail_on_execute: bool,
    fail_on_compensate: bool,
    compensable: bool,
    compensated: Arc<Mutex<Vec<String>>>,
}

impl RecordingStep {
    fn ok(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self { name, fail_on_execute: false, fail_on_compensate: false, compensable: true, compensated: log })
    }

    fn failing(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self { name, fail_on_execute: true, fail_on_compensate: false, compensable: true, compensated: log })
    }

    fn non_compensable(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self { name, fail_on_execute: false, fail_on_compensate: false, compensable: false, compensated: log })
    }

    fn compensation_fails(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self { name, fail_on_execute: false, fail_on_compensate: true, compensable: true, compensated: log })
    }
}

#[async_trait]
impl WorkflowStep for RecordingStep {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, _ctx: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        if self.fail_on_execute {
            return Err(ToolError::new(ErrorKind::CapabilityFailure, format!("{} failed", self.name)));
        }
        shared.insert(self.name.to_string(), serde_json::json!(true));
        Ok(serde_json::json!({"step": self.name}))
    }

    async fn compensate(&self, _ctx: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        if self.fail_on_compensate {
            return Err(ToolError::new(ErrorKind::CompensationFailed, format!("undo {} failed", self.name)));
        }
        self.compensated.lock().push(self.name.to_string());
        Ok(())
    }

    fn can_compensate(&self) -> bool {
        self.compensable
    }
}

fn ctx() -> StepContext {
    StepContext::new(None)
}

#[tokio::test]
async fn all_steps_succeed_reaches_completed() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> = vec![
        RecordingStep::ok("analyze", log.clone()),
        RecordingStep::ok("build", log.clone()),
        RecordingStep::ok("push", log.clone()),
    ];
    let engine = SagaEngine::new(FakeClock::new());
    let outcome = engine.run(&steps, ctx(), CancellationToken::new()).await;
    assert_eq!(outcome.state, SagaState::Completed);
    assert_eq!(outcome.executed_steps.len(), 3);
    assert!(outcome.executed_steps.iter().all(|r| r.success));
    assert!(outcome.compensated_steps.is_empty());
}

#[tokio::test]
async fn failure_compensates_successful_steps_in_reverse_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> = vec![
        RecordingStep::ok("analyze", log.clone()),
        RecordingStep::ok("build", log.clone()),
        RecordingStep::failing("push", log.clone()),
    ];
    let engine = SagaEngine::new(FakeClock::new());
    let outcome = engine.run(&steps, ctx(), CancellationToken::new()).await;
    assert_eq!(outcome.state, SagaState::Compensated);
    assert_eq!(outcome.compensated_steps.len(), 2);
    assert_eq!(outcome.compensated_steps[0].step_name, "build");
    assert_eq!(outcome.compensated_steps[1].step_name, "analyze");
    assert_eq!(*log.lock(), vec!["build".to_string(), "analyze".to_string()]);
}

#[tokio::test]
async fn failed_step_itself_is_never_compensated() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> = vec![RecordingStep::failing("only", log.clone())];
    let engine = SagaEngine::new(FakeClock::new());
    let outcome = engine.run(&steps, ctx(), CancellationToken::new()).await;
    assert_eq!(outcome.state, SagaState::Compensated);
    assert!(outcome.compensated_steps.is_empty());
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn non_compensable_step_is_skipped_with_a_note() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> =
        vec![RecordingStep::non_compensable("seed", log.clone()), RecordingStep::failing("push", log.clone())];
    let engine = SagaEngine::new(FakeClock::new());
    let outcome = engine.run(&steps, ctx(), CancellationToken::new()).await;
    assert_eq!(outcome.state, SagaState::Compensated);
    assert_eq!(outcome.compensated_steps.len(), 1);
    assert_eq!(outcome.compensated_steps[0].step_name, "seed");
    assert!(outcome.compensated_steps[0].note.as_ref().unwrap().contains("not compensable"));
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn compensation_failure_ends_the_saga_as_failed() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> = vec![
        RecordingStep::ok("analyze", log.clone()),
        RecordingStep::compensation_fails("build", log.clone()),
        RecordingStep::failing("push", log.clone()),
    ];
    let engine = SagaEngine::new(FakeClock::new());
    let outcome = engine.run(&steps, ctx(), CancellationToken::new()).await;
    assert_eq!(outcome.state, SagaState::Failed);
    assert_eq!(outcome.compensated_steps.len(), 1);
    assert!(!outcome.compensated_steps[0].success);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn cancellation_before_a_step_compensates_what_ran_and_ends_compensated() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> =
        vec![RecordingStep::ok("analyze", log.clone()), RecordingStep::ok("build", log.clone())];
    let engine = SagaEngine::new(FakeClock::new());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = engine.run(&steps, ctx(), cancel).await;
    assert_eq!(outcome.state, SagaState::Compensated);
    assert!(outcome.executed_steps.is_empty());
    assert!(outcome.compensated_steps.is_empty());
}

#[tokio::test]
async fn second_cancellation_interrupting_compensation_aborts_the_saga() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> = vec![
        RecordingStep::ok("analyze", log.clone()),
        RecordingStep::ok("build", log.clone()),
        RecordingStep::failing("push", log.clone()),
    ];
    let engine = SagaEngine::new(FakeClock::new());
    let compensation_cancel = CancellationToken::new();
    compensation_cancel.cancel();
    let outcome =
        engine.run_with_compensation_cancel(&steps, ctx(), CancellationToken::new(), compensation_cancel).await;
    assert_eq!(outcome.state, SagaState::Aborted);
    assert_eq!(outcome.executed_steps.len(), 3);
    assert!(outcome.compensated_steps.is_empty());
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn execution_and_compensation_timestamps_are_non_decreasing() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let steps: Vec<Arc<dyn WorkflowStep>> = vec![
        RecordingStep::ok("analyze", log.clone()),
        RecordingStep::ok("build", log.clone()),
        RecordingStep::failing("push", log.clone()),
    ];
    let clock = FakeClock::new();
    let engine = SagaEngine::new(clock.clone());
    let outcome = engine.run(&steps, ctx(), CancellationToken::new()).await;

    let exec_times: Vec<u64> = outcome.executed_steps.iter().map(|r| r.at_ms).collect();
    assert!(exec_times.windows(2).all(|w| w[0] <= w[1]));
    let comp_times: Vec<u64> = outcome.compensated_steps.iter().map(|r| r.at_ms).collect();
    assert!(comp_times.windows(2).all(|w| w[0] <= w[1]));
}
