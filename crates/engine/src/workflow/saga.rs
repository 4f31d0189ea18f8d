// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The saga state machine: sequential step execution with reverse-order
//! compensation of the successful subset (§4.6).

use super::step::{SharedBag, StepContext, WorkflowStep};
use dh_core::clock::Clock;
use dh_core::error::ToolError;
use dh_core::progress::ProgressSink;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaState {
    Started,
    InProgress,
    Completed,
    Compensated,
    Failed,
    Aborted,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_name: String,
    pub success: bool,
    pub output: Option<serde_json::Value>,
    pub error: Option<ToolError>,
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct CompensationResult {
    pub step_name: String,
    pub success: bool,
    pub note: Option<String>,
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SagaOutcome {
    pub state: SagaState,
    pub executed_steps: Vec<StepResult>,
    pub compensated_steps: Vec<CompensationResult>,
}

pub struct SagaEngine<C: Clock> {
    clock: C,
    progress: Option<ProgressSink>,
}

impl<C: Clock> SagaEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, progress: None }
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Drive `steps` to completion or to a compensated/failed/aborted
    /// terminal state. `cancel` is checked before each step starts and
    /// threaded into the step's own context so a long-running step can
    /// cooperatively observe it too. A cancellation observed there runs
    /// compensation under an independent token and reports `Compensated`
    /// once compensation finishes — per §4.6, the same signal that
    /// interrupted a step must not also abort compensation.
    pub async fn run(&self, steps: &[Arc<dyn WorkflowStep>], ctx: StepContext, cancel: CancellationToken) -> SagaOutcome {
        self.run_with_compensation_cancel(steps, ctx, cancel, CancellationToken::new()).await
    }

    /// Like [`Self::run`], but lets the caller supply the independent
    /// cancellation source that governs compensation. A second,
    /// distinct cancellation delivered through `compensation_cancel`
    /// aborts compensation partway and the saga ends `Aborted`.
    pub async fn run_with_compensation_cancel(
        &self,
        steps: &[Arc<dyn WorkflowStep>],
        ctx: StepContext,
        cancel: CancellationToken,
        compensation_cancel: CancellationToken,
    ) -> SagaOutcome {
        let mut shared = SharedBag::new();
        let mut executed = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let step_ctx = StepContext { cancel: cancel.clone(), ..ctx.clone() };
            if cancel.is_cancelled() {
                return self.compensate(steps, &mut shared, executed, &step_ctx, compensation_cancel).await;
            }
            self.report_start(index, steps.len(), step.name());

            let at_ms = self.clock.epoch_ms();
            match step.execute(&step_ctx, &mut shared).await {
                Ok(output) => {
                    executed.push(StepResult { step_name: step.name().to_string(), success: true, output: Some(output), error: None, at_ms });
                    self.report_done(index, steps.len(), step.name());
                }
                Err(err) => {
                    executed.push(StepResult { step_name: step.name().to_string(), success: false, output: None, error: Some(err), at_ms });
                    return self.compensate(steps, &mut shared, executed, &step_ctx, compensation_cancel).await;
                }
            }
        }

        SagaOutcome { state: SagaState::Completed, executed_steps: executed, compensated_steps: Vec::new() }
    }

    fn report_start(&self, index: usize, total: usize, name: &str) {
        if let Some(sink) = &self.progress {
            sink.report(index, 0.0, format!("starting step '{name}' ({}/{total})", index + 1));
        }
    }

    fn report_done(&self, index: usize, total: usize, name: &str) {
        if let Some(sink) = &self.progress {
            sink.report(index, 1.0, format!("completed step '{name}' ({}/{total})", index + 1));
        }
    }

    /// Reverse-order compensation of the successfully executed subset,
    /// under a context derived fresh for this phase (§4.6) so the signal
    /// that cancelled a step doesn't also cancel compensation. Steps that
    /// are not compensable are skipped with a note but do not abort
    /// compensation of the rest. A step whose compensation itself errors
    /// ends the saga in `Failed`, leaving whatever remains uncompensated.
    /// `compensation_cancel` is checked between steps (never mid-call, so
    /// an in-flight `Compensate` always runs to completion); if it fires
    /// before every successful step has been compensated, the saga ends
    /// `Aborted`.
    async fn compensate(
        &self,
        steps: &[Arc<dyn WorkflowStep>],
        shared: &mut SharedBag,
        executed: Vec<StepResult>,
        ctx: &StepContext,
        compensation_cancel: CancellationToken,
    ) -> SagaOutcome {
        let by_name: HashMap<&str, &Arc<dyn WorkflowStep>> = steps.iter().map(|s| (s.name(), s)).collect();
        let successful: Vec<&StepResult> = executed.iter().filter(|r| r.success).collect();
        let comp_ctx = StepContext { cancel: compensation_cancel.clone(), ..ctx.clone() };

        let mut compensated = Vec::with_capacity(successful.len());
        let mut compensation_failed = false;
        let mut aborted = false;

        for result in successful.iter().rev() {
            if compensation_cancel.is_cancelled() {
                aborted = true;
                break;
            }
            let Some(step) = by_name.get(result.step_name.as_str()) else { continue };
            let at_ms = self.clock.epoch_ms();
            if !step.can_compensate() {
                compensated.push(CompensationResult {
                    step_name: result.step_name.clone(),
                    success: true,
                    note: Some("step is not compensable; skipped".to_string()),
                    at_ms,
                });
                continue;
            }
            match step.compensate(&comp_ctx, shared).await {
                Ok(()) => compensated.push(CompensationResult { step_name: result.step_name.clone(), success: true, note: None, at_ms }),
                Err(err) => {
                    compensated.push(CompensationResult {
                        step_name: result.step_name.clone(),
                        success: false,
                        note: Some(format!("compensation failed: {err}")),
                        at_ms,
                    });
                    compensation_failed = true;
                    break;
                }
            }
        }

        let state = if compensation_failed {
            SagaState::Failed
        } else if aborted {
            SagaState::Aborted
        } else {
            SagaState::Compensated
        };

        SagaOutcome { state, executed_steps: executed, compensated_steps: compensated }
    }
}

#[cfg(test)]
#[path = "saga_tests.rs"]
mod tests;
