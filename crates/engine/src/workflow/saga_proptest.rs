// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the timeline invariants in §8: execution and
//! compensation timestamps are non-decreasing, and compensation visits
//! the successful subset in exact reverse order.

use crate::workflow::saga::{SagaEngine, SagaState};
use crate::workflow::step::{SharedBag, StepContext, WorkflowStep};
use async_trait::async_trait;
use dh_core::clock::FakeClock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use proptest::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct NamedStep {
    name: String,
    should_fail: bool,
}

#[async_trait]
impl WorkflowStep for NamedStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &StepContext, _shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        if self.should_fail {
            Err(ToolError::new(ErrorKind::CapabilityFailure, format!("{} failed", self.name)))
        } else {
            Ok(serde_json::json!(self.name))
        }
    }

    async fn compensate(&self, _ctx: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn compensation_visits_successful_steps_in_exact_reverse_order(step_count in 1usize..8) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        rt.block_on(async {
            let steps: Vec<Arc<dyn WorkflowStep>> = (0..step_count)
                .map(|i| {
                    let should_fail = i == step_count - 1;
                    Arc::new(NamedStep { name: format!("step-{i}"), should_fail }) as Arc<dyn WorkflowStep>
                })
                .collect();

            let engine = SagaEngine::new(FakeClock::new());
            let outcome = engine.run(&steps, StepContext::new(None), CancellationToken::new()).await;

            prop_assert_eq!(outcome.state, SagaState::Compensated);
            let successful_names: Vec<String> =
                outcome.executed_steps.iter().filter(|r| r.success).map(|r| r.step_name.clone()).collect();
            let expected: Vec<String> = successful_names.iter().rev().cloned().collect();
            let actual: Vec<String> = outcome.compensated_steps.iter().map(|r| r.step_name.clone()).collect();
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(outcome.compensated_steps.len(), successful_names.len());
            Ok(())
        })?;
    }
}
