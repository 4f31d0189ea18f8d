// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `containerize_and_deploy`: the workflow aggregate that chains all ten
//! pipeline stages through the saga engine, compensating whatever
//! succeeded if a later stage fails or the call is cancelled.

use crate::analyze_repository::AnalyzeRepositoryStep;
use crate::build_image::BuildImageStep;
use crate::check_health::CheckHealthStep;
use crate::common::{parse_args, BaseArgs, ToolContext};
use crate::deploy::{ClusterApplyStep, DeployStatusStep};
use crate::generate_dockerfile::GenerateDockerfileStep;
use crate::generate_manifests::GenerateManifestsStep;
use crate::push_image::PushImageStep;
use crate::scan_image::ScanImageStep;
use crate::tag_image::TagImageStep;
use async_trait::async_trait;
use dh_core::clock::Clock;
use dh_core::error::ToolResult;
use dh_core::ids::SessionId;
use dh_engine::workflow::{StepContext, WorkflowStep};
use dh_engine::{CallContext, SagaEngine, SagaOutcome, SagaState, ToolHandler};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn default_max_critical() -> u32 {
    0
}

fn default_max_high() -> u32 {
    5
}

fn default_replicas() -> u32 {
    1
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ContainerizeAndDeployArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub repo_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub image_tag: Option<String>,
    #[serde(default = "default_max_critical")]
    pub max_critical: u32,
    #[serde(default = "default_max_high")]
    pub max_high: u32,
    pub release_tag: Option<String>,
    pub namespace: Option<String>,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StepSummary {
    pub stage: String,
    pub success: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CompensationSummary {
    pub stage: String,
    pub success: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContainerizeAndDeployResult {
    pub state: String,
    pub steps: Vec<StepSummary>,
    pub compensations: Vec<CompensationSummary>,
}

fn state_name(state: SagaState) -> &'static str {
    match state {
        SagaState::Started => "started",
        SagaState::InProgress => "in_progress",
        SagaState::Completed => "completed",
        SagaState::Compensated => "compensated",
        SagaState::Failed => "failed",
        SagaState::Aborted => "aborted",
    }
}

fn summarize(outcome: SagaOutcome) -> ContainerizeAndDeployResult {
    ContainerizeAndDeployResult {
        state: state_name(outcome.state).to_string(),
        steps: outcome
            .executed_steps
            .into_iter()
            .map(|r| StepSummary { stage: r.step_name, success: r.success })
            .collect(),
        compensations: outcome
            .compensated_steps
            .into_iter()
            .map(|r| CompensationSummary { stage: r.step_name, success: r.success, note: r.note })
            .collect(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_steps<C: Clock + 'static>(
    ctx: &Arc<ToolContext<C>>,
    session_id: SessionId,
    args: &ContainerizeAndDeployArgs,
) -> Vec<Arc<dyn WorkflowStep>> {
    let dry_run = args.base.dry_run;
    vec![
        Arc::new(AnalyzeRepositoryStep::new(
            ctx.clone(),
            session_id,
            args.repo_url.clone(),
            args.branch.clone(),
            dry_run,
        )),
        Arc::new(GenerateDockerfileStep::new(ctx.clone(), session_id, dry_run)),
        Arc::new(BuildImageStep::new(ctx.clone(), session_id, dry_run)),
        Arc::new(ScanImageStep::new(ctx.clone(), session_id, args.max_critical, args.max_high, dry_run)),
        Arc::new(TagImageStep::new(
            ctx.clone(),
            session_id,
            args.release_tag.clone().unwrap_or_else(|| "latest".to_string()),
            dry_run,
        )),
        Arc::new(PushImageStep::new(ctx.clone(), session_id, dry_run)),
        Arc::new(GenerateManifestsStep::new(ctx.clone(), session_id, args.namespace.clone(), args.replicas, dry_run)),
        Arc::new(ClusterApplyStep::new(ctx.clone(), session_id, dry_run)),
        Arc::new(DeployStatusStep::new(ctx.clone(), session_id, dry_run)),
        Arc::new(CheckHealthStep::new(ctx.clone(), session_id, dry_run)),
    ]
}

pub async fn containerize_and_deploy_core<C: Clock + 'static>(
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    args: &ContainerizeAndDeployArgs,
    step_ctx: StepContext,
    cancel: CancellationToken,
) -> ContainerizeAndDeployResult {
    let steps = build_steps(&ctx, session_id, args);
    let engine = SagaEngine::new(ctx.clock.clone());
    let outcome = engine.run(&steps, step_ctx, cancel).await;
    summarize(outcome)
}

pub struct ContainerizeAndDeployHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> ContainerizeAndDeployHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for ContainerizeAndDeployHandler<C> {
    async fn call(&self, ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: ContainerizeAndDeployArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let step_ctx = self.ctx.step_context(session_id, &args.base, ctx.cancel.clone());
        let result =
            containerize_and_deploy_core(self.ctx.clone(), session_id, &args, step_ctx, ctx.cancel.clone()).await;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "containerize_and_deploy_tests.rs"]
mod tests;
