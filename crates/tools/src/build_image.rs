// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `build_image`: builds the session's Dockerfile through the
//! container-runtime capability, guarded by its circuit breaker.

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_capabilities::Capability;
use dh_core::clock::Clock;
use dh_core::error::ToolResult;
use dh_core::ids::SessionId;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::sync::Arc;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BuildImageArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub image_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BuildImageResult {
    pub image_ref: String,
    pub image_id: String,
}

fn default_tag(session_id: SessionId) -> String {
    format!("dockhand/{}:latest", session_id.as_str())
}

pub async fn build_image_core<C: Clock>(
    ctx: &ToolContext<C>,
    step: &StepContext,
    session_id: SessionId,
    image_tag_override: Option<&str>,
    dry_run: bool,
) -> ToolResult<BuildImageResult> {
    let raw_tag = image_tag_override.map(str::to_string).unwrap_or_else(|| default_tag(session_id));
    let image_ref = step.namespaced(&raw_tag);

    let image_id = if dry_run {
        format!("sha256:dry-run-{}", session_id.as_str())
    } else {
        let workspace_id = ctx.workspace_id(session_id.as_str())?;
        let context_dir = ctx.workspaces.path(workspace_id);
        let dockerfile = context_dir.join("Dockerfile");
        let runtime = ctx.container_runtime.clone();
        let tag = image_ref.clone();
        let outcome = ctx
            .breakers
            .guard(Capability::ContainerRuntime.breaker_name(), || async move {
                runtime.build(&context_dir, &dockerfile, &tag).await
            })
            .await?;
        ctx.mark_stage_done(session_id.as_str(), Stage::Build)?;
        outcome.image_id
    };

    Ok(BuildImageResult { image_ref, image_id })
}

pub struct BuildImageHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> BuildImageHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for BuildImageHandler<C> {
    async fn call(&self, ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: BuildImageArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let step = self.ctx.step_context(session_id, &args.base, ctx.cancel.clone());
        let result =
            build_image_core(&self.ctx, &step, session_id, args.image_tag.as_deref(), args.base.dry_run).await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

pub struct BuildImageStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    dry_run: bool,
}

impl<C: Clock> BuildImageStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, dry_run: bool) -> Self {
        Self { ctx, session_id, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for BuildImageStep<C> {
    fn name(&self) -> &str {
        "build"
    }

    async fn execute(&self, step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let result = build_image_core(&self.ctx, step, self.session_id, None, self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("build".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        Ok(())
    }

    /// The container-runtime adapter exposes no image-removal primitive;
    /// undoing a build is out of scope for this step (spec §4.6: skipped
    /// with a note rather than treated as a failure).
    fn can_compensate(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "build_image_tests.rs"]
mod tests;
