// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tag_image`: applies an additional tag to a previously built image
//! through the container-runtime capability.

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
pub struct TagImageArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub image_ref: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TagImageResult {
    pub image_ref: String,
}

pub async fn tag_image_core<C: Clock>(
    ctx: &ToolContext<C>,
    step: &StepContext,
    session_id: SessionId,
    image_ref: &str,
    raw_tag: &str,
    dry_run: bool,
) -> ToolResult<TagImageResult> {
    let target = step.namespaced(raw_tag);

    if !dry_run {
        let runtime = ctx.container_runtime.clone();
        let source = image_ref.to_string();
        let target_for_call = target.clone();
        ctx.breakers
            .guard(Capability::ContainerRuntime.breaker_name(), || async move {
                runtime.tag(&source, &target_for_call).await
            })
            .await?;
        ctx.mark_stage_done(session_id.as_str(), Stage::Tag)?;
    }

    Ok(TagImageResult { image_ref: target })
}

pub struct TagImageHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> TagImageHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for TagImageHandler<C> {
    async fn call(&self, ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: TagImageArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let step = self.ctx.step_context(session_id, &args.base, ctx.cancel.clone());
        let result =
            tag_image_core(&self.ctx, &step, session_id, &args.image_ref, &args.tag, args.base.dry_run).await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

pub struct TagImageStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    tag: String,
    dry_run: bool,
}

impl<C: Clock> TagImageStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, tag: impl Into<String>, dry_run: bool) -> Self {
        Self { ctx, session_id, tag: tag.into(), dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for TagImageStep<C> {
    fn name(&self) -> &str {
        "tag"
    }

    async fn execute(&self, step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let image_ref = shared
            .get("build")
            .and_then(|v| v.get("image_ref"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let result = tag_image_core(&self.ctx, step, self.session_id, &image_ref, &self.tag, self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("tag".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        Ok(())
    }

    /// The container-runtime adapter exposes no untag primitive.
    fn can_compensate(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "tag_image_tests.rs"]
mod tests;
