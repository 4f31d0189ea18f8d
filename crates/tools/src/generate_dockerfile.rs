// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `generate_dockerfile`: renders a Dockerfile from the base image
//! `analyze_repository` recommended (or an explicit override) and writes
//! it into the session's workspace.

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use dh_core::ids::SessionId;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct GenerateDockerfileArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub base_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GenerateDockerfileResult {
    pub dockerfile_path: String,
    pub contents: String,
}

fn render_dockerfile(base_image: &str) -> String {
    format!(
        "FROM {base_image}\nWORKDIR /app\nCOPY . .\nRUN [\"true\"]\nCMD [\"/bin/sh\", \"-c\", \"true\"]\n"
    )
}

/// Read back the base image `analyze_repository` recommended, from the
/// workspace file it wrote. Returns `ValidationFailed` if analysis has
/// not run yet, matching the pipeline's predecessor rule (spec §3).
fn recommended_base_image<C: Clock>(ctx: &ToolContext<C>, session_id: SessionId) -> ToolResult<String> {
    let workspace_id = ctx.workspace_id(session_id.as_str())?;
    let path = ctx.workspaces.resolve_within(workspace_id, Path::new("analysis.json"))?;
    let bytes = std::fs::read(&path).map_err(|_| {
        ToolError::new(ErrorKind::ValidationFailed, "analyze_repository has not run for this session")
            .stage(Stage::Dockerfile.as_str())
    })?;
    let analysis: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ToolError::new(ErrorKind::InternalError, "corrupt analysis.json").with_cause(e))?;
    Ok(analysis
        .get("recommended_base_image")
        .and_then(|v| v.as_str())
        .unwrap_or("scratch")
        .to_string())
}

pub async fn generate_dockerfile_core<C: Clock>(
    ctx: &ToolContext<C>,
    session_id: SessionId,
    base_image_override: Option<&str>,
    dry_run: bool,
) -> ToolResult<GenerateDockerfileResult> {
    let base_image = match base_image_override {
        Some(image) => image.to_string(),
        None => recommended_base_image(ctx, session_id)?,
    };
    let contents = render_dockerfile(&base_image);
    let result = GenerateDockerfileResult { dockerfile_path: "Dockerfile".to_string(), contents: contents.clone() };

    if !dry_run {
        let workspace_id = ctx.workspace_id(session_id.as_str())?;
        ctx.workspaces.write(workspace_id, Path::new("Dockerfile"), contents.as_bytes())?;
        ctx.mark_stage_done(session_id.as_str(), Stage::Dockerfile)?;
    }

    Ok(result)
}

pub struct GenerateDockerfileHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> GenerateDockerfileHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for GenerateDockerfileHandler<C> {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: GenerateDockerfileArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let result = generate_dockerfile_core(&self.ctx, session_id, args.base_image.as_deref(), args.base.dry_run).await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

pub struct GenerateDockerfileStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    dry_run: bool,
}

impl<C: Clock> GenerateDockerfileStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, dry_run: bool) -> Self {
        Self { ctx, session_id, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for GenerateDockerfileStep<C> {
    fn name(&self) -> &str {
        "dockerfile"
    }

    async fn execute(&self, _step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let override_image = shared
            .get("analysis")
            .and_then(|v| v.get("recommended_base_image"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let result =
            generate_dockerfile_core(&self.ctx, self.session_id, override_image.as_deref(), self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("dockerfile".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        if !self.dry_run {
            if let Ok(workspace_id) = self.ctx.workspace_id(self.session_id.as_str()) {
                let path = self.ctx.workspaces.resolve_within(workspace_id, Path::new("Dockerfile"))?;
                let _ = std::fs::remove_file(path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "generate_dockerfile_tests.rs"]
mod tests;
