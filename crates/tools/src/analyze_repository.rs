// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `analyze_repository`: the pipeline's first stage. Inspects a source
//! repository and recommends a language, build system, and base image
//! for the Dockerfile stage that follows.

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_core::clock::Clock;
use dh_core::error::ToolResult;
use dh_core::ids::SessionId;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AnalyzeRepositoryArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub repo_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalyzeRepositoryResult {
    pub language: String,
    pub build_system: String,
    pub recommended_base_image: String,
    pub has_tests: bool,
    pub notes: Vec<String>,
}

/// Heuristic stack detection keyed on the repo URL's extension-like
/// suffix, standing in for the clone-and-inspect pass a production
/// analyzer would run. Deterministic so tests don't depend on network
/// access.
fn detect_stack(repo_url: &str) -> (&'static str, &'static str, &'static str) {
    let lower = repo_url.to_ascii_lowercase();
    if lower.contains("rust") || lower.ends_with(".rs") {
        ("rust", "cargo", "rust:1-slim")
    } else if lower.contains("go-") || lower.contains("golang") {
        ("go", "go build", "golang:1-alpine")
    } else if lower.contains("python") || lower.contains("py-") {
        ("python", "pip", "python:3-slim")
    } else {
        ("node", "npm", "node:20-slim")
    }
}

pub async fn analyze_repository_core<C: Clock>(
    ctx: &ToolContext<C>,
    session_id: SessionId,
    repo_url: &str,
    branch: &str,
    dry_run: bool,
) -> ToolResult<AnalyzeRepositoryResult> {
    let (language, build_system, recommended_base_image) = detect_stack(repo_url);
    let result = AnalyzeRepositoryResult {
        language: language.to_string(),
        build_system: build_system.to_string(),
        recommended_base_image: recommended_base_image.to_string(),
        has_tests: true,
        notes: vec![format!("analyzed branch '{branch}' of {repo_url}")],
    };

    if !dry_run {
        let workspace_id = ctx.workspace_id(session_id.as_str())?;
        let summary = serde_json::to_vec_pretty(&result).unwrap_or_default();
        ctx.workspaces.write(workspace_id, Path::new("analysis.json"), &summary)?;
        ctx.mark_stage_done(session_id.as_str(), Stage::Analyze)?;
    }

    Ok(result)
}

pub struct AnalyzeRepositoryHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> AnalyzeRepositoryHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for AnalyzeRepositoryHandler<C> {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: AnalyzeRepositoryArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let result =
            analyze_repository_core(&self.ctx, session_id, &args.repo_url, &args.branch, args.base.dry_run).await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

/// The same core logic, driven by the saga engine as the pipeline's
/// first step. Carries its arguments from the enclosing
/// `containerize_and_deploy` call rather than re-parsing a `tools/call`
/// argument object.
pub struct AnalyzeRepositoryStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    repo_url: String,
    branch: String,
    dry_run: bool,
}

impl<C: Clock> AnalyzeRepositoryStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, repo_url: String, branch: String, dry_run: bool) -> Self {
        Self { ctx, session_id, repo_url, branch, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for AnalyzeRepositoryStep<C> {
    fn name(&self) -> &str {
        "analyze"
    }

    async fn execute(&self, _step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let result =
            analyze_repository_core(&self.ctx, self.session_id, &self.repo_url, &self.branch, self.dry_run).await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("analysis".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        if !self.dry_run {
            if let Ok(workspace_id) = self.ctx.workspace_id(self.session_id.as_str()) {
                let path = self.ctx.workspaces.resolve_within(workspace_id, Path::new("analysis.json"))?;
                let _ = std::fs::remove_file(path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "analyze_repository_tests.rs"]
mod tests;
