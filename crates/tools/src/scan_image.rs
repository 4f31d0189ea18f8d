// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `scan_image`: vulnerability-scans an image reference through the
//! scanner capability and halts the pipeline if severity thresholds are
//! exceeded.

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_capabilities::adapters::VulnerabilitySummary;
use dh_capabilities::Capability;
use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use dh_core::ids::SessionId;
use dh_engine::workflow::{SharedBag, StepContext, WorkflowStep};
use dh_engine::{CallContext, ToolHandler};
use dh_session::Stage;
use std::sync::Arc;

fn default_max_critical() -> u32 {
    0
}

fn default_max_high() -> u32 {
    5
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ScanImageArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub image_ref: String,
    #[serde(default = "default_max_critical")]
    pub max_critical: u32,
    #[serde(default = "default_max_high")]
    pub max_high: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanImageResult {
    pub summary: VulnerabilitySummary,
    pub passed: bool,
}

pub async fn scan_image_core<C: Clock>(
    ctx: &ToolContext<C>,
    session_id: SessionId,
    image_ref: &str,
    max_critical: u32,
    max_high: u32,
    dry_run: bool,
) -> ToolResult<ScanImageResult> {
    let summary = if dry_run {
        VulnerabilitySummary::default()
    } else {
        let scanner = ctx.scanner.clone();
        let reference = image_ref.to_string();
        ctx.breakers
            .guard(Capability::Scanner.breaker_name(), || async move { scanner.scan(&reference).await })
            .await?
    };

    if summary.exceeds(max_critical, max_high) {
        return Err(ToolError::new(
            ErrorKind::ValidationFailed,
            format!("image '{image_ref}' exceeds vulnerability thresholds"),
        )
        .stage(Stage::Scan.as_str())
        .with_context("critical", summary.critical.to_string())
        .with_context("high", summary.high.to_string()));
    }

    if !dry_run {
        ctx.mark_stage_done(session_id.as_str(), Stage::Scan)?;
    }

    Ok(ScanImageResult { summary, passed: true })
}

pub struct ScanImageHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> ScanImageHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for ScanImageHandler<C> {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: ScanImageArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let result = scan_image_core(
            &self.ctx,
            session_id,
            &args.image_ref,
            args.max_critical,
            args.max_high,
            args.base.dry_run,
        )
        .await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }
}

pub struct ScanImageStep<C: Clock> {
    ctx: Arc<ToolContext<C>>,
    session_id: SessionId,
    max_critical: u32,
    max_high: u32,
    dry_run: bool,
}

impl<C: Clock> ScanImageStep<C> {
    pub fn new(ctx: Arc<ToolContext<C>>, session_id: SessionId, max_critical: u32, max_high: u32, dry_run: bool) -> Self {
        Self { ctx, session_id, max_critical, max_high, dry_run }
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkflowStep for ScanImageStep<C> {
    fn name(&self) -> &str {
        "scan"
    }

    async fn execute(&self, _step: &StepContext, shared: &mut SharedBag) -> ToolResult<serde_json::Value> {
        let image_ref = shared
            .get("build")
            .and_then(|v| v.get("image_ref"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let result =
            scan_image_core(&self.ctx, self.session_id, &image_ref, self.max_critical, self.max_high, self.dry_run)
                .await?;
        let value = serde_json::to_value(&result).unwrap_or_default();
        shared.insert("scan".to_string(), value.clone());
        Ok(value)
    }

    async fn compensate(&self, _step: &StepContext, _shared: &mut SharedBag) -> ToolResult<()> {
        Ok(())
    }

    /// Scanning has no side effect to undo.
    fn can_compensate(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "scan_image_tests.rs"]
mod tests;
