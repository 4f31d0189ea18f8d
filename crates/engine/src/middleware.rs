// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed middleware chain every tool call runs through (§4.3):
//! Recovery, context enrichment, timeout, logging, validation, error
//! translation, telemetry — applied outermost to innermost in that
//! order.

use crate::descriptor::{CallContext, ToolDescriptor};
use crate::registry::ToolRegistry;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use dh_core::id::IdGen;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct ToolMetrics {
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_latency_ms: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

impl ToolMetrics {
    fn record(&mut self, success: bool, latency_ms: u64, bytes_in: u64, bytes_out: u64) {
        self.invocations += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_latency_ms += latency_ms;
        self.bytes_in += bytes_in;
        self.bytes_out += bytes_out;
    }
}

#[derive(Default)]
struct Telemetry {
    by_tool: Mutex<HashMap<String, ToolMetrics>>,
}

impl Telemetry {
    fn record(&self, tool: &str, success: bool, latency_ms: u64, bytes_in: u64, bytes_out: u64) {
        self.by_tool.lock().entry(tool.to_string()).or_default().record(success, latency_ms, bytes_in, bytes_out);
    }

    fn snapshot(&self, tool: &str) -> Option<ToolMetrics> {
        self.by_tool.lock().get(tool).cloned()
    }
}

/// Wraps a `ToolRegistry` with the middleware chain. One dispatcher per
/// server process; cheap to clone (everything behind an `Arc`).
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    telemetry: Arc<Telemetry>,
    request_ids: Arc<dyn IdGen>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_id_gen(registry, Arc::new(dh_core::id::UuidIdGen))
    }

    pub fn with_id_gen(registry: Arc<ToolRegistry>, request_ids: Arc<dyn IdGen>) -> Self {
        Self { registry, telemetry: Arc::new(Telemetry::default()), request_ids }
    }

    pub fn metrics(&self, tool: &str) -> Option<ToolMetrics> {
        self.telemetry.snapshot(tool)
    }

    /// Runs `tool` with `args` through the full middleware chain.
    pub async fn dispatch(&self, mut ctx: CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        // 1. Context enrichment: fill in anything the caller omitted.
        if ctx.request_id.is_empty() {
            ctx.request_id = self.request_ids.next();
        }

        let descriptor = self.registry.lookup(&ctx.tool_name)?;
        let bytes_in = estimate_size(&args);

        // 2. Recovery: run the rest of the chain on its own task so a
        // panic there surfaces as a JoinError we translate, not an
        // unwind that tears down the caller.
        let telemetry = Arc::clone(&self.telemetry);
        let tool_name = ctx.tool_name.clone();
        let start = Instant::now();
        let join_result = tokio::spawn(run_inner(descriptor, ctx, args)).await;

        let outcome = match join_result {
            Ok(result) => result,
            Err(join_err) => {
                let message = if join_err.is_panic() { "tool handler panicked" } else { "tool handler task was cancelled" };
                Err(ToolError::new(ErrorKind::InternalError, message).tool(tool_name.clone()))
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        let bytes_out = outcome.as_ref().map(estimate_size).unwrap_or(0);
        let success = outcome.is_ok();

        match &outcome {
            Ok(_) => tracing::info!(tool = %tool_name, elapsed_ms, success, "tool call completed"),
            Err(e) => tracing::error!(tool = %tool_name, elapsed_ms, success, error = %e, "tool call failed"),
        }

        // 7. Telemetry.
        telemetry.record(&tool_name, success, elapsed_ms, bytes_in, bytes_out);

        outcome
    }
}

/// 3. Timeout, 4. (inner) logging hook, 5. Validation, 6. Error
/// translation, then the handler body itself.
async fn run_inner(descriptor: ToolDescriptor, ctx: CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
    let call = async {
        descriptor.handler.validate(&args).map_err(|e| e.tool(descriptor.name.clone()))?;
        descriptor.handler.call(&ctx, args).await
    };

    match tokio::time::timeout(descriptor.timeout, call).await {
        Ok(result) => result.map_err(|e| translate(e, &descriptor.name)),
        Err(_) => Err(ToolError::new(ErrorKind::TimedOut, format!("tool '{}' exceeded its timeout", descriptor.name))
            .tool(descriptor.name.clone())
            .retryable(true)),
    }
}

/// Error translation: handlers are expected to return `ToolError`
/// already, but context is stamped on regardless so nothing crosses the
/// boundary without a `tool` field.
fn translate(err: ToolError, tool: &str) -> ToolError {
    if err.tool.is_some() {
        err
    } else {
        err.tool(tool.to_string())
    }
}

fn estimate_size(value: &serde_json::Value) -> u64 {
    serde_json::to_vec(value).map(|bytes| bytes.len() as u64).unwrap_or(0)
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
