// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scanner capability: vulnerability scanning of a built image.

use async_trait::async_trait;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use tokio::process::Command;

/// Severity counts from a scan, consumed by the `scan_image` tool to
/// decide whether the pipeline continues or halts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VulnerabilitySummary {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl VulnerabilitySummary {
    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }

    pub fn exceeds(&self, max_critical: u32, max_high: u32) -> bool {
        self.critical > max_critical || self.high > max_high
    }
}

#[async_trait]
pub trait ScannerAdapter: Send + Sync {
    async fn scan(&self, image_ref: &str) -> ToolResult<VulnerabilitySummary>;
}

/// Shells out to a Trivy-compatible scanner CLI and parses its JSON
/// severity counts, following the same `tokio::process::Command` pattern
/// as [`super::container_runtime::LocalDockerAdapter`].
pub struct CliScannerAdapter {
    binary: String,
}

impl CliScannerAdapter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn trivy() -> Self {
        Self::new("trivy")
    }
}

#[async_trait]
impl ScannerAdapter for CliScannerAdapter {
    async fn scan(&self, image_ref: &str) -> ToolResult<VulnerabilitySummary> {
        let output = Command::new(&self.binary)
            .args(["image", "--format", "json", "--quiet", image_ref])
            .output()
            .await
            .map_err(|e| {
                ToolError::new(ErrorKind::CapabilityFailure, format!("failed to spawn {}", self.binary))
                    .with_cause(e)
            })?;
        if !output.status.success() {
            return Err(ToolError::new(
                ErrorKind::CapabilityFailure,
                format!("{} exited with {}", self.binary, output.status),
            )
            .with_context("stderr", String::from_utf8_lossy(&output.stderr).to_string()));
        }
        parse_trivy_json(&output.stdout)
    }
}

fn parse_trivy_json(bytes: &[u8]) -> ToolResult<VulnerabilitySummary> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| {
        ToolError::new(ErrorKind::CapabilityFailure, "scanner output was not valid JSON").with_cause(e)
    })?;

    let mut summary = VulnerabilitySummary::default();
    let results = value.get("Results").and_then(|r| r.as_array()).cloned().unwrap_or_default();
    for result in results {
        let vulns = result.get("Vulnerabilities").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        for vuln in vulns {
            match vuln.get("Severity").and_then(|s| s.as_str()) {
                Some("CRITICAL") => summary.critical += 1,
                Some("HIGH") => summary.high += 1,
                Some("MEDIUM") => summary.medium += 1,
                Some("LOW") => summary.low += 1,
                _ => {}
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
