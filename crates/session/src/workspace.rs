// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandboxed, size-accounted workspace directories, one per session.

use dh_core::error::{ErrorKind, ToolError};
use dh_core::ids::{SessionId, WorkspaceId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub base_dir: PathBuf,
    pub per_session_cap_bytes: u64,
    pub global_cap_bytes: u64,
}

struct Accounting {
    per_session: HashMap<WorkspaceId, u64>,
    global_total: u64,
}

/// Creates, size-accounts, and removes workspace directories. Global size
/// state uses its own mutex, separate from any per-session lock the
/// session manager holds (spec §4.2, §5: "global -> per-session" order).
pub struct WorkspaceManager {
    config: WorkspaceConfig,
    accounting: Mutex<Accounting>,
}

impl WorkspaceManager {
    pub fn new(config: WorkspaceConfig) -> Self {
        Self { config, accounting: Mutex::new(Accounting { per_session: HashMap::new(), global_total: 0 }) }
    }

    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    fn path_for(&self, id: WorkspaceId) -> PathBuf {
        self.config.base_dir.join(id.as_str())
    }

    /// The workspace's root directory on disk. Tools that shell out to an
    /// external capability (the container runtime, a scanner CLI) need the
    /// real path, not just the sandboxed write API.
    pub fn path(&self, id: WorkspaceId) -> PathBuf {
        self.path_for(id)
    }

    /// Materialize a fresh workspace directory for `session_id`.
    pub fn new_workspace(&self, session_id: SessionId) -> Result<(WorkspaceId, PathBuf), ToolError> {
        let id = WorkspaceId::new();
        let path = self.path_for(id);
        std::fs::create_dir_all(&path).map_err(|e| {
            ToolError::new(ErrorKind::InternalError, "failed to create workspace directory")
                .with_cause(e)
                .session(session_id.as_str())
        })?;
        self.accounting.lock().per_session.insert(id, 0);
        Ok((id, path))
    }

    /// Validate that `candidate`, joined under this workspace's root,
    /// resolves inside the root (no `..` traversal, no symlink escape).
    pub fn resolve_within(&self, workspace_id: WorkspaceId, candidate: &Path) -> Result<PathBuf, ToolError> {
        let root = self.path_for(workspace_id);
        let joined = root.join(candidate);
        let canonical_root = std::fs::canonicalize(&root).unwrap_or(root.clone());
        // The candidate file may not exist yet (e.g. about to be written);
        // canonicalize its existing parent and re-attach the file name.
        let to_check = if joined.exists() {
            joined.clone()
        } else {
            let parent = joined.parent().unwrap_or(&root).to_path_buf();
            std::fs::create_dir_all(&parent).ok();
            let canonical_parent = std::fs::canonicalize(&parent).unwrap_or(parent);
            canonical_parent.join(joined.file_name().unwrap_or_default())
        };
        if !to_check.starts_with(&canonical_root) {
            return Err(ToolError::new(
                ErrorKind::ValidationFailed,
                "path escapes the workspace boundary",
            )
            .with_context("path", candidate.to_string_lossy().to_string()));
        }
        Ok(to_check)
    }

    /// Write `data` to `relative_path` inside `workspace_id`'s directory,
    /// enforcing per-session and global quotas. On quota failure, no
    /// partial file is left and the size counters are unchanged.
    pub fn write(
        &self,
        workspace_id: WorkspaceId,
        relative_path: &Path,
        data: &[u8],
    ) -> Result<(), ToolError> {
        let target = self.resolve_within(workspace_id, relative_path)?;
        let incoming = data.len() as u64;

        {
            let mut accounting = self.accounting.lock();
            let current = *accounting.per_session.get(&workspace_id).unwrap_or(&0);
            if current + incoming > self.config.per_session_cap_bytes {
                return Err(ToolError::new(ErrorKind::QuotaExceeded, "per-session workspace quota exceeded")
                    .with_context("workspace_id", workspace_id.as_str()));
            }
            if accounting.global_total + incoming > self.config.global_cap_bytes {
                return Err(ToolError::new(ErrorKind::QuotaExceeded, "global workspace quota exceeded"));
            }
            accounting.per_session.insert(workspace_id, current + incoming);
            accounting.global_total += incoming;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        if let Err(e) = std::fs::write(&target, data) {
            // Roll the reservation back; no partial file, no stale accounting.
            let mut accounting = self.accounting.lock();
            if let Some(current) = accounting.per_session.get_mut(&workspace_id) {
                *current = current.saturating_sub(incoming);
            }
            accounting.global_total = accounting.global_total.saturating_sub(incoming);
            return Err(ToolError::new(ErrorKind::InternalError, "failed to write workspace file").with_cause(e));
        }
        Ok(())
    }

    pub fn create_dir(&self, workspace_id: WorkspaceId, relative_path: &Path) -> Result<(), ToolError> {
        let target = self.resolve_within(workspace_id, relative_path)?;
        std::fs::create_dir_all(&target)
            .map_err(|e| ToolError::new(ErrorKind::InternalError, "failed to create directory").with_cause(e))
    }

    pub fn size_bytes(&self, workspace_id: WorkspaceId) -> u64 {
        *self.accounting.lock().per_session.get(&workspace_id).unwrap_or(&0)
    }

    /// Remove the workspace directory tree. Failures are logged but never
    /// block session deletion (spec §4.2).
    pub fn delete(&self, workspace_id: WorkspaceId) {
        let path = self.path_for(workspace_id);
        if let Err(e) = std::fs::remove_dir_all(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(workspace_id = %workspace_id, error = %e, "failed to remove workspace directory");
            }
        }
        let mut accounting = self.accounting.lock();
        if let Some(freed) = accounting.per_session.remove(&workspace_id) {
            accounting.global_total = accounting.global_total.saturating_sub(freed);
        }
    }
}

/// Shared handle, cloned into the session manager and into tool handlers.
pub type SharedWorkspaceManager = Arc<WorkspaceManager>;

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
