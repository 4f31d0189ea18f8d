// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe on-disk persistence for sessions: one JSON document per
//! session, written via a temp file in the same directory followed by an
//! atomic rename (spec §4.10, §6).

use crate::session::Session;
use dh_core::error::{ErrorKind, ToolError};
use dh_core::ids::SessionId;
use std::path::PathBuf;

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, ToolError> {
        let dir = base_dir.into().join("sessions");
        std::fs::create_dir_all(&dir).map_err(|e| {
            ToolError::new(ErrorKind::InternalError, "failed to create session store directory").with_cause(e)
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }

    pub fn save(&self, session: &Session) -> Result<(), ToolError> {
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| ToolError::new(ErrorKind::InternalError, "failed to serialize session").with_cause(e))?;

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| {
            ToolError::new(ErrorKind::InternalError, "failed to create session store temp file").with_cause(e)
        })?;
        use std::io::Write;
        temp.write_all(&json).map_err(|e| {
            ToolError::new(ErrorKind::InternalError, "failed to write session store temp file").with_cause(e)
        })?;
        temp.persist(self.path_for(session.id))
            .map_err(|e| ToolError::new(ErrorKind::InternalError, "failed to persist session file").with_cause(e.error))?;
        Ok(())
    }

    pub fn load(&self, id: SessionId) -> Result<Option<Session>, ToolError> {
        let path = self.path_for(id);
        match std::fs::read(&path) {
            Ok(bytes) => {
                let session = serde_json::from_slice(&bytes).map_err(|e| {
                    ToolError::new(ErrorKind::InternalError, "failed to parse session file").with_cause(e)
                })?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ToolError::new(ErrorKind::InternalError, "failed to read session file").with_cause(e)),
        }
    }

    pub fn delete(&self, id: SessionId) -> Result<(), ToolError> {
        match std::fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ToolError::new(ErrorKind::InternalError, "failed to delete session file").with_cause(e)),
        }
    }

    /// Every session id with a persisted document, used by `Cleanup` to
    /// sweep entries the in-memory table has already evicted.
    pub fn list_ids(&self) -> Result<Vec<SessionId>, ToolError> {
        let mut ids = Vec::new();
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            ToolError::new(ErrorKind::InternalError, "failed to list session store directory").with_cause(e)
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                ToolError::new(ErrorKind::InternalError, "failed to read session store entry").with_cause(e)
            })?;
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                ids.push(SessionId::from_string(stem));
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
