// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle: create, find, update, delete, and periodically
//! sweep expired sessions. Lock order is always global table, then the
//! single session being touched (spec §4.2, §5).

use crate::session::Session;
use crate::store::SessionStore;
use crate::workspace::SharedWorkspaceManager;
use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError};
use dh_core::ids::SessionId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct SessionManagerConfig {
    pub max_active_sessions: usize,
    pub ttl_ms: u64,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self { max_active_sessions: 256, ttl_ms: 30 * 60 * 1000 }
    }
}

pub struct SessionManager<C: Clock> {
    clock: C,
    config: SessionManagerConfig,
    table: Mutex<HashMap<SessionId, Arc<RwLock<Session>>>>,
    workspaces: SharedWorkspaceManager,
    store: Arc<SessionStore>,
}

impl<C: Clock> SessionManager<C> {
    pub fn new(
        clock: C,
        config: SessionManagerConfig,
        workspaces: SharedWorkspaceManager,
        store: Arc<SessionStore>,
    ) -> Self {
        Self { clock, config, table: Mutex::new(HashMap::new()), workspaces, store }
    }

    /// If `id` is empty, allocate a fresh opaque id; otherwise adopt the
    /// supplied id, creating the session (and its workspace) if it does
    /// not already exist.
    pub fn get_or_create(&self, id: &str) -> Result<Arc<RwLock<Session>>, ToolError> {
        let id = if id.is_empty() { SessionId::new() } else { SessionId::from_string(id) };

        let mut table = self.table.lock();
        if let Some(existing) = table.get(&id) {
            return Ok(existing.clone());
        }
        if table.len() >= self.config.max_active_sessions {
            return Err(ToolError::new(
                ErrorKind::SessionCapacityExhausted,
                "active session capacity reached",
            ));
        }

        let now = self.clock.epoch_ms();
        let (workspace_id, _path) = self.workspaces.new_workspace(id)?;
        let session = Session::new(id, workspace_id, now, self.config.ttl_ms);
        self.store.save(&session)?;
        let handle = Arc::new(RwLock::new(session));
        table.insert(id, handle.clone());
        Ok(handle)
    }

    pub fn get(&self, id: &str) -> Result<Arc<RwLock<Session>>, ToolError> {
        let id = SessionId::from_string(id);
        self.table
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| ToolError::new(ErrorKind::SessionNotFound, format!("no session '{id}'")))
    }

    /// Acquire the per-session lock, call `f` with a mutable view, persist,
    /// and commit. No lock is held across the persistence I/O below —
    /// the write happens after `f` returns and the write guard is dropped.
    pub fn update<F, T>(&self, id: &str, f: F) -> Result<T, ToolError>
    where
        F: FnOnce(&mut Session) -> Result<T, ToolError>,
    {
        let handle = self.get(id)?;
        let now = self.clock.epoch_ms();
        let (result, snapshot) = {
            let mut session = handle.write();
            session.touch(now, self.config.ttl_ms);
            let result = f(&mut session)?;
            (result, session.clone())
        };
        self.store.save(&snapshot)?;
        Ok(result)
    }

    /// Remove the session and destroy its workspace synchronously.
    /// Idempotent: deleting an unknown id is not an error.
    pub fn delete(&self, id: &str) -> Result<(), ToolError> {
        let session_id = SessionId::from_string(id);
        let removed = self.table.lock().remove(&session_id);
        if let Some(handle) = removed {
            let workspace_id = handle.read().workspace_id;
            self.workspaces.delete(workspace_id);
        }
        self.store.delete(session_id)?;
        Ok(())
    }

    /// Evict every session whose expiry is past `now`.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.epoch_ms();
        let expired: Vec<SessionId> = {
            let table = self.table.lock();
            table
                .iter()
                .filter(|(_, handle)| handle.read().is_expired(now))
                .map(|(id, _)| *id)
                .collect()
        };
        for id in &expired {
            let _ = self.delete(id.as_str());
        }
        expired.len()
    }

    pub fn active_count(&self) -> usize {
        self.table.lock().len()
    }

    pub fn list_ids(&self) -> Vec<SessionId> {
        self.table.lock().keys().copied().collect()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
