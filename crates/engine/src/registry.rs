// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tool registry: single source of truth for available tools, frozen
//! once serving begins (§4.1).

use crate::descriptor::ToolDescriptor;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct ToolRegistry {
    descriptors: RwLock<HashMap<String, ToolDescriptor>>,
    frozen: AtomicBool,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, descriptor: ToolDescriptor) -> ToolResult<()> {
        if self.frozen.load(Ordering::Acquire) {
            return Err(ToolError::new(
                ErrorKind::InternalError,
                "cannot register a tool after the registry is frozen",
            )
            .tool(descriptor.name.clone()));
        }
        let mut descriptors = self.descriptors.write();
        if descriptors.contains_key(&descriptor.name) {
            return Err(ToolError::new(
                ErrorKind::ToolAlreadyRegistered,
                format!("tool '{}' is already registered", descriptor.name),
            ));
        }
        descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> ToolResult<ToolDescriptor> {
        self.descriptors
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::new(ErrorKind::ToolNotFound, format!("no tool named '{name}'")).tool(name))
    }

    /// Prevent further registration. Idempotent.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn schema(&self, name: &str) -> ToolResult<serde_json::Value> {
        Ok(self.lookup(name)?.schema_summary())
    }

    pub fn export_schemas(&self) -> Vec<serde_json::Value> {
        self.descriptors.read().values().map(ToolDescriptor::schema_summary).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
