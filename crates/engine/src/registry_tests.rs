// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::descriptor::{CallContext, ToolHandler};
use async_trait::async_trait;
use std::sync::Arc;

struct EchoHandler;

#[async_trait]
impl ToolHandler for EchoHandler {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        Ok(args)
    }
}

fn descriptor(name: &str) -> ToolDescriptor {
    ToolDescriptor::new(name, "test", Arc::new(EchoHandler))
}

#[test]
fn register_then_lookup_succeeds() {
    let registry = ToolRegistry::new();
    registry.register(descriptor("echo")).unwrap();
    assert_eq!(registry.lookup("echo").unwrap().name, "echo");
}

#[test]
fn duplicate_registration_fails() {
    let registry = ToolRegistry::new();
    registry.register(descriptor("echo")).unwrap();
    let err = registry.register(descriptor("echo")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ToolAlreadyRegistered);
}

#[test]
fn lookup_missing_tool_fails() {
    let registry = ToolRegistry::new();
    let err = registry.lookup("missing").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ToolNotFound);
}

#[test]
fn registration_after_freeze_fails() {
    let registry = ToolRegistry::new();
    registry.freeze();
    let err = registry.register(descriptor("echo")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
}

#[test]
fn export_schemas_lists_every_registered_tool() {
    let registry = ToolRegistry::new();
    registry.register(descriptor("a")).unwrap();
    registry.register(descriptor("b")).unwrap();
    assert_eq!(registry.export_schemas().len(), 2);
}
