// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chat`: a free-form conversational entry point, outside the
//! containerize-and-deploy stage pipeline. Validates a non-empty message
//! and records it against the session's history so later tool calls in
//! the same session can be explained in context.

use crate::common::{parse_args, BaseArgs, ToolContext};
use async_trait::async_trait;
use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use dh_engine::{CallContext, ToolHandler};
use std::sync::Arc;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChatArgs {
    #[serde(flatten)]
    pub base: BaseArgs,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChatResult {
    pub reply: String,
}

pub async fn chat_core<C: Clock>(ctx: &ToolContext<C>, session_id: &str, message: &str) -> ToolResult<ChatResult> {
    if message.trim().is_empty() {
        return Err(ToolError::new(ErrorKind::InvalidArguments, "message must not be empty"));
    }

    let reply = format!("received: {message}");
    ctx.sessions.update(session_id, |session| {
        session.metadata.insert("last_chat_message".to_string(), message.to_string());
    })?;

    Ok(ChatResult { reply })
}

pub struct ChatHandler<C: Clock> {
    ctx: Arc<ToolContext<C>>,
}

impl<C: Clock> ChatHandler<C> {
    pub fn new(ctx: Arc<ToolContext<C>>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl<C: Clock + 'static> ToolHandler for ChatHandler<C> {
    async fn call(&self, _ctx: &CallContext, args: serde_json::Value) -> ToolResult<serde_json::Value> {
        let args: ChatArgs = parse_args(&args)?;
        let session = self.ctx.resolve_session(&args.base.session_id)?;
        let session_id = session.read().id;
        let result = chat_core(&self.ctx, session_id.as_str(), &args.message).await?;
        Ok(serde_json::to_value(result).unwrap_or_default())
    }

    fn validate(&self, args: &serde_json::Value) -> ToolResult<()> {
        match args.get("message").and_then(|v| v.as_str()) {
            Some(message) if !message.trim().is_empty() => Ok(()),
            _ => Err(ToolError::new(ErrorKind::InvalidArguments, "message must be a non-empty string")),
        }
    }
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
