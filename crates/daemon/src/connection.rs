// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection request/response loop: read a framed [`Request`],
//! dispatch it against the [`AppContext`], write back a framed
//! [`Response`]. One connection serves many requests sequentially
//! until the client disconnects.

use crate::app::AppContext;
use dh_core::error::ToolError;
use dh_core::ids::{JobId, SessionId};
use dh_engine::{CallContext, JobSpec};
use dh_session::Stage;
use dh_wire::{
    read_request, write_response, JobStatusBody, Method, ProtocolError, Request, Response,
    RpcError, ServerStatusBody, SessionDetail, SessionErrorEntry, SessionSummary, StageEntry,
    ToolListEntry,
};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

pub async fn serve<R, W>(mut reader: R, mut writer: W, app: Arc<AppContext>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let request = match read_request(&mut reader).await {
            Ok(request) => request,
            Err(ProtocolError::Io(_)) => {
                debug!("connection closed");
                return;
            }
            Err(err) => {
                warn!(%err, "failed to read request");
                return;
            }
        };

        let response = handle(&request, &app).await;
        if let Err(err) = write_response(&mut writer, &response).await {
            warn!(%err, "failed to write response");
            return;
        }
    }
}

async fn handle(request: &Request, app: &AppContext) -> Response {
    match dispatch(request, app).await {
        Ok(result) => Response::ok(request.id.clone(), result),
        Err(err) => Response::err(request.id.clone(), RpcError::from(&err)),
    }
}

async fn dispatch(request: &Request, app: &AppContext) -> Result<serde_json::Value, ToolError> {
    match &request.method {
        Method::ToolsList => {
            let entries: Vec<ToolListEntry> = app
                .registry
                .export_schemas()
                .into_iter()
                .map(|schema| ToolListEntry {
                    name: schema.get("name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    description: schema.get("category").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
                    parameters_schema: schema.clone(),
                    result_schema: serde_json::json!({}),
                })
                .collect();
            Ok(serde_json::to_value(entries).unwrap_or_default())
        }
        Method::ToolsCall { name, arguments, session_id } => {
            let ctx = CallContext::new(request.id.clone(), name.clone());
            let ctx = match session_id {
                Some(id) if !id.is_empty() => ctx.with_session(SessionId::from_string(id)),
                _ => ctx,
            };
            let spec = JobSpec { ctx, args: arguments.clone(), deadline: None };
            let job_id = app.jobs.submit(spec)?;
            let record = app.jobs.get(job_id)?;
            Ok(serde_json::json!({ "job_id": job_id.as_str(), "status": record.status.as_str() }))
        }
        Method::SessionsList => {
            let summaries: Vec<SessionSummary> = app
                .sessions
                .list_ids()
                .into_iter()
                .filter_map(|id| app.sessions.get(id.as_str()).ok())
                .map(|handle| {
                    let session = handle.read();
                    SessionSummary {
                        id: session.id.as_str().to_string(),
                        created_at_ms: session.created_at_ms,
                        updated_at_ms: session.updated_at_ms,
                        expires_at_ms: session.expires_at_ms,
                        stages_done: Stage::ORDER.iter().filter(|s| session.stages.is_done(**s)).count(),
                        error_count: session.errors.len(),
                    }
                })
                .collect();
            Ok(serde_json::to_value(summaries).unwrap_or_default())
        }
        Method::SessionsGet { id } => {
            let handle = app.sessions.get(id)?;
            let session = handle.read();
            let detail = SessionDetail {
                id: session.id.as_str().to_string(),
                created_at_ms: session.created_at_ms,
                updated_at_ms: session.updated_at_ms,
                expires_at_ms: session.expires_at_ms,
                workspace_id: session.workspace_id.as_str().to_string(),
                stages: Stage::ORDER
                    .iter()
                    .map(|stage| StageEntry { stage: stage.as_str().to_string(), done: session.stages.is_done(*stage) })
                    .collect(),
                errors: session
                    .errors
                    .iter()
                    .map(|e| SessionErrorEntry {
                        kind: e.kind.as_str().to_string(),
                        message: e.message.clone(),
                        stage: e.stage.clone(),
                        occurred_at_ms: e.occurred_at_ms,
                    })
                    .collect(),
            };
            Ok(serde_json::to_value(detail).unwrap_or_default())
        }
        Method::SessionsDelete { id } => {
            app.sessions.delete(id)?;
            Ok(serde_json::json!({}))
        }
        Method::JobsStatus { job_id } => {
            let record = app.jobs.get(JobId::from_string(job_id))?;
            let body = JobStatusBody {
                job_id: record.id.as_str().to_string(),
                tool_name: record.tool_name.clone(),
                status: record.status.as_str().to_string(),
                submitted_at_ms: record.submitted_at_ms,
                started_at_ms: record.started_at_ms,
                finished_at_ms: record.finished_at_ms,
                result: record.result.clone(),
                error: record.error.as_ref().map(RpcError::from),
            };
            Ok(serde_json::to_value(body).unwrap_or_default())
        }
        Method::ServerStatus => {
            let body = ServerStatusBody {
                healthy: true,
                version: env!("CARGO_PKG_VERSION").to_string(),
                uptime_seconds: app.started_at.elapsed().as_secs(),
                active_sessions: app.sessions.active_count(),
                queued_jobs: app.jobs.queue_len(),
                running_jobs: app.jobs.running_len(),
            };
            Ok(serde_json::to_value(body).unwrap_or_default())
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
