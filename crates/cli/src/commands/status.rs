// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use dh_wire::{Method, ServerStatusBody};

pub async fn run(client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    let result = client.call(Method::ServerStatus).await?;
    let body: ServerStatusBody = serde_json::from_value(result)?;
    format_or_json(format, &body, || {
        let health = if body.healthy { "healthy" } else { "unhealthy" };
        println!("dockhandd {}  ({})", body.version, crate::color::header(health));
        println!("uptime          {}s", body.uptime_seconds);
        println!("active sessions {}", body.active_sessions);
        println!("queued jobs     {}", body.queued_jobs);
        println!("running jobs    {}", body.running_jobs);
    })
}
