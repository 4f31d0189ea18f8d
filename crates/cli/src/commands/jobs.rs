// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};
use clap::Subcommand;
use dh_wire::{JobStatusBody, Method};

#[derive(Subcommand)]
pub enum JobsCommand {
    /// Show a job's status, and its result or error once it has finished.
    Status { job_id: String },
}

pub async fn run(command: JobsCommand, client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        JobsCommand::Status { job_id } => status(job_id, client, format).await,
    }
}

async fn status(job_id: String, client: &DaemonClient, format: OutputFormat) -> anyhow::Result<()> {
    let result = client.call(Method::JobsStatus { job_id }).await?;
    let body: JobStatusBody = serde_json::from_value(result)?;
    format_or_json(format, &body, || {
        println!("job {}  {}", crate::color::header(&body.job_id), body.status);
        println!("tool       {}", body.tool_name);
        if let Some(result) = &body.result {
            println!("result     {}", result);
        }
        if let Some(err) = &body.error {
            println!("error      [{}] {}", err.code, err.message);
        }
    })
}
