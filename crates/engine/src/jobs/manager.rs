// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency execution of long-running tool invocations
//! (§4.4): a fixed worker pool pulls from a single FIFO bounded queue.

use super::job::{JobRecord, JobSpec, JobStatus};
use crate::middleware::Dispatcher;
use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError, ToolResult};
use dh_core::ids::JobId;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct JobManagerConfig {
    pub max_workers: usize,
    pub queue_capacity: usize,
    pub max_job_duration: Duration,
    pub job_ttl_ms: u64,
    pub shutdown_deadline: Duration,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            queue_capacity: 64,
            max_job_duration: Duration::from_secs(10 * 60),
            job_ttl_ms: 60 * 60 * 1000,
            shutdown_deadline: Duration::from_secs(30),
        }
    }
}

struct Shared {
    table: SyncMutex<HashMap<JobId, JobRecord>>,
    specs: SyncMutex<HashMap<JobId, JobSpec>>,
    cancels: SyncMutex<HashMap<JobId, CancellationToken>>,
    accepting: AtomicBool,
}

pub struct JobManager<C: Clock> {
    clock: C,
    config: JobManagerConfig,
    dispatcher: Arc<Dispatcher>,
    shared: Arc<Shared>,
    tx: mpsc::Sender<JobId>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl<C: Clock + 'static> JobManager<C> {
    pub fn new(dispatcher: Arc<Dispatcher>, clock: C, config: JobManagerConfig) -> Self {
        let (tx, rx) = mpsc::channel::<JobId>(config.queue_capacity);
        let rx = Arc::new(AsyncMutex::new(rx));
        let shared = Arc::new(Shared {
            table: SyncMutex::new(HashMap::new()),
            specs: SyncMutex::new(HashMap::new()),
            cancels: SyncMutex::new(HashMap::new()),
            accepting: AtomicBool::new(true),
        });

        let workers = (0..config.max_workers.max(1))
            .map(|worker_idx| {
                tokio::spawn(worker_loop(
                    worker_idx,
                    Arc::clone(&rx),
                    Arc::clone(&dispatcher),
                    clock.clone(),
                    Arc::clone(&shared),
                    config.max_job_duration,
                ))
            })
            .collect();

        Self { clock, config, dispatcher, shared, tx, workers }
    }

    /// Enqueue a job. Fails with `QueueFull` if the bounded queue is
    /// saturated, or if `Stop` has already been called.
    pub fn submit(&self, spec: JobSpec) -> ToolResult<JobId> {
        if !self.shared.accepting.load(Ordering::Acquire) {
            return Err(ToolError::new(ErrorKind::QueueFull, "job manager is shutting down and accepts no new work"));
        }

        let id = JobId::new();
        let now = self.clock.epoch_ms();
        let mut record = JobRecord::new(id, spec.ctx.tool_name.clone(), now);
        record.logs.push("queued");

        self.shared.table.lock().insert(id, record);
        self.shared.specs.lock().insert(id, spec);
        self.shared.cancels.lock().insert(id, CancellationToken::new());

        match self.tx.try_send(id) {
            Ok(()) => Ok(id),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.shared.table.lock().remove(&id);
                self.shared.specs.lock().remove(&id);
                self.shared.cancels.lock().remove(&id);
                Err(ToolError::new(ErrorKind::QueueFull, "job queue is saturated"))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.shared.table.lock().remove(&id);
                self.shared.specs.lock().remove(&id);
                self.shared.cancels.lock().remove(&id);
                Err(ToolError::new(ErrorKind::QueueFull, "job manager has stopped accepting work"))
            }
        }
    }

    pub fn get(&self, id: JobId) -> ToolResult<JobRecord> {
        self.shared
            .table
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| ToolError::new(ErrorKind::ToolNotFound, format!("no job '{id}'")))
    }

    /// Cooperative cancellation: the job transitions to `Cancelled` on its
    /// next suspension point, or immediately if still queued.
    pub fn cancel(&self, id: JobId) -> ToolResult<()> {
        let token = self
            .shared
            .cancels
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| ToolError::new(ErrorKind::ToolNotFound, format!("no job '{id}'")))?;
        token.cancel();
        Ok(())
    }

    /// Garbage-collect finished jobs older than `job_ttl_ms`.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.epoch_ms();
        let ttl = self.config.job_ttl_ms;
        let mut table = self.shared.table.lock();
        let expired: Vec<JobId> = table
            .iter()
            .filter(|(_, record)| {
                record.status.is_terminal()
                    && record.finished_at_ms.map(|finished| now.saturating_sub(finished) >= ttl).unwrap_or(false)
            })
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            table.remove(id);
            self.shared.cancels.lock().remove(id);
        }
        expired.len()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn queue_len(&self) -> usize {
        self.shared.table.lock().values().filter(|r| r.status == JobStatus::Queued).count()
    }

    pub fn running_len(&self) -> usize {
        self.shared.table.lock().values().filter(|r| r.status == JobStatus::Running).count()
    }

    /// Stop accepting new work, wait up to `shutdown_deadline` for
    /// in-flight jobs, then cancel whatever remains.
    pub async fn stop(mut self) {
        self.shared.accepting.store(false, Ordering::Release);
        drop(self.tx);

        let deadline = self.config.shutdown_deadline;
        let workers = std::mem::take(&mut self.workers);
        let join_all = futures_join_all(workers);
        if tokio::time::timeout(deadline, join_all).await.is_err() {
            tracing::warn!("job manager shutdown deadline elapsed; force-cancelling remaining jobs");
            for token in self.shared.cancels.lock().values() {
                token.cancel();
            }
        }
    }
}

async fn futures_join_all(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

async fn worker_loop<C: Clock>(
    _worker_idx: usize,
    rx: Arc<AsyncMutex<mpsc::Receiver<JobId>>>,
    dispatcher: Arc<Dispatcher>,
    clock: C,
    shared: Arc<Shared>,
    max_job_duration: Duration,
) {
    loop {
        let id = {
            let mut rx = rx.lock().await;
            match rx.recv().await {
                Some(id) => id,
                None => return,
            }
        };
        run_one(id, &dispatcher, &clock, &shared, max_job_duration).await;
    }
}

async fn run_one<C: Clock>(
    id: JobId,
    dispatcher: &Arc<Dispatcher>,
    clock: &C,
    shared: &Arc<Shared>,
    max_job_duration: Duration,
) {
    let token = shared.cancels.lock().get(&id).cloned();
    if token.as_ref().map(CancellationToken::is_cancelled).unwrap_or(false) {
        finish(shared, clock, id, JobStatus::Cancelled, None, None, "cancelled before it started");
        return;
    }

    let spec = match shared.specs.lock().remove(&id) {
        Some(spec) => spec,
        None => {
            finish(
                shared,
                clock,
                id,
                JobStatus::Failed,
                None,
                Some(ToolError::new(ErrorKind::InternalError, "job spec missing at execution time")),
                "spec missing",
            );
            return;
        }
    };

    {
        let mut table = shared.table.lock();
        if let Some(record) = table.get_mut(&id) {
            record.status = JobStatus::Running;
            record.started_at_ms = Some(clock.epoch_ms());
            record.logs.push("started");
        }
    }

    let effective_deadline = spec.deadline.map(|d| d.min(max_job_duration)).unwrap_or(max_job_duration);
    let tool_name = spec.ctx.tool_name.clone();
    let call_ctx = match &token {
        Some(t) => spec.ctx.with_cancel(t.clone()),
        None => spec.ctx,
    };
    let dispatch_fut = dispatcher.dispatch(call_ctx, spec.args);

    let cancelled = async {
        match &token {
            Some(t) => t.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancelled => {
            finish(shared, clock, id, JobStatus::Cancelled, None, None, "cancelled while running");
        }
        result = tokio::time::timeout(effective_deadline, dispatch_fut) => {
            match result {
                Ok(Ok(value)) => {
                    finish(shared, clock, id, JobStatus::Succeeded, Some(value), None, "completed");
                }
                Ok(Err(err)) => {
                    let message = format!("failed: {err}");
                    finish(shared, clock, id, JobStatus::Failed, None, Some(err), &message);
                }
                Err(_) => {
                    let err = ToolError::new(ErrorKind::TimedOut, format!("job for tool '{tool_name}' exceeded its deadline")).retryable(true);
                    finish(shared, clock, id, JobStatus::Failed, None, Some(err), "timed out");
                }
            }
        }
    }
}

fn finish<C: Clock>(
    shared: &Arc<Shared>,
    clock: &C,
    id: JobId,
    status: JobStatus,
    result: Option<serde_json::Value>,
    error: Option<ToolError>,
    log_line: &str,
) {
    shared.cancels.lock().remove(&id);
    let mut table = shared.table.lock();
    if let Some(record) = table.get_mut(&id) {
        record.status = status;
        record.finished_at_ms = Some(clock.epoch_ms());
        record.result = result;
        record.error = error;
        record.logs.push(log_line);
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
