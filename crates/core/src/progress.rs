// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage-weighted progress events streamed back through the transport.
//!
//! Each run owns a [`ProgressSink`] configured with an ordered list of
//! [`Stage`]s. Weights are advisory and need not sum to 1 — the sink
//! renormalizes at delivery. Events are dropped oldest-first when the
//! consumer lags, since progress is advisory, never authoritative.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// One logical phase of a run, used for progress weighting.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub weight: f64,
    pub description: String,
}

impl Stage {
    pub fn new(name: impl Into<String>, weight: f64, description: impl Into<String>) -> Self {
        Self { name: name.into(), weight, description: description.into() }
    }
}

/// A single progress report, already renormalized to `[0, 1]`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProgressEvent {
    pub seq: u64,
    pub stage_index: usize,
    pub stage_name: String,
    pub stage_fraction: f64,
    pub overall_fraction: f64,
    pub message: String,
}

struct SinkState {
    stages: Vec<Stage>,
    total_weight: f64,
    queue: Mutex<VecDeque<ProgressEvent>>,
    capacity: usize,
    notify: Notify,
    seq: AtomicU64,
    last_overall: Mutex<f64>,
    cancelled: AtomicBool,
}

/// Producer half: handlers and the workflow engine call [`ProgressSink::report`].
#[derive(Clone)]
pub struct ProgressSink {
    state: Arc<SinkState>,
}

/// Consumer half: the transport adapter drains events to forward to the client.
pub struct ProgressReceiver {
    state: Arc<SinkState>,
}

/// Bounded channel capacity before the oldest queued event is dropped.
pub const DEFAULT_CAPACITY: usize = 256;

impl ProgressSink {
    pub fn new(stages: Vec<Stage>) -> (Self, ProgressReceiver) {
        Self::with_capacity(stages, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(stages: Vec<Stage>, capacity: usize) -> (Self, ProgressReceiver) {
        let total_weight: f64 = stages.iter().map(|s| s.weight).sum();
        let state = Arc::new(SinkState {
            stages,
            total_weight: if total_weight > 0.0 { total_weight } else { 1.0 },
            queue: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            notify: Notify::new(),
            seq: AtomicU64::new(0),
            last_overall: Mutex::new(0.0),
            cancelled: AtomicBool::new(false),
        });
        (Self { state: state.clone() }, ProgressReceiver { state })
    }

    /// Report progress within `stage_index`, `stage_fraction` in `[0, 1]`.
    ///
    /// Ignored once the sink is cancelled. The overall fraction is the
    /// weighted sum of completed stages plus the partial weight of the
    /// current stage, renormalized by total weight, and clamped to be
    /// non-decreasing within this run (spec §3, §8 property 7).
    pub fn report(&self, stage_index: usize, stage_fraction: f64, message: impl Into<String>) {
        if self.state.cancelled.load(Ordering::Acquire) {
            return;
        }
        let stage_fraction = stage_fraction.clamp(0.0, 1.0);
        let completed_weight: f64 =
            self.state.stages.iter().take(stage_index).map(|s| s.weight).sum();
        let current_weight = self.state.stages.get(stage_index).map(|s| s.weight).unwrap_or(0.0);
        let raw = (completed_weight + current_weight * stage_fraction) / self.state.total_weight;
        let raw = raw.clamp(0.0, 1.0);

        let mut last = self.state.last_overall.lock();
        let overall = raw.max(*last);
        *last = overall;
        drop(last);

        let stage_name =
            self.state.stages.get(stage_index).map(|s| s.name.clone()).unwrap_or_default();
        let event = ProgressEvent {
            seq: self.state.seq.fetch_add(1, Ordering::Relaxed),
            stage_index,
            stage_name,
            stage_fraction,
            overall_fraction: overall,
            message: message.into(),
        };

        let mut queue = self.state.queue.lock();
        if queue.len() >= self.state.capacity {
            queue.pop_front();
        }
        queue.push_back(event);
        drop(queue);
        self.state.notify.notify_one();
    }

    /// Close the sink; subsequent `report` calls become no-ops.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.state.stages
    }
}

impl ProgressReceiver {
    /// Await the next event, or `None` once the sink is cancelled and drained.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            if let Some(event) = self.state.queue.lock().pop_front() {
                return Some(event);
            }
            if self.state.cancelled.load(Ordering::Acquire) {
                return None;
            }
            self.state.notify.notified().await;
        }
    }

    /// Drain everything currently queued without awaiting new events.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        self.state.queue.lock().drain(..).collect()
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
