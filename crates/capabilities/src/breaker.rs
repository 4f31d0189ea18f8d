// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-capability circuit breakers.
//!
//! Each breaker observes a count-within-window model of outcomes and
//! moves through `Closed -> Open -> HalfOpen -> {Closed, Open}`. Every
//! breaker owns its own mutex; there is no global breaker lock (§5).

use dh_core::clock::Clock;
use dh_core::error::{ErrorKind, ToolError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Tuning knobs for one breaker. Threshold and window define "too many
/// failures too fast"; cooldowns define how long Open holds before a
/// trial call is allowed.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub threshold: u32,
    pub window: Duration,
    pub initial_cooldown: Duration,
    pub max_cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            window: Duration::from_secs(10),
            initial_cooldown: Duration::from_millis(500),
            max_cooldown: Duration::from_secs(30),
        }
    }
}

struct Inner {
    config: BreakerConfig,
    state: BreakerState,
    failures: VecDeque<Instant>,
    current_cooldown: Duration,
    opened_at: Option<Instant>,
    half_open_in_flight: bool,
}

impl Inner {
    fn new(config: BreakerConfig) -> Self {
        let initial_cooldown = config.initial_cooldown;
        Self {
            config,
            state: BreakerState::Closed,
            failures: VecDeque::new(),
            current_cooldown: initial_cooldown,
            opened_at: None,
            half_open_in_flight: false,
        }
    }

    fn prune(&mut self, now: Instant) {
        let window = self.config.window;
        while let Some(&front) = self.failures.front() {
            if now.duration_since(front) > window {
                self.failures.pop_front();
            } else {
                break;
            }
        }
    }

    fn next_retry(&self, now: Instant) -> Instant {
        self.opened_at.unwrap_or(now) + self.current_cooldown
    }
}

/// A single named circuit breaker, generic over the clock so tests can
/// drive time deterministically with `FakeClock`.
pub struct CircuitBreaker<C: Clock> {
    name: String,
    clock: C,
    inner: Mutex<Inner>,
}

/// Permit to execute a guarded call. Call [`Permit::record_success`] or
/// [`Permit::record_failure`] exactly once after the call completes.
pub struct Permit<'a, C: Clock> {
    breaker: &'a CircuitBreaker<C>,
    is_half_open_trial: bool,
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn new(name: impl Into<String>, config: BreakerConfig, clock: C) -> Self {
        Self { name: name.into(), clock, inner: Mutex::new(Inner::new(config)) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Ask whether a call may proceed right now. Returns a [`Permit`] on
    /// success, or a `CircuitOpen` [`ToolError`] carrying the next-retry
    /// timestamp (epoch ms) in its context.
    pub fn try_acquire(&self) -> Result<Permit<'_, C>, ToolError> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.prune(now);

        match inner.state {
            BreakerState::Closed => Ok(Permit { breaker: self, is_half_open_trial: false }),
            BreakerState::Open => {
                if now >= inner.next_retry(now) {
                    inner.state = BreakerState::HalfOpen;
                    inner.half_open_in_flight = true;
                    Ok(Permit { breaker: self, is_half_open_trial: true })
                } else {
                    let next_retry_ms =
                        self.clock.epoch_ms() + inner.next_retry(now).saturating_duration_since(now).as_millis() as u64;
                    Err(ToolError::new(
                        ErrorKind::CircuitOpen,
                        format!("capability '{}' is open", self.name),
                    )
                    .with_context("capability", self.name.clone())
                    .with_context("next_retry_ms", next_retry_ms.to_string()))
                }
            }
            BreakerState::HalfOpen => {
                if inner.half_open_in_flight {
                    let next_retry_ms = self.clock.epoch_ms();
                    Err(ToolError::new(
                        ErrorKind::CircuitOpen,
                        format!("capability '{}' has a half-open trial already in flight", self.name),
                    )
                    .with_context("capability", self.name.clone())
                    .with_context("next_retry_ms", next_retry_ms.to_string()))
                } else {
                    inner.half_open_in_flight = true;
                    Ok(Permit { breaker: self, is_half_open_trial: true })
                }
            }
        }
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock();
        inner.failures.clear();
        inner.state = BreakerState::Closed;
        inner.current_cooldown = inner.config.initial_cooldown;
        inner.opened_at = None;
        inner.half_open_in_flight = false;
    }

    fn on_failure(&self) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.failures.push_back(now);
                inner.prune(now);
                if inner.failures.len() as u32 >= inner.config.threshold {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(now);
                }
            }
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(now);
                inner.half_open_in_flight = false;
                inner.current_cooldown =
                    (inner.current_cooldown * 2).min(inner.config.max_cooldown);
                inner.failures.clear();
            }
            BreakerState::Open => {}
        }
    }
}

impl<C: Clock> Permit<'_, C> {
    pub fn record_success(self) {
        self.breaker.on_success();
    }

    pub fn record_failure(self) {
        self.breaker.on_failure();
    }

    pub fn is_half_open_trial(&self) -> bool {
        self.is_half_open_trial
    }
}

/// Per-capability breaker table. One mutex per breaker, never a global
/// lock across breakers (§5).
pub struct BreakerRegistry<C: Clock> {
    clock: C,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker<C>>>>,
    default_config: BreakerConfig,
}

impl<C: Clock> BreakerRegistry<C> {
    pub fn new(clock: C, default_config: BreakerConfig) -> Self {
        Self { clock, breakers: Mutex::new(HashMap::new()), default_config }
    }

    /// Fetch the breaker for `capability`, creating it with the registry's
    /// default configuration if it does not exist yet.
    pub fn get_or_create(&self, capability: &str) -> Arc<CircuitBreaker<C>> {
        self.get_or_create_with(capability, self.default_config)
    }

    pub fn get_or_create_with(&self, capability: &str, config: BreakerConfig) -> Arc<CircuitBreaker<C>> {
        let mut table = self.breakers.lock();
        table
            .entry(capability.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(capability, config, self.clock.clone())))
            .clone()
    }

    /// Run `call` through the named capability's breaker, recording the
    /// outcome automatically.
    pub async fn guard<F, Fut, T>(&self, capability: &str, call: F) -> Result<T, ToolError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ToolError>>,
    {
        let breaker = self.get_or_create(capability);
        let permit = breaker.try_acquire()?;
        match call().await {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(err) => {
                permit.record_failure();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
