// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dh_core::clock::FakeClock;
use dh_core::error::ErrorKind;

fn config() -> BreakerConfig {
    BreakerConfig {
        threshold: 3,
        window: Duration::from_secs(10),
        initial_cooldown: Duration::from_millis(100),
        max_cooldown: Duration::from_secs(5),
    }
}

#[test]
fn closed_breaker_permits_calls() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new("push", config(), clock);
    let permit = breaker.try_acquire().unwrap();
    permit.record_success();
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[test]
fn three_failures_open_the_breaker() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new("push", config(), clock);
    for _ in 0..3 {
        let permit = breaker.try_acquire().unwrap();
        permit.record_failure();
    }
    assert_eq!(breaker.state(), BreakerState::Open);
}

#[test]
fn open_breaker_rejects_with_circuit_open() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new("push", config(), clock);
    for _ in 0..3 {
        breaker.try_acquire().unwrap().record_failure();
    }
    let err = breaker.try_acquire().unwrap_err();
    assert_eq!(err.kind, ErrorKind::CircuitOpen);
    assert!(err.context.contains_key("next_retry_ms"));
}

#[test]
fn after_cooldown_half_open_trial_is_permitted() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new("push", config(), clock.clone());
    for _ in 0..3 {
        breaker.try_acquire().unwrap().record_failure();
    }
    assert!(breaker.try_acquire().is_err());

    clock.advance(Duration::from_millis(120));
    let permit = breaker.try_acquire().expect("trial permitted after cooldown");
    assert!(permit.is_half_open_trial());
    permit.record_success();
    assert_eq!(breaker.state(), BreakerState::Closed);
}

#[test]
fn half_open_failure_reopens_with_doubled_cooldown() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new("push", config(), clock.clone());
    for _ in 0..3 {
        breaker.try_acquire().unwrap().record_failure();
    }
    clock.advance(Duration::from_millis(120));
    breaker.try_acquire().unwrap().record_failure();
    assert_eq!(breaker.state(), BreakerState::Open);

    // Original cooldown was 100ms; after doubling it should not yet permit at 150ms.
    clock.advance(Duration::from_millis(150));
    assert!(breaker.try_acquire().is_err());

    clock.advance(Duration::from_millis(100));
    assert!(breaker.try_acquire().is_ok());
}

#[tokio::test]
async fn registry_guard_records_outcomes_per_capability() {
    let clock = FakeClock::new();
    let registry = BreakerRegistry::new(clock, config());

    for _ in 0..3 {
        let _: Result<(), ToolError> = registry
            .guard("registry", || async { Err(ToolError::new(ErrorKind::CapabilityFailure, "push failed")) })
            .await;
    }
    let breaker = registry.get_or_create("registry");
    assert_eq!(breaker.state(), BreakerState::Open);

    // A different capability is unaffected.
    let other = registry.get_or_create("scanner");
    assert_eq!(other.state(), BreakerState::Closed);
}

#[test]
fn half_open_rejects_concurrent_second_trial() {
    let clock = FakeClock::new();
    let breaker = CircuitBreaker::new("push", config(), clock.clone());
    for _ in 0..3 {
        breaker.try_acquire().unwrap().record_failure();
    }
    clock.advance(Duration::from_millis(120));
    let _first_trial = breaker.try_acquire().expect("first trial permitted");
    let second = breaker.try_acquire();
    assert!(second.is_err());
}
