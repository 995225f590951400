//! Integration tests for the fixed-interval tick scheduler.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) to control time
//! deterministically. With a paused clock, `sleep_until` resolves as
//! soon as every task is idle, so a 60 s interval costs nothing.

use std::time::Duration;

use cratebytes_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

const MINUTE: Duration = Duration::from_secs(60);

fn config_minute() -> TickConfig {
    TickConfig::with_interval(MINUTE)
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_one_minute_without_jitter() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.interval, MINUTE);
    assert_eq!(cfg.initial_jitter, Duration::ZERO);
    assert_eq!(cfg.policy, TickPolicy::Skip);
}

#[test]
fn test_zero_interval_is_disabled() {
    assert!(TickConfig::with_interval(Duration::ZERO).is_disabled());
    assert!(!config_minute().is_disabled());
}

#[test]
fn test_validated_raises_tiny_interval() {
    let cfg = TickConfig::with_interval(Duration::from_micros(5)).validated();
    assert_eq!(cfg.interval, TickConfig::MIN_INTERVAL);
}

#[test]
fn test_validated_caps_jitter_to_interval() {
    let cfg = TickConfig {
        initial_jitter: Duration::from_secs(600),
        ..config_minute()
    }
    .validated();
    assert_eq!(cfg.initial_jitter, MINUTE);
}

// =========================================================================
// Scheduler creation and accessors
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_initial_state() {
    let s = TickScheduler::new(config_minute());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.interval(), MINUTE);
    assert!(!s.is_disabled());
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_tick_waits_a_full_interval() {
    let start = Instant::now();
    let mut s = TickScheduler::new(config_minute());

    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(start.elapsed(), MINUTE);
}

#[tokio::test(start_paused = true)]
async fn test_multiple_ticks_increment_monotonically() {
    let start = Instant::now();
    let mut s = TickScheduler::new(config_minute());

    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
    assert_eq!(start.elapsed(), MINUTE * 5);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_delays_first_tick_within_bound() {
    let start = Instant::now();
    let mut s = TickScheduler::new(TickConfig {
        initial_jitter: Duration::from_secs(5),
        ..config_minute()
    });

    s.wait_for_tick().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= MINUTE);
    assert!(elapsed < MINUTE + Duration::from_secs(5));
}

// =========================================================================
// Disabled mode pends forever
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_disabled_never_fires() {
    let mut s = TickScheduler::with_interval(Duration::ZERO);
    assert!(s.is_disabled());

    let result =
        tokio::time::timeout(Duration::from_secs(3600), s.wait_for_tick()).await;
    assert!(result.is_err(), "disabled scheduler should pend forever");
}

#[test]
fn test_validated_lowers_huge_interval() {
    let cfg = TickConfig::with_interval(Duration::from_secs(u64::MAX)).validated();
    assert_eq!(cfg.interval, TickConfig::MAX_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_huge_interval_does_not_panic_and_pends() {
    let mut s = TickScheduler::new(TickConfig {
        initial_jitter: Duration::from_secs(u64::MAX),
        ..TickConfig::with_interval(Duration::MAX)
    });
    assert_eq!(s.interval(), TickConfig::MAX_INTERVAL);

    let result =
        tokio::time::timeout(Duration::from_secs(3600), s.wait_for_tick()).await;
    assert!(result.is_err(), "a year-long interval should not fire within an hour");
    assert_eq!(s.tick_count(), 0);
}

// =========================================================================
// Late ticks
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reschedules_from_now() {
    let mut s = TickScheduler::new(config_minute());

    // Nobody polled for 150 s: the first deadline (60 s) is 90 s behind.
    tokio::time::advance(Duration::from_secs(150)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 1);

    // The next tick is a full interval after the late one.
    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(before.elapsed(), MINUTE);
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_keeps_cadence() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::Drop,
        ..config_minute()
    });

    tokio::time::advance(Duration::from_secs(150)).await;
    let info = s.wait_for_tick().await;
    assert!(info.overrun);

    // The original cadence put tick 2 at 120 s, which has already passed,
    // so it fires right away instead of a full interval later.
    let before = Instant::now();
    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
    assert_eq!(before.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_slightly_late_tick_is_not_an_overrun() {
    let mut s = TickScheduler::new(config_minute());

    // 3 s late is under the 10% threshold.
    tokio::time::advance(Duration::from_secs(63)).await;
    let info = s.wait_for_tick().await;
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
}

// =========================================================================
// Integration: select! loop pattern (mirrors the heartbeat loop)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(config_minute());
    let (stop_tx, mut stop_rx) = tokio::sync::oneshot::channel::<()>();

    // Disarm after three and a half intervals.
    tokio::spawn(async move {
        tokio::time::sleep(MINUTE * 7 / 2).await;
        stop_tx.send(()).ok();
    });

    let mut ticks_fired = 0u64;
    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            info = s.wait_for_tick() => {
                ticks_fired += 1;
                assert_eq!(info.tick, ticks_fired);
            }
        }
    }

    assert_eq!(ticks_fired, 3);
}
