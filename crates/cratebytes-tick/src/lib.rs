//! Fixed-interval tick scheduler for the CrateBytes SDK.
//!
//! Drives the repeating heartbeat: one tick every `interval`, with a small
//! random delay on the first tick so a fleet of clients started together
//! does not hit the backend in lockstep.
//!
//! # Disabled mode
//!
//! When `interval` is zero the scheduler is disabled and
//! [`TickScheduler::wait_for_tick`] pends forever. A heartbeat loop built
//! on it then simply never fires.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a `tokio::select!` loop next to
//! a cancellation branch:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut cancel => break,
//!         _ = scheduler.wait_for_tick() => { /* send heartbeat */ }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick is noticed late (the runtime was busy, the
/// process was suspended, or the previous tick's work overran).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Fire once and schedule the next tick a full interval from now.
    /// Missed ticks are counted but never replayed.
    #[default]
    Skip,
    /// Keep the original cadence: the next tick is due one interval
    /// after the missed deadline, even if that is very soon.
    Drop,
}

/// Full configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. Zero disables the scheduler.
    pub interval: Duration,
    /// Late-tick handling policy.
    pub policy: TickPolicy,
    /// Upper bound of the random delay added to the *first* tick only.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            policy: TickPolicy::default(),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl TickConfig {
    /// Shortest interval accepted; anything below is raised to this.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    /// Longest interval accepted; anything above is lowered to this.
    pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// Create a config for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`]. Rules:
    /// - a non-zero `interval` below [`Self::MIN_INTERVAL`] is raised to it;
    /// - an `interval` above [`Self::MAX_INTERVAL`] is lowered to it;
    /// - `initial_jitter` is capped to one `interval`.
    pub fn validated(mut self) -> Self {
        if !self.interval.is_zero() && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_secs_f64() * 1000.0,
                min_ms = Self::MIN_INTERVAL.as_secs_f64() * 1000.0,
                "tick interval below minimum; clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        if self.interval > Self::MAX_INTERVAL {
            warn!(
                interval_secs = self.interval.as_secs_f64(),
                max_secs = Self::MAX_INTERVAL.as_secs_f64(),
                "tick interval above maximum; clamping"
            );
            self.interval = Self::MAX_INTERVAL;
        }
        if self.initial_jitter > self.interval {
            self.initial_jitter = self.interval;
        }
        self
    }

    /// Whether this config never fires.
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }
}

/// `from + after`, or `None` when the platform clock can't represent it.
/// A scheduler with no representable deadline behaves as disabled.
fn deadline(from: Instant, after: Duration) -> Option<Instant> {
    let due = from.checked_add(after);
    if due.is_none() {
        warn!(
            after_secs = after.as_secs_f64(),
            "tick deadline overflows the clock; scheduler disabled"
        );
    }
    due
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired noticeably late.
    pub overrun: bool,
    /// How many whole intervals were missed before this tick fired.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval tick scheduler. One per heartbeat loop.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick should fire (Tokio instant for `sleep_until`).
    /// `None` when disabled.
    next_tick: Option<Instant>,
}

impl TickScheduler {
    /// Create a new scheduler from config. The first tick is due one
    /// interval (plus jitter) from now, never immediately.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        let next_tick = if config.is_disabled() {
            debug!("tick scheduler created disabled (zero interval)");
            None
        } else {
            let max_us = config.initial_jitter.as_micros() as u64;
            let jitter = if max_us == 0 {
                Duration::ZERO
            } else {
                Duration::from_micros(rand::rng().random_range(0..max_us))
            };
            debug!(
                interval_ms = config.interval.as_secs_f64() * 1000.0,
                jitter_ms = jitter.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "tick scheduler created"
            );
            deadline(Instant::now(), config.interval + jitter)
        };

        Self {
            config,
            tick_count: 0,
            next_tick,
        }
    }

    /// Create a scheduler for a specific interval with default settings.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(TickConfig::with_interval(interval))
    }

    /// Wait until the next tick is due. Returns [`TickInfo`] for the tick.
    ///
    /// When disabled this future pends forever; `tokio::select!` will
    /// still process other branches. Cancel-safe: dropping the future
    /// before it resolves leaves the schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let Some(next) = self.next_tick else {
            std::future::pending::<()>().await;
            unreachable!()
        };
        let interval = self.config.interval;

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        // >10% of an interval late counts as an overrun.
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > interval / 10;
        let ticks_skipped = if overrun {
            (late_by.as_nanos() / interval.as_nanos()) as u64
        } else {
            0
        };

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if ticks_skipped > 0 {
                    warn!(
                        tick = self.tick_count,
                        skipped = ticks_skipped,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun; skipping ahead"
                    );
                }
                deadline(now, interval)
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun; keeping original cadence"
                    );
                }
                // Never schedule in the past, or we'd spin.
                deadline(next, interval).map(|due| due.max(now))
            }
        };

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Whether this scheduler never fires.
    pub fn is_disabled(&self) -> bool {
        self.next_tick.is_none()
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
