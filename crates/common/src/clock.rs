//! Clock and pacing utilities for the capture loop.
//!
//! A session is anchored to a monotonic epoch recorded when capture starts.
//! This module provides:
//! - The session clock (monotonic elapsed time plus wall-clock start)
//! - A rate controller used to pace periodic work such as weight snapshots

use std::time::Instant;

/// A session clock that provides monotonic timestamps relative to a fixed
/// epoch (the moment capture started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant capture started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get nanoseconds elapsed since capture start.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Get seconds elapsed since capture start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at capture start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// Paces periodic work inside the capture loop; fires at most once per
/// interval and always on the first check.
#[derive(Debug)]
pub struct RateController {
    interval_ns: u64,
    last_fired_ns: Option<u64>,
}

impl RateController {
    /// Fire `hz` times per second.
    pub fn new(hz: u32) -> Self {
        Self::with_interval_ms(1000 / u64::from(hz.max(1)))
    }

    /// Fire every `interval_ms` milliseconds; `0` fires on every check.
    pub fn with_interval_ms(interval_ms: u64) -> Self {
        Self {
            interval_ns: interval_ms.saturating_mul(1_000_000),
            last_fired_ns: None,
        }
    }

    /// Whether the interval has elapsed at `now_ns` (session time).
    pub fn should_tick(&mut self, now_ns: u64) -> bool {
        let due = self
            .last_fired_ns
            .map_or(true, |last| now_ns >= last.saturating_add(self.interval_ns));
        if due {
            self.last_fired_ns = Some(now_ns);
        }
        due
    }

    pub fn interval_ns(&self) -> u64 {
        self.interval_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = SessionClock::start();
        assert!(clock.elapsed_ns() < 1_000_000_000);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0)); // first tick always fires
        assert!(!ctrl.should_tick(1_000_000)); // 1ms later, too soon
        assert!(ctrl.should_tick(17_000_000));
    }

    #[test]
    fn test_interval_controller() {
        let mut ctrl = RateController::with_interval_ms(1000);
        assert_eq!(ctrl.interval_ns(), 1_000_000_000);
        assert!(ctrl.should_tick(5));
        assert!(!ctrl.should_tick(999_999_999));
        assert!(ctrl.should_tick(1_000_000_005));
    }

    #[test]
    fn test_zero_interval_always_fires() {
        let mut ctrl = RateController::with_interval_ms(0);
        assert!(ctrl.should_tick(0));
        assert!(ctrl.should_tick(0));
    }
}
