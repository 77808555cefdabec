//! Minimum-gap pacing for outbound API calls.
//!
//! Tidal publishes no hard limits for the endpoints used here, so the
//! limiter keeps a configurable gap between requests, doubles it when a
//! call fails (rate limiting shows up as plain request errors) and decays
//! back toward the base gap after a run of successes.

use std::thread;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    label: &'static str,
    gap: Duration,
    base_gap: Duration,
    max_gap: Duration,
    last_call: Option<Instant>,
    streak: u32,
}

impl RateLimiter {
    /// Gap in milliseconds between calls; backoff may grow it up to 8x.
    pub fn new(label: &'static str, gap_ms: u64) -> Self {
        let base = Duration::from_millis(gap_ms);
        RateLimiter {
            label,
            gap: base,
            base_gap: base,
            max_gap: base.saturating_mul(8),
            last_call: None,
            streak: 0,
        }
    }

    /// Block until the current gap since the previous call has passed.
    /// Call before every request.
    pub fn pause(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.gap {
                thread::sleep(self.gap - elapsed);
            }
        }
        self.last_call = Some(Instant::now());
    }

    /// Record a completed call; four in a row halve an inflated gap.
    pub fn note_success(&mut self) {
        self.streak += 1;
        if self.streak >= 4 && self.gap > self.base_gap {
            self.gap = (self.gap / 2).max(self.base_gap);
            self.streak = 0;
        }
    }

    /// Record a failed call; doubles the gap up to the ceiling.
    pub fn note_failure(&mut self) {
        self.streak = 0;
        let doubled = self.gap.saturating_mul(2);
        self.gap = if doubled > self.max_gap { self.max_gap } else { doubled };
        if self.gap > self.base_gap {
            eprintln!(
                "[{}] backing off, request gap now {:.1}s",
                self.label,
                self.gap.as_secs_f64()
            );
        }
    }

    #[cfg(test)]
    fn current_gap(&self) -> Duration {
        self.gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_doubles_gap_up_to_ceiling() {
        let mut rl = RateLimiter::new("test", 100);
        rl.note_failure();
        assert_eq!(rl.current_gap(), Duration::from_millis(200));
        for _ in 0..10 {
            rl.note_failure();
        }
        assert_eq!(rl.current_gap(), Duration::from_millis(800));
    }

    #[test]
    fn test_success_streak_decays_gap_to_base() {
        let mut rl = RateLimiter::new("test", 100);
        rl.note_failure();
        rl.note_failure();
        assert_eq!(rl.current_gap(), Duration::from_millis(400));
        for _ in 0..8 {
            rl.note_success();
        }
        assert_eq!(rl.current_gap(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_gap_never_sleeps_or_grows() {
        let mut rl = RateLimiter::new("test", 0);
        rl.pause();
        rl.note_failure();
        rl.pause();
        assert_eq!(rl.current_gap(), Duration::ZERO);
    }
}
