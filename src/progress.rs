//! Simulated progress animation
//!
//! Progress eases toward a time-based target: each tick moves the displayed
//! value by a fixed increment, never past the target and never backwards.

use std::time::Duration;

/// Clamp a percentage into [0, 100]; NaN counts as 0
#[inline]
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Result of one animation tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// New progress value, keep ticking
    Continue(f64),
    /// New progress value, animation is over
    Done(f64),
}

impl Step {
    pub fn value(&self) -> f64 {
        match *self {
            Step::Continue(v) | Step::Done(v) => v,
        }
    }
}

/// One run of the progress animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressAnimation {
    started_at: Duration,
    duration: Duration,
    increment: f64,
}

impl ProgressAnimation {
    /// Animation over `duration`, ticking every `tick`
    pub fn new(started_at: Duration, duration: Duration, tick: Duration) -> Self {
        let ticks = duration.as_secs_f64() / tick.as_secs_f64().max(f64::EPSILON);
        let increment = if ticks <= 1.0 { 100.0 } else { 100.0 / ticks };
        Self {
            started_at,
            duration,
            increment,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Per-tick increment in percentage points
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Where progress should be at `now`
    pub fn target(&self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.started_at);
        if self.duration.is_zero() {
            return 100.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64() * 100.0).min(100.0)
    }

    /// Advance `current` one tick at `now`
    pub fn step(&self, current: f64, now: Duration) -> Step {
        let target = self.target(now);
        let current = clamp_percent(current);
        let next = if current < target {
            (current + self.increment).min(target)
        } else {
            current
        };
        let elapsed = now.saturating_sub(self.started_at);
        if next >= 100.0 || elapsed > self.duration {
            Step::Done(next)
        } else {
            Step::Continue(next)
        }
    }
}
