//! Page clock and timers
//!
//! The coordinator never sleeps. It asks its [`Scheduler`] for timers and the
//! host calls [`Coordinator::fire`](crate::Coordinator::fire) when one is due.
//! Callbacks that may outlive the state they were scheduled for carry the
//! show epoch they belong to, and the coordinator drops them when the epoch
//! has moved on.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Identifies one scheduled timer (one-shot or repeating)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which safety net a guard timer belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    FirstPaint,
    Navigation,
    Busy,
}

/// What a timer does when it fires
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerKind {
    /// Repeating progress animation tick
    ProgressTick,
    /// Repeating loading-message rotation
    MessageRotation,
    /// Repeating staged progress tick
    StageTick,
    /// Minimum-display deferral of a navigation hide
    DeferredHide { epoch: u64 },
    /// End of the fade-out grace period
    FadeOutComplete { epoch: u64 },
    /// Forced hide if nobody hid the overlay in time
    Safety { guard: Guard, epoch: u64 },
    /// Delay between both load signals and the boot hide
    LoadSettle { epoch: u64 },
    /// Delay between a finished staged run and its hide
    StagesComplete { epoch: u64 },
}

/// Clock + timer facility provided by the host environment
pub trait Scheduler {
    /// Time elapsed since the page origin
    fn now(&self) -> Duration;

    /// Fire `kind` once after `delay`
    fn set_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerId;

    /// Fire `kind` every `period` until cleared
    fn set_interval(&mut self, period: Duration, kind: TimerKind) -> TimerId;

    /// Cancel a timer; unknown or already-fired ids are ignored
    fn clear(&mut self, id: TimerId);
}
