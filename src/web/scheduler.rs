//! Browser timers behind the [`Scheduler`] seam.
//!
//! Each timer owns a gloo `Timeout`/`Interval`; dropping the handle cancels it.
//! Callbacks route back into the runtime through [`super::dispatch`].

use std::collections::HashMap;
use std::time::Duration;

use gloo_timers::callback::{Interval, Timeout};
use web_time::Instant;

use crate::timer::{Scheduler, TimerId, TimerKind};

enum Handle {
    Timeout(Timeout),
    Interval(Interval),
}

pub struct WebScheduler {
    origin: Instant,
    next_id: u64,
    handles: HashMap<TimerId, Handle>,
}

impl WebScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_id: 0,
            handles: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    /// Drop the handle of a one-shot timer that just fired
    pub fn retire(&mut self, id: TimerId) {
        if matches!(self.handles.get(&id), Some(Handle::Timeout(_))) {
            self.handles.remove(&id);
        }
    }

    pub fn active(&self) -> usize {
        self.handles.len()
    }
}

impl Default for WebScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u32::MAX as u128) as u32
}

impl Scheduler for WebScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn set_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        let id = self.next_id();
        let timeout = Timeout::new(millis(delay), move || super::dispatch(id, kind));
        self.handles.insert(id, Handle::Timeout(timeout));
        id
    }

    fn set_interval(&mut self, period: Duration, kind: TimerKind) -> TimerId {
        let id = self.next_id();
        let interval = Interval::new(millis(period), move || super::dispatch(id, kind));
        self.handles.insert(id, Handle::Interval(interval));
        id
    }

    fn clear(&mut self, id: TimerId) {
        self.handles.remove(&id);
    }
}
