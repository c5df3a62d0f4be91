//! Deterministic virtual-time environment
//!
//! Stands in for the browser: a [`VirtualScheduler`] with a manual clock, a
//! [`RecordingOverlay`] that remembers what it was asked to draw, and a
//! [`Simulation`] that drives the coordinator through a page load and keeps
//! a timestamped timeline.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::boot::{BootPlan, PageContext};
use crate::config::PreloaderConfig;
use crate::coordinator::Coordinator;
use crate::flags::MemoryFlagStore;
use crate::overlay::{progress_label, OverlayRenderer, OverlaySnapshot};
use crate::timer::{Scheduler, TimerId, TimerKind};

#[derive(Clone, Copy, Debug)]
struct Entry {
    id: TimerId,
    kind: TimerKind,
    period: Option<Duration>,
}

/// Scheduler with a manually advanced clock. Timers due at the same instant
/// fire in the order they were set.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), Entry>,
    slots: HashMap<TimerId, (Duration, u64)>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn enqueue(&mut self, due: Duration, entry: Entry) {
        let key = (due, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(key, entry);
        self.slots.insert(entry.id, key);
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Repeating timers are re-armed.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, TimerKind)> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        let entry = self.queue.remove(&key)?;
        self.slots.remove(&entry.id);
        self.now = self.now.max(key.0);
        if let Some(period) = entry.period {
            self.enqueue(key.0 + period, entry);
        }
        Some((entry.id, entry.kind))
    }

    /// Move the clock forward (never backwards)
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }

    /// Number of live timers of a given kind
    pub fn count(&self, pred: impl Fn(&TimerKind) -> bool) -> usize {
        self.queue.values().filter(|e| pred(&e.kind)).count()
    }

    pub fn active_progress_timers(&self) -> usize {
        self.count(|k| matches!(k, TimerKind::ProgressTick))
    }

    pub fn is_live(&self, id: TimerId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the next timer, if any
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|k| k.0)
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.now
    }

    fn set_timeout(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.enqueue(
            self.now + delay,
            Entry {
                id,
                kind,
                period: None,
            },
        );
        id
    }

    fn set_interval(&mut self, period: Duration, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        // Browsers clamp zero-period intervals; so do we
        let period = period.max(Duration::from_millis(1));
        self.enqueue(
            self.now + period,
            Entry {
                id,
                kind,
                period: Some(period),
            },
        );
        id
    }

    fn clear(&mut self, id: TimerId) {
        if let Some(key) = self.slots.remove(&id) {
            self.queue.remove(&key);
        }
    }
}

/// One call made to the overlay
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", content = "arg", rename_all = "snake_case")]
pub enum OverlayCall {
    Mount,
    Reveal,
    BeginFadeOut,
    HideNode,
    Progress(f64),
    Message(String),
    ScrollLocked(bool),
}

/// Overlay that records calls instead of drawing
#[derive(Debug, Default)]
pub struct RecordingOverlay {
    snapshot: OverlaySnapshot,
    calls: Vec<OverlayCall>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &OverlaySnapshot {
        &self.snapshot
    }

    /// Calls made since the last drain
    pub fn drain_calls(&mut self) -> Vec<OverlayCall> {
        std::mem::take(&mut self.calls)
    }
}

impl OverlayRenderer for RecordingOverlay {
    fn is_mounted(&self) -> bool {
        self.snapshot.mounted
    }

    fn mount(&mut self) {
        self.snapshot.mounted = true;
        self.calls.push(OverlayCall::Mount);
    }

    fn reveal(&mut self) {
        self.snapshot.displayed = true;
        self.snapshot.fading = false;
        self.calls.push(OverlayCall::Reveal);
    }

    fn begin_fade_out(&mut self) {
        self.snapshot.fading = true;
        self.calls.push(OverlayCall::BeginFadeOut);
    }

    fn hide_node(&mut self) {
        self.snapshot.displayed = false;
        self.calls.push(OverlayCall::HideNode);
    }

    fn set_progress(&mut self, percent: f64) {
        self.snapshot.progress = percent;
        self.snapshot.progress_label = progress_label(percent);
        self.calls.push(OverlayCall::Progress(percent));
    }

    fn set_message(&mut self, text: &str) {
        self.snapshot.message = text.to_string();
        self.calls.push(OverlayCall::Message(text.to_string()));
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        self.snapshot.scroll_locked = locked;
        self.calls.push(OverlayCall::ScrollLocked(locked));
    }
}

/// Timeline entry: an overlay call stamped with virtual time
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub at_ms: u64,
    pub call: OverlayCall,
}

pub type SimCoordinator = Coordinator<RecordingOverlay, VirtualScheduler>;

/// A page load in virtual time
pub struct Simulation {
    pub coordinator: SimCoordinator,
    pub store: MemoryFlagStore,
    timeline: Vec<TimelineEntry>,
    fired: Vec<(Duration, TimerId, TimerKind)>,
}

impl Simulation {
    pub fn new(config: PreloaderConfig) -> Self {
        Self::with_store(config, MemoryFlagStore::new())
    }

    pub fn with_store(config: PreloaderConfig, store: MemoryFlagStore) -> Self {
        Self {
            coordinator: Coordinator::new(RecordingOverlay::new(), VirtualScheduler::new(), config),
            store,
            timeline: Vec::new(),
            fired: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.coordinator.now()
    }

    pub fn now_ms(&self) -> u64 {
        self.now().as_millis() as u64
    }

    pub fn overlay(&self) -> &OverlaySnapshot {
        self.coordinator.overlay().snapshot()
    }

    pub fn scheduler(&self) -> &VirtualScheduler {
        self.coordinator.scheduler()
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// Timers fired so far, in firing order
    pub fn fired(&self) -> &[(Duration, TimerId, TimerKind)] {
        &self.fired
    }

    /// Run `f` against the coordinator at the current virtual time
    pub fn act<R>(&mut self, f: impl FnOnce(&mut SimCoordinator) -> R) -> R {
        let out = f(&mut self.coordinator);
        self.record();
        out
    }

    /// Boot the page using the simulation's flag store
    pub fn boot(&mut self, page: &PageContext) -> BootPlan {
        let Self {
            coordinator, store, ..
        } = self;
        let plan = coordinator.initialize(store, page);
        self.record();
        plan
    }

    /// Fire every timer due up to `t` (inclusive), then move the clock to `t`
    pub fn run_until(&mut self, t: Duration) {
        while let Some((id, kind)) = self.coordinator.scheduler_mut().pop_due(t) {
            self.fired.push((self.coordinator.now(), id, kind));
            self.coordinator.fire(id, kind);
            self.record();
        }
        self.coordinator.scheduler_mut().advance_to(t);
    }

    pub fn run_until_ms(&mut self, ms: u64) {
        self.run_until(Duration::from_millis(ms));
    }

    pub fn advance_ms(&mut self, ms: u64) {
        let t = self.now() + Duration::from_millis(ms);
        self.run_until(t);
    }

    fn record(&mut self) {
        let at_ms = self.now_ms();
        for call in self.coordinator.overlay_mut().drain_calls() {
            self.timeline.push(TimelineEntry { at_ms, call });
        }
    }
}
