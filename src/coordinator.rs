//! Navigation preloader coordinator
//!
//! Owns the overlay's visibility and its simulated progress bar.
//!
//! - A navigation overlay stays up for at least `min_navigation_display_ms`,
//!   so fast page loads don't flash it.
//! - Every show arms a safety guard, so a forgotten `hide` can't leave the
//!   overlay on screen forever.
//! - At most one progress timer runs; a new animation replaces the old one.
//!
//! All timer callbacks go through [`Coordinator::fire`], which re-reads the
//! current state instead of trusting what was true when the timer was set.

use log::{debug, info, warn};
use std::time::Duration;

use crate::boot::LoadTracker;
use crate::config::{PreloaderConfig, STAGES_DONE_MESSAGE};
use crate::overlay::OverlayRenderer;
use crate::progress::{clamp_percent, ProgressAnimation, Step};
use crate::stages::StageRun;
use crate::state::{Mode, Phase, PreloaderDebug, PreloaderState};
use crate::timer::{Guard, Scheduler, TimerId, TimerKind};

pub struct Coordinator<O: OverlayRenderer, S: Scheduler> {
    overlay: O,
    scheduler: S,
    config: PreloaderConfig,
    state: PreloaderState,
    pub(crate) load: LoadTracker,
}

impl<O: OverlayRenderer, S: Scheduler> Coordinator<O, S> {
    pub fn new(overlay: O, scheduler: S, config: PreloaderConfig) -> Self {
        Self {
            overlay,
            scheduler,
            config,
            state: PreloaderState::default(),
            load: LoadTracker::default(),
        }
    }

    pub fn state(&self) -> &PreloaderState {
        &self.state
    }

    pub fn config(&self) -> &PreloaderConfig {
        &self.config
    }

    /// Replace the configuration; takes effect from the next timer that is set
    pub fn set_config(&mut self, config: PreloaderConfig) {
        self.config = config;
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible()
    }

    pub fn progress(&self) -> f64 {
        self.state.progress_percent
    }

    pub fn debug_snapshot(&self) -> PreloaderDebug {
        self.state.debug_snapshot()
    }

    // ----------------------------- show / hide ------------------------------

    /// Show the overlay. Re-entrant: calling it again while visible restarts
    /// the progress animation and re-arms the safety guard.
    pub fn show(&mut self, is_navigation: bool) {
        let mode = if is_navigation {
            Mode::Navigation
        } else {
            Mode::Normal
        };
        let guard = if is_navigation {
            Guard::Navigation
        } else {
            Guard::FirstPaint
        };
        self.show_inner(mode, guard, None);
    }

    /// Show a Normal overlay with a fixed message instead of the rotation,
    /// guarded by the shorter busy timeout
    pub fn show_busy(&mut self, message: &str) {
        self.show_inner(Mode::Normal, Guard::Busy, Some(message));
    }

    fn show_inner(&mut self, mode: Mode, guard: Guard, message: Option<&str>) {
        debug!("show: mode={mode:?} guard={guard:?} phase={:?}", self.state.phase);

        if !self.overlay.is_mounted() {
            self.overlay.mount();
            if !self.overlay.is_mounted() {
                warn!("show: overlay could not be mounted, nothing shown");
                return;
            }
        }
        if self.state.phase == Phase::FadingOut {
            // Finish the previous hide now so progress restarts from a hidden overlay
            self.complete_fade_out();
        }

        self.clear_timer(|s| &mut s.stage_done_timer);

        let now = self.scheduler.now();
        self.state.epoch += 1;
        self.state.phase = Phase::Visible;
        self.state.mode = mode;
        self.state.started_at = match mode {
            Mode::Navigation => Some(now),
            Mode::Normal => None,
        };

        self.overlay.reveal();
        self.overlay.set_scroll_locked(true);
        self.overlay.set_progress(self.state.progress_percent);

        match message {
            Some(text) => {
                self.stop_message_rotation();
                self.overlay.set_message(text);
            }
            None => self.start_message_rotation(),
        }

        let duration = self.default_progress_duration();
        self.start_progress(Some(duration));
        self.arm_guard(guard);
    }

    /// Hide the overlay. A non-forced navigation hide that comes too early is
    /// deferred until the minimum display time has passed.
    pub fn hide(&mut self, force: bool) {
        if !self.overlay.is_mounted() || self.state.phase != Phase::Visible {
            debug!("hide: nothing to hide (phase={:?})", self.state.phase);
            return;
        }

        if self.state.mode == Mode::Navigation && !force {
            let now = self.scheduler.now();
            let started = self.state.started_at.unwrap_or(now);
            let elapsed = now.saturating_sub(started);
            let min_display = self.config.timings.min_navigation_display();
            if elapsed < min_display {
                let remaining = min_display - elapsed;
                debug!("hide: navigation overlay deferred by {}ms", remaining.as_millis());
                self.clear_timer(|s| &mut s.pending_hide);
                let id = self.scheduler.set_timeout(
                    remaining,
                    TimerKind::DeferredHide {
                        epoch: self.state.epoch,
                    },
                );
                self.state.pending_hide = Some(id);
                return;
            }
        }

        debug!("hide: fading out (force={force})");
        self.clear_timer(|s| &mut s.pending_hide);
        self.clear_timer(|s| &mut s.guard_timer);
        self.stop_progress();
        self.stop_message_rotation();
        self.stop_stages();

        self.state.progress_percent = 100.0;
        self.overlay.set_progress(100.0);
        self.state.phase = Phase::FadingOut;
        self.state.mode = Mode::Normal;
        self.state.started_at = None;

        self.overlay.begin_fade_out();
        let id = self.scheduler.set_timeout(
            self.config.timings.fade_out(),
            TimerKind::FadeOutComplete {
                epoch: self.state.epoch,
            },
        );
        self.state.fade_timer = Some(id);
    }

    fn complete_fade_out(&mut self) {
        self.clear_timer(|s| &mut s.fade_timer);
        self.overlay.hide_node();
        self.state.progress_percent = 0.0;
        self.overlay.set_progress(0.0);
        self.overlay.set_scroll_locked(false);
        self.state.phase = Phase::Hidden;
        debug!("overlay hidden");
    }

    // ------------------------------- progress -------------------------------

    /// Set progress explicitly. Stops the simulated animation so external
    /// progress wins. No effect unless the overlay is mounted and visible.
    pub fn update_progress(&mut self, percent: f64) {
        if !self.overlay.is_mounted() || !self.state.visible() {
            return;
        }
        if self.state.animating() {
            self.stop_progress();
        }
        self.apply_progress(clamp_percent(percent));
    }

    fn apply_progress(&mut self, percent: f64) {
        self.state.progress_percent = percent;
        self.overlay.set_progress(percent);
    }

    fn default_progress_duration(&self) -> Duration {
        match self.state.mode {
            Mode::Navigation => self.config.timings.navigation_progress(),
            Mode::Normal => self.config.timings.normal_progress(),
        }
    }

    /// Start (or restart) the simulated progress animation. Defaults to the
    /// duration of the current mode.
    pub fn start_progress(&mut self, duration: Option<Duration>) {
        if !self.overlay.is_mounted() || !self.state.visible() {
            return;
        }
        self.stop_progress();

        let duration = duration.unwrap_or_else(|| self.default_progress_duration());
        let tick = self.config.timings.progress_tick();
        self.state.animation = Some(ProgressAnimation::new(
            self.scheduler.now(),
            duration,
            tick,
        ));
        let id = self.scheduler.set_interval(tick, TimerKind::ProgressTick);
        self.state.progress_timer = Some(id);
        debug!("progress animation {id} over {}ms", duration.as_millis());
    }

    pub fn stop_progress(&mut self) {
        self.clear_timer(|s| &mut s.progress_timer);
        self.state.animation = None;
    }

    fn on_progress_tick(&mut self, id: TimerId) {
        if self.state.progress_timer != Some(id) {
            // Stale tick from a replaced animation
            self.scheduler.clear(id);
            return;
        }
        let Some(anim) = self.state.animation else {
            self.stop_progress();
            return;
        };
        match anim.step(self.state.progress_percent, self.scheduler.now()) {
            Step::Continue(value) => self.apply_progress(value),
            Step::Done(value) => {
                self.apply_progress(value);
                self.stop_progress();
            }
        }
    }

    // ------------------------------- messages -------------------------------

    fn start_message_rotation(&mut self) {
        self.stop_message_rotation();
        if self.config.messages.is_empty() {
            return;
        }
        let idx = self.state.message_index % self.config.messages.len();
        self.overlay.set_message(&self.config.messages[idx]);
        let id = self.scheduler.set_interval(
            self.config.timings.message_rotation(),
            TimerKind::MessageRotation,
        );
        self.state.message_timer = Some(id);
    }

    fn stop_message_rotation(&mut self) {
        self.clear_timer(|s| &mut s.message_timer);
    }

    fn on_message_rotation(&mut self, id: TimerId) {
        if self.state.message_timer != Some(id) || self.config.messages.is_empty() {
            self.scheduler.clear(id);
            return;
        }
        self.state.message_index = (self.state.message_index + 1) % self.config.messages.len();
        self.overlay
            .set_message(&self.config.messages[self.state.message_index]);
    }

    // -------------------------------- stages --------------------------------

    /// Walk a staged progress run on the overlay, then hide it. Uses the
    /// configured stage names when `names` is `None`.
    pub fn run_stages(&mut self, names: Option<Vec<String>>) {
        if self.state.stage_run.is_some() {
            info!("staged progress already running");
            return;
        }
        let names = names.unwrap_or_else(|| self.config.stages.clone());
        if !self.state.visible() {
            self.show(false);
            if !self.state.visible() {
                return;
            }
        }
        self.clear_timer(|s| &mut s.stage_done_timer);
        self.stop_progress();
        self.stop_message_rotation();

        self.state.stage_run = Some(StageRun::new(names));
        let id = self
            .scheduler
            .set_interval(self.config.timings.stage_tick(), TimerKind::StageTick);
        self.state.stage_timer = Some(id);
        self.on_stage_tick(id);
    }

    fn stop_stages(&mut self) {
        self.clear_timer(|s| &mut s.stage_timer);
        self.clear_timer(|s| &mut s.stage_done_timer);
        self.state.stage_run = None;
    }

    fn on_stage_tick(&mut self, id: TimerId) {
        if self.state.stage_timer != Some(id) {
            self.scheduler.clear(id);
            return;
        }
        let next = self.state.stage_run.as_mut().and_then(StageRun::advance);
        match next {
            Some(update) => {
                debug!("[{}%] {}", update.total.round(), update.name);
                self.update_progress(update.total.round());
                self.overlay.set_message(&update.name);
            }
            None => {
                self.stop_stages();
                self.update_progress(100.0);
                self.overlay.set_message(STAGES_DONE_MESSAGE);
                info!("staged progress complete");
                let id = self.scheduler.set_timeout(
                    self.config.timings.stage_complete_hide(),
                    TimerKind::StagesComplete {
                        epoch: self.state.epoch,
                    },
                );
                self.state.stage_done_timer = Some(id);
            }
        }
    }

    // ------------------------------- guards ---------------------------------

    fn arm_guard(&mut self, guard: Guard) {
        self.clear_timer(|s| &mut s.guard_timer);
        let t = &self.config.timings;
        let delay = match guard {
            Guard::FirstPaint => t.first_paint_safety(),
            Guard::Navigation => t.navigation_safety(),
            Guard::Busy => t.busy_safety(),
        };
        let id = self.scheduler.set_timeout(
            delay,
            TimerKind::Safety {
                guard,
                epoch: self.state.epoch,
            },
        );
        self.state.guard_timer = Some(id);
    }

    fn on_safety(&mut self, guard: Guard, epoch: u64) {
        self.state.guard_timer = None;
        if !self.state.visible() {
            return;
        }
        let applies = match guard {
            Guard::Navigation => self.state.mode == Mode::Navigation,
            Guard::FirstPaint => self.state.mode == Mode::Normal,
            Guard::Busy => self.state.epoch == epoch,
        };
        if applies {
            info!("safety timeout ({guard:?}): forcing overlay hide");
            self.hide(true);
        }
    }

    // ------------------------------ dispatch --------------------------------

    /// Entry point for every timer the coordinator scheduled
    pub fn fire(&mut self, id: TimerId, kind: TimerKind) {
        match kind {
            TimerKind::ProgressTick => self.on_progress_tick(id),
            TimerKind::MessageRotation => self.on_message_rotation(id),
            TimerKind::StageTick => self.on_stage_tick(id),
            TimerKind::DeferredHide { epoch } => {
                if self.state.pending_hide == Some(id) {
                    self.state.pending_hide = None;
                }
                if epoch == self.state.epoch {
                    self.hide(true);
                } else {
                    debug!("deferred hide from epoch {epoch} dropped (now {})", self.state.epoch);
                }
            }
            TimerKind::FadeOutComplete { epoch } => {
                if epoch == self.state.epoch && self.state.phase == Phase::FadingOut {
                    self.state.fade_timer = None;
                    self.complete_fade_out();
                }
            }
            TimerKind::Safety { guard, epoch } => {
                if self.state.guard_timer == Some(id) {
                    self.on_safety(guard, epoch);
                }
            }
            TimerKind::LoadSettle { epoch } => self.on_load_settled(epoch),
            TimerKind::StagesComplete { epoch } => {
                if self.state.stage_done_timer != Some(id) {
                    debug!("stages-complete hide {id} dropped");
                    return;
                }
                self.state.stage_done_timer = None;
                if epoch == self.state.epoch {
                    self.hide(false);
                }
            }
        }
    }

    fn clear_timer(&mut self, slot: impl FnOnce(&mut PreloaderState) -> &mut Option<TimerId>) {
        if let Some(id) = slot(&mut self.state).take() {
            self.scheduler.clear(id);
        }
    }

    pub(crate) fn schedule(&mut self, delay: Duration, kind: TimerKind) -> TimerId {
        self.scheduler.set_timeout(delay, kind)
    }
}
