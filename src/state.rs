//! Coordinator state
//!
//! One [`PreloaderState`] exists per page load. Only the coordinator mutates it.

use serde::Serialize;
use std::time::Duration;

use crate::progress::ProgressAnimation;
use crate::stages::StageRun;
use crate::timer::TimerId;

/// What the overlay is loading for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// First paint of the page
    #[default]
    Normal,
    /// Transition from a previous page
    Navigation,
}

/// Lifecycle of the overlay node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not shown; progress is 0
    #[default]
    Hidden,
    /// Shown and loading
    Visible,
    /// Hide committed; fade-out transition running, progress pinned at 100
    FadingOut,
}

/// Mutable state owned by the coordinator
#[derive(Clone, Debug, Default)]
pub struct PreloaderState {
    pub phase: Phase,
    pub mode: Mode,
    /// Set on a navigation show, cleared on hide
    pub started_at: Option<Duration>,
    pub progress_percent: f64,
    /// Running progress animation timer (at most one)
    pub progress_timer: Option<TimerId>,
    /// Bumped on every show; stale deferred callbacks compare against it
    pub epoch: u64,

    pub(crate) animation: Option<ProgressAnimation>,
    pub(crate) pending_hide: Option<TimerId>,
    pub(crate) fade_timer: Option<TimerId>,
    pub(crate) guard_timer: Option<TimerId>,
    pub(crate) message_timer: Option<TimerId>,
    pub(crate) message_index: usize,
    pub(crate) stage_timer: Option<TimerId>,
    pub(crate) stage_run: Option<StageRun>,
    /// Hide scheduled after a finished staged run
    pub(crate) stage_done_timer: Option<TimerId>,
}

impl PreloaderState {
    pub fn visible(&self) -> bool {
        self.phase == Phase::Visible
    }

    pub fn animating(&self) -> bool {
        self.progress_timer.is_some()
    }

    /// Snapshot for `preloaderDebug()`
    pub fn debug_snapshot(&self) -> PreloaderDebug {
        PreloaderDebug {
            visible: self.visible(),
            phase: self.phase,
            mode: self.mode,
            started_at_ms: self.started_at.map(|d| d.as_millis() as u64),
            progress_percent: self.progress_percent,
            epoch: self.epoch,
            progress_timer: self.progress_timer,
            hide_pending: self.pending_hide.is_some(),
            fading_out: self.fade_timer.is_some(),
            guard_armed: self.guard_timer.is_some(),
            rotating_messages: self.message_timer.is_some(),
            stages_running: self.stage_run.is_some(),
        }
    }
}

/// Serializable view of the coordinator state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PreloaderDebug {
    pub visible: bool,
    pub phase: Phase,
    pub mode: Mode,
    pub started_at_ms: Option<u64>,
    pub progress_percent: f64,
    pub epoch: u64,
    pub progress_timer: Option<TimerId>,
    pub hide_pending: bool,
    pub fading_out: bool,
    pub guard_armed: bool,
    pub rotating_messages: bool,
    pub stages_running: bool,
}
