//! Page-load protocol
//!
//! Runs once per page load:
//!
//! 1. The previous page left the `navigationPreloader` marker: consume it,
//!    show a navigation overlay, hide once the DOM is parsed and every
//!    resource loaded (8s safety net).
//! 2. First visit of the session, or a landing view: show the first-paint
//!    overlay and hide on load (6s safety net).
//! 3. Anything else: no overlay.

use log::{debug, info};
use std::str::FromStr;

use anyhow::anyhow;

use crate::config::PreloaderConfig;
use crate::coordinator::Coordinator;
use crate::flags::{FlagStore, APP_LOADED, NAVIGATION_PENDING};
use crate::overlay::OverlayRenderer;
use crate::route;
use crate::state::Mode;
use crate::timer::{Scheduler, TimerKind};

/// `document.readyState`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl FromStr for ReadyState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "loading" => Ok(ReadyState::Loading),
            "interactive" => Ok(ReadyState::Interactive),
            "complete" => Ok(ReadyState::Complete),
            _ => Err(anyhow!(
                "Invalid ready state '{s}'. Valid options: loading, interactive, complete"
            )),
        }
    }
}

/// What the page looks like when the script starts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageContext {
    pub ready_state: ReadyState,
    /// `location.pathname`
    pub path: String,
}

/// Decision taken by the boot protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootPlan {
    /// Previous page is navigating to this one
    Navigation,
    /// First paint of a first visit or a landing view
    FirstPaint,
    /// No overlay
    Idle,
}

/// Decide how this page boots, consuming the navigation marker and
/// recording that the session has loaded a page
pub fn plan_boot<F: FlagStore + ?Sized>(
    store: &mut F,
    page: &PageContext,
    config: &PreloaderConfig,
) -> BootPlan {
    let first_visit = !store.contains(APP_LOADED);
    store.set(APP_LOADED, "true");

    if store.take(NAVIGATION_PENDING).is_some() {
        info!("pending navigation overlay detected");
        return BootPlan::Navigation;
    }
    if first_visit || route::is_landing(&page.path, &config.landing_paths) {
        info!(
            "first paint overlay (first_visit={first_visit}, path={})",
            page.path
        );
        return BootPlan::FirstPaint;
    }
    debug!("no overlay for {}", page.path);
    BootPlan::Idle
}

/// Tracks the two page-load signals for the boot hide
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadTracker {
    armed: Option<BootPlan>,
    dom_parsed: bool,
    resources_loaded: bool,
    settling: bool,
}

impl LoadTracker {
    pub fn dom_parsed(&self) -> bool {
        self.dom_parsed
    }

    pub fn resources_loaded(&self) -> bool {
        self.resources_loaded
    }

    /// Both signals seen while a boot overlay waits for them
    fn ready_to_settle(&self) -> bool {
        self.armed.is_some() && self.dom_parsed && self.resources_loaded && !self.settling
    }
}

impl<O: OverlayRenderer, S: Scheduler> Coordinator<O, S> {
    /// Run the boot protocol: plan from the flags, then act on the plan
    pub fn initialize<F: FlagStore + ?Sized>(&mut self, store: &mut F, page: &PageContext) -> BootPlan {
        let plan = plan_boot(store, page, self.config());
        self.boot(plan, page.ready_state);
        plan
    }

    /// Show the overlay for `plan` and wait for the load signals. Signals
    /// that already happened are taken from `ready_state`.
    pub fn boot(&mut self, plan: BootPlan, ready_state: ReadyState) {
        match plan {
            BootPlan::Navigation => self.show(true),
            BootPlan::FirstPaint => self.show(false),
            BootPlan::Idle => return,
        }
        self.load = LoadTracker {
            armed: Some(plan),
            dom_parsed: ready_state != ReadyState::Loading,
            resources_loaded: ready_state == ReadyState::Complete,
            settling: false,
        };
        self.maybe_settle();
    }

    /// `DOMContentLoaded`
    pub fn on_dom_parsed(&mut self) {
        debug!("DOMContentLoaded");
        self.load.dom_parsed = true;
        self.maybe_settle();
    }

    /// `window.onload`
    pub fn on_resources_loaded(&mut self) {
        debug!("load event");
        // Resources can't finish before the DOM is parsed
        self.load.dom_parsed = true;
        self.load.resources_loaded = true;
        self.maybe_settle();
    }

    pub fn load_tracker(&self) -> &LoadTracker {
        &self.load
    }

    fn maybe_settle(&mut self) {
        if !self.load.ready_to_settle() {
            return;
        }
        let t = &self.config().timings;
        let delay = match self.load.armed {
            Some(BootPlan::Navigation) => t.navigation_settle(),
            _ => t.first_paint_settle(),
        };
        self.load.settling = true;
        debug!("page loaded, hiding in {}ms", delay.as_millis());
        let epoch = self.state().epoch;
        self.schedule(delay, TimerKind::LoadSettle { epoch });
    }

    pub(crate) fn on_load_settled(&mut self, epoch: u64) {
        let plan = self.load.armed.take();
        if epoch != self.state().epoch {
            debug!("load settle for epoch {epoch} dropped");
            return;
        }
        match plan {
            Some(BootPlan::Navigation) => self.hide(false),
            // A navigation overlay shown meanwhile is not ours to hide
            Some(BootPlan::FirstPaint) if self.state().mode == Mode::Normal => self.hide(false),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::MemoryFlagStore;

    fn page(path: &str) -> PageContext {
        PageContext {
            ready_state: ReadyState::Loading,
            path: path.to_string(),
        }
    }

    #[test]
    fn test_ready_state_parsing() {
        assert_eq!("loading".parse::<ReadyState>().unwrap(), ReadyState::Loading);
        assert_eq!("Interactive".parse::<ReadyState>().unwrap(), ReadyState::Interactive);
        assert_eq!("complete".parse::<ReadyState>().unwrap(), ReadyState::Complete);
        assert!("done".parse::<ReadyState>().is_err());
    }

    #[test]
    fn test_navigation_marker_is_consumed() {
        let cfg = PreloaderConfig::default();
        let mut store = MemoryFlagStore::returning_session();
        crate::flags::mark_navigation_pending(&mut store);

        assert_eq!(plan_boot(&mut store, &page("/clients"), &cfg), BootPlan::Navigation);
        assert!(!store.contains(NAVIGATION_PENDING));
        assert_eq!(plan_boot(&mut store, &page("/clients"), &cfg), BootPlan::Idle);
    }

    #[test]
    fn test_first_visit_then_idle() {
        let cfg = PreloaderConfig::default();
        let mut store = MemoryFlagStore::new();
        assert_eq!(plan_boot(&mut store, &page("/clients"), &cfg), BootPlan::FirstPaint);
        assert!(store.contains(APP_LOADED));
        assert_eq!(plan_boot(&mut store, &page("/clients"), &cfg), BootPlan::Idle);
    }

    #[test]
    fn test_landing_view_always_gets_overlay() {
        let cfg = PreloaderConfig::default();
        let mut store = MemoryFlagStore::returning_session();
        assert_eq!(plan_boot(&mut store, &page("/"), &cfg), BootPlan::FirstPaint);
        assert_eq!(plan_boot(&mut store, &page("/?week=2"), &cfg), BootPlan::FirstPaint);
    }

    #[test]
    fn test_navigation_marker_sets_app_loaded() {
        let cfg = PreloaderConfig::default();
        let mut store = MemoryFlagStore::new();
        crate::flags::mark_navigation_pending(&mut store);
        assert_eq!(plan_boot(&mut store, &page("/clients"), &cfg), BootPlan::Navigation);
        assert!(store.contains(APP_LOADED));
    }
}
