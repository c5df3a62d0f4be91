//! Overlay rendering boundary
//!
//! The coordinator decides *when* the overlay is shown; an [`OverlayRenderer`]
//! decides *how*. The browser renderer manipulates the `#main-preloader`
//! subtree, the native one records what it was asked to do.

use serde::Serialize;

/// Id of the overlay root element in the page
pub const OVERLAY_ID: &str = "main-preloader";

/// Class that triggers the CSS fade-out transition
pub const FADE_OUT_CLASS: &str = "fade-out";

/// Drawing operations the coordinator needs from the page
pub trait OverlayRenderer {
    /// Does the overlay subtree exist in the page?
    fn is_mounted(&self) -> bool;

    /// Create the overlay subtree (hidden)
    fn mount(&mut self);

    /// Make the overlay visible and cancel any fade-out styling
    fn reveal(&mut self);

    /// Start the fade-out transition (node stays displayed)
    fn begin_fade_out(&mut self);

    /// Take the node out of the layout once the fade-out is over
    fn hide_node(&mut self);

    /// Reflect progress into the bar width and percentage label
    fn set_progress(&mut self, percent: f64);

    /// Replace the loading message
    fn set_message(&mut self, text: &str);

    /// Suppress or restore page scrolling
    fn set_scroll_locked(&mut self, locked: bool);
}

/// Observable state of a rendered overlay (one-way data flow: Rust → JS / tests)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    /// Overlay subtree exists
    pub mounted: bool,
    /// Node is in the layout (`display: flex`)
    pub displayed: bool,
    /// Fade-out class applied
    pub fading: bool,
    /// Bar width in percent
    pub progress: f64,
    /// Percentage label as rendered
    pub progress_label: String,
    /// Current loading message
    pub message: String,
    /// Page scroll suppressed
    pub scroll_locked: bool,
}

impl OverlaySnapshot {
    /// On screen and not fading out
    pub fn fully_visible(&self) -> bool {
        self.displayed && !self.fading
    }
}

/// Percentage label as the overlay renders it
pub fn progress_label(percent: f64) -> String {
    format!("{}%", percent.round() as u32)
}
