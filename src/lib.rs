//! Autêntica Preloader - loading overlay coordinator for Financeira Autêntica
//!
//! This library owns the full-screen loading overlay shown while a page of the
//! Financeira Autêntica web app loads, or while the user moves between pages.
//!
//! ## Architecture
//!
//! The coordinator is a single-threaded state machine that never blocks. It
//! talks to its environment through three seams:
//! - [`overlay::OverlayRenderer`] draws the overlay
//! - [`timer::Scheduler`] provides the page clock and timers
//! - [`flags::FlagStore`] holds the session-scoped flags
//!
//! Two environments plug into those seams:
//! - **Web**: the DOM, `sessionStorage` and browser timers (`dom-web` feature, wasm32)
//! - **Native**: a virtual-time harness used by the tests and `preloader-sim`
//!
//! ## Usage
//!
//! For the simulator:
//! ```bash
//! cargo run --features native -- --pending-navigation --loaded-at 400
//! ```
//!
//! For web builds:
//! ```bash
//! wasm-pack build --target web --no-default-features --features dom-web
//! ```

// Core modules (available on all platforms)
pub mod config;
pub mod flags;
pub mod overlay;
pub mod progress;
pub mod route;
pub mod stages;
pub mod state;
pub mod timer;

// The coordinator and its page-load protocol
pub mod boot;
pub mod coordinator;

// Deterministic virtual-time environment (tests and simulator)
pub mod sim;

// Platform abstraction layer (logging, panic hook)
pub mod platform;

// Browser driver: DOM overlay, sessionStorage, browser timers
#[cfg(all(target_arch = "wasm32", feature = "dom-web"))]
pub mod web;

// WASM-facing exports (JS -> Rust) are only built on wasm32.
#[cfg(all(target_arch = "wasm32", feature = "dom-web"))]
pub mod wasm_api;

// Re-export commonly used types
pub use boot::{BootPlan, PageContext, ReadyState};
pub use config::{PreloaderConfig, Timings};
pub use coordinator::Coordinator;
pub use flags::{FlagStore, MemoryFlagStore};
pub use state::{Mode, Phase, PreloaderState};
pub use timer::{Scheduler, TimerId, TimerKind};
