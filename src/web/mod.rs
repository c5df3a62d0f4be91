//! Browser driver
//!
//! Wires the coordinator to the real page: the DOM overlay, `sessionStorage`
//! flags, gloo timers and the `DOMContentLoaded` / `load` events. The
//! coordinator lives in a thread-local for the lifetime of the page; every
//! timer and event callback borrows it, dispatches, and lets go.

mod overlay;
mod scheduler;
mod storage;

use std::cell::RefCell;

use anyhow::{anyhow, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::boot::{PageContext, ReadyState};
use crate::config::PreloaderConfig;
use crate::coordinator::Coordinator;
use crate::flags::{FlagStore, MemoryFlagStore};
use crate::timer::{TimerId, TimerKind};

pub use overlay::DomOverlay;
pub use scheduler::WebScheduler;
pub use storage::SessionFlagStore;

pub type WebCoordinator = Coordinator<DomOverlay, WebScheduler>;

pub struct Runtime {
    pub coordinator: WebCoordinator,
    pub store: Box<dyn FlagStore>,
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}

/// Run `f` against the page runtime; `None` before [`start`] or on re-entry
pub fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    RUNTIME.with(|cell| match cell.try_borrow_mut() {
        Ok(mut slot) => slot.as_mut().map(f),
        Err(_) => {
            log::warn!("preloader runtime re-entered; call dropped");
            None
        }
    })
}

/// Timer callback entry point
pub(crate) fn dispatch(id: TimerId, kind: TimerKind) {
    with_runtime(|rt| {
        rt.coordinator.scheduler_mut().retire(id);
        rt.coordinator.fire(id, kind);
    });
}

fn open_flag_store() -> Box<dyn FlagStore> {
    match SessionFlagStore::open() {
        Some(store) => Box::new(store),
        None => {
            log::warn!("sessionStorage unavailable, flags will not survive navigation");
            Box::new(MemoryFlagStore::new())
        }
    }
}

/// Build the runtime, run the boot protocol and subscribe to the load events
pub fn start(config: PreloaderConfig) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
    let document = window.document().ok_or_else(|| anyhow!("no document"))?;

    let ready_state = document
        .ready_state()
        .parse::<ReadyState>()
        .unwrap_or(ReadyState::Loading);
    let path = window
        .location()
        .pathname()
        .unwrap_or_else(|_| "/".to_string());
    let page = PageContext { ready_state, path };

    let already_started = RUNTIME.with(|cell| cell.borrow().is_some());
    if already_started {
        return Err(anyhow!("preloader already started"));
    }
    RUNTIME.with(|cell| {
        *cell.borrow_mut() = Some(Runtime {
            coordinator: Coordinator::new(
                DomOverlay::new(document.clone()),
                WebScheduler::new(),
                config,
            ),
            store: open_flag_store(),
        });
    });

    let plan = with_runtime(|rt| rt.coordinator.initialize(&mut *rt.store, &page));
    log::info!("boot plan {plan:?} (readyState={ready_state:?}, path={})", page.path);

    if ready_state == ReadyState::Loading {
        let on_dom = Closure::<dyn FnMut()>::new(|| {
            with_runtime(|rt| rt.coordinator.on_dom_parsed());
        });
        document
            .add_event_listener_with_callback("DOMContentLoaded", on_dom.as_ref().unchecked_ref())
            .map_err(|e| anyhow!("DOMContentLoaded listener: {e:?}"))?;
        on_dom.forget();
    }
    if ready_state != ReadyState::Complete {
        let on_load = Closure::<dyn FnMut()>::new(|| {
            with_runtime(|rt| rt.coordinator.on_resources_loaded());
        });
        window
            .add_event_listener_with_callback("load", on_load.as_ref().unchecked_ref())
            .map_err(|e| anyhow!("load listener: {e:?}"))?;
        on_load.forget();
    }
    Ok(())
}
