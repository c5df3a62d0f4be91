//! JS -> Rust surface for the preloader.
//!
//! The start hook boots the coordinator and installs the global functions
//! other page scripts already call (`window.showPreloader()`,
//! `window.hidePreloader()` ...). The same functions are also exported from
//! the wasm module for callers that import it directly.
//!
//! # Example
//! ```javascript
//! // Before navigating away:
//! window.markNavigationPending();
//! window.location.href = "/clients";
//!
//! // Long-running request on the current page:
//! window.showPreloaderMessage("Processando formulário...");
//! fetch(url).finally(() => window.hidePreloader());
//! ```

#![cfg(all(target_arch = "wasm32", feature = "dom-web"))]

use std::time::Duration;

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::PreloaderConfig;
use crate::flags::mark_navigation_pending;
use crate::platform;
use crate::web::{self, with_runtime};

/// Optional page-provided config: `window.PRELOADER_CONFIG` as a JSON string or object
fn config_from_window() -> PreloaderConfig {
    let Some(win) = web_sys::window() else {
        return PreloaderConfig::default();
    };
    let raw = match Reflect::get(&win, &JsValue::from_str("PRELOADER_CONFIG")) {
        Ok(v) if v.is_string() => v.as_string(),
        Ok(v) if v.is_object() => js_sys::JSON::stringify(&v).ok().and_then(|s| s.as_string()),
        _ => None,
    };
    match raw.map(|json| PreloaderConfig::from_json_str(&json)) {
        Some(Ok(cfg)) => cfg,
        Some(Err(err)) => {
            log::warn!("ignoring PRELOADER_CONFIG: {err:#}");
            PreloaderConfig::default()
        }
        None => PreloaderConfig::default(),
    }
}

#[wasm_bindgen(start)]
pub fn preloader_start() {
    platform::install_panic_hook();
    platform::init_logging(log::Level::Info);

    if let Err(err) = web::start(config_from_window()) {
        log::error!("preloader start failed: {err:#}");
        return;
    }
    if let Err(err) = install_globals() {
        log::error!("failed to install preloader globals: {err:?}");
    }
}

#[wasm_bindgen(js_name = showPreloader)]
pub fn show_preloader(is_navigation: Option<bool>) {
    with_runtime(|rt| rt.coordinator.show(is_navigation.unwrap_or(false)));
}

#[wasm_bindgen(js_name = hidePreloader)]
pub fn hide_preloader(force: Option<bool>) {
    with_runtime(|rt| rt.coordinator.hide(force.unwrap_or(false)));
}

#[wasm_bindgen(js_name = updatePreloaderProgress)]
pub fn update_preloader_progress(percent: f64) {
    with_runtime(|rt| rt.coordinator.update_progress(percent));
}

#[wasm_bindgen(js_name = startPreloaderProgress)]
pub fn start_preloader_progress(duration_ms: Option<f64>) {
    let duration = duration_ms
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| Duration::from_millis(ms as u64));
    with_runtime(|rt| rt.coordinator.start_progress(duration));
}

#[wasm_bindgen(js_name = stopPreloaderProgress)]
pub fn stop_preloader_progress() {
    with_runtime(|rt| rt.coordinator.stop_progress());
}

#[wasm_bindgen(js_name = showPreloaderMessage)]
pub fn show_preloader_message(text: String) {
    with_runtime(|rt| rt.coordinator.show_busy(&text));
}

/// `names`: optional array of stage names
#[wasm_bindgen(js_name = runPreloaderStages)]
pub fn run_preloader_stages(names: JsValue) {
    let names = names.dyn_into::<Array>().ok().map(|arr| {
        arr.iter()
            .filter_map(|v| v.as_string())
            .collect::<Vec<String>>()
    });
    with_runtime(|rt| rt.coordinator.run_stages(names));
}

#[wasm_bindgen(js_name = markNavigationPending)]
pub fn mark_navigation_pending_js() {
    with_runtime(|rt| mark_navigation_pending(&mut *rt.store));
}

/// JSON view of the coordinator state
#[wasm_bindgen(js_name = preloaderDebug)]
pub fn preloader_debug() -> String {
    with_runtime(|rt| serde_json::to_string(&rt.coordinator.debug_snapshot()).ok())
        .flatten()
        .unwrap_or_else(|| "null".to_string())
}

#[wasm_bindgen(js_name = configurePreloader)]
pub fn configure_preloader(json: &str) -> Result<(), JsValue> {
    let cfg = PreloaderConfig::from_json_str(json).map_err(|e| JsValue::from_str(&format!("{e:#}")))?;
    with_runtime(|rt| rt.coordinator.set_config(cfg));
    Ok(())
}

fn expose(win: &web_sys::Window, name: &str, f: &Function) -> Result<(), JsValue> {
    Reflect::set(win, &JsValue::from_str(name), f)?;
    Ok(())
}

/// Install the global function surface on `window`
fn install_globals() -> Result<(), JsValue> {
    let win = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let show = Closure::<dyn Fn(JsValue)>::new(|v: JsValue| show_preloader(v.as_bool()));
    let hide = Closure::<dyn Fn(JsValue)>::new(|v: JsValue| hide_preloader(v.as_bool()));
    let update = Closure::<dyn Fn(JsValue)>::new(|v: JsValue| {
        update_preloader_progress(v.as_f64().unwrap_or(f64::NAN))
    });
    let start = Closure::<dyn Fn(JsValue)>::new(|v: JsValue| start_preloader_progress(v.as_f64()));
    let stop = Closure::<dyn Fn()>::new(stop_preloader_progress);
    let message = Closure::<dyn Fn(JsValue)>::new(|v: JsValue| {
        show_preloader_message(v.as_string().unwrap_or_default())
    });
    let stages = Closure::<dyn Fn(JsValue)>::new(run_preloader_stages);
    let mark = Closure::<dyn Fn()>::new(mark_navigation_pending_js);
    let debug = Closure::<dyn Fn() -> String>::new(preloader_debug);

    expose(&win, "showPreloader", show.as_ref().unchecked_ref())?;
    expose(&win, "hidePreloader", hide.as_ref().unchecked_ref())?;
    expose(&win, "updatePreloaderProgress", update.as_ref().unchecked_ref())?;
    expose(&win, "startPreloaderProgress", start.as_ref().unchecked_ref())?;
    expose(&win, "stopPreloaderProgress", stop.as_ref().unchecked_ref())?;
    expose(&win, "showPreloaderMessage", message.as_ref().unchecked_ref())?;
    expose(&win, "runPreloaderStages", stages.as_ref().unchecked_ref())?;
    expose(&win, "markNavigationPending", mark.as_ref().unchecked_ref())?;
    expose(&win, "preloaderDebug", debug.as_ref().unchecked_ref())?;

    // Page lifetime
    show.forget();
    hide.forget();
    update.forget();
    start.forget();
    stop.forget();
    message.forget();
    stages.forget();
    mark.forget();
    debug.forget();
    Ok(())
}
