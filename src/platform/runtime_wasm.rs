//! Browser logging and panic reporting for the preloader.

use std::sync::Once;

use wasm_bindgen::JsValue;

/// Sends preloader log records to the devtools console, one console method
/// per level so warnings and errors stand out next to the page's own output.
struct DevtoolsLogger;

fn console_sink(level: log::Level) -> fn(&JsValue) {
    match level {
        log::Level::Error => web_sys::console::error_1,
        log::Level::Warn => web_sys::console::warn_1,
        log::Level::Info => web_sys::console::info_1,
        log::Level::Debug | log::Level::Trace => web_sys::console::log_1,
    }
}

impl log::Log for DevtoolsLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[preloader] {}: {}", record.target(), record.args()));
        console_sink(record.level())(&line);
    }

    fn flush(&self) {}
}

static DEVTOOLS_LOGGER: DevtoolsLogger = DevtoolsLogger;
static LOGGER_INSTALLED: Once = Once::new();
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install the devtools logger once; later calls only adjust the level
pub fn init_logging(level: log::Level) {
    LOGGER_INSTALLED.call_once(|| {
        if log::set_logger(&DEVTOOLS_LOGGER).is_err() {
            web_sys::console::warn_1(&JsValue::from_str(
                "[preloader] another logger is already installed",
            ));
        }
    });
    log::set_max_level(level.to_level_filter());
}

/// Route Rust panics to `console.error` with a stack trace
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    });
}
