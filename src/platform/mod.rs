//! Platform abstraction (logging, panic hook).

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "wasm32", feature = "dom-web"))] {
        mod runtime_wasm;
        pub use runtime_wasm::{init_logging, install_panic_hook};
    } else {
        mod runtime_native;
        pub use runtime_native::{init_logging, install_panic_hook};
    }
}
