/// Route `log` records to stderr via env_logger; `RUST_LOG` overrides `level`
#[cfg(feature = "native")]
pub fn init_logging(level: log::Level) {
    let default = level.to_string().to_lowercase();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

#[cfg(not(feature = "native"))]
pub fn init_logging(level: log::Level) {
    log::set_max_level(level.to_level_filter());
}

pub fn install_panic_hook() {}
