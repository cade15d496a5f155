//! Log sink setup
//!
//! Safe to call more than once; only the first call installs a logger.

use log::LevelFilter;

/// Install the platform logger at `level` (WASM: browser console)
#[cfg(target_arch = "wasm32")]
pub fn init(level: LevelFilter) {
    console_error_panic_hook::set_once();
    let console_level = level.to_level().unwrap_or(log::Level::Error);
    if console_log::init_with_level(console_level).is_err() {
        log::debug!("Console logger already installed");
    }
    log::set_max_level(level);
}

/// Install the platform logger at `level` (native: env_logger, `RUST_LOG` wins)
#[cfg(not(target_arch = "wasm32"))]
pub fn init(level: LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
    if result.is_err() {
        log::debug!("Logger already installed");
    }
}
