//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Storage (LocalStorage on web, a JSON file natively)
//! - The JS-facing game handle (web only)

pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod web;

/// Install the logger for this platform (safe to call more than once)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}

/// Install the logger for this platform (safe to call more than once)
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("Logger already initialized");
    }
}
