//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with a default level, still overridable by `RUST_LOG`.
///
/// Unknown level names fall back to `info`. Calling this twice is harmless;
/// the second logger is discarded.
pub fn init_with_level(level: &str) {
    let filter = level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);
    let _ = env_logger::Builder::from_default_env()
        .filter_level(filter)
        .try_init();
}
