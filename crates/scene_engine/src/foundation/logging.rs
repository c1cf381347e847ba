//! Logging utilities
//!
//! The crate logs through the `log` facade; applications pick a backend.
//! These helpers wire up `env_logger` for binaries and tests.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default filter when `RUST_LOG` is unset
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Capture-friendly logger for unit tests; safe to call repeatedly
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
