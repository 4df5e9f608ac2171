#![deny(missing_docs)]
//! Shared logging utilities for the recall workspace.
//!
//! This crate provides the `recall_*` logging macros used across the codebase,
//! a process-wide poll counter that prefixes every line, and a minimal test
//! initializer for the global logger.

use std::sync::atomic::{AtomicU64, Ordering};

/// Number of poll ticks handled by the runtime so far.
static POLL_TICK: AtomicU64 = AtomicU64::new(0);

/// Sets the poll tick count.
/// The runtime calls this once per handled poll tick.
pub fn set_poll_tick(tick: u64) {
    POLL_TICK.store(tick, Ordering::Relaxed);
}

/// Retrieves the poll tick count.
/// Returns 0 before the first tick.
pub fn get_poll_tick() -> u64 {
    POLL_TICK.load(Ordering::Relaxed)
}

/// Logs a trace-level message prefixed with the poll tick.
#[macro_export]
macro_rules! recall_trace {
    ($($arg:tt)*) => {{
        log::trace!("[poll {}] {}", $crate::get_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message prefixed with the poll tick.
#[macro_export]
macro_rules! recall_debug {
    ($($arg:tt)*) => {{
        log::debug!("[poll {}] {}", $crate::get_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message prefixed with the poll tick.
#[macro_export]
macro_rules! recall_info {
    ($($arg:tt)*) => {{
        log::info!("[poll {}] {}", $crate::get_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message prefixed with the poll tick.
#[macro_export]
macro_rules! recall_warn {
    ($($arg:tt)*) => {{
        log::warn!("[poll {}] {}", $crate::get_poll_tick(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message prefixed with the poll tick.
#[macro_export]
macro_rules! recall_error {
    ($($arg:tt)*) => {{
        log::error!("[poll {}] {}", $crate::get_poll_tick(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may have won the race to install the logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
