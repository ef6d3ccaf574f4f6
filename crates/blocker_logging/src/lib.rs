#![deny(missing_docs)]
//! Shared logging utilities for the blocker workspace.
//!
//! This crate provides the `blocker_*` logging macros used across the codebase,
//! a thread-local action context that prefixes every line emitted while a
//! moderation action is in flight, and a minimal test initializer for the
//! global logger.

use std::cell::Cell;

thread_local! {
    /// Id of the moderation action currently being driven on this thread.
    static ACTION: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Marks `action_id` as the action in flight for the current thread.
/// The pipeline calls this whenever it starts executing effects for an action.
pub fn set_action_context(action_id: Option<u64>) {
    ACTION.with(|v| v.set(action_id));
}

/// Returns the action currently in flight on this thread, if any.
pub fn action_context() -> Option<u64> {
    ACTION.with(|v| v.get())
}

/// Renders the prefix used by the logging macros: `[action 7] ` or nothing.
#[doc(hidden)]
pub fn __context_prefix() -> String {
    match action_context() {
        Some(id) => format!("[action {id}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! blocker_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::__context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! blocker_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::__context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! blocker_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::__context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! blocker_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::__context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! blocker_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::__context_prefix(), format_args!($($arg)*));
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

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
