//! Logging utilities for the CareCal workspace.
//!
//! Every crate logs through `tracing` macros; binaries call [`init`] or
//! [`init_with_level`] once at startup to install the subscriber.

use std::str::FromStr;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at INFO.
///
/// # Examples
///
/// ```
/// use carecal_common::logging;
///
/// logging::init();
/// logging::init_with_level(tracing::Level::DEBUG);
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific level for the `carecal`
/// targets. `RUST_LOG` directives are honoured on top of it.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(level: Level) {
    let mut filter = EnvFilter::from_default_env();
    for target in ["carecal", "carecal_schedule", "carecal_backend", "carecal_config"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize from a configured level name ("debug", "warn", ...).
/// Unknown names fall back to INFO.
pub fn init_from_str(level: &str) {
    init_with_level(parse_level(level));
}

/// Parses a level name case-insensitively, defaulting to INFO.
pub fn parse_level(level: &str) -> Level {
    Level::from_str(level.trim()).unwrap_or(Level::INFO)
}

/// Log a result, info on success and error with context on failure.
/// Returns the result unchanged.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
