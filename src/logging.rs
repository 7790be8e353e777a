//! Leveled logging for the command wrappers and engines.
//!
//! The level is fixed once per process from the `--verbose` flag. Progress
//! detail (`log_debug!`) only appears in verbose runs; warnings and errors
//! always go to stderr so they survive piping of normal output.

use crate::styles;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

static LOG_LEVEL: OnceLock<LogLevel> = OnceLock::new();

/// Set the process log level. Later calls are ignored.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    LOG_LEVEL.set(level).ok();
}

fn current_level() -> LogLevel {
    *LOG_LEVEL.get().unwrap_or(&LogLevel::Info)
}

pub fn log(level: LogLevel, message: &str) {
    if level > current_level() {
        return;
    }

    match level {
        LogLevel::Error => eprintln!("Error: {message}"),
        LogLevel::Warning => {
            if styles::colors_enabled_stderr() {
                eprintln!("{}Warning:{} {message}", styles::YELLOW, styles::RESET);
            } else {
                eprintln!("Warning: {message}");
            }
        }
        LogLevel::Info => println!("{message}"),
        LogLevel::Debug => println!("  {message}"),
    }
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Error, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Warning, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Debug, &format!($($arg)*))
    };
}
