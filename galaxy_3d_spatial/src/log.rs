//! Internal logging system for the Galaxy3D spatial index
//!
//! - Customizable logger via the Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - File and line information for ERROR logs
//!
//! The index never fails on caller misuse (unknown shape removal, an item
//! that could not be placed). Those paths report here at `Warn` instead.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_spatial::galaxy3d::log::{Logger, LogEntry};
///
/// struct CaptureLogger;
///
/// impl Logger for CaptureLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}", entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source type (e.g., "galaxy3d::QuadTree", "galaxy3d::Frustum")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Very verbose tracing (node splits, collapses)
    Trace,

    /// Development/debugging information
    Debug,

    /// Important informational messages
    Info,

    /// Caller misuse and recoverable anomalies
    Warn,

    /// Internal invariant violations (with file:line details)
    Error,
}

/// Default logger implementation using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry without colors, as written by `log`.
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        let severity = match entry.severity {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        };
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, entry.source, entry.message, file, line
            ),
            _ => format!("[{}] [{}] [{}] {}", timestamp, severity, entry.source, entry.message),
        }
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Trace => "TRACE".bright_black(),
            LogSeverity::Debug => "DEBUG".cyan(),
            LogSeverity::Info => "INFO ".green(),
            LogSeverity::Warn => "WARN ".yellow(),
            LogSeverity::Error => "ERROR".red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            );
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
#[macro_export]
macro_rules! spatial_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Diagnostics::log(
            $crate::galaxy3d::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! spatial_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Diagnostics::log(
            $crate::galaxy3d::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! spatial_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Diagnostics::log(
            $crate::galaxy3d::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
///
/// # Example
///
/// ```ignore
/// spatial_warn!("galaxy3d::QuadTree", "Shape {:?} not found", key);
/// ```
#[macro_export]
macro_rules! spatial_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Diagnostics::log(
            $crate::galaxy3d::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! spatial_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Diagnostics::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
