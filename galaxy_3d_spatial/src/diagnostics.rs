/// Diagnostics: global logger singleton for the spatial index.
///
/// The logger is stored in thread-safe static storage with an RwLock so
/// that a fork/join query running on worker threads can still report.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Access point for the global logger.
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_spatial::galaxy3d::{Diagnostics, log::{Logger, LogEntry}};
///
/// struct FileLogger;
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// Diagnostics::set_logger(FileLogger);
/// ```
pub struct Diagnostics;

impl Diagnostics {
    fn logger() -> &'static RwLock<Box<dyn Logger>> {
        LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
    }

    /// Replace the current logger.
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = Self::logger().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = Self::logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Log without file:line. Used by `spatial_info!`, `spatial_warn!`, etc.
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level
    /// * `source` - Source type (e.g., "galaxy3d::QuadTree")
    /// * `message` - Log message
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = Self::logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line information. Used by `spatial_error!`.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = Self::logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}
