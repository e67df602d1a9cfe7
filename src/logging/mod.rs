//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable log levels
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use tabex::logging::init_logging;
//! use tabex::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export operation
///
/// # Example
///
/// ```no_run
/// use tabex::log_export_start;
///
/// log_export_start!("csv", "orders");
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($format:expr, $filename:expr) => {
        tracing::info!(
            format = $format,
            filename = %$filename,
            "Starting export"
        );
    };
}

/// Log the completion of an export operation
///
/// # Example
///
/// ```no_run
/// use tabex::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!(42, 2, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($rows:expr, $chunks:expr, $duration:expr) => {
        tracing::info!(
            rows = $rows,
            chunks = $chunks,
            duration_ms = $duration.as_millis(),
            "Export completed"
        );
    };
}

/// Log one finished chunk
///
/// # Example
///
/// ```no_run
/// use tabex::log_chunk_written;
///
/// log_chunk_written!(1, 100_000, 250_000);
/// ```
#[macro_export]
macro_rules! log_chunk_written {
    ($index:expr, $rows:expr, $total:expr) => {
        tracing::debug!(
            chunk = $index,
            rows = $rows,
            total = $total,
            "Chunk written"
        );
    };
}

/// Log a cleanup failure that must not mask the primary result
///
/// # Example
///
/// ```no_run
/// use tabex::log_cleanup_failure;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "busy");
/// log_cleanup_failure!("/tmp/export_0.csv", err);
/// ```
#[macro_export]
macro_rules! log_cleanup_failure {
    ($path:expr, $error:expr) => {
        tracing::warn!(
            path = %$path,
            error = %$error,
            "Failed to remove temporary file"
        );
    };
}
