//! # Logging Module
//!
//! Process-wide `tracing` setup shared by the workspace binaries.

/// Subscriber construction and log file housekeeping.
pub mod loggerlocal;

pub use loggerlocal::{cleanup_old_logs, init_logging, LoggingGuard, LoggingOptions};
