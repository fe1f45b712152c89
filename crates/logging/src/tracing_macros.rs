//! crates/logging/src/tracing_macros.rs
//! Convenience macros for fanlog self-diagnostics.
//!
//! These macros wrap the standard tracing macros with a target per fanlog
//! subsystem, so an application can filter the core's own chatter with
//! `RUST_LOG=fanlog::file=debug` and similar directives.

/// Emit a configuration change trace.
///
/// # Example
/// ```ignore
/// trace_config!(destination = "stdout", "levels updated");
/// ```
#[macro_export]
macro_rules! trace_config {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fanlog::config", $($arg)*);
    };
}

/// Emit a file destination trace.
///
/// # Example
/// ```ignore
/// trace_file!(path = %path.display(), "rotated");
/// ```
#[macro_export]
macro_rules! trace_file {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fanlog::file", $($arg)*);
    };
}

/// Emit a plugin registry trace.
///
/// # Example
/// ```ignore
/// trace_plugin!(id = %id, "loaded");
/// ```
#[macro_export]
macro_rules! trace_plugin {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fanlog::plugin", $($arg)*);
    };
}

/// Emit a worker pool trace.
///
/// # Example
/// ```ignore
/// trace_pool!(workers = 4, "pool started");
/// ```
#[macro_export]
macro_rules! trace_pool {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "fanlog::pool", $($arg)*);
    };
}

/// Emit a squelch controller trace.
///
/// # Example
/// ```ignore
/// trace_squelch!(count, "suppression ended");
/// ```
#[macro_export]
macro_rules! trace_squelch {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "fanlog::squelch", $($arg)*);
    };
}

/// Emit a dispatch failure trace.
///
/// # Example
/// ```ignore
/// trace_dispatch!(destination = "syslog", error = %err, "write failed");
/// ```
#[macro_export]
macro_rules! trace_dispatch {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: "fanlog::dispatch", $($arg)*);
    };
}
