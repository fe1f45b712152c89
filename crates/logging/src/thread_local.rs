//! crates/logging/src/thread_local.rs
//! Thread-local storage for the most recent error raised on each thread.

use std::cell::RefCell;
use std::fmt;
use std::panic::Location;

use crate::error::{Error, ErrorCode, Result};

thread_local! {
    static LAST_ERROR: RefCell<ErrorRecord> = const { RefCell::new(ErrorRecord::none()) };
}

/// Where a failing call originated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorLocation {
    /// Source file of the caller.
    pub file: &'static str,
    /// Line of the caller.
    pub line: u32,
    /// Public operation that failed.
    pub function: &'static str,
}

/// Snapshot of the last outcome recorded on the current thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Error code, [`ErrorCode::NoError`] after a success.
    pub code: ErrorCode,
    /// OS error number for platform errors, zero otherwise.
    pub os_code: i32,
    /// OS error message for platform errors.
    pub os_message: Option<String>,
    /// Origin of the failing call.
    pub location: Option<ErrorLocation>,
    /// Human-readable description.
    pub message: String,
}

impl ErrorRecord {
    /// The record every thread starts with.
    pub const fn none() -> Self {
        Self {
            code: ErrorCode::NoError,
            os_code: 0,
            os_message: None,
            location: None,
            message: String::new(),
        }
    }

    /// Returns `true` unless the record describes a success.
    pub fn is_error(&self) -> bool {
        self.code != ErrorCode::NoError
    }

    /// Renders `Error in <function> (<file>:<line>): '<message>'`.
    pub fn formatted(&self) -> String {
        self.to_string()
    }
}

impl Default for ErrorRecord {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = if self.message.is_empty() {
            self.code.description()
        } else {
            self.message.as_str()
        };
        match &self.location {
            Some(loc) => write!(
                f,
                "Error in {} ({}:{}): '{}'",
                loc.function, loc.file, loc.line, message
            ),
            None => write!(f, "Error in <unknown> (<unknown>:0): '{message}'"),
        }
    }
}

/// Records `error` as the calling thread's last error.
#[track_caller]
pub fn set_error(function: &'static str, error: &Error) {
    let caller = Location::caller();
    let (os_code, os_message, message) = match error.os_error() {
        Some((code, text)) => (
            code,
            Some(text.clone()),
            format!("Platform error code {code}: {text}"),
        ),
        None => (0, None, error.to_string()),
    };
    let record = ErrorRecord {
        code: error.code(),
        os_code,
        os_message,
        location: Some(ErrorLocation {
            file: caller.file(),
            line: caller.line(),
            function,
        }),
        message,
    };
    LAST_ERROR.with(|slot| *slot.borrow_mut() = record);
}

/// Resets the calling thread's record to [`ErrorCode::NoError`].
pub fn clear_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = ErrorRecord::none());
}

/// Returns a copy of the calling thread's record without clearing it.
pub fn get_error() -> ErrorRecord {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Records the outcome of `function` and passes the result through.
#[track_caller]
pub fn track<T>(function: &'static str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => clear_error(),
        Err(err) => set_error(function, err),
    }
    result
}
