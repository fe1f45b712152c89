//! crates/logging/src/error.rs
//!
//! Error taxonomy shared by every fanlog subsystem.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type for fanlog operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by fanlog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The logger has not been initialized, or was cleaned up.
    #[error("fanlog is not ready")]
    NotReady,
    /// `initialize` was called on a running logger.
    #[error("fanlog is already initialized")]
    AlreadyInitialized,
    /// The item is already registered.
    #[error("item already exists: {0}")]
    DuplicateItem(String),
    /// No live item matches the identifier.
    #[error("no such item: {0}")]
    NoItem(String),
    /// A bounded registry is full.
    #[error("no room for another {what} (capacity {capacity})")]
    NoRoom {
        /// Kind of registry.
        what: &'static str,
        /// Configured capacity.
        capacity: usize,
    },
    /// Option bits outside the valid range.
    #[error("invalid option flags: {0:#x}")]
    InvalidOptions(u32),
    /// Level bits outside the valid range.
    #[error("invalid level flags: {0:#x}")]
    InvalidLevels(u16),
    /// The style cannot be installed.
    #[error("invalid text style: {0}")]
    InvalidTextStyle(String),
    /// A required string was empty or contained a NUL byte.
    #[error("invalid string: {0}")]
    InvalidString(&'static str),
    /// Any other malformed argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// No destination accepts messages at the given level.
    #[error("no destination is configured for this level")]
    NoDestination,
    /// The feature or resource is not available.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// An internal invariant failed.
    #[error("internal error: {0}")]
    Internal(String),
    /// Unknown color mode value.
    #[error("invalid color mode: {0}")]
    InvalidColorMode(u8),
    /// Unknown text attribute value.
    #[error("invalid text attribute: {0}")]
    InvalidTextAttr(u8),
    /// The color is not expressible in the active color mode.
    #[error("invalid text color: {0}")]
    InvalidTextColor(String),
    /// The plugin interface descriptor is malformed.
    #[error("malformed plugin interface: {0}")]
    PluginMalformed(String),
    /// The plugin descriptor carries invalid data.
    #[error("invalid plugin data: {0}")]
    PluginData(String),
    /// The plugin targets an unsupported interface major version.
    #[error("unsupported plugin interface version {found} (supported: {supported})")]
    PluginVersion {
        /// Major version declared by the plugin.
        found: u16,
        /// Major version this build supports.
        supported: u16,
    },
    /// The plugin reported a failure.
    #[error("plugin failure: {0}")]
    PluginFailure(String),
    /// An operating-system call failed.
    #[error("platform error: {0}")]
    Platform(
        #[from]
        #[source]
        io::Error,
    ),
    /// The job queue stayed full for the whole enqueue timeout.
    #[error("job queue full after waiting {timeout:?}")]
    QueueFull {
        /// How long the producer waited.
        timeout: Duration,
    },
}

impl Error {
    /// Stable numeric code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotReady => ErrorCode::NotReady,
            Self::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            Self::DuplicateItem(_) => ErrorCode::DuplicateItem,
            Self::NoItem(_) => ErrorCode::NoItem,
            Self::NoRoom { .. } => ErrorCode::NoRoom,
            Self::InvalidOptions(_) => ErrorCode::InvalidOptions,
            Self::InvalidLevels(_) => ErrorCode::InvalidLevels,
            Self::InvalidTextStyle(_) => ErrorCode::InvalidTextStyle,
            Self::InvalidString(_) => ErrorCode::InvalidString,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::NoDestination => ErrorCode::NoDestination,
            Self::Unavailable(_) => ErrorCode::Unavailable,
            Self::Internal(_) => ErrorCode::Internal,
            Self::InvalidColorMode(_) => ErrorCode::InvalidColorMode,
            Self::InvalidTextAttr(_) => ErrorCode::InvalidTextAttr,
            Self::InvalidTextColor(_) => ErrorCode::InvalidTextColor,
            Self::PluginMalformed(_) => ErrorCode::PluginMalformed,
            Self::PluginData(_) => ErrorCode::PluginData,
            Self::PluginVersion { .. } => ErrorCode::PluginVersion,
            Self::PluginFailure(_) => ErrorCode::PluginFailure,
            Self::Platform(_) => ErrorCode::Platform,
            Self::QueueFull { .. } => ErrorCode::QueueFull,
        }
    }

    /// Taxonomy bucket for this error.
    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// OS error number and message, for platform errors.
    pub fn os_error(&self) -> Option<(i32, String)> {
        match self {
            Self::Platform(err) => Some((err.raw_os_error().unwrap_or(0), err.to_string())),
            _ => None,
        }
    }

    /// Builds an internal error for a poisoned subsystem lock.
    pub fn poisoned(subsystem: &str) -> Self {
        Self::Internal(format!("{subsystem} lock poisoned"))
    }

    /// Returns a duplicate of this error; platform errors keep kind and message.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        match self {
            Self::NotReady => Self::NotReady,
            Self::AlreadyInitialized => Self::AlreadyInitialized,
            Self::DuplicateItem(s) => Self::DuplicateItem(s.clone()),
            Self::NoItem(s) => Self::NoItem(s.clone()),
            Self::NoRoom { what, capacity } => Self::NoRoom {
                what: *what,
                capacity: *capacity,
            },
            Self::InvalidOptions(b) => Self::InvalidOptions(*b),
            Self::InvalidLevels(b) => Self::InvalidLevels(*b),
            Self::InvalidTextStyle(s) => Self::InvalidTextStyle(s.clone()),
            Self::InvalidString(s) => Self::InvalidString(*s),
            Self::InvalidArgument(s) => Self::InvalidArgument(s.clone()),
            Self::NoDestination => Self::NoDestination,
            Self::Unavailable(s) => Self::Unavailable(s.clone()),
            Self::Internal(s) => Self::Internal(s.clone()),
            Self::InvalidColorMode(m) => Self::InvalidColorMode(*m),
            Self::InvalidTextAttr(a) => Self::InvalidTextAttr(*a),
            Self::InvalidTextColor(s) => Self::InvalidTextColor(s.clone()),
            Self::PluginMalformed(s) => Self::PluginMalformed(s.clone()),
            Self::PluginData(s) => Self::PluginData(s.clone()),
            Self::PluginVersion { found, supported } => Self::PluginVersion {
                found: *found,
                supported: *supported,
            },
            Self::PluginFailure(s) => Self::PluginFailure(s.clone()),
            Self::Platform(err) => Self::Platform(match err.raw_os_error() {
                Some(code) => io::Error::from_raw_os_error(code),
                None => io::Error::new(err.kind(), err.to_string()),
            }),
            Self::QueueFull { timeout } => Self::QueueFull { timeout: *timeout },
        }
    }
}

/// Stable numeric error codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// The operation succeeded.
    NoError = 0,
    /// Not initialized.
    NotReady = 1,
    /// Already initialized.
    AlreadyInitialized = 2,
    /// Duplicate item.
    DuplicateItem = 3,
    /// Unknown item.
    NoItem = 4,
    /// Registry full.
    NoRoom = 5,
    /// Invalid option flags.
    InvalidOptions = 6,
    /// Invalid level flags.
    InvalidLevels = 7,
    /// Invalid text style.
    InvalidTextStyle = 8,
    /// Invalid string.
    InvalidString = 9,
    /// Invalid argument.
    InvalidArgument = 11,
    /// No destination for the level.
    NoDestination = 12,
    /// Feature unavailable.
    Unavailable = 13,
    /// Internal error.
    Internal = 14,
    /// Invalid color mode.
    InvalidColorMode = 15,
    /// Invalid text attribute.
    InvalidTextAttr = 16,
    /// Invalid text color.
    InvalidTextColor = 17,
    /// Malformed plugin.
    PluginMalformed = 18,
    /// Invalid plugin data.
    PluginData = 19,
    /// Unsupported plugin version.
    PluginVersion = 20,
    /// Plugin failure.
    PluginFailure = 21,
    /// Platform error.
    Platform = 22,
    /// Job queue full.
    QueueFull = 23,
    /// Unclassified.
    Unknown = 4095,
}

impl ErrorCode {
    /// Numeric value.
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Looks up a code by number; unknown numbers map to [`ErrorCode::Unknown`].
    pub const fn from_u16(value: u16) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::NotReady,
            2 => Self::AlreadyInitialized,
            3 => Self::DuplicateItem,
            4 => Self::NoItem,
            5 => Self::NoRoom,
            6 => Self::InvalidOptions,
            7 => Self::InvalidLevels,
            8 => Self::InvalidTextStyle,
            9 => Self::InvalidString,
            11 => Self::InvalidArgument,
            12 => Self::NoDestination,
            13 => Self::Unavailable,
            14 => Self::Internal,
            15 => Self::InvalidColorMode,
            16 => Self::InvalidTextAttr,
            17 => Self::InvalidTextColor,
            18 => Self::PluginMalformed,
            19 => Self::PluginData,
            20 => Self::PluginVersion,
            21 => Self::PluginFailure,
            22 => Self::Platform,
            23 => Self::QueueFull,
            _ => Self::Unknown,
        }
    }

    /// Short human-readable description.
    pub const fn description(self) -> &'static str {
        match self {
            Self::NoError => "The operation completed successfully",
            Self::NotReady => "fanlog has not been initialized",
            Self::AlreadyInitialized => "fanlog is already initialized",
            Self::DuplicateItem => "Item already exists",
            Self::NoItem => "Item not found",
            Self::NoRoom => "Maximum number of items already stored",
            Self::InvalidOptions => "Option flags are invalid",
            Self::InvalidLevels => "Level flags are invalid",
            Self::InvalidTextStyle => "Text style is invalid",
            Self::InvalidString => "Invalid string argument",
            Self::InvalidArgument => "Invalid argument",
            Self::NoDestination => "No destinations registered for level",
            Self::Unavailable => "Feature is disabled or unavailable",
            Self::Internal => "An internal error has occurred",
            Self::InvalidColorMode => "Color mode is invalid",
            Self::InvalidTextAttr => "Text attributes are invalid",
            Self::InvalidTextColor => "Text color is invalid",
            Self::PluginMalformed => "Plugin interface is malformed",
            Self::PluginData => "Plugin data is malformed",
            Self::PluginVersion => "Plugin interface version unsupported",
            Self::PluginFailure => "Plugin reported failure",
            Self::Platform => "Platform error",
            Self::QueueFull => "Job queue is full",
            Self::Unknown => "Unknown error",
        }
    }

    /// Taxonomy bucket.
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::NoError => ErrorCategory::None,
            Self::InvalidOptions
            | Self::InvalidLevels
            | Self::InvalidTextStyle
            | Self::InvalidString
            | Self::InvalidArgument
            | Self::InvalidColorMode
            | Self::InvalidTextAttr
            | Self::InvalidTextColor => ErrorCategory::Configuration,
            Self::NotReady | Self::AlreadyInitialized => ErrorCategory::State,
            Self::DuplicateItem
            | Self::NoItem
            | Self::NoRoom
            | Self::NoDestination
            | Self::Unavailable
            | Self::QueueFull => ErrorCategory::Resource,
            Self::PluginMalformed
            | Self::PluginData
            | Self::PluginVersion
            | Self::PluginFailure => ErrorCategory::Plugin,
            Self::Platform => ErrorCategory::Platform,
            Self::Internal | Self::Unknown => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Error taxonomy buckets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No error.
    None,
    /// Invalid levels, options, styles, or arguments.
    Configuration,
    /// Lifecycle misuse.
    State,
    /// Duplicate or unknown items, full registries or queues.
    Resource,
    /// Plugin loading or execution failures.
    Plugin,
    /// Wrapped operating-system failures.
    Platform,
    /// Invariant violations.
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn platform_error_from_io_error() {
        let err: Error = io::Error::new(ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(err.code(), ErrorCode::Platform);
        assert_eq!(err.category(), ErrorCategory::Platform);
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn os_error_carries_raw_code() {
        let err: Error = io::Error::from_raw_os_error(2).into();
        let (code, message) = err.os_error().unwrap();
        assert_eq!(code, 2);
        assert!(!message.is_empty());
        assert!(Error::NotReady.os_error().is_none());
    }

    #[test]
    fn codes_round_trip_through_numbers() {
        for value in 0..=30 {
            let code = ErrorCode::from_u16(value);
            if code != ErrorCode::Unknown {
                assert_eq!(code.as_u16(), value);
            }
        }
        assert_eq!(ErrorCode::from_u16(10), ErrorCode::Unknown);
        assert_eq!(ErrorCode::Unknown.as_u16(), 4095);
    }

    #[test]
    fn categories_match_taxonomy() {
        assert_eq!(
            Error::InvalidLevels(0x400).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(Error::NotReady.category(), ErrorCategory::State);
        assert_eq!(
            Error::QueueFull {
                timeout: Duration::from_millis(5)
            }
            .category(),
            ErrorCategory::Resource
        );
        assert_eq!(
            Error::PluginVersion {
                found: 2,
                supported: 1
            }
            .category(),
            ErrorCategory::Plugin
        );
        assert_eq!(
            Error::poisoned("file cache").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn duplicate_preserves_code_and_message() {
        let original: Error = io::Error::from_raw_os_error(13).into();
        let copy = original.duplicate();
        assert_eq!(copy.code(), ErrorCode::Platform);
        assert_eq!(copy.os_error().unwrap().0, 13);

        let original = Error::NoRoom {
            what: "file",
            capacity: 16,
        };
        assert_eq!(original.duplicate().to_string(), original.to_string());
    }

    #[test]
    fn error_source_for_platform() {
        use std::error::Error as _;

        let err: Error = io::Error::other("boom").into();
        assert!(err.source().is_some());
        assert!(Error::NoDestination.source().is_none());
    }
}
