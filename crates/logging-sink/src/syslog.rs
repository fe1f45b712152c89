//! crates/logging-sink/src/syslog.rs
//! System logger destination.
//!
//! Uses libc `openlog`/`syslog`/`closelog` directly. Messages always pass
//! through a "%s" format so user text is never read as a format string.
#![allow(unsafe_code)]

use std::ffi::CString;
use std::fmt;
use std::path::Path;

use logging::{Error, Level, Result};

/// Identity used when neither an identity nor a process name is configured.
pub const FALLBACK_IDENTITY: &str = "fanlog";

/// Category used when none is configured.
pub const FALLBACK_CATEGORY: &str = "general";

/// Syslog facility codes matching the POSIX syslog(3) constants.
///
/// Each variant corresponds to a `LOG_*` facility from `<syslog.h>`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum SyslogFacility {
    /// Kernel messages (LOG_KERN).
    Kern = 0,
    /// User-level messages (LOG_USER), the default.
    #[default]
    User = 1 << 3,
    /// Mail system (LOG_MAIL).
    Mail = 2 << 3,
    /// System daemons (LOG_DAEMON).
    Daemon = 3 << 3,
    /// Security/authorization messages (LOG_AUTH).
    Auth = 4 << 3,
    /// Messages generated internally by syslogd (LOG_SYSLOG).
    Syslog = 5 << 3,
    /// Line printer subsystem (LOG_LPR).
    Lpr = 6 << 3,
    /// Network news subsystem (LOG_NEWS).
    News = 7 << 3,
    /// UUCP subsystem (LOG_UUCP).
    Uucp = 8 << 3,
    /// Clock daemon (LOG_CRON).
    Cron = 9 << 3,
    /// Reserved for local use (LOG_LOCAL0).
    Local0 = 16 << 3,
    /// Reserved for local use (LOG_LOCAL1).
    Local1 = 17 << 3,
    /// Reserved for local use (LOG_LOCAL2).
    Local2 = 18 << 3,
    /// Reserved for local use (LOG_LOCAL3).
    Local3 = 19 << 3,
    /// Reserved for local use (LOG_LOCAL4).
    Local4 = 20 << 3,
    /// Reserved for local use (LOG_LOCAL5).
    Local5 = 21 << 3,
    /// Reserved for local use (LOG_LOCAL6).
    Local6 = 22 << 3,
    /// Reserved for local use (LOG_LOCAL7).
    Local7 = 23 << 3,
}

impl SyslogFacility {
    /// Parses a facility name, case-insensitively.
    ///
    /// ```
    /// use logging_sink::syslog::SyslogFacility;
    ///
    /// assert_eq!(SyslogFacility::from_name("LOCAL3"), Some(SyslogFacility::Local3));
    /// assert_eq!(SyslogFacility::from_name("unknown"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "kern" => Some(Self::Kern),
            "user" => Some(Self::User),
            "mail" => Some(Self::Mail),
            "daemon" => Some(Self::Daemon),
            "auth" => Some(Self::Auth),
            "syslog" => Some(Self::Syslog),
            "lpr" => Some(Self::Lpr),
            "news" => Some(Self::News),
            "uucp" => Some(Self::Uucp),
            "cron" => Some(Self::Cron),
            "local0" => Some(Self::Local0),
            "local1" => Some(Self::Local1),
            "local2" => Some(Self::Local2),
            "local3" => Some(Self::Local3),
            "local4" => Some(Self::Local4),
            "local5" => Some(Self::Local5),
            "local6" => Some(Self::Local6),
            "local7" => Some(Self::Local7),
            _ => None,
        }
    }

    /// Lowercase facility name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kern => "kern",
            Self::User => "user",
            Self::Mail => "mail",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Syslog => "syslog",
            Self::Lpr => "lpr",
            Self::News => "news",
            Self::Uucp => "uucp",
            Self::Cron => "cron",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
        }
    }
}

impl fmt::Display for SyslogFacility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syslog severities, one per [`Level`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum SyslogPriority {
    /// LOG_EMERG.
    Emergency = 0,
    /// LOG_ALERT.
    Alert = 1,
    /// LOG_CRIT.
    Critical = 2,
    /// LOG_ERR.
    Error = 3,
    /// LOG_WARNING.
    Warning = 4,
    /// LOG_NOTICE.
    Notice = 5,
    /// LOG_INFO.
    Info = 6,
    /// LOG_DEBUG.
    Debug = 7,
}

impl From<Level> for SyslogPriority {
    fn from(level: Level) -> Self {
        match level {
            Level::Emergency => Self::Emergency,
            Level::Alert => Self::Alert,
            Level::Critical => Self::Critical,
            Level::Error => Self::Error,
            Level::Warning => Self::Warning,
            Level::Notice => Self::Notice,
            Level::Info => Self::Info,
            Level::Debug => Self::Debug,
        }
    }
}

/// Picks the syslog identity: explicit identity, then process name, then
/// the executable's file name, then [`FALLBACK_IDENTITY`].
pub fn resolve_identity(identity: Option<&str>, process_name: Option<&str>) -> String {
    identity
        .filter(|s| !s.is_empty())
        .or_else(|| process_name.filter(|s| !s.is_empty()))
        .map(str::to_owned)
        .or_else(|| {
            std::env::current_exe().ok().and_then(|exe| {
                Path::new(&exe)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_IDENTITY.to_owned())
}

/// Picks the syslog category, falling back to [`FALLBACK_CATEGORY`].
pub fn resolve_category(category: Option<&str>) -> String {
    category
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_CATEGORY)
        .to_owned()
}

/// An open connection to the system logger.
///
/// syslog(3) keeps the identity pointer passed to `openlog`, so the
/// connection owns that string and closes the log before releasing it.
/// Only one connection should be live per process.
#[derive(Debug)]
pub struct SyslogConnection {
    identity: CString,
    category: String,
    facility: SyslogFacility,
}

impl SyslogConnection {
    /// Opens the system logger with `identity` and `facility`.
    pub fn open(identity: &str, category: &str, facility: SyslogFacility) -> Result<Self> {
        let identity =
            CString::new(identity).map_err(|_| Error::InvalidString("syslog identity"))?;
        let connection = Self {
            identity,
            category: category.to_owned(),
            facility,
        };
        connection.open_raw()?;
        Ok(connection)
    }

    #[cfg(unix)]
    fn open_raw(&self) -> Result<()> {
        // SAFETY: the identity pointer stays valid until `Drop` calls
        // closelog, because `self.identity` is dropped after that call.
        unsafe {
            libc::openlog(
                self.identity.as_ptr(),
                libc::LOG_PID,
                self.facility as libc::c_int,
            );
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn open_raw(&self) -> Result<()> {
        Err(Error::Unavailable("syslog is not supported on this platform".into()))
    }

    /// Identity the log was opened with.
    pub fn identity(&self) -> &str {
        self.identity.to_str().unwrap_or(FALLBACK_IDENTITY)
    }

    /// Configured category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Configured facility.
    pub const fn facility(&self) -> SyslogFacility {
        self.facility
    }

    /// Sends `message` at the priority matching `level`.
    pub fn write(&self, level: Level, message: &str) -> Result<()> {
        let message = message.trim_end_matches('\n');
        let c_message = CString::new(message).map_err(|_| Error::InvalidString("syslog message"))?;
        self.write_raw(SyslogPriority::from(level), &c_message);
        Ok(())
    }

    #[cfg(unix)]
    fn write_raw(&self, priority: SyslogPriority, message: &CString) {
        const FORMAT: &[u8] = b"%s\0";
        // SAFETY: openlog ran in `open`; format and message are valid C
        // strings, and "%s" consumes exactly the one argument supplied.
        unsafe {
            libc::syslog(
                priority as libc::c_int,
                FORMAT.as_ptr().cast::<libc::c_char>(),
                message.as_ptr(),
            );
        }
    }

    #[cfg(not(unix))]
    fn write_raw(&self, _priority: SyslogPriority, _message: &CString) {}
}

impl Drop for SyslogConnection {
    fn drop(&mut self) {
        #[cfg(unix)]
        // SAFETY: closelog has no preconditions; afterwards syslog no longer
        // references `self.identity`.
        unsafe {
            libc::closelog();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_facility_is_user() {
        assert_eq!(SyslogFacility::default(), SyslogFacility::User);
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(SyslogFacility::from_name("DAEMON"), Some(SyslogFacility::Daemon));
        assert_eq!(SyslogFacility::from_name("Local0"), Some(SyslogFacility::Local0));
        assert_eq!(SyslogFacility::from_name("local8"), None);
    }

    #[test]
    fn as_str_round_trips_with_from_name() {
        for facility in [
            SyslogFacility::Kern,
            SyslogFacility::User,
            SyslogFacility::Cron,
            SyslogFacility::Local7,
        ] {
            assert_eq!(SyslogFacility::from_name(facility.as_str()), Some(facility));
        }
    }

    #[cfg(unix)]
    #[test]
    fn values_match_libc_constants() {
        assert_eq!(SyslogFacility::Kern as i32, libc::LOG_KERN);
        assert_eq!(SyslogFacility::User as i32, libc::LOG_USER);
        assert_eq!(SyslogFacility::Daemon as i32, libc::LOG_DAEMON);
        assert_eq!(SyslogFacility::Local0 as i32, libc::LOG_LOCAL0);
        assert_eq!(SyslogFacility::Local7 as i32, libc::LOG_LOCAL7);
        assert_eq!(SyslogPriority::Emergency as i32, libc::LOG_EMERG);
        assert_eq!(SyslogPriority::Error as i32, libc::LOG_ERR);
        assert_eq!(SyslogPriority::Debug as i32, libc::LOG_DEBUG);
    }

    #[test]
    fn priority_follows_level() {
        for level in Level::ALL {
            assert_eq!(SyslogPriority::from(level) as i32, i32::from(level as u8));
        }
    }

    #[test]
    fn identity_resolution_order() {
        assert_eq!(resolve_identity(Some("svc"), Some("app")), "svc");
        assert_eq!(resolve_identity(Some(""), Some("app")), "app");
        assert!(!resolve_identity(None, None).is_empty());
    }

    #[test]
    fn category_falls_back_to_general() {
        assert_eq!(resolve_category(None), FALLBACK_CATEGORY);
        assert_eq!(resolve_category(Some("net")), "net");
    }

    #[test]
    fn identity_with_nul_rejected() {
        assert!(matches!(
            SyslogConnection::open("bad\0id", "general", SyslogFacility::User),
            Err(Error::InvalidString(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn write_after_open_succeeds() {
        let conn = SyslogConnection::open("fanlog-test", "general", SyslogFacility::User).unwrap();
        assert_eq!(conn.identity(), "fanlog-test");
        conn.write(Level::Debug, "probe with % signs %s\n").unwrap();
        assert!(conn.write(Level::Info, "nul\0inside").is_err());
    }
}
