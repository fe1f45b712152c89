//! crates/logging-sink/src/header.rs
//! Captures per-message header values: time, hostname, pid, and thread id.
#![allow(unsafe_code)]

use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use logging::Header;
use time::{OffsetDateTime, UtcOffset};
use time::format_description::FormatItem;
use time::macros::format_description;

/// Time-of-day format used in message headers.
pub const TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

/// Date format used in file banners.
pub const BANNER_TIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[hour]:[minute]:[second] [weekday repr:short] [day] [month repr:short] [year] ([offset_hour sign:mandatory][offset_minute])"
);

/// Timestamp format embedded in archive file names.
pub const ARCHIVE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]-[hour][minute][second]");

/// How long a resolved hostname is trusted.
pub const HOSTNAME_REFRESH: Duration = Duration::from_secs(60);

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// The local UTC offset, resolved once per process.
///
/// The platform lookup is only reliable while the process is
/// single-threaded, so the first call should happen before worker threads
/// exist; [`HeaderSource::new`] makes it. Falls back to UTC.
pub fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Current wall-clock time in the local offset.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

/// Formats `when` with `format`, falling back to a fixed string.
pub fn format_time(when: OffsetDateTime, format: &[FormatItem<'_>]) -> String {
    when.format(format)
        .unwrap_or_else(|_| "00:00:00".to_owned())
}

/// Owned header values for one message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSnapshot {
    /// `HH:MM:SS`.
    pub timestamp: String,
    /// Milliseconds.
    pub msec: u16,
    /// Hostname, if resolvable.
    pub hostname: Option<String>,
    /// Process name, if configured.
    pub name: Option<String>,
    /// Process id.
    pub pid: u32,
    /// Thread id of the producer.
    pub tid: u64,
}

impl HeaderSnapshot {
    /// Borrowed view for rendering.
    pub fn header(&self) -> Header<'_> {
        Header {
            timestamp: &self.timestamp,
            msec: self.msec,
            hostname: self.hostname.as_deref(),
            name: self.name.as_deref(),
            pid: self.pid,
            tid: self.tid,
        }
    }
}

#[derive(Debug, Default)]
struct HostnameCache {
    value: Option<String>,
    fetched: Option<Instant>,
}

/// Produces [`HeaderSnapshot`]s, caching the hostname.
#[derive(Debug)]
pub struct HeaderSource {
    hostname: Mutex<HostnameCache>,
    pid: u32,
}

impl HeaderSource {
    /// Creates a source for the current process and pins the local offset.
    pub fn new() -> Self {
        let _ = local_offset();
        Self {
            hostname: Mutex::new(HostnameCache::default()),
            pid: std::process::id(),
        }
    }

    /// Captures header values for a message from the calling thread.
    pub fn capture(&self, name: Option<&str>) -> HeaderSnapshot {
        let now = local_now();
        HeaderSnapshot {
            timestamp: format_time(now, TIME_FORMAT),
            msec: now.millisecond(),
            hostname: self.hostname(),
            name: name.filter(|n| !n.is_empty()).map(str::to_owned),
            pid: self.pid,
            tid: current_tid(),
        }
    }

    /// Hostname, refreshed at most every [`HOSTNAME_REFRESH`].
    pub fn hostname(&self) -> Option<String> {
        let mut cache = self.hostname.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = cache
            .fetched
            .is_none_or(|at| at.elapsed() >= HOSTNAME_REFRESH);
        if stale {
            cache.value = lookup_hostname();
            cache.fetched = Some(Instant::now());
        }
        cache.value.clone()
    }
}

impl Default for HeaderSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn lookup_hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: the buffer is valid for `buf.len()` bytes and gethostname
    // writes at most that many.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).into_owned();
    (!name.is_empty()).then_some(name)
}

#[cfg(not(unix))]
fn lookup_hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|n| !n.is_empty())
}

/// Kernel thread id of the caller where available.
#[cfg(target_os = "linux")]
pub fn current_tid() -> u64 {
    // SAFETY: gettid has no preconditions.
    let tid = unsafe { libc::gettid() };
    tid as u64
}

/// Stable per-thread number where no kernel thread id is exposed.
#[cfg(not(target_os = "linux"))]
pub fn current_tid() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static TID: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TID.with(|tid| *tid)
}
