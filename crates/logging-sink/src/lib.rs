#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` holds the output half of the fanlog core: every place a
//! rendered line can end up. Policy (levels, options, styles, squelch) lives
//! in the `logging` crate; the root `fanlog` crate ties both together.
//!
//! # Design
//!
//! - [`console`] writes whole lines to stdout or stderr under the stream
//!   lock and decides whether a stream gets styled output.
//! - [`syslog`] wraps `openlog`/`syslog`/`closelog` with an owned identity.
//! - [`file::FileCache`] is a bounded registry of open log files behind one
//!   lock. Writes rotate a file once it would cross the roll threshold.
//! - [`plugin::PluginRegistry`] loads plugins through a
//!   [`plugin::PluginLoader`], negotiates the interface version, and tracks
//!   per-plugin health.
//! - [`pool::WorkerPool`] moves plugin writes off producer threads through a
//!   bounded `crossbeam-channel` queue.
//! - [`header::HeaderSource`] captures the time, hostname, pid, and thread id
//!   shared by every destination rendering one message.
//!
//! File and plugin ids are generation-checked [`arena::SlotKey`]s, so an id
//! never addresses a later occupant of the same slot.
//!
//! # Invariants
//!
//! - A [`file::FileCache`] never holds more entries than its capacity, and
//!   no two live entries share a normalized path or (on Unix) device and
//!   inode.
//! - Each plugin receives its jobs in the order they were submitted.
//! - No lock is held while a plugin's `write` runs on a producer thread;
//!   plugin code only runs on pool workers or inside registry load/unload.
//!
//! # Errors
//!
//! Every fallible operation returns [`logging::Error`]. I/O failures surface
//! as [`logging::Error::Platform`] with the OS error attached.
//!
//! # Examples
//!
//! Append a line to a file destination:
//!
//! ```
//! use logging::{DestinationConfig, Level, LevelSet, OptionSet};
//! use logging_sink::file::FileCache;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let cache = FileCache::default();
//! let id = cache
//!     .add(dir.path().join("app.log"), DestinationConfig::new(LevelSet::ALL, OptionSet::NO_HEADER))
//!     .unwrap();
//! cache.write(id, b"started\n").unwrap();
//! assert_eq!(cache.stats(id).unwrap().size, 8);
//! ```

pub mod arena;
pub mod console;
pub mod file;
pub mod header;
pub mod plugin;
pub mod pool;
pub mod syslog;

pub use console::{ConsoleStream, StylePolicy};
pub use file::{ArchiveNaming, FileCache, FileId, RotationPolicy};
pub use header::{HeaderSnapshot, HeaderSource};
pub use plugin::{Plugin, PluginCatalog, PluginId, PluginInfo, PluginLoader, PluginRegistry};
pub use pool::{JobTarget, PoolConfig, WorkerPool};
pub use syslog::{SyslogConnection, SyslogFacility};
