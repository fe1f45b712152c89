#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `fanlog` is an embeddable logging core. Callers hand it a level and an
//! already formatted message; it filters the message per destination,
//! composes a header for each, and fans it out to standard output, standard
//! error, the system logger, any number of rotating log files, and plugins
//! running on a worker pool.
//!
//! # Design
//!
//! The workspace splits into three layers:
//!
//! - `logging`: level and option sets, text styles, the error taxonomy with
//!   its thread-local error record, and the squelch controller.
//! - `logging-sink`: the destinations themselves, each owning its state
//!   behind its own lock: console streams, syslog, the bounded
//!   [`FileCache`] with size-based rotation, the [`PluginRegistry`], and the
//!   plugin [`WorkerPool`].
//! - this crate: [`InitConfig`], the [`ConfigurationRegistry`] of built-in
//!   destinations, the dispatch path, and the [`Logger`] context object with
//!   its process-wide [`global`] facade.
//!
//! Producers write to console, syslog, and files on their own thread. Plugin
//! delivery is queued and executed by worker threads, so a slow plugin never
//! blocks a producer for longer than the bounded enqueue wait.
//!
//! # Invariants
//!
//! - The file cache and plugin registry never exceed their capacities, and
//!   no two live files share a normalized path.
//! - Writes to one file are totally ordered; each plugin receives its
//!   messages in enqueue order.
//! - A failing destination never prevents delivery to the others.
//! - `cleanup` runs every queued plugin job before it returns.
//!
//! # Errors
//!
//! Every operation returns [`Result`] with the shared [`Error`] type and
//! records its outcome in the calling thread's [`ErrorRecord`]; see
//! [`Logger::get_last_error`].
//!
//! # Examples
//!
//! ```
//! use fanlog::{InitConfig, Level, LevelSet, Logger, OptionSet};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("errors.log");
//!
//! let logger = Logger::new();
//! logger
//!     .initialize(InitConfig::silent().with_file(
//!         &path,
//!         LevelSet::at_least(Level::Error),
//!         OptionSet::NO_HOST | OptionSet::NO_HEADER,
//!     ))
//!     .unwrap();
//!
//! assert!(logger.info("not written").is_err());
//! logger.error("disk almost full").unwrap();
//! logger.cleanup().unwrap();
//!
//! let text = std::fs::read_to_string(&path).unwrap();
//! assert_eq!(text.lines().count(), 1);
//! assert!(text.contains("[erro]"));
//! ```

mod config;
mod dispatch;
pub mod global;
mod logger;
mod registry;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::{FileSpec, InitConfig};
pub use logger::Logger;
pub use registry::{ConfigSnapshot, ConfigurationRegistry};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{FanlogLayer, init_tracing, init_tracing_with_filter};

pub use logging::{
    Clock, ColorMode, DestinationConfig, DestinationKind, Error, ErrorCategory, ErrorCode,
    ErrorLocation, ErrorRecord, Level, LevelSet, ManualClock, OptionSet, Result, SquelchPolicy,
    SquelchState, SystemClock, TextAttr, TextColor, TextStyle,
};
pub use logging_sink::file::{
    ArchiveNaming, FileId, FileStats, MAX_ARCHIVE_SUFFIX, RotationPolicy,
};
pub use logging_sink::plugin::{
    Plugin, PluginCatalog, PluginHealth, PluginId, PluginInfo, PluginLoader, PluginVersion,
};
pub use logging_sink::pool::{PoolConfig, PoolStats};
pub use logging_sink::{FileCache, PluginRegistry, StylePolicy, SyslogFacility, WorkerPool};
