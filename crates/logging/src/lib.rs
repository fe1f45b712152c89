#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` holds the policy half of the fanlog core: the pieces that
//! decide *whether* and *how* a message is written, independent of where it
//! goes. Output destinations live in the `logging-sink` crate and the
//! orchestration in the root `fanlog` crate.
//!
//! # Design
//!
//! - [`LevelSet`] and [`OptionSet`] are bit-flag sets evaluated by the pure
//!   functions [`deliverable`] and [`effective_options`].
//! - [`StyleTable`] owns per-level [`TextStyle`]s behind its own lock and
//!   degrades them for narrower [`ColorMode`]s.
//! - [`SquelchController`] suppresses runs of identical messages with capped
//!   exponential backoff, driven by an injectable [`Clock`].
//! - [`Error`] is the single error type of the workspace; every variant has a
//!   stable [`ErrorCode`] and an [`ErrorCategory`].
//! - The [`thread_local`] module keeps the last [`ErrorRecord`] per thread.
//!
//! # Invariants
//!
//! - A [`LevelSet`] never carries bits outside [`LevelSet::ALL`] except the
//!   [`LevelSet::DEFAULT`] sentinel, which configuration calls resolve before
//!   storing.
//! - [`OptionSet::MSG_ONLY`] always wins over individual field flags.
//!
//! # Examples
//!
//! ```
//! use logging::{DestinationConfig, Level, LevelSet, OptionSet, deliverable};
//!
//! let cfg = DestinationConfig::new(LevelSet::at_least(Level::Error), OptionSet::MSG_ONLY);
//! assert!(deliverable(Level::Critical, cfg.levels));
//! assert!(!deliverable(Level::Info, cfg.levels));
//! assert!(cfg.fields().is_empty());
//! ```

mod config;
mod error;
mod levels;
mod options;
pub mod render;
pub mod squelch;
mod style;
pub mod thread_local;
mod tracing_macros;

pub use config::{DestinationConfig, DestinationKind};
pub use error::{Error, ErrorCategory, ErrorCode, Result};
pub use levels::{Level, LevelSet, deliverable};
pub use options::{HeaderFields, OptionSet, effective_options};
pub use render::{Header, render_line};
pub use squelch::{
    Admission, Clock, ManualClock, SquelchController, SquelchPolicy, SquelchState, SystemClock,
    fingerprint, squelch_marker,
};
pub use style::{
    ANSI_RESET, ColorMode, DEFAULT_STYLES, StyleEntry, StyleTable, TextAttr, TextColor, TextStyle,
};
pub use thread_local::{ErrorLocation, ErrorRecord, clear_error, get_error, set_error, track};
