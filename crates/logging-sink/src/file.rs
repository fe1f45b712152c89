//! crates/logging-sink/src/file.rs
//! File destinations with size-based rotation.
//!
//! [`FileCache`] owns every open log file. Writes that would push a file
//! past [`RotationPolicy::roll_size`] first move it aside under an
//! [`ArchiveNaming`] name and reopen a fresh file at the original path.

mod cache;
mod destination;
mod rotation;

pub use cache::{DEFAULT_FILE_CAPACITY, FileCache, FileDelivery, FileId, FileStats, normalize_path};
pub use destination::{FileIdentity, WriteOutcome};
pub use rotation::{
    ArchiveNaming, DEFAULT_ROLL_SIZE, MAX_ARCHIVE_SUFFIX, RotationPolicy, archive_path,
    archived_banner, session_banner,
};
