//! crates/logging-sink/src/file/rotation.rs
//! Roll thresholds, archive naming, and file banners.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::header::{ARCHIVE_TIME_FORMAT, BANNER_TIME_FORMAT, format_time};

/// Default size at which a file destination is archived (5 MiB).
pub const DEFAULT_ROLL_SIZE: u64 = 5 * 1024 * 1024;

/// Highest disambiguating suffix tried before giving up on a name.
pub const MAX_ARCHIVE_SUFFIX: u32 = 999;

/// How archived files are named.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ArchiveNaming {
    /// `<stem>-<n><.ext>`, where `n` counts archives of this destination.
    Sequence,
    /// `<stem>-YYYY-MM-DD-HHMMSS[-n]<.ext>`.
    #[default]
    Timestamp,
}

/// When and how file destinations roll over.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RotationPolicy {
    /// Size in bytes past which the next write archives the file.
    /// Zero disables rotation.
    pub roll_size: u64,
    /// Archive naming scheme.
    pub naming: ArchiveNaming,
}

impl RotationPolicy {
    /// Returns `true` when writing `len` more bytes to a file of `size`
    /// bytes must first archive it.
    ///
    /// An empty file never rotates, so a single oversized write still lands
    /// somewhere.
    pub const fn needs_rotation(&self, size: u64, len: u64) -> bool {
        self.roll_size > 0 && size > 0 && size.saturating_add(len) > self.roll_size
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            roll_size: DEFAULT_ROLL_SIZE,
            naming: ArchiveNaming::default(),
        }
    }
}

fn split_name(path: &Path) -> (OsString, OsString) {
    let stem = path
        .file_stem()
        .map_or_else(|| OsString::from("log"), OsString::from);
    let ext = path.extension().map_or_else(OsString::new, |ext| {
        let mut dotted = OsString::from(".");
        dotted.push(ext);
        dotted
    });
    (stem, ext)
}

fn sibling(path: &Path, stem: &OsString, middle: &str, ext: &OsString) -> PathBuf {
    let mut name = stem.clone();
    name.push("-");
    name.push(middle);
    name.push(ext);
    path.with_file_name(name)
}

/// Picks an unused archive name next to `path`.
///
/// `sequence` is the archive counter of the destination; `now` stamps
/// timestamp names. Returns `None` when every candidate is taken.
pub fn archive_path(
    path: &Path,
    naming: ArchiveNaming,
    sequence: u64,
    now: OffsetDateTime,
) -> Option<PathBuf> {
    let (stem, ext) = split_name(path);
    match naming {
        ArchiveNaming::Sequence => (0..=u64::from(MAX_ARCHIVE_SUFFIX))
            .map(|skip| sibling(path, &stem, &(sequence + skip).to_string(), &ext))
            .find(|candidate| !candidate.exists()),
        ArchiveNaming::Timestamp => {
            let stamp = format_time(now, ARCHIVE_TIME_FORMAT);
            let first = sibling(path, &stem, &stamp, &ext);
            if !first.exists() {
                return Some(first);
            }
            (1..=MAX_ARCHIVE_SUFFIX)
                .map(|n| sibling(path, &stem, &format!("{stamp}-{n}"), &ext))
                .find(|candidate| !candidate.exists())
        }
    }
}

/// Banner written when a destination is added.
pub fn session_banner(now: OffsetDateTime) -> String {
    format!(
        "\n\n----- session begin @ {} -----\n\n",
        format_time(now, BANNER_TIME_FORMAT)
    )
}

/// Banner written at the top of a fresh file after archiving.
pub fn archived_banner(archive: &Path, now: OffsetDateTime) -> String {
    format!(
        "\n\n----- archived as {} due to size @ {} -----\n\n",
        archive.display(),
        format_time(now, BANNER_TIME_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-03-09 14:05:07 UTC);

    #[test]
    fn rotation_threshold_is_exclusive() {
        let policy = RotationPolicy {
            roll_size: 100,
            naming: ArchiveNaming::Sequence,
        };
        assert!(!policy.needs_rotation(0, 500));
        assert!(!policy.needs_rotation(60, 40));
        assert!(policy.needs_rotation(60, 41));
    }

    #[test]
    fn zero_roll_size_disables_rotation() {
        let policy = RotationPolicy {
            roll_size: 0,
            naming: ArchiveNaming::Timestamp,
        };
        assert!(!policy.needs_rotation(u64::MAX, 1));
    }

    #[test]
    fn sequence_names_keep_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let archive = archive_path(&path, ArchiveNaming::Sequence, 3, NOW).unwrap();
        assert_eq!(archive, dir.path().join("app-3.log"));
    }

    #[test]
    fn sequence_skips_existing_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(dir.path().join("app-0.log"), b"x").unwrap();
        let archive = archive_path(&path, ArchiveNaming::Sequence, 0, NOW).unwrap();
        assert_eq!(archive, dir.path().join("app-1.log"));
    }

    #[test]
    fn timestamp_names_disambiguate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace");
        let first = archive_path(&path, ArchiveNaming::Timestamp, 0, NOW).unwrap();
        assert_eq!(first, dir.path().join("trace-2024-03-09-140507"));
        std::fs::write(&first, b"x").unwrap();
        let second = archive_path(&path, ArchiveNaming::Timestamp, 0, NOW).unwrap();
        assert_eq!(second, dir.path().join("trace-2024-03-09-140507-1"));
    }

    #[test]
    fn banners_mention_their_purpose() {
        assert!(session_banner(NOW).contains("----- session begin @ "));
        let text = archived_banner(Path::new("/tmp/app-1.log"), NOW);
        assert!(text.contains("archived as /tmp/app-1.log due to size @"));
    }
}
