//! crates/logging-sink/src/file/cache.rs
//! Bounded registry of file destinations.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use logging::{
    DestinationConfig, DestinationKind, Error, Level, LevelSet, OptionSet, Result, trace_file,
};

use super::destination::{FileDestination, WriteOutcome};
use super::rotation::RotationPolicy;
use crate::arena::{Arena, SlotKey};

/// Default maximum number of file destinations.
pub const DEFAULT_FILE_CAPACITY: usize = 16;

/// Handle to a file destination.
///
/// Stays valid until the destination is removed; a removed id is never
/// accepted again, even once its slot is reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(SlotKey);

impl FileId {
    /// Underlying arena key.
    pub const fn key(self) -> SlotKey {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// Point-in-time view of one destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStats {
    /// Normalized path.
    pub path: PathBuf,
    /// Bytes in the active file.
    pub size: u64,
    /// Number of completed rotations.
    pub archives: u64,
    /// Levels and options in effect.
    pub config: DestinationConfig,
    /// When the size was last checked against the roll threshold.
    pub last_check: SystemTime,
}

/// Result of fanning one message out to every file.
#[derive(Debug, Default)]
pub struct FileDelivery {
    /// Destinations whose levels admitted the message.
    pub attempted: usize,
    /// Destinations the message reached.
    pub written: usize,
    /// First failure, if any.
    pub error: Option<Error>,
}

/// Makes `path` absolute and removes `.`/`..` components.
///
/// The parent directory is canonicalized when it exists, so two spellings
/// through a symlinked directory compare equal.
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidString("file path"));
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }

    let Some(name) = clean.file_name().map(ToOwned::to_owned) else {
        return Err(Error::InvalidArgument(format!(
            "{} does not name a file",
            path.display()
        )));
    };
    match clean.parent().map(Path::canonicalize) {
        Some(Ok(parent)) => Ok(parent.join(name)),
        _ => Ok(clean),
    }
}

/// Fixed-capacity set of file destinations behind one lock.
///
/// Every write, including a rotation it triggers, happens while the lock is
/// held, so writes to one file are totally ordered.
#[derive(Debug)]
pub struct FileCache {
    entries: Mutex<Arena<FileDestination>>,
    policy: RotationPolicy,
}

impl FileCache {
    /// Creates an empty cache.
    pub fn new(capacity: usize, policy: RotationPolicy) -> Self {
        Self {
            entries: Mutex::new(Arena::with_capacity(capacity)),
            policy,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Arena<FileDestination>>> {
        self.entries.lock().map_err(|_| Error::poisoned("file cache"))
    }

    /// Rotation policy applied to every destination.
    pub const fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Maximum number of destinations.
    pub fn capacity(&self) -> Result<usize> {
        Ok(self.lock()?.capacity())
    }

    /// Number of live destinations.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Opens `path` as a new destination.
    ///
    /// Default sentinels in `config` resolve to the file defaults; any other
    /// bits outside the defined ranges are rejected.
    pub fn add(&self, path: impl AsRef<Path>, config: DestinationConfig) -> Result<FileId> {
        let config = DestinationConfig::from_bits(
            DestinationKind::File,
            config.levels.bits(),
            config.options.bits(),
        )?;
        let path = normalize_path(path.as_ref())?;
        let mut entries = self.lock()?;

        if entries.iter().any(|(_, dest)| dest.path() == path) {
            return Err(Error::DuplicateItem(path.display().to_string()));
        }
        if entries.is_full() {
            return Err(Error::NoRoom {
                what: "file destination",
                capacity: entries.capacity(),
            });
        }

        let mut dest = FileDestination::open(path, config)?;
        if let Some(identity) = dest.identity() {
            if let Some((_, existing)) = entries
                .iter()
                .find(|(_, other)| other.identity() == Some(identity))
            {
                let existing = existing.path().display().to_string();
                let _ = dest.close();
                return Err(Error::DuplicateItem(existing));
            }
        }
        if let Err(err) = dest.begin_session() {
            let _ = dest.close();
            return Err(err);
        }

        let path = dest.path().display().to_string();
        let capacity = entries.capacity();
        let key = entries.insert(dest).map_err(|_| Error::NoRoom {
            what: "file destination",
            capacity,
        })?;
        let id = FileId(key);
        trace_file!(%id, %path, levels = config.levels.bits(), "added");
        Ok(id)
    }

    /// Closes and evicts a destination.
    pub fn remove(&self, id: FileId) -> Result<()> {
        let dest = self
            .lock()?
            .remove(id.0)
            .ok_or_else(|| Error::NoItem(id.to_string()))?;
        trace_file!(%id, "removed");
        dest.close()
    }

    fn with_entry<T>(&self, id: FileId, f: impl FnOnce(&mut FileDestination) -> T) -> Result<T> {
        let mut entries = self.lock()?;
        let dest = entries
            .get_mut(id.0)
            .ok_or_else(|| Error::NoItem(id.to_string()))?;
        Ok(f(dest))
    }

    /// Replaces the levels of a destination.
    pub fn set_levels(&self, id: FileId, levels: LevelSet) -> Result<()> {
        let levels = LevelSet::from_bits(levels.bits())?
            .or_default(DestinationKind::File.default_levels());
        self.with_entry(id, |dest| dest.config.levels = levels)?;
        trace_file!(%id, levels = levels.bits(), "levels updated");
        Ok(())
    }

    /// Replaces the options of a destination.
    pub fn set_options(&self, id: FileId, options: OptionSet) -> Result<()> {
        let options = OptionSet::from_bits(options.bits())?
            .or_default(DestinationKind::File.default_options());
        self.with_entry(id, |dest| dest.config.options = options)?;
        trace_file!(%id, options = options.bits(), "options updated");
        Ok(())
    }

    /// Configuration of a destination.
    pub fn config(&self, id: FileId) -> Result<DestinationConfig> {
        self.with_entry(id, |dest| dest.config)
    }

    /// Size and rotation counters of a destination.
    pub fn stats(&self, id: FileId) -> Result<FileStats> {
        self.with_entry(id, |dest| FileStats {
            path: dest.path().to_path_buf(),
            size: dest.size(),
            archives: dest.sequence(),
            config: dest.config,
            last_check: dest.last_check(),
        })
    }

    /// Finds the destination writing to `path`.
    pub fn file_id(&self, path: impl AsRef<Path>) -> Result<Option<FileId>> {
        let path = normalize_path(path.as_ref())?;
        Ok(self
            .lock()?
            .iter()
            .find(|(_, dest)| dest.path() == path)
            .map(|(key, _)| FileId(key)))
    }

    /// Ids of all live destinations.
    pub fn ids(&self) -> Result<Vec<FileId>> {
        Ok(self.lock()?.keys().into_iter().map(FileId).collect())
    }

    /// Returns `true` if any destination accepts `level`.
    pub fn wants(&self, level: Level) -> Result<bool> {
        Ok(self.lock()?.iter().any(|(_, dest)| dest.config.wants(level)))
    }

    /// Appends raw bytes to one destination.
    pub fn write(&self, id: FileId, bytes: &[u8]) -> Result<WriteOutcome> {
        let policy = self.policy;
        self.with_entry(id, |dest| dest.write(bytes, &policy))?
    }

    /// Writes one message to every destination accepting `level`.
    ///
    /// `render` is called once per destination with its configuration. A
    /// failing destination does not stop delivery to the rest.
    pub fn dispatch<F>(&self, level: Level, mut render: F) -> Result<FileDelivery>
    where
        F: FnMut(&DestinationConfig) -> String,
    {
        let mut delivery = FileDelivery::default();
        let mut entries = self.lock()?;
        for (key, dest) in entries.iter_mut() {
            if !dest.config.wants(level) {
                continue;
            }
            delivery.attempted += 1;
            let line = render(&dest.config);
            match dest.write(line.as_bytes(), &self.policy) {
                Ok(_) => delivery.written += 1,
                Err(err) => {
                    trace_file!(id = %FileId(key), error = %err, "write failed");
                    delivery.error.get_or_insert(err);
                }
            }
        }
        Ok(delivery)
    }

    /// Closes every destination, returning the first close failure.
    pub fn clear(&self) -> Result<()> {
        let drained = self.lock()?.drain();
        let mut first = None;
        for (_, dest) in drained {
            if let Err(err) = dest.close() {
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_CAPACITY, RotationPolicy::default())
    }
}
