//! crates/logging-sink/src/file/destination.rs
//! A single open log file with its size bookkeeping.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use logging::{DestinationConfig, Error, Result, trace_file};

use super::rotation::{RotationPolicy, archive_path, archived_banner, session_banner};
use crate::header::local_now;

/// Device and inode pair identifying a file on Unix.
pub type FileIdentity = (u64, u64);

#[cfg(unix)]
fn identity_of(file: &File) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    file.metadata().ok().map(|meta| (meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn identity_of(_file: &File) -> Option<FileIdentity> {
    None
}

fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Outcome of one [`FileDestination::write`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The bytes were appended.
    Written,
    /// The file was archived to the contained path, then the bytes were
    /// appended to the fresh file.
    Rotated(PathBuf),
}

#[derive(Debug)]
pub(crate) struct FileDestination {
    path: PathBuf,
    file: Option<File>,
    pub(crate) config: DestinationConfig,
    size: u64,
    last_check: SystemTime,
    sequence: u64,
    identity: Option<FileIdentity>,
}

impl FileDestination {
    /// Opens `path` for appending without writing anything to it.
    pub(crate) fn open(path: PathBuf, config: DestinationConfig) -> Result<Self> {
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        let identity = identity_of(&file);
        let dest = Self {
            path,
            file: Some(file),
            config,
            size,
            last_check: SystemTime::now(),
            sequence: 0,
            identity,
        };
        trace_file!(path = %dest.path.display(), size = dest.size, "opened");
        Ok(dest)
    }

    /// Writes the session banner unless headers are disabled.
    ///
    /// Called once the destination is accepted, so a rejected duplicate
    /// never touches the file it aliases.
    pub(crate) fn begin_session(&mut self) -> Result<()> {
        if self.config.options.wants_file_header() {
            self.append(session_banner(local_now()).as_bytes())?;
        }
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) const fn size(&self) -> u64 {
        self.size
    }

    pub(crate) const fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) const fn identity(&self) -> Option<FileIdentity> {
        self.identity
    }

    pub(crate) const fn last_check(&self) -> SystemTime {
        self.last_check
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let file = match self.file.take() {
            Some(file) => file,
            None => open_append(&self.path)?,
        };
        let file = self.file.insert(file);
        file.write_all(bytes)?;
        self.size += bytes.len() as u64;
        Ok(())
    }

    /// Appends `bytes`, archiving the file first when `policy` says so.
    ///
    /// If archiving fails the bytes still go to the current file and the
    /// archiving error is returned.
    pub(crate) fn write(&mut self, bytes: &[u8], policy: &RotationPolicy) -> Result<WriteOutcome> {
        self.last_check = SystemTime::now();
        if !policy.needs_rotation(self.size, bytes.len() as u64) {
            self.append(bytes)?;
            return Ok(WriteOutcome::Written);
        }

        match self.rotate(policy) {
            Ok(archive) => {
                self.append(bytes)?;
                Ok(WriteOutcome::Rotated(archive))
            }
            Err(err) => {
                trace_file!(path = %self.path.display(), error = %err, "archive failed");
                self.append(bytes)?;
                Err(err)
            }
        }
    }

    fn rotate(&mut self, policy: &RotationPolicy) -> Result<PathBuf> {
        let now = local_now();
        let archive = archive_path(&self.path, policy.naming, self.sequence, now).ok_or_else(
            || {
                Error::Unavailable(format!(
                    "no free archive name next to {}",
                    self.path.display()
                ))
            },
        )?;

        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        let renamed = fs::rename(&self.path, &archive);
        let file = open_append(&self.path)?;
        self.size = file.metadata()?.len();
        self.identity = identity_of(&file);
        self.file = Some(file);
        renamed?;

        self.sequence += 1;
        trace_file!(
            path = %self.path.display(),
            archive = %archive.display(),
            sequence = self.sequence,
            "rotated"
        );
        if self.config.options.wants_file_header() {
            self.append(archived_banner(&archive, now).as_bytes())?;
        }
        Ok(archive)
    }

    /// Flushes and closes the handle.
    pub(crate) fn close(mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_data()?;
        }
        trace_file!(path = %self.path.display(), "closed");
        Ok(())
    }
}
