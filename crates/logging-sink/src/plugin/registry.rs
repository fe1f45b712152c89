//! crates/logging-sink/src/plugin/registry.rs
//! Bounded registry of loaded plugins.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use logging::{Error, Level, Result, trace_plugin};

use super::interface::PluginLoader;
use super::record::{PluginHealth, PluginRecord};
use crate::arena::{Arena, SlotKey};

/// Default maximum number of loaded plugins.
pub const DEFAULT_PLUGIN_CAPACITY: usize = 16;

/// Handle to a loaded plugin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(SlotKey);

impl PluginId {
    /// Underlying arena key.
    pub const fn key(self) -> SlotKey {
        self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plugin#{}", self.0)
    }
}

/// Loads, tracks, and unloads plugins.
pub struct PluginRegistry {
    entries: Mutex<Arena<Arc<PluginRecord>>>,
    loader: Arc<dyn PluginLoader>,
}

impl PluginRegistry {
    /// Creates an empty registry resolving paths through `loader`.
    pub fn new(capacity: usize, loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            entries: Mutex::new(Arena::with_capacity(capacity)),
            loader,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Arena<Arc<PluginRecord>>>> {
        self.entries
            .lock()
            .map_err(|_| Error::poisoned("plugin registry"))
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Maximum number of loaded plugins.
    pub fn capacity(&self) -> Result<usize> {
        Ok(self.lock()?.capacity())
    }

    /// Loads, validates, and initializes the plugin at `path`.
    ///
    /// The registry lock is not held while plugin code runs.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<PluginId> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidString("plugin path"));
        }
        {
            let entries = self.lock()?;
            if entries.is_full() {
                return Err(Error::NoRoom {
                    what: "plugin",
                    capacity: entries.capacity(),
                });
            }
        }

        let plugin = self.loader.load(&path)?;
        let info = plugin.query().map_err(|err| match err {
            Error::PluginFailure(_) => err,
            other => Error::PluginFailure(format!("query failed: {other}")),
        })?;
        if let Err(err) = info.validate() {
            trace_plugin!(path = %path.display(), error = %err, "rejected");
            return Err(err);
        }
        plugin.init().map_err(|err| match err {
            Error::PluginFailure(_) => err,
            other => Error::PluginFailure(format!("init failed: {other}")),
        })?;

        let record = Arc::new(PluginRecord::new(path.clone(), plugin, info));
        let mut entries = self.lock()?;
        let capacity = entries.capacity();
        match entries.insert(Arc::clone(&record)) {
            Ok(key) => {
                let id = PluginId(key);
                trace_plugin!(
                    %id,
                    path = %path.display(),
                    version = %record.info().version,
                    levels = record.info().levels.bits(),
                    "loaded"
                );
                Ok(id)
            }
            Err(_) => {
                drop(entries);
                let _ = record.cleanup();
                Err(Error::NoRoom {
                    what: "plugin",
                    capacity,
                })
            }
        }
    }

    fn record(&self, id: PluginId) -> Result<Arc<PluginRecord>> {
        self.lock()?
            .get(id.0)
            .cloned()
            .ok_or_else(|| Error::NoItem(id.to_string()))
    }

    /// Stops new jobs for `id`, waits for queued ones, cleans up, and evicts.
    pub fn unload(&self, id: PluginId) -> Result<()> {
        let record = self.record(id)?;
        if !record.begin_unload() {
            return Err(Error::NoItem(id.to_string()));
        }
        record.wait_idle();
        let cleanup = record.cleanup();
        self.lock()?.remove(id.0);
        trace_plugin!(%id, path = %record.path().display(), "unloaded");
        cleanup
    }

    /// Unloads every plugin, returning the first cleanup failure.
    pub fn unload_all(&self) -> Result<()> {
        let mut first = None;
        for id in self.ids()? {
            match self.unload(id) {
                Ok(()) | Err(Error::NoItem(_)) => {}
                Err(err) => {
                    first.get_or_insert(err);
                }
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Ids of all loaded plugins.
    pub fn ids(&self) -> Result<Vec<PluginId>> {
        Ok(self.lock()?.keys().into_iter().map(PluginId).collect())
    }

    /// Health flags of one plugin.
    pub fn health(&self, id: PluginId) -> Result<PluginHealth> {
        Ok(self.record(id)?.health())
    }

    /// Shared handle to one plugin's record.
    pub fn get(&self, id: PluginId) -> Result<Arc<PluginRecord>> {
        self.record(id)
    }

    /// Plugins that accept `level`, captured under one lock acquisition.
    pub fn targets(&self, level: Level) -> Result<Vec<(PluginId, Arc<PluginRecord>)>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(_, record)| record.wants(level))
            .map(|(key, record)| (PluginId(key), Arc::clone(record)))
            .collect())
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{Plugin, PluginCatalog, PluginInfo, PluginVersion, SUPPORTED_MAJOR};
    use logging::{ErrorCode, LevelSet, OptionSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Probe {
        major: u16,
        init_ok: bool,
        cleanups: Arc<AtomicUsize>,
    }

    impl Plugin for Probe {
        fn query(&self) -> Result<PluginInfo> {
            let mut info = PluginInfo::new(
                PluginVersion::new(1, 0, 0),
                LevelSet::at_least(Level::Error),
                OptionSet::MSG_ONLY,
                "tests",
                "probe",
            );
            info.interface_major = self.major;
            Ok(info)
        }

        fn init(&self) -> Result<()> {
            if self.init_ok {
                Ok(())
            } else {
                Err(Error::Unavailable("device offline".into()))
            }
        }

        fn write(&self, _level: Level, _line: &str) -> Result<()> {
            Ok(())
        }

        fn cleanup(&self) -> Result<()> {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn registry(capacity: usize, cleanups: &Arc<AtomicUsize>) -> PluginRegistry {
        let ok = Arc::clone(cleanups);
        let catalog = PluginCatalog::new()
            .with("good", move || {
                Box::new(Probe {
                    major: SUPPORTED_MAJOR,
                    init_ok: true,
                    cleanups: Arc::clone(&ok),
                })
            })
            .with("future", || {
                Box::new(Probe {
                    major: SUPPORTED_MAJOR + 1,
                    init_ok: true,
                    cleanups: Arc::default(),
                })
            })
            .with("broken", || {
                Box::new(Probe {
                    major: SUPPORTED_MAJOR,
                    init_ok: false,
                    cleanups: Arc::default(),
                })
            });
        PluginRegistry::new(capacity, Arc::new(catalog))
    }

    #[test]
    fn load_and_unload_runs_cleanup() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let reg = registry(4, &cleanups);
        let id = reg.load("good").unwrap();
        assert!(reg.health(id).unwrap().loaded);
        reg.unload(id).unwrap();
        assert_eq!(cleanups.load(Ordering::SeqCst), 1);
        assert!(matches!(reg.unload(id), Err(Error::NoItem(_))));
    }

    #[test]
    fn version_and_init_failures_classified() {
        let reg = registry(4, &Arc::default());
        assert_eq!(reg.load("future").unwrap_err().code(), ErrorCode::PluginVersion);
        assert_eq!(reg.load("broken").unwrap_err().code(), ErrorCode::PluginFailure);
        assert_eq!(reg.load("missing").unwrap_err().code(), ErrorCode::Platform);
        assert_eq!(reg.len().unwrap(), 0);
    }

    #[test]
    fn capacity_is_enforced() {
        let reg = registry(2, &Arc::default());
        reg.load("good").unwrap();
        reg.load("good").unwrap();
        assert!(matches!(
            reg.load("good"),
            Err(Error::NoRoom { capacity: 2, .. })
        ));
    }

    #[test]
    fn targets_filter_by_level() {
        let reg = registry(4, &Arc::default());
        let id = reg.load("good").unwrap();
        assert!(reg.targets(Level::Info).unwrap().is_empty());
        let targets = reg.targets(Level::Critical).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].0, id);
    }
}
