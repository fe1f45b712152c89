//! crates/logging-sink/src/plugin/interface.rs
//! The plugin capability and the loaders that produce it.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use logging::{Error, Level, Result};

use super::descriptor::PluginInfo;

/// An output backend driven by the worker pool.
///
/// `write` is only ever called from pool workers, and never concurrently for
/// the same plugin instance. Returning an error marks the plugin unhealthy
/// but does not unload it.
pub trait Plugin: Send + Sync {
    /// Describes the plugin; validated before `init` runs.
    fn query(&self) -> Result<PluginInfo>;

    /// Prepares the plugin for writes.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Receives one rendered line.
    fn write(&self, level: Level, line: &str) -> Result<()>;

    /// Releases plugin resources; called once, on unload.
    fn cleanup(&self) -> Result<()> {
        Ok(())
    }
}

/// Resolves a plugin path to an instance.
pub trait PluginLoader: Send + Sync {
    /// Loads the plugin found at `path`.
    fn load(&self, path: &Path) -> Result<Box<dyn Plugin>>;
}

type Factory = Arc<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// A [`PluginLoader`] over plugins registered in-process by path.
///
/// ```
/// use logging::{Level, LevelSet, OptionSet, Result};
/// use logging_sink::plugin::{Plugin, PluginCatalog, PluginInfo, PluginLoader, PluginVersion};
///
/// struct Null;
///
/// impl Plugin for Null {
///     fn query(&self) -> Result<PluginInfo> {
///         Ok(PluginInfo::new(PluginVersion::new(1, 0, 0), LevelSet::ALL,
///             OptionSet::MSG_ONLY, "me", "discards everything"))
///     }
///     fn write(&self, _level: Level, _line: &str) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let catalog = PluginCatalog::new().with("plugins/null", || Box::new(Null));
/// assert!(catalog.load("plugins/null".as_ref()).is_ok());
/// assert!(catalog.load("plugins/other".as_ref()).is_err());
/// ```
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: HashMap<PathBuf, Factory>,
}

impl PluginCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `path`, replacing any earlier entry.
    pub fn register<F>(&mut self, path: impl Into<PathBuf>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(path.into(), Arc::new(factory));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, path: impl Into<PathBuf>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.register(path, factory);
        self
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl PluginLoader for PluginCatalog {
    fn load(&self, path: &Path) -> Result<Box<dyn Plugin>> {
        let factory = self.factories.get(path).ok_or_else(|| {
            Error::Platform(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no plugin at {}", path.display()),
            ))
        })?;
        Ok(factory())
    }
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("paths", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
