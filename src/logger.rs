//! src/logger.rs
//! The [`Logger`] context object.
//!
//! A `Logger` is created uninitialized. [`Logger::initialize`] builds the
//! runtime: configuration registry, file cache, plugin registry, worker
//! pool, style table, and squelch controller. Each of those subsystems has
//! its own lock; the logger itself only guards whether a runtime exists.
//! Dispatch and configuration calls hold that guard shared, so they run
//! concurrently, while `initialize` and `cleanup` hold it exclusively.
//!
//! Every public operation records its outcome in the calling thread's
//! [`ErrorRecord`], readable through [`Logger::get_last_error`].

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use logging::thread_local::{get_error, track};
use logging::{
    Clock, ColorMode, DestinationConfig, DestinationKind, Error, ErrorRecord, Level, LevelSet,
    OptionSet, Result, SquelchController, SquelchState, StyleTable, SystemClock, TextStyle,
    trace_config,
};
use logging_sink::file::{FileCache, FileId, FileStats};
use logging_sink::plugin::{PluginHealth, PluginId, PluginRegistry};
use logging_sink::pool::{PoolStats, WorkerPool};
use logging_sink::{HeaderSource, StylePolicy};

use crate::config::InitConfig;
use crate::dispatch;
use crate::registry::ConfigurationRegistry;

/// State that exists between `initialize` and `cleanup`.
pub(crate) struct Runtime {
    pub(crate) registry: ConfigurationRegistry,
    pub(crate) files: FileCache,
    pub(crate) plugins: PluginRegistry,
    pub(crate) pool: WorkerPool,
    pub(crate) styles: StyleTable,
    pub(crate) squelch: Option<SquelchController<Arc<dyn Clock>>>,
    pub(crate) headers: HeaderSource,
    pub(crate) style_policy: StylePolicy,
}

impl Runtime {
    fn build(config: InitConfig) -> Result<Self> {
        config.validate()?;
        // Resolves the local offset before the pool spawns its workers.
        let headers = HeaderSource::new();

        let files = FileCache::new(config.file_capacity, config.rotation);
        for spec in &config.files {
            if let Err(err) = files.add(&spec.path, spec.config) {
                let _ = files.clear();
                return Err(err);
            }
        }
        let pool = match WorkerPool::start(config.pool) {
            Ok(pool) => pool,
            Err(err) => {
                let _ = files.clear();
                return Err(err);
            }
        };

        let squelch = config.squelch.map(|policy| {
            let clock = config
                .squelch_clock
                .clone()
                .unwrap_or_else(|| Arc::new(SystemClock));
            SquelchController::with_clock(policy, clock)
        });

        Ok(Self {
            registry: ConfigurationRegistry::new(&config),
            files,
            plugins: PluginRegistry::new(config.plugin_capacity, Arc::clone(&config.plugin_loader)),
            pool,
            styles: StyleTable::new(config.color_mode),
            squelch,
            headers,
            style_policy: config.style_policy,
        })
    }

    /// Drains plugin jobs, unloads plugins, closes files and syslog.
    fn shutdown(self) -> Result<()> {
        let pool = self.pool.shutdown().map(drop);
        let plugins = self.plugins.unload_all();
        let files = self.files.clear();
        let registry = self.registry.close();
        pool.and(plugins).and(files).and(registry)
    }
}

/// An embeddable logger.
///
/// ```
/// use fanlog::{InitConfig, Level, LevelSet, Logger, OptionSet};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("app.log");
/// let logger = Logger::new();
/// logger
///     .initialize(InitConfig::silent().with_file(&path, LevelSet::ALL, OptionSet::MSG_ONLY))
///     .unwrap();
/// logger.info("service started").unwrap();
/// logger.cleanup().unwrap();
///
/// let text = std::fs::read_to_string(&path).unwrap();
/// assert!(text.ends_with("service started\n"));
/// ```
pub struct Logger {
    runtime: RwLock<Option<Runtime>>,
}

impl Logger {
    /// Creates an uninitialized logger.
    pub const fn new() -> Self {
        Self {
            runtime: RwLock::new(None),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Option<Runtime>>> {
        self.runtime.read().map_err(|_| Error::poisoned("logger"))
    }

    fn with_runtime<T>(&self, op: impl FnOnce(&Runtime) -> Result<T>) -> Result<T> {
        let guard = self.read()?;
        let runtime = guard.as_ref().ok_or(Error::NotReady)?;
        op(runtime)
    }

    fn install(&self, config: InitConfig) -> Result<()> {
        let mut slot = self
            .runtime
            .write()
            .map_err(|_| Error::poisoned("logger"))?;
        if slot.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        *slot = Some(Runtime::build(config)?);
        trace_config!("initialized");
        Ok(())
    }

    fn teardown(&self) -> Result<()> {
        let runtime = self
            .runtime
            .write()
            .map_err(|_| Error::poisoned("logger"))?
            .take()
            .ok_or(Error::NotReady)?;
        let result = runtime.shutdown();
        trace_config!(ok = result.is_ok(), "cleaned up");
        result
    }

    /// Forwards a message without touching the thread's error record.
    pub(crate) fn forward(&self, level: Level, message: &str) -> Result<()> {
        self.with_runtime(|rt| dispatch::dispatch(rt, level, message))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Validates `config` and starts every subsystem.
    ///
    /// Fails with [`Error::AlreadyInitialized`] on a running logger and with
    /// [`Error::NoDestination`] when no destination is enabled. Files named in
    /// `config` are opened here; if one fails, the others are closed again.
    #[track_caller]
    pub fn initialize(&self, config: InitConfig) -> Result<()> {
        track("initialize", self.install(config))
    }

    /// Drains queued plugin jobs, then unloads plugins, closes files, and
    /// returns to the uninitialized state.
    ///
    /// Teardown always completes; the first failure is reported.
    #[track_caller]
    pub fn cleanup(&self) -> Result<()> {
        track("cleanup", self.teardown())
    }

    /// Returns `true` between `initialize` and `cleanup`.
    pub fn is_initialized(&self) -> bool {
        self.read().is_ok_and(|guard| guard.is_some())
    }

    // ========================================================================
    // Logging
    // ========================================================================

    /// Delivers `message` at `level` to every destination that accepts it.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str) -> Result<()> {
        track("log", self.forward(level, message))
    }

    /// Logs at [`Level::Emergency`].
    #[track_caller]
    pub fn emerg(&self, message: &str) -> Result<()> {
        track("emerg", self.forward(Level::Emergency, message))
    }

    /// Logs at [`Level::Alert`].
    #[track_caller]
    pub fn alert(&self, message: &str) -> Result<()> {
        track("alert", self.forward(Level::Alert, message))
    }

    /// Logs at [`Level::Critical`].
    #[track_caller]
    pub fn crit(&self, message: &str) -> Result<()> {
        track("crit", self.forward(Level::Critical, message))
    }

    /// Logs at [`Level::Error`].
    #[track_caller]
    pub fn error(&self, message: &str) -> Result<()> {
        track("error", self.forward(Level::Error, message))
    }

    /// Logs at [`Level::Warning`].
    #[track_caller]
    pub fn warn(&self, message: &str) -> Result<()> {
        track("warn", self.forward(Level::Warning, message))
    }

    /// Logs at [`Level::Notice`].
    #[track_caller]
    pub fn notice(&self, message: &str) -> Result<()> {
        track("notice", self.forward(Level::Notice, message))
    }

    /// Logs at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, message: &str) -> Result<()> {
        track("info", self.forward(Level::Info, message))
    }

    /// Logs at [`Level::Debug`].
    #[track_caller]
    pub fn debug(&self, message: &str) -> Result<()> {
        track("debug", self.forward(Level::Debug, message))
    }

    // ========================================================================
    // File destinations
    // ========================================================================

    /// Opens `path` in append mode as a new file destination.
    ///
    /// Default sentinels in `levels` or `options` resolve to the file
    /// defaults.
    #[track_caller]
    pub fn add_file(
        &self,
        path: impl AsRef<Path>,
        levels: LevelSet,
        options: OptionSet,
    ) -> Result<FileId> {
        let path = path.as_ref();
        track(
            "add_file",
            self.with_runtime(|rt| rt.files.add(path, DestinationConfig::new(levels, options))),
        )
    }

    /// Closes and forgets a file destination.
    #[track_caller]
    pub fn remove_file(&self, id: FileId) -> Result<()> {
        track("remove_file", self.with_runtime(|rt| rt.files.remove(id)))
    }

    /// Replaces the levels of a file destination.
    #[track_caller]
    pub fn set_file_levels(&self, id: FileId, levels: LevelSet) -> Result<()> {
        track(
            "set_file_levels",
            self.with_runtime(|rt| rt.files.set_levels(id, levels)),
        )
    }

    /// Replaces the options of a file destination.
    #[track_caller]
    pub fn set_file_options(&self, id: FileId, options: OptionSet) -> Result<()> {
        track(
            "set_file_options",
            self.with_runtime(|rt| rt.files.set_options(id, options)),
        )
    }

    /// Id of the destination writing to `path`, if any.
    #[track_caller]
    pub fn file_id(&self, path: impl AsRef<Path>) -> Result<Option<FileId>> {
        let path = path.as_ref();
        track("file_id", self.with_runtime(|rt| rt.files.file_id(path)))
    }

    /// Ids of every file destination.
    #[track_caller]
    pub fn file_ids(&self) -> Result<Vec<FileId>> {
        track("file_ids", self.with_runtime(|rt| rt.files.ids()))
    }

    /// Size, archive count, and settings of a file destination.
    #[track_caller]
    pub fn file_stats(&self, id: FileId) -> Result<FileStats> {
        track("file_stats", self.with_runtime(|rt| rt.files.stats(id)))
    }

    // ========================================================================
    // Built-in destinations
    // ========================================================================

    fn set_levels(&self, kind: DestinationKind, levels: LevelSet) -> Result<()> {
        self.with_runtime(|rt| rt.registry.set_levels(kind, levels))
    }

    fn set_options(&self, kind: DestinationKind, options: OptionSet) -> Result<()> {
        self.with_runtime(|rt| rt.registry.set_options(kind, options))
    }

    /// Replaces the stdout levels.
    #[track_caller]
    pub fn set_stdout_levels(&self, levels: LevelSet) -> Result<()> {
        track(
            "set_stdout_levels",
            self.set_levels(DestinationKind::Stdout, levels),
        )
    }

    /// Replaces the stdout options.
    #[track_caller]
    pub fn set_stdout_options(&self, options: OptionSet) -> Result<()> {
        track(
            "set_stdout_options",
            self.set_options(DestinationKind::Stdout, options),
        )
    }

    /// Replaces the stderr levels.
    #[track_caller]
    pub fn set_stderr_levels(&self, levels: LevelSet) -> Result<()> {
        track(
            "set_stderr_levels",
            self.set_levels(DestinationKind::Stderr, levels),
        )
    }

    /// Replaces the stderr options.
    #[track_caller]
    pub fn set_stderr_options(&self, options: OptionSet) -> Result<()> {
        track(
            "set_stderr_options",
            self.set_options(DestinationKind::Stderr, options),
        )
    }

    /// Replaces the syslog levels, opening or closing the connection.
    #[track_caller]
    pub fn set_syslog_levels(&self, levels: LevelSet) -> Result<()> {
        track(
            "set_syslog_levels",
            self.set_levels(DestinationKind::Syslog, levels),
        )
    }

    /// Replaces the syslog options.
    #[track_caller]
    pub fn set_syslog_options(&self, options: OptionSet) -> Result<()> {
        track(
            "set_syslog_options",
            self.set_options(DestinationKind::Syslog, options),
        )
    }

    /// Changes the syslog identity.
    #[track_caller]
    pub fn set_syslog_identity(&self, identity: &str) -> Result<()> {
        track(
            "set_syslog_identity",
            self.with_runtime(|rt| rt.registry.set_syslog_identity(identity)),
        )
    }

    /// Changes the syslog category.
    #[track_caller]
    pub fn set_syslog_category(&self, category: &str) -> Result<()> {
        track(
            "set_syslog_category",
            self.with_runtime(|rt| rt.registry.set_syslog_category(category)),
        )
    }

    // ========================================================================
    // Plugins
    // ========================================================================

    /// Loads, validates, and initializes the plugin at `path`.
    #[track_caller]
    pub fn load_plugin(&self, path: impl AsRef<Path>) -> Result<PluginId> {
        let path = path.as_ref();
        track("load_plugin", self.with_runtime(|rt| rt.plugins.load(path)))
    }

    /// Waits for the plugin's queued jobs, cleans it up, and unloads it.
    #[track_caller]
    pub fn unload_plugin(&self, id: PluginId) -> Result<()> {
        track("unload_plugin", self.with_runtime(|rt| rt.plugins.unload(id)))
    }

    /// Ids of every loaded plugin.
    #[track_caller]
    pub fn plugin_ids(&self) -> Result<Vec<PluginId>> {
        track("plugin_ids", self.with_runtime(|rt| rt.plugins.ids()))
    }

    /// Health flags of a plugin.
    #[track_caller]
    pub fn plugin_health(&self, id: PluginId) -> Result<PluginHealth> {
        track(
            "plugin_health",
            self.with_runtime(|rt| rt.plugins.health(id)),
        )
    }

    /// Counters of the plugin worker pool.
    #[track_caller]
    pub fn pool_stats(&self) -> Result<PoolStats> {
        track("pool_stats", self.with_runtime(|rt| Ok(rt.pool.stats())))
    }

    // ========================================================================
    // Styles and squelch
    // ========================================================================

    /// Installs `style` for `level` after validating it for the active mode.
    #[track_caller]
    pub fn set_text_style(&self, level: Level, style: TextStyle) -> Result<()> {
        track(
            "set_text_style",
            self.with_runtime(|rt| rt.styles.set_style(level, style)),
        )
    }

    /// Restores the default style of every level.
    #[track_caller]
    pub fn reset_text_styles(&self) -> Result<()> {
        track(
            "reset_text_styles",
            self.with_runtime(|rt| {
                rt.styles.reset_styles();
                Ok(())
            }),
        )
    }

    /// Switches the console palette width.
    #[track_caller]
    pub fn set_color_mode(&self, mode: ColorMode) -> Result<()> {
        track(
            "set_color_mode",
            self.with_runtime(|rt| {
                rt.styles.set_color_mode(mode);
                Ok(())
            }),
        )
    }

    /// Squelch bookkeeping, or `None` when suppression is disabled.
    #[track_caller]
    pub fn squelch_state(&self) -> Result<Option<SquelchState>> {
        track(
            "squelch_state",
            self.with_runtime(|rt| Ok(rt.squelch.as_ref().map(SquelchController::state))),
        )
    }

    // ========================================================================
    // Error context
    // ========================================================================

    /// The calling thread's most recent error record.
    pub fn get_last_error(&self) -> ErrorRecord {
        get_error()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let runtime = match self.runtime.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(runtime) = runtime {
            let _ = runtime.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::ErrorCode;

    fn file_logger(dir: &Path) -> Logger {
        let logger = Logger::new();
        logger
            .initialize(InitConfig::silent().with_file(
                dir.join("unit.log"),
                LevelSet::ALL,
                OptionSet::MSG_ONLY | OptionSet::NO_HEADER,
            ))
            .unwrap();
        logger
    }

    #[test]
    fn calls_before_initialize_are_not_ready() {
        let logger = Logger::new();
        assert!(!logger.is_initialized());
        assert!(matches!(logger.info("x"), Err(Error::NotReady)));
        assert_eq!(logger.get_last_error().code, ErrorCode::NotReady);
        assert!(matches!(logger.cleanup(), Err(Error::NotReady)));
    }

    #[test]
    fn double_initialize_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let logger = file_logger(dir.path());
        let err = logger
            .initialize(InitConfig::silent().with_stderr(LevelSet::ALL, OptionSet::DEFAULT))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyInitialized);
        logger.cleanup().unwrap();
    }

    #[test]
    fn success_clears_the_error_record() {
        let dir = tempfile::tempdir().unwrap();
        let logger = file_logger(dir.path());
        assert!(logger.log(Level::Info, "").is_err());
        assert_eq!(logger.get_last_error().code, ErrorCode::InvalidString);
        logger.info("fine").unwrap();
        assert_eq!(logger.get_last_error().code, ErrorCode::NoError);
        logger.cleanup().unwrap();
    }

    #[test]
    fn error_record_names_operation_and_caller() {
        let logger = Logger::new();
        let line = line!() + 1;
        let _ = logger.set_stdout_levels(LevelSet::ALL);
        let record = logger.get_last_error();
        let location = record.location.unwrap();
        assert_eq!(location.function, "set_stdout_levels");
        assert_eq!(location.line, line);
        assert!(location.file.ends_with("logger.rs"));
    }

    #[test]
    fn failed_startup_file_leaves_logger_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.log");
        let bad = dir.path().join("missing").join("bad.log");
        let logger = Logger::new();
        let err = logger
            .initialize(
                InitConfig::silent()
                    .with_file(&good, LevelSet::ALL, OptionSet::DEFAULT)
                    .with_file(&bad, LevelSet::ALL, OptionSet::DEFAULT),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Platform);
        assert!(!logger.is_initialized());
    }

    #[test]
    fn drop_shuts_down_a_running_logger() {
        let dir = tempfile::tempdir().unwrap();
        let logger = file_logger(dir.path());
        logger.info("before drop").unwrap();
        drop(logger);
        let text = std::fs::read_to_string(dir.path().join("unit.log")).unwrap();
        assert_eq!(text, "before drop\n");
    }
}
