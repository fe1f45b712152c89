//! src/config.rs
//! Initialization settings for a [`Logger`](crate::Logger).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use logging::{
    Clock, ColorMode, DestinationConfig, DestinationKind, Error, LevelSet, OptionSet, Result,
    SquelchPolicy,
};
use logging_sink::file::{DEFAULT_FILE_CAPACITY, RotationPolicy};
use logging_sink::plugin::{DEFAULT_PLUGIN_CAPACITY, PluginCatalog, PluginLoader};
use logging_sink::{PoolConfig, StylePolicy, SyslogFacility};

/// A file destination opened during initialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSpec {
    /// Path of the log file.
    pub path: PathBuf,
    /// Levels and options; default sentinels resolve to the file defaults.
    pub config: DestinationConfig,
}

/// Everything [`Logger::initialize`](crate::Logger::initialize) needs.
///
/// The built-in destinations start at the default sentinels, which resolve
/// to these tables:
///
/// | Destination | Levels | Options |
/// |---|---|---|
/// | stdout | debug, info, notice, warning | no time, host, pid, tid |
/// | stderr | error and above | no time, host, pid, tid |
/// | syslog | warning and above | message only |
/// | files | all | no host |
#[derive(Clone)]
pub struct InitConfig {
    /// Standard output destination.
    pub stdout: DestinationConfig,
    /// Standard error destination.
    pub stderr: DestinationConfig,
    /// System logger destination.
    pub syslog: DestinationConfig,
    /// Identity passed to `openlog`; falls back to the process name.
    pub syslog_identity: Option<String>,
    /// Category reported with the syslog connection.
    pub syslog_category: Option<String>,
    /// Syslog facility.
    pub syslog_facility: SyslogFacility,
    /// Name shown in message headers.
    pub process_name: Option<String>,
    /// File destinations opened at startup.
    pub files: Vec<FileSpec>,
    /// Palette width for console styling.
    pub color_mode: ColorMode,
    /// When console lines are styled.
    pub style_policy: StylePolicy,
    /// Roll threshold and archive naming for files.
    pub rotation: RotationPolicy,
    /// Maximum number of file destinations.
    pub file_capacity: usize,
    /// Maximum number of loaded plugins.
    pub plugin_capacity: usize,
    /// Plugin worker pool sizing.
    pub pool: PoolConfig,
    /// Repeat suppression; `None` disables it.
    pub squelch: Option<SquelchPolicy>,
    /// Clock driving the squelch controller; the system clock when unset.
    pub squelch_clock: Option<Arc<dyn Clock>>,
    /// Resolves plugin paths to plugin instances.
    pub plugin_loader: Arc<dyn PluginLoader>,
}

impl Default for InitConfig {
    fn default() -> Self {
        let sentinel = DestinationConfig::new(LevelSet::DEFAULT, OptionSet::DEFAULT);
        Self {
            stdout: sentinel,
            stderr: sentinel,
            syslog: sentinel,
            syslog_identity: None,
            syslog_category: None,
            syslog_facility: SyslogFacility::default(),
            process_name: None,
            files: Vec::new(),
            color_mode: ColorMode::default(),
            style_policy: StylePolicy::default(),
            rotation: RotationPolicy::default(),
            file_capacity: DEFAULT_FILE_CAPACITY,
            plugin_capacity: DEFAULT_PLUGIN_CAPACITY,
            pool: PoolConfig::default(),
            squelch: Some(SquelchPolicy::default()),
            squelch_clock: None,
            plugin_loader: Arc::new(PluginCatalog::new()),
        }
    }
}

impl InitConfig {
    /// Defaults with stdout, stderr, and syslog disabled.
    pub fn silent() -> Self {
        Self {
            stdout: DestinationConfig::disabled(),
            stderr: DestinationConfig::disabled(),
            syslog: DestinationConfig::disabled(),
            ..Self::default()
        }
    }

    /// Sets the stdout levels and options.
    pub fn with_stdout(mut self, levels: LevelSet, options: OptionSet) -> Self {
        self.stdout = DestinationConfig::new(levels, options);
        self
    }

    /// Sets the stderr levels and options.
    pub fn with_stderr(mut self, levels: LevelSet, options: OptionSet) -> Self {
        self.stderr = DestinationConfig::new(levels, options);
        self
    }

    /// Sets the syslog levels and options.
    pub fn with_syslog(mut self, levels: LevelSet, options: OptionSet) -> Self {
        self.syslog = DestinationConfig::new(levels, options);
        self
    }

    /// Sets the syslog identity.
    pub fn with_syslog_identity(mut self, identity: impl Into<String>) -> Self {
        self.syslog_identity = Some(identity.into());
        self
    }

    /// Sets the syslog category.
    pub fn with_syslog_category(mut self, category: impl Into<String>) -> Self {
        self.syslog_category = Some(category.into());
        self
    }

    /// Sets the syslog facility.
    pub fn with_syslog_facility(mut self, facility: SyslogFacility) -> Self {
        self.syslog_facility = facility;
        self
    }

    /// Sets the name shown in headers.
    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    /// Adds a file destination opened at startup.
    pub fn with_file(
        mut self,
        path: impl Into<PathBuf>,
        levels: LevelSet,
        options: OptionSet,
    ) -> Self {
        self.files.push(FileSpec {
            path: path.into(),
            config: DestinationConfig::new(levels, options),
        });
        self
    }

    /// Sets the console palette width.
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    /// Sets when console lines are styled.
    pub fn with_style_policy(mut self, policy: StylePolicy) -> Self {
        self.style_policy = policy;
        self
    }

    /// Sets the file rotation policy.
    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the file destination capacity.
    pub fn with_file_capacity(mut self, capacity: usize) -> Self {
        self.file_capacity = capacity;
        self
    }

    /// Sets the plugin capacity.
    pub fn with_plugin_capacity(mut self, capacity: usize) -> Self {
        self.plugin_capacity = capacity;
        self
    }

    /// Sets the worker pool sizing.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Enables repeat suppression with `policy`, or disables it with `None`.
    pub fn with_squelch(mut self, policy: Option<SquelchPolicy>) -> Self {
        self.squelch = policy;
        self
    }

    /// Drives the squelch controller from `clock`.
    pub fn with_squelch_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.squelch_clock = Some(clock);
        self
    }

    /// Resolves plugin paths through `loader`.
    pub fn with_plugin_loader(mut self, loader: Arc<dyn PluginLoader>) -> Self {
        self.plugin_loader = loader;
        self
    }

    /// Checks bit ranges, capacities, and that some destination is enabled.
    pub fn validate(&self) -> Result<()> {
        let builtin = [
            (DestinationKind::Stdout, &self.stdout),
            (DestinationKind::Stderr, &self.stderr),
            (DestinationKind::Syslog, &self.syslog),
        ];
        let file_configs = self.files.iter().map(|spec| (DestinationKind::File, &spec.config));

        let mut enabled = false;
        for (kind, config) in builtin.into_iter().chain(file_configs) {
            let checked = DestinationConfig::from_bits(
                kind,
                config.levels.bits(),
                config.options.bits(),
            )?;
            enabled |= !checked.resolve(kind).levels.is_empty();
        }
        if !enabled {
            return Err(Error::NoDestination);
        }

        if self.file_capacity == 0 || self.plugin_capacity == 0 {
            return Err(Error::InvalidArgument(format!(
                "capacities must be non-zero (files {}, plugins {})",
                self.file_capacity, self.plugin_capacity
            )));
        }
        if self.files.len() > self.file_capacity {
            return Err(Error::NoRoom {
                what: "file",
                capacity: self.file_capacity,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for InitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitConfig")
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("syslog", &self.syslog)
            .field("syslog_identity", &self.syslog_identity)
            .field("syslog_category", &self.syslog_category)
            .field("syslog_facility", &self.syslog_facility)
            .field("process_name", &self.process_name)
            .field("files", &self.files)
            .field("color_mode", &self.color_mode)
            .field("style_policy", &self.style_policy)
            .field("rotation", &self.rotation)
            .field("file_capacity", &self.file_capacity)
            .field("plugin_capacity", &self.plugin_capacity)
            .field("pool", &self.pool)
            .field("squelch", &self.squelch)
            .finish_non_exhaustive()
    }
}
