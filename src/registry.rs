//! src/registry.rs
//! Built-in destination settings and the syslog connection.
//!
//! One mutex guards the stdout, stderr, and syslog configurations together
//! with the syslog identity. File and plugin destinations live in their own
//! registries and never take this lock.

use std::sync::{Mutex, MutexGuard};

use logging::{
    DestinationConfig, DestinationKind, Error, Level, LevelSet, OptionSet, Result, trace_config,
};
use logging_sink::SyslogFacility;
use logging_sink::syslog::{SyslogConnection, resolve_category, resolve_identity};

use crate::config::InitConfig;

/// Copy of the built-in destination settings taken for one dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Standard output.
    pub stdout: DestinationConfig,
    /// Standard error.
    pub stderr: DestinationConfig,
    /// System logger; disabled while no connection is open.
    pub syslog: DestinationConfig,
    /// Name shown in headers.
    pub process_name: Option<String>,
}

impl ConfigSnapshot {
    /// Returns `true` if any built-in destination accepts `level`.
    pub const fn wants(&self, level: Level) -> bool {
        self.stdout.wants(level) || self.stderr.wants(level) || self.syslog.wants(level)
    }
}

#[derive(Debug)]
struct RegistryState {
    stdout: DestinationConfig,
    stderr: DestinationConfig,
    syslog: DestinationConfig,
    identity: Option<String>,
    category: Option<String>,
    facility: SyslogFacility,
    process_name: Option<String>,
    connection: Option<SyslogConnection>,
}

impl RegistryState {
    fn slot(&mut self, kind: DestinationKind) -> Result<&mut DestinationConfig> {
        match kind {
            DestinationKind::Stdout => Ok(&mut self.stdout),
            DestinationKind::Stderr => Ok(&mut self.stderr),
            DestinationKind::Syslog => Ok(&mut self.syslog),
            DestinationKind::File => Err(Error::InvalidArgument(
                "file destinations are configured by id".into(),
            )),
        }
    }

    fn open_syslog(&mut self) -> Result<()> {
        // Close first: openlog/closelog act on process-wide state.
        self.connection = None;
        let identity = resolve_identity(self.identity.as_deref(), self.process_name.as_deref());
        let category = resolve_category(self.category.as_deref());
        let connection = SyslogConnection::open(&identity, &category, self.facility)?;
        trace_config!(
            identity = connection.identity(),
            category = connection.category(),
            facility = %connection.facility(),
            "syslog opened"
        );
        self.connection = Some(connection);
        Ok(())
    }

    /// Opens or closes the connection to match the syslog levels.
    fn sync_syslog(&mut self) -> Result<()> {
        match (self.syslog.levels.is_empty(), self.connection.is_some()) {
            (false, false) => self.open_syslog(),
            (true, true) => {
                self.connection = None;
                trace_config!("syslog closed");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Settings of the stdout, stderr, and syslog destinations.
#[derive(Debug)]
pub struct ConfigurationRegistry {
    state: Mutex<RegistryState>,
}

impl ConfigurationRegistry {
    /// Installs the built-in settings of `config`, opening syslog when its
    /// levels are not empty.
    ///
    /// Failing to reach the system logger is not fatal; syslog then stays
    /// disabled until its levels or identity are set again.
    pub fn new(config: &InitConfig) -> Self {
        let mut state = RegistryState {
            stdout: config.stdout.resolve(DestinationKind::Stdout),
            stderr: config.stderr.resolve(DestinationKind::Stderr),
            syslog: config.syslog.resolve(DestinationKind::Syslog),
            identity: config.syslog_identity.clone(),
            category: config.syslog_category.clone(),
            facility: config.syslog_facility,
            process_name: config.process_name.clone().filter(|n| !n.is_empty()),
            connection: None,
        };
        if let Err(err) = state.sync_syslog() {
            trace_config!(error = %err, "syslog unavailable");
        }
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>> {
        self.state
            .lock()
            .map_err(|_| Error::poisoned("configuration"))
    }

    /// Copies the current settings.
    pub fn snapshot(&self) -> Result<ConfigSnapshot> {
        let state = self.lock()?;
        let syslog = if state.connection.is_some() {
            state.syslog
        } else {
            DestinationConfig::disabled()
        };
        Ok(ConfigSnapshot {
            stdout: state.stdout,
            stderr: state.stderr,
            syslog,
            process_name: state.process_name.clone(),
        })
    }

    /// Stored settings of one built-in destination.
    pub fn config(&self, kind: DestinationKind) -> Result<DestinationConfig> {
        let mut state = self.lock()?;
        state.slot(kind).map(|config| *config)
    }

    /// Replaces the levels of a built-in destination.
    ///
    /// Setting syslog levels opens or closes the connection as needed.
    pub fn set_levels(&self, kind: DestinationKind, levels: LevelSet) -> Result<()> {
        let levels = LevelSet::from_bits(levels.bits())?.or_default(kind.default_levels());
        let mut state = self.lock()?;
        state.slot(kind)?.levels = levels;
        trace_config!(destination = kind.name(), levels = levels.bits(), "levels updated");
        if kind == DestinationKind::Syslog {
            state.sync_syslog()?;
        }
        Ok(())
    }

    /// Replaces the options of a built-in destination.
    pub fn set_options(&self, kind: DestinationKind, options: OptionSet) -> Result<()> {
        let options = OptionSet::from_bits(options.bits())?.or_default(kind.default_options());
        let mut state = self.lock()?;
        state.slot(kind)?.options = options;
        trace_config!(destination = kind.name(), options = options.bits(), "options updated");
        Ok(())
    }

    /// Changes the syslog identity, reopening an open connection.
    pub fn set_syslog_identity(&self, identity: &str) -> Result<()> {
        if identity.is_empty() {
            return Err(Error::InvalidString("syslog identity"));
        }
        let mut state = self.lock()?;
        state.identity = Some(identity.to_owned());
        if state.connection.is_some() {
            state.open_syslog()?;
        }
        Ok(())
    }

    /// Changes the syslog category, reopening an open connection.
    pub fn set_syslog_category(&self, category: &str) -> Result<()> {
        if category.is_empty() {
            return Err(Error::InvalidString("syslog category"));
        }
        let mut state = self.lock()?;
        state.category = Some(category.to_owned());
        if state.connection.is_some() {
            state.open_syslog()?;
        }
        Ok(())
    }

    /// Returns `true` while a syslog connection is open.
    pub fn syslog_open(&self) -> Result<bool> {
        Ok(self.lock()?.connection.is_some())
    }

    /// Sends one rendered line to the system logger.
    pub fn syslog_write(&self, level: Level, line: &str) -> Result<()> {
        let state = self.lock()?;
        match state.connection.as_ref() {
            Some(connection) => connection.write(level, line),
            None => Err(Error::Unavailable("syslog is not open".into())),
        }
    }

    /// Closes the syslog connection.
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.connection.take().is_some() {
            trace_config!("syslog closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> ConfigurationRegistry {
        ConfigurationRegistry::new(&InitConfig::silent())
    }

    #[test]
    fn default_sentinels_resolve_per_destination() {
        let config = InitConfig::default().with_syslog(LevelSet::NONE, OptionSet::DEFAULT);
        let registry = ConfigurationRegistry::new(&config);
        let snapshot = registry.snapshot().unwrap();
        assert_eq!(snapshot.stdout, DestinationConfig::defaults_for(DestinationKind::Stdout));
        assert_eq!(snapshot.stderr, DestinationConfig::defaults_for(DestinationKind::Stderr));
        assert!(snapshot.wants(Level::Info));
        assert!(snapshot.wants(Level::Critical));
        assert!(!snapshot.syslog.wants(Level::Emergency));
    }

    #[test]
    fn set_levels_updates_snapshot() {
        let registry = quiet();
        assert!(!registry.snapshot().unwrap().wants(Level::Error));
        registry
            .set_levels(DestinationKind::Stderr, LevelSet::ERROR)
            .unwrap();
        let snapshot = registry.snapshot().unwrap();
        assert!(snapshot.stderr.wants(Level::Error));
        assert!(!snapshot.stderr.wants(Level::Critical));
    }

    #[test]
    fn default_sentinel_in_setter_restores_table() {
        let registry = quiet();
        registry
            .set_levels(DestinationKind::Stdout, LevelSet::DEFAULT)
            .unwrap();
        registry
            .set_options(DestinationKind::Stdout, OptionSet::DEFAULT)
            .unwrap();
        assert_eq!(
            registry.config(DestinationKind::Stdout).unwrap(),
            DestinationConfig::defaults_for(DestinationKind::Stdout)
        );
    }

    #[test]
    fn file_kind_is_rejected() {
        let registry = quiet();
        assert!(matches!(
            registry.set_levels(DestinationKind::File, LevelSet::ALL),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_identity_rejected() {
        let registry = quiet();
        assert!(matches!(
            registry.set_syslog_identity(""),
            Err(Error::InvalidString(_))
        ));
        assert!(matches!(
            registry.set_syslog_category(""),
            Err(Error::InvalidString(_))
        ));
    }

    #[test]
    fn closed_syslog_is_disabled_in_snapshot() {
        let registry = quiet();
        assert!(!registry.syslog_open().unwrap());
        assert!(!registry.snapshot().unwrap().syslog.wants(Level::Emergency));
        assert!(matches!(
            registry.syslog_write(Level::Error, "x"),
            Err(Error::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn syslog_follows_its_levels() {
        let registry = quiet();
        registry
            .set_syslog_identity("fanlog-registry-test")
            .unwrap();
        registry
            .set_levels(DestinationKind::Syslog, LevelSet::EMERGENCY)
            .unwrap();
        assert!(registry.syslog_open().unwrap());
        registry
            .set_levels(DestinationKind::Syslog, LevelSet::NONE)
            .unwrap();
        assert!(!registry.syslog_open().unwrap());
        registry.close().unwrap();
    }
}
