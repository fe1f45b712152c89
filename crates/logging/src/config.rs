//! crates/logging/src/config.rs
//! Per-destination level/option pairs and their default tables.

use crate::error::Result;
use crate::levels::{Level, LevelSet};
use crate::options::{HeaderFields, OptionSet, effective_options};

/// Kinds of destination, used to pick defaults.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DestinationKind {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// The system logger.
    Syslog,
    /// A log file.
    File,
}

impl DestinationKind {
    /// Default levels for this kind.
    pub const fn default_levels(self) -> LevelSet {
        match self {
            Self::Stdout => LevelSet::DEBUG
                .union(LevelSet::INFO)
                .union(LevelSet::NOTICE)
                .union(LevelSet::WARNING),
            Self::Stderr => LevelSet::at_least(Level::Error),
            Self::Syslog => LevelSet::at_least(Level::Warning),
            Self::File => LevelSet::ALL,
        }
    }

    /// Default options for this kind.
    pub const fn default_options(self) -> OptionSet {
        match self {
            Self::Stdout | Self::Stderr => OptionSet::NO_TIME
                .union(OptionSet::NO_HOST)
                .union(OptionSet::NO_PID)
                .union(OptionSet::NO_TID),
            Self::Syslog => OptionSet::MSG_ONLY,
            Self::File => OptionSet::NO_HOST,
        }
    }

    /// Name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
            Self::Syslog => "syslog",
            Self::File => "file",
        }
    }
}

/// Levels and options for one destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DestinationConfig {
    /// Levels delivered.
    pub levels: LevelSet,
    /// Header options.
    pub options: OptionSet,
}

impl DestinationConfig {
    /// Builds a config from explicit sets.
    pub const fn new(levels: LevelSet, options: OptionSet) -> Self {
        Self { levels, options }
    }

    /// A config that delivers nothing.
    pub const fn disabled() -> Self {
        Self::new(LevelSet::NONE, OptionSet::ALL)
    }

    /// The default config for `kind`.
    pub const fn defaults_for(kind: DestinationKind) -> Self {
        Self::new(kind.default_levels(), kind.default_options())
    }

    /// Validates raw bits and resolves default sentinels for `kind`.
    pub fn from_bits(kind: DestinationKind, levels: u16, options: u32) -> Result<Self> {
        Ok(Self::new(LevelSet::from_bits(levels)?, OptionSet::from_bits(options)?).resolve(kind))
    }

    /// Replaces default sentinels with the defaults of `kind`.
    pub const fn resolve(self, kind: DestinationKind) -> Self {
        Self::new(
            self.levels.or_default(kind.default_levels()),
            self.options.or_default(kind.default_options()),
        )
    }

    /// Returns `true` if messages at `level` are delivered.
    pub const fn wants(&self, level: Level) -> bool {
        self.levels.contains(level)
    }

    /// Header fields rendered by this destination.
    pub const fn fields(&self) -> HeaderFields {
        effective_options(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_defaults_exclude_errors() {
        let cfg = DestinationConfig::defaults_for(DestinationKind::Stdout);
        assert!(cfg.wants(Level::Debug));
        assert!(cfg.wants(Level::Warning));
        assert!(!cfg.wants(Level::Error));
        assert!(!cfg.fields().time);
        assert!(cfg.fields().level);
    }

    #[test]
    fn stderr_and_syslog_defaults() {
        let stderr = DestinationConfig::defaults_for(DestinationKind::Stderr);
        assert_eq!(stderr.levels.bits(), 0x0f);
        let syslog = DestinationConfig::defaults_for(DestinationKind::Syslog);
        assert_eq!(syslog.levels.bits(), 0x1f);
        assert!(syslog.fields().is_empty());
    }

    #[test]
    fn from_bits_resolves_sentinels() {
        let cfg = DestinationConfig::from_bits(
            DestinationKind::File,
            LevelSet::DEFAULT.bits(),
            OptionSet::DEFAULT.bits(),
        )
        .unwrap();
        assert_eq!(cfg, DestinationConfig::defaults_for(DestinationKind::File));
    }

    #[test]
    fn from_bits_rejects_invalid() {
        assert!(DestinationConfig::from_bits(DestinationKind::File, 0x400, 0).is_err());
        assert!(DestinationConfig::from_bits(DestinationKind::File, 0xff, 0x1).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serializes_as_raw_bits() {
        let cfg = DestinationConfig::new(LevelSet::at_least(Level::Error), OptionSet::MSG_ONLY);
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(json, r#"{"levels":15,"options":32512}"#);
        let back: DestinationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_rejects_out_of_range_bits() {
        let levels = serde_json::from_str::<DestinationConfig>(r#"{"levels":264,"options":0}"#);
        assert!(levels.is_err());
        let options =
            serde_json::from_str::<DestinationConfig>(r#"{"levels":255,"options":1048832}"#);
        assert!(options.is_err());
        let sentinel: DestinationConfig =
            serde_json::from_str(r#"{"levels":256,"options":1048576}"#).unwrap();
        assert_eq!(sentinel, DestinationConfig::new(LevelSet::DEFAULT, OptionSet::DEFAULT));
    }
}
