//! crates/logging-sink/src/plugin/descriptor.rs
//! The interface descriptor a plugin reports when queried.

use std::fmt;

use logging::{Error, LevelSet, OptionSet, Result};

/// Magic number every descriptor must carry.
pub const PLUGIN_MAGIC: u32 = 0x6090_6090;

/// Interface major version this build speaks.
pub const SUPPORTED_MAJOR: u16 = 1;

/// Interface minor version this build speaks.
pub const SUPPORTED_MINOR: u16 = 0;

/// Version of the plugin itself, independent of the interface it speaks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PluginVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
    /// Build or patch number.
    pub build: u8,
}

impl PluginVersion {
    /// Builds a version triple.
    pub const fn new(major: u8, minor: u8, build: u8) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// What a plugin declares about itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginInfo {
    /// Must equal [`PLUGIN_MAGIC`].
    pub magic: u32,
    /// Interface major version; must equal [`SUPPORTED_MAJOR`].
    pub interface_major: u16,
    /// Interface minor version; any value is accepted.
    pub interface_minor: u16,
    /// Plugin release.
    pub version: PluginVersion,
    /// Levels the plugin wants to receive.
    pub levels: LevelSet,
    /// Header options for lines sent to the plugin.
    pub options: OptionSet,
    /// Author, non-empty.
    pub author: String,
    /// Description, non-empty.
    pub description: String,
    /// Capability bits. No capability is defined yet.
    pub capabilities: u64,
}

impl PluginInfo {
    /// A descriptor for the current interface with the given metadata.
    pub fn new(
        version: PluginVersion,
        levels: LevelSet,
        options: OptionSet,
        author: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            magic: PLUGIN_MAGIC,
            interface_major: SUPPORTED_MAJOR,
            interface_minor: SUPPORTED_MINOR,
            version,
            levels,
            options,
            author: author.into(),
            description: description.into(),
            capabilities: 0,
        }
    }

    /// Checks magic, interface version, masks, and strings, in that order.
    pub fn validate(&self) -> Result<()> {
        if self.magic != PLUGIN_MAGIC {
            return Err(Error::PluginMalformed(format!(
                "bad magic {:#010x}",
                self.magic
            )));
        }
        if self.interface_major != SUPPORTED_MAJOR {
            return Err(Error::PluginVersion {
                found: self.interface_major,
                supported: SUPPORTED_MAJOR,
            });
        }
        if self.levels.is_default() || self.options.is_default() {
            return Err(Error::PluginData("plugins must declare explicit levels and options".into()));
        }
        LevelSet::from_bits(self.levels.bits())
            .map_err(|_| Error::PluginData(format!("invalid levels {:#06x}", self.levels.bits())))?;
        OptionSet::from_bits(self.options.bits()).map_err(|_| {
            Error::PluginData(format!("invalid options {:#010x}", self.options.bits()))
        })?;
        if self.author.trim().is_empty() || self.description.trim().is_empty() {
            return Err(Error::PluginData("empty author or description".into()));
        }
        Ok(())
    }
}
