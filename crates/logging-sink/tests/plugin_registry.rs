//! Integration tests for plugin loading and interface negotiation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use logging::{Error, ErrorCode, Level, LevelSet, OptionSet, Result};
use logging_sink::plugin::{
    PLUGIN_MAGIC, Plugin, PluginCatalog, PluginInfo, PluginRegistry, PluginVersion,
    SUPPORTED_MAJOR,
};

/// A plugin whose descriptor is fully controlled by the test.
struct Scripted {
    info: PluginInfo,
    inits: Arc<AtomicUsize>,
}

impl Plugin for Scripted {
    fn query(&self) -> Result<PluginInfo> {
        Ok(self.info.clone())
    }

    fn init(&self) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn write(&self, _level: Level, _line: &str) -> Result<()> {
        Ok(())
    }
}

fn base_info() -> PluginInfo {
    PluginInfo::new(
        PluginVersion::new(2, 1, 0),
        LevelSet::ALL,
        OptionSet::NO_HOST,
        "fanlog tests",
        "scripted descriptor",
    )
}

fn registry_with(info: PluginInfo) -> (PluginRegistry, Arc<AtomicUsize>) {
    let inits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inits);
    let catalog = PluginCatalog::new().with("scripted", move || {
        Box::new(Scripted {
            info: info.clone(),
            inits: Arc::clone(&counter),
        })
    });
    (PluginRegistry::new(4, Arc::new(catalog)), inits)
}

// ============================================================================
// Version Negotiation
// ============================================================================

/// Verifies a foreign major version is rejected before init runs.
#[test]
fn major_version_mismatch_rejected() {
    for major in [0, SUPPORTED_MAJOR + 1, u16::MAX] {
        let mut info = base_info();
        info.interface_major = major;
        let (registry, inits) = registry_with(info);
        let err = registry.load("scripted").unwrap_err();
        assert_eq!(err.code(), ErrorCode::PluginVersion, "major {major}");
        assert_eq!(inits.load(Ordering::SeqCst), 0);
    }
}

/// Verifies any minor version under the supported major is accepted.
#[test]
fn any_minor_version_accepted() {
    for minor in [0, 1, 7, u16::MAX] {
        let mut info = base_info();
        info.interface_minor = minor;
        let (registry, inits) = registry_with(info);
        let id = registry.load("scripted").unwrap();
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        registry.unload(id).unwrap();
    }
}

// ============================================================================
// Descriptor Validation
// ============================================================================

/// Verifies a bad magic number is reported as a malformed interface.
#[test]
fn bad_magic_rejected() {
    let mut info = base_info();
    info.magic = !PLUGIN_MAGIC;
    let (registry, _) = registry_with(info);
    assert!(matches!(
        registry.load("scripted"),
        Err(Error::PluginMalformed(_))
    ));
}

/// Verifies an empty description is reported as bad plugin data.
#[test]
fn empty_description_rejected() {
    let mut info = base_info();
    info.description.clear();
    let (registry, _) = registry_with(info);
    assert!(matches!(registry.load("scripted"), Err(Error::PluginData(_))));
}

/// Verifies the declared levels and options become the plugin's config.
#[test]
fn declared_config_is_kept() {
    let mut info = base_info();
    info.levels = LevelSet::at_least(Level::Critical);
    let (registry, _) = registry_with(info);
    let id = registry.load("scripted").unwrap();
    let record = registry.get(id).unwrap();
    assert_eq!(record.config().levels, LevelSet::at_least(Level::Critical));
    assert_eq!(record.config().options, OptionSet::NO_HOST);
    assert_eq!(record.info().version.to_string(), "2.1.0");
    assert_eq!(registry.ids().unwrap(), vec![id]);
}
