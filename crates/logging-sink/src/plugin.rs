//! crates/logging-sink/src/plugin.rs
//! Output plugins behind a versioned interface.
//!
//! A [`PluginLoader`] turns a path into a [`Plugin`]. The
//! [`PluginRegistry`] queries its [`PluginInfo`], rejects descriptors with a
//! bad magic number, a foreign interface major version, or invalid data,
//! runs `init`, and stores the plugin in a bounded arena. Writes reach
//! plugins only through the worker pool.

mod descriptor;
mod interface;
mod record;
mod registry;

pub use descriptor::{PLUGIN_MAGIC, PluginInfo, PluginVersion, SUPPORTED_MAJOR, SUPPORTED_MINOR};
pub use interface::{Plugin, PluginCatalog, PluginLoader};
pub use record::{PluginHealth, PluginRecord};
pub use registry::{DEFAULT_PLUGIN_CAPACITY, PluginId, PluginRegistry};
