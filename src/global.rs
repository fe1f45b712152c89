//! src/global.rs
//! Process-wide logger behind free functions.
//!
//! Applications that do not want to thread a [`Logger`] through their code
//! call these functions instead; they all act on one static instance that
//! starts uninitialized. Each function records its outcome in the calling
//! thread's error record exactly like the corresponding [`Logger`] method.

use std::path::Path;

use logging::{ColorMode, ErrorRecord, Level, LevelSet, OptionSet, Result, TextStyle};
use logging_sink::file::FileId;
use logging_sink::plugin::PluginId;

use crate::config::InitConfig;
use crate::logger::Logger;

static LOGGER: Logger = Logger::new();

/// The process-wide logger.
pub fn logger() -> &'static Logger {
    &LOGGER
}

/// See [`Logger::initialize`].
#[track_caller]
pub fn initialize(config: InitConfig) -> Result<()> {
    LOGGER.initialize(config)
}

/// See [`Logger::cleanup`].
#[track_caller]
pub fn cleanup() -> Result<()> {
    LOGGER.cleanup()
}

/// See [`Logger::is_initialized`].
pub fn is_initialized() -> bool {
    LOGGER.is_initialized()
}

/// See [`Logger::log`].
#[track_caller]
pub fn log(level: Level, message: &str) -> Result<()> {
    LOGGER.log(level, message)
}

/// Logs at [`Level::Emergency`].
#[track_caller]
pub fn emerg(message: &str) -> Result<()> {
    LOGGER.emerg(message)
}

/// Logs at [`Level::Alert`].
#[track_caller]
pub fn alert(message: &str) -> Result<()> {
    LOGGER.alert(message)
}

/// Logs at [`Level::Critical`].
#[track_caller]
pub fn crit(message: &str) -> Result<()> {
    LOGGER.crit(message)
}

/// Logs at [`Level::Error`].
#[track_caller]
pub fn error(message: &str) -> Result<()> {
    LOGGER.error(message)
}

/// Logs at [`Level::Warning`].
#[track_caller]
pub fn warn(message: &str) -> Result<()> {
    LOGGER.warn(message)
}

/// Logs at [`Level::Notice`].
#[track_caller]
pub fn notice(message: &str) -> Result<()> {
    LOGGER.notice(message)
}

/// Logs at [`Level::Info`].
#[track_caller]
pub fn info(message: &str) -> Result<()> {
    LOGGER.info(message)
}

/// Logs at [`Level::Debug`].
#[track_caller]
pub fn debug(message: &str) -> Result<()> {
    LOGGER.debug(message)
}

/// See [`Logger::add_file`].
#[track_caller]
pub fn add_file(path: impl AsRef<Path>, levels: LevelSet, options: OptionSet) -> Result<FileId> {
    LOGGER.add_file(path, levels, options)
}

/// See [`Logger::remove_file`].
#[track_caller]
pub fn remove_file(id: FileId) -> Result<()> {
    LOGGER.remove_file(id)
}

/// See [`Logger::set_file_levels`].
#[track_caller]
pub fn set_file_levels(id: FileId, levels: LevelSet) -> Result<()> {
    LOGGER.set_file_levels(id, levels)
}

/// See [`Logger::set_file_options`].
#[track_caller]
pub fn set_file_options(id: FileId, options: OptionSet) -> Result<()> {
    LOGGER.set_file_options(id, options)
}

/// See [`Logger::set_stdout_levels`].
#[track_caller]
pub fn set_stdout_levels(levels: LevelSet) -> Result<()> {
    LOGGER.set_stdout_levels(levels)
}

/// See [`Logger::set_stdout_options`].
#[track_caller]
pub fn set_stdout_options(options: OptionSet) -> Result<()> {
    LOGGER.set_stdout_options(options)
}

/// See [`Logger::set_stderr_levels`].
#[track_caller]
pub fn set_stderr_levels(levels: LevelSet) -> Result<()> {
    LOGGER.set_stderr_levels(levels)
}

/// See [`Logger::set_stderr_options`].
#[track_caller]
pub fn set_stderr_options(options: OptionSet) -> Result<()> {
    LOGGER.set_stderr_options(options)
}

/// See [`Logger::set_syslog_levels`].
#[track_caller]
pub fn set_syslog_levels(levels: LevelSet) -> Result<()> {
    LOGGER.set_syslog_levels(levels)
}

/// See [`Logger::set_syslog_options`].
#[track_caller]
pub fn set_syslog_options(options: OptionSet) -> Result<()> {
    LOGGER.set_syslog_options(options)
}

/// See [`Logger::set_syslog_identity`].
#[track_caller]
pub fn set_syslog_identity(identity: &str) -> Result<()> {
    LOGGER.set_syslog_identity(identity)
}

/// See [`Logger::set_syslog_category`].
#[track_caller]
pub fn set_syslog_category(category: &str) -> Result<()> {
    LOGGER.set_syslog_category(category)
}

/// See [`Logger::load_plugin`].
#[track_caller]
pub fn load_plugin(path: impl AsRef<Path>) -> Result<PluginId> {
    LOGGER.load_plugin(path)
}

/// See [`Logger::unload_plugin`].
#[track_caller]
pub fn unload_plugin(id: PluginId) -> Result<()> {
    LOGGER.unload_plugin(id)
}

/// See [`Logger::set_text_style`].
#[track_caller]
pub fn set_text_style(level: Level, style: TextStyle) -> Result<()> {
    LOGGER.set_text_style(level, style)
}

/// See [`Logger::reset_text_styles`].
#[track_caller]
pub fn reset_text_styles() -> Result<()> {
    LOGGER.reset_text_styles()
}

/// See [`Logger::set_color_mode`].
#[track_caller]
pub fn set_color_mode(mode: ColorMode) -> Result<()> {
    LOGGER.set_color_mode(mode)
}

/// The calling thread's most recent error record.
pub fn get_last_error() -> ErrorRecord {
    LOGGER.get_last_error()
}
