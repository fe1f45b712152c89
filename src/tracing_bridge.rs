//! src/tracing_bridge.rs
//! Bridge between the tracing crate and a fanlog [`Logger`].
//!
//! [`FanlogLayer`] is a tracing-subscriber layer that turns application
//! tracing events into fanlog messages, so code written against the standard
//! tracing macros reaches every configured destination.
//!
//! # Architecture
//!
//! - Tracing levels map onto fanlog levels: ERROR to error, WARN to warning,
//!   INFO to info, DEBUG and TRACE to debug.
//! - Events targeted at `fanlog` or `fanlog::*` are dropped, so the core's own
//!   diagnostics never loop back into it.
//! - Forwarded events do not overwrite the thread's error record.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fanlog::{InitConfig, global, init_tracing};
//!
//! global::initialize(InitConfig::default())?;
//! init_tracing(global::logger())?;
//!
//! tracing::warn!(target: "app::db", retries = 3, "connection lost");
//! ```

use std::fmt::Write as _;

use logging::Level as FanlogLevel;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::logger::Logger;

/// Target of events that are never forwarded, alone or as a `fanlog::`
/// path prefix.
pub const SELF_TARGET_PREFIX: &str = "fanlog";

/// A tracing layer that forwards events to a [`Logger`].
#[derive(Debug, Clone, Copy)]
pub struct FanlogLayer {
    logger: &'static Logger,
}

impl FanlogLayer {
    /// Creates a layer forwarding to `logger`.
    #[must_use]
    pub const fn new(logger: &'static Logger) -> Self {
        Self { logger }
    }

    /// Map a tracing level to a fanlog level.
    const fn map_level(level: &Level) -> FanlogLevel {
        match *level {
            Level::ERROR => FanlogLevel::Error,
            Level::WARN => FanlogLevel::Warning,
            Level::INFO => FanlogLevel::Info,
            Level::DEBUG | Level::TRACE => FanlogLevel::Debug,
        }
    }

    fn is_own_target(target: &str) -> bool {
        target
            .strip_prefix(SELF_TARGET_PREFIX)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    }
}

impl Default for FanlogLayer {
    fn default() -> Self {
        Self::new(crate::global::logger())
    }
}

impl<S> Layer<S> for FanlogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if Self::is_own_target(metadata.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let Some(text) = visitor.finish() else {
            return;
        };
        // A logger without destinations for this level is not an error here.
        let _ = self.logger.forward(Self::map_level(metadata.level()), &text);
    }
}

/// Visitor collecting the message and any extra fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }

    /// `message key=value ...`, or `None` for an empty event.
    fn finish(self) -> Option<String> {
        match (self.message, self.fields.is_empty()) {
            (Some(message), true) => Some(message),
            (Some(message), false) => Some(format!("{message} {}", self.fields)),
            (None, false) => Some(self.fields),
            (None, true) => None,
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }
}

/// Installs a global subscriber that forwards every event to `logger`.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(logger: &'static Logger) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(FanlogLayer::new(logger))
        .try_init()
}

/// Like [`init_tracing`], with an additional filter layer in front.
///
/// # Example
///
/// ```rust,ignore
/// use fanlog::{global, init_tracing_with_filter};
/// use tracing_subscriber::EnvFilter;
///
/// init_tracing_with_filter(global::logger(), EnvFilter::from_default_env())?;
/// ```
pub fn init_tracing_with_filter<F>(logger: &'static Logger, filter: F) -> Result<(), TryInitError>
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(filter)
        .with(FanlogLayer::new(logger))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InitConfig;
    use logging::{LevelSet, OptionSet};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_map_level() {
        assert_eq!(FanlogLayer::map_level(&Level::ERROR), FanlogLevel::Error);
        assert_eq!(FanlogLayer::map_level(&Level::WARN), FanlogLevel::Warning);
        assert_eq!(FanlogLayer::map_level(&Level::INFO), FanlogLevel::Info);
        assert_eq!(FanlogLayer::map_level(&Level::DEBUG), FanlogLevel::Debug);
        assert_eq!(FanlogLayer::map_level(&Level::TRACE), FanlogLevel::Debug);
    }

    #[test]
    fn test_own_targets_are_skipped() {
        assert!(FanlogLayer::is_own_target("fanlog::file"));
        assert!(FanlogLayer::is_own_target("fanlog"));
        assert!(!FanlogLayer::is_own_target("app::fanlog"));
        assert!(!FanlogLayer::is_own_target("fanlogger"));
        assert!(!FanlogLayer::is_own_target("fanlog_ext::io"));
    }

    #[test]
    fn test_events_reach_file_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.log");
        let logger: &'static Logger = Box::leak(Box::new(Logger::new()));
        logger
            .initialize(InitConfig::silent().with_file(
                &path,
                LevelSet::ALL,
                OptionSet::MSG_ONLY | OptionSet::NO_HEADER,
            ))
            .unwrap();

        let subscriber = tracing_subscriber::registry().with(FanlogLayer::new(logger));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app::db", retries = 3, "connection lost");
            tracing::debug!(target: "fanlog::file", "ignored");
            tracing::info!(target: "fanlogger", "kept");
        });
        logger.cleanup().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "connection lost retries=3\nkept\n");
    }
}
