//! src/dispatch.rs
//! Routes one message to every destination that accepts its level.
//!
//! ```text
//! log(level, message)
//!   -> snapshot built-ins, ask files and plugins who wants `level`
//!   -> squelch: drop, or admit (optionally preceded by a repeat marker)
//!   -> capture header once
//!   -> stdout / stderr / syslog / files    (synchronous, caller's thread)
//!   -> plugins                             (one job on the worker queue)
//! ```
//!
//! A failing destination never stops delivery to the others; the first
//! failure is returned after every destination was attempted.

use std::sync::Arc;

use logging::{
    Admission, Error, Level, Result, fingerprint, render_line, squelch_marker, trace_dispatch,
    trace_squelch,
};
use logging_sink::ConsoleStream;
use logging_sink::plugin::{PluginId, PluginRecord};
use logging_sink::pool::JobTarget;

use crate::logger::Runtime;
use crate::registry::ConfigSnapshot;

type Targets = Vec<(PluginId, Arc<PluginRecord>)>;

/// Keeps the first error seen.
fn note(first: &mut Option<Error>, destination: &'static str, err: Error) {
    trace_dispatch!(destination, error = %err, "delivery failed");
    first.get_or_insert(err);
}

pub(crate) fn dispatch(rt: &Runtime, level: Level, message: &str) -> Result<()> {
    if message.is_empty() {
        return Err(Error::InvalidString("message"));
    }

    let snapshot = rt.registry.snapshot()?;
    let files_want = rt.files.wants(level)?;
    let plugins = rt.plugins.targets(level)?;
    if !snapshot.wants(level) && !files_want && plugins.is_empty() {
        return Err(Error::NoDestination);
    }

    if let Some(squelch) = &rt.squelch {
        match squelch.admit(fingerprint(message)) {
            Admission::Suppressed => {
                trace_squelch!(level = %level, "suppressed");
                return Ok(());
            }
            Admission::Admit { squelched: Some(count) } => {
                let marker = deliver(rt, &snapshot, level, &squelch_marker(count), &plugins);
                let message = deliver(rt, &snapshot, level, message, &plugins);
                return marker.and(message);
            }
            Admission::Admit { squelched: None } => {}
        }
    }

    deliver(rt, &snapshot, level, message, &plugins)
}

fn deliver(
    rt: &Runtime,
    snapshot: &ConfigSnapshot,
    level: Level,
    message: &str,
    plugins: &Targets,
) -> Result<()> {
    let captured = rt.headers.capture(snapshot.process_name.as_deref());
    let header = captured.header();
    let mut first = None;

    for (stream, config, name) in [
        (ConsoleStream::Stdout, &snapshot.stdout, "stdout"),
        (ConsoleStream::Stderr, &snapshot.stderr, "stderr"),
    ] {
        if !config.wants(level) {
            continue;
        }
        let style = rt
            .style_policy
            .applies_to(stream)
            .then(|| rt.styles.resolve_active(level));
        let line = render_line(
            &config.fields(),
            level,
            &header,
            message,
            style.as_ref().map(|(entry, mode)| (entry, *mode)),
        );
        if let Err(err) = stream.write_line(&line) {
            note(&mut first, name, err.into());
        }
    }

    if snapshot.syslog.wants(level) {
        let line = render_line(&snapshot.syslog.fields(), level, &header, message, None);
        if let Err(err) = rt.registry.syslog_write(level, &line) {
            note(&mut first, "syslog", err);
        }
    }

    match rt
        .files
        .dispatch(level, |config| render_line(&config.fields(), level, &header, message, None))
    {
        Ok(delivery) => {
            if let Some(err) = delivery.error {
                note(&mut first, "file", err);
            }
        }
        Err(err) => note(&mut first, "file", err),
    }

    if !plugins.is_empty() {
        let targets = plugins
            .iter()
            .map(|(id, record)| JobTarget {
                plugin: *id,
                record: Arc::clone(record),
                line: render_line(&record.config().fields(), level, &header, message, None),
            })
            .collect();
        if let Err(err) = rt.pool.submit(level, targets) {
            note(&mut first, "plugin", err);
        }
    }

    first.map_or(Ok(()), Err)
}
