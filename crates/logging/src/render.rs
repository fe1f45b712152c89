//! crates/logging/src/render.rs
//! Composes output lines from a header snapshot and a message.

use std::fmt::Write as _;

use crate::levels::Level;
use crate::options::HeaderFields;
use crate::style::{ANSI_RESET, ColorMode, StyleEntry};

/// Header values captured once per dispatched message.
///
/// Every destination renders from the same snapshot so that stdout, files,
/// and plugins agree on the timestamp of a message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header<'a> {
    /// Wall-clock time, already formatted (`HH:MM:SS`).
    pub timestamp: &'a str,
    /// Millisecond part of the timestamp.
    pub msec: u16,
    /// Local hostname, if known.
    pub hostname: Option<&'a str>,
    /// Process name, if configured.
    pub name: Option<&'a str>,
    /// Process id.
    pub pid: u32,
    /// Calling thread id.
    pub tid: u64,
}

/// Renders one output line, newline included.
///
/// Layout: `time[.msec] host [tag] name(pid.tid): message`, with absent
/// fields and their separators dropped. When `style` is given the line body
/// is wrapped in its escape sequences.
pub fn render_line(
    fields: &HeaderFields,
    level: Level,
    header: &Header<'_>,
    message: &str,
    style: Option<(&StyleEntry, ColorMode)>,
) -> String {
    let mut out = String::with_capacity(message.len() + 64);
    if let Some((entry, mode)) = style {
        out.push_str(&entry.style.ansi_sequence(mode));
    }

    let mut first = true;

    if fields.time {
        out.push_str(header.timestamp);
        if fields.msec {
            let _ = write!(out, ".{:03}", header.msec);
        }
        first = false;
    }

    if fields.host {
        if let Some(host) = header.hostname.filter(|h| !h.is_empty()) {
            sep(&mut out, &mut first);
            out.push_str(host);
        }
    }

    if fields.level {
        sep(&mut out, &mut first);
        let _ = write!(out, "[{}]", level.tag());
    }

    let mut named = false;
    if fields.name {
        if let Some(name) = header.name.filter(|n| !n.is_empty()) {
            sep(&mut out, &mut first);
            out.push_str(name);
            named = true;
        }
    }

    if fields.pid || fields.tid {
        if named {
            out.push('(');
        } else {
            sep(&mut out, &mut first);
        }
        if fields.pid {
            let _ = write!(out, "{}", header.pid);
        }
        if fields.tid {
            if fields.pid {
                out.push('.');
            }
            let _ = write!(out, "{}", header.tid);
        }
        if named {
            out.push(')');
        }
        first = false;
    }

    if !first {
        out.push_str(": ");
    }
    out.push_str(message);

    if style.is_some() {
        out.push_str(ANSI_RESET);
    }
    out.push('\n');
    out
}

fn sep(out: &mut String, first: &mut bool) {
    if !*first {
        out.push(' ');
    }
    *first = false;
}
