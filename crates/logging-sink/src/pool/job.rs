//! crates/logging-sink/src/pool/job.rs

use std::sync::Arc;
use std::time::Instant;

use logging::Level;

use crate::plugin::{PluginId, PluginRecord};

/// One plugin that should receive a message, with the line rendered for it.
#[derive(Debug)]
pub struct JobTarget {
    /// Plugin id, for diagnostics.
    pub plugin: PluginId,
    /// Plugin to call.
    pub record: Arc<PluginRecord>,
    /// Line rendered with the plugin's options.
    pub line: String,
}

#[derive(Debug)]
pub(crate) struct TicketedTarget {
    pub(crate) target: JobTarget,
    pub(crate) ticket: u64,
}

/// A message bound for one or more plugins.
#[derive(Debug)]
pub(crate) struct Job {
    pub(crate) level: Level,
    pub(crate) targets: Vec<TicketedTarget>,
    pub(crate) enqueued: Instant,
}

impl Job {
    /// Hands tickets back in reverse issue order.
    pub(crate) fn revoke(self) {
        for entry in self.targets.into_iter().rev() {
            entry.target.record.revoke_ticket(entry.ticket);
        }
    }
}
