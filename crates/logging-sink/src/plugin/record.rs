//! crates/logging-sink/src/plugin/record.rs
//! Per-plugin state shared between the registry and pool workers.
//!
//! Jobs for one plugin carry tickets issued in enqueue order. A worker holding
//! ticket `n` waits until `served == n`, runs the write, then advances
//! `served`. Unloading waits until `served == issued`.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use logging::{DestinationConfig, Error, Level, Result};

use super::descriptor::PluginInfo;
use super::interface::Plugin;

/// Health snapshot of a loaded plugin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginHealth {
    /// The plugin is initialized and accepting jobs.
    pub loaded: bool,
    /// At least one write failed.
    pub errored: bool,
    /// Unload has begun; no new jobs are accepted.
    pub unloading: bool,
    /// Writes completed, successful or not.
    pub served: u64,
    /// Writes that failed.
    pub failures: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct Tickets {
    issued: u64,
    served: u64,
    unloading: bool,
}

/// A loaded plugin and its bookkeeping.
pub struct PluginRecord {
    path: PathBuf,
    plugin: Box<dyn Plugin>,
    info: PluginInfo,
    tickets: Mutex<Tickets>,
    turn: Condvar,
    loaded: AtomicBool,
    errored: AtomicBool,
    failures: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl PluginRecord {
    pub(crate) fn new(path: PathBuf, plugin: Box<dyn Plugin>, info: PluginInfo) -> Self {
        Self {
            path,
            plugin,
            info,
            tickets: Mutex::new(Tickets::default()),
            turn: Condvar::new(),
            loaded: AtomicBool::new(true),
            errored: AtomicBool::new(false),
            failures: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    fn tickets(&self) -> MutexGuard<'_, Tickets> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Path the plugin was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Descriptor reported at load time.
    pub const fn info(&self) -> &PluginInfo {
        &self.info
    }

    /// Levels and options declared by the plugin.
    pub const fn config(&self) -> DestinationConfig {
        DestinationConfig::new(self.info.levels, self.info.options)
    }

    /// Returns `true` if the plugin accepts `level` and is not unloading.
    pub fn wants(&self, level: Level) -> bool {
        self.config().wants(level) && !self.tickets().unloading
    }

    /// Reserves the next FIFO slot, unless the plugin is unloading.
    pub(crate) fn issue_ticket(&self) -> Option<u64> {
        let mut tickets = self.tickets();
        if tickets.unloading {
            return None;
        }
        let ticket = tickets.issued;
        tickets.issued += 1;
        Some(ticket)
    }

    /// Returns the most recent ticket when its job never reached the queue.
    pub(crate) fn revoke_ticket(&self, ticket: u64) {
        let mut tickets = self.tickets();
        if tickets.issued == ticket + 1 {
            tickets.issued = ticket;
        }
        drop(tickets);
        self.turn.notify_all();
    }

    /// Runs the write for `ticket` once every earlier ticket is served.
    ///
    /// Failures and panics are recorded in the health flags and returned;
    /// the ticket is always consumed.
    pub(crate) fn run(&self, ticket: u64, level: Level, line: &str) -> Result<()> {
        let mut tickets = self.tickets();
        while tickets.served < ticket {
            tickets = self
                .turn
                .wait(tickets)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(tickets);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.plugin.write(level, line)))
            .unwrap_or_else(|_| Err(Error::PluginFailure("plugin panicked during write".into())));
        if let Err(err) = &outcome {
            self.errored.store(true, Ordering::Release);
            self.failures.fetch_add(1, Ordering::AcqRel);
            *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
        }

        self.tickets().served += 1;
        self.turn.notify_all();
        outcome
    }

    /// Stops accepting jobs. Returns `false` if unload already began.
    pub(crate) fn begin_unload(&self) -> bool {
        let mut tickets = self.tickets();
        !std::mem::replace(&mut tickets.unloading, true)
    }

    /// Blocks until every issued ticket is served.
    pub(crate) fn wait_idle(&self) {
        let mut tickets = self.tickets();
        while tickets.served < tickets.issued {
            tickets = self
                .turn
                .wait(tickets)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Calls the plugin's cleanup and marks it unloaded.
    pub(crate) fn cleanup(&self) -> Result<()> {
        self.loaded.store(false, Ordering::Release);
        panic::catch_unwind(AssertUnwindSafe(|| self.plugin.cleanup()))
            .unwrap_or_else(|_| Err(Error::PluginFailure("plugin panicked during cleanup".into())))
    }

    /// Current health flags.
    pub fn health(&self) -> PluginHealth {
        let (served, unloading) = {
            let tickets = self.tickets();
            (tickets.served, tickets.unloading)
        };
        PluginHealth {
            loaded: self.loaded.load(Ordering::Acquire),
            errored: self.errored.load(Ordering::Acquire),
            unloading,
            served,
            failures: self.failures.load(Ordering::Acquire),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("path", &self.path)
            .field("info", &self.info)
            .field("health", &self.health())
            .finish_non_exhaustive()
    }
}
