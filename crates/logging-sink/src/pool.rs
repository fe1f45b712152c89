//! crates/logging-sink/src/pool.rs
//! Bounded job queue and the worker threads that feed plugins.
//!
//! # Thread Protocol
//!
//! ```text
//! Producer                               Worker
//! ────────                               ──────
//! lock submit slot
//! issue one ticket per target plugin
//! send_timeout(job) ──────────────────▶  recv job
//! unlock                                 per target: wait for its ticket,
//!                                        call Plugin::write, advance
//! shutdown: drop sender ──────────────▶  drain remaining jobs, exit
//! ```
//!
//! Tickets are issued while the submit slot is locked, so each plugin sees
//! its jobs in enqueue order even when several workers run concurrently.

mod job;
mod worker;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{SendTimeoutError, Sender, bounded};
use logging::{Error, Level, Result, trace_pool};

pub use job::JobTarget;
use job::{Job, TicketedTarget};
use worker::{Counters, worker_main};

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 2;

/// Default number of jobs the queue holds before producers block.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default time a producer waits for queue space.
pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(250);

/// Sizing of a [`WorkerPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Worker threads; at least one.
    pub workers: usize,
    /// Queue slots; at least one.
    pub queue_capacity: usize,
    /// How long `submit` waits for space before failing.
    pub enqueue_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: DEFAULT_ENQUEUE_TIMEOUT,
        }
    }
}

/// Job counters of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs accepted by `submit`.
    pub submitted: u64,
    /// Jobs fully processed by workers.
    pub executed: u64,
    /// Individual plugin writes that failed.
    pub failed_writes: u64,
}

/// Fixed set of worker threads consuming a bounded job queue.
#[derive(Debug)]
pub struct WorkerPool {
    config: PoolConfig,
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Spawns `config.workers` named worker threads.
    pub fn start(config: PoolConfig) -> Result<Self> {
        if config.workers == 0 || config.queue_capacity == 0 {
            return Err(Error::InvalidArgument(format!(
                "worker pool needs at least one worker and one queue slot (got {} and {})",
                config.workers, config.queue_capacity
            )));
        }

        let (tx, rx) = bounded::<Job>(config.queue_capacity);
        let counters = Arc::new(Counters::default());
        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let rx = rx.clone();
            let counters = Arc::clone(&counters);
            let handle = thread::Builder::new()
                .name(format!("fanlog-worker-{index}"))
                .spawn(move || worker_main(index, rx, counters))?;
            workers.push(handle);
        }
        trace_pool!(
            workers = config.workers,
            capacity = config.queue_capacity,
            "pool started"
        );

        Ok(Self {
            config,
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            counters,
        })
    }

    /// Sizing the pool was started with.
    pub const fn config(&self) -> PoolConfig {
        self.config
    }

    fn sender(&self) -> MutexGuard<'_, Option<Sender<Job>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` until shutdown begins.
    pub fn is_running(&self) -> bool {
        self.sender().is_some()
    }

    /// Enqueues one message for `targets`, returning how many plugins it was
    /// queued for.
    ///
    /// Plugins that began unloading are skipped. Waits up to the configured
    /// timeout for queue space, then fails with [`Error::QueueFull`].
    pub fn submit(&self, level: Level, targets: Vec<JobTarget>) -> Result<usize> {
        let slot = self.sender();
        let Some(tx) = slot.as_ref() else {
            return Err(Error::NotReady);
        };

        let targets: Vec<TicketedTarget> = targets
            .into_iter()
            .filter_map(|target| {
                target
                    .record
                    .issue_ticket()
                    .map(|ticket| TicketedTarget { target, ticket })
            })
            .collect();
        if targets.is_empty() {
            return Ok(0);
        }

        let count = targets.len();
        let job = Job {
            level,
            targets,
            enqueued: Instant::now(),
        };
        match tx.send_timeout(job, self.config.enqueue_timeout) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::AcqRel);
                Ok(count)
            }
            Err(SendTimeoutError::Timeout(job)) => {
                job.revoke();
                trace_pool!(timeout_ms = self.config.enqueue_timeout.as_millis() as u64, "queue full");
                Err(Error::QueueFull {
                    timeout: self.config.enqueue_timeout,
                })
            }
            Err(SendTimeoutError::Disconnected(job)) => {
                job.revoke();
                Err(Error::NotReady)
            }
        }
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            submitted: self.counters.submitted.load(Ordering::Acquire),
            executed: self.counters.executed.load(Ordering::Acquire),
            failed_writes: self.counters.failed_writes.load(Ordering::Acquire),
        }
    }

    /// Stops accepting jobs, lets workers drain the queue, and joins them.
    ///
    /// Calling it again is a no-op that returns the final counters.
    pub fn shutdown(&self) -> Result<PoolStats> {
        drop(self.sender().take());
        let handles: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        let mut panicked = 0usize;
        for handle in handles {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        let stats = self.stats();
        trace_pool!(
            executed = stats.executed,
            failed = stats.failed_writes,
            "pool stopped"
        );
        if panicked > 0 {
            return Err(Error::Internal(format!("{panicked} worker thread(s) panicked")));
        }
        Ok(stats)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{
        Plugin, PluginCatalog, PluginInfo, PluginRegistry, PluginVersion,
    };
    use logging::{LevelSet, OptionSet};
    use std::sync::Barrier;

    struct Gate {
        barrier: Arc<Barrier>,
    }

    impl Plugin for Gate {
        fn query(&self) -> Result<PluginInfo> {
            Ok(PluginInfo::new(
                PluginVersion::new(1, 0, 0),
                LevelSet::ALL,
                OptionSet::MSG_ONLY,
                "tests",
                "blocks until released",
            ))
        }

        fn write(&self, _level: Level, _line: &str) -> Result<()> {
            self.barrier.wait();
            Ok(())
        }
    }

    #[test]
    fn zero_workers_rejected() {
        let config = PoolConfig {
            workers: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(WorkerPool::start(config), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn submit_after_shutdown_is_not_ready() {
        let pool = WorkerPool::start(PoolConfig::default()).unwrap();
        pool.shutdown().unwrap();
        assert!(!pool.is_running());
        assert!(matches!(pool.submit(Level::Info, Vec::new()), Err(Error::NotReady)));
        pool.shutdown().unwrap();
    }

    #[test]
    fn full_queue_times_out() {
        let barrier = Arc::new(Barrier::new(2));
        let gate = Arc::clone(&barrier);
        let catalog = PluginCatalog::new().with("gate", move || {
            Box::new(Gate {
                barrier: Arc::clone(&gate),
            })
        });
        let registry = PluginRegistry::new(1, Arc::new(catalog));
        let id = registry.load("gate").unwrap();
        let record = registry.get(id).unwrap();

        let pool = WorkerPool::start(PoolConfig {
            workers: 1,
            queue_capacity: 1,
            enqueue_timeout: Duration::from_millis(20),
        })
        .unwrap();
        let target = || {
            vec![JobTarget {
                plugin: id,
                record: Arc::clone(&record),
                line: "x".into(),
            }]
        };

        // The first job occupies the worker, the second fills the queue.
        pool.submit(Level::Info, target()).unwrap();
        let mut queued = 1;
        let outcome = loop {
            match pool.submit(Level::Info, target()) {
                Ok(_) => queued += 1,
                Err(err) => break err,
            }
            assert!(queued <= 3, "queue never filled");
        };
        assert!(matches!(outcome, Error::QueueFull { .. }));

        for _ in 0..queued {
            barrier.wait();
        }
        let stats = pool.shutdown().unwrap();
        assert_eq!(stats.executed, queued);
        assert_eq!(record.health().served, queued);
    }
}
