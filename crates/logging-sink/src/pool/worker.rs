//! crates/logging-sink/src/pool/worker.rs
//! Worker thread body.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Receiver;
use logging::trace_pool;

use super::job::Job;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) submitted: AtomicU64,
    pub(crate) executed: AtomicU64,
    pub(crate) failed_writes: AtomicU64,
}

/// Runs jobs until the queue is closed and drained.
pub(crate) fn worker_main(index: usize, jobs: Receiver<Job>, counters: Arc<Counters>) {
    trace_pool!(worker = index, "started");
    for job in &jobs {
        let waited = job.enqueued.elapsed();
        for entry in job.targets {
            let outcome = entry
                .target
                .record
                .run(entry.ticket, job.level, &entry.target.line);
            if let Err(err) = outcome {
                counters.failed_writes.fetch_add(1, Ordering::AcqRel);
                trace_pool!(
                    worker = index,
                    plugin = %entry.target.plugin,
                    error = %err,
                    "plugin write failed"
                );
            }
        }
        counters.executed.fetch_add(1, Ordering::AcqRel);
        trace_pool!(worker = index, queued_us = waited.as_micros() as u64, "job done");
    }
    trace_pool!(worker = index, "stopped");
}
