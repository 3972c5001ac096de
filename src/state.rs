//! Shared process state handed to both worker threads at construction.
//!
//! Replaces free-standing process globals with one explicit context object:
//! a run flag polled by both loops at iteration granularity, the
//! calibration offsets published exactly once by the sampling thread and
//! read thereafter by the file writer, and a sampling-finished mark the
//! writer waits on before its final drain so a last burst of readings is
//! never stranded in the queue. The `OnceCell` gives the
//! write-once/read-many handoff acquire-release visibility, so "offsets are
//! present" doubles as the calibration-ready signal with no separate flag
//! to race against.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;

use crate::reading::Axes;

/// Run flag plus calibration handoff shared by the sampler and writer.
#[derive(Debug, Default)]
pub struct SharedState {
    shutdown: AtomicBool,
    sampling_done: AtomicBool,
    offsets: OnceCell<Axes>,
}

impl SharedState {
    /// Fresh state: running, not calibrated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the worker loops should keep going.
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
    }

    /// Ask both worker threads to finish their current cycle and exit.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Mark the sampling thread as exited: no further readings will be
    /// queued. Idempotent.
    pub fn mark_sampling_finished(&self) {
        self.sampling_done.store(true, Ordering::SeqCst);
    }

    /// Whether the sampling thread has exited.
    pub fn sampling_finished(&self) -> bool {
        self.sampling_done.load(Ordering::SeqCst)
    }

    /// Publish the finished calibration offsets. Returns false if offsets
    /// were already published (they are immutable once set).
    pub fn publish_offsets(&self, offsets: Axes) -> bool {
        self.offsets.set(offsets).is_ok()
    }

    /// The published offsets, if calibration has completed.
    pub fn offsets(&self) -> Option<Axes> {
        self.offsets.get().copied()
    }

    /// Whether calibration has completed and persistence may begin.
    pub fn is_calibrated(&self) -> bool {
        self.offsets.get().is_some()
    }
}
