//! Exit-category counters and the runtime's diagnostic snapshot.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Live exit-category counters, bumped at the exact transition point inside
/// the trace assembler and request gate.
#[derive(Default)]
pub struct ExitCounters {
    pub tselect_end: AtomicUsize,
    pub tselect_abort: AtomicUsize,
    pub fatal: AtomicUsize,
}

impl ExitCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_end(&self) {
        self.tselect_end.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abort(&self) {
        self.tselect_abort.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fatal(&self) {
        self.fatal.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ExitCountersSnapshot {
        ExitCountersSnapshot {
            tselect_end: self.tselect_end.load(Ordering::Relaxed),
            tselect_abort: self.tselect_abort.load(Ordering::Relaxed),
            fatal: self.fatal.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`ExitCounters`], returned by `stats()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitCountersSnapshot {
    pub tselect_end: usize,
    pub tselect_abort: usize,
    pub fatal: usize,
}

/// Snapshot returned by `TraceJitRuntime::stats()`.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeStats {
    pub occupied_slots: usize,
    pub total_slots: usize,
    pub chained_slots: usize,
    pub queue_len: usize,
    pub threshold: u8,
    pub blocking_mode: bool,
    pub lookup_hits: usize,
    pub lookup_misses: usize,
    pub exits: ExitCountersSnapshot,
}
