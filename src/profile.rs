//! C1 — profile table.
//!
//! A fixed-size array of per-pc-hash counters, decremented on the
//! interpreter's hot path. Access is intentionally unsynchronized: counters
//! are hints, and a lost update only delays or accelerates promotion. Do not
//! add atomics here — that would change the observed throughput behavior the
//! source material documents as intentional.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::TraceJitError;
use crate::hash::bucket_index;
use crate::pc::Pc;

/// Racy hot-counter array keyed by `hash(pc) mod len`.
pub struct ProfileTable {
    counters: Box<[UnsafeCell<u8>]>,
    threshold: u8,
    /// Fixed reference point `last_reset_micros` is measured from, so the
    /// staleness stamp stays on a monotonic clock instead of wall-clock time
    /// (which NTP/clock adjustments can step backward).
    epoch: Instant,
    last_reset_micros: AtomicU64,
}

// Safety: every access to `counters` is a deliberately unsynchronized byte
// load/store, matching the source material's documented racy-by-design
// profile counters. No torn reads are possible at byte granularity.
unsafe impl Sync for ProfileTable {}

impl ProfileTable {
    /// Allocate a profile table of `len` counters, all initialized to
    /// `threshold`. Rejects a zero length.
    pub fn new(len: usize, threshold: u8) -> Result<Self, TraceJitError> {
        if len == 0 {
            return Err(TraceJitError::InvalidConfig(
                "profile table length must be nonzero".into(),
            ));
        }
        let counters = (0..len).map(|_| UnsafeCell::new(threshold)).collect();
        Ok(ProfileTable {
            counters,
            threshold,
            epoch: Instant::now(),
            last_reset_micros: AtomicU64::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    fn index_for(&self, pc: Pc) -> usize {
        bucket_index(pc, self.counters.len())
    }

    /// Read the current counter for `pc`. Racy: may observe a value mid-update.
    pub fn get(&self, pc: Pc) -> u8 {
        let idx = self.index_for(pc);
        unsafe { *self.counters[idx].get() }
    }

    /// Decrement the counter for `pc`, saturating at zero, and return the
    /// new value. Reaching zero signals "hot" to the caller.
    pub fn decrement(&self, pc: Pc) -> u8 {
        let idx = self.index_for(pc);
        unsafe {
            let cell = self.counters[idx].get();
            let new = (*cell).saturating_sub(1);
            *cell = new;
            new
        }
    }

    /// Rewrite every counter to `threshold` and stamp `last_reset` with the
    /// current monotonic microsecond timestamp.
    pub fn reset(&self) {
        for cell in self.counters.iter() {
            unsafe { *cell.get() = self.threshold };
        }
        self.last_reset_micros
            .store(self.elapsed_micros(), Ordering::Relaxed);
    }

    /// Microseconds since the last `reset()`.
    pub fn micros_since_reset(&self) -> u64 {
        self.elapsed_micros()
            .saturating_sub(self.last_reset_micros.load(Ordering::Relaxed))
    }

    fn elapsed_micros(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }
}
