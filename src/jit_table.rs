//! C2 — JIT table.
//!
//! An open-addressed hash table mapping bytecode pc to native code address,
//! with an explicit next-index `chain` field for collisions. Readers are
//! lock-free; writers serialize under a single `table_lock` mutex. See
//! `try_claim_slot` for the publication ordering this depends on.

use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::TraceJitError;
use crate::hash::bucket_index;
use crate::pc::Pc;
use crate::suspend::SuspendRegistry;

/// One slot in the table.
struct JitEntry {
    /// 0 means empty. Written exactly once, before any other field.
    dpc: AtomicUsize,
    /// Null until the compiler installs a translation; immutable after.
    code_address: AtomicPtr<()>,
    /// Index of the next slot in this bucket's chain, or `END`.
    chain: AtomicUsize,
}

impl JitEntry {
    fn empty(end: usize) -> Self {
        JitEntry {
            dpc: AtomicUsize::new(0),
            code_address: AtomicPtr::new(ptr::null_mut()),
            chain: AtomicUsize::new(end),
        }
    }
}

/// Outcome of attempting to claim a table slot for a pc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// A new slot was claimed for this pc.
    Claimed,
    /// A concurrent writer had already claimed a slot for this exact pc.
    AlreadyPresent,
    /// The chain's linear probe made a full revolution with no empty slot.
    TableFull,
}

pub struct JitTable {
    entries: Box<[JitEntry]>,
    /// Table capacity `N`, and the `END` chain sentinel (no valid index
    /// equals it).
    capacity: usize,
    table_lock: Mutex<()>,
}

impl JitTable {
    /// Allocate a table of `capacity` slots, every `chain` initialized to
    /// `END` (== capacity). Rejects a zero capacity.
    pub fn new(capacity: usize) -> Result<Self, TraceJitError> {
        if capacity == 0 {
            return Err(TraceJitError::InvalidConfig(
                "JIT table capacity must be nonzero".into(),
            ));
        }
        let entries = (0..capacity).map(|_| JitEntry::empty(capacity)).collect();
        Ok(JitTable {
            entries,
            capacity,
            table_lock: Mutex::new(()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the first slot consulted for `pc`.
    fn primary_index(&self, pc: Pc) -> usize {
        bucket_index(pc, self.capacity)
    }

    /// Hot lookup. Returns `None` immediately if any thread is suspended —
    /// translated code must never be entered across a safepoint.
    pub fn lookup(&self, pc: Pc, suspend: &SuspendRegistry) -> Option<*const ()> {
        if suspend.any_suspended() {
            return None;
        }
        let idx = self.find_entry(pc)?;
        let addr = self.entries[idx].code_address.load(Ordering::Acquire);
        if addr.is_null() {
            None
        } else {
            Some(addr as *const ())
        }
    }

    /// Walk the bucket chain for `pc`, lock-free. Returns the slot index if
    /// a matching entry exists, independent of whether code is installed.
    pub fn find_entry(&self, pc: Pc) -> Option<usize> {
        let mut idx = self.primary_index(pc);
        if self.entries[idx].dpc.load(Ordering::Acquire) == pc.0 {
            return Some(idx);
        }
        loop {
            let next = self.entries[idx].chain.load(Ordering::Acquire);
            if next == self.capacity {
                return None;
            }
            idx = next;
            if self.entries[idx].dpc.load(Ordering::Acquire) == pc.0 {
                return Some(idx);
            }
        }
    }

    /// Install the native translation for `pc`. Precondition: a slot for
    /// `pc` was previously allocated via `try_claim_slot`.
    pub fn install_code(&self, pc: Pc, native: *const ()) -> Result<(), TraceJitError> {
        let idx = self.find_entry(pc).ok_or_else(|| {
            TraceJitError::InvalidState(format!("no slot allocated for pc {:#x}", pc.0))
        })?;
        self.entries[idx]
            .code_address
            .store(native as *mut (), Ordering::Release);
        Ok(())
    }

    /// Claim a table slot for `pc` under the table lock.
    ///
    /// Must only be called once the caller has confirmed, via a first
    /// unlocked `find_entry`, that no slot yet exists for `pc` — this
    /// re-walks the chain under the lock in case a concurrent writer beat us
    /// to it.
    pub fn try_claim_slot(&self, pc: Pc) -> ClaimResult {
        let _guard = self.table_lock.lock();

        let mut idx = self.primary_index(pc);
        if self.entries[idx].dpc.load(Ordering::Acquire) == pc.0 {
            return ClaimResult::AlreadyPresent;
        }

        if self.entries[idx].dpc.load(Ordering::Acquire) != 0 {
            // Primary bucket occupied by a different pc: walk to the chain
            // tail, re-checking for an exact match as we go.
            loop {
                if self.entries[idx].dpc.load(Ordering::Acquire) == pc.0 {
                    return ClaimResult::AlreadyPresent;
                }
                let next = self.entries[idx].chain.load(Ordering::Acquire);
                if next == self.capacity {
                    break;
                }
                idx = next;
            }
            let prev = idx;
            loop {
                idx += 1;
                if idx == self.capacity {
                    idx = 0;
                }
                if self.entries[idx].dpc.load(Ordering::Acquire) == 0 || idx == prev {
                    break;
                }
            }
            if idx == prev {
                return ClaimResult::TableFull;
            }
            // Publication order: write the new slot fully before chaining
            // the predecessor to it, so a lock-free reader that follows the
            // new link always observes a fully-initialized successor.
            self.entries[idx].dpc.store(pc.0, Ordering::Release);
            self.entries[prev].chain.store(idx, Ordering::Release);
            return ClaimResult::Claimed;
        }

        self.entries[idx].dpc.store(pc.0, Ordering::Release);
        ClaimResult::Claimed
    }

    /// Count of occupied slots and of slots reached only via chaining.
    pub fn occupancy(&self) -> (usize, usize) {
        let mut occupied = 0;
        let mut chained = 0;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.dpc.load(Ordering::Relaxed) != 0 {
                occupied += 1;
                if self.primary_index(Pc(entry.dpc.load(Ordering::Relaxed))) != idx {
                    chained += 1;
                }
            }
        }
        (occupied, chained)
    }
}
