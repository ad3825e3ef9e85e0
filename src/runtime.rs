//! C5 — lifecycle and stats.
//!
//! Owns every piece of process-wide state the core needs. No global
//! singleton: callers hold this in an `Arc` and clone it into every
//! interpreter thread.

use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use crate::config::{ExecutionMode, RuntimeConfig};
use crate::error::TraceJitError;
use crate::interp_state::ThreadInterpState;
use crate::jit_table::JitTable;
use crate::kill_switch::KillSwitch;
use crate::pc::Pc;
use crate::profile::ProfileTable;
use crate::queue::{ChannelQueue, CompileQueue};
use crate::request_gate::RequestGate;
use crate::stats::{ExitCounters, RuntimeStats};
use crate::suspend::{DebugFlag, SuspendRegistry};
use crate::trace::TraceAssembler;

pub struct TraceJitRuntime {
    config: RuntimeConfig,
    jit_table: Option<JitTable>,

    /// Owns the allocation for the runtime's lifetime — freed only at
    /// `shutdown()`, never early, so a reader that captured `profile_live`
    /// before a kill-switch fire can keep dereferencing it safely.
    profile_copy: Option<Box<ProfileTable>>,
    /// The "live" pointer `checkRequest`/`check` consult; nulled by the
    /// kill-switch without touching `profile_copy`.
    profile_live: AtomicPtr<ProfileTable>,

    queue: Box<dyn CompileQueue>,
    debug: DebugFlag,
    suspend: SuspendRegistry,
    exits: ExitCounters,

    lookup_hits: AtomicUsize,
    lookup_misses: AtomicUsize,
}

impl TraceJitRuntime {
    /// `startup()`: start the compiler work queue, and — if the execution
    /// mode is JIT-enabled — allocate the JIT and profile tables and
    /// perform an initial profile reset.
    pub fn new(config: RuntimeConfig) -> Result<Self, TraceJitError> {
        let (jit_table, profile_copy, profile_live) = if config.execution_mode == ExecutionMode::Jit
        {
            let jit_table = JitTable::new(config.max_table_entries)
                .map_err(|e| TraceJitError::Startup(e.to_string()))?;
            let profile = ProfileTable::new(config.profile_size, config.threshold)
                .map_err(|e| TraceJitError::Startup(e.to_string()))?;
            profile.reset();
            let boxed = Box::new(profile);
            let live = boxed.as_ref() as *const ProfileTable as *mut ProfileTable;
            (Some(jit_table), Some(boxed), AtomicPtr::new(live))
        } else {
            (None, None, AtomicPtr::new(ptr::null_mut()))
        };

        Ok(TraceJitRuntime {
            config,
            jit_table,
            profile_copy,
            profile_live,
            queue: Box::new(ChannelQueue::new()),
            debug: DebugFlag::new(),
            suspend: SuspendRegistry::new(),
            exits: ExitCounters::new(),
            lookup_hits: AtomicUsize::new(0),
            lookup_misses: AtomicUsize::new(0),
        })
    }

    fn live_profile(&self) -> Option<&ProfileTable> {
        let ptr = self.profile_live.load(Ordering::Acquire);
        if ptr.is_null() {
            None
        } else {
            // Safety: `ptr` is either null or points at `profile_copy`,
            // which outlives `self`.
            Some(unsafe { &*ptr })
        }
    }

    pub fn debug_flag(&self) -> &DebugFlag {
        &self.debug
    }

    pub fn suspend_registry(&self) -> &SuspendRegistry {
        &self.suspend
    }

    pub fn queue(&self) -> &dyn CompileQueue {
        self.queue.as_ref()
    }

    /// `getCodeAddr`: the hot lookup path.
    pub fn get_code_addr(&self, pc: Pc) -> Option<*const ()> {
        let table = self.jit_table.as_ref()?;
        let addr = table.lookup(pc, &self.suspend);
        if addr.is_some() {
            self.lookup_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.lookup_misses.fetch_add(1, Ordering::Relaxed);
        }
        addr
    }

    /// `setCodeAddr`: the compiler installs a translation. Precondition: a
    /// slot for `pc` was previously allocated via `check_request`.
    pub fn set_code_addr(&self, pc: Pc, native: *const ()) -> Result<(), TraceJitError> {
        let table = self.jit_table.as_ref().ok_or_else(|| {
            TraceJitError::InvalidState("JIT table not allocated (interpret-only mode)".into())
        })?;
        table.install_code(pc, native)
    }

    /// `checkRequest`: the request gate. `thread_suspended` is the calling
    /// thread's own pending-suspension flag, distinct from the global
    /// suspend registry `lookup` consults.
    pub fn check_request(&self, state: &mut ThreadInterpState, thread_suspended: bool) -> bool {
        let (Some(jit_table), Some(profile)) = (self.jit_table.as_ref(), self.live_profile())
        else {
            return false;
        };
        let gate = RequestGate {
            profile,
            jit_table,
            queue: self.queue.as_ref(),
            debug: &self.debug,
            kill_switch: self,
            compiler_high_water: self.config.compiler_high_water,
            exits: &self.exits,
        };
        gate.check(state, thread_suspended)
    }

    /// `check`: the trace-assembler step. `thread_suspended` is the calling
    /// thread's own pending-suspension flag — the same parameter
    /// `check_request` takes, not the global suspend registry `lookup`
    /// consults.
    pub fn check_trace_step(&self, state: &mut ThreadInterpState, thread_suspended: bool) -> bool {
        let asm = TraceAssembler {
            queue: self.queue.as_ref(),
            debug_active: self.debug.is_active(),
            thread_suspended,
            blocking_mode: self.config.blocking_mode,
            kill_switch: self,
            exits: &self.exits,
        };
        asm.step(state)
    }

    /// `shutdown()`: stop the compiler worker (external), dump stats, and
    /// tear down the tables. The runtime must not be reused afterward.
    pub fn shutdown(&self) -> RuntimeStats {
        self.fire();
        self.stats()
    }

    /// `stats()`.
    pub fn stats(&self) -> RuntimeStats {
        let (occupied_slots, total_slots, chained_slots) = match self.jit_table.as_ref() {
            Some(table) => {
                let (occupied, chained) = table.occupancy();
                (occupied, table.capacity(), chained)
            }
            None => (0, 0, 0),
        };
        RuntimeStats {
            occupied_slots,
            total_slots,
            chained_slots,
            queue_len: self.queue.len(),
            threshold: self.config.threshold,
            blocking_mode: self.config.blocking_mode,
            lookup_hits: self.lookup_hits.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            exits: self.exits.snapshot(),
        }
    }

    /// True once `stopTranslationRequests()`/`shutdown()` has fired.
    pub fn is_killed(&self) -> bool {
        self.profile_live.load(Ordering::Acquire).is_null()
    }
}

impl KillSwitch for TraceJitRuntime {
    /// `stopTranslationRequests()`: atomically null the live profile
    /// pointer. One-shot — firing twice is a no-op, and `profile_copy`'s
    /// allocation is never freed early, so any reader that already loaded
    /// the old pointer keeps working.
    fn fire(&self) {
        self.profile_live.store(ptr::null_mut(), Ordering::Release);
    }
}
