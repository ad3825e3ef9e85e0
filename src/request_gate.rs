//! C4 — request gate.
//!
//! Runs before the interpreter decides whether to continue interpreting or
//! re-enter translated code. Cancels in-flight selection when the compiler
//! is backlogged or a debugger/profiler is attached, resets stale profile
//! counters, and otherwise drives JIT-table slot acquisition and state
//! promotion into `TSelect`.

use crate::interp_state::{JitState, ThreadInterpState};
use crate::jit_table::{ClaimResult, JitTable};
use crate::kill_switch::KillSwitch;
use crate::profile::ProfileTable;
use crate::queue::{CompileQueue, Run};
use crate::stats::ExitCounters;
use crate::suspend::DebugFlag;
use crate::PROFILE_STALENESS_THRESHOLD_MICROS;

/// Borrows the collaborators one `check` call needs; cheap to construct
/// from [`crate::runtime::TraceJitRuntime`]'s fields.
pub struct RequestGate<'a> {
    pub profile: &'a ProfileTable,
    pub jit_table: &'a JitTable,
    pub queue: &'a dyn CompileQueue,
    pub debug: &'a DebugFlag,
    pub kill_switch: &'a dyn KillSwitch,
    pub compiler_high_water: usize,
    pub exits: &'a ExitCounters,
}

impl<'a> RequestGate<'a> {
    /// Returns true iff the caller must bail to the safe (non-JIT)
    /// interpreter path.
    pub fn check(&self, state: &mut ThreadInterpState, thread_suspended: bool) -> bool {
        let abort_gate = self.queue.len() >= self.compiler_high_water
            || self.debug.is_active()
            || thread_suspended;

        if abort_gate {
            if state.jit_state != JitState::Off {
                state.jit_state = JitState::Normal;
            }
            return false;
        }

        if self.profile.micros_since_reset() > PROFILE_STALENESS_THRESHOLD_MICROS {
            // Discard the pending request outright rather than promoting it:
            // the counters it was decided against are gone, so the interpreter
            // re-evaluates from scratch once they're hot again.
            self.profile.reset();
            return true;
        }

        if state.jit_state == JitState::SelectRequest {
            self.acquire_slot(state);
        }

        match state.jit_state {
            JitState::SelectRequest => {
                state.jit_state = JitState::TSelect;
                state.curr_trace_head = state.pc;
                state.curr_trace_run = 0;
                state.total_trace_len = 0;
                state.curr_run_head = state.pc;
                state.curr_run_len = 0;
                state.trace.clear();
                state
                    .trace
                    .push(Run::starting_at(state.pc.0 - state.method.insns_base()));
                true
            }
            JitState::TSelect | JitState::TSelectAbort => true,
            JitState::SingleStep | JitState::SingleStepEnd | JitState::Off | JitState::Normal => {
                false
            }
            JitState::TSelectEnd => {
                self.exits.record_fatal();
                unreachable!("fatal: TSelectEnd reached the request gate: programmer error")
            }
        }
    }

    fn acquire_slot(&self, state: &mut ThreadInterpState) {
        if self.jit_table.find_entry(state.pc).is_some() {
            state.jit_state = JitState::TSelectAbort;
            self.exits.record_abort();
            return;
        }

        match self.jit_table.try_claim_slot(state.pc) {
            ClaimResult::Claimed => {}
            ClaimResult::AlreadyPresent => {
                state.jit_state = JitState::TSelectAbort;
                self.exits.record_abort();
            }
            ClaimResult::TableFull => {
                state.jit_state = JitState::TSelectAbort;
                self.exits.record_abort();
                #[cfg(debug_assertions)]
                eprintln!("tracejit: JIT table full, disabling profiling");
                self.kill_switch.fire();
            }
        }
    }
}
