//! C3 — trace assembler.
//!
//! Driven once per interpreted instruction while a thread's `jit_state` is
//! `TSelect`. Builds a single-entry, multi-exit trace as a sequence of
//! straight-line runs, finalizing into a descriptor handed to the compiler
//! queue.

use std::sync::Arc;

use crate::bytecode::Flags;
use crate::interp_state::{EntryPoint, JitState, ThreadInterpState};
use crate::kill_switch::KillSwitch;
use crate::pc::Pc;
use crate::queue::{CompileQueue, Run, TraceDescriptor, WorkOrderKind};
use crate::stats::ExitCounters;
use crate::MAX_TRACE_LEN;

/// Assembles traces for one runtime's threads. Borrows the collaborators it
/// needs for a single `step` call; cheap to construct per call from
/// [`crate::runtime::TraceJitRuntime`]'s fields.
pub struct TraceAssembler<'a> {
    pub queue: &'a dyn CompileQueue,
    pub debug_active: bool,
    /// This thread's own pending-suspension flag — not the process-wide
    /// suspend count `JitTable::lookup` consults.
    pub thread_suspended: bool,
    pub blocking_mode: bool,
    pub kill_switch: &'a dyn KillSwitch,
    pub exits: &'a ExitCounters,
}

impl<'a> TraceAssembler<'a> {
    /// Advance the state machine by one instruction. Returns true if the
    /// interpreter must switch to the safe (non-JIT) path.
    pub fn step(&self, state: &mut ThreadInterpState) -> bool {
        match state.jit_state {
            JitState::TSelect => self.advance(state),
            JitState::TSelectAbort => {
                state.jit_state = JitState::Normal;
                true
            }
            JitState::SingleStep => {
                state.jit_state = JitState::SingleStepEnd;
                true
            }
            JitState::SingleStepEnd => {
                state.jit_state = JitState::Normal;
                state.entry_point = EntryPoint::Resume;
                true
            }
            JitState::Normal | JitState::Off => false,
            JitState::SelectRequest | JitState::TSelectEnd => {
                self.exits.record_fatal();
                unreachable!("invalid jit_state reached the trace assembler: programmer error")
            }
        }
    }

    fn advance(&self, state: &mut ThreadInterpState) -> bool {
        let offset = state.pc.0 - state.method.insns_base();
        assert!(
            state.method.contains(offset),
            "pc crossed a method boundary within a single trace"
        );

        let decoded = match state.method.decode_at(offset) {
            Ok(d) => d,
            Err(_) => return self.finalize(state),
        };

        if decoded.flags.contains(Flags::NO_JIT) {
            return self.finalize(state);
        }

        let expected = Pc(state.curr_run_head.0 + state.curr_run_len as usize);
        if state.pc != expected {
            state.curr_trace_run += 1;
            state.curr_run_head = state.pc;
            state.curr_run_len = 0;
            state.trace.push(Run::starting_at(offset));
        }

        state.curr_run_len += decoded.width;
        state.total_trace_len += 1;
        if let Some(run) = state.trace.get_mut(state.curr_trace_run) {
            run.num_insts += 1;
        }

        let boundary_flags = Flags::CAN_BRANCH | Flags::CAN_SWITCH | Flags::CAN_RETURN | Flags::INVOKE;
        if decoded.flags.contains(Flags::CONDITIONAL) && decoded.flags.intersects(boundary_flags) {
            return self.finalize(state);
        }
        if decoded.flags.contains(Flags::THROW) {
            return self.finalize(state);
        }
        if state.total_trace_len >= MAX_TRACE_LEN {
            return self.finalize(state);
        }
        if self.debug_active || self.thread_suspended {
            state.jit_state = JitState::TSelectAbort;
            self.exits.record_abort();
            return true;
        }
        if decoded.flags.contains(Flags::CAN_RETURN) {
            return self.finalize(state);
        }

        false
    }

    fn finalize(&self, state: &mut ThreadInterpState) -> bool {
        if state.total_trace_len == 0 {
            state.jit_state = JitState::Normal;
            return true;
        }

        if let Some(last) = state.trace.last_mut() {
            last.run_end = true;
        }

        let descriptor = TraceDescriptor {
            trace_head: state.curr_trace_head,
            method: Arc::clone(&state.method),
            runs: state.trace.clone(),
        };

        match self
            .queue
            .enqueue(state.curr_trace_head, WorkOrderKind::Trace, descriptor)
        {
            Ok(()) => {
                if self.blocking_mode {
                    self.queue.drain();
                }
                state.jit_state = JitState::Normal;
                state.entry_point = EntryPoint::Resume;
                self.exits.record_end();
                true
            }
            Err(_) => {
                self.kill_switch.fire();
                state.jit_state = JitState::TSelectAbort;
                self.exits.record_abort();
                true
            }
        }
    }
}
