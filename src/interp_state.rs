//! Per-thread interpreter state the core reads and writes.
//!
//! Owned by the interpreter thread; the request gate and trace assembler
//! only ever see one at a time, already borrowed by their caller.

use std::sync::Arc;

use crate::bytecode::Method;
use crate::pc::Pc;
use crate::queue::Run;

/// The per-thread JIT state machine. Modeled as a tagged enum rather than a
/// handful of booleans so an unhandled state is a compile-time-checked
/// match arm, not a silently-wrong flag combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitState {
    Off,
    Normal,
    SelectRequest,
    TSelect,
    TSelectEnd,
    TSelectAbort,
    SingleStep,
    SingleStepEnd,
}

/// How the interpreter should resume once the core returns control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Interpret,
    Resume,
}

/// Per-thread state carried across calls into the request gate and trace
/// assembler.
pub struct ThreadInterpState {
    pub jit_state: JitState,
    pub pc: Pc,
    pub method: Arc<Method>,
    pub curr_trace_head: Pc,
    pub curr_run_head: Pc,
    pub curr_run_len: u32,
    pub curr_trace_run: usize,
    pub total_trace_len: u32,
    /// In-progress trace runs; bounded by `MAX_TRACE_LEN` instructions total,
    /// not by this vector's length (a single run may hold many).
    pub trace: Vec<Run>,
    pub entry_point: EntryPoint,
}

impl ThreadInterpState {
    pub fn new(method: Arc<Method>, pc: Pc) -> Self {
        ThreadInterpState {
            jit_state: JitState::Normal,
            pc,
            method,
            curr_trace_head: pc,
            curr_run_head: pc,
            curr_run_len: 0,
            curr_trace_run: 0,
            total_trace_len: 0,
            trace: Vec::new(),
            entry_point: EntryPoint::Interpret,
        }
    }
}
