//! Compiler work-queue contract.
//!
//! The compiler back-end that drains this queue is an external
//! collaborator (out of scope); this crate only specifies the contract it
//! is handed work through, plus a default channel-backed implementation
//! good enough for a test double to drain.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::bytecode::Method;
use crate::error::TraceJitError;
use crate::pc::Pc;

/// A hint a trace-selection heuristic may attach to a run; opaque to this
/// crate beyond "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunHint {
    None,
}

/// A contiguous, straight-line fragment within one trace.
#[derive(Debug, Clone, Copy)]
pub struct Run {
    pub start_offset: usize,
    pub num_insts: u32,
    pub run_end: bool,
    pub hint: RunHint,
}

impl Run {
    pub fn starting_at(start_offset: usize) -> Self {
        Run {
            start_offset,
            num_insts: 0,
            run_end: false,
            hint: RunHint::None,
        }
    }
}

/// What kind of work order this is. The source material names only one:
/// trace compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOrderKind {
    Trace,
}

/// `(method, run[0..k])`: heap-allocated on trace completion, ownership
/// transfers to the compiler queue.
#[derive(Debug)]
pub struct TraceDescriptor {
    pub trace_head: Pc,
    pub method: Arc<Method>,
    pub runs: Vec<Run>,
}

/// The compiler work-queue contract the request gate and trace assembler
/// enqueue onto.
pub trait CompileQueue: Send + Sync {
    fn enqueue(
        &self,
        pc: Pc,
        kind: WorkOrderKind,
        descriptor: TraceDescriptor,
    ) -> Result<(), TraceJitError>;

    /// Current queue depth, consulted by the request gate's abort gate.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until the queue is empty. Only called in blocking mode.
    fn drain(&self);
}

/// Default `CompileQueue` backed by an unbounded `crossbeam-channel`.
pub struct ChannelQueue {
    sender: Sender<(Pc, WorkOrderKind, TraceDescriptor)>,
    receiver: Receiver<(Pc, WorkOrderKind, TraceDescriptor)>,
}

impl ChannelQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        ChannelQueue { sender, receiver }
    }

    /// Pull the next queued work order, for a compiler thread or test
    /// double. Non-blocking.
    pub fn try_recv(&self) -> Option<(Pc, WorkOrderKind, TraceDescriptor)> {
        match self.receiver.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for ChannelQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CompileQueue for ChannelQueue {
    fn enqueue(
        &self,
        pc: Pc,
        kind: WorkOrderKind,
        descriptor: TraceDescriptor,
    ) -> Result<(), TraceJitError> {
        self.sender
            .send((pc, kind, descriptor))
            .map_err(|_| TraceJitError::InvalidState("compile queue disconnected".into()))
    }

    fn len(&self) -> usize {
        self.sender.len()
    }

    fn drain(&self) {
        while !self.is_empty() {
            std::thread::yield_now();
        }
    }
}
