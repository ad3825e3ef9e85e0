//! Error kinds for the trace-selection and translation-lookup core.
//!
//! Covers startup and config failures; none of these are retried
//! automatically. A full JIT table is not represented here — it is not a
//! `Result`-returning failure but a state transition (`TSelectAbort` plus
//! the kill-switch), handled entirely by [`crate::jit_table::ClaimResult`]
//! and [`crate::request_gate::RequestGate`].

/// Errors the runtime can report.
#[derive(Debug, thiserror::Error)]
pub enum TraceJitError {
    #[error("JIT startup failed: {0}")]
    Startup(String),

    #[error("allocation failed: {0}")]
    AllocationFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid runtime state: {0}")]
    InvalidState(String),
}
