//! One-shot kill-switch contract shared by the trace assembler and request
//! gate, implemented by [`crate::runtime::TraceJitRuntime`].

/// Permanently disables translation requests for the remainder of the
/// process. Implementations must be idempotent: firing twice is a no-op.
pub trait KillSwitch {
    fn fire(&self);
}
