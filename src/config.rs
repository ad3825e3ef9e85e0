//! Runtime configuration.

/// Whether the runtime interprets only, or interprets and builds traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Interpret,
    Jit,
}

/// Configuration for a [`TraceJitRuntime`](crate::runtime::TraceJitRuntime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// JIT-table capacity `N`. Also doubles as the chain-end sentinel.
    pub max_table_entries: usize,
    /// Profile-table length `P`.
    pub profile_size: usize,
    /// Initial per-PC counter value.
    pub threshold: u8,
    /// If set, trace finalization waits for the compiler queue to drain.
    pub blocking_mode: bool,
    pub execution_mode: ExecutionMode,
    /// Queue depth at which the request gate cancels in-flight selection.
    pub compiler_high_water: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            max_table_entries: 512,
            profile_size: 4096,
            threshold: 40,
            blocking_mode: false,
            execution_mode: ExecutionMode::Jit,
            compiler_high_water: 128,
        }
    }
}
