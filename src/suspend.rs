//! Suspend-count registry and debugger/profiler-attached flag.
//!
//! Trimmed stand-ins for cooperative thread-suspension coordination and
//! debug-session state: the JIT core only needs the two predicates
//! "is anyone suspended right now" and "is a debugger or profiler attached",
//! not the full stop-the-world barrier machinery that would normally carry
//! them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Tracks how many threads currently have a nonzero suspend count.
///
/// The full safepoint coordinator this is trimmed from also drives a
/// stop-the-world barrier; that's out of scope here. Only the count itself
/// is exposed, which is all `JitTable::lookup` needs.
pub struct SuspendRegistry {
    suspended: AtomicUsize,
}

impl SuspendRegistry {
    pub fn new() -> Self {
        SuspendRegistry {
            suspended: AtomicUsize::new(0),
        }
    }

    pub fn any_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire) > 0
    }

    /// Mark one more thread suspended.
    pub fn enter(&self) {
        self.suspended.fetch_add(1, Ordering::AcqRel);
    }

    /// Mark one fewer thread suspended.
    pub fn exit(&self) {
        self.suspended.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Default for SuspendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fast check — false costs nothing on the interpreter hot path.
#[derive(Default)]
pub struct DebugFlag {
    active: AtomicBool,
}

impl DebugFlag {
    pub fn new() -> Self {
        DebugFlag {
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspend_registry_counts_enter_exit() {
        let reg = SuspendRegistry::new();
        assert!(!reg.any_suspended());
        reg.enter();
        assert!(reg.any_suspended());
        reg.enter();
        reg.exit();
        assert!(reg.any_suspended());
        reg.exit();
        assert!(!reg.any_suspended());
    }

    #[test]
    fn debug_flag_defaults_inactive() {
        let flag = DebugFlag::new();
        assert!(!flag.is_active());
        flag.set(true);
        assert!(flag.is_active());
    }
}
