//! Bytecode program counter.

/// A stable address within a method's instruction stream.
///
/// `Pc(0)` is reserved to mean "no pc" inside [`crate::jit_table::JitTable`]'s
/// empty-slot sentinel; every real pc (always derived from a heap-allocated
/// method's non-null base address) is nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pc(pub usize);

impl Pc {
    pub fn from_method_offset(method: &crate::bytecode::Method, offset: usize) -> Self {
        Pc(method.insns_base() + offset)
    }
}
