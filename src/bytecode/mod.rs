//! Bytecode surface consumed as an opaque lookup by the rest of the crate.
//!
//! Instruction width, flags, and decoding are an external collaborator's
//! concern in the runtime this crate is part of; what's here is the minimal
//! stand-in needed to drive and test the trace assembler and request gate.

mod decode;
mod opcode;

pub use decode::{DecodeError, DecodedInstr, Method};
pub use opcode::{Flags, Opcode};
