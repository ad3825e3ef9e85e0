//! Opaque method handle and single-instruction decode.
//!
//! The interpreter owns real method objects; the core only needs enough of
//! one to compute `pc - method.insns` and to bounds-check a PC against it.

use super::opcode::{Flags, Opcode};

/// Error decoding a single instruction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid opcode byte {byte:#x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },
    #[error("offset {0} is outside the method's instruction stream")]
    OutOfBounds(usize),
}

/// A decoded instruction: just enough for the trace assembler to act on.
#[derive(Debug, Clone, Copy)]
pub struct DecodedInstr {
    pub opcode: Opcode,
    pub flags: Flags,
    pub width: u32,
}

/// An opaque handle to a method's instruction stream.
///
/// `insns` is the base address used for `pc - insns` offset arithmetic,
/// matching `interpState->method->insns` in the source material. The
/// bytes are owned so tests can construct methods without a real VM.
pub struct Method {
    code: Box<[u8]>,
}

impl Method {
    /// Build a method handle around raw instruction bytes.
    pub fn from_code(code: Vec<u8>) -> Self {
        Method {
            code: code.into_boxed_slice(),
        }
    }

    /// Base address of the instruction stream, for `pc - insns` arithmetic.
    pub fn insns_base(&self) -> usize {
        self.code.as_ptr() as usize
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// True if the byte offset falls within this method's instruction stream.
    pub fn contains(&self, offset: usize) -> bool {
        offset < self.code.len()
    }

    /// Decode the instruction at a byte offset.
    pub fn decode_at(&self, offset: usize) -> Result<DecodedInstr, DecodeError> {
        let byte = *self
            .code
            .get(offset)
            .ok_or(DecodeError::OutOfBounds(offset))?;
        let opcode = Opcode::from_u8(byte).ok_or(DecodeError::InvalidOpcode { byte, offset })?;
        Ok(DecodedInstr {
            opcode,
            flags: opcode.flags(),
            width: opcode.width(),
        })
    }
}
