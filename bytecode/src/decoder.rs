use core::fmt;

use crate::instruction::Instruction;
use crate::op::Op;

/// Why a byte sequence failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The byte at `offset` is not an opcode.
    UnknownOpcode { offset: usize, byte: u8 },
    /// The instruction starting at `offset` runs past the end of the input.
    Truncated { offset: usize, op: Op },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { offset, byte } => {
                write!(f, "unknown opcode 0x{byte:02x} at offset {offset}")
            }
            Self::Truncated { offset, op } => {
                write!(f, "truncated {op} at offset {offset}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes a bytecode byte slice into [`Instruction`]s.
///
/// Decoding is checked: malformed input yields a [`DecodeError`] and the
/// decoder stops (the iterator is fused after the first error).
pub struct BytecodeDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> BytecodeDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Current byte offset in the stream.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Whether the decoder has reached the end of the bytecode.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Decode the next instruction, or `None` at end-of-stream.
    pub fn decode_next(&mut self) -> Option<Result<Instruction, DecodeError>> {
        if self.is_at_end() || self.failed {
            return None;
        }
        let result = self.decode();
        self.failed = result.is_err();
        Some(result)
    }

    /// Decode everything, stopping at the first error.
    pub fn decode_all(bytes: &'a [u8]) -> Result<Vec<Instruction>, DecodeError> {
        BytecodeDecoder::new(bytes).collect()
    }

    /// Like [`decode_all`](Self::decode_all) but keeps each instruction's
    /// starting offset.
    pub fn decode_with_offsets(
        bytes: &'a [u8],
    ) -> Result<Vec<(usize, Instruction)>, DecodeError> {
        let mut decoder = BytecodeDecoder::new(bytes);
        let mut out = Vec::new();
        loop {
            let offset = decoder.offset();
            match decoder.decode_next() {
                Some(instr) => out.push((offset, instr?)),
                None => return Ok(out),
            }
        }
    }

    fn decode(&mut self) -> Result<Instruction, DecodeError> {
        let start = self.pos;
        let byte = self.bytes[start];
        let op = Op::try_from(byte)
            .map_err(|byte| DecodeError::UnknownOpcode { offset: start, byte })?;
        if start + op.size() > self.bytes.len() {
            return Err(DecodeError::Truncated { offset: start, op });
        }
        self.pos += 1;

        let instr = match op {
            Op::Nil => Instruction::Nil,
            Op::SelfRef => Instruction::SelfRef,
            Op::True => Instruction::True,
            Op::False => Instruction::False,
            Op::PushInt => Instruction::PushInt {
                value: self.read_u32() as i32,
            },
            Op::PushFloat => Instruction::PushFloat {
                value: f32::from_bits(self.read_u32()),
            },
            Op::PushField => Instruction::PushField { idx: self.read_u16() },
            Op::StoreField => Instruction::StoreField { idx: self.read_u16() },
            Op::PushLocal => {
                let depth = self.read_u16();
                let idx = self.read_u16();
                Instruction::PushLocal { depth, idx }
            }
            Op::StoreLocal => {
                let depth = self.read_u16();
                let idx = self.read_u16();
                Instruction::StoreLocal { depth, idx }
            }
            Op::PushLiteral => Instruction::PushLiteral {
                literal: self.read_u16(),
            },
            Op::PushGlobal => Instruction::PushGlobal {
                literal: self.read_u16(),
            },
            Op::Pop => Instruction::Pop,
            Op::Send => {
                let argc = self.read_u16();
                let selector = self.read_u16();
                Instruction::Send { argc, selector }
            }
            Op::SendSuper => {
                let argc = self.read_u16();
                let selector = self.read_u16();
                Instruction::SendSuper { argc, selector }
            }
            Op::Block => Instruction::Block {
                block_idx: self.read_u16(),
            },
            Op::BlockReturn => Instruction::BlockReturn,
            Op::Return => Instruction::Return,
            Op::Dbg => {
                let file = self.read_u16();
                let location = self.read_u32();
                Instruction::Dbg { file, location }
            }
        };
        Ok(instr)
    }

    // Bounds were checked against `Op::size` before any read.

    fn read_u16(&mut self) -> u16 {
        let v = u16::from_be_bytes([self.bytes[self.pos], self.bytes[self.pos + 1]]);
        self.pos += 2;
        v
    }

    fn read_u32(&mut self) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        u32::from_be_bytes(raw)
    }
}

impl Iterator for BytecodeDecoder<'_> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next()
    }
}
