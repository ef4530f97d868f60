mod op;
mod instruction;
mod code;
mod decoder;

use std::fmt::Write as _;

pub use op::Op;
pub use instruction::{Instruction, WithLiterals};
pub use code::Code;
pub use decoder::{BytecodeDecoder, DecodeError};

/// Render `bytes` as one instruction per line, each prefixed with its byte
/// offset. Literal operands are shown by value when `literals` covers them.
pub fn disassemble(
    bytes: &[u8],
    literals: &[String],
) -> Result<String, DecodeError> {
    let mut out = String::new();
    for (offset, instr) in BytecodeDecoder::decode_with_offsets(bytes)? {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{offset:04}:  {}", instr.display_with(literals));
    }
    Ok(out)
}
