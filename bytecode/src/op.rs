/// Bytecode opcodes.
///
/// Every opcode is one byte. Operands follow the opcode with a fixed width
/// and are encoded big-endian. Literal pool operands (`PushLiteral`,
/// `PushGlobal`, the selector of `Send`/`SendSuper`, the file of `Dbg`) are
/// always 16-bit.
///
/// Opcode `0x00` is never emitted so that a zeroed buffer does not decode as
/// valid code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Push `nil`.
    Nil = 1,

    /// Push the receiver.
    SelfRef = 2,

    /// Push `true`.
    True = 3,

    /// Push `false`.
    False = 4,

    /// Push a 32-bit integer immediate.
    /// Operands: `value:i32`
    PushInt = 6,

    /// Push a 32-bit float immediate.
    /// Operands: `value:f32`
    PushFloat = 7,

    /// Push a receiver field.
    /// Operands: `idx:u16`
    PushField = 8,

    /// Push an argument or local of the scope `depth` levels out.
    /// Operands: `depth:u16`, `idx:u16`
    PushLocal = 9,

    /// Push a string or symbol from the class literal pool.
    /// Operands: `literal:u16`
    PushLiteral = 10,

    /// Push a global looked up by the name at a literal pool index.
    /// Operands: `literal:u16`
    PushGlobal = 11,

    /// Store the top of stack into a receiver field (value stays pushed).
    /// Operands: `idx:u16`
    StoreField = 13,

    /// Store the top of stack into a local (value stays pushed).
    /// Operands: `depth:u16`, `idx:u16`
    StoreLocal = 14,

    /// Discard the top of stack.
    Pop = 15,

    /// Send a message. Receiver and arguments are on the stack.
    /// Operands: `argc:u16`, `selector:u16`
    Send = 16,

    /// Send a message starting lookup in the superclass of the class that
    /// defines the executing method.
    /// Operands: `argc:u16`, `selector:u16`
    SendSuper = 17,

    /// Push a closure for a nested block of the enclosing method.
    /// Operands: `block_idx:u16`
    Block = 18,

    /// Return the top of stack from the current block to its invoker.
    BlockReturn = 19,

    /// Return the top of stack from the home method.
    Return = 20,

    /// Source position marker.
    /// Operands: `file:u16`, `location:u32` (`line << 8 | column`)
    Dbg = 21,
}

impl Op {
    /// Total encoded size (opcode plus operands) of an instruction.
    pub const fn size(self) -> usize {
        1 + match self {
            Op::Nil
            | Op::SelfRef
            | Op::True
            | Op::False
            | Op::Pop
            | Op::BlockReturn
            | Op::Return => 0,
            Op::PushField
            | Op::StoreField
            | Op::PushLiteral
            | Op::PushGlobal
            | Op::Block => 2,
            Op::PushInt | Op::PushFloat => 4,
            Op::PushLocal | Op::StoreLocal | Op::Send | Op::SendSuper => 4,
            Op::Dbg => 6,
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Op::Nil => "nil",
            Op::SelfRef => "self",
            Op::True => "true",
            Op::False => "false",
            Op::PushInt => "push_int",
            Op::PushFloat => "push_float",
            Op::PushField => "push_field",
            Op::PushLocal => "push_local",
            Op::PushLiteral => "push_literal",
            Op::PushGlobal => "push_global",
            Op::StoreField => "store_field",
            Op::StoreLocal => "store_local",
            Op::Pop => "pop",
            Op::Send => "send",
            Op::SendSuper => "send_super",
            Op::Block => "block",
            Op::BlockReturn => "block_return",
            Op::Return => "return",
            Op::Dbg => "dbg",
        }
    }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Ok(match byte {
            1 => Op::Nil,
            2 => Op::SelfRef,
            3 => Op::True,
            4 => Op::False,
            6 => Op::PushInt,
            7 => Op::PushFloat,
            8 => Op::PushField,
            9 => Op::PushLocal,
            10 => Op::PushLiteral,
            11 => Op::PushGlobal,
            13 => Op::StoreField,
            14 => Op::StoreLocal,
            15 => Op::Pop,
            16 => Op::Send,
            17 => Op::SendSuper,
            18 => Op::Block,
            19 => Op::BlockReturn,
            20 => Op::Return,
            21 => Op::Dbg,
            other => return Err(other),
        })
    }
}

impl core::fmt::Display for Op {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
