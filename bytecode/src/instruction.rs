use core::fmt;

use crate::op::Op;

/// A decoded instruction with its operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Nil,
    SelfRef,
    True,
    False,
    PushInt {
        value: i32,
    },
    PushFloat {
        value: f32,
    },
    PushField {
        idx: u16,
    },
    PushLocal {
        depth: u16,
        idx: u16,
    },
    PushLiteral {
        literal: u16,
    },
    PushGlobal {
        literal: u16,
    },
    StoreField {
        idx: u16,
    },
    StoreLocal {
        depth: u16,
        idx: u16,
    },
    Pop,
    Send {
        argc: u16,
        selector: u16,
    },
    SendSuper {
        argc: u16,
        selector: u16,
    },
    Block {
        block_idx: u16,
    },
    BlockReturn,
    Return,
    Dbg {
        file: u16,
        location: u32,
    },
}

impl Instruction {
    pub const fn op(&self) -> Op {
        match self {
            Self::Nil => Op::Nil,
            Self::SelfRef => Op::SelfRef,
            Self::True => Op::True,
            Self::False => Op::False,
            Self::PushInt { .. } => Op::PushInt,
            Self::PushFloat { .. } => Op::PushFloat,
            Self::PushField { .. } => Op::PushField,
            Self::PushLocal { .. } => Op::PushLocal,
            Self::PushLiteral { .. } => Op::PushLiteral,
            Self::PushGlobal { .. } => Op::PushGlobal,
            Self::StoreField { .. } => Op::StoreField,
            Self::StoreLocal { .. } => Op::StoreLocal,
            Self::Pop => Op::Pop,
            Self::Send { .. } => Op::Send,
            Self::SendSuper { .. } => Op::SendSuper,
            Self::Block { .. } => Op::Block,
            Self::BlockReturn => Op::BlockReturn,
            Self::Return => Op::Return,
            Self::Dbg { .. } => Op::Dbg,
        }
    }

    /// The literal pool index this instruction refers to, if any.
    pub const fn literal_operand(&self) -> Option<u16> {
        match *self {
            Self::PushLiteral { literal } | Self::PushGlobal { literal } => {
                Some(literal)
            }
            Self::Send { selector, .. } | Self::SendSuper { selector, .. } => {
                Some(selector)
            }
            Self::Dbg { file, .. } => Some(file),
            _ => None,
        }
    }

    /// Render with literal operands replaced by their pool entries.
    pub fn display_with<'a>(
        &'a self,
        literals: &'a [String],
    ) -> WithLiterals<'a> {
        WithLiterals {
            instr: self,
            literals,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.op();
        match self {
            Self::Nil
            | Self::SelfRef
            | Self::True
            | Self::False
            | Self::Pop
            | Self::BlockReturn
            | Self::Return => write!(f, "{op}"),
            Self::PushInt { value } => write!(f, "{op} {value}"),
            Self::PushFloat { value } => write!(f, "{op} {value:?}"),
            Self::PushField { idx } | Self::StoreField { idx } => {
                write!(f, "{op} {idx}")
            }
            Self::PushLocal { depth, idx } | Self::StoreLocal { depth, idx } => {
                write!(f, "{op} {depth}:{idx}")
            }
            Self::PushLiteral { literal } | Self::PushGlobal { literal } => {
                write!(f, "{op} #{literal}")
            }
            Self::Send { argc, selector } | Self::SendSuper { argc, selector } => {
                write!(f, "{op} {argc}, #{selector}")
            }
            Self::Block { block_idx } => write!(f, "{op} {block_idx}"),
            Self::Dbg { file, location } => {
                write!(f, "{op} #{file}, {}:{}", location >> 8, location & 0xFF)
            }
        }
    }
}

/// See [`Instruction::display_with`].
pub struct WithLiterals<'a> {
    instr: &'a Instruction,
    literals: &'a [String],
}

impl fmt::Display for WithLiterals<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(idx) = self.instr.literal_operand() else {
            return write!(f, "{}", self.instr);
        };
        let Some(text) = self.literals.get(idx as usize) else {
            return write!(f, "{}", self.instr);
        };
        let op = self.instr.op();
        match self.instr {
            Instruction::Send { argc, .. } | Instruction::SendSuper { argc, .. } => {
                write!(f, "{op} {argc}, #{text}")
            }
            Instruction::Dbg { location, .. } => {
                write!(f, "{op} '{text}', {}:{}", location >> 8, location & 0xFF)
            }
            Instruction::PushGlobal { .. } => write!(f, "{op} {text}"),
            _ => write!(f, "{op} '{text}'"),
        }
    }
}
