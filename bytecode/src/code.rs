use crate::op::Op;

/// An ordered fragment of bytecode.
///
/// Fragments are built bottom-up: every syntax node yields one and parents
/// concatenate their children with [`join`](Code::join). [`Code::none`] is
/// the identity of that concatenation, so a node that emits nothing still
/// produces a value that can be folded.
///
/// The associated constructors are the assembler primitives. Each maps one
/// operation to its exact encoding; operands are big-endian.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Code {
    buf: Vec<u8>,
}

impl Code {
    /// The empty fragment.
    pub const fn none() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append `other` after `self`.
    pub fn join(mut self, other: Code) -> Code {
        if self.buf.is_empty() {
            return other;
        }
        self.buf.extend_from_slice(&other.buf);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // ── emit helpers ───────────────────────────────────────────────

    fn op(op: Op) -> Self {
        let mut buf = Vec::with_capacity(op.size());
        buf.push(op as u8);
        Self { buf }
    }

    fn u16(mut self, v: u16) -> Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u32(mut self, v: u32) -> Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    // ── primitives ────────────────────────────────────────────────

    /// `nil`
    pub fn push_nil() -> Self {
        Self::op(Op::Nil)
    }

    /// `self`
    pub fn push_self() -> Self {
        Self::op(Op::SelfRef)
    }

    /// `true`
    pub fn push_true() -> Self {
        Self::op(Op::True)
    }

    /// `false`
    pub fn push_false() -> Self {
        Self::op(Op::False)
    }

    /// `push_int <value:i32>`
    pub fn push_int(value: i32) -> Self {
        Self::op(Op::PushInt).u32(value as u32)
    }

    /// `push_float <value:f32>`, as IEEE-754 bits.
    pub fn push_float(value: f32) -> Self {
        Self::op(Op::PushFloat).u32(value.to_bits())
    }

    /// `push_field <idx:u16>`
    pub fn push_field(idx: u16) -> Self {
        Self::op(Op::PushField).u16(idx)
    }

    /// `store_field <idx:u16>`
    pub fn store_field(idx: u16) -> Self {
        Self::op(Op::StoreField).u16(idx)
    }

    /// `push_local <depth:u16> <idx:u16>`
    pub fn push_local(depth: u16, idx: u16) -> Self {
        Self::op(Op::PushLocal).u16(depth).u16(idx)
    }

    /// `store_local <depth:u16> <idx:u16>`
    pub fn store_local(depth: u16, idx: u16) -> Self {
        Self::op(Op::StoreLocal).u16(depth).u16(idx)
    }

    /// `push_literal <literal:u16>`
    pub fn push_literal(literal: u16) -> Self {
        Self::op(Op::PushLiteral).u16(literal)
    }

    /// `push_global <literal:u16>`; the literal holds the global's name.
    pub fn push_global(literal: u16) -> Self {
        Self::op(Op::PushGlobal).u16(literal)
    }

    /// `pop`
    pub fn pop() -> Self {
        Self::op(Op::Pop)
    }

    /// `send <argc:u16> <selector:u16>`
    pub fn send(argc: u16, selector: u16) -> Self {
        Self::op(Op::Send).u16(argc).u16(selector)
    }

    /// `send_super <argc:u16> <selector:u16>`
    pub fn send_super(argc: u16, selector: u16) -> Self {
        Self::op(Op::SendSuper).u16(argc).u16(selector)
    }

    /// `block <block_idx:u16>`
    pub fn block(block_idx: u16) -> Self {
        Self::op(Op::Block).u16(block_idx)
    }

    /// `block_return`
    pub fn block_return() -> Self {
        Self::op(Op::BlockReturn)
    }

    /// `return`
    pub fn method_return() -> Self {
        Self::op(Op::Return)
    }

    /// `dbg <file:u16> <location:u32>`
    pub fn dbg(file: u16, line: u32, column: u32) -> Self {
        Self::op(Op::Dbg).u16(file).u32((line << 8) | (column & 0xFF))
    }
}

impl FromIterator<Code> for Code {
    fn from_iter<I: IntoIterator<Item = Code>>(iter: I) -> Self {
        iter.into_iter().fold(Code::none(), Code::join)
    }
}

impl From<Code> for Vec<u8> {
    fn from(code: Code) -> Self {
        code.buf
    }
}

impl AsRef<[u8]> for Code {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}
