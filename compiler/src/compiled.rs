use std::fmt::Write as _;
use std::sync::Arc;

use bytecode::{BytecodeDecoder, DecodeError, Instruction};

use crate::symbols::ScopeId;

/// The finished code of one method or block.
///
/// Built exactly once, after every block nested in it has been built, so
/// `blocks` always holds finished artifacts. Only directly nested blocks
/// are listed here; deeper ones hang off their own parent.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBlock {
    /// `Class>>selector` or `Class>>selector-blockN`.
    pub name: String,
    pub class_name: String,
    /// Selector of the home method.
    pub selector: String,
    pub scope: ScopeId,
    /// Block number within the home method; `None` for methods.
    pub index: Option<u16>,
    pub nargs: u16,
    pub nlocals: u16,
    pub bytecode: Vec<u8>,
    /// VM primitive implementing a primitive method.
    pub primitive: Option<String>,
    pub blocks: Vec<Arc<CompiledBlock>>,
}

impl CompiledBlock {
    pub fn is_method(&self) -> bool {
        self.index.is_none()
    }

    /// Find the nested block numbered `index`, searching depth first.
    ///
    /// `block n` operands refer to this numbering, which runs across the
    /// whole home method rather than per nesting level.
    pub fn find_block(&self, index: u16) -> Option<&CompiledBlock> {
        self.blocks.iter().find_map(|b| {
            if b.index == Some(index) {
                Some(b.as_ref())
            } else {
                b.find_block(index)
            }
        })
    }

    pub fn instructions(&self) -> Result<Vec<Instruction>, DecodeError> {
        BytecodeDecoder::decode_all(&self.bytecode)
    }

    /// Listing of this block and, indented below it, its nested blocks.
    pub fn disassemble(&self, literals: &[String]) -> Result<String, DecodeError> {
        let mut out = String::new();
        self.disassemble_into(&mut out, literals, 0)?;
        Ok(out)
    }

    fn disassemble_into(
        &self,
        out: &mut String,
        literals: &[String],
        indent: usize,
    ) -> Result<(), DecodeError> {
        let pad = " ".repeat(indent);
        let _ = write!(out, "{pad}{} (args={}, locals={})", self.name, self.nargs, self.nlocals);
        if let Some(prim) = &self.primitive {
            let _ = writeln!(out, " <primitive:{prim}>");
            return Ok(());
        }
        out.push('\n');
        for line in bytecode::disassemble(&self.bytecode, literals)?.lines() {
            let _ = writeln!(out, "{pad}  {line}");
        }
        for block in &self.blocks {
            block.disassemble_into(out, literals, indent + 4)?;
        }
        Ok(())
    }
}

/// Everything the VM needs to load one class.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledClass {
    pub name: String,
    pub superclass: Option<String>,
    /// Fields declared by this class, in slot order.
    pub fields: Vec<String>,
    /// Total instance size, inherited fields included.
    pub field_count: u16,
    /// The class constant pool; index 0 is the first interned string.
    pub literals: Vec<String>,
    pub methods: Vec<Arc<CompiledBlock>>,
}

impl CompiledClass {
    pub fn method(&self, selector: &str) -> Option<&CompiledBlock> {
        self.methods
            .iter()
            .find(|m| m.selector == selector)
            .map(Arc::as_ref)
    }

    pub fn literal_index(&self, literal: &str) -> Option<u16> {
        self.literals.iter().position(|l| l == literal).map(|i| i as u16)
    }

    pub fn disassemble(&self) -> Result<String, DecodeError> {
        let mut out = String::new();
        match &self.superclass {
            Some(sup) => {
                let _ = writeln!(out, "class {} : {}", self.name, sup);
            }
            None => {
                let _ = writeln!(out, "class {}", self.name);
            }
        }
        let _ = writeln!(out, "  fields: {:?} (total {})", self.fields, self.field_count);
        let _ = writeln!(out, "  literals: {:?}", self.literals);
        for method in &self.methods {
            out.push_str(&method.disassemble(&self.literals)?);
        }
        Ok(out)
    }
}
