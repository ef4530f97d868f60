//! Third pass: turn the resolved tree into bytecode.
//!
//! Every node yields a [`Code`] fragment and parents join their children's
//! fragments in evaluation order. When a method or block body is done its
//! fragment is sealed into a [`CompiledBlock`] stored on the scope. Blocks
//! seal before their parent, so the parent's artifact can list them.
//!
//! The generator trusts the earlier passes. A missing annotation or a
//! global store is reported as an internal error, and a literal table that
//! outgrows its `u16` operands as a limit error. Either stops generation.

use std::sync::Arc;

use bytecode::Code;
use log::{debug, trace};

use crate::CompileOptions;
use crate::ast::{BlockDef, Body, ClassDef, Expr, ExprKind, Ident, MainDef, MethodBody, MethodDef, Program};
use crate::compiled::CompiledBlock;
use crate::error::{CompileError, ErrorKind};
use crate::span::Span;
use crate::symbols::{Binding, ClassId, ScopeId, ScopeKind, SymbolTable};

// ── Compile frame ───────────────────────────────────────────────────

/// A method or block whose body is being generated.
struct CompileFrame {
    scope: ScopeId,
    /// Sealed blocks nested directly in `scope`, in source order.
    blocks: Vec<Arc<CompiledBlock>>,
}

// ── Code generator ──────────────────────────────────────────────────

pub struct CodeGenerator<'a> {
    symtab: &'a mut SymbolTable,
    options: &'a CompileOptions,
    class: Option<ClassId>,
    frames: Vec<CompileFrame>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(symtab: &'a mut SymbolTable, options: &'a CompileOptions) -> Self {
        Self {
            symtab,
            options,
            class: None,
            frames: Vec::new(),
        }
    }

    /// Generate code for every class and the main unit. Artifacts end up in
    /// the scopes of the symbol table.
    pub fn generate(&mut self, program: &Program) -> Result<(), CompileError> {
        for class in &program.classes {
            self.gen_class(class)?;
        }
        if let Some(main) = &program.main {
            self.gen_main(main)?;
        }
        Ok(())
    }

    fn gen_class(&mut self, class: &ClassDef) -> Result<Code, CompileError> {
        let id = class
            .symbol
            .ok_or_else(|| CompileError::internal(format!("class {} has no symbol", class.name)))?;
        debug!("generate class {}", class.name);

        let outer = self.class.replace(id);
        let mut code = Code::none();
        for method in &class.methods {
            code = code.join(self.gen_method(method)?);
        }
        self.class = outer;
        Ok(code)
    }

    fn gen_method(&mut self, method: &MethodDef) -> Result<Code, CompileError> {
        let scope = method.scope.ok_or_else(|| {
            CompileError::internal(format!("method {} has no scope", method.selector))
        })?;
        match &method.body {
            MethodBody::Primitive(name) => {
                self.seal(scope, Code::none(), Some(name.clone()), Vec::new())?;
            }
            MethodBody::Code(body) => {
                self.push_frame(scope);
                let code = self
                    .gen_body(body, None)?
                    .join(Code::push_self())
                    .join(Code::method_return());
                let frame = self.pop_frame()?;
                self.seal(scope, code, None, frame.blocks)?;
            }
        }
        // methods are sealed into their scope, not inlined into the class
        Ok(Code::none())
    }

    fn gen_main(&mut self, main: &MainDef) -> Result<(), CompileError> {
        let (Some(class), Some(scope)) = (main.class, main.scope) else {
            return Err(CompileError::internal("main has no scope"));
        };
        let outer = self.class.replace(class);

        self.push_frame(scope);
        let code = self
            .gen_body(&main.body, Some(Code::push_nil()))?
            .join(Code::push_self())
            .join(Code::method_return());
        let frame = self.pop_frame()?;
        self.seal(scope, code, None, frame.blocks)?;

        self.class = outer;
        Ok(())
    }

    /// Statements joined with a `pop` between them, so the body leaves
    /// exactly one value: its last statement's. An empty body yields
    /// `fallback`.
    fn gen_body(&mut self, body: &Body, fallback: Option<Code>) -> Result<Code, CompileError> {
        if body.is_empty() {
            return Ok(fallback.unwrap_or_else(Code::none));
        }
        let last = body.statements.len() - 1;
        let mut code = Code::none();
        for (i, stat) in body.statements.iter().enumerate() {
            code = code.join(self.gen_dbg(stat.span)?).join(self.gen_expr(stat)?);
            if i < last {
                code = code.join(Code::pop());
            }
        }
        Ok(code)
    }

    fn gen_dbg(&mut self, span: Span) -> Result<Code, CompileError> {
        let options = self.options;
        if !options.gen_dbg {
            return Ok(Code::none());
        }
        let file = self.intern(&options.file_name)?;
        Ok(Code::dbg(file, span.start.line, span.start.column))
    }

    fn gen_expr(&mut self, expr: &Expr) -> Result<Code, CompileError> {
        let code = match &expr.kind {
            ExprKind::Integer(value) => Code::push_int(*value),
            ExprKind::Float(value) => Code::push_float(*value),
            ExprKind::String(s) | ExprKind::Symbol(s) => Code::push_literal(self.intern(s)?),
            ExprKind::Nil => Code::push_nil(),
            ExprKind::SelfRef | ExprKind::Super => Code::push_self(),
            ExprKind::True => Code::push_true(),
            ExprKind::False => Code::push_false(),

            ExprKind::Ident(ident) => self.gen_load(ident)?,
            ExprKind::Assign { target, value } => {
                self.gen_expr(value)?.join(self.gen_store(target)?)
            }

            ExprKind::Unary { receiver, selector } => {
                let (code, is_super) = self.gen_receiver(receiver)?;
                code.join(self.gen_send(is_super, 0, selector)?)
            }
            ExprKind::Binary { first, rest } => {
                let (mut code, mut is_super) = self.gen_receiver(first)?;
                for op in rest {
                    code = code
                        .join(self.gen_expr(&op.operand)?)
                        .join(self.gen_send(is_super, 1, &op.operator)?);
                    // only the first send goes to super; later ones go to its result
                    is_super = false;
                }
                code
            }
            ExprKind::Keyword { receiver, parts } => {
                let (mut code, is_super) = self.gen_receiver(receiver)?;
                for part in parts {
                    code = code.join(self.gen_expr(&part.argument)?);
                }
                let selector: String = parts.iter().map(|p| p.keyword.as_str()).collect();
                let argc = u16::try_from(parts.len()).map_err(|_| {
                    CompileError::new(ErrorKind::LimitExceeded, format!("too many arguments to {selector}"), expr.span)
                })?;
                code.join(self.gen_send(is_super, argc, &selector)?)
            }

            ExprKind::Block(block) => self.gen_block(block)?,
            ExprKind::Return(value) => self.gen_expr(value)?.join(Code::method_return()),
        };
        Ok(code)
    }

    /// Code for a message receiver, and whether the send must start lookup
    /// in the superclass.
    fn gen_receiver(&mut self, receiver: &Expr) -> Result<(Code, bool), CompileError> {
        match receiver.kind {
            ExprKind::Super => Ok((Code::push_self(), true)),
            _ => Ok((self.gen_expr(receiver)?, false)),
        }
    }

    fn gen_send(&mut self, is_super: bool, argc: u16, selector: &str) -> Result<Code, CompileError> {
        let literal = self.intern(selector)?;
        trace!("send{} {selector}/{argc}", if is_super { " super" } else { "" });
        Ok(if is_super {
            Code::send_super(argc, literal)
        } else {
            Code::send(argc, literal)
        })
    }

    fn gen_load(&mut self, ident: &Ident) -> Result<Code, CompileError> {
        match self.binding(ident)? {
            Binding::Field { index } => Ok(Code::push_field(index)),
            Binding::Argument { depth, index } | Binding::Local { depth, index } => {
                Ok(Code::push_local(depth, index))
            }
            Binding::Global => Ok(Code::push_global(self.intern(&ident.name)?)),
        }
    }

    fn gen_store(&mut self, target: &Ident) -> Result<Code, CompileError> {
        match self.binding(target)? {
            Binding::Field { index } => Ok(Code::store_field(index)),
            Binding::Argument { depth, index } | Binding::Local { depth, index } => {
                Ok(Code::store_local(depth, index))
            }
            Binding::Global => Err(CompileError::internal(format!(
                "store to global {} in {}",
                target.name,
                self.where_()
            ))),
        }
    }

    /// Compile the block body into its own artifact and leave a `block`
    /// instruction referring to it at the literal site.
    fn gen_block(&mut self, block: &BlockDef) -> Result<Code, CompileError> {
        let scope = block
            .scope
            .ok_or_else(|| CompileError::internal(format!("block in {} has no scope", self.where_())))?;
        let index = self
            .symtab
            .scope(scope)
            .block_index()
            .ok_or_else(|| CompileError::internal("block scope without a block number"))?;

        self.push_frame(scope);
        let code = self
            .gen_body(&block.body, Some(Code::push_nil()))?
            .join(Code::block_return());
        let frame = self.pop_frame()?;
        let compiled = self.seal(scope, code, None, frame.blocks)?;

        self.frame_mut()?.blocks.push(compiled);
        Ok(Code::block(index))
    }

    // ── Frame management ────────────────────────────────────────

    fn push_frame(&mut self, scope: ScopeId) {
        trace!("enter {}", self.symtab.qualified_name(scope));
        self.frames.push(CompileFrame {
            scope,
            blocks: Vec::new(),
        });
    }

    fn pop_frame(&mut self) -> Result<CompileFrame, CompileError> {
        self.frames
            .pop()
            .ok_or_else(|| CompileError::internal("no frame to pop"))
    }

    fn frame_mut(&mut self) -> Result<&mut CompileFrame, CompileError> {
        self.frames
            .last_mut()
            .ok_or_else(|| CompileError::internal("no active frame"))
    }

    fn where_(&self) -> String {
        match self.frames.last() {
            Some(frame) => self.symtab.qualified_name(frame.scope),
            None => "<no scope>".to_string(),
        }
    }

    fn binding(&self, ident: &Ident) -> Result<Binding, CompileError> {
        ident.binding.ok_or_else(|| {
            CompileError::internal(format!(
                "unresolved identifier {} in {}",
                ident.name,
                self.where_()
            ))
        })
    }

    /// Intern `s` in the current class's literal table.
    fn intern(&mut self, s: &str) -> Result<u16, CompileError> {
        let class = self
            .class
            .ok_or_else(|| CompileError::internal(format!("literal {s} outside any class")))?;
        let class = self.symtab.class_mut(class);
        let idx = class.literals.add(s);
        u16::try_from(idx).map_err(|_| {
            CompileError::no_span(
                ErrorKind::LimitExceeded,
                format!("literal table of {} is full", class.name),
            )
        })
    }

    /// Store the finished artifact for `scope`.
    fn seal(
        &mut self,
        scope: ScopeId,
        code: Code,
        primitive: Option<String>,
        blocks: Vec<Arc<CompiledBlock>>,
    ) -> Result<Arc<CompiledBlock>, CompileError> {
        let name = self.symtab.qualified_name(scope);
        let s = self.symtab.scope(scope);
        if s.compiled.is_some() {
            return Err(CompileError::internal(format!("{name} compiled twice")));
        }
        if blocks.len() != s.blocks.len() {
            return Err(CompileError::internal(format!(
                "{name} sealed with {} of {} nested blocks",
                blocks.len(),
                s.blocks.len()
            )));
        }
        let ScopeKind::Method { selector, .. } = &self.symtab.scope(s.method).kind else {
            return Err(CompileError::internal(format!("{name} has no home method")));
        };

        let compiled = Arc::new(CompiledBlock {
            class_name: self.symtab.class(s.class).name.clone(),
            selector: selector.clone(),
            scope,
            index: s.block_index(),
            nargs: s.nargs(),
            nlocals: s.nlocals(),
            bytecode: code.into_bytes(),
            primitive,
            blocks,
            name,
        });
        debug!("sealed {} ({} bytes)", compiled.name, compiled.bytecode.len());
        self.symtab.scope_mut(scope).compiled = Some(Arc::clone(&compiled));
        Ok(compiled)
    }
}
