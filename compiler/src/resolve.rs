//! Second pass: bind every identifier reference to a classified symbol.
//!
//! The symbol table is only read here. A name no enclosing scope or field
//! declares becomes [`Binding::Global`]; whether that global exists is the
//! VM's concern.

use log::trace;

use crate::ast::{Body, Expr, ExprKind, Ident, MethodBody, Program};
use crate::error::{CompileError, ErrorKind};
use crate::symbols::{Binding, ScopeId, SymbolTable};

pub fn resolve_symbols(
    symtab: &SymbolTable,
    program: &mut Program,
    errors: &mut Vec<CompileError>,
) {
    let mut res = ResolveSymbols { symtab, errors };

    for class in &mut program.classes {
        for method in &mut class.methods {
            let MethodBody::Code(body) = &mut method.body else {
                continue;
            };
            match method.scope {
                Some(scope) => res.resolve_body(scope, body),
                None => res.missing_scope(&method.selector),
            }
        }
    }
    if let Some(main) = &mut program.main {
        match main.scope {
            Some(scope) => res.resolve_body(scope, &mut main.body),
            None => res.missing_scope("main"),
        }
    }
}

struct ResolveSymbols<'a> {
    symtab: &'a SymbolTable,
    errors: &'a mut Vec<CompileError>,
}

impl ResolveSymbols<'_> {
    fn missing_scope(&mut self, what: &str) {
        self.errors.push(CompileError::internal(format!(
            "{what} has no scope; symbols were not defined"
        )));
    }

    fn resolve_body(&mut self, scope: ScopeId, body: &mut Body) {
        for stat in &mut body.statements {
            self.resolve_expr(scope, stat);
        }
    }

    fn bind(&mut self, scope: ScopeId, ident: &mut Ident) -> Binding {
        if let Some(binding) = ident.binding {
            return binding;
        }
        let binding = self.symtab.resolve(scope, &ident.name);
        trace!(
            "{}: {} -> {:?}",
            self.symtab.qualified_name(scope),
            ident.name,
            binding
        );
        ident.binding = Some(binding);
        binding
    }

    fn resolve_expr(&mut self, scope: ScopeId, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Ident(ident) => {
                self.bind(scope, ident);
            }
            ExprKind::Assign { target, value } => {
                self.resolve_expr(scope, value);
                if self.bind(scope, target) == Binding::Global {
                    self.errors.push(CompileError::new(
                        ErrorKind::InvalidAssignment,
                        format!(
                            "cannot assign to undeclared variable {} in {}",
                            target.name,
                            self.symtab.qualified_name(scope)
                        ),
                        target.span,
                    ));
                }
            }
            ExprKind::Block(block) => {
                // no scope: the definition pass ran out of block numbers and said so
                if let Some(inner) = block.scope {
                    self.resolve_body(inner, &mut block.body);
                }
            }
            ExprKind::Unary { receiver, .. } => self.resolve_expr(scope, receiver),
            ExprKind::Binary { first, rest } => {
                self.resolve_expr(scope, first);
                for op in rest {
                    self.resolve_expr(scope, &mut op.operand);
                }
            }
            ExprKind::Keyword { receiver, parts } => {
                self.resolve_expr(scope, receiver);
                for part in parts {
                    self.resolve_expr(scope, &mut part.argument);
                }
            }
            ExprKind::Return(value) => self.resolve_expr(scope, value),
            ExprKind::Integer(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Symbol(_)
            | ExprKind::Nil
            | ExprKind::SelfRef
            | ExprKind::Super
            | ExprKind::True
            | ExprKind::False => {}
        }
    }
}
