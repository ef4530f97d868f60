//! First pass: create class, method and block symbols and declare fields,
//! arguments and locals.
//!
//! Redefinitions are recorded on the error list and walking continues. A
//! duplicate class or method still gets a symbol (kept out of Globals or the
//! class's method list) so that its body is checked like any other.

use log::{debug, trace};

use crate::ast::{Body, ClassDef, Decl, Expr, ExprKind, MainDef, MethodBody, MethodDef, Program};
use crate::error::{CompileError, ErrorKind};
use crate::span::Span;
use crate::symbols::{
    ClassId, DeclareError, LayoutIssue, ROOT_CLASS, ScopeId, SymbolTable, VariableKind,
};

/// Implicit class holding top-level code.
pub const MAIN_CLASS: &str = "MainClass";
/// Selector of the implicit method holding top-level code.
pub const MAIN_METHOD: &str = "main";

pub fn define_symbols(
    symtab: &mut SymbolTable,
    program: &mut Program,
    errors: &mut Vec<CompileError>,
) {
    let mut def = DefineSymbols { symtab, errors };

    for class in &mut program.classes {
        def.define_class(class);
    }
    if let Some(main) = &mut program.main {
        def.define_main(main);
    }

    // All classes exist now; forward references can be bound.
    def.symtab.bind_superclasses();
    def.layout_fields();
}

struct DefineSymbols<'a> {
    symtab: &'a mut SymbolTable,
    errors: &'a mut Vec<CompileError>,
}

impl DefineSymbols<'_> {
    fn error(&mut self, msg: String, span: Span) {
        self.errors
            .push(CompileError::new(ErrorKind::DuplicateDefinition, msg, span));
    }

    fn limit(&mut self, msg: String, span: Span) {
        self.errors
            .push(CompileError::new(ErrorKind::LimitExceeded, msg, span));
    }

    fn define_class(&mut self, class: &mut ClassDef) {
        debug!("define class {} : {:?}", class.name, class.superclass);
        if self.symtab.lookup_class(&class.name).is_some() {
            self.error(format!("redefinition of class {}", class.name), class.span);
        }
        let id = self
            .symtab
            .add_class(&class.name, class.superclass.as_deref(), class.span);
        class.symbol = Some(id);

        for field in &class.fields {
            match self.symtab.add_field(id, &field.name, field.span) {
                Ok(()) => {}
                Err(DeclareError::Duplicate) => self.error(
                    format!("redefinition of {} in {}", field.name, class.name),
                    field.span,
                ),
                Err(DeclareError::TooMany) => {
                    self.limit(format!("too many fields in {}", class.name), field.span);
                    break;
                }
            }
        }
        for method in &mut class.methods {
            self.define_method(id, method);
        }
    }

    fn define_method(&mut self, class: ClassId, method: &mut MethodDef) {
        trace!("define method {}>>{}", self.symtab.class(class).name, method.selector);
        if self.symtab.lookup_method(class, &method.selector).is_some() {
            self.error(
                format!(
                    "redefinition of method {} in {}",
                    method.selector,
                    self.symtab.class(class).name
                ),
                method.span,
            );
        }
        let primitive = match &method.body {
            MethodBody::Primitive(name) => Some(name.as_str()),
            MethodBody::Code(_) => None,
        };
        let scope = self.symtab.add_method(class, &method.selector, primitive);
        method.scope = Some(scope);

        self.define_variables(scope, &method.args, VariableKind::Argument);
        if let MethodBody::Code(body) = &mut method.body {
            self.define_body(scope, body);
        }
    }

    fn define_main(&mut self, main: &mut MainDef) {
        if self.symtab.lookup_class(MAIN_CLASS).is_some() {
            self.error(format!("redefinition of class {MAIN_CLASS}"), main.span);
        }
        let class = self.symtab.add_class(MAIN_CLASS, Some(ROOT_CLASS), main.span);
        let scope = self.symtab.add_method(class, MAIN_METHOD, None);
        main.class = Some(class);
        main.scope = Some(scope);
        self.define_body(scope, &mut main.body);
    }

    fn define_body(&mut self, scope: ScopeId, body: &mut Body) {
        self.define_variables(scope, &body.locals, VariableKind::Local);
        for stat in &mut body.statements {
            self.define_expr(scope, stat);
        }
    }

    fn define_variables(&mut self, scope: ScopeId, decls: &[Decl], kind: VariableKind) {
        for decl in decls {
            match self.symtab.add_variable(scope, &decl.name, kind, decl.span) {
                Ok(_) => {}
                Err(DeclareError::Duplicate) => {
                    let where_ = self.symtab.qualified_name(scope);
                    self.error(format!("redefinition of {} in {}", decl.name, where_), decl.span);
                }
                Err(DeclareError::TooMany) => {
                    let where_ = self.symtab.qualified_name(scope);
                    self.limit(format!("too many variables in {where_}"), decl.span);
                    break;
                }
            }
        }
    }

    /// Find block literals and give each its scope.
    fn define_expr(&mut self, scope: ScopeId, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Block(block) => {
                let id = match self.symtab.add_block(scope) {
                    Ok(id) => id,
                    Err(_) => {
                        let where_ = self.symtab.qualified_name(self.symtab.scope(scope).method);
                        self.limit(format!("too many blocks in {where_}"), expr.span);
                        return;
                    }
                };
                trace!("define block {}", self.symtab.qualified_name(id));
                block.scope = Some(id);
                self.define_variables(id, &block.args, VariableKind::Argument);
                self.define_body(id, &mut block.body);
            }
            ExprKind::Assign { value, .. } => self.define_expr(scope, value),
            ExprKind::Unary { receiver, .. } => self.define_expr(scope, receiver),
            ExprKind::Binary { first, rest } => {
                self.define_expr(scope, first);
                for op in rest {
                    self.define_expr(scope, &mut op.operand);
                }
            }
            ExprKind::Keyword { receiver, parts } => {
                self.define_expr(scope, receiver);
                for part in parts {
                    self.define_expr(scope, &mut part.argument);
                }
            }
            ExprKind::Return(value) => self.define_expr(scope, value),
            ExprKind::Integer(_)
            | ExprKind::Float(_)
            | ExprKind::String(_)
            | ExprKind::Symbol(_)
            | ExprKind::Nil
            | ExprKind::SelfRef
            | ExprKind::Super
            | ExprKind::True
            | ExprKind::False
            | ExprKind::Ident(_) => {}
        }
    }

    /// Assign field slots now that superclasses are bound, and report
    /// fields that re-declare an inherited one.
    fn layout_fields(&mut self) {
        for (class, issue) in self.symtab.layout_fields() {
            let c = self.symtab.class(class);
            let (kind, msg) = match issue {
                LayoutIssue::UnknownSuperclass => (
                    ErrorKind::UnresolvedSuperclass,
                    format!(
                        "unknown superclass {} of {}",
                        c.superclass_name.as_deref().unwrap_or("?"),
                        c.name
                    ),
                ),
                LayoutIssue::Cycle => (
                    ErrorKind::CyclicInheritance,
                    format!("class {} inherits from itself", c.name),
                ),
                LayoutIssue::TooManyFields => (
                    ErrorKind::LimitExceeded,
                    format!("too many fields in {}", c.name),
                ),
            };
            self.errors.push(CompileError::new(kind, msg, c.span));
        }

        let mut shadowed = Vec::new();
        for (id, class) in self.symtab.classes() {
            if class.builtin {
                continue;
            }
            for field in &class.fields {
                let inherited = self
                    .symtab
                    .ancestors(id)
                    .filter(|&a| a != id)
                    .any(|a| self.symtab.class(a).own_field(&field.name).is_some());
                if inherited {
                    shadowed.push((format!("redefinition of inherited field {} in {}", field.name, class.name), field.span));
                }
            }
        }
        for (msg, span) in shadowed {
            self.error(msg, span);
        }
    }
}
