//! Attributed syntax tree consumed by the compiler.
//!
//! A parser builds this tree; the compiler never changes its shape. Each
//! pass only fills annotation slots:
//!
//! - [`ClassDef::symbol`], [`MethodDef::scope`], [`MainDef`] slots and
//!   [`BlockDef::scope`] are set by the symbol table builder.
//! - [`Ident::binding`] is set by the identifier resolver.
//!
//! # Message tiers
//!
//! Distinct node variants for each message tier mirror the grammar:
//! - [`ExprKind::Unary`]  : `receiver selector`
//! - [`ExprKind::Binary`] : `first op1 operand1 op2 operand2 ...`,
//!   left-associative, one send per operator
//! - [`ExprKind::Keyword`]: `receiver key1: arg1 key2: arg2`
//!
//! The constructor helpers (`Expr::int`, `Expr::keyword`, ...) build nodes
//! with synthetic spans, which is what tests and tree rewriters want.

use crate::span::Span;
use crate::symbols::{Binding, ClassId, ScopeId};

/// A compilation unit: class definitions plus optional top-level code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub classes: Vec<ClassDef>,
    pub main: Option<MainDef>,
}

/// A declared name (field, argument or local) with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: String,
    pub span: Span,
}

impl Decl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            span: Span::default(),
        }
    }

    pub fn at(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// `class Name : Super [ |fields| methods ]`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<Decl>,
    pub methods: Vec<MethodDef>,
    pub span: Span,
    pub symbol: Option<ClassId>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, superclass: Option<&str>) -> Self {
        Self {
            name: name.into(),
            superclass: superclass.map(str::to_string),
            fields: Vec::new(),
            methods: Vec::new(),
            span: Span::default(),
            symbol: None,
        }
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields.extend(fields.iter().map(|f| Decl::new(*f)));
        self
    }

    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }
}

/// A method definition. Unary, binary and keyword methods differ only in
/// their selector (`size`, `+`, `at:put:`).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub selector: String,
    pub args: Vec<Decl>,
    pub body: MethodBody,
    pub span: Span,
    pub scope: Option<ScopeId>,
}

impl MethodDef {
    pub fn new(selector: impl Into<String>, args: &[&str], body: Body) -> Self {
        Self {
            selector: selector.into(),
            args: args.iter().map(|a| Decl::new(*a)).collect(),
            body: MethodBody::Code(body),
            span: Span::default(),
            scope: None,
        }
    }

    /// `selector <primitive:#name>`
    pub fn primitive(
        selector: impl Into<String>,
        args: &[&str],
        primitive: impl Into<String>,
    ) -> Self {
        Self {
            selector: selector.into(),
            args: args.iter().map(|a| Decl::new(*a)).collect(),
            body: MethodBody::Primitive(primitive.into()),
            span: Span::default(),
            scope: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    Code(Body),
    /// Implemented by the VM primitive with this name.
    Primitive(String),
}

/// Top-level statements, compiled as `MainClass>>main`.
#[derive(Debug, Clone, PartialEq)]
pub struct MainDef {
    pub body: Body,
    pub span: Span,
    pub class: Option<ClassId>,
    pub scope: Option<ScopeId>,
}

impl MainDef {
    pub fn new(body: Body) -> Self {
        Self {
            body,
            span: Span::default(),
            class: None,
            scope: None,
        }
    }
}

/// `|locals| stat. stat. ...`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub locals: Vec<Decl>,
    pub statements: Vec<Expr>,
}

impl Body {
    pub fn new(locals: &[&str], statements: Vec<Expr>) -> Self {
        Self {
            locals: locals.iter().map(|l| Decl::new(*l)).collect(),
            statements,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Integer(i32),
    Float(f32),
    /// String literal contents, without quotes.
    String(String),
    /// Symbol literal including its leading `#`.
    Symbol(String),

    Nil,
    SelfRef,
    /// `super` as a receiver; alone it evaluates to `self`.
    Super,
    True,
    False,

    Ident(Ident),
    /// `target := value`
    Assign {
        target: Ident,
        value: Box<Expr>,
    },

    Unary {
        receiver: Box<Expr>,
        selector: String,
    },
    Binary {
        first: Box<Expr>,
        rest: Vec<BinaryOperand>,
    },
    Keyword {
        receiver: Box<Expr>,
        parts: Vec<KeywordPart>,
    },

    /// `[:a :b | |t| ... ]`
    Block(BlockDef),
    /// `^expr`
    Return(Box<Expr>),
}

/// An identifier reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
    pub binding: Option<Binding>,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            span: Span::default(),
            binding: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOperand {
    pub operator: String,
    pub operand: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordPart {
    pub keyword: String,
    pub argument: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockDef {
    pub args: Vec<Decl>,
    pub body: Body,
    pub scope: Option<ScopeId>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    fn synthetic(kind: ExprKind) -> Self {
        Self::new(kind, Span::default())
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn int(value: i32) -> Self {
        Self::synthetic(ExprKind::Integer(value))
    }

    pub fn float(value: f32) -> Self {
        Self::synthetic(ExprKind::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::String(value.into()))
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Symbol(value.into()))
    }

    pub fn nil() -> Self {
        Self::synthetic(ExprKind::Nil)
    }

    pub fn self_ref() -> Self {
        Self::synthetic(ExprKind::SelfRef)
    }

    pub fn super_ref() -> Self {
        Self::synthetic(ExprKind::Super)
    }

    pub fn boolean(value: bool) -> Self {
        Self::synthetic(if value { ExprKind::True } else { ExprKind::False })
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Ident(Ident::new(name)))
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Self::synthetic(ExprKind::Assign {
            target: Ident::new(target),
            value: Box::new(value),
        })
    }

    pub fn unary(receiver: Expr, selector: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Unary {
            receiver: Box::new(receiver),
            selector: selector.into(),
        })
    }

    /// `first op operand` for each pair in `rest`.
    pub fn binary(first: Expr, rest: Vec<(&str, Expr)>) -> Self {
        Self::synthetic(ExprKind::Binary {
            first: Box::new(first),
            rest: rest
                .into_iter()
                .map(|(operator, operand)| BinaryOperand {
                    operator: operator.to_string(),
                    operand,
                })
                .collect(),
        })
    }

    pub fn keyword(receiver: Expr, parts: Vec<(&str, Expr)>) -> Self {
        Self::synthetic(ExprKind::Keyword {
            receiver: Box::new(receiver),
            parts: parts
                .into_iter()
                .map(|(keyword, argument)| KeywordPart {
                    keyword: keyword.to_string(),
                    argument,
                })
                .collect(),
        })
    }

    pub fn block(args: &[&str], body: Body) -> Self {
        Self::synthetic(ExprKind::Block(BlockDef {
            args: args.iter().map(|a| Decl::new(*a)).collect(),
            body,
            scope: None,
        }))
    }

    pub fn ret(value: Expr) -> Self {
        Self::synthetic(ExprKind::Return(Box::new(value)))
    }
}
