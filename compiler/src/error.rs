use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A name bound twice in the same scope.
    DuplicateDefinition,
    /// A superclass name that no class in the table defines.
    UnresolvedSuperclass,
    /// A class that is (transitively) its own superclass.
    CyclicInheritance,
    /// An assignment whose target cannot be stored into.
    InvalidAssignment,
    /// More fields, variables, blocks or literals than `u16` operands can
    /// address.
    LimitExceeded,
    /// A broken compiler invariant found during code generation.
    Internal,
}

/// One diagnostic on the compiler's error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: msg.into(),
            span: (!span.is_synthetic()).then_some(span),
        }
    }

    pub fn no_span(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            span: None,
        }
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::no_span(ErrorKind::Internal, msg)
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::Internal
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(span) = &self.span {
            write!(f, "{}: {}", span.start, self.message)
        } else if self.is_internal() {
            write!(f, "internal compiler error: {}", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for CompileError {}
