//! # Compiler
//!
//! Semantic analysis and code generation for a small Smalltalk-like
//! language. Input is an attributed syntax tree built by a parser; output is
//! one [`CompiledClass`] per class, holding bytecode for the VM.
//!
//! ## Passes
//!
//! ```text
//!  Program ──▶ define ──▶ resolve ──▶ codegen ──▶ CompiledClass*
//!              │          │           │
//!              scopes     bindings    artifacts
//!              fields     on Idents   in scopes
//! ```
//!
//! Define and resolve collect user errors and keep going. Code generation
//! only runs on an error-free tree.
//!
//! ```rust
//! use compiler::ast::{Body, ClassDef, Expr, MethodDef, Program};
//! use compiler::Compiler;
//!
//! let mut program = Program {
//!     classes: vec![ClassDef::new("Counter", Some("Object"))
//!         .with_fields(&["count"])
//!         .with_method(MethodDef::new("count", &[], Body::new(&[], vec![
//!             Expr::ret(Expr::ident("count")),
//!         ])))],
//!     main: None,
//! };
//! let classes = Compiler::new().compile(&mut program).into_result().unwrap();
//! assert_eq!(classes[0].name, "Counter");
//! println!("{}", classes[0].disassemble().unwrap());
//! ```

pub mod ast;
pub mod codegen;
pub mod compiled;
pub mod define;
pub mod error;
pub mod resolve;
pub mod span;
pub mod symbols;

use log::debug;

pub use codegen::CodeGenerator;
pub use compiled::{CompiledBlock, CompiledClass};
pub use define::{MAIN_CLASS, MAIN_METHOD, define_symbols};
pub use error::{CompileError, ErrorKind};
pub use resolve::resolve_symbols;
pub use span::{Pos, Span};
pub use symbols::SymbolTable;

use ast::Program;

/// Settings for one compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Source file name, recorded by `dbg` instructions.
    pub file_name: String,
    /// Precede every statement with a `dbg` instruction.
    pub gen_dbg: bool,
}

/// Runs the three passes over one program.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    symtab: SymbolTable,
    options: CompileOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile against a table already holding builtin classes.
    pub fn with_symtab(symtab: SymbolTable) -> Self {
        Self {
            symtab,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Annotate `program` in place and generate its code.
    pub fn compile(self, program: &mut Program) -> CompileOutput {
        let Self {
            mut symtab,
            options,
        } = self;
        let mut errors = Vec::new();

        define_symbols(&mut symtab, program, &mut errors);
        resolve_symbols(&symtab, program, &mut errors);

        if errors.is_empty() {
            if let Err(err) = CodeGenerator::new(&mut symtab, &options).generate(program) {
                errors.push(err);
            }
        } else {
            debug!("skipping code generation, {} errors", errors.len());
        }

        CompileOutput { symtab, errors }
    }
}

/// The annotated symbol table and every error from all passes.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub symtab: SymbolTable,
    pub errors: Vec<CompileError>,
}

impl CompileOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Compiled form of every class the program declared, in declaration
    /// order, `MainClass` last. Builtins are left out.
    pub fn classes(&self) -> Vec<CompiledClass> {
        self.symtab
            .classes()
            .filter(|(_, class)| !class.builtin)
            .map(|(_, class)| CompiledClass {
                name: class.name.clone(),
                superclass: class.superclass_name.clone(),
                fields: class.fields.iter().map(|f| f.name.clone()).collect(),
                field_count: class.field_count(),
                literals: class.literals.to_vec(),
                methods: class
                    .methods
                    .iter()
                    .filter_map(|&m| self.symtab.scope(m).compiled.clone())
                    .collect(),
            })
            .collect()
    }

    /// The compiled classes, or every error if there was any.
    pub fn into_result(self) -> Result<Vec<CompiledClass>, Vec<CompileError>> {
        if self.errors.is_empty() {
            Ok(self.classes())
        } else {
            Err(self.errors)
        }
    }
}
