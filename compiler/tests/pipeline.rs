use bytecode::Instruction::{self, *};
use compiler::ast::{Body, ClassDef, Expr, MainDef, MethodDef, Program};
use compiler::symbols::ROOT_CLASS;
use compiler::{CompileOptions, CompiledClass, Compiler, ErrorKind, Span, SymbolTable};
use pretty_assertions::assert_eq;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn compile(mut program: Program) -> Vec<CompiledClass> {
    init_logger();
    match Compiler::new().compile(&mut program).into_result() {
        Ok(classes) => classes,
        Err(errors) => panic!("compile failed: {errors:?}"),
    }
}

fn class<'a>(classes: &'a [CompiledClass], name: &str) -> &'a CompiledClass {
    classes.iter().find(|c| c.name == name).expect("class")
}

fn code(class: &CompiledClass, selector: &str) -> Vec<Instruction> {
    class
        .method(selector)
        .expect("method")
        .instructions()
        .expect("decodes")
}

/// `Point` with accessors and a `+` that builds a new point.
fn point_program() -> Program {
    let plus = MethodDef::new(
        "+",
        &["other"],
        Body::new(&["p"], vec![
            Expr::assign("p", Expr::unary(Expr::ident("Point"), "new")),
            Expr::keyword(Expr::ident("p"), vec![
                ("x:", Expr::binary(Expr::ident("x"), vec![("+", Expr::unary(Expr::ident("other"), "x"))])),
                ("y:", Expr::binary(Expr::ident("y"), vec![("+", Expr::unary(Expr::ident("other"), "y"))])),
            ]),
            Expr::ret(Expr::ident("p")),
        ]),
    );
    let point = ClassDef::new("Point", Some(ROOT_CLASS))
        .with_fields(&["x", "y"])
        .with_method(MethodDef::new("x", &[], Body::new(&[], vec![Expr::ret(Expr::ident("x"))])))
        .with_method(MethodDef::new("y", &[], Body::new(&[], vec![Expr::ret(Expr::ident("y"))])))
        .with_method(MethodDef::new(
            "x:y:",
            &["ax", "ay"],
            Body::new(&[], vec![Expr::assign("x", Expr::ident("ax")), Expr::assign("y", Expr::ident("ay"))]),
        ))
        .with_method(plus);
    let point3 = ClassDef::new("Point3D", Some("Point"))
        .with_fields(&["z"])
        .with_method(MethodDef::new("z", &[], Body::new(&[], vec![Expr::ret(Expr::ident("z"))])));
    let main = MainDef::new(Body::new(&["a"], vec![
        Expr::assign("a", Expr::keyword(Expr::unary(Expr::ident("Point"), "new"), vec![
            ("x:", Expr::int(1)),
            ("y:", Expr::int(2)),
        ])),
        Expr::unary(Expr::binary(Expr::ident("a"), vec![("+", Expr::ident("a"))]), "printNl"),
    ]));
    Program {
        classes: vec![point3, point],
        main: Some(main),
    }
}

#[test]
fn whole_program_compiles() {
    let classes = compile(point_program());
    let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Point3D", "Point", "MainClass"]);

    let point = class(&classes, "Point");
    assert_eq!(point.field_count, 2);
    assert_eq!(code(point, "x"), vec![PushField { idx: 0 }, Return, SelfRef, Return]);
    assert_eq!(code(point, "x:y:"), vec![
        PushLocal { depth: 0, idx: 0 },
        StoreField { idx: 0 },
        Pop,
        PushLocal { depth: 0, idx: 1 },
        StoreField { idx: 1 },
        SelfRef,
        Return,
    ]);

    let point3 = class(&classes, "Point3D");
    assert_eq!(point3.superclass.as_deref(), Some("Point"));
    assert_eq!(point3.fields, vec!["z"]);
    assert_eq!(point3.field_count, 3);
    assert_eq!(code(point3, "z"), vec![PushField { idx: 2 }, Return, SelfRef, Return]);
}

#[test]
fn keyword_send_with_nested_binary_arguments() {
    let classes = compile(point_program());
    let point = class(&classes, "Point");
    let sel = |s: &str| point.literal_index(s).expect("interned");

    assert_eq!(code(point, "+"), vec![
        PushGlobal { literal: sel("Point") },
        Send { argc: 0, selector: sel("new") },
        StoreLocal { depth: 0, idx: 1 },
        Pop,
        PushLocal { depth: 0, idx: 1 },
        PushField { idx: 0 },
        PushLocal { depth: 0, idx: 0 },
        Send { argc: 0, selector: sel("x") },
        Send { argc: 1, selector: sel("+") },
        PushField { idx: 1 },
        PushLocal { depth: 0, idx: 0 },
        Send { argc: 0, selector: sel("y") },
        Send { argc: 1, selector: sel("+") },
        Send { argc: 2, selector: sel("x:y:") },
        Pop,
        PushLocal { depth: 0, idx: 1 },
        Return,
        SelfRef,
        Return,
    ]);
    assert_eq!(point.literals, vec!["Point", "new", "x", "+", "y", "x:y:"]);
}

#[test]
fn main_runs_in_implicit_class() {
    let classes = compile(point_program());
    let main = class(&classes, "MainClass");
    assert_eq!(main.superclass.as_deref(), Some(ROOT_CLASS));
    let method = main.method("main").expect("main");
    assert_eq!(method.nlocals, 1);
    assert_eq!(code(main, "main").last(), Some(&Return));
    assert_eq!(main.literals, vec!["Point", "new", "x:y:", "+", "printNl"]);
}

#[test]
fn errors_from_every_pass_are_collected() {
    init_logger();
    let mut program = Program {
        classes: vec![
            ClassDef::new("A", Some("Missing")).with_fields(&["f", "f"]),
            ClassDef::new("B", None).with_method(MethodDef::new(
                "m",
                &[],
                Body::new(&[], vec![Expr::assign("Nowhere", Expr::int(1)).with_span(Span::at(7, 3))]),
            )),
            ClassDef::new("B", None),
        ],
        main: None,
    };
    let output = Compiler::new().compile(&mut program);
    assert!(!output.is_ok());
    let kinds: Vec<ErrorKind> = output.errors.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![
        ErrorKind::DuplicateDefinition,
        ErrorKind::DuplicateDefinition,
        ErrorKind::UnresolvedSuperclass,
        ErrorKind::InvalidAssignment,
    ]);
    // generation was skipped, so nothing was compiled
    assert!(output.classes().iter().all(|c| c.methods.is_empty()));
    let errors = output.into_result().expect_err("errors");
    assert_eq!(errors.len(), 4);
}

#[test]
fn error_display_uses_position() {
    init_logger();
    let mut program = Program {
        classes: Vec::new(),
        main: Some(MainDef::new(Body::new(&[], vec![Expr::assign("Nowhere", Expr::int(1))]))),
    };
    if let Some(main) = &mut program.main {
        if let compiler::ast::ExprKind::Assign { target, .. } = &mut main.body.statements[0].kind {
            target.span = Span::at(2, 4);
        }
    }
    let errors = Compiler::new().compile(&mut program).errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "2:4: cannot assign to undeclared variable Nowhere in MainClass>>main"
    );
}

#[test]
fn builtin_superclass_fields_are_inherited() {
    init_logger();
    let mut symtab = SymbolTable::new();
    symtab
        .define_builtin_class("Collection", Some(ROOT_CLASS), &["tally"])
        .expect("builtin");
    let mut program = Program {
        classes: vec![ClassDef::new("Bag", Some("Collection"))
            .with_fields(&["items"])
            .with_method(MethodDef::new("size", &[], Body::new(&[], vec![Expr::ret(Expr::ident("tally"))])))],
        main: None,
    };
    let classes = Compiler::with_symtab(symtab)
        .compile(&mut program)
        .into_result()
        .expect("compiles");
    // builtins are not emitted
    assert_eq!(classes.len(), 1);
    let bag = &classes[0];
    assert_eq!(bag.field_count, 2);
    assert_eq!(code(bag, "size"), vec![PushField { idx: 0 }, Return, SelfRef, Return]);
}

#[test]
fn debug_info_and_disassembly() {
    init_logger();
    let mut program = Program {
        classes: vec![ClassDef::new("A", None).with_method(MethodDef::new(
            "answer",
            &[],
            Body::new(&[], vec![Expr::ret(Expr::int(42)).with_span(Span::at(2, 5))]),
        ))],
        main: None,
    };
    let options = CompileOptions {
        file_name: "answer.st".to_string(),
        gen_dbg: true,
    };
    let classes = Compiler::new()
        .with_options(options)
        .compile(&mut program)
        .into_result()
        .expect("compiles");
    let listing = classes[0].disassemble().expect("disassembles");
    assert_eq!(
        listing,
        "class A\n\
         \x20 fields: [] (total 0)\n\
         \x20 literals: [\"answer.st\"]\n\
         A>>answer (args=0, locals=0)\n\
         \x20 0000:  dbg 'answer.st', 2:5\n\
         \x20 0007:  push_int 42\n\
         \x20 0012:  return\n\
         \x20 0013:  self\n\
         \x20 0014:  return\n"
    );
}

#[test]
fn generator_failure_reaches_the_error_list() {
    init_logger();
    // one more distinct string than a u16 literal operand can address
    let strings = (0..=usize::from(u16::MAX) + 1)
        .map(|i| Expr::string(format!("s{i}")))
        .collect();
    let mut program = Program {
        classes: Vec::new(),
        main: Some(MainDef::new(Body::new(&[], strings))),
    };
    let output = Compiler::new().compile(&mut program);
    assert!(!output.is_ok());
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].kind, ErrorKind::LimitExceeded);
    assert_eq!(output.errors[0].to_string(), "literal table of MainClass is full");
    // generation stopped before main was sealed
    assert!(class(&output.classes(), "MainClass").methods.is_empty());
    let errors = output.into_result().expect_err("errors");
    assert_eq!(errors[0].kind, ErrorKind::LimitExceeded);
}
