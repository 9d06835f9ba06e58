//! Functions: storage classes, parameters, variadics, contracts and
//! special member functions.

mod common;

use common::{parse_any, parse_clean};
use dfront_ast::{
    Contract, DeclKind, ExprKind, StmtKind, StorageClass, TypeKind, VarArg,
};
use dfront_diagnostics::Severity;
use pretty_assertions::assert_eq;

#[test]
fn attributed_function_with_default_and_variadic() {
    let parsed = parse_clean("@safe @nogc void f(int x = 1, ...) { }");
    assert_eq!(parsed.decls.len(), 1);
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { ident, ty, stc, body: Some(_), .. } => {
            assert_eq!(parsed.interner.name(*ident), "f");
            assert!(stc.contains(StorageClass::SAFE));
            assert!(stc.contains(StorageClass::NOGC));
            match &parsed.ast.ty(*ty).kind {
                TypeKind::FunctionType { params, .. } => {
                    assert_eq!(params.params.len(), 1);
                    assert_eq!(params.varargs, VarArg::Variadic);
                    let default = params.params[0]
                        .default_value
                        .unwrap_or_else(|| panic!("default argument expected"));
                    match parsed.ast.expr(default).kind {
                        ExprKind::IntLiteral { value, .. } => assert_eq!(value, 1),
                        ref other => panic!("expected integer default, got {other:?}"),
                    }
                }
                other => panic!("expected function type, got {other:?}"),
            }
        }
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn typesafe_variadic_parameter() {
    let parsed = parse_clean("void f(int[] rest...) { }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { ty, .. } => match &parsed.ast.ty(*ty).kind {
            TypeKind::FunctionType { params, .. } => {
                assert_eq!(params.varargs, VarArg::TypesafeVariadic);
                assert_eq!(params.params.len(), 1);
            }
            other => panic!("expected function type, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn ref_variadic_is_rejected() {
    let parsed = parse_any("void f(ref int xs...) { }");
    let errors = common::messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("variadic argument cannot be `out` or `ref`"));
}

#[test]
fn parameter_storage_classes() {
    let parsed = parse_clean("void f(in int a, out int b, ref int c, lazy int d, scope int e) { }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { ty, .. } => match &parsed.ast.ty(*ty).kind {
            TypeKind::FunctionType { params, .. } => {
                let stcs: Vec<StorageClass> = params.params.iter().map(|p| p.stc).collect();
                assert!(stcs[0].contains(StorageClass::IN));
                assert!(stcs[1].contains(StorageClass::OUT));
                assert!(stcs[2].contains(StorageClass::REF));
                assert!(stcs[3].contains(StorageClass::LAZY));
                assert!(stcs[4].contains(StorageClass::SCOPE));
            }
            other => panic!("expected function type, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn postfix_uda_on_parameter_is_rejected() {
    let parsed = parse_any("void f(int x @bad) { }");
    let errors = common::messages_of(&parsed, Severity::Error);
    assert!(!errors.is_empty());
    assert!(errors[0].contains("postfix"));
}

#[test]
fn member_function_attributes_land_on_the_function_type() {
    let parsed = parse_clean("struct S { int get() const pure nothrow @safe { return 0; } }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Aggregate { members: Some(members), .. } => {
            match &parsed.ast.decl(members[0]).kind {
                DeclKind::Func { ty, .. } => match &parsed.ast.ty(*ty).kind {
                    TypeKind::FunctionType { stc, .. } => {
                        assert!(stc.contains(StorageClass::CONST));
                        assert!(stc.contains(StorageClass::PURE));
                        assert!(stc.contains(StorageClass::NOTHROW));
                        assert!(stc.contains(StorageClass::SAFE));
                    }
                    other => panic!("expected function type, got {other:?}"),
                },
                other => panic!("expected member function, got {other:?}"),
            }
        }
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn expression_contracts_without_do() {
    let parsed = parse_clean("int f(int x)\nin (x > 0)\nout (r; r > 0)\n{ return x; }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { contracts, body: Some(_), .. } => {
            assert_eq!(contracts.requires.len(), 1);
            assert!(matches!(contracts.requires[0], Contract::Expr { .. }));
            assert_eq!(contracts.ensures.len(), 1);
            let r = contracts.ensures[0].ident.unwrap_or_else(|| panic!("out identifier"));
            assert_eq!(parsed.interner.name(r), "r");
        }
        other => panic!("expected function, got {other:?}"),
    }
}

#[test]
fn block_contracts_require_do() {
    let parsed = parse_clean("int g(int x)\nin { assert(x > 0); }\nout (r) { assert(r > 0); }\ndo { return x; }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { contracts, body: Some(_), .. } => {
            assert!(matches!(contracts.requires[0], Contract::Block(_)));
            assert!(matches!(contracts.ensures[0].contract, Contract::Block(_)));
        }
        other => panic!("expected function, got {other:?}"),
    }

    // omitting `do` after a block contract is diagnosed
    let parsed = parse_any("int h(int x)\nin { assert(x); }\n{ return x; }");
    let errors = common::messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("missing `do"));
}

#[test]
fn legacy_body_keyword_is_accepted() {
    let parsed = parse_clean("int f(int x)\nin { assert(x); }\nbody { return x; }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { body: Some(_), .. } => {}
        other => panic!("expected function with body, got {other:?}"),
    }
}

#[test]
fn contract_only_declaration_ends_with_semicolon() {
    let parsed = parse_clean("int f(int x) in (x > 0);");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { contracts, body: None, .. } => {
            assert_eq!(contracts.requires.len(), 1);
        }
        other => panic!("expected bodyless function, got {other:?}"),
    }
}

#[test]
fn constructor_postblit_and_destructor() {
    let parsed = parse_clean("struct S { this(int v) { } this(this) { } ~this() { } }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Aggregate { members: Some(members), .. } => {
            assert!(matches!(
                parsed.ast.decl(members[0]).kind,
                DeclKind::Ctor { is_postblit: false, .. }
            ));
            assert!(matches!(
                parsed.ast.decl(members[1]).kind,
                DeclKind::Ctor { is_postblit: true, .. }
            ));
            assert!(matches!(parsed.ast.decl(members[2]).kind, DeclKind::Dtor { .. }));
        }
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn static_constructors_and_destructors() {
    let parsed = parse_clean("static this() { }\nstatic ~this() { }\nshared static this() { }\nshared static ~this() { }");
    assert!(matches!(
        parsed.ast.decl(parsed.decls[0]).kind,
        DeclKind::StaticCtor { shared: false, .. }
    ));
    assert!(matches!(
        parsed.ast.decl(parsed.decls[1]).kind,
        DeclKind::StaticDtor { shared: false, .. }
    ));
    assert!(matches!(
        parsed.ast.decl(parsed.decls[2]).kind,
        DeclKind::StaticCtor { shared: true, .. }
    ));
    assert!(matches!(
        parsed.ast.decl(parsed.decls[3]).kind,
        DeclKind::StaticDtor { shared: true, .. }
    ));
}

#[test]
fn invariant_and_unittest_declarations() {
    let parsed = parse_clean("struct S { invariant (x > 0); invariant { assert(true); } }\nunittest { assert(1 == 1); }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Aggregate { members: Some(members), .. } => {
            assert!(matches!(
                parsed.ast.decl(members[0]).kind,
                DeclKind::Invariant { expr: Some(_), body: None }
            ));
            assert!(matches!(
                parsed.ast.decl(members[1]).kind,
                DeclKind::Invariant { expr: None, body: Some(_) }
            ));
        }
        other => panic!("expected struct, got {other:?}"),
    }
    assert!(matches!(parsed.ast.decl(parsed.decls[1]).kind, DeclKind::Unittest { .. }));
}

#[test]
fn auto_return_function() {
    let parsed = parse_clean("auto f() { return 1; }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { stc, ty, .. } => {
            assert!(stc.contains(StorageClass::AUTO));
            assert!(matches!(
                parsed.ast.ty(*ty).kind,
                TypeKind::FunctionType { ret: None, .. }
            ));
        }
        other => panic!("expected auto function, got {other:?}"),
    }
}

#[test]
fn function_body_statements_are_reachable() {
    let parsed = parse_clean("void f() { g(); return; }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { body: Some(body), .. } => match &parsed.ast.stmt(*body).kind {
            StmtKind::Compound { stmts } => assert_eq!(stmts.len(), 2),
            other => panic!("expected compound body, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    }
}
