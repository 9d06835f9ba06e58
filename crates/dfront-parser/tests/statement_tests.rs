//! The statement grammar, exercised through function bodies.

mod common;

use common::{messages_of, parse_any, parse_clean};
use dfront_ast::{
    Condition, DeclKind, GotoTarget, ScopeGuardKind, StmtId, StmtKind, StorageClass,
};
use dfront_diagnostics::Severity;
use dfront_parser::ParsedModule;
use pretty_assertions::assert_eq;

/// The statements of the first function's body.
fn body_stmts(parsed: &ParsedModule) -> Vec<StmtId> {
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Func { body: Some(body), .. } => match &parsed.ast.stmt(*body).kind {
            StmtKind::Compound { stmts } => stmts.clone(),
            other => panic!("expected compound body, got {other:?}"),
        },
        other => panic!("expected function, got {other:?}"),
    }
}

/// Unwrap the scope wrapper control-flow bodies carry.
fn unscoped(parsed: &ParsedModule, stmt: StmtId) -> StmtId {
    match &parsed.ast.stmt(stmt).kind {
        StmtKind::Scoped { stmt } => *stmt,
        _ => stmt,
    }
}

#[test]
fn if_with_declared_condition_and_else() {
    let parsed = parse_clean("void t() { if (auto p = f()) g(p); else h(); }");
    let stmts = body_stmts(&parsed);
    assert_eq!(stmts.len(), 1);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::If { param: Some(param), cond, then, else_: Some(else_) } => {
            assert!(param.stc.contains(StorageClass::AUTO));
            assert!(param.ty.is_none());
            assert_eq!(parsed.interner.name(param.ident), "p");
            assert!(matches!(
                parsed.ast.expr(*cond).kind,
                dfront_ast::ExprKind::Call { .. }
            ));
            assert!(matches!(
                parsed.ast.stmt(unscoped(&parsed, *then)).kind,
                StmtKind::Expr { .. }
            ));
            assert!(matches!(
                parsed.ast.stmt(unscoped(&parsed, *else_)).kind,
                StmtKind::Expr { .. }
            ));
        }
        other => panic!("expected if statement, got {other:?}"),
    }
}

#[test]
fn if_with_typed_condition() {
    let parsed = parse_clean("void t() { if (int v = next()) use(v); }");
    let stmts = body_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::If { param: Some(param), .. } => {
            assert!(param.ty.is_some());
            assert_eq!(parsed.interner.name(param.ident), "v");
        }
        other => panic!("expected if statement, got {other:?}"),
    }
}

#[test]
fn dangling_else_warns_without_braces() {
    let parsed = parse_any("void t() { if (a) if (b) x(); else y(); }");
    assert_eq!(parsed.diagnostics.count_of(Severity::Warning), 1);
    assert!(messages_of(&parsed, Severity::Warning)[0].contains("dangling"));

    let parsed = parse_any("void t() { if (a) { if (b) x(); else y(); } }");
    assert_eq!(parsed.diagnostics.count_of(Severity::Warning), 0);
}

#[test]
fn loops() {
    let parsed = parse_clean(
        "void t() {\n    while (a) b();\n    do c(); while (d);\n    for (int i = 0; i < 10; i++) e(i);\n    for (;;) { break; }\n}",
    );
    let stmts = body_stmts(&parsed);
    assert!(matches!(parsed.ast.stmt(stmts[0]).kind, StmtKind::While { .. }));
    assert!(matches!(parsed.ast.stmt(stmts[1]).kind, StmtKind::DoWhile { .. }));
    match &parsed.ast.stmt(stmts[2]).kind {
        StmtKind::For { init: Some(_), cond: Some(_), inc: Some(_), .. } => {}
        other => panic!("expected for statement, got {other:?}"),
    }
    match &parsed.ast.stmt(stmts[3]).kind {
        StmtKind::For { init: None, cond: None, inc: None, .. } => {}
        other => panic!("expected empty for heads, got {other:?}"),
    }
}

#[test]
fn foreach_statement_variants() {
    let parsed = parse_clean(
        "void t() {\n    foreach (x; items) use(x);\n    foreach (i, ref v; arr) use(v);\n    foreach (i; 0 .. 10) use(i);\n    foreach_reverse (x; items) use(x);\n}",
    );
    let stmts = body_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Foreach { head, .. } => {
            assert!(!head.reverse);
            assert_eq!(head.params.len(), 1);
            assert!(head.upper.is_none());
        }
        other => panic!("expected foreach, got {other:?}"),
    }
    match &parsed.ast.stmt(stmts[1]).kind {
        StmtKind::Foreach { head, .. } => {
            assert_eq!(head.params.len(), 2);
            assert!(head.params[1].stc.contains(StorageClass::REF));
        }
        other => panic!("expected foreach, got {other:?}"),
    }
    match &parsed.ast.stmt(stmts[2]).kind {
        StmtKind::Foreach { head, .. } => assert!(head.upper.is_some()),
        other => panic!("expected range foreach, got {other:?}"),
    }
    match &parsed.ast.stmt(stmts[3]).kind {
        StmtKind::Foreach { head, .. } => assert!(head.reverse),
        other => panic!("expected foreach_reverse, got {other:?}"),
    }
}

#[test]
fn static_foreach_statement() {
    let parsed = parse_clean("void t() { static foreach (i; 0 .. 3) { use(i); } }");
    let stmts = body_stmts(&parsed);
    assert!(matches!(parsed.ast.stmt(stmts[0]).kind, StmtKind::StaticForeach { .. }));
}

#[test]
fn switch_with_case_ranges_and_goto() {
    let parsed = parse_clean(
        "void t(int x) {\n    final switch (x) {\n    case 1, 2:\n        a();\n        break;\n    case 3: .. case 9:\n        b();\n        goto default;\n    default:\n        c();\n        goto case 1;\n    }\n}",
    );
    let stmts = body_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Switch { is_final: true, body, .. } => {
            let body = unscoped(&parsed, *body);
            match &parsed.ast.stmt(body).kind {
                StmtKind::Compound { stmts } => {
                    assert_eq!(stmts.len(), 3);
                    match &parsed.ast.stmt(stmts[0]).kind {
                        StmtKind::Case { exprs, .. } => assert_eq!(exprs.len(), 2),
                        other => panic!("expected case, got {other:?}"),
                    }
                    assert!(matches!(
                        parsed.ast.stmt(stmts[1]).kind,
                        StmtKind::CaseRange { .. }
                    ));
                    assert!(matches!(parsed.ast.stmt(stmts[2]).kind, StmtKind::Default { .. }));
                }
                other => panic!("expected switch body, got {other:?}"),
            }
        }
        other => panic!("expected final switch, got {other:?}"),
    }
}

#[test]
fn goto_forms() {
    let parsed = parse_clean("void t() { L: x(); goto L; goto default; goto case; goto case 3; }");
    let stmts = body_stmts(&parsed);
    assert!(matches!(parsed.ast.stmt(stmts[0]).kind, StmtKind::Label { .. }));
    match &parsed.ast.stmt(stmts[1]).kind {
        StmtKind::Goto { target: GotoTarget::Label(_) } => {}
        other => panic!("expected goto label, got {other:?}"),
    }
    assert!(matches!(
        parsed.ast.stmt(stmts[2]).kind,
        StmtKind::Goto { target: GotoTarget::Default }
    ));
    assert!(matches!(
        parsed.ast.stmt(stmts[3]).kind,
        StmtKind::Goto { target: GotoTarget::Case(None) }
    ));
    assert!(matches!(
        parsed.ast.stmt(stmts[4]).kind,
        StmtKind::Goto { target: GotoTarget::Case(Some(_)) }
    ));
}

#[test]
fn scope_guards() {
    let parsed = parse_clean("void t() { scope(exit) a(); scope(failure) b(); scope(success) c(); }");
    let stmts = body_stmts(&parsed);
    let kinds: Vec<ScopeGuardKind> = stmts
        .iter()
        .map(|&s| match parsed.ast.stmt(s).kind {
            StmtKind::ScopeGuard { kind, .. } => kind,
            ref other => panic!("expected scope guard, got {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        [ScopeGuardKind::Exit, ScopeGuardKind::Failure, ScopeGuardKind::Success]
    );

    let parsed = parse_any("void t() { scope(never) a(); }");
    assert!(messages_of(&parsed, Severity::Error)[0].contains("valid scope identifiers"));
}

#[test]
fn try_catch_finally() {
    let parsed = parse_clean(
        "void t() { try { risky(); } catch (Exception e) { handle(e); } catch (Error) { } finally { done(); } }",
    );
    let stmts = body_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Try { catches, finally_: Some(_), .. } => {
            assert_eq!(catches.len(), 2);
            assert!(catches[0].ident.is_some());
            assert!(catches[1].ident.is_none());
        }
        other => panic!("expected try statement, got {other:?}"),
    }

    let parsed = parse_any("void t() { try { risky(); } }");
    assert!(messages_of(&parsed, Severity::Error)[0].contains("`catch` or `finally`"));
}

#[test]
fn throw_with_synchronized_and_with() {
    let parsed = parse_clean(
        "void t() {\n    throw new Exception(\"x\");\n    synchronized { a(); }\n    synchronized (lock) { b(); }\n    with (obj) { c(); }\n}",
    );
    let stmts = body_stmts(&parsed);
    assert!(matches!(parsed.ast.stmt(stmts[0]).kind, StmtKind::Throw { .. }));
    assert!(matches!(
        parsed.ast.stmt(stmts[1]).kind,
        StmtKind::Synchronized { expr: None, .. }
    ));
    assert!(matches!(
        parsed.ast.stmt(stmts[2]).kind,
        StmtKind::Synchronized { expr: Some(_), .. }
    ));
    assert!(matches!(parsed.ast.stmt(stmts[3]).kind, StmtKind::With { .. }));
}

#[test]
fn asm_block_keeps_raw_instructions() {
    let parsed = parse_clean("void t() { asm { mov EAX, 1; ret; } }");
    let stmts = body_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Asm { instrs, .. } => {
            assert_eq!(instrs.len(), 2);
            assert_eq!(instrs[0].tokens.len(), 4);
            assert_eq!(instrs[1].tokens.len(), 1);
        }
        other => panic!("expected asm statement, got {other:?}"),
    }
}

#[test]
fn asm_block_tracks_nested_braces() {
    let parsed = parse_clean("void t() { asm { db 1 { 2 } 3; } }");
    let stmts = body_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Asm { instrs, .. } => assert_eq!(instrs.len(), 1),
        other => panic!("expected asm statement, got {other:?}"),
    }
}

#[test]
fn declaration_statements_use_the_expression_bias() {
    // `int.max;` stays an expression
    let parsed = parse_clean("void t() { int.max; }");
    let stmts = body_stmts(&parsed);
    assert!(matches!(parsed.ast.stmt(stmts[0]).kind, StmtKind::Expr { .. }));

    // `int x;` is a declaration
    let parsed = parse_clean("void t() { int x; }");
    let stmts = body_stmts(&parsed);
    assert!(matches!(parsed.ast.stmt(stmts[0]).kind, StmtKind::Decl { .. }));

    // `a * b;` reads as multiplication, not a pointer declaration
    let parsed = parse_clean("void t() { a * b; }");
    let stmts = body_stmts(&parsed);
    match &parsed.ast.stmt(stmts[0]).kind {
        StmtKind::Expr { expr } => {
            assert!(matches!(
                parsed.ast.expr(*expr).kind,
                dfront_ast::ExprKind::Binary { op: dfront_ast::BinOp::Mul, .. }
            ));
        }
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn static_if_and_version_statements() {
    let parsed = parse_clean(
        "void t() {\n    static if (cond) { a(); } else { b(); }\n    version (X) { c(); }\n    debug { d(); }\n    static assert(true);\n}",
    );
    let stmts = body_stmts(&parsed);
    assert!(matches!(
        parsed.ast.stmt(stmts[0]).kind,
        StmtKind::Conditional { cond: Condition::StaticIf { .. }, else_: Some(_), .. }
    ));
    assert!(matches!(
        parsed.ast.stmt(stmts[1]).kind,
        StmtKind::Conditional { cond: Condition::Version { .. }, .. }
    ));
    assert!(matches!(
        parsed.ast.stmt(stmts[2]).kind,
        StmtKind::Conditional { cond: Condition::Debug { .. }, .. }
    ));
    assert!(matches!(parsed.ast.stmt(stmts[3]).kind, StmtKind::StaticAssert { .. }));
}

#[test]
fn mixin_statement_and_import_statement() {
    let parsed = parse_clean("void t() { mixin(\"int x;\"); import std.stdio; }");
    let stmts = body_stmts(&parsed);
    assert!(matches!(parsed.ast.stmt(stmts[0]).kind, StmtKind::Mixin { .. }));
    assert!(matches!(parsed.ast.stmt(stmts[1]).kind, StmtKind::Decl { .. }));
}

#[test]
fn empty_statement_is_diagnosed() {
    let parsed = parse_any("void t() { ; }");
    assert_eq!(parsed.diagnostics.error_count(), 1);
    assert!(messages_of(&parsed, Severity::Error)[0].contains("empty statement"));
}

#[test]
fn pragma_statement() {
    let parsed = parse_clean("void t() { pragma(msg, \"hi\"); pragma(inline) f(); }");
    let stmts = body_stmts(&parsed);
    assert!(matches!(
        parsed.ast.stmt(stmts[0]).kind,
        StmtKind::Pragma { body: None, .. }
    ));
    assert!(matches!(
        parsed.ast.stmt(stmts[1]).kind,
        StmtKind::Pragma { body: Some(_), .. }
    ));
}

#[test]
fn return_break_continue() {
    let parsed = parse_clean("int t() { while (a) { if (b) break; if (c) continue; } return 1; }");
    let stmts = body_stmts(&parsed);
    assert_eq!(stmts.len(), 2);
    assert!(matches!(
        parsed.ast.stmt(stmts[1]).kind,
        StmtKind::Return { expr: Some(_) }
    ));
}
