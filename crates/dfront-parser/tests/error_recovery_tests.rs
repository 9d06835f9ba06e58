//! Error recovery: resynchronisation, diagnostic locality, premature EOF
//! and attribute conflict reporting.

mod common;

use common::{messages_of, parse_any, printed};
use dfront_ast::DeclKind;
use dfront_diagnostics::Severity;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn single_bad_token_stays_local() {
    // one broken initializer, then a healthy declaration
    let parsed = parse_any("int x = ;\nvoid g() { }");
    let errors = messages_of(&parsed, Severity::Error);
    assert!(!errors.is_empty() && errors.len() <= 3, "got {errors:?}");
    assert_eq!(parsed.decls.len(), 2);
    assert!(matches!(parsed.ast.decl(parsed.decls[1]).kind, DeclKind::Func { .. }));
}

#[test]
fn unknown_declaration_resyncs_to_semicolon() {
    let parsed = parse_any("+ garbage tokens here;\nint ok;");
    assert!(parsed.diagnostics.error_count() >= 1);
    assert_eq!(parsed.decls.len(), 1);
    assert!(matches!(parsed.ast.decl(parsed.decls[0]).kind, DeclKind::Var { .. }));
}

#[test]
fn statement_error_resyncs_within_function() {
    let parsed = parse_any("void t() { x = ; y(); }\nint after;");
    assert!(parsed.diagnostics.error_count() >= 1);
    assert_eq!(parsed.decls.len(), 2);
}

#[rstest]
#[case("struct S {")]
#[case("void f() {")]
#[case("enum E {")]
#[case("template T() {")]
#[case("unittest {")]
#[case("void f(int a")]
#[case("int[] a = [1, 2")]
fn premature_eof_is_named(#[case] source: &str) {
    let parsed = parse_any(source);
    let errors = messages_of(&parsed, Severity::Error);
    assert!(
        errors.iter().any(|m| m.contains("end of file")),
        "{source:?} produced {errors:?}"
    );
}

#[test]
fn matching_brace_diagnostic_names_the_opening() {
    let parsed = parse_any("struct S {");
    let errors: Vec<_> = parsed
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert!(!errors.is_empty());
    assert!(errors[0].message.contains("matching `}` expected"));
    assert!(!errors[0].supplementals().is_empty());
}

#[test]
fn safety_conflict_reported_exactly_once() {
    let parsed = parse_any("@safe @system void f() { }");
    let errors = messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("conflicting attribute"));
}

#[test]
fn mutability_group_conflict() {
    let parsed = parse_any("const immutable int x = 1;");
    let errors = messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("conflicting attribute"));
}

#[test]
fn redundant_storage_class() {
    let parsed = parse_any("pure pure void f() { }");
    let errors = messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("redundant attribute"));
}

#[test]
fn legacy_bracket_attributes_recover() {
    let parsed = parse_any("[tag] int x;");
    let errors = messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("@(attributes)"));
    assert_eq!(parsed.decls.len(), 1);
    assert!(matches!(
        parsed.ast.decl(parsed.decls[0]).kind,
        DeclKind::UserAttributeDecl { .. }
    ));
}

#[test]
fn empty_attribute_list_is_an_error() {
    let parsed = parse_any("@() int x;");
    let errors = messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("empty attribute list"));
    assert_eq!(parsed.decls.len(), 1);
}

#[test]
fn template_without_members_yields_sentinel() {
    let parsed = parse_any("template T();");
    let errors = messages_of(&parsed, Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("members of template declaration expected"));
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Template { members, .. } => assert!(members.is_empty()),
        other => panic!("expected template sentinel, got {other:?}"),
    }
}

#[test]
fn reparsing_is_deterministic() {
    let source = "module m;\nint x = ;\nstruct S {\n";
    let first = parse_any(source);
    let second = parse_any(source);
    let msgs = |p: &dfront_parser::ParsedModule| -> Vec<(String, Severity)> {
        p.diagnostics.iter().map(|d| (d.message.clone(), d.severity)).collect()
    };
    assert_eq!(msgs(&first), msgs(&second));
    assert_eq!(printed(&first), printed(&second));
}

#[test]
fn deeply_nested_input_hits_the_budget_without_crashing() {
    let mut source = String::from("int x = ");
    for _ in 0..2000 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..2000 {
        source.push(')');
    }
    source.push(';');
    let parsed = parse_any(&source);
    assert!(parsed.diagnostics.error_count() >= 1);
    assert!(
        messages_of(&parsed, Severity::Error)
            .iter()
            .any(|m| m.contains("nesting limit"))
    );
}

#[test]
fn module_level_stray_brace_is_consumed() {
    let parsed = parse_any("}\nint x;");
    assert!(parsed.diagnostics.error_count() >= 1);
    assert_eq!(parsed.decls.len(), 1);
}
