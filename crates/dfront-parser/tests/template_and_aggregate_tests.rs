//! Aggregates, templates, template mixins and string mixins.

mod common;

use common::parse_clean;
use dfront_ast::{AggregateKind, DeclKind, ExprKind, IsSpec, TemplateParam, TypeKind};
use dfront_token::TokenKind;
use pretty_assertions::assert_eq;

#[test]
fn struct_template_with_constraint() {
    let parsed = parse_clean("struct S(T) if (is(T == int)) { T x; }");
    assert_eq!(parsed.decls.len(), 1);
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Template { ident, params, constraint: Some(constraint), members, is_mixin } => {
            assert_eq!(parsed.interner.name(*ident), "S");
            assert!(!is_mixin);
            assert_eq!(params.len(), 1);
            assert!(matches!(params[0], TemplateParam::Type { .. }));
            match &parsed.ast.expr(*constraint).kind {
                ExprKind::Is { spec: Some(IsSpec::Equal), spec_type: Some(spec_type), .. } => {
                    assert!(matches!(
                        parsed.ast.ty(*spec_type).kind,
                        TypeKind::Basic(TokenKind::Int)
                    ));
                }
                other => panic!("expected is-expression constraint, got {other:?}"),
            }
            assert_eq!(members.len(), 1);
            match &parsed.ast.decl(members[0]).kind {
                DeclKind::Aggregate {
                    kind: AggregateKind::Struct,
                    ident: Some(agg_ident),
                    members: Some(fields),
                    ..
                } => {
                    assert_eq!(parsed.interner.name(*agg_ident), "S");
                    assert_eq!(fields.len(), 1);
                    match &parsed.ast.decl(fields[0]).kind {
                        DeclKind::Var { ident, ty: Some(ty), .. } => {
                            assert_eq!(parsed.interner.name(*ident), "x");
                            match &parsed.ast.ty(*ty).kind {
                                TypeKind::Qualified { segments, .. } => {
                                    assert_eq!(parsed.interner.name(segments[0].ident), "T");
                                }
                                other => panic!("expected identifier type, got {other:?}"),
                            }
                        }
                        other => panic!("expected field, got {other:?}"),
                    }
                }
                other => panic!("expected struct member, got {other:?}"),
            }
        }
        other => panic!("expected template declaration, got {other:?}"),
    }
}

#[test]
fn class_with_base_list() {
    let parsed = parse_clean("class C : Base, I1, I2 { }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Aggregate { kind: AggregateKind::Class, bases, members: Some(_), .. } => {
            assert_eq!(bases.len(), 3);
        }
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn interface_and_forward_declarations() {
    let parsed = parse_clean("interface I { void m(); }\nstruct Fwd;");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Aggregate { kind: AggregateKind::Interface, members: Some(members), .. } => {
            assert_eq!(members.len(), 1);
        }
        other => panic!("expected interface, got {other:?}"),
    }
    match &parsed.ast.decl(parsed.decls[1]).kind {
        DeclKind::Aggregate { kind: AggregateKind::Struct, members: None, .. } => {}
        other => panic!("expected forward struct, got {other:?}"),
    }
}

#[test]
fn anonymous_union_member() {
    let parsed = parse_clean("struct S { union { int a; float b; } }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Aggregate { members: Some(members), .. } => {
            match &parsed.ast.decl(members[0]).kind {
                DeclKind::AnonAggregate { is_union: true, members } => {
                    assert_eq!(members.len(), 2);
                }
                other => panic!("expected anonymous union, got {other:?}"),
            }
        }
        other => panic!("expected struct, got {other:?}"),
    }
}

#[test]
fn mixin_template_and_instantiation() {
    let parsed = parse_clean("mixin template M() { int x; }\nmixin M!() m;");
    assert_eq!(parsed.decls.len(), 2);
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Template { ident, is_mixin: true, members, .. } => {
            assert_eq!(parsed.interner.name(*ident), "M");
            assert_eq!(members.len(), 1);
        }
        other => panic!("expected mixin template, got {other:?}"),
    }
    match &parsed.ast.decl(parsed.decls[1]).kind {
        DeclKind::TemplateMixin { segments, ident: Some(bound), .. } => {
            assert_eq!(parsed.interner.name(segments[0].ident), "M");
            assert_eq!(segments[0].args.as_deref(), Some(&[][..]));
            assert_eq!(parsed.interner.name(*bound), "m");
        }
        other => panic!("expected template mixin, got {other:?}"),
    }
}

#[test]
fn string_mixin_declaration() {
    let parsed = parse_clean("mixin(\"int generated;\");");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::MixinDecl { args } => assert_eq!(args.len(), 1),
        other => panic!("expected mixin declaration, got {other:?}"),
    }
}

#[test]
fn plain_template_declaration() {
    let parsed = parse_clean("template Tuple(T...) { alias Tuple = T; }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Template { params, members, .. } => {
            assert!(matches!(params[0], TemplateParam::Tuple { .. }));
            assert_eq!(members.len(), 1);
        }
        other => panic!("expected template, got {other:?}"),
    }
}

#[test]
fn template_parameter_kinds() {
    let parsed = parse_clean("template All(T, int N : 3, alias A, this This, Rest...) { }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Template { params, .. } => {
            assert_eq!(params.len(), 5);
            assert!(matches!(params[0], TemplateParam::Type { .. }));
            assert!(matches!(params[1], TemplateParam::Value { spec: Some(_), .. }));
            assert!(matches!(params[2], TemplateParam::Alias { .. }));
            assert!(matches!(params[3], TemplateParam::This { .. }));
            assert!(matches!(params[4], TemplateParam::Tuple { .. }));
        }
        other => panic!("expected template, got {other:?}"),
    }
}

#[test]
fn eponymous_function_template() {
    let parsed = parse_clean("T identity(T)(T value) { return value; }");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Template { ident, members, .. } => {
            assert_eq!(parsed.interner.name(*ident), "identity");
            match &parsed.ast.decl(members[0]).kind {
                DeclKind::Func { ident: fn_ident, .. } => {
                    assert_eq!(parsed.interner.name(*fn_ident), "identity");
                }
                other => panic!("expected function member, got {other:?}"),
            }
        }
        other => panic!("expected function template, got {other:?}"),
    }
}

#[test]
fn manifest_template_shorthand() {
    let parsed = parse_clean("enum isInt(T) = is(T == int);");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Template { ident, members, .. } => {
            assert_eq!(parsed.interner.name(*ident), "isInt");
            assert!(matches!(
                parsed.ast.decl(members[0]).kind,
                DeclKind::Var { ty: None, .. }
            ));
        }
        other => panic!("expected template wrapper, got {other:?}"),
    }
}

#[test]
fn templated_qualified_type() {
    let parsed = parse_clean("a.b!(int).C value;");
    match &parsed.ast.decl(parsed.decls[0]).kind {
        DeclKind::Var { ty: Some(ty), .. } => match &parsed.ast.ty(*ty).kind {
            TypeKind::Qualified { segments, leading_dot: false } => {
                assert_eq!(segments.len(), 3);
                assert!(segments[1].args.is_some());
            }
            other => panic!("expected qualified type, got {other:?}"),
        },
        other => panic!("expected variable, got {other:?}"),
    }
}
