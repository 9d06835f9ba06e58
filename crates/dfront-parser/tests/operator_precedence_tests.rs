//! The expression grammar: the precedence ladder, the equal-precedence
//! warning, power associativity, casts, is-expressions and literals.

use dfront_ast::{BinOp, ExprKind, IsSpec, ModFlags, UnaryOp};
use dfront_diagnostics::{DiagnosticSet, Severity};
use dfront_parser::{ParseOptions, parse_expression_from_string};
use dfront_location::Loc;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn parse_expr(source: &str) -> (dfront_ast::Ast, dfront_ast::ExprId, DiagnosticSet) {
    let loc = Loc::new("test.d".into(), 1, 1, 0);
    let (ast, expr, _interner, diagnostics) =
        parse_expression_from_string(loc, source, ParseOptions::default());
    (ast, expr, diagnostics)
}

fn top_binop(ast: &dfront_ast::Ast, expr: dfront_ast::ExprId) -> BinOp {
    match ast.expr(expr).kind {
        ExprKind::Binary { op, .. } => op,
        ref other => panic!("expected binary expression, got {other:?}"),
    }
}

#[rstest]
#[case("a + b * c", BinOp::Add, BinOp::Mul)]
#[case("a * b + c", BinOp::Add, BinOp::Mul)]
#[case("a << b + c", BinOp::Shl, BinOp::Add)]
#[case("a < b | c", BinOp::Or, BinOp::Less)]
#[case("a && b || c", BinOp::OrOr, BinOp::AndAnd)]
#[case("a & b ^ c", BinOp::Xor, BinOp::And)]
#[case("a ~ b * c", BinOp::Concat, BinOp::Mul)]
fn binary_operators_group_by_the_table(
    #[case] source: &str,
    #[case] outer: BinOp,
    #[case] inner: BinOp,
) {
    let (ast, expr, diagnostics) = parse_expr(source);
    assert_eq!(diagnostics.error_count(), 0, "{source}: {diagnostics:?}");
    let top = top_binop(&ast, expr);
    assert_eq!(top, outer, "outer operator of {source}");
    let has_inner = match ast.expr(expr).kind {
        ExprKind::Binary { lhs, rhs, .. } => {
            matches!(ast.expr(lhs).kind, ExprKind::Binary { op, .. } if op == inner)
                || matches!(ast.expr(rhs).kind, ExprKind::Binary { op, .. } if op == inner)
        }
        ref other => panic!("expected binary, got {other:?}"),
    };
    assert!(has_inner, "inner operator of {source}");
}

#[test]
fn equality_and_relational_share_a_level_left_to_right() {
    let (ast, expr, diagnostics) = parse_expr("a < b == c");
    // left-to-right grouping: (a < b) == c
    match ast.expr(expr).kind {
        ExprKind::Binary { op: BinOp::Equal, lhs, .. } => {
            assert!(matches!(
                ast.expr(lhs).kind,
                ExprKind::Binary { op: BinOp::Less, .. }
            ));
        }
        ref other => panic!("expected ((a < b) == c), got {other:?}"),
    }
    // and the mixed-precedence warning fires
    assert_eq!(diagnostics.count_of(Severity::Warning), 1);
    assert!(diagnostics[0].message.contains("parentheses"));
}

#[test]
fn bitwise_and_with_comparison_warns_once() {
    let (_, _, diagnostics) = parse_expr("a & b == c");
    assert_eq!(diagnostics.count_of(Severity::Warning), 1);

    let (_, _, diagnostics) = parse_expr("a & b & c");
    assert_eq!(diagnostics.count_of(Severity::Warning), 0);

    let (_, _, diagnostics) = parse_expr("(a == b) & c");
    assert_eq!(diagnostics.count_of(Severity::Warning), 0);
}

#[test]
fn power_is_right_associative_and_tighter_than_unary() {
    let (ast, expr, _) = parse_expr("2 ^^ 3 ^^ 4");
    match ast.expr(expr).kind {
        ExprKind::Binary { op: BinOp::Pow, rhs, .. } => {
            assert!(matches!(
                ast.expr(rhs).kind,
                ExprKind::Binary { op: BinOp::Pow, .. }
            ));
        }
        ref other => panic!("expected right-nested power, got {other:?}"),
    }

    let (ast, expr, _) = parse_expr("-a ^^ b");
    match ast.expr(expr).kind {
        ExprKind::Unary { op: UnaryOp::Neg, expr: inner } => {
            assert!(matches!(
                ast.expr(inner).kind,
                ExprKind::Binary { op: BinOp::Pow, .. }
            ));
        }
        ref other => panic!("expected -(a ^^ b), got {other:?}"),
    }
}

#[test]
fn assignment_is_right_associative() {
    let (ast, expr, diagnostics) = parse_expr("a = b = c");
    assert_eq!(diagnostics.len(), 0);
    match ast.expr(expr).kind {
        ExprKind::Assign { rhs, .. } => {
            assert!(matches!(ast.expr(rhs).kind, ExprKind::Assign { .. }));
        }
        ref other => panic!("expected nested assignment, got {other:?}"),
    }
}

#[test]
fn conditional_branch_assignment_needs_parens() {
    let (_, _, diagnostics) = parse_expr("t ? a = 1 : b = 2");
    assert_eq!(diagnostics.count_of(Severity::Deprecation), 1);

    let (_, _, diagnostics) = parse_expr("(t ? a = 1 : b) = 2");
    assert_eq!(diagnostics.count_of(Severity::Deprecation), 0);
}

#[test]
fn identity_and_membership_operators() {
    let (ast, expr, _) = parse_expr("a !is b");
    assert_eq!(top_binop(&ast, expr), BinOp::NotIdentity);
    let (ast, expr, _) = parse_expr("a !in b");
    assert_eq!(top_binop(&ast, expr), BinOp::NotIn);
    let (ast, expr, _) = parse_expr("a is b");
    assert_eq!(top_binop(&ast, expr), BinOp::Identity);
    let (ast, expr, _) = parse_expr("a in b");
    assert_eq!(top_binop(&ast, expr), BinOp::In);
    // a lone prefix `!` keeps its meaning
    let (ast, expr, _) = parse_expr("!a");
    assert!(matches!(
        ast.expr(expr).kind,
        ExprKind::Unary { op: UnaryOp::Not, .. }
    ));
}

#[test]
fn qualifier_only_cast() {
    let (ast, expr, diagnostics) = parse_expr("cast(const) x");
    assert_eq!(diagnostics.len(), 0);
    match &ast.expr(expr).kind {
        ExprKind::Cast { ty: None, mods, .. } => {
            assert!(mods.contains(ModFlags::CONST));
        }
        other => panic!("expected qualifier cast, got {other:?}"),
    }

    let (ast, expr, _) = parse_expr("cast(shared const) x");
    match &ast.expr(expr).kind {
        ExprKind::Cast { ty: None, mods, .. } => {
            assert!(mods.contains(ModFlags::SHARED));
            assert!(mods.contains(ModFlags::CONST));
        }
        other => panic!("expected qualifier cast, got {other:?}"),
    }

    let (ast, expr, _) = parse_expr("cast(int) x");
    assert!(matches!(ast.expr(expr).kind, ExprKind::Cast { ty: Some(_), .. }));
}

#[test]
fn chained_template_instantiation_is_diagnosed() {
    let (_, _, diagnostics) = parse_expr("a!b!c");
    assert_eq!(diagnostics.error_count(), 1);
    assert!(diagnostics[0].message.contains("multiple ! arguments"));
}

#[test]
fn adjacent_string_literals_concatenate_with_deprecation() {
    let (ast, expr, diagnostics) = parse_expr("\"ab\" \"cd\"");
    assert_eq!(diagnostics.count_of(Severity::Deprecation), 1);
    match &ast.expr(expr).kind {
        ExprKind::StringLiteral { bytes, .. } => assert_eq!(&bytes[..], b"abcd"),
        other => panic!("expected concatenated string, got {other:?}"),
    }

    let (_, _, diagnostics) = parse_expr("\"a\"c \"b\"w");
    assert_eq!(diagnostics.error_count(), 1);
}

#[test]
fn is_expression_with_alias_and_specialisation() {
    let (ast, expr, diagnostics) = parse_expr("is(T U : U*, U)");
    assert_eq!(diagnostics.len(), 0);
    match &ast.expr(expr).kind {
        ExprKind::Is { ident: Some(_), spec: Some(IsSpec::Colon), spec_type: Some(_), params, .. } => {
            assert_eq!(params.len(), 1);
        }
        other => panic!("expected is-expression, got {other:?}"),
    }

    let (ast, expr, _) = parse_expr("is(T == struct)");
    match &ast.expr(expr).kind {
        ExprKind::Is { spec_keyword: Some(keyword), .. } => {
            assert_eq!(*keyword, dfront_token::TokenKind::Struct);
        }
        other => panic!("expected is-expression, got {other:?}"),
    }

    let (ast, expr, _) = parse_expr("is(T == const)");
    assert!(matches!(
        &ast.expr(expr).kind,
        ExprKind::Is { spec_keyword: Some(dfront_token::TokenKind::Const), .. }
    ));
}

#[test]
fn postfix_chain() {
    let (ast, expr, diagnostics) = parse_expr("obj.field.method(1)[2].next++");
    assert_eq!(diagnostics.len(), 0);
    assert!(matches!(ast.expr(expr).kind, ExprKind::PostInc { .. }));
}

#[test]
fn slices_and_indexes() {
    let (ast, expr, _) = parse_expr("a[1 .. 2]");
    assert!(matches!(
        ast.expr(expr).kind,
        ExprKind::Slice { lwr: Some(_), upr: Some(_), .. }
    ));
    let (ast, expr, _) = parse_expr("a[]");
    assert!(matches!(ast.expr(expr).kind, ExprKind::Slice { lwr: None, upr: None, .. }));
    let (ast, expr, _) = parse_expr("a[1, 2 .. 3]");
    match &ast.expr(expr).kind {
        ExprKind::Index { args, .. } => {
            assert_eq!(args.len(), 2);
            assert!(matches!(ast.expr(args[1]).kind, ExprKind::Interval { .. }));
        }
        other => panic!("expected index expression, got {other:?}"),
    }
}

#[test]
fn new_expressions() {
    let (ast, expr, _) = parse_expr("new Foo(1, 2)");
    match &ast.expr(expr).kind {
        ExprKind::New { args, .. } => assert_eq!(args.len(), 2),
        other => panic!("expected new expression, got {other:?}"),
    }
    let (ast, expr, _) = parse_expr("new int[3]");
    assert!(matches!(ast.expr(expr).kind, ExprKind::New { .. }));
}

#[test]
fn lambdas_in_all_shapes() {
    let (ast, expr, diagnostics) = parse_expr("x => x + 1");
    assert_eq!(diagnostics.len(), 0);
    assert!(matches!(ast.expr(expr).kind, ExprKind::FuncLiteral { .. }));

    let (ast, expr, _) = parse_expr("(int a, b) => a");
    assert!(matches!(ast.expr(expr).kind, ExprKind::FuncLiteral { .. }));

    let (ast, expr, _) = parse_expr("delegate int(int a) { return a; }");
    assert!(matches!(ast.expr(expr).kind, ExprKind::FuncLiteral { .. }));

    let (ast, expr, _) = parse_expr("function () { }");
    assert!(matches!(ast.expr(expr).kind, ExprKind::FuncLiteral { .. }));

    let (ast, expr, _) = parse_expr("(a) { return a; }");
    assert!(matches!(ast.expr(expr).kind, ExprKind::FuncLiteral { .. }));
}

#[test]
fn c_style_cast_is_diagnosed_but_parsed() {
    let (ast, expr, diagnostics) = parse_expr("(int)x");
    assert_eq!(diagnostics.error_count(), 1);
    assert!(diagnostics[0].message.contains("C style cast"));
    assert!(matches!(ast.expr(expr).kind, ExprKind::Cast { ty: Some(_), .. }));

    // `(expr) + 1` keeps the binary reading
    let (ast, expr, diagnostics) = parse_expr("(x) + 1");
    assert_eq!(diagnostics.len(), 0);
    assert!(matches!(
        ast.expr(expr).kind,
        ExprKind::Binary { op: BinOp::Add, .. }
    ));
}

#[test]
fn special_keyword_literals_and_typeid() {
    let (ast, expr, _) = parse_expr("__LINE__");
    assert!(matches!(ast.expr(expr).kind, ExprKind::SpecialKeyword(_)));
    let (ast, expr, _) = parse_expr("typeid(int)");
    assert!(matches!(ast.expr(expr).kind, ExprKind::Typeid { .. }));
    let (ast, expr, _) = parse_expr("__traits(compiles, 1 + 1)");
    match &ast.expr(expr).kind {
        ExprKind::Traits { args, .. } => assert_eq!(args.len(), 1),
        other => panic!("expected traits expression, got {other:?}"),
    }
    let (ast, expr, _) = parse_expr("int.max");
    assert!(matches!(ast.expr(expr).kind, ExprKind::TypeDotId { .. }));
}

#[test]
fn assert_and_mixin_and_import_expressions() {
    let (ast, expr, _) = parse_expr("assert(x, \"msg\")");
    assert!(matches!(ast.expr(expr).kind, ExprKind::Assert { msg: Some(_), .. }));
    let (ast, expr, _) = parse_expr("mixin(\"1 + 2\")");
    assert!(matches!(ast.expr(expr).kind, ExprKind::MixinExpr { .. }));
    let (ast, expr, _) = parse_expr("import(\"file.txt\")");
    assert!(matches!(ast.expr(expr).kind, ExprKind::ImportString { .. }));
}

#[test]
fn comma_expression_has_lowest_precedence() {
    let (ast, expr, _) = parse_expr("a = 1, b = 2");
    assert!(matches!(ast.expr(expr).kind, ExprKind::Comma { .. }));
}
