//! The expression grammar: precedence cascade, postfix chain and primaries.

use dfront_ast::{
    BinOp, DeclKind, ExprId, ExprKind, FuncLiteralKind, IsSpec, ModFlags, Prec, StmtKind,
    StorageClass, TemplateParam, TypeKind, UnaryOp, expr_prec,
};
use dfront_diagnostics::DiagnosticHandler;
use dfront_location::Loc;
use dfront_token::{TokenKind, TokenValue};

use crate::parser::Parser;
use crate::probes::{self, NeedDeclaratorId};

impl<'a, H: DiagnosticHandler> Parser<'a, H> {
    /// Comma level, the loosest binding.
    pub(crate) fn parse_expression(&mut self) -> ExprId {
        if !self.enter() {
            let loc = self.loc();
            self.leave();
            return self.error_expr(loc);
        }
        let loc = self.loc();
        let mut e = self.parse_assign_expr();
        while self.kind() == TokenKind::Comma {
            self.advance();
            let rhs = self.parse_assign_expr();
            e = self.ast.make_expr(loc.clone(), ExprKind::Comma { lhs: e, rhs });
        }
        self.leave();
        e
    }

    /// Right-associative assignment; rejects a bare ternary on the left.
    pub(crate) fn parse_assign_expr(&mut self) -> ExprId {
        let e = self.parse_cond_expr();
        let op = match self.kind() {
            TokenKind::Assign => None,
            TokenKind::AddAssign => Some(BinOp::Add),
            TokenKind::MinAssign => Some(BinOp::Sub),
            TokenKind::MulAssign => Some(BinOp::Mul),
            TokenKind::DivAssign => Some(BinOp::Div),
            TokenKind::ModAssign => Some(BinOp::Mod),
            TokenKind::AndAssign => Some(BinOp::And),
            TokenKind::OrAssign => Some(BinOp::Or),
            TokenKind::XorAssign => Some(BinOp::Xor),
            TokenKind::ConcatenateAssign => Some(BinOp::Concat),
            TokenKind::LeftShiftAssign => Some(BinOp::Shl),
            TokenKind::RightShiftAssign => Some(BinOp::Shr),
            TokenKind::UnsignedRightShiftAssign => Some(BinOp::Ushr),
            TokenKind::PowAssign => Some(BinOp::Pow),
            _ => return e,
        };
        self.check_ternary_parens(e);
        let loc = self.loc();
        self.advance();
        let rhs = self.parse_assign_expr();
        let kind = match op {
            None => ExprKind::Assign { lhs: e, rhs },
            Some(op) => ExprKind::BinAssign { op, lhs: e, rhs },
        };
        self.ast.make_expr(loc, kind)
    }

    /// `t ? a = 1 : b = 2` needs parens around the ternary.
    fn check_ternary_parens(&mut self, e: ExprId) {
        let node = self.ast.expr(e);
        if matches!(node.kind, ExprKind::Cond { .. }) && !node.parens {
            let loc = node.loc.clone();
            self.deprecation(
                loc,
                "conditional expression must be surrounded by parentheses when next to operator `=`"
                    .to_string(),
            );
        }
    }

    pub(crate) fn parse_cond_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let e = self.parse_oror_expr();
        if self.kind() != TokenKind::Question {
            return e;
        }
        self.advance();
        let when_true = self.parse_expression();
        self.expect(TokenKind::Colon);
        let when_false = self.parse_cond_expr();
        self.ast.make_expr(loc, ExprKind::Cond { cond: e, when_true, when_false })
    }

    fn parse_oror_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_andand_expr();
        while self.kind() == TokenKind::OrOr {
            self.advance();
            let rhs = self.parse_andand_expr();
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op: BinOp::OrOr, lhs: e, rhs });
        }
        e
    }

    fn parse_andand_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_or_expr();
        while self.kind() == TokenKind::AndAnd {
            self.advance();
            let rhs = self.parse_or_expr();
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op: BinOp::AndAnd, lhs: e, rhs });
        }
        e
    }

    fn parse_or_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_xor_expr();
        while self.kind() == TokenKind::Or {
            self.check_parens(e, "|");
            self.advance();
            let rhs = self.parse_xor_expr();
            self.check_parens(rhs, "|");
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op: BinOp::Or, lhs: e, rhs });
        }
        e
    }

    fn parse_xor_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_and_expr();
        while self.kind() == TokenKind::Xor {
            self.check_parens(e, "^");
            self.advance();
            let rhs = self.parse_and_expr();
            self.check_parens(rhs, "^");
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op: BinOp::Xor, lhs: e, rhs });
        }
        e
    }

    fn parse_and_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_cmp_expr();
        while self.kind() == TokenKind::And {
            self.check_parens(e, "&");
            self.advance();
            let rhs = self.parse_cmp_expr();
            self.check_parens(rhs, "&");
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op: BinOp::And, lhs: e, rhs });
        }
        e
    }

    /// Warn when a relational operand of `& | ^` (or of another relational
    /// operator) is not parenthesised; `==` and `<` share one level.
    fn check_parens(&mut self, e: ExprId, next_to: &str) {
        let node = self.ast.expr(e);
        if expr_prec(&node.kind) == Prec::Rel && !node.parens {
            let loc = node.loc.clone();
            self.warning(
                loc,
                format!("comparison must be surrounded by parentheses when next to operator `{next_to}`"),
            );
        }
    }

    /// Equality, identity, `in`, and relational — one shared level, looping
    /// left-to-right with the mixed-use warning.
    fn parse_cmp_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_shift_expr();
        loop {
            let op = match self.kind() {
                TokenKind::Equal => BinOp::Equal,
                TokenKind::NotEqual => BinOp::NotEqual,
                TokenKind::Is => BinOp::Identity,
                TokenKind::In => BinOp::In,
                TokenKind::LessThan => BinOp::Less,
                TokenKind::LessOrEqual => BinOp::LessEq,
                TokenKind::GreaterThan => BinOp::Greater,
                TokenKind::GreaterOrEqual => BinOp::GreaterEq,
                // `!is` and `!in` only in this binary-operator position
                TokenKind::Not if self.peek_kind(1) == TokenKind::Is => {
                    self.advance();
                    BinOp::NotIdentity
                }
                TokenKind::Not if self.peek_kind(1) == TokenKind::In => {
                    self.advance();
                    BinOp::NotIn
                }
                _ => return e,
            };
            let op_str = op.as_str();
            self.check_parens(e, op_str);
            self.advance();
            let rhs = self.parse_shift_expr();
            self.check_parens(rhs, op_str);
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op, lhs: e, rhs });
        }
    }

    fn parse_shift_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_add_expr();
        loop {
            let op = match self.kind() {
                TokenKind::LeftShift => BinOp::Shl,
                TokenKind::RightShift => BinOp::Shr,
                TokenKind::UnsignedRightShift => BinOp::Ushr,
                _ => return e,
            };
            self.advance();
            let rhs = self.parse_add_expr();
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op, lhs: e, rhs });
        }
    }

    fn parse_add_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_mul_expr();
        loop {
            let op = match self.kind() {
                TokenKind::Add => BinOp::Add,
                TokenKind::Min => BinOp::Sub,
                TokenKind::Tilde => BinOp::Concat,
                _ => return e,
            };
            self.advance();
            let rhs = self.parse_mul_expr();
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op, lhs: e, rhs });
        }
    }

    fn parse_mul_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let mut e = self.parse_unary_expr();
        loop {
            let op = match self.kind() {
                TokenKind::Mul => BinOp::Mul,
                TokenKind::Div => BinOp::Div,
                TokenKind::Mod => BinOp::Mod,
                _ => return e,
            };
            self.advance();
            let rhs = self.parse_unary_expr();
            e = self.ast.make_expr(loc.clone(), ExprKind::Binary { op, lhs: e, rhs });
        }
    }

    pub(crate) fn parse_unary_expr(&mut self) -> ExprId {
        if !self.enter() {
            let loc = self.loc();
            self.leave();
            return self.error_expr(loc);
        }
        let loc = self.loc();
        let e = match self.kind() {
            TokenKind::And => self.parse_prefix(UnaryOp::AddressOf, loc),
            TokenKind::Mul => self.parse_prefix(UnaryOp::Deref, loc),
            TokenKind::Min => self.parse_prefix(UnaryOp::Neg, loc),
            TokenKind::Add => self.parse_prefix(UnaryOp::Plus, loc),
            TokenKind::Tilde => self.parse_prefix(UnaryOp::Com, loc),
            TokenKind::PlusPlus => self.parse_prefix(UnaryOp::PreInc, loc),
            TokenKind::MinusMinus => self.parse_prefix(UnaryOp::PreDec, loc),
            TokenKind::Not
                if self.peek_kind(1) != TokenKind::Is && self.peek_kind(1) != TokenKind::In =>
            {
                self.parse_prefix(UnaryOp::Not, loc)
            }
            TokenKind::Delete => {
                self.advance();
                self.deprecation(
                    loc.clone(),
                    "the `delete` keyword is obsolete; use `destroy()` or `core.memory.GC.free()`"
                        .to_string(),
                );
                let expr = self.parse_unary_expr();
                self.ast.make_expr(loc, ExprKind::Delete { expr })
            }
            TokenKind::Cast => self.parse_cast_expr(loc),
            TokenKind::New => self.parse_new_expr(loc),
            TokenKind::LeftParen if self.is_c_style_cast() => {
                // ( type ) unary-expression
                self.error(loc.clone(), "C style cast illegal, use `cast(Type)expr`".to_string());
                self.advance();
                let ty = self.parse_type();
                self.expect(TokenKind::RightParen);
                let expr = self.parse_unary_expr();
                self.ast.make_expr(
                    loc,
                    ExprKind::Cast { ty: Some(ty), mods: ModFlags::default(), expr },
                )
            }
            _ => {
                let e = self.parse_primary_expr();
                self.parse_postfix(e)
            }
        };
        // PowExpression: PostfixExpression ^^ UnaryExpression
        let e = if self.kind() == TokenKind::Pow {
            let pow_loc = self.loc();
            self.advance();
            let rhs = self.parse_unary_expr();
            self.ast.make_expr(pow_loc, ExprKind::Binary { op: BinOp::Pow, lhs: e, rhs })
        } else {
            e
        };
        self.leave();
        e
    }

    fn parse_prefix(&mut self, op: UnaryOp, loc: Loc) -> ExprId {
        self.advance();
        let expr = self.parse_unary_expr();
        self.ast.make_expr(loc, ExprKind::Unary { op, expr })
    }

    /// `(Type) expr` only when the parens hold a valid no-identifier
    /// declaration and an expression-starting token follows.
    fn is_c_style_cast(&mut self) -> bool {
        let here = self.stream.here();
        let Some(inner_end) = probes::is_declaration(
            &mut self.stream,
            here.next(),
            NeedDeclaratorId::No,
            Some(TokenKind::RightParen),
            self.options.allow_alt_syntax,
            self.options.c_style_declarators,
        ) else {
            return false;
        };
        if self.stream.kind_at(inner_end) != TokenKind::RightParen {
            return false;
        }
        // tokens that start an expression but cannot continue one; `+`, `-`,
        // `&`, `*`, `++` after `)` read as binary/postfix operators instead
        let next = self.stream.kind_at(inner_end.next());
        matches!(
            next,
            TokenKind::Identifier
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::New
                | TokenKind::Delete
                | TokenKind::Not
                | TokenKind::Tilde
        ) || next.is_literal()
    }

    fn parse_cast_expr(&mut self, loc: Loc) -> ExprId {
        self.advance(); // cast
        self.expect(TokenKind::LeftParen);
        let mut mods = ModFlags::default();
        // qualifier-only form: cast(), cast(const), cast(shared const), …
        loop {
            let flag = match self.kind() {
                TokenKind::Const => ModFlags::CONST,
                TokenKind::Immutable => ModFlags::IMMUTABLE,
                TokenKind::Shared => ModFlags::SHARED,
                TokenKind::Inout => ModFlags::WILD,
                _ => break,
            };
            if self.peek_kind(1) == TokenKind::LeftParen {
                break; // type constructor, full type follows
            }
            match self.peek_kind(1) {
                TokenKind::RightParen
                | TokenKind::Const
                | TokenKind::Immutable
                | TokenKind::Shared
                | TokenKind::Inout => {
                    self.advance();
                    mods.insert(flag);
                }
                _ => break,
            }
        }
        let ty = if self.kind() == TokenKind::RightParen {
            None
        } else {
            if !mods.is_empty() {
                self.error_here("qualifier cast cannot also name a type".to_string());
            }
            Some(self.parse_type())
        };
        self.expect(TokenKind::RightParen);
        let expr = self.parse_unary_expr();
        self.ast.make_expr(loc, ExprKind::Cast { ty, mods, expr })
    }

    pub(crate) fn parse_new_expr(&mut self, loc: Loc) -> ExprId {
        self.advance(); // new
        if self.kind() == TokenKind::Class {
            return self.parse_new_anon_class(loc);
        }
        let base = self.parse_basic_type();
        let ty = self.parse_type_suffixes(base);
        let args = if self.kind() == TokenKind::LeftParen {
            self.parse_arguments()
        } else {
            Vec::new()
        };
        self.ast.make_expr(loc, ExprKind::New { ty, args })
    }

    /// `new class (args) Base, Interfaces { members }`
    fn parse_new_anon_class(&mut self, loc: Loc) -> ExprId {
        self.advance(); // class
        let args = if self.kind() == TokenKind::LeftParen {
            self.parse_arguments()
        } else {
            Vec::new()
        };
        let mut bases = Vec::new();
        if self.kind() != TokenKind::LeftCurly {
            loop {
                bases.push(self.parse_basic_type());
                if !self.check(TokenKind::Comma) {
                    break;
                }
            }
        }
        let members = if self.kind() == TokenKind::LeftCurly {
            self.advance();
            let members = self.parse_decl_defs_until(TokenKind::RightCurly);
            self.close_brace(loc.clone());
            Some(members)
        } else {
            self.error_here("`{ members }` expected for anonymous class".to_string());
            None
        };
        let decl = self.ast.make_decl(
            loc.clone(),
            DeclKind::Aggregate {
                kind: dfront_ast::AggregateKind::Class,
                ident: None,
                bases,
                members,
            },
        );
        self.ast.make_expr(loc, ExprKind::NewAnonClass { args, decl })
    }

    // —————————————————————————— postfix ————————————————————————————

    pub(crate) fn parse_postfix(&mut self, mut e: ExprId) -> ExprId {
        loop {
            let loc = self.loc();
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    match self.kind() {
                        TokenKind::Identifier => {
                            let ident = match self.current_ident() {
                                Some(ident) => ident,
                                None => break,
                            };
                            self.advance();
                            let args = if self.kind() == TokenKind::Not
                                && self.peek_kind(1) != TokenKind::Is
                                && self.peek_kind(1) != TokenKind::In
                            {
                                Some(self.parse_template_arguments())
                            } else {
                                None
                            };
                            e = self.ast.make_expr(loc, ExprKind::DotId { lhs: e, ident, args });
                        }
                        TokenKind::New => {
                            let new_loc = self.loc();
                            let new = self.parse_new_expr(new_loc);
                            e = self.ast.make_expr(loc, ExprKind::DotNew { lhs: e, new });
                        }
                        _ => {
                            let found = self.describe_current();
                            self.error(
                                loc,
                                format!("identifier or `new` expected following `.`, not {found}"),
                            );
                            break;
                        }
                    }
                }
                TokenKind::PlusPlus => {
                    self.advance();
                    e = self.ast.make_expr(loc, ExprKind::PostInc { expr: e });
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    e = self.ast.make_expr(loc, ExprKind::PostDec { expr: e });
                }
                TokenKind::LeftParen => {
                    let args = self.parse_arguments();
                    e = self.ast.make_expr(loc, ExprKind::Call { callee: e, args });
                }
                TokenKind::LeftBracket => {
                    e = self.parse_index_or_slice(e, loc);
                }
                _ => return e,
            }
        }
        e
    }

    fn parse_index_or_slice(&mut self, base: ExprId, loc: Loc) -> ExprId {
        self.advance(); // [
        self.in_brackets += 1;
        let result = if self.kind() == TokenKind::RightBracket {
            self.ast.make_expr(loc.clone(), ExprKind::Slice { base, lwr: None, upr: None })
        } else {
            let first = self.parse_assign_expr();
            if self.kind() == TokenKind::Slice {
                self.advance();
                let upr = self.parse_assign_expr();
                if self.kind() == TokenKind::Comma {
                    // multi-dimensional: the interval is one argument
                    let interval = self.ast.make_expr(
                        loc.clone(),
                        ExprKind::Interval { lwr: first, upr },
                    );
                    let args = self.parse_more_index_args(interval);
                    self.ast.make_expr(loc.clone(), ExprKind::Index { base, args })
                } else {
                    self.ast.make_expr(
                        loc.clone(),
                        ExprKind::Slice { base, lwr: Some(first), upr: Some(upr) },
                    )
                }
            } else {
                let args = self.parse_more_index_args(first);
                self.ast.make_expr(loc.clone(), ExprKind::Index { base, args })
            }
        };
        if self.kind() == TokenKind::Eof {
            self.premature_eof(TokenKind::RightBracket, loc);
        } else {
            self.expect(TokenKind::RightBracket);
        }
        self.in_brackets = self.in_brackets.saturating_sub(1);
        result
    }

    /// Remaining index arguments after the first, each possibly an interval.
    fn parse_more_index_args(&mut self, first: ExprId) -> Vec<ExprId> {
        let mut args = vec![first];
        while self.check(TokenKind::Comma) {
            if self.kind() == TokenKind::RightBracket {
                break;
            }
            let loc = self.loc();
            let e = self.parse_assign_expr();
            if self.check(TokenKind::Slice) {
                let upr = self.parse_assign_expr();
                args.push(self.ast.make_expr(loc, ExprKind::Interval { lwr: e, upr }));
            } else {
                args.push(e);
            }
        }
        args
    }

    /// `( assign-expressions )`, trailing comma allowed.
    pub(crate) fn parse_arguments(&mut self) -> Vec<ExprId> {
        let open = self.loc();
        self.expect(TokenKind::LeftParen);
        let mut args = Vec::new();
        while self.kind() != TokenKind::RightParen {
            if self.kind() == TokenKind::Eof {
                self.premature_eof(TokenKind::RightParen, open);
                return args;
            }
            args.push(self.parse_assign_expr());
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen);
        args
    }

    // —————————————————————————— primary ————————————————————————————

    pub(crate) fn parse_primary_expr(&mut self) -> ExprId {
        let loc = self.loc();
        let kind = self.kind();
        match kind {
            TokenKind::Identifier => {
                // lambda shorthand: `x => e`
                if self.peek_kind(1) == TokenKind::GoesTo {
                    return self.parse_function_literal(loc);
                }
                let ident = match self.current_ident() {
                    Some(ident) => ident,
                    None => {
                        self.advance();
                        return self.error_expr(loc);
                    }
                };
                self.advance();
                if self.kind() == TokenKind::Not
                    && self.peek_kind(1) != TokenKind::Is
                    && self.peek_kind(1) != TokenKind::In
                {
                    let args = self.parse_template_arguments();
                    self.ast.make_expr(loc, ExprKind::ScopeTemplate { ident, args })
                } else {
                    self.ast.make_expr(loc, ExprKind::Ident(ident))
                }
            }
            TokenKind::Dot => {
                // module-scope access `.id`
                self.advance();
                match self.expect_identifier("`.`") {
                    Some(ident) => {
                        let args = if self.kind() == TokenKind::Not
                            && self.peek_kind(1) != TokenKind::Is
                            && self.peek_kind(1) != TokenKind::In
                        {
                            Some(self.parse_template_arguments())
                        } else {
                            None
                        };
                        self.ast.make_expr(loc, ExprKind::ModuleScope { ident, args })
                    }
                    None => self.error_expr(loc),
                }
            }
            TokenKind::Dollar => {
                self.advance();
                self.ast.make_expr(loc, ExprKind::Dollar)
            }
            TokenKind::This => {
                self.advance();
                self.ast.make_expr(loc, ExprKind::This)
            }
            TokenKind::Super => {
                self.advance();
                self.ast.make_expr(loc, ExprKind::Super)
            }
            TokenKind::Null => {
                self.advance();
                self.ast.make_expr(loc, ExprKind::Null)
            }
            TokenKind::True => {
                self.advance();
                self.ast.make_expr(loc, ExprKind::True)
            }
            TokenKind::False => {
                self.advance();
                self.ast.make_expr(loc, ExprKind::False)
            }
            TokenKind::File
            | TokenKind::FileFullPath
            | TokenKind::Line
            | TokenKind::ModuleString
            | TokenKind::FunctionString
            | TokenKind::PrettyFunction => {
                self.advance();
                self.ast.make_expr(loc, ExprKind::SpecialKeyword(kind))
            }
            TokenKind::StringLiteral | TokenKind::HexStringLiteral => {
                self.parse_string_literal_expr(loc)
            }
            k if k.is_literal() => {
                let token = self.token();
                self.advance();
                self.literal_expr(&token, loc)
            }
            k if k.is_basic_type() => {
                // `int.max` property or `int(…)` constructor call
                self.advance();
                let ty = self.ast.make_type(loc.clone(), TypeKind::Basic(k));
                match self.kind() {
                    TokenKind::Dot => {
                        self.advance();
                        match self.expect_identifier("type property access") {
                            Some(ident) => self.ast.make_expr(
                                loc,
                                ExprKind::TypeDotId { ty, ident, args: None },
                            ),
                            None => self.error_expr(loc),
                        }
                    }
                    TokenKind::LeftParen => {
                        let callee = self.ast.make_expr(loc.clone(), ExprKind::TypeRef(ty));
                        let args = self.parse_arguments();
                        self.ast.make_expr(loc, ExprKind::Call { callee, args })
                    }
                    _ => {
                        let found = self.describe_current();
                        self.error_here(format!("found {found} when expecting `.` or `(` after basic type"));
                        self.error_expr(loc)
                    }
                }
            }
            TokenKind::Typeof => {
                let arg = self.parse_typeof();
                let ty = self.ast.make_type(loc.clone(), TypeKind::Typeof { arg, segments: vec![] });
                self.ast.make_expr(loc, ExprKind::TypeRef(ty))
            }
            TokenKind::Vector => {
                self.advance();
                self.expect(TokenKind::LeftParen);
                let base = self.parse_type();
                self.expect(TokenKind::RightParen);
                let ty = self.ast.make_type(loc.clone(), TypeKind::Vector { base });
                self.ast.make_expr(loc, ExprKind::TypeRef(ty))
            }
            TokenKind::Typeid => {
                self.advance();
                self.expect(TokenKind::LeftParen);
                let arg = self.parse_type_or_expression();
                self.expect(TokenKind::RightParen);
                self.ast.make_expr(loc, ExprKind::Typeid { arg })
            }
            TokenKind::Traits => self.parse_traits_expression(),
            TokenKind::Is => self.parse_is_expr(loc),
            TokenKind::Assert => {
                self.advance();
                self.expect(TokenKind::LeftParen);
                let expr = self.parse_assign_expr();
                let msg = if self.check(TokenKind::Comma) {
                    if self.kind() == TokenKind::RightParen {
                        None
                    } else {
                        Some(self.parse_assign_expr())
                    }
                } else {
                    None
                };
                self.expect(TokenKind::RightParen);
                self.ast.make_expr(loc, ExprKind::Assert { expr, msg })
            }
            TokenKind::Mixin => {
                self.advance();
                self.expect(TokenKind::LeftParen);
                let args = self.parse_mixin_arguments();
                self.ast.make_expr(loc, ExprKind::MixinExpr { args })
            }
            TokenKind::Import => {
                self.advance();
                self.expect(TokenKind::LeftParen);
                let expr = self.parse_assign_expr();
                self.expect(TokenKind::RightParen);
                self.ast.make_expr(loc, ExprKind::ImportString { expr })
            }
            TokenKind::New => self.parse_new_expr(loc),
            TokenKind::Function | TokenKind::Delegate | TokenKind::LeftCurly => {
                self.parse_function_literal(loc)
            }
            TokenKind::Ref if self.peek_kind(1) == TokenKind::LeftParen => {
                self.parse_function_literal(loc)
            }
            TokenKind::LeftParen => {
                if self.is_function_literal_start() {
                    return self.parse_function_literal(loc);
                }
                self.advance();
                let e = self.parse_expression();
                if self.kind() == TokenKind::Eof {
                    self.premature_eof(TokenKind::RightParen, loc);
                } else {
                    self.expect(TokenKind::RightParen);
                }
                self.ast.set_parens(e);
                e
            }
            TokenKind::LeftBracket => self.parse_array_literal(loc),
            TokenKind::Const | TokenKind::Immutable | TokenKind::Shared | TokenKind::Inout
                if self.peek_kind(1) == TokenKind::LeftParen =>
            {
                // type constructor in expression position: const(int).max
                let ty = self.parse_basic_type();
                match self.kind() {
                    TokenKind::Dot => {
                        self.advance();
                        match self.expect_identifier("type property access") {
                            Some(ident) => self.ast.make_expr(
                                loc,
                                ExprKind::TypeDotId { ty, ident, args: None },
                            ),
                            None => self.error_expr(loc),
                        }
                    }
                    _ => self.ast.make_expr(loc, ExprKind::TypeRef(ty)),
                }
            }
            _ => {
                let found = self.describe_current();
                self.error(loc.clone(), format!("expression expected, not {found}"));
                // make progress so callers always terminate
                if !matches!(
                    kind,
                    TokenKind::Semicolon
                        | TokenKind::RightParen
                        | TokenKind::RightBracket
                        | TokenKind::RightCurly
                        | TokenKind::Eof
                ) {
                    self.advance();
                }
                self.error_expr(loc)
            }
        }
    }

    /// Adjacent string literals concatenate with a deprecation; postfixes
    /// must match.
    fn parse_string_literal_expr(&mut self, loc: Loc) -> ExprId {
        let token = self.token();
        self.advance();
        let (mut bytes, mut postfix) = match token.value {
            TokenValue::Str { bytes, postfix } => (bytes.to_vec(), postfix),
            _ => (Vec::new(), 0),
        };
        while self.kind().is_string_literal() {
            let next_loc = self.loc();
            self.deprecation(
                next_loc.clone(),
                "implicit string concatenation is deprecated, use `~` instead".to_string(),
            );
            let next = self.token();
            self.advance();
            if let TokenValue::Str { bytes: more, postfix: next_postfix } = next.value {
                if next_postfix != postfix && postfix != 0 && next_postfix != 0 {
                    self.error(
                        next_loc,
                        "mismatched string literal postfixes".to_string(),
                    );
                }
                if postfix == 0 {
                    postfix = next_postfix;
                }
                bytes.extend_from_slice(&more);
            }
        }
        self.ast.make_expr(loc, ExprKind::StringLiteral { bytes: bytes.into(), postfix })
    }

    fn parse_array_literal(&mut self, loc: Loc) -> ExprId {
        self.advance(); // [
        self.in_brackets += 1;
        let mut keys: Vec<ExprId> = Vec::new();
        let mut values: Vec<ExprId> = Vec::new();
        let mut assoc = false;
        while self.kind() != TokenKind::RightBracket {
            if self.kind() == TokenKind::Eof {
                self.premature_eof(TokenKind::RightBracket, loc.clone());
                break;
            }
            let e = self.parse_assign_expr();
            if self.check(TokenKind::Colon) {
                assoc = true;
                keys.push(e);
                values.push(self.parse_assign_expr());
            } else {
                if assoc {
                    self.error_here("associative array literal requires `key : value` entries".to_string());
                }
                values.push(e);
            }
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        if self.kind() != TokenKind::Eof {
            self.expect(TokenKind::RightBracket);
        }
        self.in_brackets = self.in_brackets.saturating_sub(1);
        let kind = if assoc {
            ExprKind::AssocArrayLiteral { keys, values }
        } else {
            ExprKind::ArrayLiteral { elements: values }
        };
        self.ast.make_expr(loc, kind)
    }

    /// `(params) => e`, `(params) { … }` — but not `(expr)`.
    fn is_function_literal_start(&mut self) -> bool {
        let here = self.stream.here();
        match probes::is_parameters(
            &mut self.stream,
            here,
            self.options.allow_alt_syntax,
            self.options.c_style_declarators,
        ) {
            Some(past) => matches!(
                self.stream.kind_at(past),
                TokenKind::GoesTo | TokenKind::LeftCurly
            ),
            None => false,
        }
    }

    /// All five function-literal syntaxes.
    pub(crate) fn parse_function_literal(&mut self, loc: Loc) -> ExprId {
        let mut kind = FuncLiteralKind::Anonymous;
        let mut stc = StorageClass::UNDEFINED;
        let mut ret = None;
        let mut params = None;

        match self.kind() {
            TokenKind::Function | TokenKind::Delegate => {
                kind = if self.kind() == TokenKind::Function {
                    FuncLiteralKind::Function
                } else {
                    FuncLiteralKind::Delegate
                };
                self.advance();
                if self.kind() == TokenKind::Ref {
                    self.advance();
                    stc |= StorageClass::REF;
                }
                if self.kind() != TokenKind::LeftParen
                    && self.kind() != TokenKind::LeftCurly
                    && self.kind() != TokenKind::GoesTo
                {
                    ret = Some(self.parse_type());
                }
            }
            TokenKind::Ref => {
                self.advance();
                stc |= StorageClass::REF;
            }
            _ => {}
        }

        match self.kind() {
            TokenKind::LeftParen => {
                let list = self.parse_parameter_list(true);
                let mut udas = None;
                self.parse_postfix_attributes(&mut stc, &mut udas);
                params = Some(list);
            }
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::GoesTo => {
                // x => e: one untyped parameter
                let ident = self.current_ident();
                let param_loc = self.loc();
                self.advance();
                params = Some(dfront_ast::ParameterList {
                    params: vec![dfront_ast::Parameter {
                        loc: param_loc,
                        stc: StorageClass::UNDEFINED,
                        udas: None,
                        ty: None,
                        ident,
                        default_value: None,
                    }],
                    varargs: dfront_ast::VarArg::None,
                });
            }
            _ => {}
        }

        let body = if self.check(TokenKind::GoesTo) {
            let body_loc = self.loc();
            let expr = self.parse_assign_expr();
            self.ast.make_stmt(body_loc, StmtKind::Return { expr: Some(expr) })
        } else if self.kind() == TokenKind::LeftCurly {
            self.parse_block_statement()
        } else {
            let found = self.describe_current();
            self.error_here(format!("function literal body expected, not {found}"));
            let body_loc = self.loc();
            self.error_stmt(body_loc)
        };

        let decl = self.ast.make_decl(
            loc.clone(),
            DeclKind::FuncLiteral { kind, params, ret, stc, body },
        );
        self.ast.make_expr(loc, ExprKind::FuncLiteral { decl })
    }

    // ————————————————————————— is(…) ———————————————————————————————

    /// The `is (…)` state machine: start → seen-type → seen-colon-or-eq →
    /// seen-spec.
    fn parse_is_expr(&mut self, loc: Loc) -> ExprId {
        self.advance(); // is
        if !self.expect(TokenKind::LeftParen) {
            return self.error_expr(loc);
        }
        let ty = self.parse_type();
        let ident = if self.kind() == TokenKind::Identifier {
            let ident = self.current_ident();
            self.advance();
            ident
        } else {
            None
        };

        let mut spec = None;
        let mut spec_type = None;
        let mut spec_keyword = None;
        let mut spec_arg_types = false;
        let mut params = Vec::new();

        if self.kind() == TokenKind::Colon || self.kind() == TokenKind::Equal {
            spec = Some(if self.kind() == TokenKind::Colon { IsSpec::Colon } else { IsSpec::Equal });
            self.advance();
            match self.kind() {
                // category keywords
                TokenKind::Struct
                | TokenKind::Union
                | TokenKind::Class
                | TokenKind::Super
                | TokenKind::Enum
                | TokenKind::Interface
                | TokenKind::Package
                | TokenKind::Module
                | TokenKind::ParametersSpec => {
                    spec_keyword = Some(self.kind());
                    self.advance();
                }
                // qualifier keywords only when the spec ends right after
                TokenKind::Const | TokenKind::Immutable | TokenKind::Shared | TokenKind::Inout
                    if matches!(self.peek_kind(1), TokenKind::RightParen | TokenKind::Comma) =>
                {
                    spec_keyword = Some(self.kind());
                    self.advance();
                }
                TokenKind::Function | TokenKind::Delegate | TokenKind::Return | TokenKind::Vector
                    if matches!(self.peek_kind(1), TokenKind::RightParen | TokenKind::Comma) =>
                {
                    spec_keyword = Some(self.kind());
                    self.advance();
                }
                TokenKind::Identifier
                    if self.current_ident() == Some(dfront_ident::well_known::ARG_TYPES) =>
                {
                    spec_arg_types = true;
                    self.advance();
                }
                _ => spec_type = Some(self.parse_type()),
            }
            if self.check(TokenKind::Comma) {
                params = self.parse_template_parameter_list_body(TokenKind::RightParen);
            }
        }

        if self.kind() == TokenKind::Eof {
            self.premature_eof(TokenKind::RightParen, loc.clone());
        } else {
            self.expect(TokenKind::RightParen);
        }
        self.ast.make_expr(
            loc,
            ExprKind::Is { ty, ident, spec, spec_type, spec_keyword, spec_arg_types, params },
        )
    }

    // ————————————————————————— __traits ————————————————————————————

    /// `__traits ( identifier , args… )`.
    pub(crate) fn parse_traits_expression(&mut self) -> ExprId {
        let loc = self.loc();
        self.advance(); // __traits
        if !self.expect(TokenKind::LeftParen) {
            return self.error_expr(loc);
        }
        let Some(ident) = self.expect_identifier("`__traits (`") else {
            self.resync_to_close_paren();
            return self.error_expr(loc);
        };
        let mut args = Vec::new();
        while self.check(TokenKind::Comma) {
            if self.kind() == TokenKind::RightParen {
                break;
            }
            args.push(self.parse_type_or_expression());
        }
        self.expect(TokenKind::RightParen);
        self.ast.make_expr(loc, ExprKind::Traits { ident, args })
    }

    // ————————————————————————— template params used by is() ————————

    /// Comma-separated template parameters up to (not consuming) `closer`.
    pub(crate) fn parse_template_parameter_list_body(
        &mut self,
        closer: TokenKind,
    ) -> Vec<TemplateParam> {
        let mut params = Vec::new();
        while self.kind() != closer && self.kind() != TokenKind::Eof {
            match self.parse_template_parameter() {
                Some(param) => params.push(param),
                None => break,
            }
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        params
    }

    /// One template parameter: type, this, value, alias or tuple.
    pub(crate) fn parse_template_parameter(&mut self) -> Option<TemplateParam> {
        match self.kind() {
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::DotDotDot => {
                let ident = self.current_ident()?;
                self.advance();
                self.advance();
                Some(TemplateParam::Tuple { ident })
            }
            TokenKind::Identifier
                if matches!(
                    self.peek_kind(1),
                    TokenKind::Comma
                        | TokenKind::RightParen
                        | TokenKind::Colon
                        | TokenKind::Assign
                ) =>
            {
                let ident = self.current_ident()?;
                self.advance();
                let spec = if self.check(TokenKind::Colon) {
                    Some(self.parse_type())
                } else {
                    None
                };
                let default = if self.check(TokenKind::Assign) {
                    Some(self.parse_type())
                } else {
                    None
                };
                Some(TemplateParam::Type { ident, spec, default })
            }
            TokenKind::This => {
                self.advance();
                let ident = self.expect_identifier("`this`")?;
                let spec = if self.check(TokenKind::Colon) {
                    Some(self.parse_type())
                } else {
                    None
                };
                let default = if self.check(TokenKind::Assign) {
                    Some(self.parse_type())
                } else {
                    None
                };
                Some(TemplateParam::This { ident, spec, default })
            }
            TokenKind::Alias => {
                self.advance();
                // optional constraining type before the identifier
                let mut ty = None;
                let ident = if self.kind() == TokenKind::Identifier
                    && matches!(
                        self.peek_kind(1),
                        TokenKind::Comma
                            | TokenKind::RightParen
                            | TokenKind::Colon
                            | TokenKind::Assign
                    ) {
                    let ident = self.current_ident()?;
                    self.advance();
                    ident
                } else {
                    ty = Some(self.parse_type());
                    self.expect_identifier("template alias parameter type")?
                };
                let spec = if self.check(TokenKind::Colon) {
                    Some(self.parse_type_or_expression())
                } else {
                    None
                };
                let default = if self.check(TokenKind::Assign) {
                    Some(self.parse_type_or_expression())
                } else {
                    None
                };
                Some(TemplateParam::Alias { ident, ty, spec, default })
            }
            _ => {
                // value parameter: Type identifier [: spec] [= default]
                let ty = self.parse_type();
                let ident = match self.expect_identifier("template value parameter type") {
                    Some(ident) => ident,
                    None => {
                        // resync within the parameter list
                        while !matches!(
                            self.kind(),
                            TokenKind::Comma
                                | TokenKind::RightParen
                                | TokenKind::Eof
                                | TokenKind::Semicolon
                        ) {
                            self.advance();
                        }
                        return None;
                    }
                };
                let spec = if self.check(TokenKind::Colon) {
                    Some(self.parse_cond_expr())
                } else {
                    None
                };
                let default = if self.check(TokenKind::Assign) {
                    Some(self.parse_assign_expr())
                } else {
                    None
                };
                Some(TemplateParam::Value { ident, ty, spec, default })
            }
        }
    }
}
