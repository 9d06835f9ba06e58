//! Type parsing: basic types, type constructors, suffixes, declarators and
//! template argument lists.

use dfront_ast::{
    ExprKind, Linkage, StorageClass, TemplateParam, TypeId, TypeKind, TypeOrExpr, TypeSeg,
    TypeofArg,
};
use dfront_diagnostics::DiagnosticHandler;
use dfront_ident::Ident;
use dfront_token::{TokenKind, TokenValue};

use crate::parser::Parser;
use crate::probes::{self, NeedDeclaratorId};

/// Result of folding one declarator over a shared base type.
pub(crate) struct Declarator {
    pub ty: TypeId,
    pub ident: Option<Ident>,
    pub tpl_params: Option<Vec<TemplateParam>>,
    /// Postfix UDAs collected after the parameter list (`void f() @uda`).
    pub udas: Option<Vec<dfront_ast::ExprId>>,
}

impl<'a, H: DiagnosticHandler> Parser<'a, H> {
    /// Parse a full type: leading qualifiers, basic type, suffixes. No
    /// declared identifier is allowed here.
    pub(crate) fn parse_type(&mut self) -> TypeId {
        if !self.enter() {
            let loc = self.loc();
            self.leave();
            return self.error_type(loc);
        }
        let mut quals: Vec<TokenKind> = Vec::new();
        loop {
            let kind = self.kind();
            match kind {
                TokenKind::Const | TokenKind::Immutable | TokenKind::Shared | TokenKind::Inout
                    if self.peek_kind(1) != TokenKind::LeftParen =>
                {
                    quals.push(kind);
                    self.advance();
                }
                _ => break,
            }
        }
        let base = self.parse_basic_type();
        let mut ty = self.parse_type_suffixes(base);
        if self.kind() == TokenKind::Identifier {
            let found = self.describe_current();
            self.error_here(format!("unexpected identifier {found} in type"));
            self.advance();
        }
        for &qual in quals.iter().rev() {
            let loc = self.ast.ty(ty).loc.clone();
            ty = self.apply_qualifier(qual, ty, loc);
        }
        self.leave();
        ty
    }

    fn apply_qualifier(&mut self, qual: TokenKind, next: TypeId, loc: dfront_location::Loc) -> TypeId {
        let kind = match qual {
            TokenKind::Const => TypeKind::Const { next },
            TokenKind::Immutable => TypeKind::Immutable { next },
            TokenKind::Shared => TypeKind::Shared { next },
            _ => TypeKind::Wild { next },
        };
        self.ast.make_type(loc, kind)
    }

    /// The type prefix: builtin, qualified identifier, `typeof`, `__vector`,
    /// `__traits`, `mixin`, or a parenthesised type constructor.
    pub(crate) fn parse_basic_type(&mut self) -> TypeId {
        let loc = self.loc();
        let kind = self.kind();
        match kind {
            k if k.is_basic_type() => {
                self.advance();
                self.ast.make_type(loc, TypeKind::Basic(k))
            }
            TokenKind::Identifier => {
                let segments = self.parse_type_segments();
                self.ast.make_type(loc, TypeKind::Qualified { leading_dot: false, segments })
            }
            TokenKind::Dot => {
                self.advance();
                let segments = self.parse_type_segments();
                self.ast.make_type(loc, TypeKind::Qualified { leading_dot: true, segments })
            }
            TokenKind::Typeof => {
                let arg = self.parse_typeof();
                let segments = if self.kind() == TokenKind::Dot && self.peek_kind(1) == TokenKind::Identifier
                {
                    self.advance();
                    self.parse_type_segments()
                } else {
                    Vec::new()
                };
                self.ast.make_type(loc, TypeKind::Typeof { arg, segments })
            }
            TokenKind::Vector => {
                self.advance();
                self.expect(TokenKind::LeftParen);
                let base = self.parse_type();
                self.expect(TokenKind::RightParen);
                self.ast.make_type(loc, TypeKind::Vector { base })
            }
            TokenKind::Traits => {
                let expr = self.parse_traits_expression();
                self.ast.make_type(loc, TypeKind::TraitsType { expr })
            }
            TokenKind::Mixin => {
                self.advance();
                self.expect(TokenKind::LeftParen);
                let args = self.parse_mixin_arguments();
                self.ast.make_type(loc, TypeKind::MixinType { args })
            }
            TokenKind::Const | TokenKind::Immutable | TokenKind::Shared | TokenKind::Inout => {
                // type constructor with parens: const(T)
                self.advance();
                self.expect(TokenKind::LeftParen);
                let inner = self.parse_type();
                self.expect(TokenKind::RightParen);
                self.apply_qualifier(kind, inner, loc)
            }
            _ => {
                let found = self.describe_current();
                self.error(loc.clone(), format!("basic type expected, not {found}"));
                self.error_type(loc)
            }
        }
    }

    /// `id[!(args)] ( . id[!(args)] )*`
    fn parse_type_segments(&mut self) -> Vec<TypeSeg> {
        let mut segments = Vec::new();
        loop {
            let ident = match self.expect_identifier("type name") {
                Some(ident) => ident,
                None => break,
            };
            let args = if self.kind() == TokenKind::Not
                && self.peek_kind(1) != TokenKind::Is
                && self.peek_kind(1) != TokenKind::In
            {
                Some(self.parse_template_arguments())
            } else {
                None
            };
            segments.push(TypeSeg { ident, args });
            if self.kind() == TokenKind::Dot && self.peek_kind(1) == TokenKind::Identifier {
                self.advance();
            } else {
                break;
            }
        }
        segments
    }

    /// `typeof ( return )` or `typeof ( expression )`.
    pub(crate) fn parse_typeof(&mut self) -> TypeofArg {
        self.advance(); // typeof
        self.expect(TokenKind::LeftParen);
        let arg = if self.kind() == TokenKind::Return {
            self.advance();
            TypeofArg::Return
        } else {
            TypeofArg::Expr(self.parse_expression())
        };
        self.expect(TokenKind::RightParen);
        arg
    }

    /// Pointer, array, function and delegate suffixes on a base type.
    pub(crate) fn parse_type_suffixes(&mut self, base: TypeId) -> TypeId {
        let mut ty = base;
        loop {
            let loc = self.loc();
            match self.kind() {
                TokenKind::Mul => {
                    self.advance();
                    ty = self.ast.make_type(loc, TypeKind::Pointer { next: ty });
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    ty = self.parse_array_suffix(ty, loc);
                }
                TokenKind::Delegate | TokenKind::Function => {
                    let is_delegate = self.kind() == TokenKind::Delegate;
                    self.advance();
                    let params = self.parse_parameter_list(false);
                    let mut stc = StorageClass::UNDEFINED;
                    let mut udas = None;
                    self.parse_postfix_attributes(&mut stc, &mut udas);
                    if udas.is_some() {
                        self.error(
                            loc.clone(),
                            "user-defined attributes cannot be applied to a function type"
                                .to_string(),
                        );
                    }
                    if is_delegate {
                        let kind = TypeKind::DelegateType {
                            ret: Some(ty),
                            params,
                            stc,
                            linkage: self.linkage.clone(),
                        };
                        ty = self.ast.make_type(loc, kind);
                    } else {
                        // a `function` suffix denotes a *pointer* to function,
                        // which is what tells `int function() fp;` apart from
                        // a function declaration
                        let kind = TypeKind::FunctionType {
                            ret: Some(ty),
                            params,
                            stc,
                            linkage: self.linkage.clone(),
                        };
                        let fn_ty = self.ast.make_type(loc.clone(), kind);
                        ty = self.ast.make_type(loc, TypeKind::Pointer { next: fn_ty });
                    }
                }
                _ => return ty,
            }
        }
    }

    /// After a consumed `[`: `]`, `[Type]`, `[expr]` or `[lwr .. upr]`.
    fn parse_array_suffix(&mut self, base: TypeId, loc: dfront_location::Loc) -> TypeId {
        if self.check(TokenKind::RightBracket) {
            return self.ast.make_type(loc, TypeKind::DArray { next: base });
        }
        let here = self.stream.here();
        let is_key_type = probes::is_declaration(
            &mut self.stream,
            here,
            NeedDeclaratorId::No,
            Some(TokenKind::RightBracket),
            self.options.allow_alt_syntax,
            self.options.c_style_declarators,
        )
        .is_some();
        let kind = if is_key_type {
            let key = self.parse_type();
            TypeKind::AArray { next: base, key }
        } else {
            let dim = self.parse_assign_expr();
            if self.check(TokenKind::Slice) {
                let upr = self.parse_assign_expr();
                TypeKind::SliceType { next: base, lwr: dim, upr }
            } else {
                TypeKind::SArray { next: base, dim }
            }
        };
        if self.kind() == TokenKind::Eof {
            self.premature_eof(TokenKind::RightBracket, loc.clone());
        } else {
            self.expect(TokenKind::RightBracket);
        }
        self.ast.make_type(loc, kind)
    }

    /// Fold one declarator over the shared base type: type suffixes, the
    /// declared identifier, then template/function parameter suffixes and
    /// member function attributes.
    pub(crate) fn parse_declarator(&mut self, base: TypeId) -> Declarator {
        let mut ty = self.parse_type_suffixes(base);
        let mut ident = None;
        let mut tpl_params = None;
        let mut udas = None;

        match self.kind() {
            TokenKind::Identifier => {
                ident = self.current_ident();
                self.advance();
            }
            TokenKind::LeftParen if self.options.allow_alt_syntax => {
                // parenthesised sub-declarator `int (*fp)(…)`
                let loc = self.loc();
                self.deprecation(
                    loc,
                    "parenthesised declarators are an alternate syntax; prefer D style"
                        .to_string(),
                );
                self.advance();
                let inner = self.parse_declarator(ty);
                ty = inner.ty;
                ident = inner.ident;
                self.expect(TokenKind::RightParen);
            }
            _ => {}
        }

        loop {
            match self.kind() {
                TokenKind::LeftParen => {
                    let here = self.stream.here();
                    let past = self.stream.peek_past_paren(here);
                    if self.stream.kind_at(past) == TokenKind::LeftParen {
                        tpl_params = Some(self.parse_template_parameter_list());
                    }
                    let params = self.parse_parameter_list(tpl_params.is_some());
                    let mut stc = StorageClass::UNDEFINED;
                    self.parse_postfix_attributes(&mut stc, &mut udas);
                    let loc = self.ast.ty(ty).loc.clone();
                    ty = self.ast.make_type(
                        loc,
                        TypeKind::FunctionType {
                            ret: Some(ty),
                            params,
                            stc,
                            linkage: self.linkage.clone(),
                        },
                    );
                    break;
                }
                TokenKind::LeftBracket if ident.is_some() => {
                    // C-style array declarator
                    let loc = self.loc();
                    self.error(
                        loc.clone(),
                        "instead of C-style syntax, use D-style `Type[] name`".to_string(),
                    );
                    self.advance();
                    ty = self.parse_array_suffix(ty, loc);
                }
                _ => break,
            }
        }

        Declarator { ty, ident, tpl_params, udas }
    }

    /// Member-function postfix attributes: `const`, `nothrow`, `pure`,
    /// `@safe`, `return`, `scope`, UDAs and friends.
    pub(crate) fn parse_postfix_attributes(
        &mut self,
        stc: &mut StorageClass,
        udas: &mut Option<Vec<dfront_ast::ExprId>>,
    ) {
        loop {
            let loc = self.loc();
            let bit = match self.kind() {
                TokenKind::Const => StorageClass::CONST,
                TokenKind::Immutable => StorageClass::IMMUTABLE,
                TokenKind::Shared => StorageClass::SHARED,
                TokenKind::Inout => StorageClass::WILD,
                TokenKind::Nothrow => StorageClass::NOTHROW,
                TokenKind::Pure => StorageClass::PURE,
                TokenKind::Return => StorageClass::RETURN,
                TokenKind::Scope => StorageClass::SCOPE,
                TokenKind::At => {
                    if let Some(attr_stc) = self.parse_at_attribute(udas) {
                        *stc = self.append_storage_class(*stc, attr_stc, loc);
                    }
                    continue;
                }
                _ => return,
            };
            // `const(` here would be a type constructor, never an attribute
            if self.peek_kind(1) == TokenKind::LeftParen
                && matches!(
                    self.kind(),
                    TokenKind::Const | TokenKind::Immutable | TokenKind::Shared | TokenKind::Inout
                )
            {
                return;
            }
            self.advance();
            *stc = self.append_storage_class(*stc, bit, loc);
        }
    }

    // ————————————————————— template arguments ——————————————————————

    /// `!(args)` or `!single`, cursor on `!`.
    pub(crate) fn parse_template_arguments(&mut self) -> Vec<TypeOrExpr> {
        self.advance(); // !
        let args = if self.kind() == TokenKind::LeftParen {
            self.advance();
            let args = self.parse_template_argument_list(TokenKind::RightParen);
            self.expect(TokenKind::RightParen);
            args
        } else {
            vec![self.parse_template_single_argument()]
        };
        // a!b!c is not chainable
        if self.kind() == TokenKind::Not
            && self.peek_kind(1) != TokenKind::Is
            && self.peek_kind(1) != TokenKind::In
        {
            self.error_here("multiple ! arguments are not allowed".to_string());
            let _ = self.parse_template_arguments();
        }
        args
    }

    /// Comma-separated template arguments up to (not consuming) `closer`.
    pub(crate) fn parse_template_argument_list(&mut self, closer: TokenKind) -> Vec<TypeOrExpr> {
        let mut args = Vec::new();
        if self.kind() == closer {
            return args;
        }
        loop {
            args.push(self.parse_type_or_expression());
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        args
    }

    /// One template argument: a type when the probe says so, otherwise an
    /// assign expression.
    pub(crate) fn parse_type_or_expression(&mut self) -> TypeOrExpr {
        let here = self.stream.here();
        let is_type = probes::is_declaration(
            &mut self.stream,
            here,
            NeedDeclaratorId::No,
            None,
            self.options.allow_alt_syntax,
            self.options.c_style_declarators,
        )
        .is_some();
        if is_type {
            TypeOrExpr::Type(self.parse_type())
        } else {
            TypeOrExpr::Expr(self.parse_assign_expr())
        }
    }

    /// The single-token form after `!`: identifier, basic type, or literal.
    fn parse_template_single_argument(&mut self) -> TypeOrExpr {
        let loc = self.loc();
        let token = self.token();
        let kind = token.kind;
        match kind {
            TokenKind::Identifier => {
                self.advance();
                let ident = token.ident();
                match ident {
                    Some(ident) => {
                        let segments = vec![TypeSeg { ident, args: None }];
                        TypeOrExpr::Type(self.ast.make_type(
                            loc,
                            TypeKind::Qualified { leading_dot: false, segments },
                        ))
                    }
                    None => TypeOrExpr::Expr(self.error_expr(loc)),
                }
            }
            k if k.is_basic_type() => {
                self.advance();
                TypeOrExpr::Type(self.ast.make_type(loc, TypeKind::Basic(k)))
            }
            k if k.is_literal() => {
                self.advance();
                TypeOrExpr::Expr(self.literal_expr(&token, loc))
            }
            TokenKind::True => {
                self.advance();
                TypeOrExpr::Expr(self.ast.make_expr(loc, ExprKind::True))
            }
            TokenKind::False => {
                self.advance();
                TypeOrExpr::Expr(self.ast.make_expr(loc, ExprKind::False))
            }
            TokenKind::Null => {
                self.advance();
                TypeOrExpr::Expr(self.ast.make_expr(loc, ExprKind::Null))
            }
            TokenKind::This => {
                self.advance();
                TypeOrExpr::Expr(self.ast.make_expr(loc, ExprKind::This))
            }
            TokenKind::File
            | TokenKind::FileFullPath
            | TokenKind::Line
            | TokenKind::ModuleString
            | TokenKind::FunctionString
            | TokenKind::PrettyFunction => {
                self.advance();
                TypeOrExpr::Expr(self.ast.make_expr(loc, ExprKind::SpecialKeyword(kind)))
            }
            _ => {
                let found = self.describe_current();
                self.error(loc.clone(), format!("template argument expected following `!`, not {found}"));
                TypeOrExpr::Expr(self.error_expr(loc))
            }
        }
    }

    /// Literal token to literal expression.
    pub(crate) fn literal_expr(&mut self, token: &dfront_token::Token, loc: dfront_location::Loc) -> dfront_ast::ExprId {
        let kind = token.kind;
        match &token.value {
            TokenValue::Int(value) if kind.is_integer_literal() => {
                self.ast.make_expr(loc, ExprKind::IntLiteral { value: *value, kind })
            }
            TokenValue::Int(value) => {
                self.ast.make_expr(loc, ExprKind::CharLiteral { value: *value as u32, kind })
            }
            TokenValue::Float(value) => {
                self.ast.make_expr(loc, ExprKind::FloatLiteral { value: *value, kind })
            }
            TokenValue::Str { bytes, postfix } => self.ast.make_expr(
                loc,
                ExprKind::StringLiteral { bytes: bytes.clone(), postfix: *postfix },
            ),
            _ => self.error_expr(loc),
        }
    }

    // ————————————————————— mixin arguments ——————————————————————————

    /// Arguments of `mixin(…)`; cursor just past the `(`. Consumes `)`.
    pub(crate) fn parse_mixin_arguments(&mut self) -> Vec<TypeOrExpr> {
        let args = self.parse_template_argument_list(TokenKind::RightParen);
        if args.is_empty() {
            self.error_here("mixin requires at least one argument".to_string());
        }
        self.expect(TokenKind::RightParen);
        args
    }

    // ————————————————————— linkage specification ———————————————————

    /// The inside of `extern ( … )`, cursor just past `(`. Consumes `)`.
    pub(crate) fn parse_linkage(
        &mut self,
    ) -> (Linkage, dfront_ast::CppMangle, Option<Vec<Ident>>, Option<Vec<dfront_ast::ExprId>>) {
        use dfront_ident::well_known as wk;
        let mut cpp_mangle = dfront_ast::CppMangle::Default;
        let mut namespaces: Option<Vec<Ident>> = None;
        let mut namespace_exprs: Option<Vec<dfront_ast::ExprId>> = None;

        if self.kind() == TokenKind::RightParen {
            self.advance();
            return (Linkage::D, cpp_mangle, namespaces, namespace_exprs);
        }
        let Some(ident) = self.expect_identifier("`extern (`") else {
            self.resync_to_close_paren();
            return (Linkage::Default, cpp_mangle, namespaces, namespace_exprs);
        };
        let linkage = if ident == wk::D {
            Linkage::D
        } else if ident == wk::C {
            if self.kind() == TokenKind::PlusPlus {
                self.advance();
                // optional mangling directive or namespace list
                while self.check(TokenKind::Comma) {
                    match self.kind() {
                        TokenKind::Struct => {
                            self.advance();
                            cpp_mangle = dfront_ast::CppMangle::AsStruct;
                        }
                        TokenKind::Class => {
                            self.advance();
                            cpp_mangle = dfront_ast::CppMangle::AsClass;
                        }
                        TokenKind::Identifier => {
                            let list = namespaces.get_or_insert_with(Vec::new);
                            if let Some(ns) = self.current_ident() {
                                list.push(ns);
                            }
                            self.advance();
                            while self.check(TokenKind::Dot) {
                                match self.expect_identifier("`.`") {
                                    Some(ns) => list.push(ns),
                                    None => break,
                                }
                            }
                        }
                        _ => {
                            // namespace given by constant expressions
                            let list = namespace_exprs.get_or_insert_with(Vec::new);
                            list.push(self.parse_cond_expr());
                        }
                    }
                }
                Linkage::Cpp
            } else {
                Linkage::C
            }
        } else if ident == wk::WINDOWS {
            Linkage::Windows
        } else if ident == wk::PASCAL {
            Linkage::Pascal
        } else if ident == wk::SYSTEM_LINKAGE {
            Linkage::System
        } else if ident == wk::OBJECTIVE {
            if self.check(TokenKind::Min) {
                match self.expect_identifier("`Objective-`") {
                    Some(c) if c == wk::C => {}
                    _ => self.error_here("`Objective-C` expected".to_string()),
                }
            } else {
                self.error_here("`Objective-C` expected".to_string());
            }
            Linkage::ObjectiveC
        } else {
            let name = self.stream.name(ident);
            self.error_here(format!(
                "valid linkage identifiers are `D`, `C`, `C++`, `Objective-C`, `Windows`, `Pascal`, `System`, not `{name}`"
            ));
            Linkage::Default
        };
        self.expect(TokenKind::RightParen);
        (linkage, cpp_mangle, namespaces, namespace_exprs)
    }

    pub(crate) fn resync_to_close_paren(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Semicolon | TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }
}
