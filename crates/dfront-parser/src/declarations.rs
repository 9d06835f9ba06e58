//! Declaration parsing: the decl-def dispatch loop, attribute threading,
//! aggregates, templates, enums, imports, declarator folding, contracts and
//! parameter lists.

use dfront_ast::{
    AggregateKind, AliasTarget, Condition, Contract, Contracts, DeclId, DeclKind, EnsureContract,
    EnumMember, ExprId, ImportItem, Parameter, ParameterList, StmtId, StorageClass, TemplateParam,
    TypeKind, VarArg,
};
use dfront_diagnostics::DiagnosticHandler;
use dfront_location::Loc;
use dfront_token::TokenKind;

use crate::parser::{Parser, PrefixAttributes};
use tracing::trace;

impl<'a, H: DiagnosticHandler> Parser<'a, H> {
    /// The declaration-definition loop: parse until `terminator` (which is
    /// left unconsumed) or end of file.
    pub(crate) fn parse_decl_defs_until(&mut self, terminator: TokenKind) -> Vec<DeclId> {
        let mut decls = Vec::new();
        loop {
            match self.kind() {
                k if k == terminator => return decls,
                TokenKind::Eof => return decls,
                TokenKind::RightCurly => return decls,
                _ => {}
            }
            let mut attrs = PrefixAttributes { comment: self.take_doc(), ..Default::default() };
            match self.parse_decl_def(&mut attrs) {
                Some(mut produced) => decls.append(&mut produced),
                None => return decls,
            }
        }
    }

    /// One DeclDef. `None` means the caller's terminator was reached.
    pub(crate) fn parse_decl_def(&mut self, attrs: &mut PrefixAttributes) -> Option<Vec<DeclId>> {
        if !self.enter() {
            let loc = self.loc();
            if !matches!(self.kind(), TokenKind::RightCurly | TokenKind::Eof) {
                self.advance();
            }
            self.leave();
            return Some(vec![self.error_decl(loc)]);
        }
        let result = self.parse_decl_def_inner(attrs);
        self.leave();
        result
    }

    fn parse_decl_def_inner(&mut self, attrs: &mut PrefixAttributes) -> Option<Vec<DeclId>> {
        use TokenKind::*;
        trace!(
            kind = ?self.kind(),
            linkage = ?self.linkage,
            cpp_mangle = ?self.cpp_mangle,
            "parse_decl_def"
        );
        let kind = self.kind();
        let produced: Vec<DeclId> = match kind {
            RightCurly | Eof => return None,
            Semicolon => {
                self.advance();
                Vec::new()
            }
            Enum => {
                if self.is_enum_declaration() {
                    vec![self.parse_enum(attrs)]
                } else {
                    self.parse_storage_class_chain(attrs)
                }
            }
            Import => vec![self.parse_import(false, attrs)],
            Template => vec![self.parse_template_decl(false, attrs)],
            Mixin => match self.peek_kind(1) {
                LeftParen => {
                    let loc = self.loc();
                    self.advance();
                    self.expect(LeftParen);
                    let args = self.parse_mixin_arguments();
                    self.expect(Semicolon);
                    vec![self.ast.make_decl(loc, DeclKind::MixinDecl { args })]
                }
                Template => {
                    self.advance();
                    vec![self.parse_template_decl(true, attrs)]
                }
                _ => vec![self.parse_template_mixin(attrs)],
            },
            Struct | Union | Class | Interface => vec![self.parse_aggregate(attrs)],
            This => vec![self.parse_ctor(attrs)],
            Tilde if self.peek_kind(1) == This => vec![self.parse_dtor(attrs)],
            Invariant => vec![self.parse_invariant(attrs)],
            Unittest => vec![self.parse_unittest(attrs)],
            New => vec![self.parse_new_decl(attrs)],
            Static => match self.peek_kind(1) {
                This => {
                    self.advance();
                    vec![self.parse_static_ctor(false, attrs)]
                }
                Tilde if self.peek_kind(2) == This => {
                    self.advance();
                    vec![self.parse_static_dtor(false, attrs)]
                }
                Assert => {
                    self.advance();
                    vec![self.parse_static_assert()]
                }
                If => {
                    self.advance();
                    let cond = self.static_if_condition();
                    vec![self.parse_conditional_decl_with(cond)]
                }
                Foreach | ForeachReverse => {
                    self.advance();
                    vec![self.parse_static_foreach_decl(attrs)]
                }
                Import => {
                    self.advance();
                    vec![self.parse_import(true, attrs)]
                }
                _ => self.parse_storage_class_chain(attrs),
            },
            Shared => match (self.peek_kind(1), self.peek_kind(2)) {
                (Static, This) => {
                    self.advance();
                    self.advance();
                    vec![self.parse_static_ctor(true, attrs)]
                }
                (Static, Tilde) if self.peek_kind(3) == This => {
                    self.advance();
                    self.advance();
                    vec![self.parse_static_dtor(true, attrs)]
                }
                (LeftParen, _) => {
                    let (decls, residual) = self.parse_declarations(std::mem::take(attrs));
                    *attrs = residual;
                    decls
                }
                _ => self.parse_storage_class_chain(attrs),
            },
            Const | Immutable | Inout if self.peek_kind(1) == LeftParen => {
                let (decls, residual) = self.parse_declarations(std::mem::take(attrs));
                *attrs = residual;
                decls
            }
            Const | Immutable | Inout | Final | Auto | Scope | Override | Abstract
            | Synchronized | Nothrow | Pure | Ref | Gshared | At | Deprecated => {
                self.parse_storage_class_chain(attrs)
            }
            Extern => {
                if self.peek_kind(1) == LeftParen {
                    vec![self.parse_linkage_decl(attrs)]
                } else {
                    self.parse_storage_class_chain(attrs)
                }
            }
            Private | Package | Protected | Public | Export => {
                vec![self.parse_protection_decl(attrs)]
            }
            Align => vec![self.parse_align_decl(attrs)],
            Pragma => vec![self.parse_pragma_decl(attrs)],
            Debug => {
                if self.peek_kind(1) == Assign {
                    vec![self.parse_version_symbol(true)]
                } else {
                    self.advance();
                    let cond = self.parse_debug_condition();
                    vec![self.parse_conditional_decl_with(cond)]
                }
            }
            Version => {
                if self.peek_kind(1) == Assign {
                    vec![self.parse_version_symbol(false)]
                } else {
                    self.advance();
                    let cond = self.parse_version_condition();
                    vec![self.parse_conditional_decl_with(cond)]
                }
            }
            LeftBracket => {
                // legacy [attribute] sugar
                let loc = self.loc();
                self.error(
                    loc,
                    "use `@(attributes)` instead of `[attributes]`".to_string(),
                );
                self.advance();
                let mut udas = Vec::new();
                while self.kind() != RightBracket && self.kind() != Eof {
                    udas.push(self.parse_assign_expr());
                    if !self.check(Comma) {
                        break;
                    }
                }
                self.expect(RightBracket);
                attrs.udas.get_or_insert_with(Vec::new).extend(udas);
                return self.parse_decl_def(attrs);
            }
            Alias | Typeof | Identifier | Dot | Traits | Vector => {
                let (decls, residual) = self.parse_declarations(std::mem::take(attrs));
                *attrs = residual;
                decls
            }
            k if k.is_basic_type() => {
                let (decls, residual) = self.parse_declarations(std::mem::take(attrs));
                *attrs = residual;
                decls
            }
            _ => {
                let found = self.describe_current();
                self.error_here(format!("declaration expected, not {found}"));
                self.resync_semicolon();
                Vec::new()
            }
        };
        let produced = self.apply_residual_attributes(produced, attrs);
        if let Some(&first) = produced.first() {
            self.ast.set_doc(first, attrs.comment.take());
        }
        Some(produced)
    }

    /// Wrap whatever attribute pieces no inner consumer claimed.
    fn apply_residual_attributes(
        &mut self,
        decls: Vec<DeclId>,
        attrs: &mut PrefixAttributes,
    ) -> Vec<DeclId> {
        let mut decls = decls;
        if !attrs.stc.is_empty() && !decls.is_empty() {
            let loc = self.ast.decl(decls[0]).loc.clone();
            let stc = std::mem::take(&mut attrs.stc);
            decls = vec![self.ast.make_decl(loc, DeclKind::StorageClassDecl { stc, decls })];
        }
        if let Some(udas) = attrs.udas.take() {
            if !decls.is_empty() {
                let loc = self.ast.decl(decls[0]).loc.clone();
                decls =
                    vec![self.ast.make_decl(loc, DeclKind::UserAttributeDecl { attrs: udas, decls })];
            }
        }
        if let Some(msg) = attrs.deprecated_msg.take() {
            if !decls.is_empty() {
                let loc = self.ast.decl(decls[0]).loc.clone();
                decls = vec![
                    self.ast.make_decl(loc, DeclKind::DeprecatedDecl { msg: Some(msg), decls }),
                ];
            }
        }
        decls
    }

    /// `{ decls }`, `:` rest-of-scope, or a single declaration.
    pub(crate) fn parse_block(&mut self, attrs: &mut PrefixAttributes) -> Vec<DeclId> {
        match self.kind() {
            TokenKind::LeftCurly => {
                let open = self.loc();
                self.advance();
                let decls = self.parse_decl_defs_until(TokenKind::RightCurly);
                self.close_brace(open);
                decls
            }
            TokenKind::Colon => {
                self.advance();
                self.parse_decl_defs_until(TokenKind::RightCurly)
            }
            TokenKind::Semicolon => {
                self.error_here("declaration expected following attribute, not `;`".to_string());
                self.advance();
                Vec::new()
            }
            TokenKind::Eof => {
                self.error_here("declaration expected following attribute, not end of file".to_string());
                Vec::new()
            }
            _ => self.parse_decl_def(attrs).unwrap_or_default(),
        }
    }

    /// Consume the closing `}` of a block opened at `open`, with the
    /// premature-EOF diagnostic naming the opening location.
    pub(crate) fn close_brace(&mut self, open: Loc) {
        if self.kind() == TokenKind::Eof {
            self.premature_eof(TokenKind::RightCurly, open);
        } else {
            self.expect(TokenKind::RightCurly);
        }
    }

    // ————————————————————— storage class chain —————————————————————

    /// Accumulate a run of storage-class-like prefixes, then dispatch to
    /// whatever they apply to.
    fn parse_storage_class_chain(&mut self, attrs: &mut PrefixAttributes) -> Vec<DeclId> {
        use TokenKind::*;
        loop {
            let loc = self.loc();
            let kind = self.kind();
            match kind {
                Const | Immutable | Shared | Inout if self.peek_kind(1) == LeftParen => break,
                Deprecated => {
                    self.advance();
                    if self.check(LeftParen) {
                        let msg = self.parse_assign_expr();
                        self.expect(RightParen);
                        if attrs.deprecated_msg.is_some() {
                            self.error(loc, "redundant attribute `deprecated`".to_string());
                        }
                        attrs.deprecated_msg = Some(msg);
                    } else {
                        attrs.stc =
                            self.append_storage_class(attrs.stc, StorageClass::DEPRECATED, loc);
                    }
                }
                At => {
                    let mut udas = attrs.udas.take();
                    let stc = self.parse_at_attribute(&mut udas);
                    attrs.udas = udas;
                    if let Some(stc) = stc {
                        attrs.stc = self.append_storage_class(attrs.stc, stc, loc);
                    }
                }
                Static if matches!(self.peek_kind(1), This | Assert | If | Foreach | ForeachReverse | Import)
                    || (self.peek_kind(1) == Tilde && self.peek_kind(2) == This) =>
                {
                    break;
                }
                Enum if self.is_enum_declaration() => break,
                _ => match Self::storage_class_of(kind) {
                    Some(bit) => {
                        self.advance();
                        attrs.stc = self.append_storage_class(attrs.stc, bit, loc);
                    }
                    None => break,
                },
            }
        }

        // auto declarations: `stc ident = value` or `stc ident(tpl) = value`
        if self.kind() == Identifier && self.is_auto_declaration() {
            return self.parse_auto_declarations(attrs);
        }

        match self.kind() {
            Identifier | Dot | Typeof | Traits | Vector | Alias | Mixin => {
                let (decls, residual) = self.parse_declarations(std::mem::take(attrs));
                *attrs = residual;
                decls
            }
            Const | Immutable | Shared | Inout if self.peek_kind(1) == LeftParen => {
                let (decls, residual) = self.parse_declarations(std::mem::take(attrs));
                *attrs = residual;
                decls
            }
            This => {
                let stc = std::mem::take(&mut attrs.stc);
                let mut d = self.parse_ctor(attrs);
                self.merge_fn_stc(&mut d, stc);
                vec![d]
            }
            Tilde if self.peek_kind(1) == This => {
                let stc = std::mem::take(&mut attrs.stc);
                let mut d = self.parse_dtor(attrs);
                self.merge_fn_stc(&mut d, stc);
                vec![d]
            }
            k if k.is_basic_type() => {
                let (decls, residual) = self.parse_declarations(std::mem::take(attrs));
                *attrs = residual;
                decls
            }
            _ => {
                // storage classes apply to a block or a single declaration
                let mut inner = PrefixAttributes::default();
                let decls = self.parse_block(&mut inner);
                let mut decls = self.apply_residual_attributes(decls, &mut inner);
                if decls.is_empty() && !attrs.stc.is_empty() {
                    // nothing to attach to; the diagnostic came from parse_block
                    attrs.stc = StorageClass::UNDEFINED;
                }
                if !attrs.stc.is_empty() {
                    let loc = self.ast.decl(decls[0]).loc.clone();
                    let stc = std::mem::take(&mut attrs.stc);
                    decls =
                        vec![self.ast.make_decl(loc, DeclKind::StorageClassDecl { stc, decls })];
                }
                decls
            }
        }
    }

    fn merge_fn_stc(&mut self, decl: &mut DeclId, extra: StorageClass) {
        if extra.is_empty() {
            return;
        }
        let id = *decl;
        match &mut self.ast.decl_mut(id).kind {
            DeclKind::Ctor { stc, .. } | DeclKind::Dtor { stc, .. } => *stc = *stc | extra,
            _ => {}
        }
    }

    /// `@attr` following the cursor on `@`: predefined attributes yield a
    /// storage class; anything else appends a UDA expression.
    pub(crate) fn parse_at_attribute(
        &mut self,
        udas: &mut Option<Vec<ExprId>>,
    ) -> Option<StorageClass> {
        use dfront_ast::ExprKind;
        let loc = self.loc();
        self.advance(); // @
        match self.kind() {
            TokenKind::Identifier => {
                let ident = self.current_ident()?;
                // bare predefined attribute (no arguments)
                if self.peek_kind(1) != TokenKind::Not && self.peek_kind(1) != TokenKind::LeftParen
                {
                    if let Some(stc) = self.predefined_at_attribute(ident) {
                        self.advance();
                        return Some(stc);
                    }
                }
                self.advance();
                let mut e = if self.kind() == TokenKind::Not
                    && self.peek_kind(1) != TokenKind::Is
                    && self.peek_kind(1) != TokenKind::In
                {
                    let args = self.parse_template_arguments();
                    self.ast.make_expr(loc.clone(), ExprKind::ScopeTemplate { ident, args })
                } else {
                    self.ast.make_expr(loc.clone(), ExprKind::Ident(ident))
                };
                if self.kind() == TokenKind::LeftParen {
                    let args = self.parse_arguments();
                    e = self.ast.make_expr(loc, ExprKind::Call { callee: e, args });
                }
                udas.get_or_insert_with(Vec::new).push(e);
                None
            }
            TokenKind::LeftParen => {
                self.advance();
                if self.kind() == TokenKind::RightParen {
                    self.error(loc, "empty attribute list is not allowed".to_string());
                    self.advance();
                    return None;
                }
                let list = udas.get_or_insert_with(Vec::new);
                loop {
                    list.push(self.parse_assign_expr());
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RightParen);
                None
            }
            _ => {
                let found = self.describe_current();
                self.error(loc, format!("attribute expected after `@`, not {found}"));
                None
            }
        }
    }

    /// One `@` attribute group for the module header. Predefined attributes
    /// are rejected there.
    pub(crate) fn parse_user_attributes(&mut self) -> Option<Vec<ExprId>> {
        let loc = self.loc();
        let mut udas = None;
        if let Some(stc) = self.parse_at_attribute(&mut udas) {
            self.error(loc, format!("`@{stc}` attribute cannot be applied to a module declaration"));
        }
        udas
    }

    // ————————————————————— attribute declarations ——————————————————

    fn parse_linkage_decl(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        self.advance(); // extern
        self.advance(); // (
        let (linkage, cpp_mangle, namespaces, namespace_exprs) = self.parse_linkage();
        let linkage_save = std::mem::replace(&mut self.linkage, linkage.clone());
        let mangle_save = std::mem::replace(&mut self.cpp_mangle, cpp_mangle);
        let decls = self.parse_block(attrs);
        self.linkage = linkage_save;
        self.cpp_mangle = mangle_save;
        self.ast.make_decl(
            loc,
            DeclKind::LinkageDecl { linkage, cpp_mangle, namespaces, namespace_exprs, decls },
        )
    }

    fn parse_protection_decl(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        use dfront_ast::Protection;
        let loc = self.loc();
        let kind = self.kind();
        self.advance();
        let protection = match kind {
            TokenKind::Private => Protection::Private,
            TokenKind::Protected => Protection::Protected,
            TokenKind::Public => Protection::Public,
            TokenKind::Export => Protection::Export,
            _ => {
                // package [( qualified.id )]
                let mut path = Vec::new();
                if self.check(TokenKind::LeftParen) {
                    loop {
                        match self.expect_identifier("`package (`") {
                            Some(ident) => path.push(ident),
                            None => break,
                        }
                        if !self.check(TokenKind::Dot) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RightParen);
                }
                Protection::Package(path)
            }
        };
        let decls = self.parse_block(attrs);
        self.ast.make_decl(loc, DeclKind::ProtectionDecl { protection, decls })
    }

    fn parse_align_decl(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        self.advance(); // align
        let alignment = if self.check(TokenKind::LeftParen) {
            let e = self.parse_assign_expr();
            self.expect(TokenKind::RightParen);
            Some(e)
        } else {
            None
        };
        let decls = self.parse_block(attrs);
        self.ast.make_decl(loc, DeclKind::AlignDecl { alignment, decls })
    }

    fn parse_pragma_decl(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        self.advance(); // pragma
        self.expect(TokenKind::LeftParen);
        let ident = match self.expect_identifier("`pragma (`") {
            Some(ident) => ident,
            None => {
                self.resync_to_close_paren();
                return self.error_decl(loc);
            }
        };
        let mut args = Vec::new();
        while self.check(TokenKind::Comma) {
            if self.kind() == TokenKind::RightParen {
                break;
            }
            args.push(self.parse_assign_expr());
        }
        self.expect(TokenKind::RightParen);
        let decls = if self.check(TokenKind::Semicolon) {
            Vec::new()
        } else {
            self.parse_block(attrs)
        };
        self.ast.make_decl(loc, DeclKind::PragmaDecl { ident, args, decls })
    }

    // ————————————————————— conditional compilation —————————————————

    /// `static if (expr)` with the cursor on `if`.
    fn static_if_condition(&mut self) -> Condition {
        self.advance(); // if
        self.expect(TokenKind::LeftParen);
        let cond = self.parse_assign_expr();
        self.expect(TokenKind::RightParen);
        Condition::StaticIf { cond }
    }

    /// `debug` condition head, cursor past `debug`.
    pub(crate) fn parse_debug_condition(&mut self) -> Condition {
        let mut level = None;
        let mut ident = None;
        if self.check(TokenKind::LeftParen) {
            match self.kind() {
                TokenKind::Identifier => {
                    ident = self.current_ident();
                    self.advance();
                }
                k if k.is_integer_literal() => {
                    level = self.token().int_value();
                    self.advance();
                }
                _ => {
                    let found = self.describe_current();
                    self.error_here(format!(
                        "identifier or integer expected inside `debug (…)`, not {found}"
                    ));
                }
            }
            self.expect(TokenKind::RightParen);
        }
        Condition::Debug { level, ident }
    }

    /// `version (…)` condition head, cursor past `version`.
    pub(crate) fn parse_version_condition(&mut self) -> Condition {
        let mut level = None;
        let mut ident = None;
        if self.expect(TokenKind::LeftParen) {
            match self.kind() {
                TokenKind::Identifier => {
                    ident = self.current_ident();
                    self.advance();
                }
                TokenKind::Unittest => {
                    ident = Some(self.intern("unittest"));
                    self.advance();
                }
                TokenKind::Assert => {
                    ident = Some(self.intern("assert"));
                    self.advance();
                }
                k if k.is_integer_literal() => {
                    level = self.token().int_value();
                    self.advance();
                }
                _ => {
                    let found = self.describe_current();
                    self.error_here(format!(
                        "identifier or integer expected inside `version (…)`, not {found}"
                    ));
                }
            }
            self.expect(TokenKind::RightParen);
        }
        Condition::Version { level, ident }
    }

    /// Shared tail of `debug`/`version`/`static if` declarations.
    fn parse_conditional_decl_with(&mut self, cond: Condition) -> DeclId {
        let loc = self.loc();
        let mut then_attrs = PrefixAttributes::default();
        let then = self.parse_block(&mut then_attrs);
        let then = self.apply_residual_attributes(then, &mut then_attrs);
        let else_ = if self.check(TokenKind::Else) {
            let mut else_attrs = PrefixAttributes::default();
            let e = self.parse_block(&mut else_attrs);
            Some(self.apply_residual_attributes(e, &mut else_attrs))
        } else {
            None
        };
        self.ast.make_decl(loc, DeclKind::Conditional { cond, then, else_ })
    }

    /// `debug = id;` / `version = id;`
    fn parse_version_symbol(&mut self, is_debug: bool) -> DeclId {
        let loc = self.loc();
        self.advance(); // debug | version
        self.advance(); // =
        let mut level = None;
        let mut ident = None;
        match self.kind() {
            TokenKind::Identifier => {
                ident = self.current_ident();
                self.advance();
            }
            k if k.is_integer_literal() => {
                level = self.token().int_value();
                self.advance();
            }
            _ => {
                let found = self.describe_current();
                self.error_here(format!("identifier or integer expected, not {found}"));
            }
        }
        self.expect(TokenKind::Semicolon);
        self.ast.make_decl(loc, DeclKind::VersionSymbol { is_debug, level, ident })
    }

    /// `static assert ( expr [, msg] ) ;` with the cursor on `assert`.
    pub(crate) fn parse_static_assert(&mut self) -> DeclId {
        let loc = self.loc();
        self.advance(); // assert
        self.expect(TokenKind::LeftParen);
        let cond = self.parse_assign_expr();
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
        self.expect(TokenKind::Semicolon);
        self.ast.make_decl(loc, DeclKind::StaticAssert { cond, msg })
    }

    /// Declaration-level `static foreach`, cursor on `foreach`.
    fn parse_static_foreach_decl(&mut self, _attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let head = self.parse_foreach_head();
        let open = self.loc();
        let decls = if self.check(TokenKind::LeftCurly) {
            let decls = self.parse_decl_defs_until(TokenKind::RightCurly);
            self.close_brace(open);
            decls
        } else {
            let mut inner = PrefixAttributes::default();
            self.parse_decl_def(&mut inner).unwrap_or_default()
        };
        self.ast.make_decl(loc, DeclKind::StaticForeachDecl { head, decls })
    }

    // ————————————————————— imports ————————————————————————————————

    /// `import a.b, c = d.e : f, g = h;` — cursor on `import`.
    pub(crate) fn parse_import(&mut self, is_static: bool, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // import
        let mut items = Vec::new();
        loop {
            let item_loc = self.loc();
            let mut alias = None;
            if self.kind() == TokenKind::Identifier && self.peek_kind(1) == TokenKind::Assign {
                alias = self.current_ident();
                self.advance();
                self.advance();
            }
            let mut packages = Vec::new();
            let Some(mut ident) = self.expect_identifier("`import`") else {
                self.resync_semicolon();
                return self.ast.make_decl_with_doc(
                    loc,
                    DeclKind::Import { items, is_static },
                    doc,
                );
            };
            while self.check(TokenKind::Dot) {
                packages.push(ident);
                match self.expect_identifier("`.`") {
                    Some(next) => ident = next,
                    None => break,
                }
            }
            let mut names = Vec::new();
            if self.check(TokenKind::Colon) {
                // selective imports close the list
                loop {
                    let mut sel_alias = None;
                    if self.kind() == TokenKind::Identifier
                        && self.peek_kind(1) == TokenKind::Assign
                    {
                        sel_alias = self.current_ident();
                        self.advance();
                        self.advance();
                    }
                    match self.expect_identifier("`:`") {
                        Some(name) => names.push((sel_alias, name)),
                        None => break,
                    }
                    if !self.check(TokenKind::Comma) {
                        break;
                    }
                }
                items.push(ImportItem { loc: item_loc, packages, ident, alias, names });
                break;
            }
            items.push(ImportItem { loc: item_loc, packages, ident, alias, names });
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semicolon);
        self.ast.make_decl_with_doc(loc, DeclKind::Import { items, is_static }, doc)
    }

    // ————————————————————— enums ———————————————————————————————————

    /// Whether `enum` here begins an enum declaration rather than a
    /// manifest-constant storage class.
    fn is_enum_declaration(&mut self) -> bool {
        match self.peek_kind(1) {
            TokenKind::LeftCurly | TokenKind::Colon => true,
            TokenKind::Identifier => matches!(
                self.peek_kind(2),
                TokenKind::LeftCurly | TokenKind::Colon | TokenKind::Semicolon
            ),
            _ => false,
        }
    }

    fn parse_enum(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // enum
        let ident = if self.kind() == TokenKind::Identifier {
            let ident = self.current_ident();
            self.advance();
            ident
        } else {
            None
        };
        let memtype = if self.check(TokenKind::Colon) {
            Some(self.parse_type())
        } else {
            None
        };
        let members = if self.check(TokenKind::Semicolon) {
            if ident.is_none() {
                self.error(loc.clone(), "enum declaration is invalid; no members nor name".to_string());
            }
            None
        } else if self.kind() == TokenKind::LeftCurly {
            let open = self.loc();
            self.advance();
            let mut members = Vec::new();
            while self.kind() != TokenKind::RightCurly {
                if self.kind() == TokenKind::Eof {
                    self.premature_eof(TokenKind::RightCurly, open.clone());
                    break;
                }
                if let Some(member) = self.parse_enum_member() {
                    members.push(member);
                }
                if !self.check(TokenKind::Comma) {
                    break;
                }
            }
            if self.kind() != TokenKind::Eof {
                self.expect(TokenKind::RightCurly);
            }
            Some(members)
        } else {
            let found = self.describe_current();
            self.error_here(format!("enum declaration is invalid, found {found}"));
            None
        };
        self.ast.make_decl_with_doc(loc, DeclKind::Enum { ident, memtype, members }, doc)
    }

    fn parse_enum_member(&mut self) -> Option<EnumMember> {
        let loc = self.loc();
        let doc = self.take_doc();
        let mut udas = None;
        while self.kind() == TokenKind::At {
            let _ = self.parse_at_attribute(&mut udas);
        }
        if self.kind() == TokenKind::Identifier
            && matches!(
                self.peek_kind(1),
                TokenKind::Comma | TokenKind::RightCurly | TokenKind::Assign
            )
        {
            let ident = self.current_ident()?;
            self.advance();
            let value = if self.check(TokenKind::Assign) {
                Some(self.parse_assign_expr())
            } else {
                None
            };
            return Some(EnumMember { loc, ident, ty: None, value, udas, doc });
        }
        // typed member: Type identifier = value
        let ty = self.parse_type();
        let ident = match self.expect_identifier("enum member type") {
            Some(ident) => ident,
            None => {
                while !matches!(
                    self.kind(),
                    TokenKind::Comma | TokenKind::RightCurly | TokenKind::Eof
                ) {
                    self.advance();
                }
                return None;
            }
        };
        if !self.expect(TokenKind::Assign) {
            return Some(EnumMember { loc, ident, ty: Some(ty), value: None, udas, doc });
        }
        let value = Some(self.parse_assign_expr());
        Some(EnumMember { loc, ident, ty: Some(ty), value, udas, doc })
    }

    // ————————————————————— aggregates ——————————————————————————————

    fn parse_aggregate(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        let kind = match self.kind() {
            TokenKind::Struct => AggregateKind::Struct,
            TokenKind::Union => AggregateKind::Union,
            TokenKind::Class => AggregateKind::Class,
            _ => AggregateKind::Interface,
        };
        self.advance();
        let ident = if self.kind() == TokenKind::Identifier {
            let ident = self.current_ident();
            self.advance();
            ident
        } else {
            None
        };

        let mut tpl_params = None;
        let mut constraint = None;
        if ident.is_some() && self.kind() == TokenKind::LeftParen {
            tpl_params = Some(self.parse_template_parameter_list());
            if self.kind() == TokenKind::If {
                constraint = Some(self.parse_constraint());
            }
        }

        let mut bases = Vec::new();
        if matches!(kind, AggregateKind::Class | AggregateKind::Interface)
            && self.check(TokenKind::Colon)
        {
            loop {
                bases.push(self.parse_type());
                if !self.check(TokenKind::Comma) {
                    break;
                }
            }
        }
        if tpl_params.is_some() && constraint.is_none() && self.kind() == TokenKind::If {
            constraint = Some(self.parse_constraint());
        }

        let members = match self.kind() {
            TokenKind::LeftCurly => {
                let open = self.loc();
                self.advance();
                let members = self.parse_decl_defs_until(TokenKind::RightCurly);
                self.close_brace(open);
                Some(members)
            }
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            _ => {
                let found = self.describe_current();
                self.error_here(format!(
                    "{{ }} expected following {} declaration, not {found}",
                    kind.keyword()
                ));
                None
            }
        };

        let inner = if ident.is_none()
            && matches!(kind, AggregateKind::Struct | AggregateKind::Union)
        {
            self.ast.make_decl_with_doc(
                loc.clone(),
                DeclKind::AnonAggregate {
                    is_union: kind == AggregateKind::Union,
                    members: members.unwrap_or_default(),
                },
                doc,
            )
        } else {
            self.ast.make_decl_with_doc(
                loc.clone(),
                DeclKind::Aggregate { kind, ident, bases, members },
                doc,
            )
        };

        match (tpl_params, ident) {
            (Some(params), Some(ident)) => self.ast.make_decl(
                loc,
                DeclKind::Template { ident, params, constraint, members: vec![inner], is_mixin: false },
            ),
            _ => inner,
        }
    }

    // ————————————————————— templates ———————————————————————————————

    /// `template id(params) [if (…)] { decls }`, cursor on `template`.
    fn parse_template_decl(&mut self, is_mixin: bool, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // template
        let Some(ident) = self.expect_identifier("`template`") else {
            self.resync_semicolon();
            return self.error_decl(loc);
        };
        let params = self.parse_template_parameter_list();
        let constraint = if self.kind() == TokenKind::If {
            Some(self.parse_constraint())
        } else {
            None
        };
        let members = if self.kind() == TokenKind::LeftCurly {
            let open = self.loc();
            self.advance();
            let members = self.parse_decl_defs_until(TokenKind::RightCurly);
            self.close_brace(open);
            members
        } else {
            let found = self.describe_current();
            self.error_here(format!("members of template declaration expected, not {found}"));
            Vec::new()
        };
        self.ast.make_decl_with_doc(
            loc,
            DeclKind::Template { ident, params, constraint, members, is_mixin },
            doc,
        )
    }

    /// `( template parameters )`.
    pub(crate) fn parse_template_parameter_list(&mut self) -> Vec<TemplateParam> {
        if !self.expect(TokenKind::LeftParen) {
            return Vec::new();
        }
        let params = self.parse_template_parameter_list_body(TokenKind::RightParen);
        self.expect(TokenKind::RightParen);
        params
    }

    /// `if ( constraint-expression )`, cursor on `if`.
    pub(crate) fn parse_constraint(&mut self) -> ExprId {
        self.advance(); // if
        self.expect(TokenKind::LeftParen);
        let e = self.parse_expression();
        self.expect(TokenKind::RightParen);
        e
    }

    /// `mixin a.b!(args) [ident];`, cursor on `mixin`.
    fn parse_template_mixin(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // mixin
        let leading_dot = self.check(TokenKind::Dot);
        let mut segments = Vec::new();
        loop {
            let Some(ident) = self.expect_identifier("`mixin`") else {
                self.resync_semicolon();
                return self.error_decl(loc);
            };
            let args = if self.kind() == TokenKind::Not
                && self.peek_kind(1) != TokenKind::Is
                && self.peek_kind(1) != TokenKind::In
            {
                Some(self.parse_template_arguments())
            } else {
                None
            };
            segments.push(dfront_ast::TypeSeg { ident, args });
            if !self.check(TokenKind::Dot) {
                break;
            }
        }
        let ident = if self.kind() == TokenKind::Identifier {
            let ident = self.current_ident();
            self.advance();
            ident
        } else {
            None
        };
        self.expect(TokenKind::Semicolon);
        self.ast.make_decl_with_doc(
            loc,
            DeclKind::TemplateMixin { segments, leading_dot, ident },
            doc,
        )
    }

    // ————————————————————— special members ————————————————————————

    /// `this(…)` constructor or `this(this)` postblit, cursor on `this`.
    fn parse_ctor(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // this
        // postblit
        if self.kind() == TokenKind::LeftParen
            && self.peek_kind(1) == TokenKind::This
            && self.peek_kind(2) == TokenKind::RightParen
        {
            self.advance();
            self.advance();
            self.advance();
            let mut stc = StorageClass::UNDEFINED;
            let mut udas = attrs.udas.take();
            self.parse_postfix_attributes(&mut stc, &mut udas);
            attrs.udas = udas;
            let (contracts, body) = self.parse_contracts();
            return self.ast.make_decl_with_doc(
                loc,
                DeclKind::Ctor {
                    params: ParameterList::default(),
                    tpl_params: None,
                    constraint: None,
                    stc,
                    contracts,
                    body,
                    is_postblit: true,
                },
                doc,
            );
        }

        let mut tpl_params = None;
        if self.kind() == TokenKind::LeftParen {
            let here = self.stream.here();
            let past = self.stream.peek_past_paren(here);
            if self.stream.kind_at(past) == TokenKind::LeftParen {
                tpl_params = Some(self.parse_template_parameter_list());
            }
        }
        let params = self.parse_parameter_list(tpl_params.is_some());
        let mut stc = StorageClass::UNDEFINED;
        let mut udas = attrs.udas.take();
        self.parse_postfix_attributes(&mut stc, &mut udas);
        attrs.udas = udas;
        let constraint = if tpl_params.is_some() && self.kind() == TokenKind::If {
            Some(self.parse_constraint())
        } else {
            None
        };
        let (contracts, body) = self.parse_contracts();
        self.ast.make_decl_with_doc(
            loc,
            DeclKind::Ctor {
                params,
                tpl_params,
                constraint,
                stc,
                contracts,
                body,
                is_postblit: false,
            },
            doc,
        )
    }

    /// `~this()`, cursor on `~`.
    fn parse_dtor(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // ~
        self.advance(); // this
        self.expect(TokenKind::LeftParen);
        self.expect(TokenKind::RightParen);
        let mut stc = StorageClass::UNDEFINED;
        let mut udas = attrs.udas.take();
        self.parse_postfix_attributes(&mut stc, &mut udas);
        attrs.udas = udas;
        let (contracts, body) = self.parse_contracts();
        self.ast.make_decl_with_doc(loc, DeclKind::Dtor { stc, contracts, body }, doc)
    }

    /// `static this()`, cursor on `this`. `shared` already consumed.
    fn parse_static_ctor(&mut self, shared: bool, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // this
        self.expect(TokenKind::LeftParen);
        self.expect(TokenKind::RightParen);
        let mut stc = StorageClass::UNDEFINED;
        let mut udas = attrs.udas.take();
        self.parse_postfix_attributes(&mut stc, &mut udas);
        attrs.udas = udas;
        let (_, body) = self.parse_contracts();
        self.ast.make_decl_with_doc(loc, DeclKind::StaticCtor { shared, stc, body }, doc)
    }

    /// `static ~this()`, cursor on `~`. `shared` already consumed.
    fn parse_static_dtor(&mut self, shared: bool, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // ~
        self.advance(); // this
        self.expect(TokenKind::LeftParen);
        self.expect(TokenKind::RightParen);
        let mut stc = StorageClass::UNDEFINED;
        let mut udas = attrs.udas.take();
        self.parse_postfix_attributes(&mut stc, &mut udas);
        attrs.udas = udas;
        let (_, body) = self.parse_contracts();
        self.ast.make_decl_with_doc(loc, DeclKind::StaticDtor { shared, stc, body }, doc)
    }

    /// `invariant` in its block and expression forms.
    fn parse_invariant(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // invariant
        if self.check(TokenKind::LeftParen) {
            if self.check(TokenKind::RightParen) {
                // invariant () { … }
                let body = self.parse_block_statement();
                return self.ast.make_decl_with_doc(
                    loc,
                    DeclKind::Invariant { expr: None, body: Some(body) },
                    doc,
                );
            }
            let expr = self.parse_assign_expr();
            if self.check(TokenKind::Comma) && self.kind() != TokenKind::RightParen {
                // the message becomes part of the lowered assert; keep the
                // condition as the invariant expression
                let _ = self.parse_assign_expr();
            }
            self.expect(TokenKind::RightParen);
            self.expect(TokenKind::Semicolon);
            return self.ast.make_decl_with_doc(
                loc,
                DeclKind::Invariant { expr: Some(expr), body: None },
                doc,
            );
        }
        let body = if self.kind() == TokenKind::LeftCurly {
            Some(self.parse_block_statement())
        } else {
            let found = self.describe_current();
            self.error_here(format!("invariant body expected, not {found}"));
            None
        };
        self.ast.make_decl_with_doc(loc, DeclKind::Invariant { expr: None, body }, doc)
    }

    /// `unittest { … }`, cursor on `unittest`.
    fn parse_unittest(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance();
        let body = if self.kind() == TokenKind::LeftCurly {
            self.parse_block_statement()
        } else {
            let found = self.describe_current();
            self.error_here(format!("`{{` expected after `unittest`, not {found}"));
            let body_loc = self.loc();
            self.error_stmt(body_loc)
        };
        self.ast.make_decl_with_doc(loc, DeclKind::Unittest { body }, doc)
    }

    /// Legacy class allocator `new(params) { … }`, cursor on `new`.
    fn parse_new_decl(&mut self, attrs: &mut PrefixAttributes) -> DeclId {
        let loc = self.loc();
        let doc = attrs.comment.take();
        self.advance(); // new
        let params = self.parse_parameter_list(false);
        let body = if self.kind() == TokenKind::LeftCurly {
            Some(self.parse_block_statement())
        } else {
            self.expect(TokenKind::Semicolon);
            None
        };
        self.ast.make_decl_with_doc(loc, DeclKind::NewDecl { params, body }, doc)
    }

    // ————————————————————— declarations proper —————————————————————

    /// Whether `ident` here begins an auto declaration: `ident =` or
    /// `ident ( template params ) =`.
    fn is_auto_declaration(&mut self) -> bool {
        if self.peek_kind(1) == TokenKind::Assign {
            return true;
        }
        if self.peek_kind(1) == TokenKind::LeftParen {
            let here = self.stream.here();
            let past = self.stream.peek_past_paren(here.next());
            return self.stream.kind_at(past) == TokenKind::Assign;
        }
        false
    }

    /// `stc id [(tpl)] = initializer, …;` — the storage classes were already
    /// folded into `attrs`.
    fn parse_auto_declarations(&mut self, attrs: &mut PrefixAttributes) -> Vec<DeclId> {
        let stc = std::mem::take(&mut attrs.stc);
        let mut doc = attrs.comment.take();
        let mut decls = Vec::new();
        loop {
            let loc = self.loc();
            let Some(ident) = self.expect_identifier("storage class") else {
                self.resync_semicolon();
                break;
            };
            let tpl_params = if self.kind() == TokenKind::LeftParen {
                Some(self.parse_template_parameter_list())
            } else {
                None
            };
            if !self.expect(TokenKind::Assign) {
                self.resync_semicolon();
                break;
            }
            let init = self.parse_initializer();
            let var = self.ast.make_decl_with_doc(
                loc.clone(),
                DeclKind::Var { ident, ty: None, init: Some(init), stc },
                doc.take(),
            );
            match tpl_params {
                Some(params) => decls.push(self.ast.make_decl(
                    loc,
                    DeclKind::Template {
                        ident,
                        params,
                        constraint: None,
                        members: vec![var],
                        is_mixin: false,
                    },
                )),
                None => decls.push(var),
            }
            if self.check(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::Semicolon);
            break;
        }
        decls
    }

    /// Storage classes, a base type, then one or more declarators sharing
    /// it. Consumes the storage classes of `attrs` and returns the residual.
    pub(crate) fn parse_declarations(
        &mut self,
        mut attrs: PrefixAttributes,
    ) -> (Vec<DeclId>, PrefixAttributes) {
        if self.kind() == TokenKind::Alias {
            let decls = self.parse_alias_declarations(&mut attrs);
            return (decls, attrs);
        }
        let stc = std::mem::take(&mut attrs.stc);
        let mut doc = attrs.comment.take();
        // return type inference: `storage_class identifier ( … )` followed by
        // a body, a contract, or a second parameter list
        if !stc.is_empty() && self.is_auto_return_function() {
            let decl = self.parse_auto_return_function(stc, doc.take(), &mut attrs);
            return (vec![decl], attrs);
        }
        // type suffixes belong to the shared base: `int* a, b;` declares two
        // pointers
        let base = self.parse_basic_type();
        let base = self.parse_type_suffixes(base);
        let mut decls = Vec::new();
        loop {
            let loc = self.loc();
            let declarator = self.parse_declarator(base);
            if let Some(postfix_udas) = declarator.udas {
                attrs.udas.get_or_insert_with(Vec::new).extend(postfix_udas);
            }
            let Some(ident) = declarator.ident else {
                let found = self.describe_current();
                self.error_here(format!("no identifier for declarator, found {found}"));
                self.resync_semicolon();
                break;
            };
            let is_function = matches!(
                self.ast.ty(declarator.ty).kind,
                TypeKind::FunctionType { .. }
            ) && !matches!(self.kind(), TokenKind::Assign | TokenKind::Comma);
            if is_function {
                let constraint = if declarator.tpl_params.is_some() && self.kind() == TokenKind::If
                {
                    Some(self.parse_constraint())
                } else {
                    None
                };
                let (contracts, body) = self.parse_contracts();
                let func = self.ast.make_decl_with_doc(
                    loc.clone(),
                    DeclKind::Func { ident, ty: declarator.ty, stc, contracts, body },
                    doc.take(),
                );
                match declarator.tpl_params {
                    Some(params) => decls.push(self.ast.make_decl(
                        loc,
                        DeclKind::Template {
                            ident,
                            params,
                            constraint,
                            members: vec![func],
                            is_mixin: false,
                        },
                    )),
                    None => decls.push(func),
                }
                break;
            }
            // variable declarator
            let init = if self.check(TokenKind::Assign) {
                Some(self.parse_initializer())
            } else {
                None
            };
            let var = self.ast.make_decl_with_doc(
                loc,
                DeclKind::Var { ident, ty: Some(declarator.ty), init, stc },
                doc.take(),
            );
            decls.push(var);
            if self.check(TokenKind::Comma) {
                continue;
            }
            if self.kind() == TokenKind::Eof {
                self.error_here("semicolon expected following declaration, not end of file".to_string());
            } else {
                self.expect(TokenKind::Semicolon);
            }
            break;
        }
        (decls, attrs)
    }

    /// `stc ident (` followed by a body, contract keyword, or a second
    /// parameter list means the return type is inferred.
    fn is_auto_return_function(&mut self) -> bool {
        if self.kind() != TokenKind::Identifier || self.peek_kind(1) != TokenKind::LeftParen {
            return false;
        }
        let here = self.stream.here();
        let past = self.stream.peek_past_paren(here.next());
        match self.stream.kind_at(past) {
            TokenKind::LeftParen
            | TokenKind::LeftCurly
            | TokenKind::In
            | TokenKind::Out
            | TokenKind::Do
            | TokenKind::If
            | TokenKind::Semicolon => true,
            TokenKind::Identifier => {
                self.stream.ident_at(past) == Some(dfront_ident::well_known::BODY)
            }
            _ => false,
        }
    }

    fn parse_auto_return_function(
        &mut self,
        stc: StorageClass,
        doc: dfront_ast::DocComment,
        attrs: &mut PrefixAttributes,
    ) -> DeclId {
        let loc = self.loc();
        let ident = match self.current_ident() {
            Some(ident) => ident,
            None => return self.error_decl(loc),
        };
        self.advance();
        let mut tpl_params = None;
        let here = self.stream.here();
        let past = self.stream.peek_past_paren(here);
        if self.stream.kind_at(past) == TokenKind::LeftParen {
            tpl_params = Some(self.parse_template_parameter_list());
        }
        let params = self.parse_parameter_list(tpl_params.is_some());
        let mut fn_stc = StorageClass::UNDEFINED;
        let mut udas = attrs.udas.take();
        self.parse_postfix_attributes(&mut fn_stc, &mut udas);
        attrs.udas = udas;
        let ty = self.ast.make_type(
            loc.clone(),
            TypeKind::FunctionType {
                ret: None,
                params,
                stc: fn_stc,
                linkage: self.linkage.clone(),
            },
        );
        let constraint = if tpl_params.is_some() && self.kind() == TokenKind::If {
            Some(self.parse_constraint())
        } else {
            None
        };
        let (contracts, body) = self.parse_contracts();
        let func = self.ast.make_decl_with_doc(
            loc.clone(),
            DeclKind::Func { ident, ty, stc, contracts, body },
            doc,
        );
        match tpl_params {
            Some(params) => self.ast.make_decl(
                loc,
                DeclKind::Template {
                    ident,
                    params,
                    constraint,
                    members: vec![func],
                    is_mixin: false,
                },
            ),
            None => func,
        }
    }

    /// `alias` declarations: alias-this, the assign form, and the legacy
    /// declarator form.
    fn parse_alias_declarations(&mut self, attrs: &mut PrefixAttributes) -> Vec<DeclId> {
        let alias_loc = self.loc();
        let doc = attrs.comment.take();
        let stc = std::mem::take(&mut attrs.stc);
        self.advance(); // alias

        // alias id this;
        if self.kind() == TokenKind::Identifier
            && self.peek_kind(1) == TokenKind::This
            && self.peek_kind(2) == TokenKind::Semicolon
        {
            let ident = self.current_ident();
            self.advance();
            self.advance();
            self.advance();
            let Some(ident) = ident else {
                return vec![self.error_decl(alias_loc)];
            };
            return vec![self.ast.make_decl_with_doc(alias_loc, DeclKind::AliasThis { ident }, doc)];
        }

        // assign form: alias id [(tpl)] = target, …;
        let assign_form = self.kind() == TokenKind::Identifier
            && (self.peek_kind(1) == TokenKind::Assign
                || (self.peek_kind(1) == TokenKind::LeftParen && {
                    let here = self.stream.here();
                    let past = self.stream.peek_past_paren(here.next());
                    self.stream.kind_at(past) == TokenKind::Assign
                }));
        if assign_form {
            let mut doc = doc;
            let mut decls = Vec::new();
            loop {
                let loc = self.loc();
                let Some(ident) = self.expect_identifier("`alias`") else {
                    self.resync_semicolon();
                    break;
                };
                let params = if self.kind() == TokenKind::LeftParen {
                    Some(self.parse_template_parameter_list())
                } else {
                    None
                };
                self.expect(TokenKind::Assign);
                let target = match self.parse_type_or_expression() {
                    dfront_ast::TypeOrExpr::Type(ty) => AliasTarget::Type(ty),
                    dfront_ast::TypeOrExpr::Expr(e) => AliasTarget::Expr(e),
                };
                decls.push(self.ast.make_decl_with_doc(
                    loc,
                    DeclKind::Alias { ident, params, target, stc },
                    doc.take(),
                ));
                if self.check(TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::Semicolon);
                break;
            }
            return decls;
        }

        // legacy declarator form: alias BasicType Declarator;
        let base = self.parse_basic_type();
        let base = self.parse_type_suffixes(base);
        let mut decls = Vec::new();
        let mut doc = doc;
        loop {
            let loc = self.loc();
            let declarator = self.parse_declarator(base);
            match declarator.ident {
                Some(ident) => {
                    decls.push(self.ast.make_decl_with_doc(
                        loc,
                        DeclKind::Alias {
                            ident,
                            params: None,
                            target: AliasTarget::Type(declarator.ty),
                            stc,
                        },
                        doc.take(),
                    ));
                }
                None => {
                    let found = self.describe_current();
                    self.error_here(format!("no identifier for declarator, found {found}"));
                    self.resync_semicolon();
                    return decls;
                }
            }
            if self.check(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::Semicolon);
            break;
        }
        decls
    }

    // ————————————————————— contracts ———————————————————————————————

    /// The function body/contract state machine: `in`/`out` clauses, then
    /// `do { … }` (or legacy `body`), a bare block, or `;`.
    pub(crate) fn parse_contracts(&mut self) -> (Contracts, Option<StmtId>) {
        let mut contracts = Contracts::default();
        let mut require_do = false;
        loop {
            match self.kind() {
                TokenKind::In => {
                    self.advance();
                    if self.check(TokenKind::LeftParen) {
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
                        contracts.requires.push(Contract::Expr { expr, msg });
                    } else {
                        let block = self.parse_block_statement();
                        contracts.requires.push(Contract::Block(block));
                        require_do = true;
                    }
                }
                TokenKind::Out => {
                    self.advance();
                    if self.check(TokenKind::LeftParen) {
                        // `out (id) { … }` or `out ([id] ; expr [, msg])`
                        let mut ident = None;
                        if self.kind() == TokenKind::Identifier
                            && self.peek_kind(1) == TokenKind::RightParen
                        {
                            ident = self.current_ident();
                            self.advance();
                            self.expect(TokenKind::RightParen);
                            let block = self.parse_block_statement();
                            contracts
                                .ensures
                                .push(EnsureContract { ident, contract: Contract::Block(block) });
                            require_do = true;
                            continue;
                        }
                        if self.kind() == TokenKind::Identifier
                            && self.peek_kind(1) == TokenKind::Semicolon
                        {
                            ident = self.current_ident();
                            self.advance();
                        }
                        if !self.check(TokenKind::Semicolon) {
                            let found = self.describe_current();
                            self.error_here(format!(
                                "`;` expected in `out` contract, not {found}"
                            ));
                        }
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
                        contracts
                            .ensures
                            .push(EnsureContract { ident, contract: Contract::Expr { expr, msg } });
                    } else {
                        let block = self.parse_block_statement();
                        contracts
                            .ensures
                            .push(EnsureContract { ident: None, contract: Contract::Block(block) });
                        require_do = true;
                    }
                }
                TokenKind::Do => {
                    self.advance();
                    let body = self.parse_block_statement();
                    return (contracts, Some(body));
                }
                // legacy `body` keyword, accepted as an alias for `do`
                TokenKind::Identifier
                    if self.current_ident() == Some(dfront_ident::well_known::BODY) =>
                {
                    self.advance();
                    let body = self.parse_block_statement();
                    return (contracts, Some(body));
                }
                TokenKind::LeftCurly => {
                    if require_do {
                        self.error_here(
                            "missing `do { ... }` after `in` or `out` block contract".to_string(),
                        );
                    }
                    let body = self.parse_block_statement();
                    return (contracts, Some(body));
                }
                TokenKind::Semicolon => {
                    if require_do {
                        self.error_here(
                            "missing `do { ... }` after `in` or `out` block contract".to_string(),
                        );
                    }
                    self.advance();
                    return (contracts, None);
                }
                TokenKind::Eof => {
                    self.error_here(
                        "semicolon expected following function declaration, not end of file"
                            .to_string(),
                    );
                    return (contracts, None);
                }
                _ => {
                    let found = self.describe_current();
                    self.error_here(format!(
                        "semicolon expected following function declaration, not {found}"
                    ));
                    self.resync_semicolon();
                    return (contracts, None);
                }
            }
        }
    }

    // ————————————————————— parameters ——————————————————————————————

    /// `( parameters )`. `infer_untyped` permits identifier-only parameters
    /// (function literals and implicit template parameters).
    pub(crate) fn parse_parameter_list(&mut self, infer_untyped: bool) -> ParameterList {
        let open = self.loc();
        let mut list = ParameterList::default();
        if !self.expect(TokenKind::LeftParen) {
            return list;
        }
        loop {
            match self.kind() {
                TokenKind::RightParen => break,
                TokenKind::Eof => {
                    self.premature_eof(TokenKind::RightParen, open);
                    return list;
                }
                TokenKind::DotDotDot => {
                    self.advance();
                    list.varargs = VarArg::Variadic;
                    break;
                }
                _ => {}
            }
            let param_loc = self.loc();
            let mut stc = StorageClass::UNDEFINED;
            let mut udas: Option<Vec<ExprId>> = None;
            loop {
                let stc_loc = self.loc();
                let bit = match self.kind() {
                    TokenKind::In => StorageClass::IN,
                    TokenKind::Out => StorageClass::OUT,
                    TokenKind::Ref => StorageClass::REF,
                    TokenKind::Lazy => StorageClass::LAZY,
                    TokenKind::Scope => StorageClass::SCOPE,
                    TokenKind::Final => StorageClass::FINAL,
                    TokenKind::Auto => StorageClass::AUTO,
                    TokenKind::Return => StorageClass::RETURN,
                    TokenKind::Const | TokenKind::Immutable | TokenKind::Shared
                    | TokenKind::Inout
                        if self.peek_kind(1) != TokenKind::LeftParen =>
                    {
                        match Self::storage_class_of(self.kind()) {
                            Some(bit) => bit,
                            None => break,
                        }
                    }
                    TokenKind::At => {
                        let _ = stc_loc;
                        if let Some(predef) = self.parse_at_attribute(&mut udas) {
                            let at_loc = self.loc();
                            self.error(
                                at_loc,
                                format!("`@{predef}` attribute cannot be applied to a parameter"),
                            );
                        }
                        continue;
                    }
                    _ => break,
                };
                self.advance();
                stc = self.append_storage_class(stc, bit, stc_loc);
            }

            // identifier-only parameter with an inferred type
            let mut ty = None;
            let mut ident = None;
            if infer_untyped
                && self.kind() == TokenKind::Identifier
                && matches!(
                    self.peek_kind(1),
                    TokenKind::Comma
                        | TokenKind::RightParen
                        | TokenKind::DotDotDot
                        | TokenKind::Assign
                )
            {
                ident = self.current_ident();
                self.advance();
            } else {
                ty = Some(self.parse_type());
                if self.kind() == TokenKind::Identifier {
                    ident = self.current_ident();
                    self.advance();
                }
            }

            // postfix UDAs on parameters are rejected
            if self.kind() == TokenKind::At {
                let at_loc = self.loc();
                self.error(
                    at_loc,
                    "user-defined attributes cannot appear as postfixes on a parameter".to_string(),
                );
                let mut sink = None;
                let _ = self.parse_at_attribute(&mut sink);
            }

            let default_value = if self.check(TokenKind::Assign) {
                Some(self.parse_assign_expr())
            } else {
                None
            };

            if self.kind() == TokenKind::DotDotDot {
                if stc.intersects(StorageClass::OUT | StorageClass::REF) {
                    self.error_here("variadic argument cannot be `out` or `ref`".to_string());
                }
                self.advance();
                list.params.push(Parameter { loc: param_loc, stc, udas, ty, ident, default_value });
                list.varargs = VarArg::TypesafeVariadic;
                break;
            }

            list.params.push(Parameter { loc: param_loc, stc, udas, ty, ident, default_value });
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        if self.kind() == TokenKind::Eof {
            self.premature_eof(TokenKind::RightParen, open);
        } else {
            self.expect(TokenKind::RightParen);
        }
        list
    }

    // ————————————————————— foreach head ————————————————————————————

    /// Shared head of the four foreach variants; cursor on `foreach` /
    /// `foreach_reverse`.
    pub(crate) fn parse_foreach_head(&mut self) -> dfront_ast::ForeachHead {
        let reverse = self.kind() == TokenKind::ForeachReverse;
        self.advance();
        self.expect(TokenKind::LeftParen);
        let mut params = Vec::new();
        while self.kind() != TokenKind::Semicolon && self.kind() != TokenKind::Eof {
            let loc = self.loc();
            let mut stc = StorageClass::UNDEFINED;
            loop {
                let stc_loc = self.loc();
                let bit = match self.kind() {
                    TokenKind::Ref => StorageClass::REF,
                    TokenKind::Alias => StorageClass::ALIAS,
                    TokenKind::Enum => StorageClass::MANIFEST,
                    TokenKind::Scope => StorageClass::SCOPE,
                    TokenKind::Const | TokenKind::Immutable | TokenKind::Shared
                    | TokenKind::Inout
                        if self.peek_kind(1) != TokenKind::LeftParen =>
                    {
                        match Self::storage_class_of(self.kind()) {
                            Some(bit) => bit,
                            None => break,
                        }
                    }
                    _ => break,
                };
                self.advance();
                stc = self.append_storage_class(stc, bit, stc_loc);
            }
            let (ty, ident) = if self.kind() == TokenKind::Identifier
                && matches!(self.peek_kind(1), TokenKind::Comma | TokenKind::Semicolon)
            {
                let ident = self.current_ident();
                self.advance();
                (None, ident)
            } else {
                let ty = self.parse_type();
                (Some(ty), {
                    match self.expect_identifier("`foreach` type") {
                        Some(ident) => Some(ident),
                        None => None,
                    }
                })
            };
            let Some(ident) = ident else {
                // resync to `;` or `)`
                while !matches!(
                    self.kind(),
                    TokenKind::Semicolon
                        | TokenKind::RightParen
                        | TokenKind::Eof
                ) {
                    self.advance();
                }
                break;
            };
            params.push(dfront_ast::ForeachParam { loc, stc, ty, ident });
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semicolon);
        let aggr = self.parse_expression();
        let upper = if self.check(TokenKind::Slice) {
            Some(self.parse_expression())
        } else {
            None
        };
        self.expect(TokenKind::RightParen);
        dfront_ast::ForeachHead { reverse, params, aggr, upper }
    }
}
