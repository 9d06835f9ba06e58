//! The statement grammar, including the four foreach variants, scope
//! guards, switch machinery and inline asm token blocks.

use dfront_ast::{
    Catch, Condition, GotoTarget, IfParam, ScopeGuardKind, StmtId, StmtKind, StorageClass,
};
use dfront_diagnostics::DiagnosticHandler;
use dfront_ident::well_known;
use dfront_location::Loc;
use dfront_token::TokenKind;

use crate::parser::{Parser, PrefixAttributes};
use crate::probes::{self, NeedDeclaratorId};

impl<'a, H: DiagnosticHandler> Parser<'a, H> {
    /// `{ statements }` as a plain compound (function bodies, contracts).
    pub(crate) fn parse_block_statement(&mut self) -> StmtId {
        let open = self.loc();
        if !self.expect(TokenKind::LeftCurly) {
            return self.error_stmt(open);
        }
        // a fresh block resets dangling-else tracking
        let looking_save = std::mem::replace(&mut self.looking_for_else, Loc::initial());
        let mut stmts = Vec::new();
        while self.kind() != TokenKind::RightCurly {
            if self.kind() == TokenKind::Eof {
                self.premature_eof(TokenKind::RightCurly, open.clone());
                break;
            }
            stmts.push(self.parse_statement());
        }
        if self.kind() != TokenKind::Eof {
            self.expect(TokenKind::RightCurly);
        }
        self.looking_for_else = looking_save;
        self.ast.make_stmt(open, StmtKind::Compound { stmts })
    }

    /// A statement in a control-flow body position: blocks get their own
    /// scope.
    pub(crate) fn parse_scoped_statement(&mut self) -> StmtId {
        let stmt = self.parse_statement();
        match self.ast.stmt(stmt).kind {
            StmtKind::Compound { .. } => {
                let loc = self.ast.stmt(stmt).loc.clone();
                self.ast.make_stmt(loc, StmtKind::Scoped { stmt })
            }
            _ => stmt,
        }
    }

    pub(crate) fn parse_statement(&mut self) -> StmtId {
        if !self.enter() {
            let loc = self.loc();
            self.advance();
            self.leave();
            return self.error_stmt(loc);
        }
        let stmt = self.parse_statement_inner();
        self.leave();
        stmt
    }

    fn parse_statement_inner(&mut self) -> StmtId {
        use TokenKind::*;
        let loc = self.loc();
        match self.kind() {
            // labelled statement
            Identifier if self.peek_kind(1) == Colon => {
                let ident = match self.current_ident() {
                    Some(ident) => ident,
                    None => {
                        self.advance();
                        return self.error_stmt(loc);
                    }
                };
                self.advance();
                self.advance();
                let stmt = if self.kind() == RightCurly {
                    self.error_here("statement expected following label".to_string());
                    self.ast.make_stmt(loc.clone(), StmtKind::Empty)
                } else {
                    self.parse_statement()
                };
                self.ast.make_stmt(loc, StmtKind::Label { ident, stmt })
            }
            Semicolon => {
                self.error_here("use `{ }` for an empty statement, not `;`".to_string());
                self.advance();
                self.ast.make_stmt(loc, StmtKind::Empty)
            }
            LeftCurly => self.parse_block_statement(),
            While => {
                self.advance();
                self.expect(LeftParen);
                let cond = self.parse_expression();
                self.expect(RightParen);
                let body = self.parse_scoped_statement();
                self.ast.make_stmt(loc, StmtKind::While { cond, body })
            }
            Do => {
                self.advance();
                let body = self.parse_scoped_statement();
                self.expect(While);
                self.expect(LeftParen);
                let cond = self.parse_expression();
                self.expect(RightParen);
                if !self.check(Semicolon) {
                    self.error_here(
                        "terminating `;` required after do-while statement".to_string(),
                    );
                }
                self.ast.make_stmt(loc, StmtKind::DoWhile { body, cond })
            }
            For => {
                self.advance();
                self.expect(LeftParen);
                let init = if self.check(Semicolon) {
                    None
                } else {
                    Some(self.parse_statement())
                };
                let cond = if self.kind() == Semicolon {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.expect(Semicolon);
                let inc = if self.kind() == RightParen {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.expect(RightParen);
                let body = self.parse_scoped_statement();
                self.ast.make_stmt(loc, StmtKind::For { init, cond, inc, body })
            }
            Foreach | ForeachReverse => {
                let head = self.parse_foreach_head();
                let body = self.parse_scoped_statement();
                self.ast.make_stmt(loc, StmtKind::Foreach { head, body })
            }
            If => self.parse_if_statement(loc),
            Else => {
                self.error_here("found `else` without a corresponding `if` statement".to_string());
                self.advance();
                let _ = self.parse_scoped_statement();
                self.error_stmt(loc)
            }
            Switch => self.parse_switch(loc, false),
            Final if self.peek_kind(1) == Switch => {
                self.advance();
                self.parse_switch(loc, true)
            }
            Case => self.parse_case(loc),
            Default => {
                self.advance();
                self.expect(Colon);
                let body = self.parse_case_block();
                self.ast.make_stmt(loc, StmtKind::Default { body })
            }
            Return => {
                self.advance();
                let expr = if self.kind() == Semicolon {
                    None
                } else {
                    Some(self.parse_expression())
                };
                self.expect(Semicolon);
                self.ast.make_stmt(loc, StmtKind::Return { expr })
            }
            Break => {
                self.advance();
                let ident = self.optional_label();
                self.expect(Semicolon);
                self.ast.make_stmt(loc, StmtKind::Break { ident })
            }
            Continue => {
                self.advance();
                let ident = self.optional_label();
                self.expect(Semicolon);
                self.ast.make_stmt(loc, StmtKind::Continue { ident })
            }
            Goto => {
                self.advance();
                let target = match self.kind() {
                    Default => {
                        self.advance();
                        GotoTarget::Default
                    }
                    Case => {
                        self.advance();
                        if self.kind() == Semicolon {
                            GotoTarget::Case(None)
                        } else {
                            GotoTarget::Case(Some(self.parse_expression()))
                        }
                    }
                    _ => match self.expect_identifier("`goto`") {
                        Some(ident) => GotoTarget::Label(ident),
                        None => {
                            self.resync_semicolon();
                            return self.error_stmt(loc);
                        }
                    },
                };
                self.expect(Semicolon);
                self.ast.make_stmt(loc, StmtKind::Goto { target })
            }
            Synchronized if self.starts_declaration_after_synchronized() => {
                self.parse_declaration_statement(loc)
            }
            Synchronized => {
                self.advance();
                let expr = if self.check(LeftParen) {
                    let e = self.parse_expression();
                    self.expect(RightParen);
                    Some(e)
                } else {
                    None
                };
                let body = self.parse_scoped_statement();
                self.ast.make_stmt(loc, StmtKind::Synchronized { expr, body })
            }
            With => {
                self.advance();
                self.expect(LeftParen);
                let expr = self.parse_expression();
                self.expect(RightParen);
                let body = self.parse_scoped_statement();
                self.ast.make_stmt(loc, StmtKind::With { expr, body })
            }
            Try => self.parse_try(loc),
            Throw => {
                self.advance();
                let expr = self.parse_expression();
                self.expect(Semicolon);
                self.ast.make_stmt(loc, StmtKind::Throw { expr })
            }
            Scope if self.peek_kind(1) == LeftParen => self.parse_scope_guard(loc),
            Asm => self.parse_asm(loc),
            Pragma => {
                self.advance();
                self.expect(LeftParen);
                let Some(ident) = self.expect_identifier("`pragma (`") else {
                    self.resync_to_close_paren();
                    return self.error_stmt(loc);
                };
                let mut args = Vec::new();
                while self.check(Comma) {
                    if self.kind() == RightParen {
                        break;
                    }
                    args.push(self.parse_assign_expr());
                }
                self.expect(RightParen);
                let body = if self.check(Semicolon) {
                    None
                } else {
                    Some(self.parse_scoped_statement())
                };
                self.ast.make_stmt(loc, StmtKind::Pragma { ident, args, body })
            }
            Debug => {
                self.advance();
                if self.kind() == Assign {
                    self.error_here(
                        "debug conditions can only be set at module scope".to_string(),
                    );
                    self.resync_semicolon();
                    return self.error_stmt(loc);
                }
                let cond = self.parse_debug_condition();
                self.parse_conditional_statement(loc, cond)
            }
            Version => {
                self.advance();
                if self.kind() == Assign {
                    self.error_here(
                        "version conditions can only be set at module scope".to_string(),
                    );
                    self.resync_semicolon();
                    return self.error_stmt(loc);
                }
                let cond = self.parse_version_condition();
                self.parse_conditional_statement(loc, cond)
            }
            Static => match self.peek_kind(1) {
                If => {
                    self.advance();
                    self.advance();
                    self.expect(LeftParen);
                    let cond = self.parse_assign_expr();
                    self.expect(RightParen);
                    self.parse_conditional_statement(loc, Condition::StaticIf { cond })
                }
                Assert => {
                    self.advance();
                    self.advance();
                    self.expect(LeftParen);
                    let cond = self.parse_assign_expr();
                    let msg = if self.check(Comma) {
                        if self.kind() == RightParen {
                            None
                        } else {
                            Some(self.parse_assign_expr())
                        }
                    } else {
                        None
                    };
                    self.expect(RightParen);
                    self.expect(Semicolon);
                    self.ast.make_stmt(loc, StmtKind::StaticAssert { cond, msg })
                }
                Foreach | ForeachReverse => {
                    self.advance();
                    let head = self.parse_foreach_head();
                    let body = self.parse_scoped_statement();
                    self.ast.make_stmt(loc, StmtKind::StaticForeach { head, body })
                }
                _ => self.parse_declaration_statement(loc),
            },
            Import if self.peek_kind(1) != LeftParen => self.parse_declaration_statement(loc),
            Mixin => {
                if self.peek_kind(1) == LeftParen {
                    // `mixin("…");` is a statement; anything longer is an
                    // expression statement
                    let here = self.stream.here();
                    let past = self.stream.peek_past_paren(here.next());
                    if self.stream.kind_at(past) == Semicolon {
                        self.advance();
                        self.expect(LeftParen);
                        let args = self.parse_mixin_arguments();
                        self.expect(Semicolon);
                        return self.ast.make_stmt(loc, StmtKind::Mixin { args });
                    }
                    return self.parse_expression_statement(loc);
                }
                if self.peek_kind(1) == Template {
                    return self.parse_declaration_statement(loc);
                }
                self.parse_declaration_statement(loc)
            }
            Enum | Struct | Union | Class | Interface | Template | Alias | Typeof => {
                self.parse_declaration_statement(loc)
            }
            Const | Immutable | Shared | Inout | Auto | Extern | Align | Ref | Gshared | At
            | Abstract | Deprecated | Scope | Final | Pure | Nothrow | Override => {
                self.parse_declaration_statement(loc)
            }
            Identifier | Dot | Traits | Vector => {
                // the tie-break probe: prefer the expression reading
                let here = self.stream.here();
                let is_decl = probes::is_declaration(
                    &mut self.stream,
                    here,
                    NeedDeclaratorId::MustIfDStyle,
                    None,
                    self.options.allow_alt_syntax,
                    self.options.c_style_declarators,
                )
                .is_some();
                if is_decl {
                    self.parse_declaration_statement(loc)
                } else {
                    self.parse_expression_statement(loc)
                }
            }
            k if k.is_basic_type() => {
                let here = self.stream.here();
                let is_decl = probes::is_declaration(
                    &mut self.stream,
                    here,
                    NeedDeclaratorId::MustIfDStyle,
                    None,
                    self.options.allow_alt_syntax,
                    self.options.c_style_declarators,
                )
                .is_some();
                if is_decl {
                    self.parse_declaration_statement(loc)
                } else {
                    self.parse_expression_statement(loc)
                }
            }
            Eof => {
                self.error_here("statement expected, not end of file".to_string());
                self.error_stmt(loc)
            }
            _ => self.parse_expression_statement(loc),
        }
    }

    fn optional_label(&mut self) -> Option<dfront_ident::Ident> {
        if self.kind() == TokenKind::Identifier {
            let ident = self.current_ident();
            self.advance();
            ident
        } else {
            None
        }
    }

    /// `synchronized` begins a declaration when an aggregate follows.
    fn starts_declaration_after_synchronized(&mut self) -> bool {
        matches!(
            self.peek_kind(1),
            TokenKind::Class | TokenKind::Interface | TokenKind::Struct | TokenKind::Union
        )
    }

    fn parse_expression_statement(&mut self, loc: Loc) -> StmtId {
        let expr = self.parse_expression();
        if self.kind() == TokenKind::Eof {
            self.error_here("found end of file when expecting `;` following statement".to_string());
        } else if !self.check(TokenKind::Semicolon) {
            let found = self.describe_current();
            self.error_here(format!("found {found} when expecting `;` following statement"));
            self.resync_statement();
        }
        self.ast.make_stmt(loc, StmtKind::Expr { expr })
    }

    /// Skip to the next statement boundary: past the next `;`, or up to `}`
    /// or end of file.
    pub(crate) fn resync_statement(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RightCurly | TokenKind::Eof => return,
                _ => self.advance(),
            }
        }
    }

    /// A declaration in statement position.
    fn parse_declaration_statement(&mut self, loc: Loc) -> StmtId {
        let mut attrs = PrefixAttributes { comment: self.take_doc(), ..Default::default() };
        let decls = self.parse_decl_def(&mut attrs).unwrap_or_default();
        match decls.len() {
            0 => self.ast.make_stmt(loc, StmtKind::Empty),
            1 => self.ast.make_stmt(loc, StmtKind::Decl { decl: decls[0] }),
            _ => {
                let stmts = decls
                    .into_iter()
                    .map(|decl| {
                        let decl_loc = self.ast.decl(decl).loc.clone();
                        self.ast.make_stmt(decl_loc, StmtKind::Decl { decl })
                    })
                    .collect();
                self.ast.make_stmt(loc, StmtKind::Compound { stmts })
            }
        }
    }

    // ———————————————————————————— if ———————————————————————————————

    fn parse_if_statement(&mut self, loc: Loc) -> StmtId {
        self.advance(); // if
        self.expect(TokenKind::LeftParen);
        let param = self.parse_if_condition_param();
        let cond = self.parse_expression();
        self.expect(TokenKind::RightParen);

        let looking_save = std::mem::replace(&mut self.looking_for_else, loc.clone());
        let then = self.parse_scoped_statement();
        self.looking_for_else = looking_save;

        let else_ = if self.kind() == TokenKind::Else {
            let else_loc = self.loc();
            self.advance();
            let else_stmt = self.parse_scoped_statement();
            self.check_dangling_else(else_loc);
            Some(else_stmt)
        } else {
            None
        };
        self.ast.make_stmt(loc, StmtKind::If { param, cond, then, else_ })
    }

    /// The optional declared condition variable of `if (…)`:
    /// `auto x = e`, `const x = e`, `Type x = e`.
    fn parse_if_condition_param(&mut self) -> Option<IfParam> {
        use TokenKind::*;
        let mut stc = StorageClass::UNDEFINED;
        loop {
            let stc_loc = self.loc();
            let bit = match self.kind() {
                Auto => StorageClass::AUTO,
                Scope => StorageClass::SCOPE,
                Const | Immutable | Shared | Inout if self.peek_kind(1) != LeftParen => {
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
        if !stc.is_empty() && self.kind() == Identifier && self.peek_kind(1) == Assign {
            let ident = self.current_ident()?;
            self.advance();
            self.advance();
            return Some(IfParam { stc, ty: None, ident });
        }
        // typed form, with or without leading storage classes
        let here = self.stream.here();
        let is_typed = probes::is_declaration(
            &mut self.stream,
            here,
            NeedDeclaratorId::Must,
            Some(Assign),
            self.options.allow_alt_syntax,
            self.options.c_style_declarators,
        )
        .is_some();
        if is_typed {
            let ty = self.parse_type();
            let ident = self.expect_identifier("condition type")?;
            self.expect(Assign);
            return Some(IfParam { stc, ty: Some(ty), ident });
        }
        if !stc.is_empty() {
            let found = self.describe_current();
            self.error_here(format!(
                "identifier or type expected after storage class in condition, not {found}"
            ));
        }
        None
    }

    fn check_dangling_else(&mut self, else_loc: Loc) {
        if !self.looking_for_else.is_initial() {
            let inner = self.looking_for_else.clone();
            self.warning(
                else_loc,
                format!("else is dangling, add {{ }} after condition at {inner}"),
            );
        }
    }

    /// Shared tail of `debug`/`version`/`static if` statements.
    fn parse_conditional_statement(&mut self, loc: Loc, cond: Condition) -> StmtId {
        let looking_save = std::mem::replace(&mut self.looking_for_else, loc.clone());
        let then = self.parse_scoped_statement();
        self.looking_for_else = looking_save;
        let else_ = if self.kind() == TokenKind::Else {
            let else_loc = self.loc();
            self.advance();
            let else_stmt = self.parse_scoped_statement();
            self.check_dangling_else(else_loc);
            Some(else_stmt)
        } else {
            None
        };
        self.ast.make_stmt(loc, StmtKind::Conditional { cond, then, else_ })
    }

    // ——————————————————————————— switch ————————————————————————————

    fn parse_switch(&mut self, loc: Loc, is_final: bool) -> StmtId {
        self.advance(); // switch
        self.expect(TokenKind::LeftParen);
        let cond = self.parse_expression();
        self.expect(TokenKind::RightParen);
        let body = self.parse_scoped_statement();
        self.ast.make_stmt(loc, StmtKind::Switch { cond, body, is_final })
    }

    fn parse_case(&mut self, loc: Loc) -> StmtId {
        self.advance(); // case
        let mut exprs = vec![self.parse_assign_expr()];
        while self.check(TokenKind::Comma) {
            if self.kind() == TokenKind::Colon {
                break;
            }
            exprs.push(self.parse_assign_expr());
        }
        self.expect(TokenKind::Colon);

        // case range: `case a: .. case b:`
        if self.kind() == TokenKind::Slice {
            if exprs.len() > 1 {
                self.error_here("only one `case` allowed for start of case range".to_string());
            }
            self.advance();
            self.expect(TokenKind::Case);
            let last = self.parse_assign_expr();
            self.expect(TokenKind::Colon);
            let body = self.parse_case_block();
            let first = exprs.remove(0);
            return self.ast.make_stmt(loc, StmtKind::CaseRange { first, last, body });
        }

        let body = self.parse_case_block();
        self.ast.make_stmt(loc, StmtKind::Case { exprs, body })
    }

    /// The statements belonging to one `case`/`default`, up to the next
    /// label or the end of the switch body.
    fn parse_case_block(&mut self) -> StmtId {
        let loc = self.loc();
        let mut stmts = Vec::new();
        while !matches!(
            self.kind(),
            TokenKind::Case | TokenKind::Default | TokenKind::RightCurly | TokenKind::Eof
        ) {
            stmts.push(self.parse_statement());
        }
        self.ast.make_stmt(loc, StmtKind::Compound { stmts })
    }

    // ——————————————————————— try / scope ———————————————————————————

    fn parse_try(&mut self, loc: Loc) -> StmtId {
        self.advance(); // try
        let body = self.parse_scoped_statement();
        let mut catches = Vec::new();
        while self.kind() == TokenKind::Catch {
            let catch_loc = self.loc();
            self.advance();
            let mut ty = None;
            let mut ident = None;
            if self.check(TokenKind::LeftParen) {
                ty = Some(self.parse_type());
                if self.kind() == TokenKind::Identifier {
                    ident = self.current_ident();
                    self.advance();
                }
                self.expect(TokenKind::RightParen);
            }
            let handler = self.parse_scoped_statement();
            catches.push(Catch { loc: catch_loc, ty, ident, handler });
        }
        let finally_ = if self.check(TokenKind::Finally) {
            Some(self.parse_scoped_statement())
        } else {
            None
        };
        if catches.is_empty() && finally_.is_none() {
            self.error_here("`catch` or `finally` expected following `try`".to_string());
        }
        self.ast.make_stmt(loc, StmtKind::Try { body, catches, finally_ })
    }

    fn parse_scope_guard(&mut self, loc: Loc) -> StmtId {
        self.advance(); // scope
        self.advance(); // (
        let kind = match self.current_ident() {
            Some(ident) if ident == well_known::EXIT => Some(ScopeGuardKind::Exit),
            Some(ident) if ident == well_known::SUCCESS => Some(ScopeGuardKind::Success),
            Some(ident) if ident == well_known::FAILURE => Some(ScopeGuardKind::Failure),
            _ => None,
        };
        let Some(kind) = kind else {
            let found = self.describe_current();
            self.error_here(format!(
                "valid scope identifiers are `exit`, `failure`, or `success`, not {found}"
            ));
            self.resync_to_close_paren();
            let body = self.parse_scoped_statement();
            let _ = body;
            return self.error_stmt(loc);
        };
        self.advance();
        self.expect(TokenKind::RightParen);
        let body = self.parse_scoped_statement();
        self.ast.make_stmt(loc, StmtKind::ScopeGuard { kind, body })
    }

    // ———————————————————————————— asm ——————————————————————————————

    /// `asm [attributes] { instructions ; … }` — instructions are kept as
    /// raw token runs split on `;`, with nested braces tracked.
    fn parse_asm(&mut self, loc: Loc) -> StmtId {
        self.advance(); // asm
        let mut stc = StorageClass::UNDEFINED;
        let mut udas = None;
        self.parse_postfix_attributes(&mut stc, &mut udas);
        if udas.is_some() {
            self.error(loc.clone(), "user-defined attributes not allowed on `asm` statement".to_string());
        }
        let open = self.loc();
        if !self.expect(TokenKind::LeftCurly) {
            return self.error_stmt(loc);
        }
        let mut instrs = Vec::new();
        let mut tokens: Vec<dfront_token::Token> = Vec::new();
        let mut instr_loc = self.loc();
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::Eof => {
                    self.premature_eof(TokenKind::RightCurly, open);
                    break;
                }
                TokenKind::LeftCurly => {
                    depth += 1;
                    tokens.push(self.token());
                    self.advance();
                }
                TokenKind::RightCurly => {
                    if depth == 0 {
                        if !tokens.is_empty() {
                            self.error_here("`;` expected to terminate asm instruction".to_string());
                            instrs.push(dfront_ast::AsmInstr { loc: instr_loc, tokens });
                        }
                        self.advance();
                        break;
                    }
                    depth -= 1;
                    tokens.push(self.token());
                    self.advance();
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    instrs.push(dfront_ast::AsmInstr {
                        loc: std::mem::replace(&mut instr_loc, self.loc()),
                        tokens: std::mem::take(&mut tokens),
                    });
                }
                _ => {
                    tokens.push(self.token());
                    self.advance();
                }
            }
        }
        self.ast.make_stmt(loc, StmtKind::Asm { stc, instrs })
    }
}
