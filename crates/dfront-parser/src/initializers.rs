//! Initializer parsing: void, expression, struct and array forms, with the
//! structural scans that tell a struct initializer from a function literal
//! and an array initializer from an array-literal expression.

use dfront_ast::{InitId, InitKind};
use dfront_diagnostics::DiagnosticHandler;
use dfront_lexer::Pos;
use dfront_token::TokenKind;

use crate::parser::Parser;
use crate::probes;

impl<'a, H: DiagnosticHandler> Parser<'a, H> {
    pub(crate) fn parse_initializer(&mut self) -> InitId {
        let loc = self.loc();
        match self.kind() {
            TokenKind::Void
                if matches!(self.peek_kind(1), TokenKind::Semicolon | TokenKind::Comma) =>
            {
                self.advance();
                self.ast.make_init(loc, InitKind::Void)
            }
            TokenKind::LeftCurly if !self.braces_hold_statements() => {
                self.parse_struct_initializer(loc)
            }
            TokenKind::LeftBracket if self.brackets_are_initializer() => {
                self.parse_array_initializer(loc)
            }
            _ => {
                let expr = self.parse_assign_expr();
                self.ast.make_init(loc, InitKind::Expr { expr })
            }
        }
    }

    /// Scan the `{ … }` ahead: a top-level statement keyword (or `;`) at
    /// brace depth 1 means this is a function literal, not a struct
    /// initializer.
    fn braces_hold_statements(&mut self) -> bool {
        let start = self.stream.here();
        let mut at = start.next();
        let mut depth = 1usize;
        loop {
            let kind = self.stream.kind_at(at);
            match kind {
                TokenKind::LeftCurly => depth += 1,
                TokenKind::RightCurly => {
                    depth -= 1;
                    if depth == 0 {
                        return false;
                    }
                }
                TokenKind::Eof => return false,
                _ if depth == 1 && Self::is_statement_keyword(kind) => return true,
                _ => {}
            }
            at = at.next();
        }
    }

    fn is_statement_keyword(kind: TokenKind) -> bool {
        use TokenKind::*;
        matches!(
            kind,
            Semicolon
                | If | While | Do | For | Foreach | ForeachReverse | Switch | Return | Break
                | Continue | With | Asm | Pragma | Throw | Try | Goto | Synchronized | Scope
        )
    }

    /// `[ … ]` is an array initializer only when the token after the
    /// matching `]` is one of `;` `,` `]` `}`; otherwise the bracket is the
    /// start of an expression (an array-literal being indexed, compared, …).
    fn brackets_are_initializer(&mut self) -> bool {
        let start = self.stream.here();
        let Some(past) = probes::skip_brackets(&mut self.stream, start) else {
            return true;
        };
        matches!(
            self.stream.kind_at(past),
            TokenKind::Semicolon
                | TokenKind::Comma
                | TokenKind::RightBracket
                | TokenKind::RightCurly
        )
    }

    fn parse_struct_initializer(&mut self, loc: dfront_location::Loc) -> InitId {
        let open = self.loc();
        self.advance(); // {
        let mut fields = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RightCurly => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.premature_eof(TokenKind::RightCurly, open);
                    break;
                }
                _ => {}
            }
            let ident = if self.kind() == TokenKind::Identifier
                && self.peek_kind(1) == TokenKind::Colon
            {
                let ident = self.current_ident();
                self.advance();
                self.advance();
                ident
            } else {
                None
            };
            let init = self.parse_initializer();
            fields.push((ident, init));
            match self.kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RightCurly | TokenKind::Eof => {}
                _ => {
                    let found = self.describe_current();
                    self.error_here(format!(
                        "comma expected separating field initializers, not {found}"
                    ));
                }
            }
        }
        self.ast.make_init(loc, InitKind::Struct { fields })
    }

    fn parse_array_initializer(&mut self, loc: dfront_location::Loc) -> InitId {
        let open = self.loc();
        self.advance(); // [
        self.in_brackets += 1;
        let mut items = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RightBracket => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.premature_eof(TokenKind::RightBracket, open);
                    break;
                }
                _ => {}
            }
            // `[expr : initializer]` indexes an element
            let index = if self.indexed_element_follows() {
                let e = self.parse_assign_expr();
                self.expect(TokenKind::Colon);
                Some(e)
            } else {
                None
            };
            let init = self.parse_initializer();
            items.push((index, init));
            match self.kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RightBracket | TokenKind::Eof => {}
                _ => {
                    let found = self.describe_current();
                    self.error_here(format!("comma expected separating initializers, not {found}"));
                }
            }
        }
        self.in_brackets = self.in_brackets.saturating_sub(1);
        self.ast.make_init(loc, InitKind::Array { items })
    }

    /// Whether the next entry uses the `index : value` form. The index
    /// expression is scanned for a top-level `:` before the entry's own
    /// comma or the closing bracket.
    fn indexed_element_follows(&mut self) -> bool {
        let mut at = self.stream.here();
        let mut brackets = 0i32;
        let mut parens = 0i32;
        let mut curlies = 0i32;
        loop {
            match self.stream.kind_at(at) {
                TokenKind::Colon if brackets == 0 && parens == 0 && curlies == 0 => return true,
                TokenKind::Question => {
                    // the `:` of a ternary is not an index marker; skip to it
                    at = self.skip_ternary(at.next());
                    continue;
                }
                TokenKind::Comma if brackets == 0 && parens == 0 && curlies == 0 => return false,
                TokenKind::LeftBracket => brackets += 1,
                TokenKind::RightBracket => {
                    brackets -= 1;
                    if brackets < 0 {
                        return false;
                    }
                }
                TokenKind::LeftParen => parens += 1,
                TokenKind::RightParen => {
                    parens -= 1;
                    if parens < 0 {
                        return false;
                    }
                }
                TokenKind::LeftCurly => curlies += 1,
                TokenKind::RightCurly => {
                    curlies -= 1;
                    if curlies < 0 {
                        return false;
                    }
                }
                TokenKind::Semicolon | TokenKind::Eof => return false,
                _ => {}
            }
            at = at.next();
        }
    }

    /// Skip past the `:` belonging to a `?` at the given scan position.
    fn skip_ternary(&mut self, mut at: Pos) -> Pos {
        let mut nested = 0usize;
        let mut brackets = 0i32;
        loop {
            match self.stream.kind_at(at) {
                TokenKind::Question => nested += 1,
                TokenKind::Colon if brackets == 0 => {
                    if nested == 0 {
                        return at.next();
                    }
                    nested -= 1;
                }
                TokenKind::LeftBracket | TokenKind::LeftParen | TokenKind::LeftCurly => {
                    brackets += 1
                }
                TokenKind::RightBracket | TokenKind::RightParen | TokenKind::RightCurly => {
                    brackets -= 1;
                    if brackets < 0 {
                        return at;
                    }
                }
                TokenKind::Semicolon | TokenKind::Eof => return at,
                _ => {}
            }
            at = at.next();
        }
    }
}
