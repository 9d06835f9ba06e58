//! Buffered token stream between the lexer and the parser.
//!
//! The stream lexes lazily into a growable buffer. The parser's cursor only
//! ever moves forward via [`TokenStream::advance`]; lookahead (`peek`) and
//! the parser's probes address tokens by [`Pos`], a plain buffer index that
//! is copied by value and therefore restartable.

use dfront_diagnostics::DiagnosticHandler;
use dfront_ident::{Ident, Interner};
use dfront_location::Loc;
use dfront_token::{Token, TokenKind};

use crate::lexer::{Lexer, PendingDiagnostic};

/// A position in the token buffer. Probes carry these by value and never
/// touch the parser's cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pos(pub usize);

impl Pos {
    /// The position `n` tokens further on.
    pub fn offset(self, n: usize) -> Pos {
        Pos(self.0 + n)
    }

    /// The next position.
    pub fn next(self) -> Pos {
        Pos(self.0 + 1)
    }
}

/// Token stream with arbitrary lookahead over one source buffer.
pub struct TokenStream<'a, H: DiagnosticHandler> {
    lexer: Lexer<'a>,
    handler: H,
    tokens: Vec<Token>,
    /// Diagnostics tagged with the buffer index of the token whose lex
    /// produced them; released when the cursor passes that index.
    pending: Vec<(usize, PendingDiagnostic)>,
    cursor: usize,
}

impl<'a, H: DiagnosticHandler> TokenStream<'a, H> {
    pub fn new(lexer: Lexer<'a>, handler: H) -> Self {
        TokenStream { lexer, handler, tokens: Vec::with_capacity(64), pending: Vec::new(), cursor: 0 }
    }

    /// Make sure the buffer holds a token at `index` (or the trailing Eof).
    fn ensure(&mut self, index: usize) {
        while self.tokens.len() <= index {
            if matches!(self.tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
                return;
            }
            let token = self.lexer.scan();
            let produced = self.tokens.len();
            for diagnostic in self.lexer.take_diagnostics() {
                self.pending.push((produced, diagnostic));
            }
            self.tokens.push(token);
        }
    }

    fn clamp(&mut self, index: usize) -> usize {
        self.ensure(index);
        index.min(self.tokens.len() - 1)
    }

    /// The current token.
    pub fn token(&mut self) -> &Token {
        let index = self.clamp(self.cursor);
        &self.tokens[index]
    }

    /// Kind of the current token.
    pub fn kind(&mut self) -> TokenKind {
        self.token().kind
    }

    /// Location of the current token.
    pub fn loc(&mut self) -> Loc {
        self.token().loc.clone()
    }

    /// Advance the cursor one token.
    ///
    /// This is the only operation that transfers lexer diagnostics to the
    /// handler: after it returns, the handler has seen every diagnostic
    /// produced by the lex of the consumed token.
    pub fn advance(&mut self) {
        let consumed = self.clamp(self.cursor);
        if self.tokens[consumed].kind != TokenKind::Eof {
            self.cursor = consumed + 1;
        }
        self.flush_pending(consumed);
    }

    fn flush_pending(&mut self, upto: usize) {
        // entries are queued in buffer order, so releasable ones form a prefix
        while matches!(self.pending.first(), Some(&(index, _)) if index <= upto) {
            let (_, diagnostic) = self.pending.remove(0);
            self.handler.handle(diagnostic.loc, diagnostic.severity, diagnostic.message, false);
        }
    }

    /// Pure lookahead `k` tokens past the current one (`peek(0)` is the
    /// current token). Never moves the cursor, never surfaces diagnostics.
    pub fn peek(&mut self, k: usize) -> &Token {
        let index = self.clamp(self.cursor + k);
        &self.tokens[index]
    }

    /// Kind `k` tokens ahead.
    pub fn peek_kind(&mut self, k: usize) -> TokenKind {
        self.peek(k).kind
    }

    /// The probe position of the current token.
    pub fn here(&mut self) -> Pos {
        Pos(self.clamp(self.cursor))
    }

    /// Token at a probe position.
    pub fn at(&mut self, pos: Pos) -> &Token {
        let index = self.clamp(pos.0);
        &self.tokens[index]
    }

    /// Kind at a probe position.
    pub fn kind_at(&mut self, pos: Pos) -> TokenKind {
        self.at(pos).kind
    }

    /// Identifier payload at a probe position, if any.
    pub fn ident_at(&mut self, pos: Pos) -> Option<Ident> {
        self.at(pos).ident()
    }

    /// For a position sitting on `(`, the position just past the matching
    /// `)`. On anything else, the next position; on premature EOF, the EOF
    /// position.
    pub fn peek_past_paren(&mut self, pos: Pos) -> Pos {
        if self.kind_at(pos) != TokenKind::LeftParen {
            return pos.next();
        }
        let mut depth = 0usize;
        let mut at = pos;
        loop {
            match self.kind_at(at) {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return at.next();
                    }
                }
                TokenKind::Eof => return at,
                _ => {}
            }
            at = at.next();
        }
    }

    /// Set the cursor to a probe position (used after a probe has committed
    /// the parser to an interpretation that consumed tokens).
    pub fn jump_to(&mut self, pos: Pos) {
        debug_assert!(pos.0 >= self.cursor);
        while self.cursor < pos.0 && self.kind() != TokenKind::Eof {
            self.advance();
        }
    }

    /// Emit a diagnostic through the stream's handler.
    pub fn emit(&mut self, loc: Loc, severity: dfront_diagnostics::Severity, message: String, supplemental: bool) {
        self.handler.handle(loc, severity, message, supplemental);
    }

    /// The identifier pool (shared between lexer and parser).
    pub fn interner_mut(&mut self) -> &mut Interner {
        self.lexer.interner_mut()
    }

    /// Spelling of an interned identifier.
    pub fn name(&self, ident: Ident) -> String {
        self.lexer.interner().name(ident).to_string()
    }

    /// Tear down the stream, releasing any still-pending diagnostics and
    /// returning the handler.
    pub fn into_handler(self) -> H {
        self.into_parts().0
    }

    /// Tear down the stream, returning the handler and the identifier pool.
    pub fn into_parts(mut self) -> (H, Interner) {
        let last = self.tokens.len();
        self.flush_pending(last);
        (self.handler, self.lexer.into_interner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfront_diagnostics::Collect;
    use pretty_assertions::assert_eq;

    fn stream(source: &'static str) -> TokenStream<'static, Collect> {
        let lexer = Lexer::from_source(Some("test.d".into()), source, false);
        TokenStream::new(lexer, Collect::new())
    }

    #[test]
    fn peek_does_not_consume() {
        let mut s = stream("a b c");
        assert_eq!(s.peek_kind(2), TokenKind::Identifier);
        assert_eq!(s.kind(), TokenKind::Identifier);
        let first = s.token().ident();
        s.advance();
        assert_ne!(s.token().ident(), first);
    }

    #[test]
    fn peek_past_eof_clamps() {
        let mut s = stream("x");
        assert_eq!(s.peek_kind(10), TokenKind::Eof);
        s.advance();
        s.advance();
        assert_eq!(s.kind(), TokenKind::Eof);
    }

    #[test]
    fn peek_past_paren_matches_nesting() {
        let mut s = stream("(a (b) c) d");
        let start = s.here();
        let past = s.peek_past_paren(start);
        assert_eq!(s.kind_at(past), TokenKind::Identifier);
        assert_eq!(s.at(past).loc.column, 11);
    }

    #[test]
    fn peek_past_paren_stops_at_eof() {
        let mut s = stream("(a (b c");
        let start = s.here();
        let past = s.peek_past_paren(start);
        assert_eq!(s.kind_at(past), TokenKind::Eof);
    }

    #[test]
    fn diagnostics_surface_on_advance() {
        let lexer = Lexer::from_source(Some("t.d".into()), "'x 1", false);
        let mut s = TokenStream::new(lexer, Collect::new());
        // the malformed char literal has been lexed but not consumed
        assert_eq!(s.kind(), TokenKind::CharLiteral);
        s.advance();
        let handler = s.into_handler();
        assert_eq!(handler.set.error_count(), 1);
    }
}
