//! Parser state, token helpers and the module-level entry points.

use dfront_ast::{
    Ast, CppMangle, DeclId, DeclKind, DocComment, ExprId, ExprKind, InitId, InitKind, Linkage,
    StmtId, StmtKind, StorageClass, TypeId, TypeKind,
};
use dfront_diagnostics::{DiagnosticHandler, Severity};
use dfront_ident::{Ident, Interner};
use dfront_lexer::TokenStream;
use dfront_location::Loc;
use dfront_token::{Token, TokenKind, TokenValue};
use tracing::{debug, trace};

/// Cross-cutting parse settings.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Collect doc comments and attach them to declared symbols.
    pub doc_comments: bool,
    /// Recursion budget for nested constructs; exceeding it diagnoses an
    /// error and yields sentinel nodes instead of overflowing the stack.
    pub max_depth: usize,
    /// Accept the parenthesised sub-declarator syntax `int (*x)`.
    pub allow_alt_syntax: bool,
    /// Recognise C-style array declarators `int x[3]` in the declarator
    /// probe (they still diagnose as legacy syntax when parsed).
    pub c_style_declarators: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            doc_comments: true,
            max_depth: 500,
            allow_alt_syntax: false,
            c_style_declarators: false,
        }
    }
}

/// Prefix attributes accumulated while parsing one attributed declaration.
///
/// The bundle travels down the attribute branches; consumers clear what they
/// consume and the caller wraps whatever is left, so an attribute is applied
/// exactly once.
#[derive(Clone, Debug, Default)]
pub struct PrefixAttributes {
    pub stc: StorageClass,
    pub deprecated_msg: Option<ExprId>,
    pub udas: Option<Vec<ExprId>>,
    pub comment: DocComment,
}

/// Result of the convenience [`crate::parse`] entry.
#[derive(Debug)]
pub struct ParsedModule {
    pub ast: Ast,
    /// Top-level declarations, module header excluded.
    pub decls: Vec<DeclId>,
    pub interner: Interner,
    pub diagnostics: dfront_diagnostics::DiagnosticSet,
}

/// The parser. One instance parses one module and is then torn down with
/// [`Parser::into_parts`].
pub struct Parser<'a, H: DiagnosticHandler> {
    pub(crate) stream: TokenStream<'a, H>,
    pub(crate) ast: Ast,
    pub(crate) options: ParseOptions,
    /// Current `extern (…)` linkage; save/restore scoped per attribute.
    pub(crate) linkage: Linkage,
    pub(crate) cpp_mangle: CppMangle,
    /// Location of the innermost `if` whose `else` is still open; drives
    /// dangling-else detection.
    pub(crate) looking_for_else: Loc,
    /// Open `(`/`[` depth inside the expression grammar.
    pub(crate) in_brackets: u32,
    depth: usize,
    depth_diagnosed: bool,
}

impl<'a, H: DiagnosticHandler> Parser<'a, H> {
    pub fn new(stream: TokenStream<'a, H>, options: ParseOptions) -> Self {
        Parser {
            stream,
            ast: Ast::new(),
            options,
            linkage: Linkage::D,
            cpp_mangle: CppMangle::Default,
            looking_for_else: Loc::initial(),
            in_brackets: 0,
            depth: 0,
            depth_diagnosed: false,
        }
    }

    /// Tear the parser down: the tree, the handler, the identifier pool.
    pub fn into_parts(self) -> (Ast, H, Interner) {
        let (handler, interner) = self.stream.into_parts();
        (self.ast, handler, interner)
    }

    // ————————————————————————— token plumbing ——————————————————————

    pub(crate) fn kind(&mut self) -> TokenKind {
        self.stream.kind()
    }

    pub(crate) fn loc(&mut self) -> Loc {
        self.stream.loc()
    }

    pub(crate) fn token(&mut self) -> Token {
        self.stream.token().clone()
    }

    pub(crate) fn advance(&mut self) {
        self.stream.advance();
    }

    pub(crate) fn peek_kind(&mut self, k: usize) -> TokenKind {
        self.stream.peek_kind(k)
    }

    /// Consume the current token if it has the given kind.
    pub(crate) fn check(&mut self, kind: TokenKind) -> bool {
        if self.kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require a token kind; diagnose and leave the cursor alone otherwise.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            return true;
        }
        let found = self.describe_current();
        self.error_here(format!("found {found} when expecting `{}`", kind.as_str()));
        false
    }

    /// Identifier payload of the current token, without consuming it.
    pub(crate) fn current_ident(&mut self) -> Option<Ident> {
        self.stream.token().ident()
    }

    /// Require an identifier, consuming it.
    pub(crate) fn expect_identifier(&mut self, following: &str) -> Option<Ident> {
        if self.kind() == TokenKind::Identifier {
            let ident = self.current_ident();
            self.advance();
            return ident;
        }
        let found = self.describe_current();
        self.error_here(format!("identifier expected following {following}, not {found}"));
        None
    }

    /// Render the current token for diagnostics.
    pub(crate) fn describe_current(&mut self) -> String {
        let token = self.stream.token().clone();
        match (token.kind, &token.value) {
            (TokenKind::Identifier, TokenValue::Ident(ident)) => {
                format!("`{}`", self.stream.name(*ident))
            }
            (TokenKind::Eof, _) => "end of file".to_string(),
            (kind, _) => format!("`{}`", kind.as_str()),
        }
    }

    /// Doc comment of the current token, for attachment to the symbol the
    /// token begins.
    pub(crate) fn take_doc(&mut self) -> DocComment {
        self.stream.token().doc_comment.clone()
    }

    pub(crate) fn intern(&mut self, spelling: &str) -> Ident {
        self.stream.interner_mut().intern(spelling)
    }

    pub(crate) fn generate_id(&mut self, prefix: &str) -> Ident {
        self.stream.interner_mut().generate_id(prefix)
    }

    // ————————————————————————— diagnostics —————————————————————————

    pub(crate) fn error(&mut self, loc: Loc, message: String) {
        self.stream.emit(loc, Severity::Error, message, false);
    }

    pub(crate) fn error_here(&mut self, message: String) {
        let loc = self.loc();
        self.error(loc, message);
    }

    pub(crate) fn warning(&mut self, loc: Loc, message: String) {
        self.stream.emit(loc, Severity::Warning, message, false);
    }

    pub(crate) fn deprecation(&mut self, loc: Loc, message: String) {
        self.stream.emit(loc, Severity::Deprecation, message, false);
    }

    /// A note attached to the previously emitted diagnostic.
    pub(crate) fn supplemental(&mut self, loc: Loc, message: String) {
        self.stream.emit(loc, Severity::Error, message, true);
    }

    // ————————————————————————— recursion budget ————————————————————

    /// Enter a nested construct; on budget exhaustion diagnoses once and
    /// returns false, in which case the caller yields a sentinel.
    pub(crate) fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            if !self.depth_diagnosed {
                self.depth_diagnosed = true;
                self.error_here("parser nesting limit exceeded".to_string());
            }
            return false;
        }
        true
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ————————————————————————— sentinels ———————————————————————————

    pub(crate) fn error_expr(&mut self, loc: Loc) -> ExprId {
        self.ast.make_expr(loc, ExprKind::Error)
    }

    pub(crate) fn error_type(&mut self, loc: Loc) -> TypeId {
        self.ast.make_type(loc, TypeKind::Error)
    }

    pub(crate) fn error_stmt(&mut self, loc: Loc) -> StmtId {
        self.ast.make_stmt(loc, StmtKind::Error)
    }

    pub(crate) fn error_decl(&mut self, loc: Loc) -> DeclId {
        self.ast.make_decl(loc, DeclKind::Error)
    }

    pub(crate) fn error_init(&mut self, loc: Loc) -> InitId {
        self.ast.make_init(loc, InitKind::Error)
    }

    // ————————————————————————— recovery ————————————————————————————

    /// Skip to the next `;` (consumed) or to `}`/end of file (left alone).
    pub(crate) fn resync_semicolon(&mut self) {
        debug!("resynchronising to next `;`");
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

    /// Diagnose premature end of file for an unclosed construct opened at
    /// `open_loc`.
    pub(crate) fn premature_eof(&mut self, expected: TokenKind, open_loc: Loc) {
        let loc = self.loc();
        self.error(
            loc,
            format!("matching `{}` expected, not end of file", expected.as_str()),
        );
        self.supplemental(open_loc, "unmatched opening bracket here".to_string());
    }

    // ————————————————————————— storage classes —————————————————————

    /// Fold one storage class flag into a set, diagnosing redundancy and
    /// group conflicts. The bit is added before conflict detection, so the
    /// returned set may be the conflicting union; first seen wins as far as
    /// the diagnostics are concerned.
    pub(crate) fn append_storage_class(
        &mut self,
        stc: StorageClass,
        bit: StorageClass,
        loc: Loc,
    ) -> StorageClass {
        if stc.intersects(bit) {
            self.error(loc, format!("redundant attribute `{bit}`"));
            return stc | bit;
        }
        let merged = stc | bit;
        for group in [
            StorageClass::MUTABILITY_GROUP,
            StorageClass::GLOBAL_GROUP,
            StorageClass::SAFETY_GROUP,
        ] {
            if bit.intersects(group) && !merged.intersection(group).is_single() {
                self.error(loc, format!("conflicting attribute `{bit}`"));
                return merged;
            }
        }
        // legacy-compat rule: `in` may not combine with `const` or `scope`
        let in_conflicts = StorageClass::CONST | StorageClass::SCOPE;
        if (bit == StorageClass::IN && stc.intersects(in_conflicts))
            || (bit.intersects(in_conflicts) && stc.contains(StorageClass::IN))
        {
            self.error(loc, format!("attribute `{bit}` cannot be combined with `in`"));
        }
        merged
    }

    /// The storage class flag of a simple keyword token, if any.
    pub(crate) fn storage_class_of(kind: TokenKind) -> Option<StorageClass> {
        Some(match kind {
            TokenKind::Const => StorageClass::CONST,
            TokenKind::Immutable => StorageClass::IMMUTABLE,
            TokenKind::Shared => StorageClass::SHARED,
            TokenKind::Inout => StorageClass::WILD,
            TokenKind::Static => StorageClass::STATIC,
            TokenKind::Final => StorageClass::FINAL,
            TokenKind::Auto => StorageClass::AUTO,
            TokenKind::Scope => StorageClass::SCOPE,
            TokenKind::Override => StorageClass::OVERRIDE,
            TokenKind::Abstract => StorageClass::ABSTRACT,
            TokenKind::Synchronized => StorageClass::SYNCHRONIZED,
            TokenKind::Deprecated => StorageClass::DEPRECATED,
            TokenKind::Nothrow => StorageClass::NOTHROW,
            TokenKind::Pure => StorageClass::PURE,
            TokenKind::Ref => StorageClass::REF,
            TokenKind::Gshared => StorageClass::GSHARED,
            TokenKind::Extern => StorageClass::EXTERN,
            TokenKind::Enum => StorageClass::MANIFEST,
            TokenKind::In => StorageClass::IN,
            TokenKind::Out => StorageClass::OUT,
            TokenKind::Lazy => StorageClass::LAZY,
            TokenKind::Return => StorageClass::RETURN,
            _ => return None,
        })
    }

    /// Map a predefined `@identifier` attribute to its storage class.
    pub(crate) fn predefined_at_attribute(&mut self, ident: Ident) -> Option<StorageClass> {
        use dfront_ident::well_known as wk;
        Some(match ident {
            i if i == wk::PROPERTY => StorageClass::PROPERTY,
            i if i == wk::NOGC => StorageClass::NOGC,
            i if i == wk::SAFE => StorageClass::SAFE,
            i if i == wk::TRUSTED => StorageClass::TRUSTED,
            i if i == wk::SYSTEM => StorageClass::SYSTEM,
            i if i == wk::LIVE => StorageClass::LIVE,
            i if i == wk::DISABLE => StorageClass::DISABLE,
            i if i == wk::FUTURE => StorageClass::FUTURE,
            _ => return None,
        })
    }

    // ————————————————————————— module entry ————————————————————————

    /// Parse one whole module: optional header, then declarations to EOF.
    pub fn parse_module(&mut self) -> Vec<DeclId> {
        trace!("parse_module");
        self.parse_module_header();
        let mut decls = Vec::new();
        loop {
            decls.extend(self.parse_decl_defs_until(TokenKind::Eof));
            if self.kind() == TokenKind::Eof {
                break;
            }
            // a stray `}` at module scope; complain and keep going
            let found = self.describe_current();
            self.error_here(format!("unmatched {found} at module scope"));
            self.advance();
        }
        decls
    }

    fn parse_module_header(&mut self) {
        // leading `deprecated(…)` and `@` attributes belong to the module
        // header only when `module` actually follows them
        let start = self.stream.here();
        let after_attrs = crate::probes::skip_attributes(&mut self.stream, start);
        let is_module_header = match after_attrs {
            Some(p) => self.stream.kind_at(p) == TokenKind::Module,
            None => false,
        };
        if !is_module_header && self.kind() != TokenKind::Module {
            return;
        }

        let doc = self.take_doc();
        let mut is_deprecated = false;
        let mut dep_msg = None;
        while self.kind() != TokenKind::Module {
            match self.kind() {
                TokenKind::Deprecated => {
                    let loc = self.loc();
                    self.advance();
                    if is_deprecated {
                        self.error(loc, "redundant attribute `deprecated`".to_string());
                    }
                    is_deprecated = true;
                    if self.check(TokenKind::LeftParen) {
                        dep_msg = Some(self.parse_assign_expr());
                        self.expect(TokenKind::RightParen);
                    }
                }
                TokenKind::At => {
                    if let Some(udas) = self.parse_user_attributes() {
                        self.ast.module_attributes.extend(udas);
                    }
                }
                _ => break,
            }
        }

        let loc = self.loc();
        if !self.check(TokenKind::Module) {
            return;
        }
        let mut packages = Vec::new();
        let mut ident = match self.expect_identifier("`module`") {
            Some(ident) => ident,
            None => {
                self.resync_semicolon();
                return;
            }
        };
        while self.check(TokenKind::Dot) {
            packages.push(ident);
            ident = match self.expect_identifier("`package`") {
                Some(next) => next,
                None => {
                    self.resync_semicolon();
                    return;
                }
            };
        }
        self.expect(TokenKind::Semicolon);
        let module = self.ast.make_decl_with_doc(
            loc,
            DeclKind::Module { packages, ident, is_deprecated, dep_msg },
            doc,
        );
        self.ast.module_decl = Some(module);
    }

    /// Parse a lone expression followed by end of file.
    pub fn parse_standalone_expression(&mut self) -> ExprId {
        let expr = self.parse_expression();
        if self.kind() != TokenKind::Eof {
            let found = self.describe_current();
            self.error_here(format!("unexpected {found} following expression"));
        }
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfront_diagnostics::Collect;
    use dfront_lexer::Lexer;

    fn parser_for(source: &'static str) -> Parser<'static, Collect> {
        let lexer = Lexer::from_source(Some("test.d".into()), source, true);
        Parser::new(TokenStream::new(lexer, Collect::new()), ParseOptions::default())
    }

    #[test]
    fn safety_group_conflicts_once() {
        let mut parser = parser_for("");
        let loc = Loc::initial();
        let mut stc = StorageClass::UNDEFINED;
        stc = parser.append_storage_class(stc, StorageClass::SAFE, loc.clone());
        stc = parser.append_storage_class(stc, StorageClass::SYSTEM, loc.clone());
        // the bit lands before the conflict is detected
        assert!(stc.contains(StorageClass::SAFE));
        assert!(stc.contains(StorageClass::SYSTEM));
        let (_, handler, _) = parser.into_parts();
        assert_eq!(handler.set.error_count(), 1);
        assert!(handler.set[0].message.contains("conflicting attribute"));
    }

    #[test]
    fn redundant_attribute_diagnosed() {
        let mut parser = parser_for("");
        let loc = Loc::initial();
        let mut stc = StorageClass::UNDEFINED;
        stc = parser.append_storage_class(stc, StorageClass::NOTHROW, loc.clone());
        stc = parser.append_storage_class(stc, StorageClass::NOTHROW, loc);
        assert!(stc.contains(StorageClass::NOTHROW));
        let (_, handler, _) = parser.into_parts();
        assert!(handler.set[0].message.contains("redundant attribute"));
    }

    #[test]
    fn in_with_scope_is_a_conflict() {
        let mut parser = parser_for("");
        let loc = Loc::initial();
        let mut stc = StorageClass::UNDEFINED;
        stc = parser.append_storage_class(stc, StorageClass::IN, loc.clone());
        let _ = parser.append_storage_class(stc, StorageClass::SCOPE, loc);
        let (_, handler, _) = parser.into_parts();
        assert_eq!(handler.set.error_count(), 1);
    }

    #[test]
    fn bracket_depth_restored_after_expression() {
        let mut parser = parser_for("a[b[1], 2 .. 3] + [4, 5]");
        let _ = parser.parse_standalone_expression();
        assert_eq!(parser.in_brackets, 0);
        let (_, handler, _) = parser.into_parts();
        assert_eq!(handler.set.error_count(), 0);
    }

    #[test]
    fn module_header_attaches_packages() {
        let mut parser = parser_for("module a.b.c;");
        let decls = parser.parse_module();
        assert!(decls.is_empty());
        let (ast, handler, interner) = parser.into_parts();
        assert_eq!(handler.set.len(), 0);
        let module = match ast.module_decl {
            Some(module) => module,
            None => panic!("no module declaration"),
        };
        match &ast.decl(module).kind {
            DeclKind::Module { packages, ident, .. } => {
                let names: Vec<_> = packages.iter().map(|&p| interner.name(p)).collect();
                assert_eq!(names, ["a", "b"]);
                assert_eq!(interner.name(*ident), "c");
            }
            other => panic!("expected module declaration, got {other:?}"),
        }
    }

    #[test]
    fn missing_module_name_recovers() {
        let mut parser = parser_for("module ;\nint x;");
        let decls = parser.parse_module();
        assert_eq!(decls.len(), 1);
        let (_, handler, _) = parser.into_parts();
        assert!(handler.set.error_count() >= 1);
    }
}
