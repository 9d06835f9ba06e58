//! Recursive descent parser for the D programming language.
//!
//! The parser consumes a [`dfront_lexer::TokenStream`] and builds an
//! arena-indexed tree in [`dfront_ast::Ast`]. It never fails and never
//! unwinds: every syntax problem becomes a diagnostic on the configured
//! handler, the offending production yields an error-sentinel node, and
//! parsing resynchronises on the next statement or declaration boundary and
//! carries on to end of file. A parse "succeeded" exactly when no
//! error-severity diagnostics were produced.
//!
//! Declaration-versus-expression ambiguity is resolved without semantic
//! information by the lookahead probes: pure predicates that walk the
//! buffered token stream by value and never move the parser's cursor.
//!
//! # Entry points
//!
//! - [`parse`] — convenience: source in, [`ParsedModule`] out, diagnostics
//!   collected; `Err` when any error-severity diagnostic was produced.
//! - [`Parser::parse_module`] — full control over options and handler.
//! - [`parse_expression_from_string`] — the string re-parse entry used by
//!   mixin expansion (callers synthesise the `<file>-mixin-<line>` location).

mod declarations;
mod expressions;
mod initializers;
mod parser;
mod probes;
mod statements;
mod types;

pub use parser::{ParseOptions, ParsedModule, Parser, PrefixAttributes};

use dfront_ast::{Ast, ExprId};
use dfront_diagnostics::{Collect, SyntaxErrors};
use dfront_ident::Interner;
use dfront_lexer::{Lexer, TokenStream};
use dfront_location::Loc;

/// Parse one module with collected diagnostics.
///
/// Returns `Err` when the parse produced error-severity diagnostics; the
/// tree is still complete (with error sentinels) in the `Ok` case's sense,
/// but callers that need it on failure should drive [`Parser`] directly.
pub fn parse(filename: &str, source: &str) -> Result<ParsedModule, SyntaxErrors> {
    let options = ParseOptions::default();
    let lexer = Lexer::from_source(Some(filename.into()), source, options.doc_comments);
    let stream = TokenStream::new(lexer, Collect::new());
    let mut parser = Parser::new(stream, options);
    let decls = parser.parse_module();
    let (ast, handler, interner) = parser.into_parts();
    let set = handler.into_set();
    if set.error_count() > 0 {
        return Err(SyntaxErrors { set });
    }
    Ok(ParsedModule { ast, decls, interner, diagnostics: set })
}

/// Parse a module, returning the tree and diagnostics unconditionally.
pub fn parse_module_from_string(filename: &str, source: &str, options: ParseOptions) -> ParsedModule {
    let lexer = Lexer::from_source(Some(filename.into()), source, options.doc_comments);
    let stream = TokenStream::new(lexer, Collect::new());
    let mut parser = Parser::new(stream, options);
    let decls = parser.parse_module();
    let (ast, handler, interner) = parser.into_parts();
    ParsedModule { ast, decls, interner, diagnostics: handler.into_set() }
}

/// Parse a single expression from a string, for mixin-style re-parsing.
///
/// `loc` supplies the pseudo-filename and start line (conventionally
/// `<origfile>-mixin-<line>`); diagnostics and the expression's own
/// locations are reported against it.
pub fn parse_expression_from_string(
    loc: Loc,
    text: &str,
    options: ParseOptions,
) -> (Ast, ExprId, Interner, dfront_diagnostics::DiagnosticSet) {
    let lexer = Lexer::from_source(loc.file.clone(), text, options.doc_comments);
    let stream = TokenStream::new(lexer, Collect::new());
    let mut parser = Parser::new(stream, options);
    let expr = parser.parse_standalone_expression();
    let (ast, handler, interner) = parser.into_parts();
    (ast, expr, interner, handler.into_set())
}
