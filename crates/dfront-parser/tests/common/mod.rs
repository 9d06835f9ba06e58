//! Shared helpers for the parser integration tests.
#![allow(dead_code)]

use dfront_ast::Printer;
use dfront_diagnostics::Severity;
use dfront_parser::{ParseOptions, ParsedModule, parse_module_from_string};

/// Parse a module and require a diagnostic-free result.
pub fn parse_clean(source: &str) -> ParsedModule {
    let parsed = parse_module_from_string("test.d", source, ParseOptions::default());
    assert!(
        parsed.diagnostics.is_empty(),
        "unexpected diagnostics for {source:?}: {:?}",
        parsed.diagnostics
    );
    parsed
}

/// Parse a module, keeping whatever diagnostics were produced.
pub fn parse_any(source: &str) -> ParsedModule {
    parse_module_from_string("test.d", source, ParseOptions::default())
}

/// Render a parsed module back to source.
pub fn printed(parsed: &ParsedModule) -> String {
    Printer::new(&parsed.ast, &parsed.interner).module(&parsed.decls)
}

/// Diagnostic messages of a given severity, in order.
pub fn messages_of(parsed: &ParsedModule, severity: Severity) -> Vec<String> {
    parsed
        .diagnostics
        .iter()
        .filter(|d| d.severity == severity)
        .map(|d| d.message.clone())
        .collect()
}

/// The printed output must be a fixed point: parsing it and printing again
/// reproduces the same text, with no new errors.
pub fn assert_fixed_point(source: &str) {
    let first = parse_any(source);
    assert_eq!(
        first.diagnostics.error_count(),
        0,
        "corpus snippet failed to parse cleanly: {source:?}: {:?}",
        first.diagnostics
    );
    let text1 = printed(&first);
    let second = parse_any(&text1);
    assert_eq!(
        second.diagnostics.error_count(),
        0,
        "printed form failed to re-parse: {text1:?}: {:?}",
        second.diagnostics
    );
    let text2 = printed(&second);
    assert_eq!(text1, text2, "printer output is not a fixed point for {source:?}");
}
