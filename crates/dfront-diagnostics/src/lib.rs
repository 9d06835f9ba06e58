//! Diagnostic subsystem for the D front end.
//!
//! The parser and lexer never unwind on bad input; every problem becomes a
//! [`Diagnostic`] delivered to a [`DiagnosticHandler`]. A handler may drop
//! diagnostics ([`Suppress`]), buffer them ([`Collect`]) or format them to
//! sinks as they arrive ([`Immediate`]). Handlers are infallible: a sink
//! write failure degrades to lossy output, it never aborts a parse.

use std::fmt;
use std::io::Write;

use dfront_location::Loc;
use thiserror::Error;

/// Diagnostic severity taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Deprecation,
}

impl Severity {
    /// Label used by the reporter, matching compiler output conventions.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Deprecation => "Deprecation",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One diagnostic: location, formatted message, severity, and any
/// supplemental notes attached after the primary.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub loc: Loc,
    pub severity: Severity,
    pub message: String,
    /// Supplementals always share the severity of their parent.
    supplementals: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(loc: Loc, severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic { loc, severity, message: message.into(), supplementals: Vec::new() }
    }

    /// Attach a supplemental note. The note inherits this diagnostic's
    /// severity regardless of what the caller passed.
    pub fn attach(&mut self, loc: Loc, message: impl Into<String>) {
        self.supplementals.push(Diagnostic::new(loc, self.severity, message));
    }

    pub fn supplementals(&self) -> &[Diagnostic] {
        &self.supplementals
    }
}

/// Append-ordered set of diagnostics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagnosticSet {
    items: Vec<Diagnostic>,
}

impl DiagnosticSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Attach a supplemental to the most recently added diagnostic. A
    /// supplemental with no primary is dropped (the stream was out of order;
    /// there is nothing to attach to).
    pub fn attach_supplemental(&mut self, loc: Loc, message: impl Into<String>) {
        if let Some(last) = self.items.last_mut() {
            last.attach(loc, message);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Diagnostic> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn count_of(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    /// Number of error-severity diagnostics; a parse succeeded iff this is 0.
    pub fn error_count(&self) -> usize {
        self.count_of(Severity::Error)
    }
}

impl std::ops::Index<usize> for DiagnosticSet {
    type Output = Diagnostic;

    fn index(&self, index: usize) -> &Diagnostic {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a DiagnosticSet {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The pluggable handler capability.
///
/// `handle` receives the already-formatted message; `supplemental` marks a
/// note belonging to the previously delivered primary. Supplementals arrive
/// strictly after their primary and at most once per diagnostic.
pub trait DiagnosticHandler {
    fn handle(&mut self, loc: Loc, severity: Severity, message: String, supplemental: bool);
}

/// Drops every diagnostic. Used by speculative parses that only need a
/// yes/no answer.
#[derive(Debug, Default)]
pub struct Suppress;

impl DiagnosticHandler for Suppress {
    fn handle(&mut self, _loc: Loc, _severity: Severity, _message: String, _supplemental: bool) {}
}

/// Buffers diagnostics into an owned [`DiagnosticSet`].
#[derive(Debug, Default)]
pub struct Collect {
    pub set: DiagnosticSet,
}

impl Collect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_set(self) -> DiagnosticSet {
        self.set
    }
}

impl DiagnosticHandler for Collect {
    fn handle(&mut self, loc: Loc, severity: Severity, message: String, supplemental: bool) {
        if supplemental {
            self.set.attach_supplemental(loc, message);
        } else {
            self.set.push(Diagnostic::new(loc, severity, message));
        }
    }
}

/// Formats each diagnostic to a sink the moment it arrives, keyed by
/// severity. Write failures are ignored; reporting must not fail the parse.
pub struct Immediate<W: Write> {
    errors: W,
    warnings: W,
}

impl<W: Write> Immediate<W> {
    /// `errors` receives error-severity lines, `warnings` the rest.
    pub fn new(errors: W, warnings: W) -> Self {
        Immediate { errors, warnings }
    }
}

impl<W: Write> DiagnosticHandler for Immediate<W> {
    fn handle(&mut self, loc: Loc, severity: Severity, message: String, supplemental: bool) {
        let sink = match severity {
            Severity::Error => &mut self.errors,
            _ => &mut self.warnings,
        };
        let line = if supplemental {
            format!("{loc}:        {message}\n")
        } else {
            format!("{loc}: {severity}: {message}\n")
        };
        let _ = sink.write_all(line.as_bytes());
    }
}

/// Drains a collected set to a sink: the primary line for each entry, then
/// each supplemental line indented beneath it.
pub struct Reporter;

impl Reporter {
    pub fn report<W: Write>(set: &DiagnosticSet, sink: &mut W) {
        for diagnostic in set {
            let _ = writeln!(
                sink,
                "{}: {}: {}",
                diagnostic.loc, diagnostic.severity, diagnostic.message
            );
            for note in diagnostic.supplementals() {
                let _ = writeln!(sink, "{}:        {}", note.loc, note.message);
            }
        }
    }
}

/// Failure value of the convenience parse API: the parse finished (it always
/// does) but produced error-severity diagnostics.
#[derive(Debug, Error)]
#[error("{} syntax error(s)", set.error_count())]
pub struct SyntaxErrors {
    pub set: DiagnosticSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn loc(line: u32) -> Loc {
        Loc::new("test.d".into(), line, 1, 0)
    }

    #[test]
    fn collect_orders_and_attaches() {
        let mut handler = Collect::new();
        handler.handle(loc(1), Severity::Error, "unexpected `}`".into(), false);
        handler.handle(loc(2), Severity::Error, "unmatched `{`".into(), true);
        handler.handle(loc(5), Severity::Warning, "dangling else".into(), false);

        let set = handler.into_set();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].supplementals().len(), 1);
        assert_eq!(set[0].supplementals()[0].severity, Severity::Error);
        assert_eq!(set.error_count(), 1);
        assert_eq!(set.count_of(Severity::Warning), 1);
    }

    #[test]
    fn supplemental_shares_parent_severity() {
        let mut diagnostic = Diagnostic::new(loc(1), Severity::Deprecation, "old syntax");
        diagnostic.attach(loc(1), "declared here");
        assert_eq!(diagnostic.supplementals()[0].severity, Severity::Deprecation);
    }

    #[test]
    fn reporter_emits_primary_then_supplementals() {
        let mut handler = Collect::new();
        handler.handle(loc(3), Severity::Error, "missing `;`".into(), false);
        handler.handle(loc(1), Severity::Error, "statement started here".into(), true);

        let mut out = Vec::new();
        Reporter::report(&handler.set, &mut out);
        let text = String::from_utf8(out).unwrap_or_default();
        assert_eq!(
            text,
            "test.d(3,1): Error: missing `;`\ntest.d(1,1):        statement started here\n"
        );
    }

    #[test]
    fn suppress_drops_everything() {
        let mut handler = Suppress;
        handler.handle(loc(1), Severity::Error, "ignored".into(), false);
    }

    #[test]
    fn immediate_routes_by_severity() {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        {
            let mut handler = Immediate::new(&mut errors, &mut warnings);
            handler.handle(loc(1), Severity::Error, "bad".into(), false);
            handler.handle(loc(2), Severity::Warning, "iffy".into(), false);
        }
        assert!(String::from_utf8(errors).unwrap_or_default().contains("Error: bad"));
        assert!(String::from_utf8(warnings).unwrap_or_default().contains("Warning: iffy"));
    }
}
