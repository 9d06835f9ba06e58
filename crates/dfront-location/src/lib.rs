//! Source location tracking for the D front end.
//!
//! A [`Loc`] names a point in one source buffer: file name, 1-based line and
//! column, and the byte offset into the buffer. Locations are attached to
//! every token and AST node and flow into diagnostics unchanged.

use std::fmt;
use std::sync::Arc;

/// A point in a source buffer.
///
/// The default value is the *initial* sentinel (no file, line 0), used for
/// synthesised nodes that have no source position of their own. Real
/// locations always have a non-zero line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Loc {
    /// Name of the source buffer. Synthesised buffers use pseudo-names such
    /// as `foo.d-mixin-12`.
    pub file: Option<Arc<str>>,
    /// 1-based line number; 0 means "initial/uninitialized".
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
    /// Byte offset from the start of the buffer.
    pub offset: u32,
}

impl Loc {
    /// Create a location inside the named file.
    pub fn new(file: Arc<str>, line: u32, column: u32, offset: u32) -> Self {
        Loc { file: Some(file), line, column, offset }
    }

    /// The sentinel for "no location".
    pub fn initial() -> Self {
        Loc::default()
    }

    /// Whether this is the initial sentinel rather than a real position.
    pub fn is_initial(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), 0) => write!(f, "{file}"),
            (Some(file), line) => write!(f, "{file}({line},{})", self.column),
            (None, 0) => write!(f, "<no location>"),
            (None, line) => write!(f, "({line},{})", self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_sentinel() {
        let loc = Loc::initial();
        assert!(loc.is_initial());
        assert_eq!(loc, Loc::default());
    }

    #[test]
    fn display_with_file() {
        let loc = Loc::new("app.d".into(), 3, 7, 42);
        assert!(!loc.is_initial());
        assert_eq!(loc.to_string(), "app.d(3,7)");
    }

    #[test]
    fn display_without_file() {
        assert_eq!(Loc::initial().to_string(), "<no location>");
    }
}
