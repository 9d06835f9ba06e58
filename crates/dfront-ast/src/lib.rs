//! AST arena, attribute model and pretty-printer for the D front end.
//!
//! The tree is arena-indexed: nodes live in typed vectors inside [`Ast`] and
//! refer to each other through plain index newtypes. The parser constructs
//! nodes exclusively through the arena's `make_*` methods and hands the
//! whole arena to the caller; there is no per-node ownership to manage.
//!
//! [`printer::Printer`] renders a tree back to D source, parenthesising by
//! the fixed [`precedence`] table. Its output is a fixed point under
//! re-parsing, which is what the round-trip tests check.

pub mod ast;
pub mod attributes;
pub mod precedence;
pub mod printer;

pub use ast::*;
pub use attributes::{CppMangle, Linkage, ModFlags, Protection, StorageClass};
pub use precedence::{Prec, binop_prec, expr_prec};
pub use printer::Printer;
