//! Lexer and token stream for the D front end.
//!
//! [`Lexer`] turns one UTF-8 source buffer into tokens; [`TokenStream`]
//! buffers those tokens behind a cursor so the parser gets arbitrary
//! `peek(k)` lookahead and restartable probe positions while diagnostics are
//! surfaced at the predictable point (`advance`).
//!
//! The lexer never fails: lexical errors are queued as diagnostics and the
//! offending input becomes a best-effort token, so the parser always sees a
//! well-formed token sequence ending in [`TokenKind::Eof`].

mod lexer;
mod stream;

pub use lexer::{Lexer, PendingDiagnostic};
pub use stream::{Pos, TokenStream};

pub use dfront_token::{Token, TokenKind, TokenValue};
