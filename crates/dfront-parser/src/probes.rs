//! Lookahead probes: pure classifiers over the buffered token stream.
//!
//! Every probe takes a [`Pos`] by value and returns the position past the
//! matched construct on success. Probes may walk arbitrarily far ahead (the
//! stream lexes lazily underneath them) but never move the parser's cursor
//! and never emit diagnostics; the parser re-parses the committed
//! interpretation for real afterwards.

use dfront_diagnostics::DiagnosticHandler;
use dfront_lexer::{Pos, TokenStream};
use dfront_token::TokenKind;

/// Identifier policy for [`is_declaration`].
///
/// `MustIfDStyle` is the statement parser's tie-break: where both a
/// declaration and an expression reading are grammatical (`int.max`), it
/// requires a declared identifier from an ordinary D declarator, biasing
/// toward the expression reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NeedDeclaratorId {
    No,
    Opt,
    Must,
    MustIfDStyle,
}

/// Successful declarator probe result.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DeclaratorProbe {
    pub pos: Pos,
    pub have_id: bool,
    pub have_tpl: bool,
    pub c_style: bool,
}

/// `p` must sit on `(`; the position past the matching `)`. Fails on EOF.
pub(crate) fn skip_parens<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
) -> Option<Pos> {
    skip_matched(stream, p, TokenKind::LeftParen, TokenKind::RightParen)
}

/// `p` must sit on `[`; the position past the matching `]`.
pub(crate) fn skip_brackets<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
) -> Option<Pos> {
    skip_matched(stream, p, TokenKind::LeftBracket, TokenKind::RightBracket)
}

fn skip_matched<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
    open: TokenKind,
    close: TokenKind,
) -> Option<Pos> {
    if stream.kind_at(p) != open {
        return None;
    }
    let mut depth = 0usize;
    let mut at = p;
    loop {
        let kind = stream.kind_at(at);
        if kind == open {
            depth += 1;
        } else if kind == close {
            depth -= 1;
            if depth == 0 {
                return Some(at.next());
            }
        } else if kind == TokenKind::Eof {
            return None;
        }
        at = at.next();
    }
}

/// Skip a run of prefix attributes: storage class keywords,
/// `deprecated(…)`, and all `@` forms (`@id`, `@id!arg`, `@id!(args)`,
/// each optionally followed by `(args)`, and `@(args)`).
pub(crate) fn skip_attributes<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
) -> Option<Pos> {
    use TokenKind::*;
    let mut at = p;
    loop {
        match stream.kind_at(at) {
            Const | Immutable | Shared | Inout => {
                // `const(` opens a type constructor, not an attribute
                if stream.kind_at(at.next()) == LeftParen {
                    return Some(at);
                }
                at = at.next();
            }
            Final | Auto | Scope | Override | Abstract | Synchronized | Nothrow | Pure | Ref
            | Gshared | Return => at = at.next(),
            Deprecated => {
                at = at.next();
                if stream.kind_at(at) == LeftParen {
                    at = skip_parens(stream, at)?;
                }
            }
            At => {
                at = at.next();
                match stream.kind_at(at) {
                    Identifier => {
                        at = at.next();
                        if stream.kind_at(at) == Not {
                            at = at.next();
                            if stream.kind_at(at) == LeftParen {
                                at = skip_parens(stream, at)?;
                            } else if stream.kind_at(at) == Eof {
                                return None;
                            } else {
                                at = at.next();
                            }
                        }
                        if stream.kind_at(at) == LeftParen {
                            at = skip_parens(stream, at)?;
                        }
                    }
                    LeftParen => at = skip_parens(stream, at)?,
                    _ => return None,
                }
            }
            _ => return Some(at),
        }
    }
}

/// Recognise a type prefix: builtin types, qualified (possibly templated)
/// identifiers, `typeof(…)`, `__vector(…)`, `__traits(…)`, and the
/// type-constructor-with-parens forms `const(T)` etc.
pub(crate) fn is_basic_type<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
) -> Option<Pos> {
    use TokenKind::*;
    let mut at = p;
    match stream.kind_at(at) {
        kind if kind.is_basic_type() => Some(at.next()),
        Identifier => {
            at = skip_template_instance_segment(stream, at)?;
            skip_dot_chain(stream, at)
        }
        Dot => {
            // leading module-scope dot
            at = at.next();
            if stream.kind_at(at) != Identifier {
                return None;
            }
            at = skip_template_instance_segment(stream, at)?;
            skip_dot_chain(stream, at)
        }
        Typeof | Vector => {
            at = at.next();
            at = skip_parens(stream, at)?;
            skip_dot_chain(stream, at)
        }
        Traits => {
            at = at.next();
            skip_parens(stream, at)
        }
        Mixin => {
            at = at.next();
            skip_parens(stream, at)
        }
        Const | Immutable | Shared | Inout => {
            at = at.next();
            if stream.kind_at(at) != LeftParen {
                return None;
            }
            skip_parens(stream, at)
        }
        _ => None,
    }
}

/// `p` on an identifier: past `id`, `id!arg` or `id!(args)`.
fn skip_template_instance_segment<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
) -> Option<Pos> {
    use TokenKind::*;
    let mut at = p.next(); // identifier
    if stream.kind_at(at) == Not && stream.kind_at(at.next()) != Is && stream.kind_at(at.next()) != In
    {
        at = at.next();
        if stream.kind_at(at) == LeftParen {
            at = skip_parens(stream, at)?;
        } else {
            match stream.kind_at(at) {
                Identifier | StringLiteral | CharLiteral | WcharLiteral | DcharLiteral | True
                | False | Null | This => at = at.next(),
                kind if kind.is_basic_type() || kind.is_integer_literal() => at = at.next(),
                kind if matches!(
                    kind,
                    Float32Literal | Float64Literal | Float80Literal
                ) =>
                {
                    at = at.next()
                }
                _ => return None,
            }
        }
    }
    Some(at)
}

/// `.id` / `.id!(args)` chain after a type root.
fn skip_dot_chain<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
) -> Option<Pos> {
    let mut at = p;
    while stream.kind_at(at) == TokenKind::Dot {
        let after_dot = at.next();
        if stream.kind_at(after_dot) != TokenKind::Identifier {
            return None;
        }
        at = skip_template_instance_segment(stream, after_dot)?;
    }
    Some(at)
}

/// Extend past a basic type: pointers, array suffixes, function/delegate
/// types, then the declarator and its suffixes.
pub(crate) fn is_declarator<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
    end_tok: Option<TokenKind>,
    allow_alt_syntax: bool,
    c_style: bool,
) -> Option<DeclaratorProbe> {
    use TokenKind::*;
    let mut at = p;
    let mut have_id = false;
    let mut have_tpl = false;
    let mut used_c_style = false;
    let mut parens = false;

    // type suffixes
    loop {
        match stream.kind_at(at) {
            Mul => at = at.next(),
            LeftBracket => {
                let after = at.next();
                if stream.kind_at(after) == RightBracket {
                    at = after.next();
                } else if let Some(end) = is_declaration(
                    stream,
                    after,
                    NeedDeclaratorId::No,
                    Some(RightBracket),
                    allow_alt_syntax,
                    c_style,
                ) {
                    // associative array key type
                    at = end.next();
                } else {
                    // [ expression ] or [ expr .. expr ]
                    at = skip_brackets(stream, at)?;
                }
            }
            Delegate | Function => {
                at = at.next();
                at = is_parameters(stream, at, allow_alt_syntax, c_style)?;
                at = skip_attributes(stream, at)?;
            }
            _ => break,
        }
    }

    // the declared identifier, or a parenthesised sub-declarator
    match stream.kind_at(at) {
        Identifier => {
            have_id = true;
            at = at.next();
        }
        LeftParen if allow_alt_syntax => {
            if stream.kind_at(at.next()) == RightParen {
                return None;
            }
            parens = true;
            let inner =
                is_declarator(stream, at.next(), Some(RightParen), allow_alt_syntax, c_style)?;
            have_id |= inner.have_id;
            at = inner.pos;
            if stream.kind_at(at) != RightParen {
                return None;
            }
            at = at.next();
        }
        _ => {}
    }

    // declarator suffixes
    loop {
        match stream.kind_at(at) {
            LeftParen => {
                let past = stream.peek_past_paren(at);
                if stream.kind_at(past) == LeftParen {
                    // template parameter list, then function parameters
                    have_tpl = true;
                    at = is_parameters(stream, past, allow_alt_syntax, c_style)?;
                } else {
                    at = is_parameters(stream, at, allow_alt_syntax, c_style)?;
                }
                at = skip_attributes(stream, at)?;
                break;
            }
            LeftBracket if c_style && have_id => {
                used_c_style = true;
                at = skip_brackets(stream, at)?;
            }
            _ => break,
        }
    }

    // valid terminators
    let terminator_ok = match stream.kind_at(at) {
        RightParen | RightBracket | Assign | Comma | DotDotDot | Semicolon | LeftCurly | In
        | Out | Do => {
            !parens && end_tok.map(|e| e == stream.kind_at(at)).unwrap_or(true)
        }
        Identifier => {
            // `body` terminates a contracted function like `do`
            stream.ident_at(at) == Some(dfront_ident::well_known::BODY)
        }
        If => have_tpl,
        _ => false,
    };
    if !terminator_ok {
        return None;
    }

    Some(DeclaratorProbe { pos: at, have_id, have_tpl, c_style: used_c_style })
}

/// Recognise a complete parameter list starting at `(`.
pub(crate) fn is_parameters<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
    allow_alt_syntax: bool,
    c_style: bool,
) -> Option<Pos> {
    use TokenKind::*;
    if stream.kind_at(p) != LeftParen {
        return None;
    }
    let mut at = p.next();
    loop {
        match stream.kind_at(at) {
            RightParen => break,
            DotDotDot => {
                at = at.next();
                break;
            }
            At => {
                at = skip_attributes(stream, at)?;
            }
            In | Out | Ref | Lazy | Scope | Final | Auto | Return => at = at.next(),
            Const | Immutable | Shared | Inout if stream.kind_at(at.next()) != LeftParen => {
                at = at.next();
            }
            Eof => return None,
            _ => {
                at = is_declaration(stream, at, NeedDeclaratorId::Opt, None, allow_alt_syntax, c_style)?;
                if stream.kind_at(at) == Assign {
                    at = is_expression(stream, at.next())?;
                }
                if stream.kind_at(at) == DotDotDot {
                    at = at.next();
                    break;
                }
                if stream.kind_at(at) == Comma {
                    at = at.next();
                    continue;
                }
                break;
            }
        }
    }
    if stream.kind_at(at) != RightParen {
        return None;
    }
    Some(at.next())
}

/// Scan an expression: walk until an unbalanced closing bracket at depth 0,
/// failing on `;` outside braces and on EOF.
pub(crate) fn is_expression<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
) -> Option<Pos> {
    use TokenKind::*;
    let mut at = p;
    let mut brackets = 0i32;
    let mut parens = 0i32;
    let mut curlies = 0i32;
    loop {
        match stream.kind_at(at) {
            LeftBracket => brackets += 1,
            RightBracket => {
                brackets -= 1;
                if brackets < 0 {
                    return Some(at);
                }
            }
            LeftParen => parens += 1,
            RightParen => {
                parens -= 1;
                if parens < 0 {
                    return Some(at);
                }
            }
            LeftCurly => curlies += 1,
            RightCurly => {
                curlies -= 1;
                if curlies < 0 {
                    return None;
                }
            }
            Semicolon => {
                if curlies == 0 {
                    return None;
                }
            }
            Eof => return None,
            _ => {}
        }
        at = at.next();
    }
}

/// The composite probe: optional storage classes, a basic type, then a
/// declarator, classified under the given identifier policy.
pub(crate) fn is_declaration<H: DiagnosticHandler>(
    stream: &mut TokenStream<'_, H>,
    p: Pos,
    need_id: NeedDeclaratorId,
    end_tok: Option<TokenKind>,
    allow_alt_syntax: bool,
    c_style: bool,
) -> Option<Pos> {
    use TokenKind::*;
    let mut at = p;
    // leading storage classes that do not open a type constructor
    loop {
        match stream.kind_at(at) {
            Const | Immutable | Shared | Inout if stream.kind_at(at.next()) != LeftParen => {
                at = at.next();
            }
            Static | Final | Auto | Scope | Gshared | Ref => at = at.next(),
            _ => break,
        }
    }
    at = is_basic_type(stream, at)?;
    let probe = is_declarator(stream, at, end_tok, allow_alt_syntax, c_style)?;
    match need_id {
        NeedDeclaratorId::No => (!probe.have_id).then_some(probe.pos),
        NeedDeclaratorId::Opt => Some(probe.pos),
        NeedDeclaratorId::Must => probe.have_id.then_some(probe.pos),
        // the statement parser's tie-break: a C-style declarator does not
        // count as a declaration, biasing toward the expression reading
        NeedDeclaratorId::MustIfDStyle => {
            (probe.have_id && (!probe.c_style || probe.have_tpl)).then_some(probe.pos)
        }
    }
}
