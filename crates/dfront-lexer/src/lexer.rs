//! The D scanner: one token per call, diagnostics queued, never failing.

use std::sync::Arc;

use dfront_diagnostics::Severity;
use dfront_ident::Interner;
use dfront_location::Loc;
use dfront_token::{KEYWORDS, Token, TokenKind, TokenValue};

/// A diagnostic produced while lexing, waiting to be transferred to the
/// handler when the token that produced it is consumed.
#[derive(Debug, Clone)]
pub struct PendingDiagnostic {
    pub loc: Loc,
    pub severity: Severity,
    pub message: String,
}

/// Scanner over one source buffer.
///
/// The window `[start, start + length)` restricts lexing to a sub-slice of
/// the buffer, which string-mixin re-parsing uses to lex an expansion in
/// place.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    end: usize,
    file: Option<Arc<str>>,
    line: u32,
    line_start: usize,
    doc_comments: bool,
    pending_doc: Option<String>,
    diagnostics: Vec<PendingDiagnostic>,
    interner: Interner,
}

impl<'a> Lexer<'a> {
    /// Create a scanner for `source[start .. start + length]`.
    pub fn new(
        file: Option<Arc<str>>,
        source: &'a str,
        start: usize,
        length: usize,
        doc_comments: bool,
    ) -> Self {
        let src = source.as_bytes();
        let end = (start + length).min(src.len());
        let mut lexer = Lexer {
            src,
            pos: start.min(end),
            end,
            file,
            line: 1,
            line_start: start,
            doc_comments,
            pending_doc: None,
            diagnostics: Vec::new(),
            interner: Interner::new(),
        };
        lexer.skip_shebang();
        lexer
    }

    /// Scanner over a whole source string.
    pub fn from_source(file: Option<Arc<str>>, source: &'a str, doc_comments: bool) -> Self {
        let len = source.len();
        Lexer::new(file, source, 0, len, doc_comments)
    }

    /// The identifier pool. Shared with the parser through the token stream.
    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Tear down the lexer, keeping the identifier pool alive for consumers
    /// of the parsed tree.
    pub fn into_interner(self) -> Interner {
        self.interner
    }

    /// Move out diagnostics produced since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<PendingDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn error(&mut self, loc: Loc, message: String) {
        self.diagnostics.push(PendingDiagnostic { loc, severity: Severity::Error, message });
    }

    fn deprecation(&mut self, loc: Loc, message: String) {
        self.diagnostics.push(PendingDiagnostic { loc, severity: Severity::Deprecation, message });
    }

    fn here(&self) -> Loc {
        Loc {
            file: self.file.clone(),
            line: self.line,
            column: (self.pos - self.line_start) as u32 + 1,
            offset: self.pos as u32,
        }
    }

    fn byte(&self, at: usize) -> u8 {
        if at < self.end { self.src[at] } else { 0 }
    }

    fn current(&self) -> u8 {
        self.byte(self.pos)
    }

    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
    }

    fn skip_shebang(&mut self) {
        if self.byte(self.pos) == b'#' && self.byte(self.pos + 1) == b'!' {
            while self.pos < self.end && self.src[self.pos] != b'\n' {
                self.pos += 1;
            }
        }
    }

    /// Scan the next token. After the end of input this keeps returning
    /// `Eof` tokens at the final location.
    pub fn scan(&mut self) -> Token {
        loop {
            let loc = self.here();
            if self.pos >= self.end {
                return self.finish(TokenKind::Eof, loc);
            }
            let c = self.src[self.pos];
            match c {
                b' ' | b'\t' | b'\x0b' | b'\x0c' | b'\r' => {
                    self.pos += 1;
                }
                b'\n' => {
                    self.pos += 1;
                    self.newline();
                }
                b'/' => {
                    match self.byte(self.pos + 1) {
                        b'/' => self.scan_line_comment(),
                        b'*' => self.scan_block_comment(loc),
                        b'+' => self.scan_nesting_comment(loc),
                        b'=' => {
                            self.pos += 2;
                            return self.finish(TokenKind::DivAssign, loc);
                        }
                        _ => {
                            self.pos += 1;
                            return self.finish(TokenKind::Div, loc);
                        }
                    }
                }
                b'#' => self.scan_line_directive(loc),
                b'0'..=b'9' => return self.scan_number(loc),
                b'\'' => return self.scan_char_literal(loc),
                b'"' => {
                    let start_loc = loc.clone();
                    return self.scan_double_quoted(loc, start_loc);
                }
                b'`' => return self.scan_wysiwyg(loc, b'`'),
                b'r' if self.byte(self.pos + 1) == b'"' => {
                    self.pos += 1;
                    return self.scan_wysiwyg(loc, b'"');
                }
                b'x' if self.byte(self.pos + 1) == b'"' => return self.scan_hex_string(loc),
                b'q' if self.byte(self.pos + 1) == b'"' => return self.scan_delimited_string(loc),
                b'q' if self.byte(self.pos + 1) == b'{' => return self.scan_token_string(loc),
                b'_' | b'a'..=b'z' | b'A'..=b'Z' => return self.scan_identifier(loc),
                0x80.. => return self.scan_identifier(loc),
                _ => return self.scan_operator(loc),
            }
        }
    }

    fn finish(&mut self, kind: TokenKind, loc: Loc) -> Token {
        let mut token = Token::new(kind, loc);
        if self.doc_comments {
            token.doc_comment = self.pending_doc.take().map(Arc::<str>::from);
        } else {
            self.pending_doc = None;
        }
        token
    }

    fn finish_with(&mut self, kind: TokenKind, loc: Loc, value: TokenValue) -> Token {
        let mut token = self.finish(kind, loc);
        token.value = value;
        token
    }

    // ——— comments ———

    fn scan_line_comment(&mut self) {
        let start = self.pos + 2;
        let is_doc = self.byte(start) == b'/';
        let at = memchr::memchr(b'\n', &self.src[start..self.end])
            .map(|off| start + off)
            .unwrap_or(self.end);
        if is_doc {
            let text = String::from_utf8_lossy(&self.src[start + 1..at]).into_owned();
            self.append_doc(&text);
        }
        self.pos = at;
    }

    fn scan_block_comment(&mut self, loc: Loc) {
        let start = self.pos + 2;
        // `/**/` is an empty plain comment, not a doc comment
        let is_doc = self.byte(start) == b'*' && self.byte(start + 1) != b'/';
        let mut at = start;
        loop {
            if at + 1 >= self.end {
                self.pos = self.end;
                self.error(loc, "unterminated /* */ comment".to_string());
                return;
            }
            if self.src[at] == b'\n' {
                self.pos = at + 1;
                self.newline();
                at += 1;
                continue;
            }
            if self.src[at] == b'*' && self.src[at + 1] == b'/' {
                break;
            }
            at += 1;
        }
        if is_doc {
            let text = String::from_utf8_lossy(&self.src[start + 1..at]).into_owned();
            self.append_doc(&text);
        }
        self.pos = at + 2;
    }

    fn scan_nesting_comment(&mut self, loc: Loc) {
        let start = self.pos + 2;
        let is_doc = self.byte(start) == b'+' && self.byte(start + 1) != b'/';
        let mut at = start;
        let mut depth = 1usize;
        loop {
            if at + 1 >= self.end {
                self.pos = self.end;
                self.error(loc, "unterminated /+ +/ comment".to_string());
                return;
            }
            match (self.src[at], self.src[at + 1]) {
                (b'\n', _) => {
                    self.pos = at + 1;
                    self.newline();
                    at += 1;
                }
                (b'/', b'+') => {
                    depth += 1;
                    at += 2;
                }
                (b'+', b'/') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    at += 2;
                }
                _ => at += 1,
            }
        }
        if is_doc {
            let text = String::from_utf8_lossy(&self.src[start + 1..at]).into_owned();
            self.append_doc(&text);
        }
        self.pos = at + 2;
    }

    fn append_doc(&mut self, text: &str) {
        let trimmed = text.trim();
        match &mut self.pending_doc {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(trimmed);
            }
            None => self.pending_doc = Some(trimmed.to_string()),
        }
    }

    // ——— `#line` ———

    fn scan_line_directive(&mut self, loc: Loc) {
        let rest_start = self.pos + 1;
        let mut at = rest_start;
        while at < self.end && self.src[at] != b'\n' {
            at += 1;
        }
        let rest = String::from_utf8_lossy(&self.src[rest_start..at]).into_owned();
        self.pos = at;
        let mut parts = rest.split_whitespace();
        if parts.next() != Some("line") {
            self.error(loc, "`#` must begin a `#line` directive".to_string());
            return;
        }
        match parts.next().and_then(|n| n.parse::<u32>().ok()) {
            Some(line) => {
                // the newline closing the directive bumps onto `line`
                self.line = line.saturating_sub(1);
                if let Some(name) = parts.next() {
                    let name = name.trim_matches('"');
                    self.file = Some(Arc::from(name));
                }
            }
            None => self.error(loc, "positive integer expected following `#line`".to_string()),
        }
    }

    // ——— identifiers and keywords ———

    fn char_at(&self, at: usize) -> Option<(char, usize)> {
        if at >= self.end {
            return None;
        }
        let slice = std::str::from_utf8(&self.src[at..self.end]).ok()?;
        let c = slice.chars().next()?;
        Some((c, c.len_utf8()))
    }

    fn scan_identifier(&mut self, loc: Loc) -> Token {
        let start = self.pos;
        match self.char_at(self.pos) {
            Some((c, width)) if c == '_' || unicode_ident::is_xid_start(c) => self.pos += width,
            _ => {
                let (_, width) = self.char_at(self.pos).unwrap_or(('\u{fffd}', 1));
                self.pos += width;
                self.error(loc.clone(), "character cannot start an identifier".to_string());
                return self.finish(TokenKind::Error, loc);
            }
        }
        while let Some((c, width)) = self.char_at(self.pos) {
            if c == '_' || c.is_ascii_digit() || unicode_ident::is_xid_continue(c) {
                self.pos += width;
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        if text == "__EOF__" {
            self.pos = self.end;
            return self.finish(TokenKind::Eof, loc);
        }
        if let Some(&kind) = KEYWORDS.get(text.as_str()) {
            return self.finish(kind, loc);
        }
        let ident = self.interner.intern(&text);
        self.finish_with(TokenKind::Identifier, loc, TokenValue::Ident(ident))
    }

    // ——— numbers ———

    fn scan_number(&mut self, loc: Loc) -> Token {
        let start = self.pos;
        if self.current() == b'0' {
            match self.byte(self.pos + 1) {
                b'x' | b'X' => return self.scan_radix_number(loc, 16),
                b'b' | b'B' => return self.scan_radix_number(loc, 2),
                b'0'..=b'9' | b'_' => {
                    self.error(loc.clone(), "octal literals are not supported; use std.conv.octal".to_string());
                    // best effort: lex the digits as decimal
                }
                _ => {}
            }
        }
        while matches!(self.current(), b'0'..=b'9' | b'_') {
            self.pos += 1;
        }
        // float detection: `.` followed by a digit, a trailing `.` that is
        // not a slice or member access, or an exponent
        let mut is_float = false;
        if self.current() == b'.' {
            let after = self.byte(self.pos + 1);
            if after.is_ascii_digit() {
                is_float = true;
                self.pos += 1;
                while matches!(self.current(), b'0'..=b'9' | b'_') {
                    self.pos += 1;
                }
            } else if after != b'.' && !Self::is_ident_start_byte(after) {
                is_float = true;
                self.pos += 1;
            }
        }
        if matches!(self.current(), b'e' | b'E')
            && (self.byte(self.pos + 1).is_ascii_digit()
                || (matches!(self.byte(self.pos + 1), b'+' | b'-')
                    && self.byte(self.pos + 2).is_ascii_digit()))
        {
            is_float = true;
            self.pos += 1;
            if matches!(self.current(), b'+' | b'-') {
                self.pos += 1;
            }
            while matches!(self.current(), b'0'..=b'9' | b'_') {
                self.pos += 1;
            }
        }
        let digits: String = self.src[start..self.pos]
            .iter()
            .map(|&b| b as char)
            .filter(|&c| c != '_')
            .collect();
        if is_float {
            let value = digits.parse::<f64>().unwrap_or_else(|_| {
                self.error(loc.clone(), format!("invalid floating literal `{digits}`"));
                0.0
            });
            return self.finish_float_suffix(loc, value);
        }
        let (value, overflowed) = Self::accumulate(&digits, 10);
        if overflowed {
            self.error(loc.clone(), format!("integer literal `{digits}` overflows"));
        }
        self.finish_int_suffix(loc, value, false)
    }

    fn is_ident_start_byte(b: u8) -> bool {
        b == b'_' || b.is_ascii_alphabetic() || b >= 0x80
    }

    fn scan_radix_number(&mut self, loc: Loc, radix: u32) -> Token {
        self.pos += 2; // 0x / 0b
        let digit_start = self.pos;
        let is_digit = |b: u8| -> bool {
            match radix {
                16 => b.is_ascii_hexdigit(),
                _ => matches!(b, b'0' | b'1'),
            }
        };
        while is_digit(self.current()) || self.current() == b'_' {
            self.pos += 1;
        }
        // hex float: fraction and/or binary exponent
        if radix == 16 {
            let mut is_float = false;
            if self.current() == b'.' && self.byte(self.pos + 1).is_ascii_hexdigit() {
                is_float = true;
                self.pos += 1;
                while self.current().is_ascii_hexdigit() || self.current() == b'_' {
                    self.pos += 1;
                }
            }
            if matches!(self.current(), b'p' | b'P') {
                is_float = true;
                self.pos += 1;
                if matches!(self.current(), b'+' | b'-') {
                    self.pos += 1;
                }
                while self.current().is_ascii_digit() || self.current() == b'_' {
                    self.pos += 1;
                }
            } else if is_float {
                self.error(loc.clone(), "binary-exponent-part required for hex float".to_string());
            }
            if is_float {
                let value = self.hex_float_value(digit_start, loc.clone());
                return self.finish_float_suffix(loc, value);
            }
        }
        let digits: String = self.src[digit_start..self.pos]
            .iter()
            .map(|&b| b as char)
            .filter(|&c| c != '_')
            .collect();
        if digits.is_empty() {
            self.error(loc.clone(), "missing digits after integer base prefix".to_string());
        }
        let (value, overflowed) = Self::accumulate(&digits, radix);
        if overflowed {
            self.error(loc.clone(), format!("integer literal overflows: `{digits}`"));
        }
        self.finish_int_suffix(loc, value, true)
    }

    fn accumulate(digits: &str, radix: u32) -> (u64, bool) {
        let mut value: u64 = 0;
        let mut overflowed = false;
        for c in digits.chars() {
            let digit = c.to_digit(radix).unwrap_or(0) as u64;
            value = match value.checked_mul(radix as u64).and_then(|v| v.checked_add(digit)) {
                Some(v) => v,
                None => {
                    overflowed = true;
                    u64::MAX
                }
            };
        }
        (value, overflowed)
    }

    /// Reassemble a hex float from its already-scanned pieces.
    fn hex_float_value(&mut self, int_start: usize, loc: Loc) -> f64 {
        let text: String = self.src[int_start..self.pos]
            .iter()
            .map(|&b| b as char)
            .filter(|&c| c != '_')
            .collect();
        let (mantissa_text, exp_text) = match text.split_once(['p', 'P']) {
            Some((m, e)) => (m.to_string(), e.to_string()),
            None => (text, "0".to_string()),
        };
        let (int_text, frac_text) = match mantissa_text.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (mantissa_text, String::new()),
        };
        let mut mantissa: f64 = 0.0;
        for c in int_text.chars() {
            mantissa = mantissa * 16.0 + c.to_digit(16).unwrap_or(0) as f64;
        }
        let mut scale = 1.0 / 16.0;
        for c in frac_text.chars() {
            mantissa += c.to_digit(16).unwrap_or(0) as f64 * scale;
            scale /= 16.0;
        }
        let exponent = exp_text.parse::<i32>().unwrap_or_else(|_| {
            self.error(loc, "malformed binary exponent".to_string());
            0
        });
        mantissa * (exponent as f64).exp2()
    }

    fn finish_int_suffix(&mut self, loc: Loc, value: u64, radix_promotes: bool) -> Token {
        let mut unsigned = false;
        let mut long = false;
        loop {
            match self.current() {
                b'u' | b'U' if !unsigned => {
                    unsigned = true;
                    self.pos += 1;
                }
                b'L' if !long => {
                    long = true;
                    self.pos += 1;
                }
                b'l' => {
                    self.pos += 1;
                    self.error(loc.clone(), "lowercase integer suffix `l` is not allowed; use `L`".to_string());
                    long = true;
                }
                _ => break,
            }
        }
        // a float suffix after digits, e.g. 1f
        if !unsigned && !long && matches!(self.current(), b'f' | b'F') {
            return self.finish_float_suffix(loc, value as f64);
        }
        let kind = match (unsigned, long) {
            (true, true) => TokenKind::Uint64Literal,
            (true, false) => {
                if value <= u32::MAX as u64 { TokenKind::Uint32Literal } else { TokenKind::Uint64Literal }
            }
            (false, true) => {
                if value <= i64::MAX as u64 {
                    TokenKind::Int64Literal
                } else {
                    self.error(loc.clone(), "signed integer overflow; use `LU` suffix".to_string());
                    TokenKind::Uint64Literal
                }
            }
            (false, false) => {
                if value <= i32::MAX as u64 {
                    TokenKind::Int32Literal
                } else if radix_promotes && value <= u32::MAX as u64 {
                    TokenKind::Uint32Literal
                } else if value <= i64::MAX as u64 {
                    TokenKind::Int64Literal
                } else if radix_promotes {
                    TokenKind::Uint64Literal
                } else {
                    self.error(loc.clone(), "signed integer overflow; use `LU` suffix".to_string());
                    TokenKind::Uint64Literal
                }
            }
        };
        self.finish_with(kind, loc, TokenValue::Int(value))
    }

    fn finish_float_suffix(&mut self, loc: Loc, value: f64) -> Token {
        let mut kind = TokenKind::Float64Literal;
        match self.current() {
            b'f' | b'F' => {
                kind = TokenKind::Float32Literal;
                self.pos += 1;
            }
            b'L' => {
                kind = TokenKind::Float80Literal;
                self.pos += 1;
            }
            _ => {}
        }
        if self.current() == b'i' {
            self.pos += 1;
            kind = match kind {
                TokenKind::Float32Literal => TokenKind::Imaginary32Literal,
                TokenKind::Float80Literal => TokenKind::Imaginary80Literal,
                _ => TokenKind::Imaginary64Literal,
            };
        }
        self.finish_with(kind, loc, TokenValue::Float(value))
    }

    // ——— characters and strings ———

    fn scan_char_literal(&mut self, loc: Loc) -> Token {
        self.pos += 1; // opening quote
        let value: u32 = match self.current() {
            b'\'' => {
                self.pos += 1;
                self.error(loc.clone(), "empty character literal".to_string());
                return self.finish_with(TokenKind::CharLiteral, loc, TokenValue::Int(0));
            }
            b'\\' => {
                let mut bytes = Vec::new();
                self.scan_escape(&mut bytes, loc.clone());
                // decode the escape back to a code point
                match std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) {
                    Some(c) => c as u32,
                    None => *bytes.first().unwrap_or(&0) as u32,
                }
            }
            0 => {
                self.error(loc.clone(), "unterminated character literal".to_string());
                return self.finish_with(TokenKind::CharLiteral, loc, TokenValue::Int(0));
            }
            _ => match self.char_at(self.pos) {
                Some((c, width)) => {
                    self.pos += width;
                    c as u32
                }
                None => {
                    self.pos += 1;
                    0
                }
            },
        };
        if self.current() == b'\'' {
            self.pos += 1;
        } else {
            self.error(loc.clone(), "unterminated character literal".to_string());
        }
        let kind = if value <= 0xFF {
            TokenKind::CharLiteral
        } else if value <= 0xFFFF {
            TokenKind::WcharLiteral
        } else {
            TokenKind::DcharLiteral
        };
        self.finish_with(kind, loc, TokenValue::Int(value as u64))
    }

    fn scan_double_quoted(&mut self, loc: Loc, start_loc: Loc) -> Token {
        self.pos += 1; // opening quote
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            if self.pos >= self.end {
                self.error(start_loc, "unterminated string literal".to_string());
                break;
            }
            match self.current() {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\\' => self.scan_escape(&mut bytes, loc.clone()),
                b'\n' => {
                    bytes.push(b'\n');
                    self.pos += 1;
                    self.newline();
                }
                b => {
                    bytes.push(b);
                    self.pos += 1;
                }
            }
        }
        let postfix = self.scan_postfix();
        self.finish_with(TokenKind::StringLiteral, loc, TokenValue::Str { bytes: bytes.into(), postfix })
    }

    fn scan_wysiwyg(&mut self, loc: Loc, close: u8) -> Token {
        self.pos += 1; // opening quote
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            if self.pos >= self.end {
                self.error(loc.clone(), "unterminated string literal".to_string());
                break;
            }
            let b = self.current();
            if b == close {
                self.pos += 1;
                break;
            }
            if b == b'\n' {
                self.pos += 1;
                self.newline();
                bytes.push(b'\n');
                continue;
            }
            bytes.push(b);
            self.pos += 1;
        }
        let postfix = self.scan_postfix();
        self.finish_with(TokenKind::StringLiteral, loc, TokenValue::Str { bytes: bytes.into(), postfix })
    }

    fn scan_hex_string(&mut self, loc: Loc) -> Token {
        self.pos += 2; // x"
        let mut bytes: Vec<u8> = Vec::new();
        let mut nibble: Option<u8> = None;
        loop {
            if self.pos >= self.end {
                self.error(loc.clone(), "unterminated hex string".to_string());
                break;
            }
            let b = self.current();
            self.pos += 1;
            match b {
                b'"' => break,
                b' ' | b'\t' | b'\r' => {}
                b'\n' => self.newline(),
                _ if b.is_ascii_hexdigit() => {
                    let digit = (b as char).to_digit(16).unwrap_or(0) as u8;
                    nibble = match nibble {
                        None => Some(digit),
                        Some(high) => {
                            bytes.push((high << 4) | digit);
                            None
                        }
                    };
                }
                _ => self.error(loc.clone(), format!("invalid hex string character `{}`", b as char)),
            }
        }
        if nibble.is_some() {
            self.error(loc.clone(), "odd number of hex digits in hex string".to_string());
        }
        let postfix = self.scan_postfix();
        self.finish_with(TokenKind::HexStringLiteral, loc, TokenValue::Str { bytes: bytes.into(), postfix })
    }

    fn scan_delimited_string(&mut self, loc: Loc) -> Token {
        self.pos += 2; // q"
        let mut bytes: Vec<u8> = Vec::new();
        let delim = self.current();
        let close = match delim {
            b'(' => Some(b')'),
            b'[' => Some(b']'),
            b'{' => Some(b'}'),
            b'<' => Some(b'>'),
            _ => None,
        };
        if let Some(close) = close {
            self.pos += 1;
            let mut depth = 1usize;
            loop {
                if self.pos >= self.end {
                    self.error(loc.clone(), "unterminated delimited string".to_string());
                    break;
                }
                let b = self.current();
                self.pos += 1;
                if b == delim {
                    depth += 1;
                } else if b == close {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                } else if b == b'\n' {
                    self.newline();
                }
                if depth > 0 {
                    bytes.push(b);
                }
            }
            if self.current() == b'"' {
                self.pos += 1;
            } else {
                self.error(loc.clone(), "`\"` expected after delimited string".to_string());
            }
        } else if Self::is_ident_start_byte(delim) {
            // heredoc: q"EOS ... EOS"
            let id_start = self.pos;
            while Self::is_ident_start_byte(self.current()) || self.current().is_ascii_digit() {
                self.pos += 1;
            }
            let terminator = self.src[id_start..self.pos].to_vec();
            if self.current() == b'\n' {
                self.pos += 1;
                self.newline();
            } else {
                self.error(loc.clone(), "newline expected after heredoc identifier".to_string());
            }
            loop {
                if self.pos >= self.end {
                    self.error(loc.clone(), "unterminated heredoc string".to_string());
                    break;
                }
                let line_begin = self.pos;
                let at = memchr::memchr(b'\n', &self.src[line_begin..self.end])
                    .map(|off| line_begin + off)
                    .unwrap_or(self.end);
                let line = &self.src[line_begin..at];
                if line.starts_with(&terminator) && line[terminator.len()..].starts_with(b"\"") {
                    self.pos = line_begin + terminator.len() + 1;
                    break;
                }
                bytes.extend_from_slice(line);
                bytes.push(b'\n');
                self.pos = if at < self.end { at + 1 } else { at };
                if at < self.end {
                    self.newline();
                }
            }
        } else {
            // single arbitrary delimiter character
            self.pos += 1;
            loop {
                if self.pos >= self.end {
                    self.error(loc.clone(), "unterminated delimited string".to_string());
                    break;
                }
                let b = self.current();
                if b == delim && self.byte(self.pos + 1) == b'"' {
                    self.pos += 2;
                    break;
                }
                if b == b'\n' {
                    self.newline();
                }
                bytes.push(b);
                self.pos += 1;
            }
        }
        let postfix = self.scan_postfix();
        self.finish_with(TokenKind::StringLiteral, loc, TokenValue::Str { bytes: bytes.into(), postfix })
    }

    /// `q{ … }`: the body must tokenise; the value is the raw body text.
    fn scan_token_string(&mut self, loc: Loc) -> Token {
        self.pos += 2; // q{
        let body_start = self.pos;
        let mut depth = 1usize;
        loop {
            if self.pos >= self.end {
                self.error(loc.clone(), "unterminated token string".to_string());
                break;
            }
            match self.current() {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.pos += 1;
                }
                b'\n' => {
                    self.pos += 1;
                    self.newline();
                }
                b'"' => {
                    let inner = self.here();
                    self.scan_double_quoted(inner.clone(), inner);
                }
                b'`' => {
                    let inner = self.here();
                    self.scan_wysiwyg(inner, b'`');
                }
                b'\'' => {
                    let inner = self.here();
                    self.scan_char_literal(inner);
                }
                b'/' if matches!(self.byte(self.pos + 1), b'/' | b'*' | b'+') => {
                    let inner = self.here();
                    match self.byte(self.pos + 1) {
                        b'/' => self.scan_line_comment(),
                        b'*' => self.scan_block_comment(inner),
                        _ => self.scan_nesting_comment(inner),
                    }
                }
                _ => self.pos += 1,
            }
        }
        let bytes = self.src[body_start..self.pos.min(self.end)].to_vec();
        if self.current() == b'}' {
            self.pos += 1;
        }
        let postfix = self.scan_postfix();
        self.finish_with(TokenKind::StringLiteral, loc, TokenValue::Str { bytes: bytes.into(), postfix })
    }

    fn scan_postfix(&mut self) -> u8 {
        match self.current() {
            p @ (b'c' | b'w' | b'd') if !Self::is_ident_start_byte(self.byte(self.pos + 1)) && !self.byte(self.pos + 1).is_ascii_digit() => {
                self.pos += 1;
                p
            }
            _ => 0,
        }
    }

    fn scan_escape(&mut self, out: &mut Vec<u8>, loc: Loc) {
        self.pos += 1; // backslash
        let c = self.current();
        self.pos += 1;
        match c {
            b'\'' => out.push(b'\''),
            b'"' => out.push(b'"'),
            b'?' => out.push(b'?'),
            b'\\' => out.push(b'\\'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'x' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < 2 && self.current().is_ascii_hexdigit() {
                    value = value * 16 + (self.current() as char).to_digit(16).unwrap_or(0);
                    self.pos += 1;
                    digits += 1;
                }
                if digits == 0 {
                    self.error(loc, "hex digits expected after \\x".to_string());
                }
                out.push(value as u8);
            }
            b'u' | b'U' => {
                let want = if c == b'u' { 4 } else { 8 };
                let mut value: u32 = 0;
                let mut digits = 0;
                while digits < want && self.current().is_ascii_hexdigit() {
                    value = value * 16 + (self.current() as char).to_digit(16).unwrap_or(0);
                    self.pos += 1;
                    digits += 1;
                }
                if digits != want {
                    self.error(loc.clone(), format!("{want} hex digits expected after \\{}", c as char));
                }
                match char::from_u32(value) {
                    Some(ch) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    }
                    None => self.error(loc, format!("invalid unicode code point U+{value:X}")),
                }
            }
            b'0'..=b'7' => {
                let mut value: u32 = (c - b'0') as u32;
                let mut digits = 1;
                while digits < 3 && matches!(self.current(), b'0'..=b'7') {
                    value = value * 8 + (self.current() - b'0') as u32;
                    self.pos += 1;
                    digits += 1;
                }
                if value > 0xFF {
                    self.error(loc, format!("octal escape \\{value:o} exceeds a byte"));
                }
                out.push(value as u8);
            }
            b'&' => {
                let name_start = self.pos;
                while self.current().is_ascii_alphanumeric() {
                    self.pos += 1;
                }
                let name = String::from_utf8_lossy(&self.src[name_start..self.pos]).into_owned();
                if self.current() == b';' {
                    self.pos += 1;
                } else {
                    self.error(loc.clone(), "`;` expected to close named entity".to_string());
                }
                match name.as_str() {
                    "amp" => out.push(b'&'),
                    "lt" => out.push(b'<'),
                    "gt" => out.push(b'>'),
                    "quot" => out.push(b'"'),
                    "apos" => out.push(b'\''),
                    _ => {
                        self.error(loc, format!("unknown named character entity `&{name};`"));
                        out.push(b'?');
                    }
                }
            }
            0 => self.error(loc, "unterminated escape sequence".to_string()),
            other => {
                self.error(loc, format!("undefined escape sequence \\{}", other as char));
                out.push(other);
            }
        }
    }

    // ——— operators ———

    fn scan_operator(&mut self, loc: Loc) -> Token {
        use TokenKind::*;
        let b0 = self.current();
        let b1 = self.byte(self.pos + 1);
        let b2 = self.byte(self.pos + 2);
        let b3 = self.byte(self.pos + 3);
        let (kind, width) = match (b0, b1, b2, b3) {
            (b'(', ..) => (LeftParen, 1),
            (b')', ..) => (RightParen, 1),
            (b'[', ..) => (LeftBracket, 1),
            (b']', ..) => (RightBracket, 1),
            (b'{', ..) => (LeftCurly, 1),
            (b'}', ..) => (RightCurly, 1),
            (b';', ..) => (Semicolon, 1),
            (b',', ..) => (Comma, 1),
            (b'$', ..) => (Dollar, 1),
            (b'@', ..) => (At, 1),
            (b'?', ..) => (Question, 1),
            (b':', ..) => (Colon, 1),
            (b'.', b'.', b'.', _) => (DotDotDot, 3),
            (b'.', b'.', _, _) => (Slice, 2),
            (b'.', ..) => (Dot, 1),
            (b'+', b'+', _, _) => (PlusPlus, 2),
            (b'+', b'=', _, _) => (AddAssign, 2),
            (b'+', ..) => (Add, 1),
            (b'-', b'-', _, _) => (MinusMinus, 2),
            (b'-', b'=', _, _) => (MinAssign, 2),
            (b'-', ..) => (Min, 1),
            (b'*', b'=', _, _) => (MulAssign, 2),
            (b'*', ..) => (Mul, 1),
            (b'%', b'=', _, _) => (ModAssign, 2),
            (b'%', ..) => (Mod, 1),
            (b'^', b'^', b'=', _) => (PowAssign, 3),
            (b'^', b'^', _, _) => (Pow, 2),
            (b'^', b'=', _, _) => (XorAssign, 2),
            (b'^', ..) => (Xor, 1),
            (b'&', b'&', _, _) => (AndAnd, 2),
            (b'&', b'=', _, _) => (AndAssign, 2),
            (b'&', ..) => (And, 1),
            (b'|', b'|', _, _) => (OrOr, 2),
            (b'|', b'=', _, _) => (OrAssign, 2),
            (b'|', ..) => (Or, 1),
            (b'~', b'=', _, _) => (ConcatenateAssign, 2),
            (b'~', ..) => (Tilde, 1),
            (b'=', b'=', _, _) => (Equal, 2),
            (b'=', b'>', _, _) => (GoesTo, 2),
            (b'=', ..) => (Assign, 1),
            (b'!', b'=', _, _) => (NotEqual, 2),
            (b'!', ..) => (Not, 1),
            (b'<', b'<', b'=', _) => (LeftShiftAssign, 3),
            (b'<', b'<', _, _) => (LeftShift, 2),
            (b'<', b'=', _, _) => (LessOrEqual, 2),
            (b'<', ..) => (LessThan, 1),
            (b'>', b'>', b'>', b'=') => (UnsignedRightShiftAssign, 4),
            (b'>', b'>', b'>', _) => (UnsignedRightShift, 3),
            (b'>', b'>', b'=', _) => (RightShiftAssign, 3),
            (b'>', b'>', _, _) => (RightShift, 2),
            (b'>', b'=', _, _) => (GreaterOrEqual, 2),
            (b'>', ..) => (GreaterThan, 1),
            _ => {
                self.pos += 1;
                self.error(loc.clone(), format!("unrecognised character `{}` (0x{b0:02x})", b0 as char));
                return self.finish(TokenKind::Error, loc);
            }
        };
        self.pos += width;
        self.finish(kind, loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::from_source(Some("test.d".into()), source, false);
        let mut out = Vec::new();
        loop {
            let token = lexer.scan();
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    fn one(source: &str) -> Token {
        let mut lexer = Lexer::from_source(Some("test.d".into()), source, false);
        lexer.scan()
    }

    #[test]
    fn keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("module foo; int x;"),
            vec![Module, Identifier, Semicolon, Int, Identifier, Semicolon]
        );
    }

    #[test]
    fn operators_longest_match() {
        use TokenKind::*;
        assert_eq!(kinds(">>>="), vec![UnsignedRightShiftAssign]);
        assert_eq!(kinds(">>> ="), vec![UnsignedRightShift, Assign]);
        assert_eq!(kinds("^^= ^^ ^="), vec![PowAssign, Pow, XorAssign]);
        assert_eq!(kinds("a..b"), vec![Identifier, Slice, Identifier]);
        assert_eq!(kinds("..."), vec![DotDotDot]);
    }

    #[test]
    fn integer_literal_kinds() {
        assert_eq!(one("42").kind, TokenKind::Int32Literal);
        assert_eq!(one("42").int_value(), Some(42));
        assert_eq!(one("42u").kind, TokenKind::Uint32Literal);
        assert_eq!(one("42L").kind, TokenKind::Int64Literal);
        assert_eq!(one("42uL").kind, TokenKind::Uint64Literal);
        assert_eq!(one("0x8000_0000").kind, TokenKind::Uint32Literal);
        assert_eq!(one("3_000_000_000").kind, TokenKind::Int64Literal);
        assert_eq!(one("0b1010").int_value(), Some(10));
    }

    #[test]
    fn float_literal_kinds() {
        assert_eq!(one("1.5").kind, TokenKind::Float64Literal);
        assert_eq!(one("1.5f").kind, TokenKind::Float32Literal);
        assert_eq!(one("1.5L").kind, TokenKind::Float80Literal);
        assert_eq!(one("1.5i").kind, TokenKind::Imaginary64Literal);
        assert_eq!(one("2e3").kind, TokenKind::Float64Literal);
        match one("0x1.8p1").value {
            TokenValue::Float(v) => assert_eq!(v, 3.0),
            other => panic!("expected float payload, got {other:?}"),
        }
    }

    #[test]
    fn slice_is_not_a_float() {
        use TokenKind::*;
        assert_eq!(kinds("1..2"), vec![Int32Literal, Slice, Int32Literal]);
        assert_eq!(kinds("1.max"), vec![Int32Literal, Dot, Identifier]);
    }

    #[test]
    fn string_literals() {
        let token = one(r#""hi\n""#);
        assert_eq!(token.kind, TokenKind::StringLiteral);
        match token.value {
            TokenValue::Str { bytes, postfix } => {
                assert_eq!(&bytes[..], b"hi\n");
                assert_eq!(postfix, 0);
            }
            other => panic!("expected string payload, got {other:?}"),
        }
        match one(r#"r"a\b"w"#).value {
            TokenValue::Str { bytes, postfix } => {
                assert_eq!(&bytes[..], b"a\\b");
                assert_eq!(postfix, b'w');
            }
            other => panic!("expected string payload, got {other:?}"),
        }
        match one("q{ int x; }").value {
            TokenValue::Str { bytes, .. } => assert_eq!(&bytes[..], b" int x; "),
            other => panic!("expected string payload, got {other:?}"),
        }
        match one(r#"q"(nested (parens))""#).value {
            TokenValue::Str { bytes, .. } => assert_eq!(&bytes[..], b"nested (parens)"),
            other => panic!("expected string payload, got {other:?}"),
        }
        match one("x\"0A FF\"").value {
            TokenValue::Str { bytes, .. } => assert_eq!(&bytes[..], &[0x0A, 0xFF]),
            other => panic!("expected string payload, got {other:?}"),
        }
    }

    #[test]
    fn char_literals() {
        assert_eq!(one("'a'").int_value(), Some('a' as u64));
        assert_eq!(one("'a'").kind, TokenKind::CharLiteral);
        assert_eq!(one(r"'\n'").int_value(), Some(b'\n' as u64));
        assert_eq!(one("'\u{3042}'").kind, TokenKind::WcharLiteral);
    }

    #[test]
    fn comments_and_doc_comments() {
        use TokenKind::*;
        assert_eq!(kinds("a /* b */ c // d\n e /+ /+ nest +/ +/ f"),
            vec![Identifier, Identifier, Identifier, Identifier]);

        let mut lexer = Lexer::from_source(Some("t.d".into()), "/// docs here\nint x;", true);
        let token = lexer.scan();
        assert_eq!(token.kind, Int);
        assert_eq!(token.doc_comment.as_deref(), Some("docs here"));
    }

    #[test]
    fn lexical_errors_are_queued_not_fatal() {
        let mut lexer = Lexer::from_source(Some("t.d".into()), "\"unterminated", false);
        let token = lexer.scan();
        assert_eq!(token.kind, TokenKind::StringLiteral);
        let pending = lexer.take_diagnostics();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].message.contains("unterminated"));
        assert_eq!(lexer.scan().kind, TokenKind::Eof);
    }

    #[test]
    fn eof_token_repeats() {
        let mut lexer = Lexer::from_source(None, "x", false);
        assert_eq!(lexer.scan().kind, TokenKind::Identifier);
        assert_eq!(lexer.scan().kind, TokenKind::Eof);
        assert_eq!(lexer.scan().kind, TokenKind::Eof);
    }

    #[test]
    fn line_directive_updates_location() {
        let mut lexer = Lexer::from_source(Some("t.d".into()), "#line 100 \"gen.d\"\nx", false);
        let token = lexer.scan();
        assert_eq!(token.loc.line, 100);
        assert_eq!(token.loc.file.as_deref(), Some("gen.d"));
    }

    #[test]
    fn eof_keyword_terminates() {
        use TokenKind::*;
        assert_eq!(kinds("a __EOF__ ignored junk \x01"), vec![Identifier]);
    }
}
