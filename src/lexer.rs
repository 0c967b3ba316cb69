//! Concrete token source.
//!
//! The spec treats the lexical scanner as an external collaborator,
//! specified only by its interface (spec §1, §6). This module is the
//! "compliant implementation" the parser can be exercised against end to
//! end; any other `TokenSource` impl would do. Grounded on
//! `compiler/parser/lua_tokenize.rs`'s character-dispatch structure,
//! trimmed to the token set this dialect's grammar actually uses and
//! extended with the `@`-conversion and built-in `TO_*` tokens.

use crate::error::SyntaxError;
use crate::token::{Literal, Token, TokenKind};

/// Advanced by `next()` / `lookahead()`, as specified; each token carries
/// kind, line, and semantic payload.
pub trait TokenSource {
    fn next(&mut self) -> Result<Token, SyntaxError>;
    fn lookahead(&mut self) -> Result<Token, SyntaxError>;
    fn line(&self) -> u32;
}

pub struct Lexer<'a> {
    text: &'a [u8],
    pos: usize,
    line: u32,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut pos = 0;
        // shebang, first line only
        if text.as_bytes().starts_with(b"#!") {
            while pos < text.len() && text.as_bytes()[pos] != b'\n' {
                pos += 1;
            }
        }
        Lexer {
            text: text.as_bytes(),
            pos,
            line: 1,
            peeked: None,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.text.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.bump();
                }
                Some(b'-') if self.peek2() == Some(b'-') => {
                    self.pos += 2;
                    if self.peek_byte() == Some(b'[') {
                        if let Some(level) = self.long_bracket_level() {
                            self.skip_long_bracket(level)?;
                            continue;
                        }
                    }
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn long_bracket_level(&self) -> Option<u32> {
        let mut p = self.pos;
        if self.text.get(p) != Some(&b'[') {
            return None;
        }
        p += 1;
        let mut level = 0;
        while self.text.get(p) == Some(&b'=') {
            level += 1;
            p += 1;
        }
        if self.text.get(p) == Some(&b'[') {
            Some(level)
        } else {
            None
        }
    }

    fn skip_long_bracket(&mut self, level: u32) -> Result<String, SyntaxError> {
        self.pos += 2 + level as usize; // '[' '='* '['
        if self.peek_byte() == Some(b'\n') {
            self.bump();
        }
        let start = self.pos;
        loop {
            match self.peek_byte() {
                None => return Err(SyntaxError::new("unfinished long string", self.line)),
                Some(b']') => {
                    let mut p = self.pos + 1;
                    let mut eq = 0;
                    while self.text.get(p) == Some(&b'=') {
                        eq += 1;
                        p += 1;
                    }
                    if eq == level && self.text.get(p) == Some(&b']') {
                        let content = String::from_utf8_lossy(&self.text[start..self.pos]).into_owned();
                        for _ in 0..(2 + level as usize) {
                            self.bump();
                        }
                        return Ok(content);
                    }
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn lex_name_or_keyword(&mut self) -> Token {
        let start = self.pos;
        let line = self.line;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.text[start..self.pos]).unwrap();
        if let Some(kind) = keyword_kind(text) {
            Token::new(kind, line)
        } else {
            Token::with_payload(TokenKind::Name, line, Literal::Name(text.to_string()))
        }
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        let line = self.line;
        let mut is_float = false;
        let hex = self.peek_byte() == Some(b'0')
            && matches!(self.peek2(), Some(b'x') | Some(b'X'));
        if hex {
            self.pos += 2;
            while let Some(b) = self.peek_byte() {
                if b.is_ascii_hexdigit() {
                    self.pos += 1;
                } else if b == b'.' {
                    is_float = true;
                    self.pos += 1;
                } else if (b == b'p' || b == b'P') {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                        self.pos += 1;
                    }
                } else {
                    break;
                }
            }
        } else {
            while let Some(b) = self.peek_byte() {
                if b.is_ascii_digit() {
                    self.pos += 1;
                } else if b == b'.' {
                    is_float = true;
                    self.pos += 1;
                } else if b == b'e' || b == b'E' {
                    is_float = true;
                    self.pos += 1;
                    if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                        self.pos += 1;
                    }
                } else {
                    break;
                }
            }
        }
        let text = std::str::from_utf8(&self.text[start..self.pos]).unwrap();
        if is_float {
            let value: f64 = if hex {
                parse_hex_float(text)
            } else {
                text.parse().unwrap_or(0.0)
            };
            Token::with_payload(TokenKind::Float, line, Literal::Float(value))
        } else if hex {
            let value = i64::from_str_radix(&text[2..], 16).unwrap_or(0);
            Token::with_payload(TokenKind::Int, line, Literal::Int(value))
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::with_payload(TokenKind::Int, line, Literal::Int(value)),
                Err(_) => {
                    let value: f64 = text.parse().unwrap_or(0.0);
                    Token::with_payload(TokenKind::Float, line, Literal::Float(value))
                }
            }
        }
    }

    fn lex_string(&mut self, quote: u8) -> Result<Token, SyntaxError> {
        let line = self.line;
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek_byte() {
                None | Some(b'\n') => {
                    return Err(SyntaxError::new("unfinished string", line));
                }
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.lex_escape(&mut out, line)?;
                }
                Some(b) => {
                    out.push(b as char);
                    self.pos += 1;
                }
            }
        }
        Ok(Token::with_payload(TokenKind::Str, line, Literal::Str(out)))
    }

    fn lex_escape(&mut self, out: &mut String, line: u32) -> Result<(), SyntaxError> {
        match self.peek_byte() {
            Some(b'a') => {
                out.push('\u{7}');
                self.pos += 1;
            }
            Some(b'b') => {
                out.push('\u{8}');
                self.pos += 1;
            }
            Some(b'f') => {
                out.push('\u{c}');
                self.pos += 1;
            }
            Some(b'n') => {
                out.push('\n');
                self.pos += 1;
            }
            Some(b'r') => {
                out.push('\r');
                self.pos += 1;
            }
            Some(b't') => {
                out.push('\t');
                self.pos += 1;
            }
            Some(b'v') => {
                out.push('\u{b}');
                self.pos += 1;
            }
            Some(b'\\') => {
                out.push('\\');
                self.pos += 1;
            }
            Some(b'\'') => {
                out.push('\'');
                self.pos += 1;
            }
            Some(b'"') => {
                out.push('"');
                self.pos += 1;
            }
            Some(b'\n') => {
                out.push('\n');
                self.bump();
            }
            Some(b'z') => {
                self.pos += 1;
                while matches!(self.peek_byte(), Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')) {
                    self.bump();
                }
            }
            Some(b'x') => {
                self.pos += 1;
                let start = self.pos;
                for _ in 0..2 {
                    if matches!(self.peek_byte(), Some(b) if b.is_ascii_hexdigit()) {
                        self.pos += 1;
                    }
                }
                let text = std::str::from_utf8(&self.text[start..self.pos]).unwrap();
                let value = u8::from_str_radix(text, 16).unwrap_or(0);
                out.push(value as char);
            }
            Some(b) if b.is_ascii_digit() => {
                let start = self.pos;
                for _ in 0..3 {
                    if matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
                        self.pos += 1;
                    }
                }
                let text = std::str::from_utf8(&self.text[start..self.pos]).unwrap();
                let value: u32 = text.parse().unwrap_or(0);
                out.push(char::from_u32(value.min(255)).unwrap_or('\0'));
            }
            _ => return Err(SyntaxError::new("invalid escape sequence", line)),
        }
        Ok(())
    }

    fn lex_at(&mut self) -> Token {
        let line = self.line;
        self.pos += 1; // '@'
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word = std::str::from_utf8(&self.text[start..self.pos]).unwrap();
        let array_suffix = || self.peek_byte() == Some(b'[') && self.peek2() == Some(b']');
        match word {
            "integer" if array_suffix() => {
                self.pos += 2;
                Token::new(TokenKind::ToIntArray, line)
            }
            "number" if array_suffix() => {
                self.pos += 2;
                Token::new(TokenKind::ToNumArray, line)
            }
            "integer" => Token::new(TokenKind::ToInteger, line),
            "number" => Token::new(TokenKind::ToNumber, line),
            "table" => Token::new(TokenKind::ToTable, line),
            "string" => Token::new(TokenKind::ToString, line),
            "closure" => Token::new(TokenKind::ToClosure, line),
            _ => {
                // generic '@' Name[.Name]* user-type cast: rewind to before
                // the consumed word so the parser's typeref logic lexes it
                // as an ordinary NAME token.
                self.pos = start;
                Token::new(TokenKind::At, line)
            }
        }
    }

    fn lex_one(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia()?;
        let line = self.line;
        let Some(b) = self.peek_byte() else {
            return Ok(Token::new(TokenKind::Eof, line));
        };
        match b {
            b'@' => Ok(self.lex_at()),
            b'"' | b'\'' => self.lex_string(b),
            b if b.is_ascii_digit() => Ok(self.lex_number()),
            b'.' if matches!(self.peek2(), Some(d) if d.is_ascii_digit()) => Ok(self.lex_number()),
            b if b.is_ascii_alphabetic() || b == b'_' => Ok(self.lex_name_or_keyword()),
            b'[' => {
                if let Some(level) = self.long_bracket_level() {
                    let content = self.skip_long_bracket(level)?;
                    Ok(Token::with_payload(TokenKind::Str, line, Literal::Str(content)))
                } else {
                    self.pos += 1;
                    Ok(Token::new(TokenKind::LBracket, line))
                }
            }
            _ => self.lex_symbol(),
        }
    }

    fn lex_symbol(&mut self) -> Result<Token, SyntaxError> {
        let line = self.line;
        let b = self.bump().unwrap();
        let two = |s: &mut Self| s.bump();
        let kind = match b {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => {
                if self.peek_byte() == Some(b'/') {
                    two(self);
                    TokenKind::DSlash
                } else {
                    TokenKind::Slash
                }
            }
            b'%' => TokenKind::Percent,
            b'^' => TokenKind::Caret,
            b'#' => TokenKind::Hash,
            b'&' => TokenKind::Amp,
            b'|' => TokenKind::Pipe,
            b'~' => {
                if self.peek_byte() == Some(b'=') {
                    two(self);
                    TokenKind::Ne
                } else {
                    TokenKind::Tilde
                }
            }
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b':' => {
                if self.peek_byte() == Some(b':') {
                    two(self);
                    TokenKind::DColon
                } else {
                    TokenKind::Colon
                }
            }
            b'<' => match self.peek_byte() {
                Some(b'=') => {
                    two(self);
                    TokenKind::Le
                }
                Some(b'<') => {
                    two(self);
                    TokenKind::Shl
                }
                _ => TokenKind::Lt,
            },
            b'>' => match self.peek_byte() {
                Some(b'=') => {
                    two(self);
                    TokenKind::Ge
                }
                Some(b'>') => {
                    two(self);
                    TokenKind::Shr
                }
                _ => TokenKind::Gt,
            },
            b'=' => {
                if self.peek_byte() == Some(b'=') {
                    two(self);
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            b'.' => {
                if self.peek_byte() == Some(b'.') {
                    two(self);
                    if self.peek_byte() == Some(b'.') {
                        two(self);
                        TokenKind::Dots
                    } else {
                        TokenKind::Concat
                    }
                } else {
                    TokenKind::Dot
                }
            }
            _ => return Err(SyntaxError::new("unexpected symbol", line)),
        };
        Ok(Token::new(kind, line))
    }
}

impl<'a> TokenSource for Lexer<'a> {
    fn next(&mut self) -> Result<Token, SyntaxError> {
        if let Some(tok) = self.peeked.take() {
            return Ok(tok);
        }
        self.lex_one()
    }

    fn lookahead(&mut self) -> Result<Token, SyntaxError> {
        if let Some(tok) = &self.peeked {
            return Ok(tok.clone());
        }
        let tok = self.lex_one()?;
        self.peeked = Some(tok.clone());
        Ok(tok)
    }

    fn line(&self) -> u32 {
        self.line
    }
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match text {
        "and" => And,
        "break" => Break,
        "do" => Do,
        "else" => Else,
        "elseif" => ElseIf,
        "end" => End,
        "false" => False,
        "for" => For,
        "function" => Function,
        "goto" => Goto,
        "if" => If,
        "in" => In,
        "local" => Local,
        "nil" => Nil,
        "not" => Not,
        "or" => Or,
        "repeat" => Repeat,
        "return" => Return,
        "then" => Then,
        "true" => True,
        "until" => Until,
        "while" => While,
        _ => return None,
    })
}

fn parse_hex_float(text: &str) -> f64 {
    // minimal hex-float support: integer and fractional hex digits, no
    // binary exponent beyond what the grammar needs for literals.
    let body = &text[2..];
    let (mantissa, exp) = match body.split_once(['p', 'P']) {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (body, 0),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let mut value = i64::from_str_radix(int_part, 16).unwrap_or(0) as f64;
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        if let Some(d) = c.to_digit(16) {
            value += d as f64 * scale;
            scale /= 16.0;
        }
    }
    value * 2f64.powi(exp)
}
