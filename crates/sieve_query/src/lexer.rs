//! Lexical analyzer for query programs.
//!
//! Converts the assembled program into [`Token`]s. Whitespace and `#` line
//! comments are skipped. Errors are reported as `E001` diagnostics and produce
//! [`TokenKind::Error`] tokens so the parser can keep going.

use crate::report::Reporter;
use crate::token::{lookup_keyword, Token, TokenKind};
use sieve_diagnostics::DiagnosticCode;
use sieve_source::Span;

/// Lexes `source` into tokens. The result always ends with [`TokenKind::Eof`].
pub(crate) fn lex(source: &str, report: &Reporter<'_>) -> Vec<Token> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
        report,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    report: &'a Reporter<'a>,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.bytes.len() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.pos as u32, self.pos as u32),
                });
                break;
            }
            tokens.push(self.next_token());
        }
        tokens
    }

    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.pos as u32)
    }

    fn error(&self, msg: String, span: Span) {
        self.report
            .emit(self.report.error(DiagnosticCode::LEXICAL, msg, span));
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.peek() == b'#' {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        if b.is_ascii_alphabetic() || b == b'_' {
            return self.lex_word(start);
        }
        if b.is_ascii_digit() {
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
            if self.peek().is_ascii_alphabetic() || self.peek() == b'_' {
                while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                    self.pos += 1;
                }
                let span = self.span_from(start);
                self.error(
                    format!("invalid number `{}`", &self.source[start..self.pos]),
                    span,
                );
                return Token {
                    kind: TokenKind::Error,
                    span,
                };
            }
            return self.token(TokenKind::Int, start);
        }
        if b == b'"' {
            return self.lex_string(start);
        }

        let two = |first: u8, second: u8| b == first && self.peek_at(1) == second;
        let (kind, len) = if two(b'=', b'=') {
            (TokenKind::EqEq, 2)
        } else if two(b'!', b'=') {
            (TokenKind::NotEq, 2)
        } else if two(b'<', b'=') {
            (TokenKind::Le, 2)
        } else if two(b'>', b'=') {
            (TokenKind::Ge, 2)
        } else if two(b'&', b'&') {
            (TokenKind::AndAnd, 2)
        } else if two(b'|', b'|') {
            (TokenKind::OrOr, 2)
        } else {
            let kind = match b {
                b'(' => TokenKind::LeftParen,
                b')' => TokenKind::RightParen,
                b'{' => TokenKind::LeftBrace,
                b'}' => TokenKind::RightBrace,
                b'[' => TokenKind::LeftBracket,
                b']' => TokenKind::RightBracket,
                b',' => TokenKind::Comma,
                b';' => TokenKind::Semicolon,
                b'=' => TokenKind::Assign,
                b'<' => TokenKind::Lt,
                b'>' => TokenKind::Gt,
                b'+' => TokenKind::Plus,
                b'-' => TokenKind::Minus,
                b'*' => TokenKind::Star,
                b'/' => TokenKind::Slash,
                b'%' => TokenKind::Percent,
                b'!' => TokenKind::Bang,
                _ => return self.lex_unexpected(start),
            };
            (kind, 1)
        };
        self.pos += len;
        self.token(kind, start)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn lex_word(&mut self, start: usize) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        self.token(lookup_keyword(text).unwrap_or(TokenKind::Ident), start)
    }

    fn lex_string(&mut self, start: usize) -> Token {
        self.pos += 1;
        loop {
            if self.pos >= self.bytes.len() || self.peek() == b'\n' {
                let span = self.span_from(start);
                self.error("unterminated string literal".to_string(), span);
                return Token {
                    kind: TokenKind::Error,
                    span,
                };
            }
            match self.peek() {
                b'"' => {
                    self.pos += 1;
                    return self.token(TokenKind::Str, start);
                }
                b'\\' if self.pos + 1 < self.bytes.len() && self.peek_at(1) != b'\n' => {
                    self.pos += 2;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn lex_unexpected(&mut self, start: usize) -> Token {
        let ch = self.source[start..].chars().next().unwrap_or('\0');
        self.pos += ch.len_utf8().max(1);
        let span = self.span_from(start);
        let msg = match ch {
            '&' => "unexpected character `&`; logical and is `&&`".to_string(),
            '|' => "unexpected character `|`; logical or is `||`".to_string(),
            '\'' => "unexpected character `'`; strings use double quotes".to_string(),
            other => format!("unexpected character `{other}`"),
        };
        self.error(msg, span);
        Token {
            kind: TokenKind::Error,
            span,
        }
    }
}
