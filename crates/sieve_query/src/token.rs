//! Token types for the query lexer.
//!
//! Literal values are not stored in the token; the parser reads them back from
//! the source text using the token's [`Span`].

use sieve_source::Span;
use serde::{Deserialize, Serialize};

/// A query token kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    // === Keywords ===
    /// `use`
    Use,
    /// `from`
    From,
    /// `at`
    At,
    /// `in`
    In,
    /// `where`
    Where,
    /// `let`
    Let,
    /// `skip`
    Skip,
    /// `take`
    Take,
    /// `select`
    Select,
    /// `true`
    True,
    /// `false`
    False,

    // === Literals and names ===
    /// An identifier.
    Ident,
    /// A decimal integer literal.
    Int,
    /// A double-quoted string literal, quotes included.
    Str,

    // === Punctuation ===
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,

    // === Operators ===
    /// `=`
    Assign,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,

    // === Special ===
    /// A malformed token; a diagnostic has already been emitted.
    Error,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Returns how the token is written, for "expected ..." messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Use => "`use`",
            TokenKind::From => "`from`",
            TokenKind::At => "`at`",
            TokenKind::In => "`in`",
            TokenKind::Where => "`where`",
            TokenKind::Let => "`let`",
            TokenKind::Skip => "`skip`",
            TokenKind::Take => "`take`",
            TokenKind::Select => "`select`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer",
            TokenKind::Str => "string",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Assign => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Bang => "`!`",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of program",
        }
    }

    /// Returns `true` for tokens that start a query clause.
    pub fn starts_clause(self) -> bool {
        matches!(
            self,
            TokenKind::From
                | TokenKind::Where
                | TokenKind::Let
                | TokenKind::Skip
                | TokenKind::Take
                | TokenKind::Select
        )
    }
}

/// A token with its kind and location in the assembled program.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Byte range in the assembled program.
    pub span: Span,
}

/// Looks up a keyword. Returns `None` for plain identifiers.
pub fn lookup_keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "use" => TokenKind::Use,
        "from" => TokenKind::From,
        "at" => TokenKind::At,
        "in" => TokenKind::In,
        "where" => TokenKind::Where,
        "let" => TokenKind::Let,
        "skip" => TokenKind::Skip,
        "take" => TokenKind::Take,
        "select" => TokenKind::Select,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    })
}
