//! The token definition for the query language.

/// A token is a single unit of the language, with a specific kind, its source
/// text and location.
///
/// Keywords such as `and`, `eq` or `desc` are never given their own kind; they
/// are lexed as [`TokenKind::Ident`] and recognized by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub literal: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, literal: &'a str, span: Span) -> Self {
        Self { kind, literal, span }
    }

    pub fn eof(position: usize) -> Self {
        Self::new(TokenKind::Eof, "", Span::new(position, position))
    }

    /// Case-insensitive keyword check on an identifier token.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.literal.eq_ignore_ascii_case(keyword)
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Ident,
    Int,
    Float,
    String, // Content between the single quotes
    Guid,
    DateTime,

    // Punctuation
    LParen, // (
    RParen, // )

    // Special
    Illegal, // An illegal/unknown character
    Eof,     // End of input
}

impl TokenKind {
    /// Whether the token can stand on the right-hand side of a comparison.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::String | TokenKind::Int | TokenKind::Guid | TokenKind::DateTime | TokenKind::Float
        )
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
