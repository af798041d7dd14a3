//! Lexer for `$filter` and `$orderby` text.

use crate::literal;
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in the input
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Reads a single-quoted string. The opening quote has already been consumed.
    fn read_string(&mut self, start: usize) -> Token<'a> {
        let content_start = self.position;
        while let Some(c) = self.peek() {
            if c == '\'' {
                break;
            }
            self.bump();
        }
        let content_end = self.position;
        self.bump(); // closing quote, if any

        Token::new(
            TokenKind::String,
            &self.input[content_start..content_end],
            Span::new(start, self.position),
        )
    }

    /// Reads an identifier-shaped run and classifies it as GUID, date-time,
    /// float, integer or identifier.
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if is_word_char(c) {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        Token::new(classify(literal), literal, Span::new(start, self.position))
    }

    /// Returns the next token. Once the input is exhausted this keeps
    /// returning [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            return Token::eof(start);
        };

        match c {
            '(' => Token::new(TokenKind::LParen, &self.input[start..self.position], Span::new(start, self.position)),
            ')' => Token::new(TokenKind::RParen, &self.input[start..self.position], Span::new(start, self.position)),
            '\'' => self.read_string(start),
            c if c.is_alphanumeric() || c == '_' => self.read_word(start),
            _ => Token::new(TokenKind::Illegal, &self.input[start..self.position], Span::new(start, self.position)),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

fn classify(literal: &str) -> TokenKind {
    if literal::parse_guid(literal).is_some() {
        return TokenKind::Guid;
    }
    if literal.starts_with(|c: char| c.is_ascii_digit()) {
        if literal::parse_datetime(literal).is_some() {
            return TokenKind::DateTime;
        }
        if literal::strip_float_suffix(literal).is_some() {
            return TokenKind::Float;
        }
        return TokenKind::Int;
    }
    TokenKind::Ident
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
