//! Parser for `$orderby` lists and `$filter` expressions.
//!
//! ## Filter grammar
//!
//! ```text
//! filter     := expr
//! expr       := term (("and" | "or") expr)*      // precedence climbing
//! term       := "(" expr ")" | comparison
//! comparison := IDENT op LITERAL
//! op         := "eq" | "ne" | "contains" | "lt" | "lte" | "gt" | "gte"
//! LITERAL    := STRING | INT | FLOAT | GUID | DATETIME
//! ```
//!
//! ## Precedence (high to low)
//!
//! 1. **Grouping** `(expr)`
//! 2. **Comparison** `field op literal`
//! 3. **AND**
//! 4. **OR**
//!
//! Both connectives are left-associative. Keywords are matched
//! case-insensitively against identifier tokens, so a field may itself be
//! called `asc`, `eq` or `and`. A filter must be consumed up to the end of
//! the input; leftover tokens are an error.
//!
//! ## Order-by
//!
//! ```text
//! age desc, firstname
//! ```
//!
//! Any token that is not an identifier (e.g. the comma) is skipped.

use crate::ast::{ComparisonOp, Expression, Identifier, Literal, LiteralValue, LogicalOp, OrderByClause, OrderByDirection};
use crate::lexer::Lexer;
use crate::literal;
use crate::token::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn at_token(message: String, token: &Token<'_>) -> Self {
        let span = if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token.span)
        };
        Self { message, span }
    }
}

/// Two-token lookahead parser over a [`Lexer`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    peek: Token<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self { lexer, current, peek }
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub fn parse_order_by(&mut self) -> Vec<OrderByClause> {
        let mut clauses = Vec::new();

        while !self.current_is(TokenKind::Eof) {
            if !self.current_is(TokenKind::Ident) {
                self.next_token();
                continue;
            }

            let mut clause = OrderByClause {
                field: self.current.literal.to_string(),
                direction: OrderByDirection::Ascending,
            };

            if self.peek.is_keyword("desc") {
                clause.direction = OrderByDirection::Descending;
                self.next_token();
            } else if self.peek.is_keyword("asc") {
                self.next_token();
            }

            clauses.push(clause);
            self.next_token();
        }

        clauses
    }

    /// Parses a filter, returning `None` for any structurally invalid input.
    pub fn parse_filter(&mut self) -> Option<Expression> {
        self.try_parse_filter().ok()
    }

    /// Like [`Parser::parse_filter`] but keeps the reason for a failure.
    pub fn try_parse_filter(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_expression(0)?;
        if !self.current_is(TokenKind::Eof) {
            return Err(ParseError::at_token(
                format!("unexpected token '{}'", self.current.literal),
                &self.current,
            ));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = if self.current_is(TokenKind::LParen) {
            self.next_token(); // (
            let inner = self.parse_expression(0)?;
            if !self.current_is(TokenKind::RParen) {
                return Err(ParseError::at_token(
                    format!("Expected ')', found '{}'", self.current.literal),
                    &self.current,
                ));
            }
            inner
        } else {
            self.parse_comparison()?
        };

        self.next_token();

        while !self.current_is(TokenKind::Eof) && precedence(&self.current) > min_precedence {
            let Some(op) = LogicalOp::from_keyword(self.current.literal) else {
                break;
            };
            let op_precedence = precedence(&self.current);
            self.next_token();

            let right = self.parse_expression(op_precedence)?;
            left = Expression::logical(op, left, right);
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        if !self.current_is(TokenKind::Ident) {
            return Err(ParseError::at_token(
                format!("Expected a property name, found '{}'", self.current.literal),
                &self.current,
            ));
        }
        let field = Identifier(self.current.literal.to_string());

        let op = (self.peek.kind == TokenKind::Ident)
            .then(|| ComparisonOp::from_keyword(self.peek.literal))
            .flatten()
            .ok_or_else(|| {
                ParseError::at_token(
                    format!("Expected a comparison operator after '{}', found '{}'", field.0, self.peek.literal),
                    &self.peek,
                )
            })?;
        self.next_token();

        if !self.peek.kind.is_literal() {
            return Err(ParseError::at_token(
                format!("Expected a literal after '{}', found '{}'", op.keyword(), self.peek.literal),
                &self.peek,
            ));
        }
        if op == ComparisonOp::Contains && self.peek.kind != TokenKind::String {
            return Err(ParseError::at_token(
                format!("'contains' requires a string literal, found '{}'", self.peek.literal),
                &self.peek,
            ));
        }
        self.next_token();

        let value = self.parse_literal()?;
        Ok(Expression::Comparison { field, op, value })
    }

    fn parse_literal(&self) -> Result<Literal, ParseError> {
        let token = &self.current;
        let value = match token.kind {
            TokenKind::String => Some(LiteralValue::String(token.literal.to_string())),
            TokenKind::Int => literal::parse_integer(token.literal).map(LiteralValue::Integer),
            TokenKind::Float => literal::parse_float(token.literal).map(LiteralValue::Float),
            TokenKind::Guid => literal::parse_guid(token.literal).map(LiteralValue::Guid),
            TokenKind::DateTime => literal::parse_datetime(token.literal).map(LiteralValue::DateTime),
            _ => None,
        };

        value
            .map(|value| Literal::new(value, token.literal))
            .ok_or_else(|| ParseError::at_token(format!("Invalid literal '{}'", token.literal), token))
    }
}

fn precedence(token: &Token<'_>) -> u8 {
    if token.is_keyword("and") {
        2
    } else if token.is_keyword("or") {
        1
    } else {
        0
    }
}
