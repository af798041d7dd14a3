//! Compiles OData-style `$filter` / `$orderby` query options into
//! parameterized backend queries.
//!
//! ```text
//! "$filter" ─► Lexer ─► Parser ─► Expression ─► predicate::compile ─► Predicate ─► backend
//! "$orderby" ─► Lexer ─► Parser ─► [OrderByClause] ───────────────────────────────► backend
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod lexer;
pub mod literal;
pub mod memory;
pub mod parser;
pub mod predicate;
pub mod query;
pub mod schema;
pub mod sql_compiler;
pub mod token;

pub use ast::{Expression, OrderByClause, OrderByDirection};
pub use error::QueryError;
pub use query::{Applied, MalformedFilter, Pipeline, Query, QueryBackend, QueryOptions};
pub use schema::{ColumnResolver, FieldDef, Schema};

/// Parses `$filter` text, returning `None` when it is not a valid filter.
pub fn parse_filter(text: &str) -> Option<Expression> {
    parser::Parser::new(lexer::Lexer::new(text)).parse_filter()
}

pub use query::parse_order_by;
