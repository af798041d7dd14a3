//! Syntax tree for `$filter` expressions and `$orderby` clauses.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn token_literal(&self) -> &str {
        &self.0
    }
}

/// A filter expression.
///
/// A comparison is always a leaf (`field op literal`) and a logical node always
/// joins two sub-expressions, so the two shapes can never be confused.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Leaf comparison, e.g. `Age gt 10`
    Comparison {
        field: Identifier,
        op: ComparisonOp,
        value: Literal,
    },
    /// `and` / `or` combination
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn logical(op: LogicalOp, left: Expression, right: Expression) -> Self {
        Expression::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The keyword text of the operator at the root of this expression.
    pub fn operator(&self) -> &'static str {
        match self {
            Expression::Comparison { op, .. } => op.keyword(),
            Expression::Logical { op, .. } => op.keyword(),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,       // eq
    Ne,       // ne
    Contains, // contains
    Lt,       // lt
    Lte,      // lte
    Gt,       // gt
    Gte,      // gte
}

impl ComparisonOp {
    /// Case-insensitive keyword lookup.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "eq" => Some(ComparisonOp::Eq),
            "ne" => Some(ComparisonOp::Ne),
            "contains" => Some(ComparisonOp::Contains),
            "lt" => Some(ComparisonOp::Lt),
            "lte" => Some(ComparisonOp::Lte),
            "gt" => Some(ComparisonOp::Gt),
            "gte" => Some(ComparisonOp::Gte),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Contains => "contains",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Lte => "lte",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Gte => "gte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        if keyword.eq_ignore_ascii_case("and") {
            Some(LogicalOp::And)
        } else if keyword.eq_ignore_ascii_case("or") {
            Some(LogicalOp::Or)
        } else {
            None
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

/// A typed literal together with the token text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub raw: String,
}

impl Literal {
    pub fn new(value: LiteralValue, raw: impl Into<String>) -> Self {
        Self { value, raw: raw.into() }
    }

    pub fn token_literal(&self) -> &str {
        &self.raw
    }
}

/// Literal values. These are also the parameter values bound by compiled
/// predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Integer(i64),
    Float(f64),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "'{}'", s),
            LiteralValue::Integer(i) => write!(f, "{}", i),
            LiteralValue::Float(x) => write!(f, "{}", x),
            LiteralValue::Guid(g) => write!(f, "{}", g),
            LiteralValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Ascending,
    Descending,
}

impl OrderByDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            OrderByDirection::Ascending => "asc",
            OrderByDirection::Descending => "desc",
        }
    }
}

/// One `field [asc|desc]` entry of an `$orderby` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByClause {
    pub field: String,
    pub direction: OrderByDirection,
}
