//! Compiles a filter [`Expression`] into a backend-neutral condition tree.
//!
//! ```text
//! Name eq 'John' and Age eq 10 or Id eq 10
//!
//!            Or
//!          /    \
//!        And     id = 10
//!       /   \
//! name = 'John'  age = 10
//! ```
//!
//! Connectives never rely on the backend's own precedence: [`Predicate::render`]
//! parenthesizes every operand of an `OR`, and an `OR` nested under an `AND`.

use crate::ast::{ComparisonOp, Expression, LiteralValue, LogicalOp};
use crate::error::{QueryError, Result};
use crate::schema::ColumnResolver;
use std::fmt;
use tracing::debug;

/// Leaf comparison operators understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    NotEquals,
    /// Pattern match; `%` matches any run of characters, `_` any single
    /// character, and [`LIKE_ESCAPE`] makes the next character literal
    Like,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl CompareOp {
    pub fn sql(self) -> &'static str {
        match self {
            CompareOp::Equals => "=",
            CompareOp::NotEquals => "<>",
            CompareOp::Like => "LIKE",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub column: String,
    pub op: CompareOp,
    pub value: LiteralValue,
}

/// Boolean condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Comparison),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

/// Compiles `expr`, resolving every field through `resolver`.
///
/// Fails with [`QueryError::UnknownField`] on the first field that cannot be
/// resolved.
pub fn compile<R>(expr: &Expression, resolver: &R) -> Result<Predicate>
where
    R: ColumnResolver + ?Sized,
{
    match expr {
        Expression::Comparison { field, op, value } => {
            let column = resolver
                .resolve(field.token_literal())
                .ok_or_else(|| QueryError::UnknownField(field.0.clone()))?;
            debug!(field = %field.0, column = %column, op = op.keyword(), "resolved filter field");

            let (op, value) = match op {
                ComparisonOp::Eq => (CompareOp::Equals, value.value.clone()),
                ComparisonOp::Ne => (CompareOp::NotEquals, value.value.clone()),
                ComparisonOp::Contains => (CompareOp::Like, contains_pattern(&value.value)),
                ComparisonOp::Lt => (CompareOp::LessThan, value.value.clone()),
                ComparisonOp::Lte => (CompareOp::LessThanOrEqual, value.value.clone()),
                ComparisonOp::Gt => (CompareOp::GreaterThan, value.value.clone()),
                ComparisonOp::Gte => (CompareOp::GreaterThanOrEqual, value.value.clone()),
            };

            Ok(Predicate::Compare(Comparison { column, op, value }))
        }
        Expression::Logical { op, left, right } => {
            let left = Box::new(compile(left, resolver)?);
            let right = Box::new(compile(right, resolver)?);
            Ok(match op {
                LogicalOp::And => Predicate::And(left, right),
                LogicalOp::Or => Predicate::Or(left, right),
            })
        }
    }
}

/// Escape character of `Like` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// `%text%` with the wildcards and the escape character of `text` escaped.
fn contains_pattern(value: &LiteralValue) -> LiteralValue {
    let text = match value {
        LiteralValue::String(s) => s.clone(),
        // The parser only accepts string operands for `contains`.
        other => other.to_string(),
    };

    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    LiteralValue::String(pattern)
}

impl Predicate {
    /// Renders the tree as a parameterized predicate with `?` placeholders,
    /// returning the bound values in placeholder order.
    pub fn render(&self) -> (String, Vec<LiteralValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write(&mut sql, &mut |v: &LiteralValue, out: &mut String| {
            params.push(v.clone());
            out.push('?');
        });
        (sql, params)
    }

    /// Visits every leaf comparison, left to right.
    pub fn comparisons(&self) -> Vec<&Comparison> {
        let mut leaves = Vec::new();
        self.collect(&mut leaves);
        leaves
    }

    fn collect<'a>(&'a self, leaves: &mut Vec<&'a Comparison>) {
        match self {
            Predicate::Compare(c) => leaves.push(c),
            Predicate::And(l, r) | Predicate::Or(l, r) => {
                l.collect(leaves);
                r.collect(leaves);
            }
        }
    }

    fn write(&self, out: &mut String, value: &mut dyn FnMut(&LiteralValue, &mut String)) {
        match self {
            Predicate::Compare(c) => {
                out.push_str(&c.column);
                out.push(' ');
                out.push_str(c.op.sql());
                out.push(' ');
                value(&c.value, out);
            }
            Predicate::And(l, r) => {
                l.write_operand(out, value, matches!(**l, Predicate::Or(..)));
                out.push_str(" AND ");
                r.write_operand(out, value, matches!(**r, Predicate::Or(..)));
            }
            Predicate::Or(l, r) => {
                l.write_operand(out, value, true);
                out.push_str(" OR ");
                r.write_operand(out, value, true);
            }
        }
    }

    fn write_operand(&self, out: &mut String, value: &mut dyn FnMut(&LiteralValue, &mut String), group: bool) {
        if group {
            out.push('(');
        }
        self.write(out, value);
        if group {
            out.push(')');
        }
    }
}

/// Same layout as [`Predicate::render`] with the values inlined.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::new();
        self.write(&mut text, &mut |v: &LiteralValue, out: &mut String| out.push_str(&v.to_string()));
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::schema::{FieldDef, Schema};

    fn schema() -> Schema {
        Schema::new("users")
            .embed(Schema::new("").field(FieldDef::new("Age").column("user_age")))
            .field(FieldDef::new("Id"))
            .field(FieldDef::new("FirstName"))
    }

    fn compile_str(input: &str) -> Result<Predicate> {
        let expr = Parser::new(Lexer::new(input)).parse_filter().expect("filter should parse");
        compile(&expr, &schema())
    }

    #[test]
    fn test_leaf_operators() {
        let cases = [
            ("age eq 1", "user_age = 1"),
            ("age ne 1", "user_age <> 1"),
            ("age lt 1", "user_age < 1"),
            ("age lte 1", "user_age <= 1"),
            ("age gt 1", "user_age > 1"),
            ("age gte 1", "user_age >= 1"),
            ("firstname contains 'oh'", "first_name LIKE '%oh%'"),
        ];
        for (input, expected) in cases {
            assert_eq!(compile_str(input).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_contains_escapes_wildcards() {
        let pattern_of = |input: &str| compile_str(input).unwrap().comparisons()[0].value.clone();

        assert_eq!(pattern_of("firstname contains '_'"), LiteralValue::String(r"%\_%".to_string()));
        assert_eq!(pattern_of("firstname contains '100%'"), LiteralValue::String(r"%100\%%".to_string()));
        assert_eq!(pattern_of(r"firstname contains 'a\b'"), LiteralValue::String(r"%a\\b%".to_string()));
    }

    #[test]
    fn test_and_or_grouping() {
        let predicate = compile_str("firstname eq 'John' and age eq 2 or age eq 3").unwrap();
        let (sql, params) = predicate.render();

        assert_eq!(sql, "(first_name = ? AND user_age = ?) OR (user_age = ?)");
        assert_eq!(
            params,
            vec![
                LiteralValue::String("John".to_string()),
                LiteralValue::Integer(2),
                LiteralValue::Integer(3),
            ]
        );
    }

    #[test]
    fn test_or_under_and_is_grouped() {
        let predicate = compile_str("firstname eq 'John' and (age eq 2 or age eq 3)").unwrap();
        assert_eq!(
            predicate.render().0,
            "first_name = ? AND ((user_age = ?) OR (user_age = ?))"
        );
    }

    #[test]
    fn test_chained_and_stays_flat() {
        let predicate = compile_str("age gt 1 and age lt 5 and id ne 3").unwrap();
        assert_eq!(predicate.render().0, "user_age > ? AND user_age < ? AND id <> ?");
    }

    #[test]
    fn test_unknown_field_aborts() {
        let err = compile_str("age eq 1 or NonExistentProperty eq 'John'").unwrap_err();
        assert_eq!(err, QueryError::UnknownField("NonExistentProperty".to_string()));
        assert_eq!(err.to_string(), "NonExistentProperty doesn't exist");
    }

    #[test]
    fn test_literal_types_carried_through() {
        let predicate = compile_str("id eq e4c7772b-8947-4e46-98ed-644b417d2a08 or age eq 1.5f").unwrap();
        let values: Vec<_> = predicate.comparisons().into_iter().map(|c| c.value.clone()).collect();
        assert!(matches!(values[0], LiteralValue::Guid(_)));
        assert_eq!(values[1], LiteralValue::Float(1.5));
    }
}
