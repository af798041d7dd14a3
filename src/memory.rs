//! In-memory backend evaluating compiled predicates against JSON rows.
//!
//! Rows are JSON objects keyed by column name. Comparisons follow SQL
//! semantics: a missing or `null` column never matches, not even `ne`.

use crate::ast::{LiteralValue, OrderByDirection};
use crate::literal;
use crate::predicate::{CompareOp, Comparison, Predicate, LIKE_ESCAPE};
use crate::query::QueryBackend;
use serde_json::Value;
use std::cmp::Ordering;

/// Row predicate produced by a search handler.
pub type RowCondition = Box<dyn Fn(&Value) -> bool>;

#[derive(Debug, Clone, Default)]
pub struct MemoryQuery {
    rows: Vec<Value>,
    order: Vec<(String, OrderByDirection)>,
    offset: u64,
    limit: Option<u64>,
}

impl MemoryQuery {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    /// Sorts, then applies offset and limit.
    pub fn into_rows(mut self) -> Vec<Value> {
        let order = std::mem::take(&mut self.order);
        self.rows.sort_by(|a, b| {
            order
                .iter()
                .map(|(column, direction)| {
                    let ord = compare_cells(column_of(a, column), column_of(b, column));
                    match direction {
                        OrderByDirection::Ascending => ord,
                        OrderByDirection::Descending => ord.reverse(),
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = self
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        self.rows.into_iter().skip(skip).take(take).collect()
    }
}

impl QueryBackend for MemoryQuery {
    type Condition = RowCondition;
    type Count = usize;

    fn filter(&mut self, predicate: &Predicate) {
        self.rows.retain(|row| evaluate(predicate, row));
    }

    fn condition(&mut self, condition: RowCondition) {
        self.rows.retain(|row| condition(row));
    }

    fn count(&self) -> usize {
        self.rows.len()
    }

    fn order_by(&mut self, column: &str, direction: OrderByDirection) {
        self.order.push((column.to_string(), direction));
    }

    fn offset(&mut self, skip: u64) {
        self.offset = skip;
    }

    fn limit(&mut self, top: u64) {
        self.limit = Some(top);
    }
}

fn column_of<'v>(row: &'v Value, column: &str) -> &'v Value {
    row.get(column).unwrap_or(&Value::Null)
}

/// Evaluates a condition tree against one row.
pub fn evaluate(predicate: &Predicate, row: &Value) -> bool {
    match predicate {
        Predicate::Compare(comparison) => evaluate_comparison(comparison, row),
        Predicate::And(left, right) => evaluate(left, row) && evaluate(right, row),
        Predicate::Or(left, right) => evaluate(left, row) || evaluate(right, row),
    }
}

fn evaluate_comparison(comparison: &Comparison, row: &Value) -> bool {
    let cell = column_of(row, &comparison.column);

    if comparison.op == CompareOp::Like {
        return match (cell.as_str(), &comparison.value) {
            (Some(text), LiteralValue::String(pattern)) => like_match(text, pattern),
            _ => false,
        };
    }

    let Some(ord) = compare_literal(cell, &comparison.value) else {
        return false;
    };

    match comparison.op {
        CompareOp::Equals => ord == Ordering::Equal,
        CompareOp::NotEquals => ord != Ordering::Equal,
        CompareOp::LessThan => ord == Ordering::Less,
        CompareOp::LessThanOrEqual => ord != Ordering::Greater,
        CompareOp::GreaterThan => ord == Ordering::Greater,
        CompareOp::GreaterThanOrEqual => ord != Ordering::Less,
        CompareOp::Like => false,
    }
}

/// Orders a cell relative to a literal; `None` when they are not comparable.
fn compare_literal(cell: &Value, literal: &LiteralValue) -> Option<Ordering> {
    match literal {
        LiteralValue::Integer(n) => match cell.as_i64() {
            Some(c) => Some(c.cmp(n)),
            None => cell.as_f64()?.partial_cmp(&(*n as f64)),
        },
        LiteralValue::Float(x) => cell.as_f64()?.partial_cmp(x),
        LiteralValue::String(s) => Some(cell.as_str()?.cmp(s.as_str())),
        LiteralValue::Guid(g) => {
            let cell = uuid::Uuid::parse_str(cell.as_str()?).ok()?;
            Some(cell.cmp(g))
        }
        LiteralValue::DateTime(dt) => {
            let cell = literal::parse_datetime(cell.as_str()?)?;
            Some(cell.cmp(dt))
        }
    }
}

/// Total order used for sorting; `null` sorts first.
fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeToken {
    Char(char),
    /// `_`
    One,
    /// `%`
    Any,
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            // a trailing escape stands for itself
            c if c == LIKE_ESCAPE => LikeToken::Char(chars.next().unwrap_or(LIKE_ESCAPE)),
            c => LikeToken::Char(c),
        });
    }
    tokens
}

/// Case-sensitive `LIKE`: `%` matches any run of characters, `_` exactly one,
/// and [`LIKE_ESCAPE`] makes the following character literal.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let pattern = like_tokens(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut t, mut p) = (0, 0);
    // position of the last `%` and the text index it is currently matched up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(LikeToken::Any) => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            Some(LikeToken::One) => {
                t += 1;
                p += 1;
                continue;
            }
            Some(LikeToken::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
                continue;
            }
            _ => {}
        }

        let Some((any_p, any_t)) = backtrack else {
            return false;
        };
        p = any_p + 1;
        t = any_t + 1;
        backtrack = Some((any_p, t));
    }

    pattern[p..].iter().all(|token| *token == LikeToken::Any)
}
