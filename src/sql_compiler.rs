//! SQL backend that renders compiled predicates with sea-query.

use crate::ast::{LiteralValue, OrderByDirection};
use crate::predicate::{CompareOp, Comparison, Predicate, LIKE_ESCAPE};
use crate::query::QueryBackend;
use sea_query::{
    Asterisk, Cond, Condition, Expr, Func, Iden, LikeExpr, Order, PostgresQueryBuilder, SelectStatement, SimpleExpr,
    SqliteQueryBuilder, Value, Values,
};

/// Table identifier for sea-query
#[derive(Debug, Clone)]
pub struct TableName(pub String);

impl Iden for TableName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Column identifier wrapper
#[derive(Debug, Clone)]
pub struct ColumnName(pub String);

impl Iden for ColumnName {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    Postgres,
    Sqlite,
}

/// `SELECT * FROM <table>` shaped by the query pipeline.
#[derive(Debug, Clone)]
pub struct SqlQuery {
    select: SelectStatement,
}

impl SqlQuery {
    pub fn new(table: &str) -> Self {
        let mut select = SelectStatement::new();
        select.column(Asterisk).from(TableName(table.to_string()));
        Self { select }
    }

    /// SQL with the values inlined.
    pub fn to_sql(&self, dialect: SqlDialect) -> String {
        render(&self.select, dialect)
    }

    /// SQL with placeholders plus the bound values.
    pub fn build(&self, dialect: SqlDialect) -> (String, Values) {
        build(&self.select, dialect)
    }
}

pub fn render(select: &SelectStatement, dialect: SqlDialect) -> String {
    match dialect {
        SqlDialect::Postgres => select.to_string(PostgresQueryBuilder),
        SqlDialect::Sqlite => select.to_string(SqliteQueryBuilder),
    }
}

pub fn build(select: &SelectStatement, dialect: SqlDialect) -> (String, Values) {
    match dialect {
        SqlDialect::Postgres => select.build(PostgresQueryBuilder),
        SqlDialect::Sqlite => select.build(SqliteQueryBuilder),
    }
}

impl QueryBackend for SqlQuery {
    type Condition = Condition;
    /// A `SELECT COUNT(*)` sharing the current `WHERE`
    type Count = SelectStatement;

    fn filter(&mut self, predicate: &Predicate) {
        self.select.cond_where(compile_condition(predicate));
    }

    fn condition(&mut self, condition: Condition) {
        self.select.cond_where(condition);
    }

    fn count(&self) -> SelectStatement {
        let mut count = self.select.clone();
        count.clear_selects();
        count.expr(Func::count(Expr::col(Asterisk)));
        count
    }

    fn order_by(&mut self, column: &str, direction: OrderByDirection) {
        let order = match direction {
            OrderByDirection::Ascending => Order::Asc,
            OrderByDirection::Descending => Order::Desc,
        };
        self.select.order_by(ColumnName(column.to_string()), order);
    }

    fn offset(&mut self, skip: u64) {
        self.select.offset(skip);
    }

    fn limit(&mut self, top: u64) {
        self.select.limit(top);
    }
}

/// Converts the condition tree into a sea-query [`Condition`]. Every `and` /
/// `or` node becomes its own `Cond::all` / `Cond::any` group.
pub fn compile_condition(predicate: &Predicate) -> Condition {
    match predicate {
        Predicate::Compare(comparison) => Cond::all().add(compile_comparison(comparison)),
        Predicate::And(left, right) => Cond::all()
            .add(compile_condition(left))
            .add(compile_condition(right)),
        Predicate::Or(left, right) => Cond::any()
            .add(compile_condition(left))
            .add(compile_condition(right)),
    }
}

fn compile_comparison(comparison: &Comparison) -> SimpleExpr {
    let col = Expr::col(ColumnName(comparison.column.clone()));

    match comparison.op {
        CompareOp::Equals => col.eq(literal_to_value(&comparison.value)),
        CompareOp::NotEquals => col.ne(literal_to_value(&comparison.value)),
        CompareOp::Like => {
            let pattern = match &comparison.value {
                LiteralValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            col.like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
        }
        CompareOp::LessThan => col.lt(literal_to_value(&comparison.value)),
        CompareOp::LessThanOrEqual => col.lte(literal_to_value(&comparison.value)),
        CompareOp::GreaterThan => col.gt(literal_to_value(&comparison.value)),
        CompareOp::GreaterThanOrEqual => col.gte(literal_to_value(&comparison.value)),
    }
}

/// Convert a literal to a sea-query [`Value`]
pub fn literal_to_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::String(s) => s.clone().into(),
        LiteralValue::Integer(n) => (*n).into(),
        LiteralValue::Float(x) => (*x).into(),
        LiteralValue::Guid(g) => (*g).into(),
        LiteralValue::DateTime(dt) => (*dt).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::query::{Pipeline, Query, QueryOptions};
    use crate::schema::{FieldDef, Schema};

    fn schema() -> Schema {
        Schema::new("users")
            .embed(Schema::new("").field(FieldDef::new("Age").column("user_age")))
            .field(FieldDef::new("UserId"))
            .field(FieldDef::new("Firstname"))
            .field(FieldDef::new("DateOfBirth"))
    }

    fn compile_sql(query: Query) -> Result<String, QueryError> {
        let schema = schema();
        let applied = Pipeline::new(&schema).apply(SqlQuery::new(schema.table_name()), &query)?;
        Ok(applied.query.to_sql(SqlDialect::Postgres))
    }

    fn filter(text: &str) -> Query {
        Query {
            filter: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_simple_filter_compilation() {
        let sql = compile_sql(filter("firstname eq 'John'")).unwrap();
        assert!(sql.starts_with(r#"SELECT * FROM "users""#));
        assert!(sql.contains(r#""firstname" = 'John'"#));
    }

    #[test]
    fn test_resolved_column_names() {
        let sql = compile_sql(filter("Age gt 2 and dateOfBirth lt 2000-01-01")).unwrap();
        assert!(sql.contains(r#""user_age" > 2"#));
        assert!(sql.contains(r#""date_of_birth" <"#));
        assert!(sql.contains("AND"));
    }

    #[test]
    fn test_contains_compiles_to_like() {
        let sql = compile_sql(filter("firstname contains 'oh'")).unwrap();
        assert!(sql.contains(r#""firstname" LIKE '%oh%'"#));
    }

    #[test]
    fn test_contains_pattern_is_escaped() {
        let schema = schema();
        let query = filter("firstname contains '_'");
        let applied = Pipeline::new(&schema).apply(SqlQuery::new("users"), &query).unwrap();

        let (sql, values) = applied.query.build(SqlDialect::Sqlite);
        assert!(sql.contains(r#""firstname" LIKE ? ESCAPE"#));
        assert_eq!(values.0, vec![Value::from(r"%\_%".to_string())]);
    }

    #[test]
    fn test_and_is_grouped_inside_or() {
        let sql = compile_sql(filter("firstname eq 'John' and age eq 2 or age eq 3")).unwrap();
        assert!(sql.contains(r#"("firstname" = 'John' AND "user_age" = 2) OR"#));
        assert!(!sql.contains(r#"AND ("user_age" = 2"#));
    }

    #[test]
    fn test_or_is_grouped_inside_and() {
        let sql = compile_sql(filter("firstname eq 'John' and (age eq 2 or age eq 3)")).unwrap();
        assert!(sql.contains(r#"("user_age" = 2 OR "user_age" = 3)"#));
    }

    #[test]
    fn test_order_and_paging() {
        let query = Query {
            order_by: "age desc, firstname".to_string(),
            skip: 5,
            top: 10,
            ..Default::default()
        };
        let sql = compile_sql(query).unwrap();
        assert!(sql.contains(r#"ORDER BY "user_age" DESC, "firstname" ASC"#));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 5"));
    }

    #[test]
    fn test_max_top_limit() {
        let schema = schema();
        let applied = Pipeline::new(&schema)
            .with_options(QueryOptions::with_max_top(4))
            .apply(SqlQuery::new("users"), &Query::default())
            .unwrap();
        assert!(applied.query.to_sql(SqlDialect::Postgres).contains("LIMIT 4"));
    }

    #[test]
    fn test_count_statement_keeps_filter() {
        let schema = schema();
        let query = Query {
            count: true,
            top: 1,
            filter: "age eq 3".to_string(),
            ..Default::default()
        };
        let applied = Pipeline::new(&schema).apply(SqlQuery::new("users"), &query).unwrap();

        let count = render(&applied.count.unwrap(), SqlDialect::Postgres);
        assert!(count.contains("COUNT(*)"));
        assert!(count.contains(r#""user_age" = 3"#));
        assert!(!count.contains("LIMIT"));
    }

    #[test]
    fn test_search_condition() {
        let schema = schema();
        let query = Query {
            search: "jo".to_string(),
            filter: "age gt 1".to_string(),
            ..Default::default()
        };
        let search = |term: &str| Cond::all().add(Expr::col(ColumnName("firstname".to_string())).like(format!("%{}%", term)));

        let applied = Pipeline::new(&schema)
            .apply_with_search(SqlQuery::new("users"), &query, &search)
            .unwrap();
        let sql = applied.query.to_sql(SqlDialect::Postgres);
        assert!(sql.contains(r#""user_age" > 1"#));
        assert!(sql.contains(r#""firstname" LIKE '%jo%'"#));
    }

    #[test]
    fn test_parameterized_build() {
        let query = filter("firstname eq 'John' and age eq 2");
        let schema = schema();
        let applied = Pipeline::new(&schema).apply(SqlQuery::new("users"), &query).unwrap();

        let (sql, values) = applied.query.build(SqlDialect::Sqlite);
        assert!(sql.contains(r#""firstname" = ?"#));
        assert_eq!(values.0.len(), 2);
        assert_eq!(values.0[0], Value::from("John".to_string()));
        assert_eq!(values.0[1], Value::from(2i64));
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let err = compile_sql(filter("NonExistentProperty eq 'John'")).unwrap_err();
        assert_eq!(err, QueryError::UnknownField("NonExistentProperty".to_string()));
    }
}
