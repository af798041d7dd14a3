//! Query options and the pipeline that applies them to a backend query.
//!
//! ```text
//! top check ─► $filter ─► $search ─► $count ─► $orderby ─► $skip / $top
//! ```

use crate::ast::{OrderByClause, OrderByDirection};
use crate::error::{QueryError, Result};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::predicate::{self, Predicate};
use crate::schema::ColumnResolver;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Raw query options as supplied by the caller. Nothing is parsed until the
/// query is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub top: u64,
    pub skip: u64,
    pub count: bool,
    #[serde(rename = "orderby")]
    pub order_by: String,
    pub select: String,
    pub search: String,
    pub filter: String,
}

/// What to do with a `$filter` that does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedFilter {
    /// Fail with [`QueryError::MalformedFilter`]
    #[default]
    Reject,
    /// Apply no filter at all
    Ignore,
}

/// Resource-level limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub max_top: Option<u64>,
    pub malformed_filter: MalformedFilter,
}

impl QueryOptions {
    pub fn with_max_top(max_top: u64) -> Self {
        Self {
            max_top: Some(max_top),
            ..Default::default()
        }
    }
}

/// A backend query under construction.
pub trait QueryBackend {
    /// Native condition produced by a search handler
    type Condition;
    /// What a count request yields (a number, or a statement to run)
    type Count;

    fn filter(&mut self, predicate: &Predicate);
    fn condition(&mut self, condition: Self::Condition);
    fn count(&self) -> Self::Count;
    fn order_by(&mut self, column: &str, direction: OrderByDirection);
    fn offset(&mut self, skip: u64);
    fn limit(&mut self, top: u64);
}

/// Caller-defined `$search` handler.
pub type SearchFn<'s, C> = dyn Fn(&str) -> C + 's;

/// The shaped backend query and, when `$count` was requested, the count.
#[derive(Debug)]
pub struct Applied<B: QueryBackend> {
    pub query: B,
    pub count: Option<B::Count>,
}

/// Parses `$orderby` text into clauses.
pub fn parse_order_by(text: &str) -> Vec<OrderByClause> {
    Parser::new(Lexer::new(text)).parse_order_by()
}

/// Applies [`Query`] values to backends, resolving properties through `R`.
pub struct Pipeline<'r, R: ?Sized> {
    resolver: &'r R,
    options: QueryOptions,
}

impl<'r, R> Pipeline<'r, R>
where
    R: ColumnResolver + ?Sized,
{
    pub fn new(resolver: &'r R) -> Self {
        Self {
            resolver,
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses and compiles a `$filter`. `Ok(None)` means no filter applies.
    pub fn compile_filter(&self, text: &str) -> Result<Option<Predicate>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let expr = match Parser::new(Lexer::new(text)).try_parse_filter() {
            Ok(expr) => expr,
            Err(err) => match self.options.malformed_filter {
                MalformedFilter::Reject => return Err(QueryError::MalformedFilter(err)),
                MalformedFilter::Ignore => {
                    warn!(filter = text, error = %err, "ignoring malformed filter");
                    return Ok(None);
                }
            },
        };

        predicate::compile(&expr, self.resolver).map(Some)
    }

    pub fn apply<B: QueryBackend>(&self, backend: B, query: &Query) -> Result<Applied<B>> {
        self.run(backend, query, None)
    }

    pub fn apply_with_search<B: QueryBackend>(
        &self,
        backend: B,
        query: &Query,
        search: &SearchFn<'_, B::Condition>,
    ) -> Result<Applied<B>> {
        self.run(backend, query, Some(search))
    }

    fn run<B: QueryBackend>(
        &self,
        mut backend: B,
        query: &Query,
        search: Option<&SearchFn<'_, B::Condition>>,
    ) -> Result<Applied<B>> {
        if let Some(max_top) = self.options.max_top {
            if query.top > max_top {
                return Err(QueryError::TopExceedsMaximum { top: query.top, max_top });
            }
        }

        // Everything that can fail is resolved before the backend is touched.
        let predicate = self.compile_filter(&query.filter)?;
        let order = self.resolve_order_by(&query.order_by)?;

        if let Some(predicate) = &predicate {
            debug!(%predicate, "applying filter");
            backend.filter(predicate);
        }

        if let Some(search) = search {
            if !query.search.is_empty() {
                debug!(term = %query.search, "applying search");
                backend.condition(search(&query.search));
            }
        }

        let count = query.count.then(|| backend.count());

        for (column, direction) in &order {
            backend.order_by(column, *direction);
        }

        if query.skip > 0 {
            backend.offset(query.skip);
        }

        if query.top > 0 {
            backend.limit(query.top);
        } else if let Some(max_top) = self.options.max_top.filter(|m| *m > 0) {
            backend.limit(max_top);
        }

        Ok(Applied { query: backend, count })
    }

    fn resolve_order_by(&self, text: &str) -> Result<Vec<(String, OrderByDirection)>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        parse_order_by(text)
            .into_iter()
            .map(|clause| {
                self.resolver
                    .resolve(&clause.field)
                    .map(|column| (column, clause.direction))
                    .ok_or(QueryError::UnknownField(clause.field))
            })
            .collect()
    }
}
