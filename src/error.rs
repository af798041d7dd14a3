//! Errors raised while applying a query.

use crate::parser::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("The value supplied for the query parameter 'Top' was greater than the maximum top allowed for this resource")]
    TopExceedsMaximum { top: u64, max_top: u64 },

    #[error("{0} doesn't exist")]
    UnknownField(String),

    #[error("invalid filter: {0}")]
    MalformedFilter(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
