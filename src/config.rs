//! Loads the resource description (schema and query limits) from JSON.
//!
//! ```json
//! {
//!   "schema": {
//!     "table": "users",
//!     "members": [
//!       { "embedded": { "members": [ { "field": { "name": "Age", "column": "user_age" } } ] } },
//!       { "field": { "name": "Firstname" } },
//!       { "field": { "name": "JsonProp", "alias": "random_json_name" } }
//!     ]
//!   },
//!   "options": { "max_top": 100, "malformed_filter": "reject" }
//! }
//! ```

use crate::query::QueryOptions;
use crate::schema::{FieldDef, Schema};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist: {0}")]
    Missing(String),

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub schema: Schema,
    #[serde(default)]
    pub options: QueryOptions,
}

impl ResourceConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let display = path_ref.display().to_string();

        if !path_ref.exists() {
            return Err(ConfigError::Missing(display));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

        Self::from_json_str(&content).map_err(|source| ConfigError::Parse { path: display, source })
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Sample `users` resource, used when no config file is available.
    pub fn sample() -> Self {
        let schema = Schema::new("users")
            .embed(Schema::new("").field(FieldDef::new("Age").column("user_age")))
            .field(FieldDef::new("UserId"))
            .field(FieldDef::new("Firstname"))
            .field(FieldDef::new("Balance"))
            .field(FieldDef::new("DateOfBirth"))
            .field(FieldDef::new("JsonProp").alias("random_json_name"));

        Self {
            schema,
            options: QueryOptions::with_max_top(100),
        }
    }
}
