//! Maps logical property names to physical column names.

use serde::{Deserialize, Serialize};

/// Resolves a property name used in `$filter` / `$orderby` to a column.
pub trait ColumnResolver {
    /// Returns `None` when the property is unknown.
    fn resolve(&self, property: &str) -> Option<String>;
}

impl<F> ColumnResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, property: &str) -> Option<String> {
        self(property)
    }
}

/// A single registered property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, also the source of the default column name
    pub name: String,
    /// Serialized name; when present it is the name clients use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Explicit column name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            column: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    fn property_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn column_name(&self) -> String {
        self.column.clone().unwrap_or_else(|| to_snake_case(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Member {
    Field(FieldDef),
    /// An embedded structure whose fields are promoted into the parent
    Embedded(Schema),
}

/// Explicitly registered model description, searched in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Schema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            members: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.members.push(Member::Field(field));
        self
    }

    pub fn embed(mut self, schema: Schema) -> Self {
        self.members.push(Member::Embedded(schema));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }
}

impl ColumnResolver for Schema {
    fn resolve(&self, property: &str) -> Option<String> {
        self.members.iter().find_map(|member| match member {
            Member::Embedded(inner) => inner.resolve(property),
            Member::Field(field) if field.property_name().eq_ignore_ascii_case(property) => {
                Some(field.column_name())
            }
            Member::Field(_) => None,
        })
    }
}

/// `DateOfBirth` -> `date_of_birth`, `UserID` -> `user_id`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
