use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

/// Validated qualified table name: `database_name.table_name`.
///
/// Ordering is lexicographic on the qualified string, which keeps filter
/// iteration deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Parse a `db.table` string, rejecting anything without exactly one dot.
    pub fn parse(name: &str) -> Result<Self, SchemaError> {
        if name.chars().filter(|&c| c == '.').count() != 1 {
            return Err(SchemaError::InvalidTableName {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The database part of the qualified name.
    pub fn database(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// The bare table part of the qualified name.
    pub fn table(&self) -> &str {
        self.0.split('.').nth(1).unwrap_or(&self.0)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TableId {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A single column of a loaded table. Immutable after schema load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Human-readable description (usually the Chinese field name).
    #[serde(default)]
    pub desc: String,
    /// Free-form remarks; empty when `enum_desc` is set.
    #[serde(default)]
    pub remarks: String,
    /// Enumeration description; empty for non-enum columns.
    #[serde(default)]
    pub enum_desc: String,
    /// Sample value taken from the data.
    #[serde(default)]
    pub val: String,
}

/// A loaded table with its ordered columns. Immutable after schema load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub table_name: TableId,
    #[serde(default)]
    pub table_desc: String,
    #[serde(default)]
    pub table_remarks: String,
    pub columns: Vec<Column>,
    /// Total column count of the physical table. Kept separate from
    /// `columns.len()` because the weighted-score denominator must reflect
    /// the real table width even if the artifact was truncated.
    #[serde(default)]
    pub column_count: usize,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
