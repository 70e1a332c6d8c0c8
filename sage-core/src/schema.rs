//! The immutable schema context.
//!
//! Loaded once at startup from persisted artifacts and passed by shared
//! reference into every retrieval and assembly call. Nothing here mutates
//! after construction.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{SageResult, SchemaError};
use crate::models::{Column, ColumnFilter, Table, TableId};

/// One database of the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseInfo {
    #[serde(default)]
    pub desc: String,
}

/// Immutable view over the loaded multi-database schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    tables: BTreeMap<TableId, Table>,
    databases: BTreeMap<String, DatabaseInfo>,
    /// `table → column → enum description`, for enum-valued columns only.
    enum_columns: BTreeMap<TableId, BTreeMap<String, String>>,
    /// One-line-per-table snippet used as agent background knowledge.
    table_snippet: String,
}

impl SchemaContext {
    /// Build from already-parsed tables and a database catalog.
    pub fn new(tables: Vec<Table>, databases: BTreeMap<String, DatabaseInfo>) -> Self {
        let mut enum_columns: BTreeMap<TableId, BTreeMap<String, String>> = BTreeMap::new();
        let mut table_snippet = String::from("有以下数据表:\n");
        for table in &tables {
            for column in &table.columns {
                if !column.enum_desc.is_empty() {
                    enum_columns
                        .entry(table.table_name.clone())
                        .or_default()
                        .insert(column.name.clone(), column.enum_desc.clone());
                }
            }
            table_snippet.push_str(&table.table_desc);
            table_snippet.push(';');
        }
        let tables = tables
            .into_iter()
            .map(|t| (t.table_name.clone(), t))
            .collect();
        Self {
            tables,
            databases,
            enum_columns,
            table_snippet,
        }
    }

    /// Load `schema.json` and `databases.json` from an artifact directory.
    pub fn load(dir: &Path) -> SageResult<Self> {
        let schema_path = dir.join("schema.json");
        if !schema_path.exists() {
            return Err(SchemaError::ArtifactNotFound {
                path: schema_path.display().to_string(),
            }
            .into());
        }
        let tables: Vec<Table> = read_json(&schema_path)?;

        let db_path = dir.join("databases.json");
        let databases: BTreeMap<String, DatabaseInfo> = if db_path.exists() {
            read_json(&db_path)?
        } else {
            BTreeMap::new()
        };

        info!(
            tables = tables.len(),
            databases = databases.len(),
            "schema context loaded"
        );
        Ok(Self::new(tables, databases))
    }

    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn column(&self, id: &TableId, name: &str) -> Option<&Column> {
        self.tables.get(id).and_then(|t| t.column(name))
    }

    pub fn has_table(&self, id: &TableId) -> bool {
        self.tables.contains_key(id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn databases(&self) -> &BTreeMap<String, DatabaseInfo> {
        &self.databases
    }

    /// Tables belonging to one database, in name order.
    pub fn tables_of<'a>(&'a self, database: &'a str) -> impl Iterator<Item = &'a Table> {
        self.tables
            .values()
            .filter(move |t| t.table_name.database() == database)
    }

    pub fn enum_columns(&self, id: &TableId) -> Option<&BTreeMap<String, String>> {
        self.enum_columns.get(id)
    }

    pub fn all_enum_columns(&self) -> &BTreeMap<TableId, BTreeMap<String, String>> {
        &self.enum_columns
    }

    pub fn table_snippet(&self) -> &str {
        &self.table_snippet
    }

    /// Validate every entry of a filter against the loaded schema, returning
    /// one human-readable line per unknown table or column. An empty result
    /// means the filter is fully valid.
    pub fn validate_filter(&self, filter: &ColumnFilter) -> Vec<String> {
        let mut problems = Vec::new();
        for (table, columns) in filter.iter() {
            let Some(loaded) = self.tables.get(table) else {
                problems.push(format!("不存在表[{table}];"));
                continue;
            };
            for column in columns {
                if loaded.column(column).is_none() {
                    problems.push(format!("表[{table}]中没有字段[{column}];"));
                }
            }
        }
        problems
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> SageResult<T> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| {
            SchemaError::ArtifactMalformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
}
