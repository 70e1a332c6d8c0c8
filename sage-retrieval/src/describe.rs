//! Schema description text handed to agents.
//!
//! Three granularities mirror the progressive-selection stages: the
//! database catalog, the table list of chosen databases, and full column
//! blocks of chosen tables. The column-block format is shared with the
//! final assembled description.

use serde_json::json;

use sage_core::constants::COLUMN_LIST_MARK;
use sage_core::errors::{SageResult, SchemaError};
use sage_core::models::{Table, TableId};
use sage_core::SchemaContext;

use crate::assembler::TableColumns;

/// Database catalog as a JSON object `{name: description}`.
pub fn db_catalog(context: &SchemaContext) -> String {
    let catalog: serde_json::Map<String, serde_json::Value> = context
        .databases()
        .iter()
        .map(|(name, info)| (name.clone(), json!(info.desc)))
        .collect();
    format!("{}\n", serde_json::Value::Object(catalog))
}

/// Table list of the chosen databases, one summary line per table.
pub fn table_list(context: &SchemaContext, databases: &[String]) -> SageResult<String> {
    let mut entries = Vec::new();
    for db_name in databases {
        if !context.databases().contains_key(db_name) {
            return Err(SchemaError::UnknownDatabase {
                database: db_name.clone(),
            }
            .into());
        }
        for table in context.tables_of(db_name) {
            entries.push(json!({
                "表名": table.table_name.as_str(),
                "说明": table_summary(table),
            }));
        }
    }
    Ok(format!(
        "数据库表信息如下:\n{}\n",
        serde_json::Value::Array(entries)
    ))
}

fn table_summary(table: &Table) -> String {
    let columns: Vec<&str> = table.columns.iter().map(|c| c.desc.as_str()).collect();
    format!("{}。字段包括:{}", table.table_desc, columns.join(","))
}

/// Full column blocks of the chosen tables.
pub fn column_list(context: &SchemaContext, tables: &[String]) -> SageResult<String> {
    let mut blocks = Vec::new();
    for name in tables {
        let table = TableId::parse(name)?;
        let Some(loaded) = context.table(&table) else {
            return Err(SchemaError::UnknownTable {
                table: name.clone(),
            }
            .into());
        };
        let columns: Vec<String> = loaded.columns.iter().map(|c| c.name.clone()).collect();
        blocks.push(print_table_column(context, &table, &columns));
    }
    Ok(format!(
        "已取得可用的{COLUMN_LIST_MARK}:\n{}\n",
        blocks.join("\n---\n")
    ))
}

/// One `<table>` block with `<column>` lines for the selected columns.
pub fn print_table_column(context: &SchemaContext, table: &TableId, columns: &[String]) -> String {
    let Some(loaded) = context.table(table) else {
        return String::new();
    };
    let mut info = format!(
        "<table>{}(即: {}),{}。\n包含有以下字段:\n",
        table, loaded.table_desc, loaded.table_remarks
    );
    for column in &loaded.columns {
        if !columns.contains(&column.name) {
            continue;
        }
        info.push_str(&format!("<column>{}(即: {}):", column.name, column.desc));
        if !column.enum_desc.is_empty() {
            info.push_str(&format!("是枚举类型,枚举值包括:{};", column.enum_desc));
        }
        if !column.remarks.is_empty() {
            info.push_str(&format!("{};", column.remarks));
        }
        info.push_str("</column>\n");
    }
    info.push_str("</table>");
    info
}

/// The final assembled schema description: the marker, one block per
/// table, and the join-path section when any path survived.
pub fn render_schema_description(
    context: &SchemaContext,
    tables: &[TableColumns],
    relations: &[String],
) -> String {
    let blocks: Vec<String> = tables
        .iter()
        .map(|tc| print_table_column(context, &tc.table, &tc.columns))
        .collect();
    let mut result = format!("已取得可用的{COLUMN_LIST_MARK}:\n{}", blocks.join("\n---\n"));
    if !relations.is_empty() {
        result.push_str("\n---\n表之间的外链关系如下:\n");
        result.push_str(&relations.join("\n"));
        result.push('\n');
    }
    result
}
