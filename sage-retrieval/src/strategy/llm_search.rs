//! Progressive LLM selection: database, then table, then column.
//!
//! Each stage narrows what the next stage has to read. A stage that never
//! produces a usable answer within its budget ends the search with whatever
//! was selected so far, never with an error; an empty filter is a valid
//! outcome the merge step simply ignores.

use tracing::debug;

use sage_core::config::RetrievalConfig;
use sage_core::models::ColumnFilter;
use sage_core::traits::ReasoningAgent;
use sage_core::SchemaContext;

use crate::describe;
use crate::extract::extract_last_json;
use crate::strategy::{select_columns, Attempt};

pub struct LlmSearch<'a> {
    context: &'a SchemaContext,
    config: &'a RetrievalConfig,
    db_selector: &'a mut dyn ReasoningAgent,
    table_selector: &'a mut dyn ReasoningAgent,
    column_selector: &'a mut dyn ReasoningAgent,
    fix_column_selection: &'a mut dyn ReasoningAgent,
}

impl<'a> LlmSearch<'a> {
    pub fn new(
        context: &'a SchemaContext,
        config: &'a RetrievalConfig,
        db_selector: &'a mut dyn ReasoningAgent,
        table_selector: &'a mut dyn ReasoningAgent,
        column_selector: &'a mut dyn ReasoningAgent,
        fix_column_selection: &'a mut dyn ReasoningAgent,
    ) -> Self {
        Self {
            context,
            config,
            db_selector,
            table_selector,
            column_selector,
            fix_column_selection,
        }
    }

    /// Run all three stages for one question.
    pub fn search(&mut self, question: &str) -> (ColumnFilter, usize) {
        let mut tokens = 0;

        let table_list = self.select_databases(question, &mut tokens);
        if table_list.is_empty() {
            debug!(question, "no usable database selection, skipping llm search");
            return (ColumnFilter::new(), tokens);
        }

        let column_list = self.select_tables(question, &table_list, &mut tokens);
        if column_list.is_empty() {
            debug!(question, "no usable table selection, skipping llm search");
            return (ColumnFilter::new(), tokens);
        }

        let (filter, selection_tokens) = select_columns(
            self.context,
            self.config,
            &mut *self.column_selector,
            &mut *self.fix_column_selection,
            &column_list,
            question,
        );
        tokens += selection_tokens;
        (filter, tokens)
    }

    /// Stage one: pick databases, answer with their table list.
    fn select_databases(&mut self, question: &str, tokens: &mut usize) -> String {
        let mut error_msg = "\n请选择db，确保JSON格式正确。".to_string();
        let mut attempt = Attempt::new(self.config.max_selection_attempts);

        while attempt.next() {
            let reply = self
                .db_selector
                .answer(&format!("用户问题:\n<{question}>\n{error_msg}"));
            *tokens += reply.tokens;

            let Some(payload) = extract_last_json(&reply.content) else {
                continue;
            };
            let databases: Vec<String> = match serde_json::from_str(payload) {
                Ok(databases) => databases,
                Err(e) => {
                    error_msg = format!("\n注意: {e}。请选择db，确保JSON格式正确。");
                    debug!(question, error = %e, "database selection retry");
                    continue;
                }
            };
            match describe::table_list(self.context, &databases) {
                Ok(list) => return list,
                Err(e) => {
                    error_msg = format!("\n注意: {e}。请选择db，确保JSON格式正确。");
                    debug!(question, error = %e, "database selection retry");
                }
            }
        }
        String::new()
    }

    /// Stage two: pick tables out of the chosen databases, answer with
    /// their full column blocks.
    fn select_tables(&mut self, question: &str, table_list: &str, tokens: &mut usize) -> String {
        let mut error_msg = "\n请选择table，确保JSON格式正确。".to_string();
        let mut attempt = Attempt::new(self.config.max_selection_attempts);

        while attempt.next() {
            let reply = self
                .table_selector
                .answer(&format!("{table_list}\n用户问题:\n<{question}>\n{error_msg}"));
            *tokens += reply.tokens;

            let Some(payload) = extract_last_json(&reply.content) else {
                continue;
            };
            let tables: Vec<String> = match serde_json::from_str(payload) {
                Ok(tables) => tables,
                Err(e) => {
                    error_msg = format!("\n注意: {e}。请选择table，确保JSON格式正确。");
                    debug!(question, error = %e, "table selection retry");
                    continue;
                }
            };
            match describe::column_list(self.context, &tables) {
                Ok(list) => return list,
                Err(e) => {
                    error_msg = format!("\n注意: {e}。请选择table，确保JSON格式正确。");
                    debug!(question, error = %e, "table selection retry");
                }
            }
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use sage_core::models::{Column, Table, TableId};
    use sage_core::schema::DatabaseInfo;

    use crate::strategy::tests::ScriptedAgent;

    fn context() -> SchemaContext {
        let tables = vec![Table {
            table_name: TableId::parse("constantdb.secumain").unwrap(),
            table_desc: "证券主表".to_string(),
            table_remarks: String::new(),
            columns: vec![Column {
                name: "InnerCode".to_string(),
                desc: "证券内部编码".to_string(),
                remarks: String::new(),
                enum_desc: String::new(),
                val: String::new(),
            }],
            column_count: 1,
        }];
        let mut databases = BTreeMap::new();
        databases.insert(
            "constantdb".to_string(),
            DatabaseInfo {
                desc: "常量库".to_string(),
            },
        );
        SchemaContext::new(tables, databases)
    }

    #[test]
    fn three_stages_narrow_to_a_filter() {
        let ctx = context();
        let config = RetrievalConfig::default();
        let mut dbs = ScriptedAgent::new("db_selector", &["```json\n[\"constantdb\"]\n```"]);
        let mut tables = ScriptedAgent::new(
            "table_selector",
            &["```json\n[\"constantdb.secumain\"]\n```"],
        );
        let mut columns = ScriptedAgent::new(
            "column_selector",
            &["```json\n{\"constantdb.secumain\": [\"InnerCode\"]}\n```"],
        );
        let mut fixer = ScriptedAgent::new("fix_column_selection", &[]);

        let mut search =
            LlmSearch::new(&ctx, &config, &mut dbs, &mut tables, &mut columns, &mut fixer);
        let (filter, tokens) = search.search("天士力的证券内部编码是多少?");
        assert!(filter.contains(&TableId::parse("constantdb.secumain").unwrap(), "InnerCode"));
        assert_eq!(tokens, 21);
    }

    #[test]
    fn unknown_database_is_fed_back_into_the_retry() {
        let ctx = context();
        let config = RetrievalConfig::default();
        let mut dbs = ScriptedAgent::new(
            "db_selector",
            &["```json\n[\"nodb\"]\n```", "```json\n[\"constantdb\"]\n```"],
        );
        let mut tables = ScriptedAgent::new(
            "table_selector",
            &["```json\n[\"constantdb.secumain\"]\n```"],
        );
        let mut columns = ScriptedAgent::new(
            "column_selector",
            &["```json\n{\"constantdb.secumain\": [\"InnerCode\"]}\n```"],
        );
        let mut fixer = ScriptedAgent::new("fix_column_selection", &[]);

        let mut search =
            LlmSearch::new(&ctx, &config, &mut dbs, &mut tables, &mut columns, &mut fixer);
        let (filter, _) = search.search("问题");
        assert!(!filter.is_empty());
        assert_eq!(dbs.calls.len(), 2);
        assert!(dbs.calls[1].contains("注意: "));
        assert!(dbs.calls[1].contains("nodb"));
    }

    #[test]
    fn exhausted_database_stage_yields_empty_filter() {
        let ctx = context();
        let config = RetrievalConfig::default();
        let mut dbs = ScriptedAgent::new("db_selector", &["无", "无", "无", "无", "无"]);
        let mut tables = ScriptedAgent::new("table_selector", &[]);
        let mut columns = ScriptedAgent::new("column_selector", &[]);
        let mut fixer = ScriptedAgent::new("fix_column_selection", &[]);

        let mut search =
            LlmSearch::new(&ctx, &config, &mut dbs, &mut tables, &mut columns, &mut fixer);
        let (filter, _) = search.search("问题");
        assert!(filter.is_empty());
        assert!(tables.calls.is_empty());
    }
}
