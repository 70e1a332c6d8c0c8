//! Retrieval strategies.
//!
//! Two independent ways of proposing a column filter for a question:
//! progressive LLM selection over the whole catalog, and hybrid ranking
//! over per-column indexes. Both end in the same bounded column-selection
//! loop, so the shared pieces live here.

mod attempt;
mod llm_search;
mod rank_search;

pub use attempt::Attempt;
pub use llm_search::LlmSearch;
pub use rank_search::RankSearch;

use std::collections::BTreeMap;

use tracing::debug;

use sage_core::config::RetrievalConfig;
use sage_core::models::{ColumnFilter, TableId};
use sage_core::traits::ReasoningAgent;
use sage_core::SchemaContext;

use crate::extract::extract_last_json;

/// Column-selection loop shared by both strategies.
///
/// The selector answers first; once errors pile up on a non-empty filter,
/// the fix agent takes over with the original answer quoted back. Every
/// recorded error is replayed into the next prompt. The loop keeps the
/// last parsed filter even when validation failed; a partially wrong
/// selection plus the error text beats starting from nothing.
pub(crate) fn select_columns(
    context: &SchemaContext,
    config: &RetrievalConfig,
    column_selector: &mut dyn ReasoningAgent,
    fix_column_selection: &mut dyn ReasoningAgent,
    column_list: &str,
    question: &str,
) -> (ColumnFilter, usize) {
    let mut tokens = 0;
    let mut filter = ColumnFilter::new();
    let mut org_answer = String::new();
    let mut attempt = Attempt::new(config.max_selection_attempts);

    while attempt.next() {
        let content = if !attempt.has_errors() || filter.is_empty() {
            let reply = column_selector.answer(&format!(
                "{column_list}\n用户问题:\n<{question}>{}\
                 \n请从已知的表字段信息中选择column，确保正确地表字段关系，确保JSON格式正确。",
                attempt.notice()
            ));
            tokens += reply.tokens;
            org_answer = reply.content.clone();
            reply.content
        } else {
            let reply = fix_column_selection.answer(&format!(
                "{column_list}\n用户问题:\n<{question}>\n原agent的输出:\n'''\n{org_answer}\n'''\n{}\
                 \n请修正，确保正确的表字段关系，确保JSON格式正确。",
                attempt.notice()
            ));
            tokens += reply.tokens;
            reply.content
        };

        let Some(payload) = extract_last_json(&content) else {
            continue;
        };
        let parsed: BTreeMap<String, Vec<String>> = match serde_json::from_str(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                attempt.record(format!("JSON解析失败: {e}"));
                debug!(question, error = %e, "column selection answer is not valid JSON, retrying");
                continue;
            }
        };

        match to_filter(parsed) {
            Ok(candidate) => {
                filter = candidate;
                let errors = context.validate_filter(&filter);
                if errors.is_empty() {
                    break;
                }
                let joined = errors.concat();
                debug!(question, errors = %joined, "column selection rejected, retrying");
                attempt.record(joined);
            }
            Err(error) => {
                debug!(question, error = %error, "column selection has malformed table names, retrying");
                attempt.record(error);
            }
        }
    }

    (filter, tokens)
}

fn to_filter(parsed: BTreeMap<String, Vec<String>>) -> Result<ColumnFilter, String> {
    let mut filter = ColumnFilter::new();
    for (name, columns) in parsed {
        let table = TableId::parse(&name).map_err(|e| e.to_string())?;
        if columns.is_empty() {
            filter.add_table(table);
        } else {
            for column in columns {
                filter.add(table.clone(), column);
            }
        }
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    use sage_core::models::{ChatMessage, Column, Table};
    use sage_core::traits::AgentReply;

    pub(crate) struct ScriptedAgent {
        name: String,
        replies: Vec<String>,
        pub calls: Vec<String>,
    }

    impl ScriptedAgent {
        pub fn new(name: &str, replies: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                replies: replies.iter().rev().map(|r| r.to_string()).collect(),
                calls: Vec::new(),
            }
        }
    }

    impl ReasoningAgent for ScriptedAgent {
        fn answer(&mut self, prompt: &str) -> AgentReply {
            self.calls.push(prompt.to_string());
            AgentReply::new(self.replies.pop().unwrap_or_default(), 7)
        }

        fn chat(&mut self, messages: &[ChatMessage]) -> AgentReply {
            let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.answer(&prompt)
        }

        fn add_system_knowledge(&mut self, _key: &str, _value: &str) {}

        fn name(&self) -> &str {
            &self.name
        }
    }

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
        SchemaContext::new(tables, Map::new())
    }

    #[test]
    fn valid_answer_is_accepted_first_try() {
        let ctx = context();
        let config = RetrievalConfig::default();
        let mut selector = ScriptedAgent::new(
            "column_selector",
            &["```json\n{\"constantdb.secumain\": [\"InnerCode\"]}\n```"],
        );
        let mut fixer = ScriptedAgent::new("fix_column_selection", &[]);

        let (filter, tokens) =
            select_columns(&ctx, &config, &mut selector, &mut fixer, "字段信息", "问题");
        assert!(filter.contains(&TableId::parse("constantdb.secumain").unwrap(), "InnerCode"));
        assert_eq!(tokens, 7);
        assert!(fixer.calls.is_empty());
    }

    #[test]
    fn invalid_column_routes_to_fix_agent_with_quoted_answer() {
        let ctx = context();
        let config = RetrievalConfig::default();
        let mut selector = ScriptedAgent::new(
            "column_selector",
            &["```json\n{\"constantdb.secumain\": [\"NoSuchCol\"]}\n```"],
        );
        let mut fixer = ScriptedAgent::new(
            "fix_column_selection",
            &["```json\n{\"constantdb.secumain\": [\"InnerCode\"]}\n```"],
        );

        let (filter, _) =
            select_columns(&ctx, &config, &mut selector, &mut fixer, "字段信息", "问题");
        assert!(filter.contains(&TableId::parse("constantdb.secumain").unwrap(), "InnerCode"));
        assert_eq!(fixer.calls.len(), 1);
        assert!(fixer.calls[0].contains("原agent的输出:"));
        assert!(fixer.calls[0].contains("NoSuchCol"));
        assert!(fixer.calls[0].contains("请注意:"));
        assert!(fixer.calls[0].contains("没有字段[NoSuchCol]"));
    }

    #[test]
    fn gives_up_after_attempt_budget() {
        let ctx = context();
        let config = RetrievalConfig::default();
        let mut selector = ScriptedAgent::new(
            "column_selector",
            &["没有代码块", "没有代码块", "没有代码块", "没有代码块", "没有代码块"],
        );
        let mut fixer = ScriptedAgent::new("fix_column_selection", &[]);

        let (filter, _) =
            select_columns(&ctx, &config, &mut selector, &mut fixer, "字段信息", "问题");
        assert!(filter.is_empty());
        assert_eq!(selector.calls.len(), config.max_selection_attempts);
    }
}
