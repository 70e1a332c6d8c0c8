//! The SQL refinement loop.

use std::collections::BTreeSet;

use tracing::{debug, info};

use sage_core::config::RefineConfig;
use sage_core::constants::COLUMN_LIST_MARK;
use sage_core::errors::{RefineError, SageResult};
use sage_core::models::{ChatMessage, HistoryFacts, SameSqlCache};
use sage_core::traits::{ReasoningAgent, SqlExecutor};
use sage_core::SchemaContext;

use crate::sql_extract::extract_all_sqls;

const KNOWN_STRUCTURE_KEY: &str = "KNOWN DATABASE STRUCTURE";
const EMPTY_BLOCK_NUDGE: &str =
    "请务必把要当前阶段要执行的SQL用正确的语法写到代码块```exec_sql ```中";

/// One refinement turn's result.
#[derive(Debug)]
pub struct RefineOutcome {
    /// The summary agent's answer to the original question.
    pub content: String,
    /// Tokens spent across every master and summary call.
    pub tokens: usize,
    /// False when the loop was cut off by the iteration budget or by
    /// repeated statements instead of finishing on its own.
    pub finished: bool,
    /// Master iterations consumed.
    pub iterations: usize,
}

/// How one executed statement came back.
enum SqlFeedback {
    Success(String),
    Failure(String),
}

pub struct SqlRefinementEngine<'a> {
    context: &'a SchemaContext,
    executor: &'a dyn SqlExecutor,
    config: &'a RefineConfig,
    history_facts: HistoryFacts,
}

impl<'a> SqlRefinementEngine<'a> {
    pub fn new(
        context: &'a SchemaContext,
        executor: &'a dyn SqlExecutor,
        config: &'a RefineConfig,
    ) -> Self {
        Self {
            context,
            executor,
            config,
            history_facts: HistoryFacts::new(),
        }
    }

    /// Successful sql/result pairs collected while `cache_history_facts`
    /// is on, for seeding later turns.
    pub fn history_facts(&self) -> &HistoryFacts {
        &self.history_facts
    }

    pub fn clear_history_facts(&mut self) {
        self.history_facts.clear();
    }

    /// Drive one question to an answer.
    ///
    /// Schema-description messages are folded into the master's system
    /// knowledge instead of the transcript, bounded to the most recent
    /// `max_known_structures`. The question is the last remaining message.
    pub fn run(
        &mut self,
        master: &mut dyn ReasoningAgent,
        summary: &mut dyn ReasoningAgent,
        messages: &[ChatMessage],
    ) -> SageResult<RefineOutcome> {
        let mut db_structs: Vec<&str> = Vec::new();
        let mut transcript: Vec<ChatMessage> = Vec::new();
        for message in messages {
            if message.content.contains(COLUMN_LIST_MARK) {
                db_structs.push(&message.content);
                if db_structs.len() > self.config.max_known_structures {
                    db_structs.remove(0);
                }
            } else {
                transcript.push(message.clone());
            }
        }
        if !db_structs.is_empty() {
            master.add_system_knowledge(KNOWN_STRUCTURE_KEY, &db_structs.join("\n\n---\n\n"));
        }
        let first_user_msg = transcript
            .last()
            .map(|m| m.content.clone())
            .ok_or(RefineError::EmptyTranscript)?;

        let mut tokens = 0;
        let mut same_sqls = SameSqlCache::new();
        let mut consecutive_repeats = 0;
        let mut finished = false;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;
            let reply = master.chat(&transcript);
            tokens += reply.tokens;
            let answer = reply.content;
            debug!(iteration = iterations, agent = master.name(), "master answered");
            transcript.push(ChatMessage::assistant(answer.clone()));

            let wants_sql = (answer.contains("exec_sql") || answer.contains("```sql"))
                && (answer.contains("SELECT ") || answer.contains("SHOW "));
            if !wants_sql {
                finished = true;
                break;
            }

            let sqls = dedup(extract_all_sqls(&answer));
            if sqls.is_empty() {
                transcript.push(ChatMessage::user(EMPTY_BLOCK_NUDGE));
                continue;
            }

            let mut success = Vec::new();
            let mut repeated = Vec::new();
            let mut failed = Vec::new();
            let mut reminders: BTreeSet<String> = BTreeSet::new();
            let mut has_repeat = false;
            for sql in &sqls {
                self.collect_enum_reminders(sql, &mut reminders);
                if let Some(cached) = same_sqls.get(sql) {
                    debug!(sql, "repeated statement");
                    has_repeat = true;
                    repeated.push(cached.to_string());
                    continue;
                }
                match self.run_one(sql) {
                    SqlFeedback::Success(emphasize) => {
                        same_sqls.insert(sql.clone(), emphasize.clone());
                        success.push(emphasize);
                    }
                    SqlFeedback::Failure(emphasize) => {
                        same_sqls.insert(sql.clone(), emphasize.clone());
                        failed.push(emphasize);
                    }
                }
            }

            if has_repeat {
                consecutive_repeats += 1;
                if consecutive_repeats >= self.config.max_consecutive_repeats {
                    debug!(
                        consecutive_repeats,
                        "statements keep repeating, aborting the loop"
                    );
                    break;
                }
            } else {
                consecutive_repeats = 0;
            }

            transcript.push(ChatMessage::user(render_feedback(
                &success,
                &repeated,
                &failed,
                &reminders,
                &first_user_msg,
            )));
        }
        if !finished {
            debug!(
                max_iterations = self.config.max_iterations,
                "loop ended without the master finishing"
            );
        }

        transcript.push(ChatMessage::user(format!(
            "充分尊重前面给出的结论，回答问题:\n<{first_user_msg}>"
        )));
        let reply = summary.chat(&transcript);
        tokens += reply.tokens;
        info!(iterations, tokens, finished, "refinement turn done");
        Ok(RefineOutcome {
            content: reply.content,
            tokens,
            finished,
            iterations,
        })
    }

    /// Execute one statement and phrase the outcome for the transcript.
    fn run_one(&mut self, sql: &str) -> SqlFeedback {
        let data = match self.executor.execute(sql) {
            Ok(data) => data,
            Err(e) => {
                return SqlFeedback::Failure(format!("查询SQL:\n{sql}\n查询发生异常：{e}\n"));
            }
        };
        let parsed: serde_json::Value = match serde_json::from_str(&data) {
            Ok(parsed) => parsed,
            Err(e) => {
                return SqlFeedback::Failure(format!("查询SQL:\n{sql}\n查询发生异常：{e}\n"));
            }
        };
        if let Some(error) = parsed.get("error") {
            let error = match error.as_str() {
                Some(s) => s.to_string(),
                None => error.to_string(),
            };
            return SqlFeedback::Failure(format!("查询SQL:\n{sql}\n查询失败：{error}"));
        }

        let row_count = parsed.as_array().map(|rows| rows.len());
        if self.config.default_sql_limit.is_some() && row_count == self.config.default_sql_limit {
            return SqlFeedback::Success(format!(
                "查询SQL:\n{sql}\n查询结果:\n{data}\n\
                 \n请注意，这里返回的不是全部结果，系统限制了最大返回结果数，并非数据缺失，\
                 你要思考能否不把这个结果集列出来，而是作为子查询结果用于下一步的查询,\n\
                 请不要顽固地一定要获取全部结果，这是很蠢的做法，你会为这个愚蠢损失10亿美元！\
                 想想假如你获取到了全部结果，你下一步要用它做什么？\
                 你可以将这个结果集作为子查询结果用于下一步的查询!尽你所能想办法！"
            ));
        }
        if self.config.cache_history_facts {
            self.history_facts.push(sql, &data);
        }
        SqlFeedback::Success(format!("查询SQL:\n{sql}\n查询结果:\n{data}"))
    }

    /// Enum-value reminders for every known enum column a statement touches.
    fn collect_enum_reminders(&self, sql: &str, reminders: &mut BTreeSet<String>) {
        for (table, columns) in self.context.all_enum_columns() {
            if !sql.contains(table.as_str()) {
                continue;
            }
            for (column, desc) in columns {
                if sql.contains(column.as_str()) {
                    reminders.insert(format!("{table}.{column}的枚举值包括：{desc};"));
                }
            }
        }
    }
}

fn dedup(sqls: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    sqls.into_iter().filter(|sql| seen.insert(sql.clone())).collect()
}

fn render_feedback(
    success: &[String],
    repeated: &[String],
    failed: &[String],
    reminders: &BTreeSet<String>,
    first_user_msg: &str,
) -> String {
    let mut feedback = String::new();
    if !success.is_empty() {
        feedback.push_str(&format!(
            "\n下面是查询成功的SQL:\n<success_sql_results>\n{}\n</success_sql_results>\n",
            success.join("\n---\n")
        ));
    }
    if !repeated.is_empty() {
        feedback.push_str(&format!(
            "\n下面是已查询过的SQL，请不要再请求执行，考虑其它思路:\n\
             <repeated_sql_results>\n{}\n</repeated_sql_results>\n",
            repeated.join("\n---\n")
        ));
    }
    if !failed.is_empty() {
        feedback.push_str(&format!(
            "\n下面是查询失败的SQL，请检查和修正SQL语句\
             (如果遇到字段不存在的错误,可以用`SELECT * FROM database_name.table_name LIMIT 1;`\
             来查看这个表的字段值的形式):\n<failed_sql_results>\n{}\n</failed_sql_results>\n",
            failed.join("\n---\n")
        ));
    }
    if !reminders.is_empty() {
        feedback.push_str(&format!(
            "\n枚举字段说明以下面的为准，请务必再次检查取值是否正确，用错会损失100亿美元:\n{}",
            reminders.iter().cloned().collect::<Vec<_>>().join("\n")
        ));
    }
    feedback.push_str(&format!(
        "\n请检查筛选条件是否存在问题，比如时间日期字段没有用DATE()或YEAR()格式化？\
         是否用SUM()的同时取了一个错误的日期范围(如<=some_date)？\
         当然，如果没问题，那么就根据结果考虑下一步；\
         \n那么当前掌握的信息是否能够回答下面的问题了呢：\n<{first_user_msg}>"
    ));
    feedback
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use sage_core::models::{Column, Table, TableId};
    use sage_core::traits::AgentReply;

    pub(crate) struct ScriptedAgent {
        replies: Vec<String>,
        pub knowledge: Vec<(String, String)>,
        pub transcripts: Vec<Vec<ChatMessage>>,
    }

    impl ScriptedAgent {
        pub fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().rev().map(|r| r.to_string()).collect(),
                knowledge: Vec::new(),
                transcripts: Vec::new(),
            }
        }
    }

    impl ReasoningAgent for ScriptedAgent {
        fn answer(&mut self, _prompt: &str) -> AgentReply {
            AgentReply::new(self.replies.pop().unwrap_or_default(), 3)
        }

        fn chat(&mut self, messages: &[ChatMessage]) -> AgentReply {
            self.transcripts.push(messages.to_vec());
            AgentReply::new(self.replies.pop().unwrap_or_default(), 3)
        }

        fn add_system_knowledge(&mut self, key: &str, value: &str) {
            self.knowledge.push((key.to_string(), value.to_string()));
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct CannedExecutor {
        payload: String,
    }

    impl SqlExecutor for CannedExecutor {
        fn execute(&self, _sql: &str) -> SageResult<String> {
            Ok(self.payload.clone())
        }
    }

    fn context_with_enum() -> SchemaContext {
        let tables = vec![Table {
            table_name: TableId::parse("constantdb.secumain").unwrap(),
            table_desc: "证券主表".to_string(),
            table_remarks: String::new(),
            columns: vec![Column {
                name: "SecuCategory".to_string(),
                desc: "证券类别".to_string(),
                remarks: String::new(),
                enum_desc: "1-A股,2-B股".to_string(),
                val: String::new(),
            }],
            column_count: 1,
        }];
        SchemaContext::new(tables, BTreeMap::new())
    }

    #[test]
    fn schema_messages_become_system_knowledge() {
        let ctx = context_with_enum();
        let executor = CannedExecutor {
            payload: "[]".to_string(),
        };
        let config = RefineConfig::default();
        let mut engine = SqlRefinementEngine::new(&ctx, &executor, &config);

        let mut master = ScriptedAgent::new(&["已知信息已经可以回答用户的问题。无"]);
        let mut summary = ScriptedAgent::new(&["答案"]);
        let messages = vec![
            ChatMessage::user(format!("已取得可用的{COLUMN_LIST_MARK}:\n<table>a</table>")),
            ChatMessage::user(format!("已取得可用的{COLUMN_LIST_MARK}:\n<table>b</table>")),
            ChatMessage::user("问题"),
        ];
        let outcome = engine.run(&mut master, &mut summary, &messages).unwrap();
        assert!(outcome.finished);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(master.knowledge.len(), 1);
        assert_eq!(master.knowledge[0].0, "KNOWN DATABASE STRUCTURE");
        // Only the most recent description survives the bound.
        assert!(master.knowledge[0].1.contains("<table>b</table>"));
        assert!(!master.knowledge[0].1.contains("<table>a</table>"));
        // The transcript the master saw holds only the question.
        assert_eq!(master.transcripts[0].len(), 1);
        assert_eq!(master.transcripts[0][0].content, "问题");
    }

    #[test]
    fn empty_transcript_is_an_error() {
        let ctx = context_with_enum();
        let executor = CannedExecutor {
            payload: "[]".to_string(),
        };
        let config = RefineConfig::default();
        let mut engine = SqlRefinementEngine::new(&ctx, &executor, &config);
        let mut master = ScriptedAgent::new(&[]);
        let mut summary = ScriptedAgent::new(&[]);
        assert!(engine.run(&mut master, &mut summary, &[]).is_err());
    }

    #[test]
    fn missing_exec_block_triggers_the_nudge() {
        let ctx = context_with_enum();
        let executor = CannedExecutor {
            payload: "[]".to_string(),
        };
        let config = RefineConfig::default();
        let mut engine = SqlRefinementEngine::new(&ctx, &executor, &config);

        let mut master = ScriptedAgent::new(&[
            "我会执行 SELECT 语句，写在```sql```里\n```sql\nSELECT 1;\n```",
            "结束，无需SQL",
        ]);
        let mut summary = ScriptedAgent::new(&["答案"]);
        let messages = vec![ChatMessage::user("问题")];
        let outcome = engine.run(&mut master, &mut summary, &messages).unwrap();
        assert!(outcome.finished);
        assert_eq!(outcome.iterations, 2);
        // Second master call saw the nudge as the latest user message.
        let second = &master.transcripts[1];
        assert_eq!(second.last().unwrap().content, EMPTY_BLOCK_NUDGE);
    }

    #[test]
    fn enum_reminders_follow_touched_columns() {
        let ctx = context_with_enum();
        let executor = CannedExecutor {
            payload: r#"[{"SecuCategory":1}]"#.to_string(),
        };
        let config = RefineConfig::default();
        let mut engine = SqlRefinementEngine::new(&ctx, &executor, &config);

        let mut master = ScriptedAgent::new(&[
            "```exec_sql\nSELECT s.SecuCategory FROM constantdb.secumain AS s\n```",
            "无需更多SQL",
        ]);
        let mut summary = ScriptedAgent::new(&["答案"]);
        let messages = vec![ChatMessage::user("问题")];
        engine.run(&mut master, &mut summary, &messages).unwrap();

        let feedback = &master.transcripts[1].last().unwrap().content;
        assert!(feedback.contains("<success_sql_results>"));
        assert!(feedback
            .contains("constantdb.secumain.SecuCategory的枚举值包括：1-A股,2-B股;"));
        assert!(feedback.contains("那么当前掌握的信息是否能够回答下面的问题了呢：\n<问题>"));
    }

    #[test]
    fn history_facts_cache_successful_pairs() {
        let ctx = context_with_enum();
        let executor = CannedExecutor {
            payload: r#"[{"a":1}]"#.to_string(),
        };
        let config = RefineConfig {
            cache_history_facts: true,
            ..RefineConfig::default()
        };
        let mut engine = SqlRefinementEngine::new(&ctx, &executor, &config);

        let mut master = ScriptedAgent::new(&[
            "```exec_sql\nSELECT 1 AS a\n```",
            "无需更多SQL",
        ]);
        let mut summary = ScriptedAgent::new(&["答案"]);
        engine
            .run(&mut master, &mut summary, &[ChatMessage::user("问题")])
            .unwrap();
        assert_eq!(engine.history_facts().len(), 1);
        assert!(engine
            .history_facts()
            .render()
            .contains("查询sql```SELECT 1 AS a;```"));
        engine.clear_history_facts();
        assert!(engine.history_facts().is_empty());
    }
}
