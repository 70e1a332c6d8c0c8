//! Ranking strategy: decompose, rank, then select.
//!
//! The question is split into sub-questions so each one can pull its own
//! table candidates; a question about a dividend and a price would
//! otherwise average itself out of both indexes. Dense and sparse rankings
//! are unioned per table, the candidate set is widened with extended
//! sibling columns, and the same column-selection loop as the LLM strategy
//! makes the final call.

use tracing::debug;

use sage_core::config::RetrievalConfig;
use sage_core::constants::COLUMN_LIST_MARK;
use sage_core::errors::SageResult;
use sage_core::models::ColumnFilter;
use sage_core::traits::ReasoningAgent;
use sage_core::SchemaContext;

use crate::assembler::ColumnSetAssembler;
use crate::describe::print_table_column;
use crate::ranking::{LexicalRanker, TableRanking, VectorRanker};
use crate::strategy::select_columns;

pub struct RankSearch<'a> {
    context: &'a SchemaContext,
    config: &'a RetrievalConfig,
    vector: &'a VectorRanker<'a>,
    lexical: &'a LexicalRanker<'a>,
    assembler: &'a ColumnSetAssembler<'a>,
    decode_question: &'a mut dyn ReasoningAgent,
    column_selector: &'a mut dyn ReasoningAgent,
    fix_column_selection: &'a mut dyn ReasoningAgent,
}

impl<'a> RankSearch<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: &'a SchemaContext,
        config: &'a RetrievalConfig,
        vector: &'a VectorRanker<'a>,
        lexical: &'a LexicalRanker<'a>,
        assembler: &'a ColumnSetAssembler<'a>,
        decode_question: &'a mut dyn ReasoningAgent,
        column_selector: &'a mut dyn ReasoningAgent,
        fix_column_selection: &'a mut dyn ReasoningAgent,
    ) -> Self {
        Self {
            context,
            config,
            vector,
            lexical,
            assembler,
            decode_question,
            column_selector,
            fix_column_selection,
        }
    }

    /// Run the full ranking pipeline for one question. Fails only when the
    /// embedding transport gives out; everything else degrades.
    pub fn search(&mut self, question: &str) -> SageResult<(ColumnFilter, usize)> {
        let mut tokens = 0;

        let sub_questions = self.decompose(question, &mut tokens);
        debug!(question, count = sub_questions.len(), "sub-questions ready");

        let mut candidates = ColumnFilter::new();
        for sub_question in &sub_questions {
            let mut rankings = self.vector.rank(sub_question, self.context)?;
            rankings.extend(self.lexical.rank(sub_question, self.context));
            self.collect(&rankings, &mut candidates);
        }
        if candidates.is_empty() {
            debug!(question, "no ranked candidates, skipping rank search");
            return Ok((ColumnFilter::new(), tokens));
        }
        self.assembler.complete_extended_siblings(&mut candidates);

        let column_list = self.render_candidates(&candidates);
        let (filter, selection_tokens) = select_columns(
            self.context,
            self.config,
            &mut *self.column_selector,
            &mut *self.fix_column_selection,
            &column_list,
            question,
        );
        tokens += selection_tokens;
        Ok((filter, tokens))
    }

    /// One sub-question per answer line; the whole question when the
    /// decomposition agent produced nothing usable.
    fn decompose(&mut self, question: &str, tokens: &mut usize) -> Vec<String> {
        let reply = self.decode_question.answer(&format!("提问:\n{question}"));
        *tokens += reply.tokens;
        let sub_questions: Vec<String> = reply
            .content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if sub_questions.is_empty() {
            vec![question.to_string()]
        } else {
            sub_questions
        }
    }

    /// Union the per-table top columns of one sub-question's rankings.
    fn collect(&self, rankings: &[TableRanking], candidates: &mut ColumnFilter) {
        for ranking in rankings {
            for (column, _) in ranking.columns.iter().take(self.config.columns_per_table) {
                candidates.add(ranking.table.clone(), column.clone());
            }
        }
    }

    fn render_candidates(&self, candidates: &ColumnFilter) -> String {
        let blocks: Vec<String> = candidates
            .iter()
            .map(|(table, columns)| {
                let columns: Vec<String> = columns.iter().cloned().collect();
                print_table_column(self.context, table, &columns)
            })
            .collect();
        format!(
            "已取得可用的{COLUMN_LIST_MARK}:\n{}\n",
            blocks.join("\n---\n")
        )
    }
}
