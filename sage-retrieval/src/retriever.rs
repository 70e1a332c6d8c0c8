//! Strategy orchestration and final schema description.

use rayon::join;
use tracing::{debug, info};

use sage_core::config::RetrievalConfig;
use sage_core::constants::COLUMN_LIST_MARK;
use sage_core::errors::SageResult;
use sage_core::models::{ChatMessage, ColumnFilter, Role};
use sage_core::SchemaContext;

use crate::assembler::{ColumnSetAssembler, TableColumns};
use crate::describe::render_schema_description;
use crate::strategy::{LlmSearch, RankSearch};

/// What one retrieval run produced: the rendered schema description, the
/// merged filter behind it, the assembled per-table column sets, and the
/// tokens spent across every agent call.
#[derive(Debug)]
pub struct RetrievalOutcome {
    pub description: String,
    pub filter: ColumnFilter,
    pub tables: Vec<TableColumns>,
    pub tokens: usize,
}

pub struct SchemaRetriever<'a> {
    context: &'a SchemaContext,
    config: &'a RetrievalConfig,
    assembler: &'a ColumnSetAssembler<'a>,
}

impl<'a> SchemaRetriever<'a> {
    pub fn new(
        context: &'a SchemaContext,
        config: &'a RetrievalConfig,
        assembler: &'a ColumnSetAssembler<'a>,
    ) -> Self {
        Self {
            context,
            config,
            assembler,
        }
    }

    /// The question to retrieve for: the latest user message, ignoring any
    /// schema-description messages already injected into the transcript.
    pub fn question_of(messages: &[ChatMessage]) -> Option<&str> {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User && !m.content.contains(COLUMN_LIST_MARK))
            .map(|m| m.content.as_str())
    }

    /// Run the enabled strategies, merge their filters, and assemble the
    /// schema description. Strategy order never matters; the merge is a
    /// set union.
    pub fn retrieve(
        &self,
        question: &str,
        llm: Option<&mut LlmSearch<'_>>,
        rank: Option<&mut RankSearch<'_>>,
    ) -> SageResult<RetrievalOutcome> {
        let llm = llm.filter(|_| self.config.enable_llm_search);
        let rank = rank.filter(|_| self.config.enable_rank_search);

        let (llm_result, rank_result) = match (llm, rank) {
            (Some(llm), Some(rank)) if self.config.use_concurrency => {
                let (l, r) = join(|| llm.search(question), || rank.search(question));
                (Some(l), Some(r))
            }
            (llm, rank) => (
                llm.map(|s| s.search(question)),
                rank.map(|s| s.search(question)),
            ),
        };

        let mut tokens = 0;
        let mut merged = ColumnFilter::new();
        if let Some((filter, spent)) = llm_result {
            debug!(tables = filter.len(), tokens = spent, "llm search done");
            tokens += spent;
            merged.merge(filter);
        }
        if let Some(result) = rank_result {
            let (filter, spent) = result?;
            debug!(tables = filter.len(), tokens = spent, "rank search done");
            tokens += spent;
            merged.merge(filter);
        }

        let (tables, relations) = self.assembler.assemble(&merged);
        let description = render_schema_description(self.context, &tables, &relations);
        info!(
            question,
            tables = tables.len(),
            relations = relations.len(),
            tokens,
            "schema retrieval done"
        );
        Ok(RetrievalOutcome {
            description,
            filter: merged,
            tables,
            tokens,
        })
    }
}
