//! Sparse ranking: BM25 over per-column sample-question corpora.

use jieba_rs::Jieba;
use tracing::{debug, warn};

use sage_core::config::RetrievalConfig;
use sage_core::SchemaContext;

use crate::index::{Bm25Index, VectorIndex};
use crate::ranking::{fuse_by_table, TableRanking};
use crate::tokenize::tokenize;

/// Document order of the BM25 index follows the column-name list of the
/// vector index, so lexical ranking needs both artifacts.
pub struct LexicalRanker<'a> {
    jieba: Jieba,
    bm25: &'a Bm25Index,
    names: &'a VectorIndex,
    config: &'a RetrievalConfig,
}

impl<'a> LexicalRanker<'a> {
    pub fn new(bm25: &'a Bm25Index, names: &'a VectorIndex, config: &'a RetrievalConfig) -> Self {
        Self {
            jieba: Jieba::new(),
            bm25,
            names,
            config,
        }
    }

    /// Rank tables for one question. Degrades silently to empty when the
    /// index was never built; the vector ranker still operates.
    pub fn rank(&self, question: &str, context: &SchemaContext) -> Vec<TableRanking> {
        if self.bm25.is_empty() {
            warn!("bm25 index empty, skipping lexical ranking");
            return Vec::new();
        }
        if self.bm25.len() != self.names.len() {
            warn!(
                documents = self.bm25.len(),
                columns = self.names.len(),
                "bm25 index does not match column list, skipping lexical ranking"
            );
            return Vec::new();
        }

        let tokens = tokenize(&self.jieba, question);
        let scores = self.bm25.get_scores(&tokens);

        let mut scored: Vec<(&str, f32)> = self
            .names
            .names
            .iter()
            .map(String::as_str)
            .zip(scores)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        debug!(question, tokens = tokens.len(), "lexical ranking");
        fuse_by_table(&scored, context, self.config.lexical_top_tables)
    }
}
