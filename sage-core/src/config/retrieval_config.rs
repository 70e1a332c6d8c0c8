use serde::{Deserialize, Serialize};

use crate::constants;

/// Schema retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Run the LLM-selection strategy.
    pub enable_llm_search: bool,
    /// Run the ranking strategy.
    pub enable_rank_search: bool,
    /// Run both strategies on a two-worker pool instead of sequentially.
    pub use_concurrency: bool,
    /// Attempts per LLM selection stage.
    pub max_selection_attempts: usize,
    /// Attempts per embedding call, with exponential backoff between them.
    pub max_embedding_attempts: usize,
    /// Columns retained per table per sub-question.
    pub columns_per_table: usize,
    /// Tables kept per sub-question by the vector ranker.
    pub vector_top_tables: usize,
    /// Tables kept per sub-question by the lexical ranker.
    pub lexical_top_tables: usize,
    /// Cosine similarity floor for vector candidates.
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enable_llm_search: true,
            enable_rank_search: true,
            use_concurrency: false,
            max_selection_attempts: constants::MAX_SELECTION_ATTEMPTS,
            max_embedding_attempts: constants::MAX_EMBEDDING_ATTEMPTS,
            columns_per_table: constants::COLUMNS_PER_TABLE,
            vector_top_tables: 3,
            lexical_top_tables: 1,
            similarity_threshold: constants::SIMILARITY_THRESHOLD,
        }
    }
}
