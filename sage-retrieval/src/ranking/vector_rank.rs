//! Dense ranking: question embedding vs. the precomputed column vectors.

use std::time::Duration;

use tracing::{debug, warn};

use sage_core::config::RetrievalConfig;
use sage_core::errors::{EmbeddingError, SageResult};
use sage_core::traits::EmbeddingProvider;
use sage_core::SchemaContext;

use crate::index::VectorIndex;
use crate::ranking::{fuse_by_table, TableRanking};

pub struct VectorRanker<'a> {
    provider: &'a dyn EmbeddingProvider,
    index: &'a VectorIndex,
    config: &'a RetrievalConfig,
}

impl<'a> VectorRanker<'a> {
    pub fn new(
        provider: &'a dyn EmbeddingProvider,
        index: &'a VectorIndex,
        config: &'a RetrievalConfig,
    ) -> Self {
        Self {
            provider,
            index,
            config,
        }
    }

    /// Rank tables for one question. Fails loudly once the embedding retry
    /// budget is exhausted; downstream retrieval has no fallback signal.
    pub fn rank(&self, question: &str, context: &SchemaContext) -> SageResult<Vec<TableRanking>> {
        if self.index.is_empty() {
            warn!("column vector index empty, skipping vector ranking");
            return Ok(Vec::new());
        }

        let query = self.embed_with_backoff(question)?;

        let mut scored = self.index.similarities(&query);
        scored.retain(|(_, score)| *score >= self.config.similarity_threshold);
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        debug!(
            question,
            candidates = scored.len(),
            max = scored.first().map(|(_, s)| *s).unwrap_or(0.0),
            "vector ranking"
        );
        Ok(fuse_by_table(&scored, context, self.config.vector_top_tables))
    }

    /// Exponential backoff: 1s, 2s, 4s... between attempts.
    fn embed_with_backoff(&self, question: &str) -> SageResult<Vec<f32>> {
        let mut wait = Duration::from_secs(1);
        let mut last_error = String::new();
        for attempt in 1..=self.config.max_embedding_attempts {
            match self.provider.embed_batch(&[question.to_string()]) {
                Ok(mut vectors) if !vectors.is_empty() => return Ok(vectors.swap_remove(0)),
                Ok(_) => last_error = "provider returned no vectors".to_string(),
                Err(e) => last_error = e.to_string(),
            }
            warn!(
                attempt,
                max = self.config.max_embedding_attempts,
                error = %last_error,
                "question embedding failed"
            );
            if attempt < self.config.max_embedding_attempts {
                std::thread::sleep(wait);
                wait *= 2;
            }
        }
        Err(EmbeddingError::RetriesExhausted {
            attempts: self.config.max_embedding_attempts,
            reason: last_error,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        vector: Vec<f32>,
    }

    impl EmbeddingProvider for FixedProvider {
        fn embed_batch(&self, texts: &[String]) -> SageResult<Vec<Vec<f32>>> {
            Ok(vec![self.vector.clone(); texts.len()])
        }

        fn dimensions(&self) -> usize {
            self.vector.len()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn embed_batch(&self, _texts: &[String]) -> SageResult<Vec<Vec<f32>>> {
            Err(EmbeddingError::RequestFailed {
                attempts: 1,
                reason: "unreachable host".to_string(),
            }
            .into())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn index() -> VectorIndex {
        VectorIndex {
            names: vec!["db.quotes.Price".to_string(), "db.info.Address".to_string()],
            vectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        }
    }

    fn context() -> SchemaContext {
        SchemaContext::new(Vec::new(), std::collections::BTreeMap::new())
    }

    #[test]
    fn threshold_filters_dissimilar_columns() {
        let provider = FixedProvider {
            vector: vec![1.0, 0.0],
        };
        let idx = index();
        let config = RetrievalConfig::default();
        let ranker = VectorRanker::new(&provider, &idx, &config);
        let rankings = ranker.rank("股价", &context()).unwrap();
        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].table.as_str(), "db.quotes");
    }

    #[test]
    fn empty_index_short_circuits() {
        let provider = FailingProvider;
        let idx = VectorIndex::default();
        let config = RetrievalConfig::default();
        let ranker = VectorRanker::new(&provider, &idx, &config);
        assert!(ranker.rank("q", &context()).unwrap().is_empty());
    }

    #[test]
    fn exhausted_retries_fail_loudly() {
        let provider = FailingProvider;
        let idx = index();
        let config = RetrievalConfig {
            max_embedding_attempts: 1,
            ..RetrievalConfig::default()
        };
        let ranker = VectorRanker::new(&provider, &idx, &config);
        assert!(ranker.rank("q", &context()).is_err());
    }
}
