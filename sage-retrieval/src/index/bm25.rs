//! Okapi BM25 over per-column sample-question corpora.
//!
//! Document i corresponds to `names[i]` of the vector index: the corpus is
//! built offline from the sample questions associated with each column, so
//! `get_scores` returns one score per indexed column.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const K1: f32 = 1.5;
const B: f32 = 0.75;
/// Negative idf values are floored to `EPSILON * avg_idf`.
const EPSILON: f32 = 0.25;

/// Serialized sparse lexical index (`column_bm25.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bm25Index {
    /// Term frequencies per document.
    doc_freqs: Vec<HashMap<String, u32>>,
    /// Document lengths in tokens.
    doc_lens: Vec<u32>,
    avg_doc_len: f32,
    /// Inverse document frequency per term.
    idf: HashMap<String, f32>,
}

impl Bm25Index {
    /// Fit the index over tokenized documents.
    pub fn fit(corpus: &[Vec<String>]) -> Self {
        let doc_freqs: Vec<HashMap<String, u32>> = corpus
            .iter()
            .map(|doc| {
                let mut freqs: HashMap<String, u32> = HashMap::new();
                for token in doc {
                    *freqs.entry(token.clone()).or_insert(0) += 1;
                }
                freqs
            })
            .collect();
        let doc_lens: Vec<u32> = corpus.iter().map(|doc| doc.len() as u32).collect();
        let total_len: u64 = doc_lens.iter().map(|&l| u64::from(l)).sum();
        let doc_count = corpus.len().max(1) as f32;
        let avg_doc_len = total_len as f32 / doc_count;

        let mut containing: HashMap<String, u32> = HashMap::new();
        for freqs in &doc_freqs {
            for term in freqs.keys() {
                *containing.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let mut idf: HashMap<String, f32> = HashMap::new();
        let mut idf_sum = 0.0f32;
        let mut negative: Vec<String> = Vec::new();
        for (term, df) in &containing {
            let value = ((doc_count - *df as f32 + 0.5) / (*df as f32 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term.clone(), value);
        }
        let avg_idf = idf_sum / containing.len().max(1) as f32;
        for term in negative {
            idf.insert(term, EPSILON * avg_idf);
        }

        Self {
            doc_freqs,
            doc_lens,
            avg_doc_len,
            idf,
        }
    }

    /// One BM25 score per document for the tokenized query.
    pub fn get_scores(&self, query: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_freqs.len()];
        for term in query {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            for (i, freqs) in self.doc_freqs.iter().enumerate() {
                let tf = *freqs.get(term).unwrap_or(&0) as f32;
                if tf == 0.0 {
                    continue;
                }
                let len_norm = 1.0 - B + B * self.doc_lens[i] as f32 / self.avg_doc_len;
                scores[i] += idf * tf * (K1 + 1.0) / (tf + K1 * len_norm);
            }
        }
        scores
    }

    pub fn len(&self) -> usize {
        self.doc_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_freqs.is_empty()
    }

    /// Load `column_bm25.json`, degrading to an empty index when the file
    /// is missing or malformed.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "bm25 index missing, lexical ranking disabled");
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&text) {
            Ok(index) => {
                info!(documents = index.len(), "bm25 index loaded");
                index
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "bm25 index malformed, lexical ranking disabled");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn matching_document_outscores_unrelated() {
        let corpus = vec![
            doc(&["股价", "涨幅", "排名"]),
            doc(&["公司", "注册", "地址"]),
            doc(&["分红", "比例"]),
        ];
        let index = Bm25Index::fit(&corpus);
        let scores = index.get_scores(&doc(&["股价", "涨幅"]));
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
    }

    #[test]
    fn rare_term_outweighs_common_term() {
        let corpus = vec![
            doc(&["交易", "股价"]),
            doc(&["交易", "分红"]),
            doc(&["交易", "担保"]),
        ];
        let index = Bm25Index::fit(&corpus);
        let rare = index.get_scores(&doc(&["分红"]));
        let common = index.get_scores(&doc(&["交易"]));
        assert!(rare[1] > common[1]);
    }

    #[test]
    fn unknown_query_terms_score_zero() {
        let index = Bm25Index::fit(&[doc(&["股价"])]);
        assert_eq!(index.get_scores(&doc(&["从未出现"])), vec![0.0]);
    }

    #[test]
    fn saved_index_reloads_with_identical_scores() {
        let corpus = vec![doc(&["股价", "涨幅"]), doc(&["注册", "地址"])];
        let index = Bm25Index::fit(&corpus);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column_bm25.json");

        index.save(&path).unwrap();
        let loaded = Bm25Index::load(&path);

        assert_eq!(loaded.len(), 2);
        let query = doc(&["股价"]);
        assert_eq!(loaded.get_scores(&query), index.get_scores(&query));
    }

    #[test]
    fn malformed_artifact_degrades_to_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("column_bm25.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Bm25Index::load(&path).is_empty());
    }
}
