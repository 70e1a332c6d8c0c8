//! Dense column-vector index.
//!
//! One vector per qualified column name (`db.table.column`), produced by
//! the offline schema tooling from each column's description text.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Precomputed embedding per qualified column name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    pub names: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Load `column_vectors.json`, degrading to an empty index when the
    /// file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "column vector index missing, vector ranking disabled");
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&text) {
            Ok(index) if index.names.len() == index.vectors.len() => {
                info!(columns = index.names.len(), "column vector index loaded");
                index
            }
            Ok(index) => {
                warn!(
                    names = index.names.len(),
                    vectors = index.vectors.len(),
                    "column vector index inconsistent, vector ranking disabled"
                );
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "column vector index malformed, vector ranking disabled");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Cosine similarity of `query` against every indexed column, paired
    /// with the column's qualified name.
    pub fn similarities<'a>(&'a self, query: &[f32]) -> Vec<(&'a str, f32)> {
        self.names
            .iter()
            .zip(&self.vectors)
            .map(|(name, vector)| (name.as_str(), cosine(query, vector)))
            .collect()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
