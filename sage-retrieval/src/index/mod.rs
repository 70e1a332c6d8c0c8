//! Persisted ranking artifacts: the dense column-vector index and the
//! sparse BM25 index. Both load leniently; a missing artifact disables
//! the corresponding ranker instead of failing startup.

mod bm25;
mod vectors;

pub use bm25::Bm25Index;
pub use vectors::VectorIndex;
