//! # sage-retrieval
//!
//! Finds the smallest sufficient set of tables and columns for a
//! natural-language question over a multi-database financial schema.
//!
//! Two independent strategies feed one merged result:
//! - LLM progressive selection (database → table → column), every stage a
//!   bounded attempt loop with accumulated error feedback;
//! - hybrid ranking (dense cosine + sparse BM25 per decomposed
//!   sub-question) followed by the same column-selection loop.
//!
//! The merged column filter runs through [`ColumnSetAssembler`], which
//! completes sibling tables and columns, force-includes key columns, and
//! resolves join paths with cross-market suppression. The rendered schema
//! description is what the downstream SQL loop grounds itself on.

pub mod assembler;
pub mod describe;
pub mod entity;
pub mod extract;
pub mod index;
pub mod ranking;
pub mod retriever;
pub mod strategy;
pub mod tokenize;

pub use assembler::{ColumnSetAssembler, TableColumns};
pub use index::{Bm25Index, VectorIndex};
pub use ranking::{LexicalRanker, TableRanking, VectorRanker};
pub use retriever::{RetrievalOutcome, SchemaRetriever};
pub use strategy::{Attempt, LlmSearch, RankSearch};
