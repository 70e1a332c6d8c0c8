//! Error types for every sage subsystem.
//!
//! Each subsystem gets its own enum; `SageError` aggregates them so that
//! crate boundaries can use a single `SageResult<T>`.

mod embedding_error;
mod graph_error;
mod refine_error;
mod retrieval_error;
mod schema_error;
mod sql_error;

pub use embedding_error::EmbeddingError;
pub use graph_error::GraphError;
pub use refine_error::RefineError;
pub use retrieval_error::RetrievalError;
pub use schema_error::SchemaError;
pub use sql_error::SqlError;

/// Top-level error for the sage engine.
#[derive(Debug, thiserror::Error)]
pub enum SageError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Sql(#[from] SqlError),

    #[error(transparent)]
    Refine(#[from] RefineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used across all sage crates.
pub type SageResult<T> = Result<T, SageError>;
