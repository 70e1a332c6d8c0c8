/// Embedding provider errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding request failed after {attempts} attempts: {reason}")]
    RequestFailed { attempts: usize, reason: String },

    #[error("embedding response malformed: {reason}")]
    MalformedResponse { reason: String },

    #[error("provider returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("embedding retries exhausted after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: usize, reason: String },
}
