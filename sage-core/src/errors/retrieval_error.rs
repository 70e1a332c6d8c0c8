/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("column selection failed after {attempts} attempts: {last_error}")]
    SelectionExhausted { attempts: usize, last_error: String },

    #[error("no JSON payload found in agent response")]
    NoJsonPayload,

    #[error("ranking failed: {reason}")]
    RankingFailed { reason: String },
}
