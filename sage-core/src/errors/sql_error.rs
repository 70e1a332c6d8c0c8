/// SQL execution transport errors.
///
/// Query-level failures never surface here: the executor contract returns
/// them as an `{"error": ...}` payload so the refinement loop can feed them
/// back to the agent.
#[derive(Debug, thiserror::Error)]
pub enum SqlError {
    #[error("connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("transport error: {reason}")]
    Transport { reason: String },
}
