/// Refinement loop errors.
#[derive(Debug, thiserror::Error)]
pub enum RefineError {
    #[error("refinement transcript has no question message")]
    EmptyTranscript,
}
