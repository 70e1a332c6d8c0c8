/// Relation graph errors.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("snapshot write failed at {path}: {reason}")]
    SnapshotWriteFailed { path: String, reason: String },

    #[error("malformed relation column pair `{pair}`")]
    MalformedColumnPair { pair: String },
}
