use crate::errors::SageResult;

/// Batched dense-vector lookup.
///
/// Implementations retry transient transport failures themselves and must
/// return `Err` once that budget is exhausted; downstream ranking has no
/// fallback and needs the failure to surface.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    fn embed_batch(&self, texts: &[String]) -> SageResult<Vec<Vec<f32>>>;

    /// The dimensionality of vectors produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}
