use crate::errors::SageResult;

/// Raw SQL execution layer.
///
/// Query-level failures never return `Err`: they come back as an
/// `Ok` JSON object `{"error": "..."}` so the refinement loop can surface
/// them to the agent as feedback. Only transport failures are errors.
pub trait SqlExecutor: Send + Sync {
    /// Execute a statement, returning either a JSON array of row objects or
    /// an `{"error": "..."}` object.
    fn execute(&self, sql: &str) -> SageResult<String>;
}
