use serde::{Deserialize, Serialize};

use crate::constants;

/// SQL refinement loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Iteration bound per question turn.
    pub max_iterations: usize,
    /// Consecutive repeat-containing iterations before the loop aborts.
    pub max_consecutive_repeats: usize,
    /// Row limit the executor applies to result sets. A result that exactly
    /// fills it triggers the truncation backpressure warning.
    pub default_sql_limit: Option<usize>,
    /// Append successful sql/result pairs to `HistoryFacts`.
    pub cache_history_facts: bool,
    /// Schema description messages folded into agent system knowledge.
    pub max_known_structures: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_iterations: constants::DEFAULT_MAX_ITERATIONS,
            max_consecutive_repeats: constants::MAX_CONSECUTIVE_REPEATS,
            default_sql_limit: None,
            cache_history_facts: false,
            max_known_structures: 1,
        }
    }
}
