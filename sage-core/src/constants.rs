/// Sage system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Marker prefixed to every rendered schema description. Messages carrying
/// it are routed into agent system knowledge instead of the chat transcript.
pub const COLUMN_LIST_MARK: &str = "数据表的字段信息如下";

/// Maximum refinement iterations per question turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Consecutive iterations containing a repeated SQL before the loop aborts.
pub const MAX_CONSECUTIVE_REPEATS: usize = 3;

/// Attempts per LLM selection stage before giving up.
pub const MAX_SELECTION_ATTEMPTS: usize = 5;

/// Attempts per embedding call before failing loudly.
pub const MAX_EMBEDDING_ATTEMPTS: usize = 5;

/// Columns retained per table per sub-question during ranking.
pub const COLUMNS_PER_TABLE: usize = 15;

/// Cosine similarity floor below which a column is not a candidate.
pub const SIMILARITY_THRESHOLD: f32 = 0.1;

/// Relation label prefix for edges synthesized by transitive inference.
pub const INFERRED_RELATION_PREFIX: &str = "推断";
