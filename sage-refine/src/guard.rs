//! Read-only execution guard.
//!
//! Every statement the agent produces goes through here. Violations and
//! transport failures both come back as an `{"error": ...}` payload rather
//! than an `Err`, so the refinement loop can feed them to the agent as
//! query feedback instead of aborting the turn.

use serde_json::json;
use tracing::warn;

use sage_core::errors::SageResult;
use sage_core::traits::SqlExecutor;

const DANGEROUS_KEYWORDS: &[&str] = &[
    "DELETE",
    "DROP",
    "TRUNCATE",
    "UPDATE",
    "INSERT",
    "CREATE",
    "ALTER",
    "GRANT",
    "REVOKE",
    "EXECUTE",
    "EXEC",
    "CALL",
    "PROCEDURE",
    "FUNCTION",
];

pub struct GuardedExecutor<E> {
    inner: E,
}

impl<E: SqlExecutor> GuardedExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }

    /// The rejection payload for a statement, or `None` when it may run.
    fn rejection(sql: &str) -> Option<String> {
        let upper = sql.trim().to_uppercase();
        if !(upper.starts_with("SELECT ") || upper.starts_with("SHOW ")) {
            return Some(json!({"error": "只允许执行SELECT和SHOW查询语句"}).to_string());
        }
        for keyword in DANGEROUS_KEYWORDS {
            if upper.contains(keyword) {
                return Some(
                    json!({"error": format!("不允许执行包含 '{keyword}' 的SQL语句")}).to_string(),
                );
            }
        }
        None
    }
}

impl<E: SqlExecutor> SqlExecutor for GuardedExecutor<E> {
    fn execute(&self, sql: &str) -> SageResult<String> {
        if let Some(rejection) = Self::rejection(sql) {
            warn!(sql, "rejected non-query statement");
            return Ok(rejection);
        }
        match self.inner.execute(sql) {
            Ok(data) => Ok(data),
            Err(e) => Ok(json!({"error": format!("SQL查询执行失败: {e}")}).to_string()),
        }
    }
}
