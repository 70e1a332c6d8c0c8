use std::collections::HashMap;

/// Outcome messages of every statement already executed in one refinement
/// run, keyed by normalized SQL. A hit means the agent re-proposed a
/// statement; the cached message is replayed instead of re-executing.
///
/// One cache per run, never shared across turns.
#[derive(Debug, Default)]
pub struct SameSqlCache {
    entries: HashMap<String, String>,
}

impl SameSqlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sql: &str) -> Option<&str> {
        self.entries.get(sql).map(String::as_str)
    }

    pub fn insert(&mut self, sql: impl Into<String>, outcome: impl Into<String>) {
        self.entries.insert(sql.into(), outcome.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_the_first_outcome() {
        let mut cache = SameSqlCache::new();
        assert!(cache.get("SELECT 1;").is_none());
        cache.insert("SELECT 1;", "查询结果:\n[]");
        cache.insert("SELECT 1;", "查询结果:\n[2]");
        assert_eq!(cache.get("SELECT 1;"), Some("查询结果:\n[2]"));
        assert_eq!(cache.len(), 1);
    }
}
