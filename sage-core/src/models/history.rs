use serde::{Deserialize, Serialize};

/// One grounded fact: a SQL statement that executed successfully and its
/// result payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFact {
    pub sql: String,
    pub result: String,
}

/// Ordered `(sql, result)` pairs accumulated across a conversation, replayed
/// in insertion order to seed later turns with prior grounding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryFacts {
    facts: Vec<HistoryFact>,
}

impl HistoryFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sql: impl Into<String>, result: impl Into<String>) {
        self.facts.push(HistoryFact {
            sql: sql.into(),
            result: result.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryFact> {
        self.facts.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn clear(&mut self) {
        self.facts.clear();
    }

    /// Render as a block of prior query/result pairs for seeding a prompt.
    pub fn render(&self) -> String {
        self.facts
            .iter()
            .map(|f| format!("查询sql```{}```\n查询结果:\n{}", f.sql, f.result))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
