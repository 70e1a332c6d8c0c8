//! Snapshot persistence and DOT export.
//!
//! The JSON snapshot is the adjacency map itself, so graphs built by the
//! offline schema tooling load without translation. Loading tolerates a
//! missing or malformed file by returning an empty graph: a missing
//! relation graph degrades join-path hints, it must never abort startup.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use sage_core::errors::{GraphError, SageResult};

use crate::relation_graph::RelationGraph;

impl RelationGraph {
    /// Serialize the adjacency map to a JSON file.
    pub fn save_to_file(&self, path: &Path) -> SageResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| GraphError::SnapshotWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), tables = self.table_count(), "relation graph saved");
        Ok(())
    }

    /// Load a snapshot, returning an empty graph when the file is missing
    /// or does not parse.
    pub fn load_from_file(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "relation graph snapshot missing, starting empty");
                return Self::new();
            }
        };
        match serde_json::from_str::<Self>(&text) {
            Ok(graph) => {
                info!(path = %path.display(), tables = graph.table_count(), "relation graph loaded");
                graph
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "relation graph snapshot malformed, starting empty");
                Self::new()
            }
        }
    }

    /// Render the graph in Graphviz DOT. Undirected, one edge line per
    /// relation, labels carrying the relation name and column pair.
    pub fn export_dot(&self) -> String {
        let mut out = String::from("graph TableRelations {\n");
        out.push_str("  rankdir=LR;\n");
        out.push_str("  node [shape=box, style=filled, fillcolor=lightblue];\n");

        let mut emitted: BTreeSet<(String, String)> = BTreeSet::new();
        for (src, neighbors) in &self.adjacency {
            for (dst, relations) in neighbors {
                let key = if src <= dst {
                    (src.clone(), dst.clone())
                } else {
                    (dst.clone(), src.clone())
                };
                if !emitted.insert(key) {
                    continue;
                }
                for relation in relations {
                    let mut label = relation.name.clone().unwrap_or_else(|| "关联".to_string());
                    if let Some(columns) = &relation.columns {
                        label.push_str("\\n");
                        label.push_str(columns);
                    }
                    out.push_str(&format!("  \"{src}\" -- \"{dst}\" [label=\"{label}\"];\n"));
                }
            }
        }
        out.push_str("}\n");
        out
    }
}
