use std::collections::{BTreeMap, VecDeque};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use sage_core::constants::INFERRED_RELATION_PREFIX;

/// One edge between two tables. `columns` is a `"colA-colB"` pair where the
/// first name belongs to the source table of the direction being read;
/// mirrored entries store the swapped order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub name: Option<String>,
    pub columns: Option<String>,
}

impl Relation {
    /// Split the `"colA-colB"` pair, if present and well-formed.
    pub fn column_pair(&self) -> Option<(&str, &str)> {
        self.columns.as_deref()?.split_once('-')
    }

    fn reversed(&self) -> Self {
        let columns = self
            .column_pair()
            .map(|(a, b)| format!("{b}-{a}"))
            .or_else(|| self.columns.clone());
        Self {
            name: self.name.clone(),
            columns,
        }
    }
}

/// One hop of a discovered join path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHop {
    pub from: String,
    pub to: String,
    /// Relation name, falling back to `关联` for unnamed edges.
    pub relation_name: String,
    /// `"colA-colB"` pair, empty when the edge carries no column metadata.
    pub columns: String,
}

/// Undirected multigraph of tables. Always symmetric: adding `(A,B)` also
/// creates the mirrored `(B,A)` entry with swapped column order. Two tables
/// may be linked by multiple distinct column pairs; identical pairs are
/// suppressed on insert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationGraph {
    pub(crate) adjacency: BTreeMap<String, BTreeMap<String, Vec<Relation>>>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent node insertion.
    pub fn add_table(&mut self, name: &str) {
        self.adjacency.entry(name.to_string()).or_default();
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    pub fn table_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    /// Relations from `t1` to `t2`, in insertion order.
    pub fn relations(&self, t1: &str, t2: &str) -> &[Relation] {
        self.adjacency
            .get(t1)
            .and_then(|n| n.get(t2))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All `(neighbor, relation)` pairs of one table.
    pub fn neighbors(&self, table: &str) -> Vec<(&str, &Relation)> {
        let Some(adjacent) = self.adjacency.get(table) else {
            return Vec::new();
        };
        adjacent
            .iter()
            .flat_map(|(to, relations)| relations.iter().map(move |r| (to.as_str(), r)))
            .collect()
    }

    /// Insert a symmetric edge unless an edge with the same column pair
    /// already exists between the two tables. Returns whether a new edge
    /// was added.
    ///
    /// With `infer_transitive` set and both columns given, one hop of
    /// transitive discovery runs: existing relations sharing a column on
    /// the joint table synthesize `推断(...)`-labeled edges.
    pub fn add_relation(
        &mut self,
        t1: &str,
        t2: &str,
        relation_name: Option<&str>,
        col1: Option<&str>,
        col2: Option<&str>,
        infer_transitive: bool,
    ) -> bool {
        self.add_table(t1);
        self.add_table(t2);

        let relation = Relation {
            name: relation_name.map(str::to_string),
            columns: match (col1, col2) {
                (Some(a), Some(b)) => Some(format!("{a}-{b}")),
                _ => None,
            },
        };

        let forward = self
            .adjacency
            .get_mut(t1)
            .expect("node inserted above")
            .entry(t2.to_string())
            .or_default();
        if forward.iter().any(|r| r.columns == relation.columns) {
            return false;
        }
        let reverse_relation = relation.reversed();
        forward.push(relation);
        self.adjacency
            .get_mut(t2)
            .expect("node inserted above")
            .entry(t1.to_string())
            .or_default()
            .push(reverse_relation);

        if infer_transitive {
            if let (Some(name), Some(c1), Some(c2)) = (relation_name, col1, col2) {
                self.infer_from_new_relation(t1, t2, name, c1, c2);
            }
        }
        true
    }

    /// One-hop transitive synthesis around a freshly added `(a, b)` edge.
    ///
    /// A–B joined on `col_b` plus an existing B–C joined on the same `col_b`
    /// implies A–C; symmetrically, an existing C–A joined on `col_a` implies
    /// C–B. Inferred edges never recurse further. The duplicate-column-pair
    /// check is the only guard against mutually-recursive inference.
    fn infer_from_new_relation(&mut self, a: &str, b: &str, name: &str, col_a: &str, col_b: &str) {
        // (to_table_1, to_table_2, name, from_col, to_col)
        let mut synthesized: Vec<(String, String, String, String, String)> = Vec::new();

        if let Some(adjacent) = self.adjacency.get(b) {
            for (c, relations) in adjacent {
                if c == a {
                    continue;
                }
                for relation in relations {
                    if let Some((col_b2, col_c)) = relation.column_pair() {
                        if col_b == col_b2 {
                            let label = format!(
                                "{INFERRED_RELATION_PREFIX}({name}-{})",
                                relation.name.as_deref().unwrap_or("关联")
                            );
                            synthesized.push((
                                a.to_string(),
                                c.clone(),
                                label,
                                col_a.to_string(),
                                col_c.to_string(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(adjacent) = self.adjacency.get(a) {
            for (c, relations) in adjacent {
                if c == b {
                    continue;
                }
                for relation in relations {
                    if let Some((col_c, col_a2)) = relation.column_pair() {
                        if col_a == col_a2 {
                            let label = format!(
                                "{INFERRED_RELATION_PREFIX}({}-{name})",
                                relation.name.as_deref().unwrap_or("关联")
                            );
                            synthesized.push((
                                c.clone(),
                                b.to_string(),
                                label,
                                col_c.to_string(),
                                col_b.to_string(),
                            ));
                        }
                    }
                }
            }
        }

        for (t1, t2, label, c1, c2) in synthesized {
            self.add_relation(&t1, &t2, Some(&label), Some(&c1), Some(&c2), false);
        }
    }

    /// Breadth-first shortest path between two tables.
    ///
    /// A node, once discovered, is never revisited, so cycles cannot loop
    /// the search. The first path reaching the target at the minimal depth
    /// wins, but the search runs to completion to confirm minimality.
    /// Returns `None` for absent endpoints, unreachable targets, and
    /// `start == end`.
    pub fn find_shortest_path(&self, start: &str, end: &str) -> Option<Vec<PathHop>> {
        if start == end {
            return None;
        }
        if !self.adjacency.contains_key(start) || !self.adjacency.contains_key(end) {
            return None;
        }

        let mut queue: VecDeque<(String, Vec<PathHop>)> = VecDeque::new();
        queue.push_back((start.to_string(), Vec::new()));
        let mut visited: BTreeSet<String> = BTreeSet::new();
        visited.insert(start.to_string());
        let mut shortest: Option<Vec<PathHop>> = None;

        while let Some((current, path)) = queue.pop_front() {
            if current == end {
                if shortest.as_ref().is_none_or(|s| path.len() < s.len()) {
                    shortest = Some(path);
                }
                continue;
            }
            if let Some(s) = &shortest {
                if path.len() >= s.len() {
                    continue;
                }
            }
            let Some(adjacent) = self.adjacency.get(&current) else {
                continue;
            };
            for (neighbor, relations) in adjacent {
                if visited.contains(neighbor) {
                    continue;
                }
                // The first relation stands in for the edge; a hand-edited
                // snapshot may carry an empty relation list, which is no
                // edge at all.
                let Some(relation) = relations.first() else {
                    continue;
                };
                visited.insert(neighbor.clone());
                let mut next_path = path.clone();
                next_path.push(PathHop {
                    from: current.clone(),
                    to: neighbor.clone(),
                    relation_name: relation.name.clone().unwrap_or_else(|| "关联".to_string()),
                    columns: relation.columns.clone().unwrap_or_default(),
                });
                queue.push_back((neighbor.clone(), next_path));
            }
        }

        shortest
    }

    /// Depth-first enumeration of every path of at most `max_hops` hops,
    /// backtracking the visited set per branch. Each distinct relation of a
    /// multi-edge produces its own path.
    pub fn find_all_paths(&self, start: &str, end: &str, max_hops: usize) -> Vec<Vec<PathHop>> {
        if !self.adjacency.contains_key(start) || !self.adjacency.contains_key(end) {
            return Vec::new();
        }
        let mut paths = Vec::new();
        let mut visited: BTreeSet<String> = BTreeSet::new();
        visited.insert(start.to_string());
        let mut current_path: Vec<PathHop> = Vec::new();
        self.dfs_paths(start, end, max_hops, &mut visited, &mut current_path, &mut paths);
        paths
    }

    fn dfs_paths(
        &self,
        current: &str,
        end: &str,
        max_hops: usize,
        visited: &mut BTreeSet<String>,
        path: &mut Vec<PathHop>,
        out: &mut Vec<Vec<PathHop>>,
    ) {
        if current == end && !path.is_empty() {
            out.push(path.clone());
            return;
        }
        if path.len() >= max_hops {
            return;
        }
        let Some(adjacent) = self.adjacency.get(current) else {
            return;
        };
        for (neighbor, relations) in adjacent {
            if visited.contains(neighbor) {
                continue;
            }
            visited.insert(neighbor.clone());
            for relation in relations {
                path.push(PathHop {
                    from: current.to_string(),
                    to: neighbor.clone(),
                    relation_name: relation.name.clone().unwrap_or_else(|| "关联".to_string()),
                    columns: relation.columns.clone().unwrap_or_default(),
                });
                self.dfs_paths(neighbor, end, max_hops, visited, path, out);
                path.pop();
            }
            visited.remove(neighbor);
        }
    }

    /// Shortest paths between every ordered pair of tables, optionally
    /// bounded by hop count. Offline tooling uses this for audit dumps.
    pub fn all_paths(&self, max_hops: Option<usize>) -> BTreeMap<(String, String), Vec<PathHop>> {
        let tables: Vec<&String> = self.adjacency.keys().collect();
        let mut paths = BTreeMap::new();
        for start in &tables {
            for end in &tables {
                if start == end {
                    continue;
                }
                if let Some(path) = self.find_shortest_path(start, end) {
                    if max_hops.is_none_or(|m| path.len() <= m) {
                        paths.insert(((*start).clone(), (*end).clone()), path);
                    }
                }
            }
        }
        paths
    }
}
