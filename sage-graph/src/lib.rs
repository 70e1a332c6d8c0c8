//! # sage-graph
//!
//! Undirected multigraph over database tables with join-column metadata.
//! Supports shortest-path and bounded all-path discovery, transitive
//! relation inference, JOIN-skeleton rendering, DOT export, and a JSON
//! snapshot format.
//!
//! The graph exists because the schema declares no foreign keys: join
//! routes between tables are inferred offline and queried at retrieval
//! time to tell the agent how selected tables connect.

mod relation_graph;
mod render;
mod snapshot;

pub use relation_graph::{PathHop, Relation, RelationGraph};
pub use render::{print_all_paths, print_path};
