//! # sage-core
//!
//! Foundation crate for the sage text-to-SQL engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod schema;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{AssemblyConfig, RefineConfig, RetrievalConfig, SageConfig};
pub use errors::{SageError, SageResult};
pub use models::{ChatMessage, Column, ColumnFilter, HistoryFacts, Role, Table, TableId};
pub use schema::SchemaContext;
