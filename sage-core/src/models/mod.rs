//! Data model shared across the workspace.

mod column_filter;
mod history;
mod message;
mod same_sql_cache;
mod table;

pub use column_filter::ColumnFilter;
pub use history::HistoryFacts;
pub use message::{ChatMessage, Role};
pub use same_sql_cache::SameSqlCache;
pub use table::{Column, Table, TableId};
