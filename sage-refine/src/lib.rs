//! # sage-refine
//!
//! The iterative SQL loop that turns a retrieved schema description into an
//! answered question. Each iteration asks the master agent for the next
//! step, executes every ```exec_sql``` block through a guarded executor,
//! and feeds the grouped results back into the transcript. The loop ends
//! when the agent stops requesting SQL, when the iteration budget runs out,
//! or when it keeps repeating statements it has already run; a summary
//! agent then answers from the accumulated transcript.

pub mod engine;
pub mod guard;
pub mod sql_extract;

pub use engine::{RefineOutcome, SqlRefinementEngine};
pub use guard::GuardedExecutor;
pub use sql_extract::extract_all_sqls;
