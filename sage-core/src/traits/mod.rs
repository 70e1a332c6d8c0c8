//! Collaborator contracts consumed by the core.
//!
//! The chat-completion transport, embedding transport, and SQL connection
//! layer all live behind these traits; the engine never talks to a network
//! directly.

mod agent;
mod embedding;
mod executor;

pub use agent::{AgentReply, ReasoningAgent};
pub use embedding::EmbeddingProvider;
pub use executor::SqlExecutor;
