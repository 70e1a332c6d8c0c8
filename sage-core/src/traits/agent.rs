use crate::models::ChatMessage;

/// Response from one agent round trip.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub content: String,
    pub tokens: usize,
}

impl AgentReply {
    pub fn new(content: impl Into<String>, tokens: usize) -> Self {
        Self {
            content: content.into(),
            tokens,
        }
    }
}

/// Stateful conversational agent backed by a chat-completion model.
///
/// Implementations own their transport retries: a call that fails after the
/// internal budget returns an error-flagged `content`, never panics or
/// errors, so callers can always feed the reply back into a transcript.
pub trait ReasoningAgent: Send {
    /// Single-shot call with the agent's own conversation state.
    fn answer(&mut self, prompt: &str) -> AgentReply;

    /// Call with an explicit transcript instead of internal state.
    fn chat(&mut self, messages: &[ChatMessage]) -> AgentReply;

    /// Attach a keyed block of system knowledge (e.g. a schema description).
    fn add_system_knowledge(&mut self, key: &str, value: &str);

    /// Human-readable agent name, used in logs.
    fn name(&self) -> &str;
}
