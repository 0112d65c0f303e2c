use serde::{Deserialize, Serialize};

/// Role carried on API-bound chat messages.
///
/// System messages are never replayed to the chat endpoints, so the wire
/// surface only knows the two conversational roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiRole {
    User,
    Assistant,
}

/// One history item replayed to the chat endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: ApiRole,
    pub content: String,
}

impl ApiMessage {
    #[must_use]
    pub fn new(role: ApiRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Canonical request payload shared by all three transport tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub agent_id: i64,
    pub messages: Vec<ApiMessage>,
    pub stream: bool,
}

impl ChatRequest {
    /// Builds a streaming request for the given agent and history.
    #[must_use]
    pub fn new(agent_id: i64, messages: Vec<ApiMessage>) -> Self {
        Self {
            agent_id,
            messages,
            stream: true,
        }
    }

    /// The same request with the stream flag adjusted for a specific tier.
    #[must_use]
    pub fn with_stream(&self, stream: bool) -> Self {
        let mut request = self.clone();
        request.stream = stream;
        request
    }
}

/// Single-shot chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub agent_id: i64,
}
