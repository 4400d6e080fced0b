//! Wire types for the chat endpoint and the session correlation token.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier grouping all messages of one client session.
///
/// Generated once per session and passed explicitly into every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Create a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Outbound request body.
///
/// ```
/// use chatpace::model::{ChatRequest, ConversationId};
///
/// let request = ChatRequest::new("Hi").with_conversation_id(ConversationId::from("abc"));
/// let json = serde_json::to_string(&request).unwrap();
/// assert_eq!(json, r#"{"message":"Hi","conversationId":"abc"}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,

    #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
        }
    }

    pub fn with_conversation_id(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }
}

/// Body of one streamed frame, and of the whole non-streaming reply.
///
/// A missing `response` field is an empty contribution.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_conversation_id() {
        let json = serde_json::to_value(ChatRequest::new("olá")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "olá" }));
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = ConversationId::generate();
        let b = ConversationId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_response_body_missing_field() {
        let body: ChatResponseBody = serde_json::from_str(r#"{"other": 1}"#).unwrap();
        assert_eq!(body.response, "");
    }
}
