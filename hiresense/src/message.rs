//! Chat message types.
//!
//! A conversation is an ordered `Vec<Message>`. Callers only ever append to
//! it; while a reply is streaming, the consumer rewrites the content of the
//! trailing assistant message in place.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user.
    User,
    /// Reply produced by the assistant.
    Assistant,
}

impl Role {
    /// Get the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Create a message with the given role.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    #[inline]
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Returns `true` if this is an assistant message.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Fold the cumulative assistant text into `history`.
///
/// If the last message is an assistant message its content is replaced
/// with `accumulated`; otherwise a new assistant message is appended.
pub fn upsert_assistant(history: &mut Vec<Message>, accumulated: &str) {
    match history.last_mut() {
        Some(last) if last.is_assistant() => {
            last.content.clear();
            last.content.push_str(accumulated);
        }
        _ => history.push(Message::assistant(accumulated)),
    }
}

/// Request body sent to the chat endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequestBody<'a> {
    pub messages: &'a [Message],
}
