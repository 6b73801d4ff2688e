//! Core domain models for the chat hub.

use serde::{Deserialize, Serialize};

use super::value_object::{ClientName, MessageBody, Timestamp};

/// A chat message as sent by a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender's name
    pub from: ClientName,
    /// Message body (may be empty for a bare hello)
    pub body: MessageBody,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(from: ClientName, body: MessageBody) -> Self {
        Self { from, body }
    }

    /// The same body attributed to another sender.
    pub fn reattributed(self, from: ClientName) -> Self {
        Self {
            from,
            body: self.body,
        }
    }
}

/// A chat message stamped by the hub at broadcast time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredMessage {
    /// The original message
    pub message: ChatMessage,
    /// When the hub received the message for broadcasting
    pub received_at: Timestamp,
}

impl DeliveredMessage {
    pub fn new(message: ChatMessage, received_at: Timestamp) -> Self {
        Self {
            message,
            received_at,
        }
    }

    pub fn from(&self) -> &ClientName {
        &self.message.from
    }
}
