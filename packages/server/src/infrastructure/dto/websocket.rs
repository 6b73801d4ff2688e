//! WebSocket message DTOs for the chat hub.
//!
//! A client message carries `from` and `message`; a delivery wraps it with
//! the hub's `timestamp`.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, ClientName, DeliveredMessage, MessageBody, ValueObjectError};

/// Chat message sent by a client (inbound frame, and `POST /api/messages` body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub from: String,
    /// Omitted by a bare hello
    #[serde(default)]
    pub message: String,
}

/// Message pushed by the hub to every recipient (outbound frame)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredMessageDto {
    /// Unix timestamp (milliseconds) at which the hub broadcast the message
    pub timestamp: i64,
    pub message: ChatMessageDto,
}

impl TryFrom<ChatMessageDto> for ChatMessage {
    type Error = ValueObjectError;

    fn try_from(dto: ChatMessageDto) -> Result<Self, Self::Error> {
        Ok(ChatMessage::new(
            ClientName::new(dto.from)?,
            MessageBody::new(dto.message)?,
        ))
    }
}

impl From<&ChatMessage> for ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            from: message.from.as_str().to_string(),
            message: message.body.as_str().to_string(),
        }
    }
}

impl From<&DeliveredMessage> for DeliveredMessageDto {
    fn from(delivered: &DeliveredMessage) -> Self {
        Self {
            timestamp: delivered.received_at.value(),
            message: ChatMessageDto::from(&delivered.message),
        }
    }
}
