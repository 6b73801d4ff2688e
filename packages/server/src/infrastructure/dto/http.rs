//! HTTP API request/response DTOs for the chat hub.

use serde::{Deserialize, Serialize};

/// Currently connected names (`GET /api/names`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoomDto {
    pub names: Vec<String>,
}

/// Result of a one-shot send (`POST /api/messages`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponseDto {
    /// Number of recipients the message was queued for
    pub delivered: usize,
}

/// Error body returned alongside a non-2xx status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}
