//! HTTP API client.

use murmur_server::infrastructure::dto::{
    http::{ChatRoomDto, ErrorDto, SubmitResponseDto},
    websocket::ChatMessageDto,
};
use reqwest::StatusCode;

use crate::{address::ServerAddr, error::ClientError};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    addr: ServerAddr,
}

impl ApiClient {
    pub fn new(addr: ServerAddr) -> Self {
        Self {
            http: reqwest::Client::new(),
            addr,
        }
    }

    /// `GET /api/names`
    pub async fn names(&self) -> Result<Vec<String>, ClientError> {
        let room: ChatRoomDto = self
            .http
            .get(self.addr.http_url("/api/names"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(room.names)
    }

    /// `POST /api/messages`; returns how many clients the message was queued for.
    pub async fn submit(&self, from: &str, message: &str) -> Result<usize, ClientError> {
        let dto = ChatMessageDto {
            from: from.to_string(),
            message: message.to_string(),
        };
        let response = self
            .http
            .post(self.addr.http_url("/api/messages"))
            .json(&dto)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: SubmitResponseDto = response.json().await?;
            return Ok(body.delivered);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotSubscribed(from.to_string()));
        }

        let error = match response.json::<ErrorDto>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
        };
        Err(ClientError::Rejected {
            status: status.as_u16(),
            error,
        })
    }
}
