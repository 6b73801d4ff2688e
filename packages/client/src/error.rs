//! Client error types.

use murmur_server::domain::ValueObjectError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("invalid name: {0}")]
    InvalidName(#[from] ValueObjectError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The hub has no live registration for the sender
    #[error("'{0}' is not subscribed; connect a listener under this name first")]
    NotSubscribed(String),

    #[error("server rejected the request ({status}): {error}")]
    Rejected { status: u16, error: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] rustyline::error::ReadlineError),

    #[error("prompt task failed: {0}")]
    PromptTask(#[from] tokio::task::JoinError),
}
