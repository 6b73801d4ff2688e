//! WebSocket connections to the hub.

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use murmur_server::{
    domain::ClientName,
    infrastructure::dto::websocket::{ChatMessageDto, DeliveredMessageDto},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::{address::ServerAddr, error::ClientError};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Messages pushed by the hub
pub struct Deliveries {
    stream: SplitStream<Socket>,
}

impl Deliveries {
    /// Next delivery, or `None` once the hub closed the connection.
    pub async fn next(&mut self) -> Option<Result<DeliveredMessageDto, ClientError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<DeliveredMessageDto>(text.as_str()) {
                        Ok(delivered) => return Some(Ok(delivered)),
                        Err(e) => tracing::warn!("Ignoring undecodable frame: {}", e),
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server closed the connection: {:?}", frame);
                    return None;
                }
                Ok(_) => {}
                Err(e) => return Some(Err(ClientError::WebSocket(e))),
            }
        }
        None
    }
}

/// Write half of a chat session
pub struct ChatSender {
    name: String,
    sink: SplitSink<Socket, Message>,
}

impl ChatSender {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn send(&mut self, message: &str) -> Result<(), ClientError> {
        let dto = ChatMessageDto {
            from: self.name.clone(),
            message: message.to_string(),
        };
        self.sink
            .send(Message::text(serde_json::to_string(&dto)?))
            .await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.send(Message::Close(None)).await?;
        Ok(())
    }
}

/// Write half of a listener connection, kept only to close it cleanly
pub struct ListenerHandle {
    sink: SplitSink<Socket, Message>,
}

impl ListenerHandle {
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.send(Message::Close(None)).await?;
        Ok(())
    }
}

async fn connect(url: String) -> Result<Socket, ClientError> {
    tracing::debug!("Connecting to {}", url);
    match connect_async(url.as_str()).await {
        Ok((socket, _)) => Ok(socket),
        Err(source) => Err(ClientError::Connect { url, source }),
    }
}

/// Open a chat session and introduce the client as `name`.
///
/// The hub drops frames from an invalid sender, so the name is checked
/// before connecting.
pub async fn open_chat(
    addr: &ServerAddr,
    name: &str,
) -> Result<(ChatSender, Deliveries), ClientError> {
    let name = ClientName::try_from(name)?;
    let (sink, stream) = connect(addr.ws_url("/ws/chat")).await?.split();
    let mut sender = ChatSender {
        name: name.into_string(),
        sink,
    };

    // The first frame names the session
    sender.send("").await?;
    tracing::info!("Joined as '{}'", sender.name);

    Ok((sender, Deliveries { stream }))
}

/// Subscribe to deliveries under `name` without a chat session.
pub async fn open_listener(
    addr: &ServerAddr,
    name: &str,
) -> Result<(ListenerHandle, Deliveries), ClientError> {
    let name = ClientName::try_from(name)?;
    let (sink, stream) = connect(addr.listen_url(name.as_str())?).await?.split();
    tracing::info!("Listening as '{}'", name);
    Ok((ListenerHandle { sink }, Deliveries { stream }))
}
