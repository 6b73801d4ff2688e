//! WebSocket connection handlers.
//!
//! Every socket gets one writer task that drains the client's delivery queue
//! and finishes with a Close frame once the queue ends. The read half is
//! adapted into the inbound stream consumed by the hub.

use std::{error::Error as StdError, future, io, sync::Arc, time::Duration};

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    Stream,
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};

use crate::{
    domain::{ChatMessage, ClientName, DeliveredMessage},
    infrastructure::dto::{
        http::ErrorDto,
        websocket::{ChatMessageDto, DeliveredMessageDto},
    },
    ui::state::{AppState, ListenQuery},
    usecase::{InboundError, SessionHandle, SessionOutcome},
};

/// How long the writer may take to flush and close after its session ended
const WRITER_GRACE: Duration = Duration::from_secs(5);

/// `GET /ws/chat`: bidirectional session. The first frame names the client.
pub async fn chat_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state))
}

/// `GET /ws/listen?name=X`: receive-only subscription under `name`.
pub async fn listen_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<ListenQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorDto>)> {
    // Convert String -> ClientName (Domain Model)
    let name = match ClientName::try_from(query.name) {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!("Rejecting listener: {}", e);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorDto {
                    error: e.to_string(),
                }),
            ));
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_listen_socket(socket, state, name)))
}

async fn handle_chat_socket(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();

    let SessionHandle { outbound, task } = state.hub.handle_session(inbound_messages(receiver));
    let mut send_task = tokio::spawn(write_deliveries(sender, outbound));

    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Session task failed: {}", e);
            send_task.abort();
            return;
        }
    };
    match outcome {
        SessionOutcome::TransportError(_) => {
            tracing::warn!("Chat socket closed: {}", outcome)
        }
        _ => tracing::debug!("Chat socket closed: {}", outcome),
    }

    // The session closed its endpoint, so the writer is already finishing
    if tokio::time::timeout(WRITER_GRACE, &mut send_task)
        .await
        .is_err()
    {
        tracing::warn!("Writer did not finish in time; aborting");
        send_task.abort();
    }
}

async fn handle_listen_socket(socket: WebSocket, state: AppState, name: ClientName) {
    let (sender, mut receiver) = socket.split();

    let subscription = state.hub.open_listener(name.clone());

    // Spawn a task to push deliveries to this listener
    let mut send_task = tokio::spawn(write_deliveries(sender, subscription));

    // Spawn a task to watch the read half until the client goes away
    let listener_name = name.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Close(_)) => {
                    tracing::debug!("Listener '{}' requested close", listener_name);
                    break;
                }
                Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                    tracing::debug!("Ignoring frame from listener '{}'", listener_name);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Listener '{}' read error: {}", listener_name, e);
                    break;
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other.
    // Aborting the writer drops the subscription, which releases the name.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };
    tracing::debug!("Listener socket of '{}' closed", name);
}

/// Drain `deliveries` into the socket, then send a Close frame.
async fn write_deliveries<S>(mut sender: SplitSink<WebSocket, Message>, mut deliveries: S)
where
    S: Stream<Item = Arc<DeliveredMessage>> + Unpin,
{
    while let Some(delivered) = deliveries.next().await {
        let Some(frame) = encode_delivery(&delivered) else {
            continue;
        };
        if let Err(e) = sender.send(frame).await {
            tracing::debug!("Failed to write delivery: {}", e);
            return;
        }
    }

    if let Err(e) = sender.send(Message::Close(None)).await {
        tracing::debug!("Failed to send close frame: {}", e);
    }
}

/// Adapt the read half of a socket into the hub's inbound stream.
///
/// A Close frame ends the stream. Frames that do not decode to a chat
/// message are dropped.
fn inbound_messages(
    receiver: SplitStream<WebSocket>,
) -> impl Stream<Item = Result<ChatMessage, InboundError>> + Unpin + Send + 'static {
    receiver
        .take_while(|frame| future::ready(!matches!(frame, Ok(Message::Close(_)))))
        .filter_map(|frame| future::ready(decode_frame(frame)))
}

fn decode_frame(frame: Result<Message, axum::Error>) -> Option<Result<ChatMessage, InboundError>> {
    let text = match frame {
        Ok(Message::Text(text)) => text,
        Ok(Message::Binary(_)) => {
            tracing::warn!("Ignoring binary frame");
            return None;
        }
        Ok(_) => return None,
        Err(e) => return Some(Err(classify_error(&e))),
    };
    tracing::debug!("Received text: {}", text.as_str());

    // Parse the incoming message
    let dto = match serde_json::from_str::<ChatMessageDto>(text.as_str()) {
        Ok(dto) => dto,
        Err(e) => {
            tracing::warn!("Failed to parse message as JSON: {}", e);
            return None;
        }
    };

    // Convert DTO -> Domain Model
    match ChatMessage::try_from(dto) {
        Ok(message) => Some(Ok(message)),
        Err(e) => {
            tracing::warn!("Dropping invalid message: {}", e);
            None
        }
    }
}

fn encode_delivery(delivered: &DeliveredMessage) -> Option<Message> {
    let dto = DeliveredMessageDto::from(delivered);
    match serde_json::to_string(&dto) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to serialize delivery: {}", e);
            None
        }
    }
}

/// Abrupt disconnects are ordinary cancellations; anything else is a
/// transport failure.
fn classify_error(error: &(dyn StdError + 'static)) -> InboundError {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(io_error) = err.downcast_ref::<io::Error>()
            && matches!(
                io_error.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            )
        {
            return InboundError::Cancelled;
        }
        if err.to_string().contains("without closing handshake") {
            return InboundError::Cancelled;
        }
        current = err.source();
    }
    InboundError::Transport(error.to_string())
}
