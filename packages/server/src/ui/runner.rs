//! Server startup and graceful shutdown.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::ServerConfig, error::ServerError, usecase::ChatHub};

use super::{
    handler::{chat_handler, get_names, health_check, listen_handler, post_message},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the HTTP and WebSocket routes around `hub`.
pub fn build_router(hub: Arc<ChatHub>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/names", get(get_names))
        .route("/api/messages", post(post_message))
        .route("/ws/chat", get(chat_handler))
        .route("/ws/listen", get(listen_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(hub))
}

/// Bind `config.bind_addr()` and serve until Ctrl+C or SIGTERM.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!(
        "Listening on {} (outbound capacity {}, hello policy {:?})",
        addr,
        config.hub.outbound_capacity,
        config.hub.hello_policy
    );

    let hub = Arc::new(ChatHub::new(config.hub));
    serve(listener, hub, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// The hub is shut down as soon as `shutdown` resolves, so open sockets
/// receive a Close frame and the server can drain.
pub async fn serve<F>(listener: TcpListener, hub: Arc<ChatHub>, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(Arc::clone(&hub));
    let hub_for_shutdown = Arc::clone(&hub);
    let shutdown = async move {
        shutdown.await;
        tracing::info!("Shutdown requested; closing all connections");
        hub_for_shutdown.shutdown();
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    // Idempotent: covers a server that stopped without the signal
    hub.shutdown();
    tracing::info!("Server stopped");
    Ok(())
}
