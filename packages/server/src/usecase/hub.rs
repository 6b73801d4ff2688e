//! Hub facade: the operations the transport layer invokes.
//!
//! `ChatHub` owns the client registry and the shutdown signal, and composes
//! the use cases: sessions, one-shot submits, listeners, and shutdown.

use std::sync::Arc;

use futures_util::Stream;
use tokio::sync::watch;

use crate::{
    config::HubConfig,
    domain::{ChatMessage, ClientName, ClientRegistry, Endpoint},
    infrastructure::repository::InMemoryClientRegistry,
};

use super::{
    broadcast_message::BroadcastReport,
    error::{InboundError, SubmitError},
    open_listener::{ListenerSubscription, OpenListenerUseCase},
    session::{ConnectionSession, SessionHandle},
    submit_message::SubmitMessageUseCase,
};

pub struct ChatHub {
    registry: Arc<dyn ClientRegistry>,
    config: HubConfig,
    shutdown: watch::Sender<bool>,
}

impl ChatHub {
    /// Create a hub backed by the in-memory registry.
    pub fn new(config: HubConfig) -> Self {
        Self::with_registry(Arc::new(InMemoryClientRegistry::new()), config)
    }

    pub fn with_registry(registry: Arc<dyn ClientRegistry>, config: HubConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry,
            config,
            shutdown,
        }
    }

    /// Names with a live registration, sorted.
    pub fn current_names(&self) -> Vec<ClientName> {
        self.registry.names()
    }

    /// One-shot send on behalf of an already registered client.
    pub fn submit(&self, message: ChatMessage) -> Result<BroadcastReport, SubmitError> {
        SubmitMessageUseCase::new(Arc::clone(&self.registry)).execute(message)
    }

    /// Register a receive-only endpoint under `name`, superseding any
    /// previous registration. After shutdown the subscription is already
    /// closed.
    pub fn open_listener(&self, name: ClientName) -> ListenerSubscription {
        let usecase =
            OpenListenerUseCase::new(Arc::clone(&self.registry), self.config.outbound_capacity);
        if self.is_shut_down() {
            return usecase.closed(name);
        }

        let subscription = usecase.execute(name);
        if self.is_shut_down() {
            // shutdown drained the registry between the check and the insert
            let name = subscription.name().clone();
            drop(subscription);
            return usecase.closed(name);
        }
        subscription
    }

    /// Start a connection session over `inbound` on a new task.
    ///
    /// The returned outbound stream ends once the session is closed, whether
    /// by the client, a superseding connection, pruning, or shutdown.
    pub fn handle_session<S>(&self, inbound: S) -> SessionHandle
    where
        S: Stream<Item = Result<ChatMessage, InboundError>> + Unpin + Send + 'static,
    {
        let (endpoint, outbound) = Endpoint::channel(self.config.outbound_capacity);
        tracing::debug!("New client connection ({})", endpoint.id());
        let session = ConnectionSession::new(
            inbound,
            endpoint,
            Arc::clone(&self.registry),
            self.config.hello_policy,
            self.shutdown.subscribe(),
        );
        SessionHandle {
            outbound,
            task: tokio::spawn(session.run()),
        }
    }

    /// Close every endpoint and clear the registry. Idempotent.
    pub fn shutdown(&self) {
        let already = self.shutdown.send_replace(true);
        let drained = self.registry.drain();
        if !already {
            tracing::info!("Shutting down chat hub ({} client(s))", drained.len());
        }
        for (name, endpoint) in drained {
            tracing::debug!("Closing endpoint of '{}' ({})", name, endpoint.id());
            endpoint.close();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
