//! Outbound delivery endpoints.
//!
//! An [`Endpoint`] is the hub-side handle of one connection's bounded
//! outbound queue; the connection drains the matching [`DeliveryStream`].
//! Handles are cheap to clone and all clones refer to the same queue, so the
//! registry and the owning session can hold one each.

use std::{
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use futures_util::Stream;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    watch,
};

use super::{entity::DeliveredMessage, error::DeliveryError, value_object::EndpointId};

type Outbound = mpsc::Sender<Arc<DeliveredMessage>>;

#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

struct EndpointInner {
    id: EndpointId,
    // `None` once closed. Dropping the only sender ends the DeliveryStream
    // after it has drained whatever was already queued.
    sender: Mutex<Option<Outbound>>,
    closed: watch::Sender<bool>,
}

impl Endpoint {
    /// Create an endpoint with a queue bound of `capacity` (at least 1).
    pub fn channel(capacity: usize) -> (Endpoint, DeliveryStream) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let (closed, _) = watch::channel(false);
        let endpoint = Endpoint {
            inner: Arc::new(EndpointInner {
                id: EndpointId::next(),
                sender: Mutex::new(Some(sender)),
                closed,
            }),
        };
        (endpoint, DeliveryStream { receiver })
    }

    pub fn id(&self) -> EndpointId {
        self.inner.id
    }

    /// Whether both handles refer to the same queue.
    pub fn same_as(&self, other: &Endpoint) -> bool {
        self.inner.id == other.inner.id
    }

    /// Queue a message without waiting.
    ///
    /// Fails with [`DeliveryError::Full`] when the bound is reached and with
    /// [`DeliveryError::Closed`] when the endpoint was closed or its
    /// `DeliveryStream` dropped.
    pub fn try_deliver(&self, message: Arc<DeliveredMessage>) -> Result<(), DeliveryError> {
        let sender = self.lock_sender();
        let Some(sender) = sender.as_ref() else {
            return Err(DeliveryError::Closed);
        };
        sender.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Close the endpoint. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let taken = self.lock_sender().take();
        self.inner.closed.send_replace(true);
        taken.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.lock_sender()
            .as_ref()
            .is_none_or(|sender| sender.is_closed())
    }

    /// Resolves once the endpoint is closed from either side: an explicit
    /// [`close`](Self::close) or the `DeliveryStream` being dropped.
    pub async fn closed(&self) {
        let mut closed_rx = self.inner.closed.subscribe();
        let sender = self.lock_sender().clone();
        let Some(sender) = sender else {
            return;
        };
        tokio::select! {
            _ = closed_rx.wait_for(|closed| *closed) => {}
            _ = sender.closed() => {}
        }
    }

    fn lock_sender(&self) -> MutexGuard<'_, Option<Outbound>> {
        // Critical sections never panic, but a poisoned lock must not take
        // the hub down with it.
        self.inner
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Receiving half of an [`Endpoint`].
#[derive(Debug)]
pub struct DeliveryStream {
    receiver: mpsc::Receiver<Arc<DeliveredMessage>>,
}

impl DeliveryStream {
    /// Next delivery, or `None` once the endpoint is closed and drained.
    pub async fn recv(&mut self) -> Option<Arc<DeliveredMessage>> {
        self.receiver.recv().await
    }
}

impl Stream for DeliveryStream {
    type Item = Arc<DeliveredMessage>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
