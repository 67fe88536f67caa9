//! # Subscriber
//!
//! Receive side of a [`BroadcastHub`](crate::BroadcastHub).

use std::fmt;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_stream::Stream;

/// Identifier of a subscription, unique for the lifetime of its hub.
pub type SubscriptionId = u64;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscription was cancelled or its hub was closed.
    #[error("Subscription closed")]
    Closed,
}

/// Hub side of a cancellation: remove and close one subscription.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: SubscriptionId);
}

/// Cloneable handle that cancels one subscription.
///
/// Cancelling is idempotent and safe after the hub has been closed or dropped.
#[derive(Clone)]
pub struct Canceller {
    hub: Option<Weak<dyn Detach>>,
    id: SubscriptionId,
}

impl Canceller {
    pub(crate) fn new(hub: Weak<dyn Detach>, id: SubscriptionId) -> Self {
        Self { hub: Some(hub), id }
    }

    pub(crate) fn noop() -> Self {
        Self { hub: None, id: 0 }
    }

    /// Remove the subscription from its hub and close its delivery queue.
    pub fn cancel(&self) {
        if let Some(hub) = self.hub.as_ref().and_then(Weak::upgrade) {
            hub.detach(self.id);
        }
    }
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller")
            .field("id", &self.id)
            .field("bound", &self.hub.is_some())
            .finish()
    }
}

/// A subscription handle for receiving values published on a hub.
///
/// Values arrive in publish order. The handle yields `None` once the
/// subscription is cancelled or the hub is closed and everything already
/// accepted has been delivered.
///
/// Dropping the handle cancels the subscription.
pub struct Subscription<T> {
    id: SubscriptionId,
    receiver: mpsc::Receiver<T>,
    canceller: Canceller,
}

impl<T> Subscription<T> {
    pub(crate) fn new(id: SubscriptionId, receiver: mpsc::Receiver<T>, canceller: Canceller) -> Self {
        Self {
            id,
            receiver,
            canceller,
        }
    }

    /// A handle that is already closed and whose cancel does nothing.
    pub(crate) fn closed() -> Self {
        let (sender, receiver) = mpsc::channel(1);
        drop(sender);
        Self::new(0, receiver, Canceller::noop())
    }

    /// Subscription identifier. Zero for a handle obtained from a closed hub.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Receive the next value.
    ///
    /// # Returns
    ///
    /// - `Some(value)` - The next value in publish order
    /// - `None` - The subscription is closed
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Blocking variant of [`recv`](Self::recv) for plain threads.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn blocking_recv(&mut self) -> Option<T> {
        self.receiver.blocking_recv()
    }

    /// Try to receive the next value without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` - A value was available
    /// - `Ok(None)` - Nothing available yet
    /// - `Err(SubscriptionError::Closed)` - The subscription is closed
    pub fn try_recv(&mut self) -> Result<Option<T>, SubscriptionError> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SubscriptionError::Closed),
        }
    }

    /// Cancel the subscription.
    ///
    /// Values still waiting in the subscriber queue are discarded. Values the
    /// delivery worker already handed to this receive handle are still
    /// returned by `recv` before it yields `None`.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// A cloneable cancel handle for use from another task or thread.
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
