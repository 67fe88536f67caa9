//! # Broadcast Hub
//!
//! Multi-subscriber publish point with an independent delivery pipeline per
//! subscriber:
//!
//! ```text
//!              publish(v)
//!                  │
//!        ┌─────────┼─────────┐
//!        ▼         ▼         ▼
//!   BoundedQueue BoundedQueue BoundedQueue     (one per subscription)
//!        │         │         │
//!     worker    worker    worker               (one thread per subscription)
//!        │         │         │
//!        ▼         ▼         ▼
//!   Subscription Subscription Subscription     (receive handles)
//! ```
//!
//! A slow subscriber only ever fills its own queue. With the default
//! [`DeliveryPolicy::Reliable`] a publish waits for space in that queue; with
//! [`DeliveryPolicy::Lossy`] the value is dropped for that subscriber only.

use crate::queue::{BoundedQueue, TryPushError};
use crate::subscriber::{Canceller, Detach, Subscription, SubscriptionId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Largest hand-off channel between a delivery worker and its receive handle.
///
/// Requested buffers above this still buffer fully in the subscriber queue,
/// which only allocates as values arrive.
pub const MAX_CHANNEL_BUFFER: usize = 1 << 16;

/// How a hub treats a subscriber whose queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryPolicy {
    /// Publish waits for queue space. Every accepted value reaches every
    /// subscriber that is neither cancelled nor closed.
    #[default]
    Reliable,
    /// Publish never waits. A full subscriber queue drops the value.
    Lossy,
}

impl FromStr for DeliveryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reliable" => Ok(Self::Reliable),
            "lossy" => Ok(Self::Lossy),
            other => Err(format!("unknown delivery policy: {other}")),
        }
    }
}

struct HubState<T> {
    subscribers: HashMap<SubscriptionId, Arc<BoundedQueue<T>>>,
    closed: bool,
}

struct HubInner<T> {
    label: String,
    policy: DeliveryPolicy,
    state: RwLock<HubState<T>>,
    next_id: AtomicU64,
    published: AtomicU64,
    dropped: AtomicU64,
}

impl<T: Send + 'static> Detach for HubInner<T> {
    fn detach(&self, id: SubscriptionId) {
        let removed = self.state.write().subscribers.remove(&id);
        if let Some(queue) = removed {
            queue.close();
            debug!(hub = %self.label, subscription_id = id, "Subscription cancelled");
        }
    }
}

impl<T> Drop for HubInner<T> {
    fn drop(&mut self) {
        // Workers hold their queue, not the hub. Release them.
        for queue in self.state.get_mut().subscribers.values() {
            queue.seal();
        }
    }
}

/// Publish/subscribe hub for one logical event stream.
///
/// Cloning is cheap and every clone refers to the same hub.
pub struct BroadcastHub<T> {
    inner: Arc<HubInner<T>>,
}

impl<T> Clone for BroadcastHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> BroadcastHub<T>
where
    T: Clone + Send + 'static,
{
    /// Create a hub with reliable delivery.
    ///
    /// `label` names the hub in logs and in worker thread names.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_policy(label, DeliveryPolicy::Reliable)
    }

    /// Create a hub with an explicit delivery policy.
    #[must_use]
    pub fn with_policy(label: impl Into<String>, policy: DeliveryPolicy) -> Self {
        Self {
            inner: Arc::new(HubInner {
                label: label.into(),
                policy,
                state: RwLock::new(HubState {
                    subscribers: HashMap::new(),
                    closed: false,
                }),
                next_id: AtomicU64::new(0),
                published: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Register a subscriber whose private queue holds `buffer` values
    /// (minimum one).
    ///
    /// Any `buffer` is accepted; the hand-off channel behind the queue is
    /// capped at [`MAX_CHANNEL_BUFFER`].
    ///
    /// On a closed hub this returns an already-closed handle.
    pub fn subscribe(&self, buffer: usize) -> Subscription<T> {
        let buffer = buffer.max(1);

        let mut state = self.inner.state.write();
        if state.closed {
            return Subscription::closed();
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let queue = Arc::new(BoundedQueue::new(buffer));
        let (sender, receiver) = mpsc::channel(buffer.min(MAX_CHANNEL_BUFFER));

        let worker_queue = Arc::clone(&queue);
        let spawned = thread::Builder::new()
            .name(format!("{}-sub-{}", self.inner.label, id))
            .spawn(move || deliver(&worker_queue, &sender));
        if let Err(e) = spawned {
            warn!(hub = %self.inner.label, error = %e, "Failed to spawn delivery worker");
            return Subscription::closed();
        }

        state.subscribers.insert(id, queue);
        drop(state);

        debug!(hub = %self.inner.label, subscription_id = id, buffer, "New subscription created");

        let weak: Weak<HubInner<T>> = Arc::downgrade(&self.inner);
        let detach: Weak<dyn Detach> = weak;
        Subscription::new(id, receiver, Canceller::new(detach, id))
    }

    /// Deliver `value` to every current subscriber.
    ///
    /// # Returns
    ///
    /// The number of subscriber queues that accepted the value.
    pub fn publish(&self, value: T) -> usize {
        let targets: Vec<(SubscriptionId, Arc<BoundedQueue<T>>)> = {
            let state = self.inner.state.read();
            if state.closed {
                return 0;
            }
            state
                .subscribers
                .iter()
                .map(|(id, queue)| (*id, Arc::clone(queue)))
                .collect()
        };

        self.inner.published.fetch_add(1, Ordering::Relaxed);

        let mut accepted = 0;
        for (id, queue) in targets {
            match self.inner.policy {
                DeliveryPolicy::Reliable => {
                    if queue.push(value.clone()) {
                        accepted += 1;
                    }
                }
                DeliveryPolicy::Lossy => match queue.try_push(value.clone()) {
                    Ok(()) => accepted += 1,
                    Err(TryPushError::Full(_)) => {
                        self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                        debug!(hub = %self.inner.label, subscription_id = id, "Subscriber lagged, value dropped");
                    }
                    Err(TryPushError::Closed(_)) => {}
                },
            }
        }

        trace!(hub = %self.inner.label, accepted, "Value published");
        accepted
    }

    /// Close the hub and every subscription. Idempotent.
    ///
    /// Subscriber queues are sealed rather than discarded: values already
    /// accepted are still delivered, nothing new is. A final value published
    /// right before `close` (a disconnect cause, say) therefore always reaches
    /// subscribers that are still reading. Cancelling a subscription is what
    /// discards its undelivered values.
    pub fn close(&self) {
        let subscribers = {
            let mut state = self.inner.state.write();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.subscribers)
        };

        for queue in subscribers.values() {
            queue.seal();
        }

        debug!(hub = %self.inner.label, closed = subscribers.len(), "Hub closed");
    }

    /// Whether the hub has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.state.read().closed
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.read().subscribers.len()
    }

    /// Total publish calls accepted while the hub was open.
    pub fn published(&self) -> u64 {
        self.inner.published.load(Ordering::Relaxed)
    }

    /// Values dropped for lagging subscribers (lossy policy only).
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Delivery policy of this hub.
    pub fn policy(&self) -> DeliveryPolicy {
        self.inner.policy
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        &self.inner.label
    }
}

impl<T> std::fmt::Debug for BroadcastHub<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("label", &self.inner.label)
            .field("policy", &self.inner.policy)
            .finish()
    }
}

/// Delivery worker: queue → receive handle, until either side goes away.
fn deliver<T>(queue: &BoundedQueue<T>, sender: &mpsc::Sender<T>) {
    while let Some(value) = queue.pop() {
        if sender.blocking_send(value).is_err() {
            // Receive handle dropped; stop accepting values for it.
            queue.close();
            break;
        }
    }
}
