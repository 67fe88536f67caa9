//! # Tempest Bus - Fan-out Primitives
//!
//! Building blocks the session core uses to hand events to any number of
//! independent consumers without letting one of them stall the others.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐   subscribe()   ┌────────────┐
//! │   Producer   │ ────────────→ │ BroadcastHub │ ──────────────→ │ Consumer N │
//! └──────────────┘               └──────────────┘                 └────────────┘
//!                                        │
//!                          per-subscriber BoundedQueue + worker
//! ```
//!
//! - [`BoundedQueue`]: fixed-capacity blocking FIFO with close/seal
//! - [`BroadcastHub`]: publish point, one private pipeline per subscriber
//! - [`Subscription`]: receive handle (async, blocking, or `Stream`)

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod hub;
pub mod queue;
pub mod subscriber;

// Re-export main types
pub use hub::{BroadcastHub, DeliveryPolicy, MAX_CHANNEL_BUFFER};
pub use queue::{BoundedQueue, TryPushError};
pub use subscriber::{Canceller, Subscription, SubscriptionError, SubscriptionId};

/// Default per-subscriber buffer for long-lived stream consumers.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;
