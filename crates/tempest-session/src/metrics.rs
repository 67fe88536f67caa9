//! # Session Metrics
//!
//! Prometheus metrics for the session lifecycle.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! tempest-session = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `tempest_session_connects_total` - Counter of successful connects
//! - `tempest_session_connect_failures_total` - Counter of failed connects (by reason)
//! - `tempest_session_disconnects_total` - Counter of session endings (by cause)
//! - `tempest_session_teardown_failures_total` - Counter of connector teardown failures
//! - `tempest_session_connected` - Gauge, 1 while a session is active
//! - `tempest_session_messages_published_total` - Counter of general messages published

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, CounterVec, Gauge, IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total successful connects
    pub static ref CONNECTS: IntCounter = register_int_counter!(
        "tempest_session_connects_total",
        "Total number of sessions established"
    )
    .expect("Failed to create CONNECTS metric");

    /// Failed connects, labeled by reason
    pub static ref CONNECT_FAILURES: CounterVec = register_counter_vec!(
        "tempest_session_connect_failures_total",
        "Total number of failed connect attempts",
        &["reason"]
    )
    .expect("Failed to create CONNECT_FAILURES metric");

    /// Session endings, labeled by cause
    pub static ref DISCONNECTS: CounterVec = register_counter_vec!(
        "tempest_session_disconnects_total",
        "Total number of sessions ended",
        &["cause"]
    )
    .expect("Failed to create DISCONNECTS metric");

    /// Connector teardown failures
    pub static ref TEARDOWN_FAILURES: IntCounter = register_int_counter!(
        "tempest_session_teardown_failures_total",
        "Total number of failed connector teardowns"
    )
    .expect("Failed to create TEARDOWN_FAILURES metric");

    /// Whether a session is active (0=no, 1=yes)
    pub static ref CONNECTED: Gauge = register_gauge!(
        "tempest_session_connected",
        "Whether a session is currently active (0=no, 1=yes)"
    )
    .expect("Failed to create CONNECTED metric");

    /// General messages published
    pub static ref MESSAGES_PUBLISHED: IntCounter = register_int_counter!(
        "tempest_session_messages_published_total",
        "Total number of general messages published"
    )
    .expect("Failed to create MESSAGES_PUBLISHED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a successful connect
#[cfg(feature = "metrics")]
pub fn record_connect() {
    CONNECTS.inc();
    CONNECTED.set(1.0);
}

/// Record a failed connect with reason
#[cfg(feature = "metrics")]
pub fn record_connect_failure(reason: &str) {
    CONNECT_FAILURES.with_label_values(&[reason]).inc();
}

/// Record a session ending with its cause
#[cfg(feature = "metrics")]
pub fn record_disconnect(cause: &str) {
    DISCONNECTS.with_label_values(&[cause]).inc();
    CONNECTED.set(0.0);
}

/// Record a failed connector teardown
#[cfg(feature = "metrics")]
pub fn record_teardown_failure() {
    TEARDOWN_FAILURES.inc();
}

/// Record a general message published
#[cfg(feature = "metrics")]
pub fn record_message_published() {
    MESSAGES_PUBLISHED.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_connect() {}

#[cfg(not(feature = "metrics"))]
pub fn record_connect_failure(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_disconnect(_cause: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_teardown_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_message_published() {}
