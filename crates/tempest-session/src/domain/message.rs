//! Lifecycle notices published on the session hubs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Text of the status message published after a successful connect.
pub const CONNECTED: &str = "connected";

/// Text of the status message published after an explicit disconnect.
pub const DISCONNECTED: &str = "disconnected";

/// Text of the message published when the connection ends on its own.
pub const CONNECTION_CLOSED: &str = "connection closed";

/// Category of a general message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Connect / explicit disconnect notices
    Status,
    /// The connection ended without a disconnect request
    Disconnect,
}

impl MessageKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Disconnect => "disconnect",
        }
    }
}

/// General status update published on the message hub.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Status message stamped with the current time.
    pub fn status(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Status,
            message: message.into(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Notice that the connection ended on its own.
    pub fn connection_closed(cause: &DisconnectCause) -> Self {
        Self {
            kind: MessageKind::Disconnect,
            message: CONNECTION_CLOSED.to_string(),
            error: Some(cause.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Attach an error description.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Terminal value published once per cycle on the disconnect hub.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum DisconnectCause {
    /// The session was ended by an explicit disconnect
    #[error("session cancelled")]
    Cancelled,

    /// The connection reported its own end
    #[error("connection closed: {reason}")]
    Closed { reason: String },

    /// The termination signal went away without reporting a cause
    #[error("termination signal lost")]
    SignalLost,
}

impl DisconnectCause {
    /// Cause reported by the connection itself.
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Closed { .. } => "closed",
            Self::SignalLost => "signal_lost",
        }
    }

    /// Whether the session ended because somebody asked for it.
    pub fn is_requested(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
