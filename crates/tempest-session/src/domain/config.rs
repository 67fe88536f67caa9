//! Session configuration from environment variables.

use std::env;
use tempest_bus::DeliveryPolicy;

/// Tunables for a [`SessionState`](crate::SessionState).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Prefix for hub labels and worker thread names
    pub label: String,

    /// Delivery discipline of the general message hub
    pub message_policy: DeliveryPolicy,

    /// Buffer used by disconnect observers for each cycle's subscription
    pub observer_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            label: "tempest".to_string(),
            message_policy: DeliveryPolicy::Reliable,
            observer_buffer: 1,
        }
    }
}

impl SessionConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TEMPEST_SESSION_LABEL`: label / thread name prefix (default: tempest)
    /// - `TEMPEST_MESSAGE_POLICY`: `reliable` or `lossy` (default: reliable)
    /// - `TEMPEST_OBSERVER_BUFFER`: observer subscription buffer (default: 1)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            label: env::var("TEMPEST_SESSION_LABEL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.label),

            message_policy: env::var("TEMPEST_MESSAGE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.message_policy),

            observer_buffer: env::var("TEMPEST_OBSERVER_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.observer_buffer),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_message_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.message_policy = policy;
        self
    }

    pub(crate) fn hub_label(&self, hub: &str) -> String {
        format!("{}-{}", self.label, hub)
    }
}
