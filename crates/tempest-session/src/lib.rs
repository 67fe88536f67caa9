//! # tempest-session
//!
//! Single-writer guard around one live automation session, with lifecycle
//! fan-out to any number of independent observers.
//!
//! ## Overview
//!
//! - **SessionState**: owns at most one active connection; explicit
//!   connect/disconnect serialized against guarded facet access
//! - **IdentityRegistry**: session-scoped cache of roster lookups
//! - **PacketMapping**: packet id ↔ display name, rebuilt on every connect
//! - **DisconnectObserver**: re-subscribes every cycle and reports each end
//!
//! ## Lifecycle
//!
//! ```text
//!                 connect
//! [DISCONNECTED] ─────────→ [CONNECTED]
//!       ↑                        │
//!       └────────────────────────┤
//!          disconnect (Cancelled) │ termination signal (Closed / SignalLost)
//! ```
//!
//! Every transition installs a fresh registry and a fresh disconnect hub. The
//! hub of the cycle that just ended receives exactly one cause and is then
//! closed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tempest_session::{ConnectOptions, SessionState};
//!
//! let state = SessionState::new(connector);
//! let mut messages = state.messages(16);
//!
//! state.connect(ConnectOptions::new("48285363"))?;
//! state.with_interaction(|game| {
//!     game.send_command("list");
//!     Ok(())
//! })?;
//! let players = state.snapshot_players()?;
//! state.disconnect()?;
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod observer;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use domain::{
    ConnectOptions, DisconnectCause, IdentityRegistry, Message, MessageKind, PacketMapping,
    SessionConfig,
};
pub use error::{CollaboratorError, SessionError, SessionResult};
pub use observer::DisconnectObserver;
pub use ports::{Connector, Established, Identity, PacketEntry, PlayerOf, RosterQuery};
pub use service::{PlayerRegistry, SessionState, SessionStatus};
