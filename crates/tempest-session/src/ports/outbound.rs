//! Driven ports (outbound dependencies)

use crate::domain::message::DisconnectCause;
use crate::domain::options::ConnectOptions;
use crate::error::CollaboratorError;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// A value that may carry a stable identifier.
pub trait Identity {
    /// Stable identifier, or `None` when the value exposes none.
    fn stable_id(&self) -> Option<String>;

    /// Human readable name, when known.
    fn display_name(&self) -> Option<String> {
        None
    }
}

/// Read-only roster queries (the "query facet").
pub trait RosterQuery: Send + Sync {
    type Player: Identity + Clone + Send + Sync + 'static;

    /// Everyone currently online.
    fn online_players(&self) -> Result<Vec<Self::Player>, CollaboratorError>;

    /// Lookup by stable identifier.
    fn player_by_id(&self, id: &str) -> Result<Option<Self::Player>, CollaboratorError>;

    /// Lookup by display name.
    fn player_by_name(&self, name: &str) -> Result<Option<Self::Player>, CollaboratorError>;
}

/// Roster entry type of a connector.
pub type PlayerOf<C> = <<C as Connector>::Query as RosterQuery>::Player;

/// One row of the packet catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketEntry {
    pub id: u32,
    /// Raw type name; `None` for identifiers without a known type
    pub name: Option<String>,
}

impl PacketEntry {
    pub fn new(id: u32, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(str::to_string),
        }
    }
}

/// Everything a successful establish hands back.
pub struct Established<C: Connector + ?Sized> {
    /// Opaque handle of the live connection
    pub session: C::Handle,
    /// Command/interaction facet
    pub interaction: C::Interaction,
    /// Roster query facet
    pub query: C::Query,
    /// Resolves once when the connection ends. Dropping the sender without
    /// a value is reported as [`DisconnectCause::SignalLost`].
    pub termination: oneshot::Receiver<DisconnectCause>,
}

/// Network client that establishes and tears down sessions.
///
/// Calls block for as long as the underlying operation takes.
pub trait Connector: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;
    type Interaction: Send + Sync + 'static;
    type Query: RosterQuery + 'static;

    /// Dial and authenticate.
    fn establish(&self, options: &ConnectOptions) -> Result<Established<Self>, CollaboratorError>;

    /// Close the connection behind `session`.
    ///
    /// Must eventually resolve the session's termination signal, either by
    /// sending a cause or by dropping the sender.
    fn teardown(&self, session: &Self::Handle) -> Result<(), CollaboratorError>;

    /// Packet identifier table used to build the packet mapping.
    fn packet_catalog(&self) -> Vec<PacketEntry>;
}
