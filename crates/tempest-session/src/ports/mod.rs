//! Ports: the interfaces the session core needs from its collaborators.
//!
//! The network client, the command/world-query surface and the roster are
//! outside this crate; they plug in through [`Connector`].

pub mod outbound;

pub use outbound::{Connector, Established, Identity, PacketEntry, PlayerOf, RosterQuery};
