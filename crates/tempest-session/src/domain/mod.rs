//! Domain module for the session core
//!
//! - message: lifecycle notices and disconnect causes
//! - registry: identity → cached value map
//! - packets: packet id ↔ name mapping
//! - options: connect parameters
//! - config: session tunables

pub mod config;
pub mod message;
pub mod options;
pub mod packets;
pub mod registry;

pub use config::SessionConfig;
pub use message::{DisconnectCause, Message, MessageKind, CONNECTED, CONNECTION_CLOSED, DISCONNECTED};
pub use options::ConnectOptions;
pub use packets::{display_name, PacketMapping};
pub use registry::IdentityRegistry;
