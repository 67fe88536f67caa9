//! Session service: the single-writer guard around the one live connection.

use crate::domain::config::SessionConfig;
use crate::domain::message::{DisconnectCause, Message, CONNECTED, DISCONNECTED};
use crate::domain::options::ConnectOptions;
use crate::domain::packets::PacketMapping;
use crate::domain::registry::IdentityRegistry;
use crate::error::{CollaboratorError, SessionError, SessionResult};
use crate::metrics;
use crate::ports::outbound::{Connector, Established, Identity, PlayerOf, RosterQuery};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread;
use tempest_bus::{BroadcastHub, Subscription};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Registry of roster entries for a connector.
pub type PlayerRegistry<C> = IdentityRegistry<String, PlayerOf<C>>;

/// Point-in-time view of the session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub connected: bool,
    pub session_id: Option<Uuid>,
    pub connected_at: Option<DateTime<Utc>>,
}

/// State of one established connection.
struct ActiveSession<C: Connector> {
    id: Uuid,
    connected_at: DateTime<Utc>,
    handle: C::Handle,
    interaction: C::Interaction,
    query: C::Query,
    packets: PacketMapping,
}

/// Everything guarded by the session lock.
struct Shared<C: Connector> {
    active: Option<ActiveSession<C>>,
    disconnects: BroadcastHub<DisconnectCause>,
    registry: Arc<PlayerRegistry<C>>,
}

struct SessionInner<C: Connector> {
    connector: C,
    config: SessionConfig,
    messages: BroadcastHub<Message>,
    shared: RwLock<Shared<C>>,
}

/// Owner of at most one active session.
///
/// Cloning is cheap and every clone refers to the same session. Connect,
/// disconnect and forced teardown are serialized by one exclusive lock;
/// guarded facet access runs under the shared side of that lock.
pub struct SessionState<C: Connector> {
    inner: Arc<SessionInner<C>>,
}

impl<C: Connector> Clone for SessionState<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> fmt::Debug for SessionState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("label", &self.inner.config.label)
            .field("status", &self.status())
            .finish()
    }
}

impl<C: Connector> SessionState<C> {
    /// Create a disconnected session with default configuration.
    pub fn new(connector: C) -> Self {
        Self::with_config(connector, SessionConfig::default())
    }

    /// Create a disconnected session.
    pub fn with_config(connector: C, config: SessionConfig) -> Self {
        let messages = BroadcastHub::with_policy(config.hub_label("msg"), config.message_policy);
        let shared = Shared {
            active: None,
            disconnects: BroadcastHub::new(config.hub_label("disc")),
            registry: Arc::new(IdentityRegistry::new()),
        };

        Self {
            inner: Arc::new(SessionInner {
                connector,
                config,
                messages,
                shared: RwLock::new(shared),
            }),
        }
    }

    /// The connector this session drives.
    pub fn connector(&self) -> &C {
        &self.inner.connector
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Establish a new session.
    ///
    /// Blocks for as long as the connector takes to establish. When another
    /// connect wins the race, the freshly established connection is torn
    /// down again and `AlreadyConnected` is returned.
    ///
    /// # Returns
    ///
    /// The id of the new session.
    pub fn connect(&self, options: ConnectOptions) -> SessionResult<Uuid> {
        let options = options.validate().map_err(|e| {
            metrics::record_connect_failure("invalid_options");
            e
        })?;

        let Established {
            session,
            interaction,
            query,
            termination,
        } = self.inner.connector.establish(&options).map_err(|e| {
            warn!(server_code = %options.server_code, error = %e, "Connector failed to establish session");
            metrics::record_connect_failure("establish");
            SessionError::from(e)
        })?;

        let packets = PacketMapping::from_catalog(self.inner.connector.packet_catalog());
        let session_id = Uuid::new_v4();
        let connected_at = Utc::now();

        let previous = {
            let mut shared = self.inner.shared.write();
            if shared.active.is_some() {
                drop(shared);
                if let Err(e) = self.inner.connector.teardown(&session) {
                    warn!(error = %e, "Failed to tear down redundant session");
                    metrics::record_teardown_failure();
                }
                metrics::record_connect_failure("already_connected");
                return Err(SessionError::AlreadyConnected);
            }

            let fresh = BroadcastHub::new(self.inner.config.hub_label("disc"));
            let previous = std::mem::replace(&mut shared.disconnects, fresh);
            shared.registry = Arc::new(IdentityRegistry::new());
            shared.active = Some(ActiveSession {
                id: session_id,
                connected_at,
                handle: session,
                interaction,
                query,
                packets,
            });
            previous
        };
        previous.close();

        info!(
            session_id = %session_id,
            server_code = %options.server_code,
            "Session connected"
        );
        metrics::record_connect();
        self.inner.publish_message(Message::status(CONNECTED));

        let watcher = Arc::downgrade(&self.inner);
        let spawned = thread::Builder::new()
            .name(format!("{}-watcher", self.inner.config.label))
            .spawn(move || watch(watcher, session_id, termination));

        if let Err(e) = spawned {
            error!(session_id = %session_id, error = %e, "Failed to spawn session watcher");
            self.inner
                .forced_teardown(session_id, DisconnectCause::SignalLost);
            return Err(CollaboratorError::new(e).into());
        }

        Ok(session_id)
    }

    /// End the active session.
    ///
    /// State is reset before the connector is asked to tear down; a teardown
    /// failure is returned but does not restore the session.
    pub fn disconnect(&self) -> SessionResult<()> {
        let (active, previous) = {
            let mut shared = self.inner.shared.write();
            let active = shared.active.take().ok_or(SessionError::NotConnected)?;
            let fresh = BroadcastHub::new(self.inner.config.hub_label("disc"));
            let previous = std::mem::replace(&mut shared.disconnects, fresh);
            shared.registry = Arc::new(IdentityRegistry::new());
            (active, previous)
        };

        previous.publish(DisconnectCause::Cancelled);
        previous.close();

        let result = self
            .inner
            .connector
            .teardown(&active.handle)
            .map_err(SessionError::from);

        let mut message = Message::status(DISCONNECTED);
        match &result {
            Ok(()) => info!(session_id = %active.id, "Session disconnected"),
            Err(e) => {
                warn!(session_id = %active.id, error = %e, "Session disconnected, teardown failed");
                metrics::record_teardown_failure();
                message = message.with_error(e.to_string());
            }
        }
        metrics::record_disconnect(DisconnectCause::Cancelled.label());
        self.inner.publish_message(message);

        result
    }

    /// Whether a session is active.
    pub fn is_connected(&self) -> bool {
        self.inner.shared.read_recursive().active.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        let shared = self.inner.shared.read_recursive();
        match &shared.active {
            Some(active) => SessionStatus {
                connected: true,
                session_id: Some(active.id),
                connected_at: Some(active.connected_at),
            },
            None => SessionStatus {
                connected: false,
                session_id: None,
                connected_at: None,
            },
        }
    }

    // =========================================================================
    // GUARDED ACCESS
    // =========================================================================

    /// Run `f` against the interaction facet while holding the shared lock.
    ///
    /// `f` must not connect or disconnect this session.
    pub fn with_interaction<F, R>(&self, f: F) -> SessionResult<R>
    where
        F: FnOnce(&C::Interaction) -> SessionResult<R>,
    {
        self.guarded(|active, _| f(&active.interaction))
    }

    /// Run `f` against the query facet while holding the shared lock.
    ///
    /// `f` must not connect or disconnect this session.
    pub fn with_query<F, R>(&self, f: F) -> SessionResult<R>
    where
        F: FnOnce(&C::Query) -> SessionResult<R>,
    {
        self.guarded(|active, _| f(&active.query))
    }

    fn guarded<F, R>(&self, f: F) -> SessionResult<R>
    where
        F: FnOnce(&ActiveSession<C>, &Arc<PlayerRegistry<C>>) -> SessionResult<R>,
    {
        let shared = self.inner.shared.read_recursive();
        let active = shared.active.as_ref().ok_or(SessionError::NotConnected)?;
        f(active, &shared.registry)
    }

    /// Copy of the packet mapping of the active session.
    pub fn packet_mapping(&self) -> SessionResult<PacketMapping> {
        self.guarded(|active, _| Ok(active.packets.clone()))
    }

    /// Packet identifier for a display name.
    pub fn packet_id(&self, name: &str) -> SessionResult<u32> {
        self.guarded(|active, _| {
            active
                .packets
                .id(name)
                .ok_or_else(|| SessionError::not_found(format!("packet {name}")))
        })
    }

    /// Display name for a packet identifier.
    pub fn packet_name(&self, id: u32) -> SessionResult<String> {
        self.guarded(|active, _| {
            active
                .packets
                .name(id)
                .map(str::to_string)
                .ok_or_else(|| SessionError::not_found(format!("packet id {id}")))
        })
    }

    // =========================================================================
    // REGISTRY & ROSTER
    // =========================================================================

    /// The currently installed registry.
    ///
    /// A handle obtained before a connect or disconnect keeps pointing at the
    /// old, detached registry.
    pub fn registry(&self) -> Arc<PlayerRegistry<C>> {
        Arc::clone(&self.inner.shared.read_recursive().registry)
    }

    /// List online players and cache every one that has an identifier.
    pub fn snapshot_players(&self) -> SessionResult<Vec<PlayerOf<C>>> {
        self.guarded(|active, registry| {
            let players = active.query.online_players()?;
            for player in &players {
                if let Some(id) = player.stable_id() {
                    registry.rebind(id, player.clone());
                }
            }
            debug!(count = players.len(), "Player snapshot taken");
            Ok(players)
        })
    }

    /// Find a player by stable identifier, consulting the registry first.
    pub fn find_player_by_id(&self, id: &str) -> SessionResult<PlayerOf<C>> {
        self.guarded(|active, registry| {
            if let Some(player) = registry.get(&id.to_string()) {
                return Ok(player);
            }
            let player = active
                .query
                .player_by_id(id)?
                .ok_or_else(|| SessionError::not_found(format!("player {id}")))?;
            registry.rebind(id.to_string(), player.clone());
            Ok(player)
        })
    }

    /// Find a player by display name.
    ///
    /// The match must carry an identifier; it is cached under it.
    pub fn find_player_by_name(&self, name: &str) -> SessionResult<PlayerOf<C>> {
        self.guarded(|active, registry| {
            let player = active
                .query
                .player_by_name(name)?
                .ok_or_else(|| SessionError::not_found(format!("player {name}")))?;
            registry.bind_identity(player.clone())?;
            Ok(player)
        })
    }

    /// Evict a cached player.
    pub fn release_player(&self, id: &str) -> Option<PlayerOf<C>> {
        self.registry().delete(&id.to_string())
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscribe to general messages.
    pub fn messages(&self, buffer: usize) -> Subscription<Message> {
        self.inner.messages.subscribe(buffer)
    }

    /// Subscribe to the end of the current cycle.
    ///
    /// Yields at most one cause, then ends. While disconnected the handle
    /// ends without a value as soon as the next session is established.
    pub fn disconnect_events(&self, buffer: usize) -> Subscription<DisconnectCause> {
        self.inner.shared.read_recursive().disconnects.subscribe(buffer)
    }

    /// Subscribers waiting on the current cycle's end.
    pub fn disconnect_subscriber_count(&self) -> usize {
        self.inner.shared.read_recursive().disconnects.subscriber_count()
    }

    /// Subscribers of the general message hub.
    pub fn message_subscriber_count(&self) -> usize {
        self.inner.messages.subscriber_count()
    }
}

impl<C: Connector> SessionInner<C> {
    fn publish_message(&self, message: Message) {
        self.messages.publish(message);
        metrics::record_message_published();
    }

    /// Tear down `session_id` after its connection ended on its own.
    ///
    /// No-op if that session is no longer installed.
    fn forced_teardown(&self, session_id: Uuid, cause: DisconnectCause) {
        let (active, previous) = {
            let mut shared = self.shared.write();
            match &shared.active {
                Some(active) if active.id == session_id => {}
                _ => {
                    debug!(session_id = %session_id, cause = cause.label(), "Stale termination ignored");
                    return;
                }
            }
            let active = shared.active.take();
            let fresh = BroadcastHub::new(self.config.hub_label("disc"));
            let previous = std::mem::replace(&mut shared.disconnects, fresh);
            shared.registry = Arc::new(IdentityRegistry::new());
            (active, previous)
        };

        if let Some(active) = &active {
            if let Err(e) = self.connector.teardown(&active.handle) {
                warn!(session_id = %session_id, error = %e, "Teardown after termination failed");
                metrics::record_teardown_failure();
            }
        }

        previous.publish(cause.clone());
        previous.close();

        warn!(session_id = %session_id, cause = %cause, "Session terminated by connection");
        metrics::record_disconnect(cause.label());
        self.publish_message(Message::connection_closed(&cause));
    }
}

impl<C: Connector> Drop for SessionInner<C> {
    fn drop(&mut self) {
        let shared = self.shared.get_mut();
        if let Some(active) = shared.active.take() {
            if let Err(e) = self.connector.teardown(&active.handle) {
                warn!(session_id = %active.id, error = %e, "Teardown on drop failed");
            }
            metrics::record_disconnect(DisconnectCause::Cancelled.label());
        }
        shared.disconnects.close();
        self.messages.close();
    }
}

/// Watcher body: wait for the termination signal, then tear down.
fn watch<C: Connector>(
    inner: Weak<SessionInner<C>>,
    session_id: Uuid,
    termination: oneshot::Receiver<DisconnectCause>,
) {
    let cause = termination
        .blocking_recv()
        .unwrap_or(DisconnectCause::SignalLost);

    match inner.upgrade() {
        Some(inner) => inner.forced_teardown(session_id, cause),
        None => debug!(session_id = %session_id, "Session dropped before termination"),
    }
}
