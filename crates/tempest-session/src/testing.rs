//! In-memory collaborators for tests.
//!
//! Enabled for this crate's own tests and, for downstream crates, through the
//! `test-utils` feature.

use crate::domain::message::DisconnectCause;
use crate::domain::options::ConnectOptions;
use crate::error::CollaboratorError;
use crate::ports::outbound::{Connector, Established, Identity, PacketEntry, RosterQuery};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Roster entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockPlayer {
    pub uuid: Option<String>,
    pub name: String,
}

impl MockPlayer {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            name: name.into(),
        }
    }

    /// A player without an identifier.
    pub fn anonymous(name: impl Into<String>) -> Self {
        Self {
            uuid: None,
            name: name.into(),
        }
    }
}

impl Identity for MockPlayer {
    fn stable_id(&self) -> Option<String> {
        self.uuid.clone()
    }

    fn display_name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// Shared, mutable roster.
#[derive(Clone, Debug, Default)]
pub struct MockRoster {
    players: Arc<Mutex<Vec<MockPlayer>>>,
    failing: Arc<AtomicBool>,
}

impl MockRoster {
    pub fn set(&self, players: Vec<MockPlayer>) {
        *self.players.lock() = players;
    }

    pub fn add(&self, player: MockPlayer) {
        self.players.lock().push(player);
    }

    pub fn clear(&self) {
        self.players.lock().clear();
    }

    /// Make every query fail.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("roster unavailable"));
        }
        Ok(())
    }
}

impl RosterQuery for MockRoster {
    type Player = MockPlayer;

    fn online_players(&self) -> Result<Vec<MockPlayer>, CollaboratorError> {
        self.check()?;
        Ok(self.players.lock().clone())
    }

    fn player_by_id(&self, id: &str) -> Result<Option<MockPlayer>, CollaboratorError> {
        self.check()?;
        Ok(self
            .players
            .lock()
            .iter()
            .find(|p| p.uuid.as_deref() == Some(id))
            .cloned())
    }

    fn player_by_name(&self, name: &str) -> Result<Option<MockPlayer>, CollaboratorError> {
        self.check()?;
        Ok(self.players.lock().iter().find(|p| p.name == name).cloned())
    }
}

/// Interaction facet that records commands.
#[derive(Debug, Default)]
pub struct MockInteraction {
    /// Serial of the session this facet belongs to.
    pub serial: u64,
    sent: Mutex<Vec<String>>,
}

impl MockInteraction {
    pub fn send_command(&self, command: &str) {
        self.sent.lock().push(command.to_string());
    }

    pub fn sent_commands(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

/// Session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHandle {
    pub serial: u64,
    pub server_code: String,
}

/// Connector with scriptable failures and a controllable termination
/// signal per established session.
#[derive(Debug, Default)]
pub struct MockConnector {
    roster: MockRoster,
    catalog: Vec<PacketEntry>,
    signals: Mutex<HashMap<u64, oneshot::Sender<DisconnectCause>>>,
    next_serial: AtomicU64,
    establish_delay: Mutex<Option<Duration>>,
    fail_establish: AtomicBool,
    fail_teardown: AtomicBool,
    establish_calls: AtomicUsize,
    teardown_calls: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_players(self, players: Vec<MockPlayer>) -> Self {
        self.roster.set(players);
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<PacketEntry>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Roster shared by every session this connector establishes.
    pub fn roster(&self) -> &MockRoster {
        &self.roster
    }

    pub fn fail_establish(&self, fail: bool) {
        self.fail_establish.store(fail, Ordering::SeqCst);
    }

    pub fn fail_teardown(&self, fail: bool) {
        self.fail_teardown.store(fail, Ordering::SeqCst);
    }

    /// Make every establish sleep for `delay` first.
    pub fn set_establish_delay(&self, delay: Option<Duration>) {
        *self.establish_delay.lock() = delay;
    }

    /// End the most recently established live session with `cause`.
    ///
    /// Returns `false` if there is none.
    pub fn terminate(&self, cause: DisconnectCause) -> bool {
        match self.take_latest_signal() {
            Some(sender) => sender.send(cause).is_ok(),
            None => false,
        }
    }

    /// Drop the most recent live session's signal without a cause.
    pub fn drop_signal(&self) -> bool {
        self.take_latest_signal().is_some()
    }

    /// Sessions whose termination signal is still pending.
    pub fn live_sessions(&self) -> usize {
        self.signals.lock().len()
    }

    pub fn establish_calls(&self) -> usize {
        self.establish_calls.load(Ordering::SeqCst)
    }

    pub fn teardown_calls(&self) -> usize {
        self.teardown_calls.load(Ordering::SeqCst)
    }

    fn take_latest_signal(&self) -> Option<oneshot::Sender<DisconnectCause>> {
        let mut signals = self.signals.lock();
        let latest = signals.keys().max().copied()?;
        signals.remove(&latest)
    }
}

impl Connector for MockConnector {
    type Handle = MockHandle;
    type Interaction = MockInteraction;
    type Query = MockRoster;

    fn establish(&self, options: &ConnectOptions) -> Result<Established<Self>, CollaboratorError> {
        self.establish_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.establish_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if self.fail_establish.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("authentication rejected"));
        }

        let serial = self.next_serial.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, termination) = oneshot::channel();
        self.signals.lock().insert(serial, sender);

        Ok(Established {
            session: MockHandle {
                serial,
                server_code: options.server_code.clone(),
            },
            interaction: MockInteraction {
                serial,
                ..MockInteraction::default()
            },
            query: self.roster.clone(),
            termination,
        })
    }

    fn teardown(&self, session: &MockHandle) -> Result<(), CollaboratorError> {
        self.teardown_calls.fetch_add(1, Ordering::SeqCst);
        // Dropping the sender resolves the watcher's signal.
        self.signals.lock().remove(&session.serial);

        if self.fail_teardown.load(Ordering::SeqCst) {
            return Err(CollaboratorError::new("leave failed"));
        }
        Ok(())
    }

    fn packet_catalog(&self) -> Vec<PacketEntry> {
        self.catalog.clone()
    }
}
