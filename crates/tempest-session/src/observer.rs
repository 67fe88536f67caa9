//! Long-lived disconnect observer.
//!
//! Re-subscribes to the disconnect hub of every cycle and reports each
//! terminated session exactly once. Stream services use this to reset their
//! per-session bookkeeping.

use crate::domain::message::DisconnectCause;
use crate::ports::outbound::Connector;
use crate::service::SessionState;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tempest_bus::Canceller;
use tracing::debug;

/// Background thread invoking a callback once per terminated session.
///
/// Stopped explicitly with [`stop`](Self::stop) or on drop.
pub struct DisconnectObserver {
    stopping: Arc<AtomicBool>,
    current: Arc<Mutex<Option<Canceller>>>,
    worker: Option<JoinHandle<()>>,
}

impl DisconnectObserver {
    /// Start observing `state`.
    ///
    /// The observer keeps `state` alive until it is stopped.
    pub fn spawn<C, F>(state: &SessionState<C>, mut on_disconnect: F) -> io::Result<Self>
    where
        C: Connector,
        F: FnMut(DisconnectCause) + Send + 'static,
    {
        let stopping = Arc::new(AtomicBool::new(false));
        let current: Arc<Mutex<Option<Canceller>>> = Arc::new(Mutex::new(None));
        let buffer = state.config().observer_buffer;

        let worker = {
            let state = state.clone();
            let stopping = Arc::clone(&stopping);
            let current = Arc::clone(&current);
            thread::Builder::new()
                .name(format!("{}-observer", state.config().label))
                .spawn(move || {
                    while !stopping.load(Ordering::SeqCst) {
                        let mut events = state.disconnect_events(buffer);
                        *current.lock() = Some(events.canceller());
                        if stopping.load(Ordering::SeqCst) {
                            break;
                        }

                        // `None` means a new cycle began without a cause for
                        // this one (or the observer is stopping).
                        if let Some(cause) = events.blocking_recv() {
                            debug!(cause = cause.label(), "Observed session end");
                            on_disconnect(cause);
                        }
                        current.lock().take();
                    }
                    debug!("Disconnect observer stopped");
                })?
        };

        Ok(Self {
            stopping,
            current,
            worker: Some(worker),
        })
    }

    /// Stop the observer and wait for it to exit.
    ///
    /// Calling this from inside the callback does not wait.
    pub fn stop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(canceller) = self.current.lock().take() {
            canceller.cancel();
        }

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }

    /// Whether the observer thread is still running.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for DisconnectObserver {
    fn drop(&mut self) {
        self.stop();
    }
}
