//! # Session Lifecycle Integration Tests
//!
//! Connect/disconnect cycles driven through `SessionState` with the mock
//! connector from `tempest_session::testing`.
//!
//! ## Flows Tested:
//!
//! 1. **End to end**: connect → "connected" → disconnect → "disconnected" and
//!    exactly one cause on the disconnect hub
//! 2. **Single writer**: racing connects produce one winner
//! 3. **Cross-cycle isolation**: old disconnect subscriptions never see the
//!    next cycle
//! 4. **Forced teardown**: the connection's own cause is published once

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};

    use tempest_bus::Subscription;
    use tempest_session::testing::{MockConnector, MockPlayer};
    use tempest_session::{
        ConnectOptions, DisconnectCause, Message, MessageKind, SessionError, SessionState,
    };
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn options() -> ConnectOptions {
        ConnectOptions::new("48285363").with_token("token")
    }

    fn roster() -> Vec<MockPlayer> {
        vec![
            MockPlayer::new("uuid-alex", "Alex"),
            MockPlayer::new("uuid-steve", "Steve"),
        ]
    }

    async fn next(sub: &mut Subscription<Message>) -> Message {
        timeout(Duration::from_secs(5), sub.recv())
            .await
            .expect("message timed out")
            .expect("message hub closed")
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached");
            thread::sleep(Duration::from_millis(2));
        }
    }

    // =============================================================================
    // END TO END
    // =============================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_end_to_end_connect_disconnect() {
        let state = SessionState::new(MockConnector::new().with_players(roster()));
        let mut messages = state.messages(16);

        let session_id = state.connect(options()).unwrap();
        let connected = next(&mut messages).await;
        assert_eq!(connected.kind, MessageKind::Status);
        assert_eq!(connected.message, "connected");

        let players = state.snapshot_players().unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(state.status().session_id, Some(session_id));

        let mut ends = state.disconnect_events(4);
        state.disconnect().unwrap();

        let disconnected = next(&mut messages).await;
        assert_eq!(disconnected.message, "disconnected");
        assert!(disconnected.error.is_none());

        let cause = timeout(Duration::from_secs(5), ends.recv()).await.unwrap();
        assert_eq!(cause, Some(DisconnectCause::Cancelled));
        assert_eq!(timeout(Duration::from_secs(5), ends.recv()).await.unwrap(), None);

        assert!(matches!(
            state.with_query(|_| Ok(())),
            Err(SessionError::NotConnected)
        ));
        assert!(state.registry().is_empty());
    }

    #[test]
    fn test_double_disconnect() {
        let state = SessionState::new(MockConnector::new());
        state.connect(options()).unwrap();

        assert!(state.disconnect().is_ok());
        assert!(matches!(state.disconnect(), Err(SessionError::NotConnected)));
    }

    // =============================================================================
    // SINGLE WRITER
    // =============================================================================

    #[test]
    fn test_concurrent_connect_single_winner() {
        let connector = MockConnector::new();
        connector.set_establish_delay(Some(Duration::from_millis(20)));
        let state = SessionState::new(connector);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let state = state.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    state.connect(options())
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(SessionError::AlreadyConnected)))
            .count();
        assert_eq!((wins, rejected), (1, 1));

        // The loser's connection was torn down; only the winner stays live.
        assert_eq!(state.connector().establish_calls(), 2);
        assert_eq!(state.connector().live_sessions(), 1);
        assert!(state.is_connected());
    }

    // =============================================================================
    // CROSS-CYCLE ISOLATION
    // =============================================================================

    #[test]
    fn test_old_disconnect_subscription_sees_only_its_cycle() {
        let state = SessionState::new(MockConnector::new());

        state.connect(options()).unwrap();
        let mut first_cycle = state.disconnect_events(4);
        state.disconnect().unwrap();

        state.connect(options()).unwrap();
        let mut second_cycle = state.disconnect_events(4);
        state
            .connector()
            .terminate(DisconnectCause::closed("server restart"));

        assert_eq!(first_cycle.blocking_recv(), Some(DisconnectCause::Cancelled));
        assert_eq!(first_cycle.blocking_recv(), None);

        assert_eq!(
            second_cycle.blocking_recv(),
            Some(DisconnectCause::closed("server restart"))
        );
        assert_eq!(second_cycle.blocking_recv(), None);
    }

    #[test]
    fn test_subscription_while_disconnected_ends_on_connect() {
        let state = SessionState::new(MockConnector::new());
        let mut idle = state.disconnect_events(1);

        state.connect(options()).unwrap();
        assert_eq!(idle.blocking_recv(), None);
    }

    #[test]
    fn test_registry_isolated_between_cycles() {
        let state = SessionState::new(MockConnector::new().with_players(roster()));

        state.connect(options()).unwrap();
        state.find_player_by_name("Alex").unwrap();
        let stale = state.registry();
        state.disconnect().unwrap();

        state.connect(options()).unwrap();
        assert!(state.registry().is_empty());
        assert_eq!(stale.len(), 1);
        assert!(state.registry().get(&"uuid-alex".to_string()).is_none());
    }

    // =============================================================================
    // FORCED TEARDOWN
    // =============================================================================

    #[tokio::test(flavor = "multi_thread")]
    async fn test_forced_teardown_publishes_cause_once() {
        let state = SessionState::new(MockConnector::new());
        let mut messages = state.messages(16);
        state.connect(options()).unwrap();
        assert_eq!(next(&mut messages).await.message, "connected");

        let mut a = state.disconnect_events(1);
        let mut b = state.disconnect_events(1);
        assert!(state.connector().terminate(DisconnectCause::closed("kicked")));

        for sub in [&mut a, &mut b] {
            let cause = timeout(Duration::from_secs(5), sub.recv()).await.unwrap();
            assert_eq!(cause, Some(DisconnectCause::closed("kicked")));
            assert_eq!(timeout(Duration::from_secs(5), sub.recv()).await.unwrap(), None);
        }

        let closed = next(&mut messages).await;
        assert_eq!(closed.kind, MessageKind::Disconnect);
        assert_eq!(closed.message, "connection closed");
        assert_eq!(closed.error.as_deref(), Some("connection closed: kicked"));

        assert!(!state.is_connected());
        assert_eq!(state.connector().teardown_calls(), 1);
    }

    #[test]
    fn test_stale_watcher_leaves_new_session_alone() {
        let state = SessionState::new(MockConnector::new());

        let first = state.connect(options()).unwrap();
        state.disconnect().unwrap();
        // The first watcher wakes on the dropped signal and must not touch
        // the session below.
        let second = state.connect(options()).unwrap();
        assert_ne!(first, second);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(state.status().session_id, Some(second));
        assert_eq!(state.connector().live_sessions(), 1);

        let mut ends = state.disconnect_events(1);
        state.disconnect().unwrap();
        assert_eq!(ends.blocking_recv(), Some(DisconnectCause::Cancelled));
    }

    #[test]
    fn test_reconnect_after_forced_teardown() {
        let state = SessionState::new(MockConnector::new());
        state.connect(options()).unwrap();
        state.connector().drop_signal();
        wait_until(|| !state.is_connected());

        state.connect(options()).unwrap();
        assert!(state.is_connected());
    }
}
